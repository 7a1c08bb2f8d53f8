use std::collections::HashSet;

use crate::manifest::model::{AggregatedOrder, CancelledOrder, Manifest, ManifestRow};

/// Stable sort of single-SKU orders by `(single_sku, total_quantity)`.
pub fn sort_single_sku(orders: &mut [AggregatedOrder]) {
    orders.sort_by(|a, b| {
        let sku_a = a.single_sku.as_deref().unwrap_or("");
        let sku_b = b.single_sku.as_deref().unwrap_or("");
        sku_a
            .cmp(sku_b)
            .then_with(|| a.total_quantity.sort_cmp(&b.total_quantity))
    });
}

/// Build the final manifest: sorted single-SKU orders, then multi-SKU orders in
/// aggregation order, then one placeholder per distinct cancelled order.
pub fn assemble(orders: Vec<AggregatedOrder>, cancelled: &[CancelledOrder]) -> Manifest {
    let (mut single, multi): (Vec<_>, Vec<_>) =
        orders.into_iter().partition(AggregatedOrder::is_single_sku);

    sort_single_sku(&mut single);

    let mut rows: Vec<ManifestRow> = single
        .iter()
        .chain(multi.iter())
        .map(ManifestRow::from_order)
        .collect();

    let removed_rows = cancelled.len();
    let mut seen = HashSet::new();
    for order in cancelled {
        if seen.insert(order.order_id.as_str()) {
            rows.push(ManifestRow::cancellation_placeholder(
                &order.order_id,
                removed_rows,
            ));
        }
    }

    Manifest { rows }
}
