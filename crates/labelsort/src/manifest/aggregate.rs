use std::collections::{HashMap, HashSet};

use crate::manifest::model::{AggregatedOrder, LineItem, Quantity, ITEM_SEPARATOR};

/// Group active line items by order id, keeping the order in which ids first appear.
pub fn aggregate_orders(items: &[LineItem]) -> Vec<AggregatedOrder> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&LineItem>> = Vec::new();

    for item in items {
        let slot = *index.entry(item.order_id.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    groups.iter().map(|group| summarize(group)).collect()
}

fn summarize(group: &[&LineItem]) -> AggregatedOrder {
    let order_id = group[0].order_id.clone();

    let item_summary = group
        .iter()
        .map(|item| format!("{} — {}", item.sku, item.quantity))
        .collect::<Vec<_>>()
        .join(ITEM_SEPARATOR);

    let distinct: HashSet<&str> = group.iter().map(|item| item.sku.as_str()).collect();
    let distinct_sku_count = distinct.len();

    let total_quantity = group
        .iter()
        .map(|item| item.quantity)
        .fold(Quantity::Value(0.0), |acc, q| acc + q);

    let single_sku = (distinct_sku_count == 1).then(|| group[0].sku.clone());

    AggregatedOrder {
        order_id,
        item_summary,
        distinct_sku_count,
        total_quantity,
        single_sku,
    }
}
