//! Order manifest handling: row normalization, per-order aggregation and the
//! final sorted layout.

pub mod aggregate;
pub mod assemble;
pub mod model;
pub mod normalize;

pub use aggregate::aggregate_orders;
pub use assemble::{assemble, sort_single_sku};
pub use model::{
    AggregatedOrder, CancelledOrder, LineItem, Manifest, ManifestRow, Quantity, RawRow, RawTable,
    RowKind, CANCELLED_STATUS, OUTPUT_HEADERS, READY_STATUS,
};
pub use normalize::{normalize, ColumnLayout, ManifestLayout, NormalizedManifest, ParseWarning};

use crate::error::ManifestError;

/// Normalize, aggregate and assemble in one go.
pub fn build_manifest(
    table: &RawTable,
    layout: &ManifestLayout,
) -> Result<(Manifest, NormalizedManifest), ManifestError> {
    let normalized = normalize(table, layout)?;
    let orders = aggregate_orders(&normalized.active);
    let manifest = assemble(orders, &normalized.cancelled);
    Ok((manifest, normalized))
}
