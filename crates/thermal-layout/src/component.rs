//! Board-level components (spec.md §6): `(bbox, placementLayer,
//! powerTable(T))`.

use crate::power::{BBox2, PowerTable};

#[derive(Debug, Clone)]
pub struct Component {
    pub bbox: BBox2,
    pub placement_layer: usize,
    pub power_table: PowerTable,
}
