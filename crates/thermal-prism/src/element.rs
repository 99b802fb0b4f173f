//! Prism element/layer types (spec.md §4.7, glossary "Prism element"): a
//! triangular wedge, two parallel triangles joined by three quads.

use thermal_core::MaterialId;
use thermal_layout::PowerTable;

use crate::mesh::Mesh;

pub const NO_NEIGHBOR: usize = usize::MAX;
pub const TOP_NEIGHBOR_INDEX: usize = 3;
pub const BOT_NEIGHBOR_INDEX: usize = 4;

/// One wedge cell. `template_id` indexes the owning layer's `Mesh` triangle
/// list (not every mesh triangle becomes an element: polygon-free or
/// fluid-covered triangles are skipped).
#[derive(Debug, Clone)]
pub struct PrismaElement {
    pub id: usize,
    pub template_id: usize,
    pub material: MaterialId,
    pub net: Option<String>,
    pub power_ratio: Option<f64>,
    pub power_table: Option<PowerTable>,
    /// `[edge0, edge1, edge2, top, bot]`, global element indices,
    /// `NO_NEIGHBOR` when absent. In stacked-contact mode, `top`/`bot` hold
    /// `self.id` as a sentinel meaning "resolved via `top_contacts`/
    /// `bot_contacts`" instead of a single neighbor index.
    pub neighbors: [usize; 5],
    pub top_contacts: Vec<(usize, f64)>,
    pub bot_contacts: Vec<(usize, f64)>,
}

impl PrismaElement {
    pub fn uses_top_contacts(&self) -> bool {
        self.neighbors[TOP_NEIGHBOR_INDEX] == self.id && !self.top_contacts.is_empty()
    }

    pub fn uses_bot_contacts(&self) -> bool {
        self.neighbors[BOT_NEIGHBOR_INDEX] == self.id && !self.bot_contacts.is_empty()
    }
}

/// One layer's mesh plus its populated elements.
#[derive(Debug, Clone)]
pub struct PrismaLayer {
    pub id: usize,
    pub elevation: f64,
    pub thickness: f64,
    pub mesh: Mesh,
    pub elements: Vec<PrismaElement>,
    /// `mesh` triangle index -> this layer's local element index.
    pub template_to_element: Vec<Option<usize>>,
}

impl PrismaLayer {
    pub fn top(&self) -> f64 {
        self.elevation + self.thickness
    }
}
