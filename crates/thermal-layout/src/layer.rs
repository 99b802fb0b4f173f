//! Layer stackup (spec.md §6): ordered `(name, kind, elevation, thickness,
//! materials)` records.

use thermal_core::MaterialId;

use crate::error::{LayoutError, LayoutResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Dielectric,
    Conducting,
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub elevation: f64,
    pub thickness: f64,
    pub conducting_material: Option<MaterialId>,
    pub dielectric_material: Option<MaterialId>,
}

impl Layer {
    pub fn top(&self) -> f64 {
        self.elevation + self.thickness
    }
}

/// Ordered layer stack, bottom to top.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer, validating that a `Conducting` layer names a
    /// conducting material and a `Dielectric` layer names a dielectric
    /// material (spec.md §7's "IO/Material lookup failures: ... incomplete
    /// stackup").
    pub fn push(&mut self, layer: Layer) -> LayoutResult<()> {
        match layer.kind {
            LayerKind::Conducting if layer.conducting_material.is_none() => {
                return Err(LayoutError::IncompleteStackup {
                    what: format!("conducting layer '{}' has no conducting material", layer.name),
                });
            }
            LayerKind::Dielectric if layer.dielectric_material.is_none() => {
                return Err(LayoutError::IncompleteStackup {
                    what: format!("dielectric layer '{}' has no dielectric material", layer.name),
                });
            }
            _ => {}
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn total_thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }

    /// The layer whose `[elevation, top())` span contains `z`, if any.
    pub fn layer_at_elevation(&self, z: f64) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| z >= l.elevation && z < l.top())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_core::Id;

    #[test]
    fn conducting_layer_without_material_is_rejected() {
        let mut stack = LayerStack::new();
        let layer = Layer {
            name: "M1".into(),
            kind: LayerKind::Conducting,
            elevation: 0.0,
            thickness: 1e-3,
            conducting_material: None,
            dielectric_material: None,
        };
        assert!(matches!(stack.push(layer), Err(LayoutError::IncompleteStackup { .. })));
    }

    #[test]
    fn layer_at_elevation_finds_containing_layer() {
        let mut stack = LayerStack::new();
        stack
            .push(Layer {
                name: "M1".into(),
                kind: LayerKind::Conducting,
                elevation: 0.0,
                thickness: 1.0,
                conducting_material: Some(Id::from_index(0)),
                dielectric_material: None,
            })
            .unwrap();
        stack
            .push(Layer {
                name: "D1".into(),
                kind: LayerKind::Dielectric,
                elevation: 1.0,
                thickness: 2.0,
                conducting_material: None,
                dielectric_material: Some(Id::from_index(1)),
            })
            .unwrap();

        assert_eq!(stack.layer_at_elevation(0.5).unwrap().name, "M1");
        assert_eq!(stack.layer_at_elevation(2.5).unwrap().name, "D1");
        assert!(stack.layer_at_elevation(10.0).is_none());
    }
}
