//! JSON scenario files consumed by the `steady`/`transient`/`mesh`
//! subcommands: `serde_json` turns an input file into the domain types the
//! solver crates expect.

use std::collections::HashMap;

use serde::Deserialize;
use thermal_layout::{
    MaterialDb, MaterialKind, MaterialProperty, PolyT, Polygon,
};
use thermal_network::ThermalNetwork;
use thermal_prism::{PrismBoundaryInputs, PrismaLayerSpec};

/// A raw node/link network (spec.md §3, §4.1), the direct JSON shape of the
/// scenarios exercised by `thermal-network`'s and `thermal-solver`'s own
/// test suites.
#[derive(Debug, Deserialize)]
pub struct NetworkScenario {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default = "default_ref_temperature")]
    pub ref_temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub t: Option<f64>,
    #[serde(default)]
    pub c: f64,
    #[serde(default)]
    pub hf: f64,
    #[serde(default)]
    pub htc: f64,
}

#[derive(Debug, Deserialize)]
pub struct LinkSpec {
    pub a: usize,
    pub b: usize,
    pub r: f64,
}

fn default_ref_temperature() -> f64 {
    thermal_core::DEFAULT_REF_TEMPERATURE
}

impl NetworkScenario {
    pub fn build(&self) -> anyhow::Result<ThermalNetwork> {
        let mut net = ThermalNetwork::new(self.nodes.len());
        for (i, spec) in self.nodes.iter().enumerate() {
            if let Some(t) = spec.t {
                net.set_t(i, t);
            }
            net.set_c(i, spec.c);
            net.set_hf(i, spec.hf);
            net.set_htc(i, spec.htc);
        }
        for link in &self.links {
            net.set_r(link.a, link.b, link.r)
                .map_err(|e| anyhow::anyhow!("scenario link {}-{}: {}", link.a, link.b, e))?;
        }
        Ok(net)
    }

    /// Initial state for a transient run: each node's pinned `t` if given,
    /// else `ref_temperature`.
    pub fn initial_state(&self) -> Vec<f64> {
        self.nodes
            .iter()
            .map(|n| n.t.unwrap_or(self.ref_temperature))
            .collect()
    }
}

/// A simplified stackup scenario (spec.md §4.7/§6): materials, per-layer
/// polygons, and uniform top/bottom boundary conditions. Bondwires,
/// components, and per-polygon power tables are not exposed through this
/// JSON surface — callers needing them use `thermal_prism` directly.
#[derive(Debug, Deserialize)]
pub struct MeshScenario {
    pub materials: Vec<MaterialSpec>,
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub boundary: BoundarySpec,
    #[serde(default = "default_ref_temperature")]
    pub ref_temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    #[serde(default)]
    pub fluid: bool,
    pub k: f64,
    pub rho: f64,
    pub cp: f64,
    #[serde(default)]
    pub rho_el: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LayerSpec {
    pub elevation: f64,
    pub thickness: f64,
    pub polygons: Vec<PolygonSpec>,
}

#[derive(Debug, Deserialize)]
pub struct PolygonSpec {
    pub points: Vec<(f64, f64)>,
    pub material: String,
    #[serde(default)]
    pub net: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BoundarySpec {
    #[serde(default)]
    pub top: Option<BcSpec>,
    #[serde(default)]
    pub bottom: Option<BcSpec>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BcSpec {
    Htc { value: f64 },
    HeatFlow { value: f64 },
    Temperature { value: f64 },
}

impl From<BcSpec> for thermal_layout::BoundaryCondition {
    fn from(spec: BcSpec) -> Self {
        match spec {
            BcSpec::Htc { value } => thermal_layout::BoundaryCondition::Htc(value),
            BcSpec::HeatFlow { value } => thermal_layout::BoundaryCondition::HeatFlow(value),
            BcSpec::Temperature { value } => thermal_layout::BoundaryCondition::Temperature(value),
        }
    }
}

fn uniform_bc(spec: BcSpec, orientation: thermal_layout::Orientation) -> thermal_layout::UniformBc {
    thermal_layout::UniformBc { orientation, bc: spec.into() }
}

impl MeshScenario {
    pub fn build(&self) -> anyhow::Result<(MaterialDb, Vec<PrismaLayerSpec>, PrismBoundaryInputs)> {
        let mut materials = MaterialDb::new();
        let mut by_name = HashMap::new();
        for m in &self.materials {
            let kind = if m.fluid { MaterialKind::Fluid } else { MaterialKind::Solid };
            let mut builder = materials
                .insert(m.name.clone(), kind)
                .thermal_conductivity(MaterialProperty::Scalar(PolyT::constant(m.k)))
                .density(MaterialProperty::Scalar(PolyT::constant(m.rho)))
                .specific_heat(MaterialProperty::Scalar(PolyT::constant(m.cp)));
            if let Some(rho_el) = m.rho_el {
                builder = builder.electrical_resistivity(MaterialProperty::Scalar(PolyT::constant(rho_el)));
            }
            let id = builder.build();
            by_name.insert(m.name.clone(), id);
        }

        let mut layer_specs = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut polygons = Vec::with_capacity(layer.polygons.len());
            for p in &layer.polygons {
                let material = *by_name
                    .get(&p.material)
                    .ok_or_else(|| anyhow::anyhow!("unknown material: {}", p.material))?;
                polygons.push(Polygon {
                    points: p.points.clone(),
                    material,
                    net: p.net.clone(),
                    power_block: None,
                });
            }
            layer_specs.push(PrismaLayerSpec {
                elevation: layer.elevation,
                thickness: layer.thickness,
                polygons,
                steiner: Vec::new(),
            });
        }

        let boundary = PrismBoundaryInputs {
            top_uniform: self
                .boundary
                .top
                .map(|b| uniform_bc(b, thermal_layout::Orientation::Top)),
            bottom_uniform: self
                .boundary
                .bottom
                .map(|b| uniform_bc(b, thermal_layout::Orientation::Bottom)),
            top_blocks: Vec::new(),
            bottom_blocks: Vec::new(),
        };

        Ok((materials, layer_specs, boundary))
    }
}
