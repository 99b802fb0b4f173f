//! Voxel grid extraction (spec.md §4.6): metal-fraction raster -> anisotropic
//! composite conductance/capacitance `ThermalNetwork`.

use rayon::prelude::*;
use thermal_core::DEFAULT_REF_TEMPERATURE;
use thermal_layout::{BlockBc, Bondwire, BoundaryCondition, Component, MaterialDb, PowerModel, UniformBc};
use thermal_network::ThermalNetwork;

use crate::error::{GridError, GridResult};
use crate::spec::GridSpec;

/// `GridExtractor` configuration (spec.md §4.6, §9).
#[derive(Debug, Clone)]
pub struct GridExtractOptions {
    pub ref_t: f64,
    /// Prefer direct per-tile power distribution (spec.md §9's preferred
    /// variant) unless set, in which case a virtual aggregator node per
    /// component is used instead (legacy behavior).
    pub aggregate_components: bool,
    /// Sentinel resistance connecting an aggregator node to its footprint
    /// tiles, only used when `aggregate_components` is set (§9,
    /// `THERMAL_RD` in the original).
    pub aggregator_resistance: f64,
}

impl Default for GridExtractOptions {
    fn default() -> Self {
        Self {
            ref_t: DEFAULT_REF_TEMPERATURE,
            aggregate_components: false,
            aggregator_resistance: 1e-2,
        }
    }
}

/// Boundary conditions applied to the top/bottom faces of the stack
/// (spec.md §6): a single uniform value plus an override list of blocks.
#[derive(Debug, Clone, Default)]
pub struct GridBoundaryInputs {
    pub top_uniform: Option<UniformBc>,
    pub bottom_uniform: Option<UniformBc>,
    pub top_blocks: Vec<BlockBc>,
    pub bottom_blocks: Vec<BlockBc>,
}

struct LayerVoxelData {
    c: Vec<f64>,
    k_x: Vec<f64>,
    k_y: Vec<f64>,
    k_z: Vec<f64>,
}

fn compute_layer(spec: &GridSpec, materials: &MaterialDb, z: usize, ref_t: f64) -> GridResult<LayerVoxelData> {
    let layer = &spec.layers[z];
    let metal = materials.get(layer.metal_material)?;
    let dielectric = materials.get(layer.dielectric_material)?;
    let n = spec.nx * spec.ny;
    let volume = spec.rx * spec.ry * layer.thickness;

    let mut c = vec![0.0_f64; n];
    let mut k_x = vec![0.0_f64; n];
    let mut k_y = vec![0.0_f64; n];
    let mut k_z = vec![0.0_f64; n];

    for i in 0..n {
        let cp = layer.metal_fraction[i];
        c[i] = (cp * metal.volumetric_heat_capacity(ref_t)
            + (1.0 - cp) * dielectric.volumetric_heat_capacity(ref_t))
            * volume;
        k_x[i] = cp * metal.thermal_conductivity.eval_axis(ref_t, 0)
            + (1.0 - cp) * dielectric.thermal_conductivity.eval_axis(ref_t, 0);
        k_y[i] = cp * metal.thermal_conductivity.eval_axis(ref_t, 1)
            + (1.0 - cp) * dielectric.thermal_conductivity.eval_axis(ref_t, 1);
        k_z[i] = cp * metal.thermal_conductivity.eval_axis(ref_t, 2)
            + (1.0 - cp) * dielectric.thermal_conductivity.eval_axis(ref_t, 2);
    }

    Ok(LayerVoxelData { c, k_x, k_y, k_z })
}

pub struct GridExtractor;

impl GridExtractor {
    pub fn extract(
        spec: &GridSpec,
        materials: &MaterialDb,
        components: &[Component],
        bondwires: &[Bondwire],
        boundary: &GridBoundaryInputs,
        options: &GridExtractOptions,
    ) -> GridResult<ThermalNetwork> {
        if spec.num_voxels() == 0 {
            return Err(GridError::EmptyGrid);
        }
        let nx = spec.nx;
        let ny = spec.ny;
        let nz = spec.nz();
        let ref_t = options.ref_t;

        let layer_data: Vec<LayerVoxelData> = spec
            .layers
            .par_iter()
            .enumerate()
            .map(|(z, _)| compute_layer(spec, materials, z, ref_t))
            .collect::<GridResult<Vec<_>>>()?;

        let mut network = ThermalNetwork::new(spec.num_voxels());

        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let i = y * nx + x;
                    network.set_c(spec.index(x, y, z), layer_data[z].c[i]);
                }
            }
        }

        let face_xy = spec.rx * spec.ry;
        for z in 0..nz {
            let thickness = spec.layers[z].thickness;
            for y in 0..ny {
                for x in 0..nx {
                    let i = y * nx + x;
                    let idx = spec.index(x, y, z);

                    if x + 1 < nx {
                        let j = y * nx + (x + 1);
                        let k_a = layer_data[z].k_x[i];
                        let k_b = layer_data[z].k_x[j];
                        let area = spec.ry * thickness;
                        let r = half_resistance(spec.rx, k_a, spec.rx, k_b, area);
                        if r.is_finite() {
                            network.set_r(idx, spec.index(x + 1, y, z), r)?;
                        }
                    }
                    if y + 1 < ny {
                        let j = (y + 1) * nx + x;
                        let k_a = layer_data[z].k_y[i];
                        let k_b = layer_data[z].k_y[j];
                        let area = spec.rx * thickness;
                        let r = half_resistance(spec.ry, k_a, spec.ry, k_b, area);
                        if r.is_finite() {
                            network.set_r(idx, spec.index(x, y + 1, z), r)?;
                        }
                    }
                    if z + 1 < nz {
                        let k_a = layer_data[z].k_z[i];
                        let k_b = layer_data[z + 1].k_z[i];
                        let r = half_resistance(
                            thickness,
                            k_a,
                            spec.layers[z + 1].thickness,
                            k_b,
                            face_xy,
                        );
                        if r.is_finite() {
                            network.set_r(idx, spec.index(x, y, z + 1), r)?;
                        }
                    }
                }
            }
        }

        Self::apply_components(&mut network, spec, components, options);
        Self::apply_bondwires(&mut network, spec, materials, bondwires, ref_t)?;
        Self::apply_boundary(&mut network, spec, boundary, face_xy);

        Ok(network)
    }

    fn apply_components(
        network: &mut ThermalNetwork,
        spec: &GridSpec,
        components: &[Component],
        options: &GridExtractOptions,
    ) {
        let tile_area = spec.rx * spec.ry;
        for component in components {
            let z = component.placement_layer.min(spec.nz().saturating_sub(1));
            let model = PowerModel::Block {
                bbox: component.bbox,
                total_power: component.power_table.clone(),
            };

            let mut covered = Vec::new();
            for y in 0..spec.ny {
                for x in 0..spec.nx {
                    let cx = (x as f64 + 0.5) * spec.rx;
                    let cy = (y as f64 + 0.5) * spec.ry;
                    if component.bbox.contains(cx, cy) {
                        covered.push((spec.index(x, y, z), cx, cy));
                    }
                }
            }
            if covered.is_empty() {
                continue;
            }

            if options.aggregate_components {
                let total_power = component.power_table.interpolate(options.ref_t);
                let aggregator = network.append_node(None);
                network.set_hf(aggregator, total_power);
                for &(tile, _, _) in &covered {
                    // set_r ignores non-positive/non-finite values upstream
                    // via ensure_finite; the sentinel is always positive.
                    network
                        .set_r(aggregator, tile, options.aggregator_resistance)
                        .expect("aggregator sentinel resistance is positive and finite");
                }
            } else {
                for &(tile, cx, cy) in &covered {
                    let density = model.evaluate(options.ref_t, cx, cy);
                    network.add_hf(tile, density * tile_area);
                }
            }
        }
    }

    fn apply_bondwires(
        network: &mut ThermalNetwork,
        spec: &GridSpec,
        materials: &MaterialDb,
        bondwires: &[Bondwire],
        ref_t: f64,
    ) -> GridResult<()> {
        for wire in bondwires {
            let material = materials.get(wire.material)?;
            let k_wire = material.thermal_conductivity.eval(ref_t);
            let alpha = wire.jump_conductance(k_wire);
            if !alpha.is_finite() || alpha <= 0.0 {
                continue;
            }
            let (x0, y0, z0) = spec.nearest_voxel(wire.start[0], wire.start[1], wire.start[2]);
            let (x1, y1, z1) = spec.nearest_voxel(wire.end[0], wire.end[1], wire.end[2]);
            let a = spec.index(x0, y0, z0);
            let b = spec.index(x1, y1, z1);
            if a != b {
                network.set_r(a, b, 1.0 / alpha)?;
            }
        }
        Ok(())
    }

    fn apply_boundary(
        network: &mut ThermalNetwork,
        spec: &GridSpec,
        boundary: &GridBoundaryInputs,
        face_area: f64,
    ) {
        let top_z = spec.nz() - 1;
        for y in 0..spec.ny {
            for x in 0..spec.nx {
                let cx = (x as f64 + 0.5) * spec.rx;
                let cy = (y as f64 + 0.5) * spec.ry;
                let cz_top = spec.center_z(top_z) + spec.layers[top_z].thickness / 2.0;
                let bc = boundary
                    .top_blocks
                    .iter()
                    .find(|b| b.bbox.contains(cx, cy, cz_top))
                    .map(|b| b.bc)
                    .or(boundary.top_uniform.map(|u| u.bc));
                if let Some(bc) = bc {
                    apply_bc(network, spec.index(x, y, top_z), bc, face_area);
                }

                let cz_bot = spec.center_z(0) - spec.layers[0].thickness / 2.0;
                let bc = boundary
                    .bottom_blocks
                    .iter()
                    .find(|b| b.bbox.contains(cx, cy, cz_bot))
                    .map(|b| b.bc)
                    .or(boundary.bottom_uniform.map(|u| u.bc));
                if let Some(bc) = bc {
                    apply_bc(network, spec.index(x, y, 0), bc, face_area);
                }
            }
        }
    }
}

fn apply_bc(network: &mut ThermalNetwork, node: usize, bc: BoundaryCondition, area: f64) {
    let contrib = bc.apply(area);
    if contrib.htc_delta != 0.0 {
        network.add_htc(node, contrib.htc_delta);
    }
    if contrib.hf_delta != 0.0 {
        network.add_hf(node, contrib.hf_delta);
    }
    if let Some(t) = contrib.pinned_temperature {
        network.set_t(node, t);
    }
}

/// `R = h_a/(k_a*A) + h_b/(k_b*A)` (spec.md §4.6), `h_a`/`h_b` being half the
/// two neighbours' full extents along the shared axis.
fn half_resistance(full_a: f64, k_a: f64, full_b: f64, k_b: f64, area: f64) -> f64 {
    let h_a = full_a / 2.0;
    let h_b = full_b / 2.0;
    let term_a = if k_a > 0.0 { h_a / (k_a * area) } else { f64::INFINITY };
    let term_b = if k_b > 0.0 { h_b / (k_b * area) } else { f64::INFINITY };
    term_a + term_b
}
