//! Network construction (spec.md §4.7): inter-centroid resistances, element
//! capacitance, bondwire Joule heat, and boundary-condition binding.

use thermal_core::DEFAULT_REF_TEMPERATURE;
use thermal_layout::{BlockBc, Bondwire, BoundaryCondition, MaterialDb, PowerModel, UniformBc};
use thermal_network::ThermalNetwork;

use crate::adjacency;
use crate::element::{BOT_NEIGHBOR_INDEX, NO_NEIGHBOR, PrismaLayer, TOP_NEIGHBOR_INDEX};
use crate::error::PrismResult;
use crate::geometry2;
use crate::layer::{MeshMode, PrismaLayerSpec, build_layers};
use crate::mesh::MeshParams;

#[derive(Debug, Clone)]
pub struct PrismExtractOptions {
    pub ref_t: f64,
    pub mode: MeshMode,
    pub mesh: MeshParams,
}

impl Default for PrismExtractOptions {
    fn default() -> Self {
        Self {
            ref_t: DEFAULT_REF_TEMPERATURE,
            mode: MeshMode::SingleTemplate,
            mesh: MeshParams::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrismBoundaryInputs {
    pub top_uniform: Option<UniformBc>,
    pub bottom_uniform: Option<UniformBc>,
    pub top_blocks: Vec<BlockBc>,
    pub bottom_blocks: Vec<BlockBc>,
}

/// A global 3-D vertex plus per-element 6-vertex wedge connectivity, for
/// `vtk::write_legacy_ascii`.
#[derive(Debug, Clone, Default)]
pub struct PrismGeometry {
    pub points: Vec<[f64; 3]>,
    pub cells: Vec<[usize; 6]>,
}

pub struct PrismExtractor;

impl PrismExtractor {
    pub fn extract(
        specs: &[PrismaLayerSpec],
        materials: &MaterialDb,
        bondwires: &[Bondwire],
        boundary: &PrismBoundaryInputs,
        options: &PrismExtractOptions,
    ) -> PrismResult<(ThermalNetwork, PrismGeometry)> {
        let mut layers = build_layers(specs, materials, &options.mode, &options.mesh)?;
        adjacency::wire(&mut layers, &options.mode);

        let offs = adjacency::offsets(&layers);
        let total_prisma = *offs.last().unwrap();
        let mut network = ThermalNetwork::new(total_prisma + bondwires.len());
        let ref_t = options.ref_t;

        Self::stamp_capacitance(&mut network, &layers, materials, ref_t)?;
        Self::stamp_in_plane(&mut network, &layers, materials, ref_t)?;
        Self::stamp_vertical(&mut network, &layers, &offs, materials, ref_t)?;
        Self::stamp_power(&mut network, &layers, ref_t);
        Self::stamp_bondwires(&mut network, &layers, materials, bondwires, total_prisma, ref_t)?;
        Self::stamp_boundary(&mut network, &layers, &offs, boundary);

        let geometry = Self::build_geometry(&layers, bondwires);

        Ok((network, geometry))
    }

    fn stamp_capacitance(
        network: &mut ThermalNetwork,
        layers: &[PrismaLayer],
        materials: &MaterialDb,
        ref_t: f64,
    ) -> PrismResult<()> {
        let offs = adjacency::offsets(layers);
        for (li, layer) in layers.iter().enumerate() {
            for element in &layer.elements {
                let material = materials.get(element.material)?;
                let area = layer.mesh.area(element.template_id);
                let volume = area * layer.thickness;
                network.set_c(offs[li] + element.id, material.volumetric_heat_capacity(ref_t) * volume);
            }
        }
        Ok(())
    }

    fn stamp_in_plane(
        network: &mut ThermalNetwork,
        layers: &[PrismaLayer],
        materials: &MaterialDb,
        ref_t: f64,
    ) -> PrismResult<()> {
        let offs = adjacency::offsets(layers);
        for (li, layer) in layers.iter().enumerate() {
            for element in &layer.elements {
                let idx = offs[li] + element.id;
                let k_self = materials.get(element.material)?.thermal_conductivity.eval(ref_t);
                let tri = layer.mesh.triangle_points(element.template_id);
                let centroid = geometry2::centroid(tri[0], tri[1], tri[2]);

                for k in 0..3 {
                    let nb = element.neighbors[k];
                    if nb == NO_NEIGHBOR || nb <= idx {
                        continue;
                    }
                    let (other_li, other_local) = Self::locate(&offs, nb);
                    let other = &layers[other_li].elements[other_local];
                    let k_other = materials.get(other.material)?.thermal_conductivity.eval(ref_t);
                    let other_tri = layers[other_li].mesh.triangle_points(other.template_id);
                    let other_centroid = geometry2::centroid(other_tri[0], other_tri[1], other_tri[2]);

                    let (e0, e1) = shared_edge(&tri, &other_tri);
                    let d_a = geometry2::point_to_line_distance(centroid, e0, e1);
                    let d_b = geometry2::point_to_line_distance(other_centroid, e0, e1);
                    let face_area = geometry2::dist(e0, e1) * layer.thickness;
                    let r = d_a / (k_self * face_area) + d_b / (k_other * face_area);
                    if r.is_finite() && r > 0.0 {
                        network.set_r(idx, nb, r)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn stamp_vertical(
        network: &mut ThermalNetwork,
        layers: &[PrismaLayer],
        offs: &[usize],
        materials: &MaterialDb,
        ref_t: f64,
    ) -> PrismResult<()> {
        for (li, layer) in layers.iter().enumerate() {
            for element in &layer.elements {
                let idx = offs[li] + element.id;
                let k_self = materials.get(element.material)?.thermal_conductivity.eval(ref_t);
                let area = layer.mesh.area(element.template_id);

                if element.uses_bot_contacts() {
                    for &(other_idx, overlap_area) in &element.bot_contacts {
                        if other_idx <= idx {
                            continue;
                        }
                        let (other_li, other_local) = Self::locate(offs, other_idx);
                        let other_layer = &layers[other_li];
                        let other = &other_layer.elements[other_local];
                        let k_other = materials.get(other.material)?.thermal_conductivity.eval(ref_t);
                        let d_a = layer.thickness / 2.0;
                        let d_b = other_layer.thickness / 2.0;
                        let r = d_a / (k_self * overlap_area) + d_b / (k_other * overlap_area);
                        if r.is_finite() && r > 0.0 {
                            network.set_r(idx, other_idx, r)?;
                        }
                    }
                } else {
                    let nb = element.neighbors[BOT_NEIGHBOR_INDEX];
                    if nb != NO_NEIGHBOR && nb > idx {
                        let (other_li, other_local) = Self::locate(offs, nb);
                        let other_layer = &layers[other_li];
                        let other = &other_layer.elements[other_local];
                        let k_other = materials.get(other.material)?.thermal_conductivity.eval(ref_t);
                        let d_a = layer.thickness / 2.0;
                        let d_b = other_layer.thickness / 2.0;
                        let r = d_a / (k_self * area) + d_b / (k_other * area);
                        if r.is_finite() && r > 0.0 {
                            network.set_r(idx, nb, r)?;
                        }
                    }
                }

                if element.uses_top_contacts() {
                    for &(other_idx, overlap_area) in &element.top_contacts {
                        if other_idx <= idx {
                            continue;
                        }
                        let (other_li, other_local) = Self::locate(offs, other_idx);
                        let other_layer = &layers[other_li];
                        let other = &other_layer.elements[other_local];
                        let k_other = materials.get(other.material)?.thermal_conductivity.eval(ref_t);
                        let d_a = layer.thickness / 2.0;
                        let d_b = other_layer.thickness / 2.0;
                        let r = d_a / (k_self * overlap_area) + d_b / (k_other * overlap_area);
                        if r.is_finite() && r > 0.0 {
                            network.set_r(idx, other_idx, r)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn stamp_power(network: &mut ThermalNetwork, layers: &[PrismaLayer], ref_t: f64) {
        let offs = adjacency::offsets(layers);
        for (li, layer) in layers.iter().enumerate() {
            for element in &layer.elements {
                if let (Some(ratio), Some(table)) = (element.power_ratio, &element.power_table) {
                    let model = PowerModel::PerTile { table: table.clone() };
                    network.add_hf(offs[li] + element.id, model.evaluate(ref_t, 0.0, 0.0) * ratio);
                }
            }
        }
    }

    fn stamp_bondwires(
        network: &mut ThermalNetwork,
        layers: &[PrismaLayer],
        materials: &MaterialDb,
        bondwires: &[Bondwire],
        total_prisma: usize,
        ref_t: f64,
    ) -> PrismResult<()> {
        for (i, wire) in bondwires.iter().enumerate() {
            let wire_idx = total_prisma + i;
            let material = materials.get(wire.material)?;
            let k_wire = material.thermal_conductivity.eval(ref_t);
            let rho_el = material
                .electrical_resistivity
                .as_ref()
                .map(|p| p.eval(ref_t))
                .unwrap_or(0.0);
            network.set_hf(wire_idx, wire.joule_heat(rho_el));

            let alpha = wire.jump_conductance(k_wire);
            if !alpha.is_finite() || alpha <= 0.0 {
                continue;
            }
            let r_half = 2.0 / alpha;
            if let Some(start) = nearest_element(layers, wire.start) {
                network.set_r(wire_idx, start, r_half)?;
            }
            if let Some(end) = nearest_element(layers, wire.end) {
                network.set_r(wire_idx, end, r_half)?;
            }
        }
        Ok(())
    }

    fn stamp_boundary(
        network: &mut ThermalNetwork,
        layers: &[PrismaLayer],
        offs: &[usize],
        boundary: &PrismBoundaryInputs,
    ) {
        for (li, layer) in layers.iter().enumerate() {
            let is_top_layer = li + 1 == layers.len();
            let is_bot_layer = li == 0;
            for element in &layer.elements {
                let idx = offs[li] + element.id;
                let area = layer.mesh.area(element.template_id);
                let (cx, cy) = layer.mesh.centroid(element.template_id);

                let exposed_top = is_top_layer && element.neighbors[TOP_NEIGHBOR_INDEX] == NO_NEIGHBOR;
                if exposed_top {
                    let z = layer.top();
                    let bc = boundary
                        .top_blocks
                        .iter()
                        .find(|b| b.bbox.contains(cx, cy, z))
                        .map(|b| b.bc)
                        .or(boundary.top_uniform.map(|u| u.bc));
                    if let Some(bc) = bc {
                        apply(network, idx, bc, area);
                    }
                }

                let exposed_bot = is_bot_layer && element.neighbors[BOT_NEIGHBOR_INDEX] == NO_NEIGHBOR;
                if exposed_bot {
                    let z = layer.elevation;
                    let bc = boundary
                        .bottom_blocks
                        .iter()
                        .find(|b| b.bbox.contains(cx, cy, z))
                        .map(|b| b.bc)
                        .or(boundary.bottom_uniform.map(|u| u.bc));
                    if let Some(bc) = bc {
                        apply(network, idx, bc, area);
                    }
                }
            }
        }
    }

    fn build_geometry(layers: &[PrismaLayer], bondwires: &[Bondwire]) -> PrismGeometry {
        let mut points = Vec::new();
        let mut cells = Vec::new();
        for layer in layers {
            for element in &layer.elements {
                let tri = layer.mesh.triangle_points(element.template_id);
                let mut cell = [0usize; 6];
                for (i, &(x, y)) in tri.iter().enumerate() {
                    cell[i] = points.len();
                    points.push([x, y, layer.elevation]);
                }
                for (i, &(x, y)) in tri.iter().enumerate() {
                    cell[i + 3] = points.len();
                    points.push([x, y, layer.top()]);
                }
                cells.push(cell);
            }
        }
        let _ = bondwires;
        PrismGeometry { points, cells }
    }

    fn locate(offs: &[usize], global: usize) -> (usize, usize) {
        for li in 0..offs.len() - 1 {
            if global >= offs[li] && global < offs[li + 1] {
                return (li, global - offs[li]);
            }
        }
        unreachable!("global element index out of range")
    }
}

fn shared_edge(a: &[(f64, f64); 3], b: &[(f64, f64); 3]) -> ((f64, f64), (f64, f64)) {
    let mut shared = Vec::new();
    for &pa in a {
        if b.iter().any(|&pb| geometry2::dist(pa, pb) < 1e-9) {
            shared.push(pa);
        }
    }
    if shared.len() >= 2 {
        (shared[0], shared[1])
    } else {
        (a[0], a[1])
    }
}

fn nearest_element(layers: &[PrismaLayer], point: [f64; 3]) -> Option<usize> {
    let offs = adjacency::offsets(layers);
    let (li, layer) = layers
        .iter()
        .enumerate()
        .find(|(_, l)| point[2] >= l.elevation && point[2] <= l.top())?;
    let mut best: Option<(usize, f64)> = None;
    for element in &layer.elements {
        let (cx, cy) = layer.mesh.centroid(element.template_id);
        let d = geometry2::dist((cx, cy), (point[0], point[1]));
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((element.id, d));
        }
    }
    best.map(|(local, _)| offs[li] + local)
}

fn apply(network: &mut ThermalNetwork, node: usize, bc: BoundaryCondition, area: f64) {
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
