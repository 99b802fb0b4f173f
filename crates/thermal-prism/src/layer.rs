//! Per-layer meshing and element population (spec.md §4.7).

use thermal_layout::{MaterialDb, MaterialKind, Polygon};

use crate::element::{PrismaElement, PrismaLayer};
use crate::error::PrismResult;
use crate::mesh::{Mesh, MeshParams, triangulate};

/// `imprintUpperLayer`: stacked mode's upper layer polygons are folded into
/// the current layer's constraint set before meshing it.
#[derive(Debug, Clone)]
pub enum MeshMode {
    SingleTemplate,
    StackedPerLayer { imprint_upper_layer: bool },
}

#[derive(Debug, Clone)]
pub struct PrismaLayerSpec {
    pub elevation: f64,
    pub thickness: f64,
    pub polygons: Vec<Polygon>,
    pub steiner: Vec<(f64, f64)>,
}

fn points_from(polygons: &[Polygon]) -> Vec<Vec<(f64, f64)>> {
    polygons.iter().map(|p| p.points.clone()).collect()
}

fn populate_elements(
    mesh: &Mesh,
    polygons: &[Polygon],
    materials: &MaterialDb,
    layer_elevation: f64,
    layer_top: f64,
) -> PrismResult<(Vec<PrismaElement>, Vec<Option<usize>>)> {
    let mut elements = Vec::new();
    let mut template_to_element = vec![None; mesh.triangles.len()];

    for t in 0..mesh.triangles.len() {
        let (cx, cy) = mesh.centroid(t);
        let Some(polygon) = polygons.iter().find(|p| p.contains_point(cx, cy)) else {
            continue;
        };
        let material = materials.get(polygon.material)?;
        if material.kind == MaterialKind::Fluid {
            continue;
        }

        let mut power_ratio = None;
        let mut power_table = None;
        if let Some(block) = &polygon.power_block {
            let (_bottom, top) = block.elevation_range;
            if top > layer_elevation && top <= layer_top {
                let element_area = mesh.area(t);
                let polygon_area = polygon.area();
                if polygon_area > 0.0 {
                    power_ratio = Some(element_area / polygon_area);
                    power_table = Some(block.table.clone());
                }
            }
        }

        let id = elements.len();
        template_to_element[t] = Some(id);
        elements.push(PrismaElement {
            id,
            template_id: t,
            material: polygon.material,
            net: polygon.net.clone(),
            power_ratio,
            power_table,
            neighbors: [crate::element::NO_NEIGHBOR; 5],
            top_contacts: Vec::new(),
            bot_contacts: Vec::new(),
        });
    }

    Ok((elements, template_to_element))
}

fn wire_in_plane_neighbors(mesh: &Mesh, elements: &mut [PrismaElement], template_to_element: &[Option<usize>]) {
    for element in elements.iter_mut() {
        let tri_neighbors = mesh.neighbors[element.template_id];
        for (k, nb) in tri_neighbors.iter().enumerate() {
            if let Some(nt) = nb {
                if let Some(ne) = template_to_element[*nt] {
                    element.neighbors[k] = ne;
                }
            }
        }
    }
}

/// Build every layer's mesh and elements. Returns layers with purely local
/// (per-layer) element indices and in-plane neighbors; the caller
/// (`PrismExtractor`) assigns global offsets and wires vertical adjacency.
pub fn build_layers(
    specs: &[PrismaLayerSpec],
    materials: &MaterialDb,
    mode: &MeshMode,
    params: &MeshParams,
) -> PrismResult<Vec<PrismaLayer>> {
    let mut layers = Vec::with_capacity(specs.len());

    let shared_template = match mode {
        MeshMode::SingleTemplate => {
            let all_loops: Vec<Vec<(f64, f64)>> =
                specs.iter().flat_map(|s| points_from(&s.polygons)).collect();
            let all_steiner: Vec<(f64, f64)> =
                specs.iter().flat_map(|s| s.steiner.iter().copied()).collect();
            Some(triangulate(&all_loops, &all_steiner, params)?)
        }
        MeshMode::StackedPerLayer { .. } => None,
    };

    for (i, spec) in specs.iter().enumerate() {
        let mesh = match (&shared_template, mode) {
            (Some(template), _) => template.clone(),
            (None, MeshMode::StackedPerLayer { imprint_upper_layer }) => {
                let mut loops = points_from(&spec.polygons);
                if *imprint_upper_layer {
                    if let Some(upper) = specs.get(i + 1) {
                        loops.extend(points_from(&upper.polygons));
                    }
                }
                triangulate(&loops, &spec.steiner, params)?
            }
            (None, MeshMode::SingleTemplate) => unreachable!("shared_template computed above"),
        };

        let (mut elements, template_to_element) =
            populate_elements(&mesh, &spec.polygons, materials, spec.elevation, spec.elevation + spec.thickness)?;
        wire_in_plane_neighbors(&mesh, &mut elements, &template_to_element);

        layers.push(PrismaLayer {
            id: i,
            elevation: spec.elevation,
            thickness: spec.thickness,
            mesh,
            elements,
            template_to_element,
        });
    }

    Ok(layers)
}
