//! Global indexing and vertical adjacency (spec.md §4.7).

use crate::element::{BOT_NEIGHBOR_INDEX, NO_NEIGHBOR, PrismaLayer, TOP_NEIGHBOR_INDEX};
use crate::geometry2::triangle_overlap_area;
use crate::layer::MeshMode;

/// Global index offset of layer `i`'s first element, `offsets[layers]` is
/// the total element count.
pub fn offsets(layers: &[PrismaLayer]) -> Vec<usize> {
    let mut offsets = vec![0usize];
    for layer in layers {
        offsets.push(offsets.last().unwrap() + layer.elements.len());
    }
    offsets
}

/// Rewrite in-plane neighbor indices (currently per-layer local) to global
/// indices, then wire vertical adjacency per `mode`.
pub fn wire(layers: &mut [PrismaLayer], mode: &MeshMode) {
    let offs = offsets(layers);

    for (li, layer) in layers.iter_mut().enumerate() {
        for element in layer.elements.iter_mut() {
            for k in 0..3 {
                if element.neighbors[k] != NO_NEIGHBOR {
                    element.neighbors[k] += offs[li];
                }
            }
        }
    }

    match mode {
        MeshMode::SingleTemplate => wire_vertical_single_template(layers, &offs),
        MeshMode::StackedPerLayer { .. } => wire_vertical_stacked(layers, &offs),
    }
}

// Layers are ordered by ascending elevation: index 0 is the lowest
// (bottom) layer, the last index is the highest (top) layer. An element's
// "top" neighbor therefore lives at `li+1`, its "bot" neighbor at `li-1`.

fn wire_vertical_single_template(layers: &mut [PrismaLayer], offs: &[usize]) {
    let n_layers = layers.len();
    for li in 0..n_layers {
        if li + 1 < n_layers {
            let (current_slice, above) = layers.split_at_mut(li + 1);
            let current = current_slice.last_mut().unwrap();
            let upper = &above[0];
            for element in current.elements.iter_mut() {
                if let Some(other_local) = upper.template_to_element.get(element.template_id).copied().flatten() {
                    element.neighbors[TOP_NEIGHBOR_INDEX] = offs[li + 1] + other_local;
                }
            }
        }
        if li > 0 {
            let (below, rest) = layers.split_at_mut(li);
            let lower = below.last().unwrap();
            let current = &mut rest[0];
            for element in current.elements.iter_mut() {
                if let Some(other_local) = lower.template_to_element.get(element.template_id).copied().flatten() {
                    element.neighbors[BOT_NEIGHBOR_INDEX] = offs[li - 1] + other_local;
                }
            }
        }
    }
}

fn wire_vertical_stacked(layers: &mut [PrismaLayer], offs: &[usize]) {
    let n_layers = layers.len();
    for li in 0..n_layers {
        if li + 1 < n_layers {
            let contacts = contact_list(layers, li, li + 1, offs);
            let global_base = offs[li];
            for (local_idx, list) in contacts {
                let element = &mut layers[li].elements[local_idx];
                element.top_contacts = list;
                if !element.top_contacts.is_empty() {
                    element.neighbors[TOP_NEIGHBOR_INDEX] = global_base + local_idx;
                }
            }
        }
        if li > 0 {
            let contacts = contact_list(layers, li, li - 1, offs);
            let global_base = offs[li];
            for (local_idx, list) in contacts {
                let element = &mut layers[li].elements[local_idx];
                element.bot_contacts = list;
                if !element.bot_contacts.is_empty() {
                    element.neighbors[BOT_NEIGHBOR_INDEX] = global_base + local_idx;
                }
            }
        }
    }
}

/// For each element of `layers[from]`, bbox-prefiltered overlap against
/// every element of `layers[other]`, returning `(other_global_idx,
/// overlap_area)` pairs keyed by `from`'s local element index.
fn contact_list(
    layers: &[PrismaLayer],
    from: usize,
    other: usize,
    offs: &[usize],
) -> Vec<(usize, Vec<(usize, f64)>)> {
    let mut result = Vec::new();
    let from_layer = &layers[from];
    let other_layer = &layers[other];
    for (local_idx, element) in from_layer.elements.iter().enumerate() {
        let tri = from_layer.mesh.triangle_points(element.template_id);
        let bbox = bbox_of(&tri);

        let mut contacts = Vec::new();
        for (other_local, other_element) in other_layer.elements.iter().enumerate() {
            let other_tri = other_layer.mesh.triangle_points(other_element.template_id);
            let other_bbox = bbox_of(&other_tri);
            if !bboxes_overlap(bbox, other_bbox) {
                continue;
            }
            let area = triangle_overlap_area(&tri, &other_tri);
            if area > 0.0 {
                contacts.push((offs[other] + other_local, area));
            }
        }
        if !contacts.is_empty() {
            result.push((local_idx, contacts));
        }
    }
    result
}

type Bbox = (f64, f64, f64, f64);

fn bbox_of(tri: &[(f64, f64); 3]) -> Bbox {
    let (mut min_x, mut max_x) = (tri[0].0, tri[0].0);
    let (mut min_y, mut max_y) = (tri[0].1, tri[0].1);
    for &(x, y) in &tri[1..] {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    (min_x, max_x, min_y, max_y)
}

fn bboxes_overlap(a: Bbox, b: Bbox) -> bool {
    a.0 <= b.1 && b.0 <= a.1 && a.2 <= b.3 && b.2 <= a.3
}
