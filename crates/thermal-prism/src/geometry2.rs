//! Triangle-level 2-D geometry (spec.md §4.7): area, centroid, perpendicular
//! distance to an edge, and convex-convex clipping for contact-area overlap.

pub type Pt = (f64, f64);

pub fn signed_area(a: Pt, b: Pt, c: Pt) -> f64 {
    0.5 * ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1))
}

pub fn area(a: Pt, b: Pt, c: Pt) -> f64 {
    signed_area(a, b, c).abs()
}

pub fn centroid(a: Pt, b: Pt, c: Pt) -> Pt {
    ((a.0 + b.0 + c.0) / 3.0, (a.1 + b.1 + c.1) / 3.0)
}

pub fn dist(a: Pt, b: Pt) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

/// Interior angle at vertex `b` of triangle `(a,b,c)`, in degrees.
pub fn angle_at(a: Pt, b: Pt, c: Pt) -> f64 {
    let u = (a.0 - b.0, a.1 - b.1);
    let v = (c.0 - b.0, c.1 - b.1);
    let dot = u.0 * v.0 + u.1 * v.1;
    let nu = (u.0 * u.0 + u.1 * u.1).sqrt();
    let nv = (v.0 * v.0 + v.1 * v.1).sqrt();
    if nu <= 0.0 || nv <= 0.0 {
        return 0.0;
    }
    (dot / (nu * nv)).clamp(-1.0, 1.0).acos().to_degrees()
}

/// The smallest interior angle of `(a,b,c)`, in degrees.
pub fn min_angle(a: Pt, b: Pt, c: Pt) -> f64 {
    angle_at(c, a, b).min(angle_at(a, b, c)).min(angle_at(b, c, a))
}

/// Perpendicular distance from `p` to the centroid-opposite edge `(e0,e1)`,
/// used for the inter-centroid resistance's `d_a`/`d_b` terms.
pub fn point_to_line_distance(p: Pt, e0: Pt, e1: Pt) -> f64 {
    let len = dist(e0, e1);
    if len <= 0.0 {
        return dist(p, e0);
    }
    ((e1.0 - e0.0) * (e0.1 - p.1) - (e0.0 - p.0) * (e1.1 - e0.1)).abs() / len
}

/// Sutherland-Hodgman clip of convex polygon `subject` against convex
/// polygon `clip` (both CCW), returning the intersection polygon's vertices.
/// Used to compute stacked-layer contact areas between two triangles.
pub fn clip_convex(subject: &[Pt], clip: &[Pt]) -> Vec<Pt> {
    let mut output = subject.to_vec();
    let n = clip.len();
    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let edge_a = clip[i];
        let edge_b = clip[(i + 1) % n];
        let input = std::mem::take(&mut output);
        let m = input.len();
        for j in 0..m {
            let current = input[j];
            let prev = input[(j + m - 1) % m];
            let current_inside = is_inside(edge_a, edge_b, current);
            let prev_inside = is_inside(edge_a, edge_b, prev);
            if current_inside {
                if !prev_inside {
                    output.push(segment_intersection(prev, current, edge_a, edge_b));
                }
                output.push(current);
            } else if prev_inside {
                output.push(segment_intersection(prev, current, edge_a, edge_b));
            }
        }
    }
    output
}

fn is_inside(edge_a: Pt, edge_b: Pt, p: Pt) -> bool {
    (edge_b.0 - edge_a.0) * (p.1 - edge_a.1) - (edge_b.1 - edge_a.1) * (p.0 - edge_a.0) >= 0.0
}

fn segment_intersection(a: Pt, b: Pt, c: Pt, d: Pt) -> Pt {
    let a1 = b.1 - a.1;
    let b1 = a.0 - b.0;
    let c1 = a1 * a.0 + b1 * a.1;
    let a2 = d.1 - c.1;
    let b2 = c.0 - d.0;
    let c2 = a2 * c.0 + b2 * c.1;
    let det = a1 * b2 - a2 * b1;
    if det.abs() < 1e-15 {
        return b;
    }
    ((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det)
}

/// Area of the intersection of two (CCW-oriented) triangles.
pub fn triangle_overlap_area(t1: &[Pt; 3], t2: &[Pt; 3]) -> f64 {
    let ccw = |t: &[Pt; 3]| {
        if signed_area(t[0], t[1], t[2]) < 0.0 {
            [t[2], t[1], t[0]]
        } else {
            *t
        }
    };
    let a = ccw(t1);
    let b = ccw(t2);
    let poly = clip_convex(&a, &b);
    if poly.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..poly.len() {
        let (x0, y0) = poly[i];
        let (x1, y1) = poly[(i + 1) % poly.len()];
        acc += x0 * y1 - x1 * y0;
    }
    (acc * 0.5).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_unit_squares_give_quarter_area_for_half_offset_triangles() {
        // Two right triangles, one shifted by 0.5 along x: overlap should be
        // a smaller triangle whose area is 1/4 of the original (scenario 6).
        let t1: [Pt; 3] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let t2: [Pt; 3] = [(0.5, 0.0), (1.5, 0.0), (0.5, 1.0)];
        let overlap = triangle_overlap_area(&t1, &t2);
        let full = area(t1[0], t1[1], t1[2]);
        assert!((overlap / full - 0.25).abs() < 1e-9);
    }

    #[test]
    fn min_angle_of_equilateral_triangle_is_sixty_degrees() {
        let h = (3.0_f64).sqrt() / 2.0;
        let a = min_angle((0.0, 0.0), (1.0, 0.0), (0.5, h));
        assert!((a - 60.0).abs() < 1e-6);
    }

    #[test]
    fn point_to_line_distance_matches_perpendicular_offset() {
        let d = point_to_line_distance((0.0, 2.0), (0.0, 0.0), (1.0, 0.0));
        assert!((d - 2.0).abs() < 1e-12);
    }
}
