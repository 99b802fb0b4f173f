//! Per-layer polygon geometry (spec.md §6).

use thermal_core::MaterialId;

use crate::power::{BBox2, PowerTable};

/// A 2-D polygon footprint on one layer, ordered vertices, not necessarily
/// closed (the last-to-first edge is implicit).
#[derive(Debug, Clone)]
pub struct Polygon {
    pub points: Vec<(f64, f64)>,
    pub material: MaterialId,
    pub net: Option<String>,
    pub power_block: Option<PowerBlock>,
}

impl Polygon {
    /// Signed area via the shoelace formula; `abs()` for the geometric area.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let (x0, y0) = self.points[i];
            let (x1, y1) = self.points[(i + 1) % n];
            acc += x0 * y1 - x1 * y0;
        }
        acc * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn bbox(&self) -> BBox2 {
        let xs = self.points.iter().map(|p| p.0);
        let ys = self.points.iter().map(|p| p.1);
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for x in xs {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }
        for y in ys {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        BBox2 { ll: (min_x, min_y), ur: (max_x, max_y) }
    }

    /// Ray-casting point-in-polygon test, used by extractors to locate the
    /// enclosing polygon for a triangle centroid / voxel center.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let (xi, yi) = self.points[i];
            let (xj, yj) = self.points[j];
            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// A power-block annotation attached to a polygon (spec.md §6).
#[derive(Debug, Clone)]
pub struct PowerBlock {
    pub scenario: String,
    pub table: PowerTable,
    pub elevation_range: (f64, f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_core::Id;

    fn square(side: f64) -> Polygon {
        Polygon {
            points: vec![(0.0, 0.0), (side, 0.0), (side, side), (0.0, side)],
            material: Id::from_index(0),
            net: None,
            power_block: None,
        }
    }

    #[test]
    fn area_of_unit_square_is_one() {
        assert!((square(1.0).area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn contains_point_inside_and_outside() {
        let sq = square(2.0);
        assert!(sq.contains_point(1.0, 1.0));
        assert!(!sq.contains_point(3.0, 3.0));
    }

    #[test]
    fn bbox_matches_vertex_extent() {
        let sq = square(2.0);
        let bbox = sq.bbox();
        assert_eq!(bbox.ll, (0.0, 0.0));
        assert_eq!(bbox.ur, (2.0, 2.0));
    }
}
