//! Boundary conditions (spec.md §4.6, §4.8, §9): a tagged variant `{ HTC(h),
//! HeatFlow(q), Temperature(T) }` with a single application operation
//! against a target face area.

/// Which face of the stackup a uniform/block boundary condition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    Htc(f64),
    HeatFlow(f64),
    Temperature(f64),
}

/// The effect of applying a `BoundaryCondition` against a face of area `A`
/// (spec.md §4.8): accumulate into `htc`/`hf`, or pin the node's
/// temperature and exclude it from the solved subsystem via substitution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BcContribution {
    pub htc_delta: f64,
    pub hf_delta: f64,
    pub pinned_temperature: Option<f64>,
}

impl BoundaryCondition {
    pub fn apply(&self, area: f64) -> BcContribution {
        match *self {
            BoundaryCondition::Htc(h) => BcContribution { htc_delta: h * area, ..Default::default() },
            BoundaryCondition::HeatFlow(q) => {
                BcContribution { hf_delta: q * area, ..Default::default() }
            }
            BoundaryCondition::Temperature(t) => {
                BcContribution { pinned_temperature: Some(t), ..Default::default() }
            }
        }
    }
}

/// An axis-aligned 3-D box, used by `block(orientation, bbox, bc)` to select
/// a voxel/element range (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox3 {
    pub lo: (f64, f64, f64),
    pub hi: (f64, f64, f64),
}

impl BBox3 {
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        x >= self.lo.0
            && x <= self.hi.0
            && y >= self.lo.1
            && y <= self.hi.1
            && z >= self.lo.2
            && z <= self.hi.2
    }
}

/// `uniform(orientation, bc)`: the same `bc` applied to every tile/element
/// of the named face.
#[derive(Debug, Clone, Copy)]
pub struct UniformBc {
    pub orientation: Orientation,
    pub bc: BoundaryCondition,
}

/// `block(orientation, bbox, bc)`: `bc` applied only within `bbox`.
#[derive(Debug, Clone, Copy)]
pub struct BlockBc {
    pub orientation: Orientation,
    pub bbox: BBox3,
    pub bc: BoundaryCondition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn htc_accumulates_h_times_area() {
        let contrib = BoundaryCondition::Htc(2.0).apply(5.0);
        assert!((contrib.htc_delta - 10.0).abs() < 1e-12);
        assert_eq!(contrib.hf_delta, 0.0);
        assert!(contrib.pinned_temperature.is_none());
    }

    #[test]
    fn heat_flow_accumulates_q_times_area_signed() {
        let contrib = BoundaryCondition::HeatFlow(-3.0).apply(2.0);
        assert!((contrib.hf_delta - (-6.0)).abs() < 1e-12);
    }

    #[test]
    fn temperature_pins_and_ignores_area() {
        let contrib = BoundaryCondition::Temperature(300.0).apply(1000.0);
        assert_eq!(contrib.pinned_temperature, Some(300.0));
        assert_eq!(contrib.htc_delta, 0.0);
        assert_eq!(contrib.hf_delta, 0.0);
    }

    #[test]
    fn bbox3_contains_checks_all_axes() {
        let b = BBox3 { lo: (0.0, 0.0, 0.0), hi: (1.0, 1.0, 1.0) };
        assert!(b.contains(0.5, 0.5, 0.5));
        assert!(!b.contains(2.0, 0.5, 0.5));
    }
}
