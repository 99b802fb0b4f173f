//! Bondwires (spec.md §6): `(net, startPt3D, endPt3D, radius, current,
//! material)`.

use thermal_core::MaterialId;

#[derive(Debug, Clone)]
pub struct Bondwire {
    pub net: Option<String>,
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub radius: f64,
    pub current: f64,
    pub material: MaterialId,
}

impl Bondwire {
    pub fn length(&self) -> f64 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let dz = self.end[2] - self.start[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn cross_section_area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }

    /// Jump conductance `α = π r² / L · k_wire` (spec.md §4.6), given the
    /// wire material's thermal conductivity evaluated at `ref_t`.
    pub fn jump_conductance(&self, k_wire: f64) -> f64 {
        let length = self.length();
        if length <= 0.0 {
            return f64::INFINITY;
        }
        self.cross_section_area() / length * k_wire
    }

    /// Joule heating `I² ρ_el L / A` (spec.md §4.7), given the wire
    /// material's electrical resistivity evaluated at `ref_t`.
    pub fn joule_heat(&self, rho_el: f64) -> f64 {
        let length = self.length();
        let area = self.cross_section_area();
        if area <= 0.0 {
            return 0.0;
        }
        self.current * self.current * rho_el * length / area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_core::Id;

    fn wire(length: f64) -> Bondwire {
        Bondwire {
            net: None,
            start: [0.0, 0.0, 0.0],
            end: [length, 0.0, 0.0],
            radius: 0.5,
            current: 2.0,
            material: Id::from_index(0),
        }
    }

    #[test]
    fn length_matches_euclidean_distance() {
        assert!((wire(10.0).length() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn jump_conductance_scales_with_area_over_length() {
        let w = wire(10.0);
        let expected = std::f64::consts::PI * 0.25 / 10.0 * 400.0;
        assert!((w.jump_conductance(400.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn joule_heat_scales_with_current_squared() {
        let w = wire(10.0);
        let area = std::f64::consts::PI * 0.25;
        let expected = 4.0 * 1.7e-8 * 10.0 / area;
        assert!((w.joule_heat(1.7e-8) - expected).abs() < 1e-12);
    }
}
