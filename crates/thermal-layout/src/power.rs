//! Power models (spec.md §4.6, §9): a temperature-indexed lookup table,
//! sampled at `{25,50,75,100,125}°C` by convention, and the tagged-variant
//! `PowerModel` design note ("PerTile vs Block aggregator, single
//! `evaluate` operation").

/// Default sample temperatures, in Celsius, spec.md §4.6.
pub const DEFAULT_SAMPLE_TEMPERATURES_C: [f64; 5] = [25.0, 50.0, 75.0, 100.0, 125.0];

/// A piecewise-linear power-vs-temperature table.
#[derive(Debug, Clone)]
pub struct PowerTable {
    /// `(temperature_kelvin, power_watts)` pairs, sorted ascending by
    /// temperature.
    samples: Vec<(f64, f64)>,
}

impl PowerTable {
    pub fn new(samples: Vec<(f64, f64)>) -> Self {
        let mut samples = samples;
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { samples }
    }

    /// A constant table (no temperature dependence).
    pub fn constant(power_watts: f64) -> Self {
        Self { samples: vec![(0.0, power_watts)] }
    }

    /// Build from the conventional `{25,50,75,100,125}°C` samples.
    pub fn from_celsius_samples(watts: [f64; 5]) -> Self {
        let samples = DEFAULT_SAMPLE_TEMPERATURES_C
            .iter()
            .zip(watts)
            .map(|(&c, w)| (c + 273.15, w))
            .collect();
        Self::new(samples)
    }

    /// Linear interpolation at `t` (Kelvin), clamped at the table's ends.
    pub fn interpolate(&self, t: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        if self.samples.len() == 1 || t <= self.samples[0].0 {
            return self.samples[0].1;
        }
        let last = self.samples.len() - 1;
        if t >= self.samples[last].0 {
            return self.samples[last].1;
        }
        for w in self.samples.windows(2) {
            let (t0, p0) = w[0];
            let (t1, p1) = w[1];
            if t >= t0 && t <= t1 {
                let frac = (t - t0) / (t1 - t0);
                return p0 + frac * (p1 - p0);
            }
        }
        self.samples[last].1
    }
}

/// A rectangular footprint in the xy plane, used by both `PowerModel::Block`
/// and `Component`/`Polygon`-derived power sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox2 {
    pub ll: (f64, f64),
    pub ur: (f64, f64),
}

impl BBox2 {
    pub fn area(&self) -> f64 {
        (self.ur.0 - self.ll.0).max(0.0) * (self.ur.1 - self.ll.1).max(0.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.ll.0 && x <= self.ur.0 && y >= self.ll.1 && y <= self.ur.1
    }
}

/// Tagged-variant power model (spec.md §9): either per-tile power density
/// sampled from a grid data table, or a single block aggregator with a
/// total-power table spread uniformly over its footprint.
#[derive(Debug, Clone)]
pub enum PowerModel {
    /// `table` gives total power (W) as a function of temperature; the grid
    /// extractor weights it per tile by area fraction when distributing
    /// directly (spec.md §9's preferred "direct per-tile" variant).
    PerTile { table: PowerTable },
    Block { bbox: BBox2, total_power: PowerTable },
}

impl PowerModel {
    /// Power density contribution (W) at point `(x,y)`, evaluated at
    /// reference temperature `ref_t`. `PerTile` returns the table directly
    /// (the caller is expected to already be iterating per-tile); `Block`
    /// spreads its total power uniformly over the bbox area.
    pub fn evaluate(&self, ref_t: f64, x: f64, y: f64) -> f64 {
        match self {
            PowerModel::PerTile { table } => table.interpolate(ref_t),
            PowerModel::Block { bbox, total_power } => {
                if bbox.contains(x, y) && bbox.area() > 0.0 {
                    total_power.interpolate(ref_t) / bbox.area()
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_is_linear_between_samples() {
        let table = PowerTable::new(vec![(300.0, 1.0), (310.0, 2.0)]);
        assert!((table.interpolate(305.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn interpolation_clamps_outside_range() {
        let table = PowerTable::new(vec![(300.0, 1.0), (310.0, 2.0)]);
        assert!((table.interpolate(250.0) - 1.0).abs() < 1e-12);
        assert!((table.interpolate(400.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn block_model_spreads_power_uniformly() {
        let model = PowerModel::Block {
            bbox: BBox2 { ll: (0.0, 0.0), ur: (2.0, 2.0) },
            total_power: PowerTable::constant(4.0),
        };
        // total area = 4, density = 1 W per unit area
        assert!((model.evaluate(300.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert_eq!(model.evaluate(300.0, 10.0, 10.0), 0.0);
    }
}
