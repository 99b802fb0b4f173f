//! Material database (spec.md §6): `k(T)`, `ρ(T)`, `c(T)`, `ρ_el(T)`, each a
//! scalar, 3-vector (anisotropic), or 9-vector (tensor) polynomial in
//! temperature, evaluated by Horner's method.

use std::collections::HashMap;

use thermal_core::{MaterialId, eval_poly};

use crate::error::{LayoutError, LayoutResult};

/// A polynomial-in-temperature property, `Σ coeffs[i] * T^i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyT {
    pub coeffs: Vec<f64>,
}

impl PolyT {
    pub fn constant(value: f64) -> Self {
        Self { coeffs: vec![value] }
    }

    pub fn eval(&self, t: f64) -> f64 {
        eval_poly(&self.coeffs, t)
    }
}

/// A material property that may vary by direction.
#[derive(Debug, Clone)]
pub enum MaterialProperty {
    Scalar(PolyT),
    Anisotropic([PolyT; 3]),
    Tensor([PolyT; 9]),
}

impl MaterialProperty {
    /// Evaluate along `axis` (`0..3`, x/y/z) at temperature `t`. `Scalar`
    /// ignores `axis`; `Tensor` reads the `axis`-th diagonal entry.
    pub fn eval_axis(&self, t: f64, axis: usize) -> f64 {
        match self {
            MaterialProperty::Scalar(p) => p.eval(t),
            MaterialProperty::Anisotropic(ps) => ps[axis].eval(t),
            MaterialProperty::Tensor(ps) => ps[axis * 3 + axis].eval(t),
        }
    }

    /// Evaluate the isotropic/representative value (axis 0). Most grid and
    /// prism conductance computations only need a single scalar per voxel
    /// face normal, already resolved to the relevant axis via `eval_axis`;
    /// this is for call sites (bondwires, capacitance) with no directional
    /// meaning.
    pub fn eval(&self, t: f64) -> f64 {
        self.eval_axis(t, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Solid,
    Fluid,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub kind: MaterialKind,
    pub thermal_conductivity: MaterialProperty,
    pub density: MaterialProperty,
    pub specific_heat: MaterialProperty,
    /// Electrical resistivity, needed only for bondwire Joule-heating
    /// (spec.md §4.7's `I²·ρ_el·L/A`).
    pub electrical_resistivity: Option<MaterialProperty>,
}

impl Material {
    pub fn volumetric_heat_capacity(&self, t: f64) -> f64 {
        self.density.eval(t) * self.specific_heat.eval(t)
    }
}

/// A material database, keyed by `MaterialId` with name lookup.
#[derive(Debug, Clone, Default)]
pub struct MaterialDb {
    materials: Vec<Material>,
    by_name: HashMap<String, MaterialId>,
}

impl MaterialDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a material, assigning it the next `MaterialId`.
    pub fn insert(&mut self, name: impl Into<String>, kind: MaterialKind) -> MaterialBuilder<'_> {
        let id = MaterialId::from_index(self.materials.len() as u32);
        let name = name.into();
        MaterialBuilder {
            db: self,
            id,
            name,
            kind,
            thermal_conductivity: None,
            density: None,
            specific_heat: None,
            electrical_resistivity: None,
        }
    }

    pub fn get(&self, id: MaterialId) -> LayoutResult<&Material> {
        self.materials.get(id.idx()).ok_or_else(|| LayoutError::UnknownMaterial {
            name: format!("<id {id}>"),
        })
    }

    pub fn get_by_name(&self, name: &str) -> LayoutResult<&Material> {
        let id = self
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| LayoutError::UnknownMaterial { name: name.to_string() })?;
        self.get(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

pub struct MaterialBuilder<'a> {
    db: &'a mut MaterialDb,
    id: MaterialId,
    name: String,
    kind: MaterialKind,
    thermal_conductivity: Option<MaterialProperty>,
    density: Option<MaterialProperty>,
    specific_heat: Option<MaterialProperty>,
    electrical_resistivity: Option<MaterialProperty>,
}

impl MaterialBuilder<'_> {
    pub fn thermal_conductivity(mut self, k: MaterialProperty) -> Self {
        self.thermal_conductivity = Some(k);
        self
    }

    pub fn density(mut self, rho: MaterialProperty) -> Self {
        self.density = Some(rho);
        self
    }

    pub fn specific_heat(mut self, c: MaterialProperty) -> Self {
        self.specific_heat = Some(c);
        self
    }

    pub fn electrical_resistivity(mut self, rho_el: MaterialProperty) -> Self {
        self.electrical_resistivity = Some(rho_el);
        self
    }

    /// Finish building, defaulting any unset property to zero (valid for
    /// e.g. a dielectric with no electrical-resistivity entry).
    pub fn build(self) -> MaterialId {
        let material = Material {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            thermal_conductivity: self
                .thermal_conductivity
                .unwrap_or_else(|| MaterialProperty::Scalar(PolyT::constant(0.0))),
            density: self.density.unwrap_or_else(|| MaterialProperty::Scalar(PolyT::constant(0.0))),
            specific_heat: self
                .specific_heat
                .unwrap_or_else(|| MaterialProperty::Scalar(PolyT::constant(0.0))),
            electrical_resistivity: self.electrical_resistivity,
        };
        self.db.materials.push(material);
        self.db.by_name.insert(self.name, self.id);
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyt_horner_matches_direct_evaluation() {
        let p = PolyT { coeffs: vec![1.0, 2.0, 3.0] }; // 1 + 2T + 3T^2
        assert!((p.eval(2.0) - (1.0 + 4.0 + 12.0)).abs() < 1e-12);
    }

    #[test]
    fn material_db_round_trips_by_name() {
        let mut db = MaterialDb::new();
        let cu = db
            .insert("copper", MaterialKind::Solid)
            .thermal_conductivity(MaterialProperty::Scalar(PolyT::constant(400.0)))
            .build();
        let found = db.get_by_name("copper").unwrap();
        assert_eq!(found.id, cu);
        assert!((found.thermal_conductivity.eval(300.0) - 400.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_material_name_is_reported() {
        let db = MaterialDb::new();
        assert!(matches!(
            db.get_by_name("nope"),
            Err(LayoutError::UnknownMaterial { .. })
        ));
    }

    #[test]
    fn tensor_property_reads_diagonal_entry() {
        let prop = MaterialProperty::Tensor(std::array::from_fn(|i| {
            PolyT::constant(if i == 4 { 7.0 } else { 1.0 })
        }));
        assert!((prop.eval_axis(300.0, 1) - 7.0).abs() < 1e-12);
    }
}
