//! Scenario 3 (spec.md §8): a 1x1x10 voxel chain, pure metal, pinned at the
//! top and heated at the bottom, must reproduce the 1-D Fourier law gradient.

use thermal_grid::{GridBoundaryInputs, GridExtractOptions, GridExtractor, GridLayer, GridSpec};
use thermal_layout::{
    BoundaryCondition, MaterialDb, MaterialKind, MaterialProperty, Orientation, PolyT, UniformBc,
};
use thermal_network::MNABuilder;
use thermal_network::MnaOptions;
use thermal_solver::{SteadyBackend, SteadyStateSolver};

#[test]
fn ten_voxel_metal_chain_reproduces_linear_fourier_gradient() {
    let mut materials = MaterialDb::new();
    let metal = materials
        .insert("copper", MaterialKind::Solid)
        .thermal_conductivity(MaterialProperty::Scalar(PolyT::constant(400.0)))
        .density(MaterialProperty::Scalar(PolyT::constant(8960.0)))
        .specific_heat(MaterialProperty::Scalar(PolyT::constant(385.0)))
        .build();
    // Never actually mixed in (every voxel is cp=1.0), but every voxel still
    // names a dielectric partner.
    let dielectric = materials
        .insert("vacuum", MaterialKind::Solid)
        .thermal_conductivity(MaterialProperty::Scalar(PolyT::constant(0.0)))
        .build();

    let rx = 1e-3;
    let ry = 1e-3;
    let thickness = 1e-3;
    let nz = 10;
    let layers: Vec<GridLayer> = (0..nz)
        .map(|_| GridLayer {
            metal_fraction: vec![1.0],
            thickness,
            metal_material: metal,
            dielectric_material: dielectric,
        })
        .collect();
    let spec = GridSpec { nx: 1, ny: 1, rx, ry, layers };

    let boundary = GridBoundaryInputs {
        top_uniform: Some(UniformBc {
            orientation: Orientation::Top,
            bc: BoundaryCondition::Temperature(300.0),
        }),
        ..Default::default()
    };
    let options = GridExtractOptions::default();

    let mut network =
        GridExtractor::extract(&spec, &materials, &[], &[], &boundary, &options).unwrap();

    let bottom = spec.index(0, 0, 0);
    let top = spec.index(0, 0, nz - 1);
    assert!(network.node(top).t == Some(300.0));

    // The scenario's heat input is the absolute 0.1 W figure, not a flux
    // density, so it is injected directly rather than through a HeatFlow BC
    // (which would scale by the tiny 1e-6 m^2 tile area).
    network.set_hf(bottom, 0.1);

    let mna = MNABuilder::build(&network, &MnaOptions::default()).unwrap();
    let sol = SteadyStateSolver::solve(&mut network, &mna, 300.0, &SteadyBackend::Direct).unwrap();

    let area = rx * ry;
    let total_length = thickness * nz as f64;
    let expected_drop = 0.1 * total_length / (400.0 * area);
    assert!((expected_drop - 2.5).abs() < 1e-9);

    let delta = sol.t[bottom] - sol.t[top];
    assert!(
        (delta - expected_drop).abs() < 1e-6,
        "expected {expected_drop} K drop, got {delta}"
    );

    // Linear gradient: equal resistance per voxel step means equal
    // temperature steps along the chain.
    let mut steps = Vec::new();
    for z in 0..nz - 1 {
        let a = spec.index(0, 0, z);
        let b = spec.index(0, 0, z + 1);
        steps.push(sol.t[a] - sol.t[b]);
    }
    let first = steps[0];
    for step in &steps {
        assert!((step - first).abs() < 1e-9, "non-uniform step {step} vs {first}");
    }
}
