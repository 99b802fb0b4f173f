//! Scenario 6 (spec.md §8): two stacked triangles with 25% geometric
//! overlap must report `areaFraction = 0.25 +/- 1e-9`.

use thermal_layout::{MaterialDb, MaterialKind, MaterialProperty, PolyT, Polygon};
use thermal_prism::adjacency;
use thermal_prism::layer::{MeshMode, PrismaLayerSpec, build_layers};
use thermal_prism::mesh::MeshParams;

fn triangle_polygon(points: Vec<(f64, f64)>, material: thermal_core::MaterialId) -> Polygon {
    Polygon { points, material, net: None, power_block: None }
}

#[test]
fn stacked_triangles_with_quarter_overlap_report_correct_area_fraction() {
    let mut materials = MaterialDb::new();
    let copper = materials
        .insert("copper", MaterialKind::Solid)
        .thermal_conductivity(MaterialProperty::Scalar(PolyT::constant(400.0)))
        .density(MaterialProperty::Scalar(PolyT::constant(8960.0)))
        .specific_heat(MaterialProperty::Scalar(PolyT::constant(385.0)))
        .build();

    let bottom = PrismaLayerSpec {
        elevation: 0.0,
        thickness: 1e-3,
        polygons: vec![triangle_polygon(
            vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
            copper,
        )],
        steiner: vec![],
    };
    let top = PrismaLayerSpec {
        elevation: 1e-3,
        thickness: 1e-3,
        polygons: vec![triangle_polygon(
            vec![(0.5, 0.0), (1.5, 0.0), (0.5, 1.0)],
            copper,
        )],
        steiner: vec![],
    };

    let mode = MeshMode::StackedPerLayer { imprint_upper_layer: false };
    let mut layers = build_layers(&[bottom, top], &materials, &mode, &MeshParams::default()).unwrap();
    adjacency::wire(&mut layers, &mode);

    assert_eq!(layers[0].elements.len(), 1);
    assert_eq!(layers[1].elements.len(), 1);

    let bottom_element = &layers[0].elements[0];
    assert!(bottom_element.uses_top_contacts());
    assert_eq!(bottom_element.top_contacts.len(), 1);

    let (_other, overlap_area) = bottom_element.top_contacts[0];
    let own_area = layers[0].mesh.area(bottom_element.template_id);
    let fraction = overlap_area / own_area;
    assert!((fraction - 0.25).abs() < 1e-9, "fraction was {fraction}");
}
