//! Legacy-ASCII VTK export (spec.md §4.7, §6), grounded on the original's
//! `EPrismaThermalModelIO::GenerateVTKFile`: an `UNSTRUCTURED_GRID` of
//! 6-node wedge cells (type 13), with an optional `CELL_DATA/SCALARS`
//! temperature field.

use std::fmt::Write as _;

use crate::network::PrismGeometry;

const WEDGE_CELL_TYPE: u8 = 13;

/// Render `geometry` (and, if provided, one temperature per cell) as a
/// legacy-ASCII VTK `UNSTRUCTURED_GRID` string.
pub fn write_legacy_ascii(geometry: &PrismGeometry, temperatures: Option<&[f64]>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# vtk DataFile Version 2.0");
    let _ = writeln!(out, "Unstructured Grid");
    let _ = writeln!(out, "ASCII");
    let _ = writeln!(out, "DATASET UNSTRUCTURED_GRID");

    let _ = writeln!(out, "POINTS {} FLOAT", geometry.points.len());
    for p in &geometry.points {
        let _ = writeln!(out, "{} {} {}", p[0], p[1], p[2]);
    }
    let _ = writeln!(out);

    let n_cells = geometry.cells.len();
    let _ = writeln!(out, "CELLS {} {}", n_cells, n_cells * 7);
    for cell in &geometry.cells {
        let _ = write!(out, "6");
        for v in cell {
            let _ = write!(out, " {v}");
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "CELL_TYPES {n_cells}");
    for _ in 0..n_cells {
        let _ = writeln!(out, "{WEDGE_CELL_TYPE}");
    }

    if let Some(temperatures) = temperatures {
        if temperatures.len() == n_cells {
            let _ = writeln!(out);
            let _ = writeln!(out, "CELL_DATA {n_cells}");
            let _ = writeln!(out, "SCALARS Temperature FLOAT 1");
            let _ = writeln!(out, "LOOKUP_TABLE default");
            for t in temperatures {
                let _ = writeln!(out, "{t}");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_counts_match_geometry() {
        let geometry = PrismGeometry {
            points: vec![[0.0, 0.0, 0.0]; 6],
            cells: vec![[0, 1, 2, 3, 4, 5]],
        };
        let vtk = write_legacy_ascii(&geometry, Some(&[310.0]));
        assert!(vtk.contains("DATASET UNSTRUCTURED_GRID"));
        assert!(vtk.contains("POINTS 6 FLOAT"));
        assert!(vtk.contains("CELLS 1 7"));
        assert!(vtk.contains("CELL_TYPES 1"));
        assert!(vtk.contains("13"));
        assert!(vtk.contains("SCALARS Temperature FLOAT 1"));
        assert!(vtk.contains("310"));
    }

    #[test]
    fn mismatched_temperature_length_is_skipped() {
        let geometry = PrismGeometry { points: vec![], cells: vec![] };
        let vtk = write_legacy_ascii(&geometry, Some(&[1.0, 2.0]));
        assert!(!vtk.contains("CELL_DATA"));
    }
}
