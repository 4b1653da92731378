use approx::assert_relative_eq;
use nalgebra::Vector3;

use cellsym::block::ingestion::CellInput;
use cellsym::block::MemoryBlock;
use cellsym::cell::supercell::{SortKey, SupercellMap, SupercellParams};
use cellsym::cell::{BuildStatus, CellOptions, CellWarning, CrystalCell, Strictness};
use cellsym::data::REFERENCE_TABLES;
use cellsym::drivers::cell_construction::{CellConstructionDriver, CellConstructionParams};
use cellsym::drivers::CellDriver;

fn zincblende_block() -> MemoryBlock {
    let mut block = MemoryBlock::new("ZnS");
    block
        .insert_value("_symmetry_space_group_name_H-M", "F -4 3 m")
        .insert_value("_cell_length_a", "5.4093(2)")
        .insert_value("_cell_length_b", "5.4093(2)")
        .insert_value("_cell_length_c", "5.4093(2)")
        .insert_value("_cell_angle_alpha", "90.0")
        .insert_value("_cell_angle_beta", "90.0")
        .insert_value("_cell_angle_gamma", "90.0")
        .insert_loop("_atom_site_label", &["Zn1", "S1"])
        .insert_loop("_atom_site_type_symbol", &["Zn2+", "S2-"])
        .insert_loop("_atom_site_fract_x", &["0", "0.25"])
        .insert_loop("_atom_site_fract_y", &["0", "0.25"])
        .insert_loop("_atom_site_fract_z", &["0", "0.25"])
        .insert_loop("_atom_site_symmetry_multiplicity", &["4", "4"]);
    block
}

#[test]
fn test_zincblende_conventional_and_primitive() {
    let input = CellInput::from_block(&zincblende_block(), Strictness::Strict).unwrap();
    let mut cell = CrystalCell::new(input, &REFERENCE_TABLES, CellOptions::default()).unwrap();
    cell.build(false).unwrap();
    assert_eq!(cell.space_group.number, Some(216));
    assert_eq!(cell.number_of_atoms(), 8);
    assert_eq!(cell.operations.len(), 96);
    assert_relative_eq!(cell.volume(), 5.4093_f64.powi(3), max_relative = 1e-10);
    let charges = cell
        .atoms()
        .map(|site| site.charges.values().sum::<f64>())
        .sum::<f64>();
    assert_relative_eq!(charges, 0.0, epsilon = 1e-12);

    let primitive = cell.primitive().unwrap();
    assert_eq!(primitive.number_of_atoms(), 2);
    assert_eq!(primitive.operations.len(), 24);
    assert_relative_eq!(
        primitive.volume(),
        cell.volume() / 4.0,
        max_relative = 1e-10
    );
    assert_relative_eq!(primitive.parameters.alpha, 60.0, epsilon = 1e-8);
}

#[test]
fn test_cartesian_input_with_default_translation() {
    let mut block = zincblende_block();
    for axis in ["x", "y", "z"] {
        block.loops.shift_remove(&format!("_atom_site_fract_{axis}"));
        block.insert_loop(&format!("_atom_site_Cartn_{axis}"), &["0", "1.352325"]);
    }
    for i in 1..=3 {
        for j in 1..=3 {
            let value = if i == j { "5.4093" } else { "0" };
            block.insert_value(&format!("_atom_sites_Cartn_tran_matrix_{i}{j}"), value);
        }
    }
    let input = CellInput::from_block(&block, Strictness::Forced).unwrap();
    let options = CellOptions::builder()
        .strictness(Strictness::Forced)
        .build()
        .unwrap();
    let mut cell = CrystalCell::new(input, &REFERENCE_TABLES, options).unwrap();
    cell.build(false).unwrap();
    assert_eq!(cell.number_of_atoms(), 8);
    assert!(cell
        .atoms()
        .any(|site| (site.position - Vector3::new(0.25, 0.25, 0.25)).amax() < 1e-8));
    assert_eq!(
        cell.status(),
        BuildStatus::Degraded(&[CellWarning::DefaultCartesianTranslation])
    );
}

#[test]
fn test_slab_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = CellConstructionParams::builder()
        .supercell(Some(
            SupercellParams::builder()
                .map(SupercellMap::Diagonal([1, 1, 2]))
                .vacuum([0.0, 0.0, 1.0])
                .sort(Some(SortKey::ZLayer))
                .build()
                .unwrap(),
        ))
        .build()
        .unwrap();
    let block = zincblende_block();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    driver.run().unwrap();
    let result = driver.result().unwrap();
    let cell = &result.cell;
    assert_eq!(cell.number_of_atoms(), 16);
    assert_eq!(cell.site_groups.len(), 16);
    assert_relative_eq!(cell.parameters.c, 4.0 * 5.4093, max_relative = 1e-10);
    assert_relative_eq!(cell.parameters.a, 5.4093, max_relative = 1e-10);
    let zs = cell
        .cartesian_positions()
        .iter()
        .map(|position| position[2])
        .collect::<Vec<_>>();
    assert!(zs.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(zs.iter().all(|z| *z < 2.0 * 5.4093 + 1e-8));
    assert!(cell
        .operations
        .iter()
        .all(|op| op.translation[2].abs() < 1e-8 || (1.0 - op.translation[2]).abs() < 1e-8));
    assert_eq!(cell.status(), BuildStatus::Clean);
}
