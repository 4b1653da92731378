use approx::assert_relative_eq;
use nalgebra::Matrix3;

use crate::block::MemoryBlock;
use crate::cell::displacement::RandomDisplacementParams;
use crate::cell::supercell::{SupercellMap, SupercellParams};
use crate::cell::{CellError, CellWarning, Strictness};
use crate::data::CustomSpaceGroupTables;
use crate::drivers::cell_construction::{CellConstructionDriver, CellConstructionParams};
use crate::drivers::CellDriver;
use crate::lattice::LengthUnit;
use crate::symmetry::SymmetryError;

fn rocksalt_block() -> MemoryBlock {
    let mut block = MemoryBlock::new("NaCl");
    block
        .insert_value("_space_group_IT_number", "225")
        .insert_value("_cell_length_a", "5.64")
        .insert_value("_cell_length_b", "5.64")
        .insert_value("_cell_length_c", "5.64")
        .insert_value("_cell_angle_alpha", "90")
        .insert_value("_cell_angle_beta", "90")
        .insert_value("_cell_angle_gamma", "90")
        .insert_loop("_atom_site_label", &["Na1", "Cl1"])
        .insert_loop("_atom_site_fract_x", &["0", "0.5"])
        .insert_loop("_atom_site_fract_y", &["0", "0.5"])
        .insert_loop("_atom_site_fract_z", &["0", "0.5"]);
    block
}

#[test]
fn test_driver_conventional_cell() {
    let params = CellConstructionParams::default();
    let block = rocksalt_block();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    assert!(driver.result().is_err());
    assert!(driver.run().is_ok());
    let cell = &driver.result().unwrap().cell;
    assert_eq!(cell.number_of_atoms(), 8);
    assert_eq!(cell.operations.len(), 192);
    assert_eq!(cell.space_group.hm.as_deref(), Some("Fm-3m"));
    assert!(cell.warnings.is_empty());
}

#[test]
fn test_driver_primitive_cell_in_bohr() {
    let params = CellConstructionParams::builder()
        .reduce_to_primitive(true)
        .length_unit(LengthUnit::Bohr)
        .build()
        .unwrap();
    let block = rocksalt_block();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    driver.run().unwrap();
    let cell = &driver.result().unwrap().cell;
    assert_eq!(cell.number_of_atoms(), 2);
    assert_eq!(cell.operations.len(), 48);
    assert!(cell.mode.primitive);
    assert_eq!(cell.unit, LengthUnit::Bohr);
    assert_relative_eq!(
        cell.parameters.a,
        5.64 * 1.8897261 / 2.0_f64.sqrt(),
        max_relative = 1e-6
    );
    assert_relative_eq!(cell.parameters.alpha, 60.0, epsilon = 1e-8);
}

#[test]
fn test_driver_supercell_and_displacements() {
    let params = CellConstructionParams::builder()
        .supercell(Some(
            SupercellParams::builder()
                .map(SupercellMap::Diagonal([2, 1, 1]))
                .build()
                .unwrap(),
        ))
        .random_displacement(Some(
            RandomDisplacementParams::builder()
                .size(0.01)
                .seed(Some(7))
                .build()
                .unwrap(),
        ))
        .build()
        .unwrap();
    let block = rocksalt_block();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    driver.run().unwrap();
    let cell = &driver.result().unwrap().cell;
    assert!(cell.mode.supercell);
    assert_eq!(cell.number_of_atoms(), 16);
    assert_eq!(cell.site_groups.len(), 16);
    assert_eq!(cell.operations.len(), 1);
    assert_relative_eq!(cell.parameters.a, 11.28, epsilon = 1e-8);
}

#[test]
fn test_driver_transformation() {
    let params = CellConstructionParams::builder()
        .transformation(Some(Matrix3::from_diagonal_element(2.0)))
        .build()
        .unwrap();
    let block = rocksalt_block();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    driver.run().unwrap();
    let cell = &driver.result().unwrap().cell;
    assert_relative_eq!(cell.length_scale, 2.82, epsilon = 1e-10);
    assert_relative_eq!(cell.parameters.a, 5.64, epsilon = 1e-8);
}

#[test]
fn test_driver_errors_are_typed() {
    let params = CellConstructionParams::default();
    let mut block = rocksalt_block();
    block.values.shift_remove("_cell_length_b");
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    let err = driver.run().unwrap_err();
    assert!(err.downcast_ref::<CellError>().is_some());
    assert!(driver.result().is_err());

    let mut block = rocksalt_block();
    block.values.shift_remove("_space_group_IT_number");
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .build()
        .unwrap();
    let err = driver.run().unwrap_err();
    assert!(err.downcast_ref::<SymmetryError>().is_some());

    let forced = CellConstructionParams::builder()
        .strictness(Strictness::Forced)
        .build()
        .unwrap();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&forced)
        .block(&block)
        .build()
        .unwrap();
    driver.run().unwrap();
    let cell = &driver.result().unwrap().cell;
    assert_eq!(cell.space_group.number, Some(1));
    assert_eq!(cell.warnings, vec![CellWarning::DefaultedToP1]);
    assert_eq!(cell.number_of_atoms(), 2);
}

#[test]
fn test_driver_with_custom_tables() {
    let mut tables = CustomSpaceGroupTables::new();
    tables.add_group(225, "-F 4 2 3", "Fm-3m", &["x,y,z"], true);
    let params = CellConstructionParams::default();
    let block = rocksalt_block();
    let mut driver = CellConstructionDriver::builder()
        .parameters(&params)
        .block(&block)
        .tables(&tables)
        .build()
        .unwrap();
    driver.run().unwrap();
    let cell = &driver.result().unwrap().cell;
    assert_eq!(cell.operations.len(), 1);
    assert_eq!(cell.number_of_atoms(), 2);
}

#[test]
fn test_params_from_yaml() {
    let params: CellConstructionParams = serde_yaml::from_str(
        "reduce_to_primitive: true\nstrictness: Forced\nlength_unit: Nanometre\n",
    )
    .unwrap();
    assert!(params.reduce_to_primitive);
    assert_eq!(params.strictness, Strictness::Forced);
    assert_eq!(params.length_unit, LengthUnit::Nanometre);
    assert_relative_eq!(params.coordinate_threshold, 2e-4);
    assert_relative_eq!(params.occupancy_threshold, 1e-6);
    assert!(params.supercell.is_none());

    let params: CellConstructionParams = serde_yaml::from_str(
        "supercell:\n  map: !Diagonal [2, 2, 1]\n  vacuum: [0.0, 0.0, 1.0]\n  sort: zlayer\n",
    )
    .unwrap();
    let supercell = params.supercell.unwrap();
    assert_eq!(supercell.map, SupercellMap::Diagonal([2, 2, 1]));
    assert_relative_eq!(supercell.vacuum[2], 1.0);
    assert_eq!(supercell.sort.unwrap().to_string(), "zlayer");
}
