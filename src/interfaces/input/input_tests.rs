use approx::assert_relative_eq;

use crate::block::DataBlock;
use crate::cell::supercell::{SortKey, SupercellMap};
use crate::cell::Strictness;
use crate::drivers::cell_construction::CellConstructionDriver;
use crate::drivers::CellDriver;
use crate::interfaces::InputHandle;
use crate::io::{read_cellsym_yaml, write_cellsym_yaml};
use crate::lattice::LengthUnit;

use super::Input;

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

#[test]
fn test_interfaces_input_cell_construction() {
    let name = format!("{ROOT}/tests/input/test_input_cell_construction.yml");
    let inp = read_cellsym_yaml::<Input, _>(&name).unwrap();
    let cc_input = inp.cell_construction.as_ref().unwrap();

    let params = &cc_input.parameters;
    assert_eq!(params.strictness, Strictness::Forced);
    assert!(params.reduce_to_primitive);
    assert_eq!(params.length_unit, LengthUnit::Bohr);
    assert_eq!(params.vacancy_label.as_deref(), Some("Em"));
    assert_relative_eq!(params.coordinate_threshold, 2e-4);
    let supercell = params.supercell.as_ref().unwrap();
    assert_eq!(supercell.map, SupercellMap::Diagonal([1, 1, 2]));
    assert_eq!(supercell.sort, Some(SortKey::ZLayer));
    assert!(params.transformation.is_none());

    let block = &cc_input.block;
    assert_eq!(block.name, "CuAu");
    assert_eq!(block.value("_cell_length_a"), Some("3.8(1)"));
    assert_eq!(block.loop_column("_atom_site_occupancy").unwrap().len(), 2);

    let mut driver = CellConstructionDriver::builder()
        .parameters(params)
        .block(block)
        .build()
        .unwrap();
    driver.run().unwrap();
    let cell = &driver.result().unwrap().cell;
    assert!(cell.mode.alloy);
    assert!(cell.mode.primitive);
    assert!(cell.mode.supercell);
    assert_eq!(cell.number_of_atoms(), 2);
    assert_relative_eq!(cell.composition["Em"], 0.2, epsilon = 1e-10);

    assert!(inp.handle().is_ok());
}

#[test]
fn test_interfaces_input_empty() {
    let inp: Input = serde_yaml::from_str("{}").unwrap();
    assert!(inp.cell_construction.is_none());
    assert!(inp.handle().is_ok());
}

#[test]
fn test_interfaces_input_yaml_round_trip() {
    let name = format!("{ROOT}/tests/input/test_input_cell_construction.yml");
    let inp = read_cellsym_yaml::<Input, _>(&name).unwrap();
    let path = std::env::temp_dir().join("cellsym_input_round_trip");
    write_cellsym_yaml(&path, &inp).unwrap();
    let reread = read_cellsym_yaml::<Input, _>(path.with_extension("yml")).unwrap();
    let original = inp.cell_construction.unwrap();
    let reread = reread.cell_construction.unwrap();
    assert_eq!(reread.parameters, original.parameters);
    assert_eq!(reread.block, original.block);
}
