use itertools::Itertools;

use crate::data::{CustomSpaceGroupTables, ReferenceTables, SpaceGroupTables};
use crate::symmetry::symmetry_operation::SymmetryOperation;

#[test]
fn test_reference_tables_operation_counts() {
    let tables = ReferenceTables;
    let expected = [
        (1, 1),
        (2, 2),
        (4, 2),
        (5, 4),
        (12, 8),
        (14, 4),
        (38, 8),
        (47, 8),
        (62, 8),
        (65, 16),
        (123, 16),
        (139, 32),
        (146, 9),
        (166, 36),
        (194, 24),
        (216, 96),
        (221, 48),
        (225, 192),
        (229, 96),
    ];
    for (number, order) in expected {
        let hall = tables.hall_from_number(number).unwrap();
        assert_eq!(tables.number_from_hall(hall), Some(number));
        let ops = tables.operations(hall).unwrap();
        assert_eq!(ops.len(), order, "wrong order for space group {number}");

        // All operations are distinct and the list starts with the identity.
        let compiled = ops
            .iter()
            .map(|op| SymmetryOperation::from_xyz(op, 1e-6).unwrap())
            .collect_vec();
        assert!(compiled[0].is_identity());
        for (a, b) in compiled.iter().tuple_combinations() {
            assert_ne!(a, b);
        }
    }
    assert_eq!(tables.operations("P 3*").map(|ops| ops.len()), Some(3));
    assert_eq!(tables.operations("-P 3* 2").map(|ops| ops.len()), Some(12));
}

#[test]
fn test_reference_tables_group_closure() {
    let tables = ReferenceTables;
    for hall in ["-P 2ac 2n", "-P 6c 2c", "-R 3 2\"", "F -4 2 3"] {
        let ops = tables
            .operations(hall)
            .unwrap()
            .iter()
            .map(|op| SymmetryOperation::from_xyz(op, 1e-6).unwrap())
            .collect_vec();
        for (a, b) in ops.iter().cartesian_product(ops.iter()) {
            assert!(
                ops.contains(&a.compose(b)),
                "{hall}: {a} * {b} is not in the group"
            );
        }
    }
}

#[test]
fn test_reference_tables_symbol_maps() {
    let tables = ReferenceTables;
    assert_eq!(tables.hall_from_hm("Fm-3m"), Some("-F 4 2 3"));
    assert_eq!(tables.hall_from_hm("P21/c"), Some("-P 2ybc"));
    assert_eq!(tables.hall_from_hm("R-3m:R"), Some("-P 3* 2"));
    assert_eq!(tables.hm_from_hall("-P 6c 2c"), Some("P63/mmc"));
    assert_eq!(tables.setting_from_number(225), Some('F'));
    assert_eq!(tables.setting_from_number(166), Some('R'));
    assert_eq!(tables.setting_from_number(3), None);

    assert_eq!(tables.hexagonal_from_rhombohedral("P 3*"), Some("R 3"));
    assert_eq!(tables.rhombohedral_from_hexagonal("-R 3 2\""), Some("-P 3* 2"));
    assert!(tables.is_rhombohedral_group("-P 3* 2"));
    assert!(tables.is_rhombohedral_group("R 3"));
    assert!(!tables.is_rhombohedral_group("-P 6c 2c"));
}

#[test]
fn test_custom_tables() {
    let mut tables = CustomSpaceGroupTables::new();
    tables
        .add_group(3, "P 2y", "P2", &["x,y,z", "-x,y,-z"], true)
        .add_group(3, "P 2", "P112", &["x,y,z", "-x,-y,z"], false)
        .add_group(146, "P 3*", "R3:R", &["x,y,z", "z,x,y", "y,z,x"], false)
        .add_rhombohedral_pair("P 3*", "R 3");
    assert_eq!(tables.hall_from_number(3), Some("P 2y"));
    assert_eq!(tables.hall_from_hm("P112"), Some("P 2"));
    assert_eq!(tables.number_from_hall("P 2"), Some(3));
    assert_eq!(tables.setting_from_number(3), Some('P'));
    assert_eq!(tables.operations("P 2").map(|ops| ops.len()), Some(2));
    assert_eq!(tables.rhombohedral_from_hexagonal("R 3"), Some("P 3*"));
    assert!(tables.operations("-P 1").is_none());
}
