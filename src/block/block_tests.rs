use approx::assert_relative_eq;

use crate::block::{is_absent, parse_numeric, strip_quotes, DataBlock, MemoryBlock};

#[test]
fn test_placeholders() {
    assert!(is_absent("?"));
    assert!(is_absent(" . "));
    assert!(is_absent(""));
    assert!(is_absent("'?'"));
    assert!(!is_absent("0"));
    assert_eq!(strip_quotes("'F m -3 m'"), "F m -3 m");
    assert_eq!(strip_quotes("\"-P 2ybc\""), "-P 2ybc");
    assert_eq!(strip_quotes("'x"), "'x");
}

#[test]
fn test_parse_numeric() {
    assert_relative_eq!(parse_numeric("5.4310(2)").unwrap(), 5.431);
    assert_relative_eq!(parse_numeric("90").unwrap(), 90.0);
    assert_relative_eq!(parse_numeric("-0.25").unwrap(), -0.25);
    assert!(parse_numeric("?").is_none());
    assert!(parse_numeric(".").is_none());
    assert!(parse_numeric("abc").is_none());
    assert!(parse_numeric("NaN").is_none());
}

#[test]
fn test_memory_block_lookup() {
    let mut block = MemoryBlock::new("test");
    block
        .insert_value("_symmetry_space_group_name_H-M", "?")
        .insert_value("_space_group_name_H-M_alt", "'P m -3 m'")
        .insert_loop("_atom_site_label", &["Na1", "Cl1"]);
    assert_eq!(
        block.first_value(&["_symmetry_space_group_name_H-M", "_space_group_name_H-M_alt"]),
        Some("'P m -3 m'")
    );
    assert_eq!(block.first_value(&["_cell_length_a"]), None);
    assert_eq!(
        block
            .first_loop_column(&["_atom_site_type_symbol", "_atom_site_label"])
            .map(|col| col.len()),
        Some(2)
    );
}
