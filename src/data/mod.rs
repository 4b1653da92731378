//! Space-group reference data.
//!
//! The construction pipeline never consults global tables directly: it is handed an
//! implementation of [`SpaceGroupTables`]. [`ReferenceTables`] ships a curated set of standard
//! settings; [`CustomSpaceGroupTables`] allows any other set of groups to be injected.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log;
use nalgebra::{Matrix3, Vector3};

use crate::symmetry::symmetry_operation::SymmetryOperation;
use crate::symmetry::Centering;

pub(crate) mod spacegroup_tables;

use spacegroup_tables::{
    HALL_TO_HM, HALL_TO_NUMBER, HEXAGONAL_TO_RHOMBOHEDRAL, HM_TO_HALL, NUMBER_TO_HALL,
    OPERATION_REPRESENTATIVES, RHOMBOHEDRAL_TO_HEXAGONAL,
};

#[cfg(test)]
#[path = "data_tests.rs"]
mod data_tests;

/// Threshold used when generating operation lists from exact rational representatives.
const GENERATION_THRESHOLD: f64 = 1e-8;

lazy_static! {
    static ref GENERATED_OPERATIONS: HashMap<&'static str, Vec<String>> =
        OPERATION_REPRESENTATIVES
            .entries()
            .map(|(hall, reps)| (*hall, generate_operations(hall, reps)))
            .collect();
}

/// The instance of the built-in reference tables.
pub static REFERENCE_TABLES: ReferenceTables = ReferenceTables;

// =================
// Trait definitions
// =================

/// Trait for read-only space-group reference data: bidirectional maps between Hall symbols,
/// Hermann–Mauguin symbols and space-group numbers, canonical operation lists, and the
/// correspondence between rhombohedral and hexagonal settings.
///
/// Hermann–Mauguin symbols are expected in normalised form (see
/// [`crate::block::ingestion::normalise_hm_symbol`]).
pub trait SpaceGroupTables {
    /// Returns the Hall symbol of the default setting of space group `number`, if that setting is
    /// unique.
    fn hall_from_number(&self, number: u32) -> Option<&str>;

    /// Returns the Hall symbol corresponding to a Hermann–Mauguin symbol.
    fn hall_from_hm(&self, hm: &str) -> Option<&str>;

    /// Returns the space-group number of a Hall symbol.
    fn number_from_hall(&self, hall: &str) -> Option<u32>;

    /// Returns the Hermann–Mauguin symbol of a Hall symbol.
    fn hm_from_hall(&self, hall: &str) -> Option<&str>;

    /// Returns the canonical list of parametric operation strings for a Hall symbol.
    fn operations(&self, hall: &str) -> Option<&[String]>;

    /// Returns the obverse hexagonal-setting Hall symbol of a rhombohedral-setting Hall symbol.
    fn hexagonal_from_rhombohedral(&self, hall: &str) -> Option<&str>;

    /// Returns the rhombohedral-setting Hall symbol of an obverse hexagonal-setting Hall symbol.
    fn rhombohedral_from_hexagonal(&self, hall: &str) -> Option<&str>;

    /// Returns the setting letter of the default setting of space group `number`.
    fn setting_from_number(&self, number: u32) -> Option<char> {
        self.hall_from_number(number)
            .and_then(|hall| hall.trim_start_matches('-').chars().next())
            .map(|c| c.to_ascii_uppercase())
    }

    /// Checks if a Hall symbol belongs to a space group with a rhombohedral lattice, in either
    /// setting.
    fn is_rhombohedral_group(&self, hall: &str) -> bool {
        self.hexagonal_from_rhombohedral(hall).is_some()
            || self.rhombohedral_from_hexagonal(hall).is_some()
    }
}

// ==================
// Struct definitions
// ==================

/// The built-in reference tables. These cover the standard settings of space groups 1, 2, 4, 5,
/// 12, 14, 38, 47, 62, 65, 123, 139, 146, 166, 194, 216, 221, 225 and 229, together with the
/// rhombohedral settings of 146 and 166.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceTables;

impl SpaceGroupTables for ReferenceTables {
    fn hall_from_number(&self, number: u32) -> Option<&str> {
        NUMBER_TO_HALL.get(&number).copied()
    }

    fn hall_from_hm(&self, hm: &str) -> Option<&str> {
        HM_TO_HALL.get(hm).copied()
    }

    fn number_from_hall(&self, hall: &str) -> Option<u32> {
        HALL_TO_NUMBER.get(hall).copied()
    }

    fn hm_from_hall(&self, hall: &str) -> Option<&str> {
        HALL_TO_HM.get(hall).copied()
    }

    fn operations(&self, hall: &str) -> Option<&[String]> {
        GENERATED_OPERATIONS.get(hall).map(|ops| ops.as_slice())
    }

    fn hexagonal_from_rhombohedral(&self, hall: &str) -> Option<&str> {
        RHOMBOHEDRAL_TO_HEXAGONAL.get(hall).copied()
    }

    fn rhombohedral_from_hexagonal(&self, hall: &str) -> Option<&str> {
        HEXAGONAL_TO_RHOMBOHEDRAL.get(hall).copied()
    }
}

/// Space-group tables assembled at run time, e.g. for groups outside the built-in set or for
/// substitute data in tests.
#[derive(Clone, Debug, Default)]
pub struct CustomSpaceGroupTables {
    number_to_hall: HashMap<u32, String>,
    hm_to_hall: HashMap<String, String>,
    hall_to_number: HashMap<String, u32>,
    hall_to_hm: HashMap<String, String>,
    operations: HashMap<String, Vec<String>>,
    rhombohedral_to_hexagonal: HashMap<String, String>,
}

impl CustomSpaceGroupTables {
    /// Creates an empty set of tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a space-group setting.
    ///
    /// # Arguments
    ///
    /// * `number` - The space-group number.
    /// * `hall` - The Hall symbol of the setting.
    /// * `hm` - The normalised Hermann–Mauguin symbol of the setting.
    /// * `operations` - The full list of parametric operation strings.
    /// * `default_setting` - If `true`, `hall` becomes the setting returned for `number`.
    pub fn add_group(
        &mut self,
        number: u32,
        hall: &str,
        hm: &str,
        operations: &[&str],
        default_setting: bool,
    ) -> &mut Self {
        if default_setting {
            self.number_to_hall.insert(number, hall.to_string());
        }
        self.hm_to_hall.insert(hm.to_string(), hall.to_string());
        self.hall_to_number.insert(hall.to_string(), number);
        self.hall_to_hm.insert(hall.to_string(), hm.to_string());
        self.operations.insert(
            hall.to_string(),
            operations.iter().map(|op| op.to_string()).collect(),
        );
        self
    }

    /// Registers the correspondence between a rhombohedral-setting Hall symbol and its obverse
    /// hexagonal-setting equivalent.
    pub fn add_rhombohedral_pair(&mut self, rhombohedral: &str, hexagonal: &str) -> &mut Self {
        self.rhombohedral_to_hexagonal
            .insert(rhombohedral.to_string(), hexagonal.to_string());
        self
    }
}

impl SpaceGroupTables for CustomSpaceGroupTables {
    fn hall_from_number(&self, number: u32) -> Option<&str> {
        self.number_to_hall.get(&number).map(String::as_str)
    }

    fn hall_from_hm(&self, hm: &str) -> Option<&str> {
        self.hm_to_hall.get(hm).map(String::as_str)
    }

    fn number_from_hall(&self, hall: &str) -> Option<u32> {
        self.hall_to_number.get(hall).copied()
    }

    fn hm_from_hall(&self, hall: &str) -> Option<&str> {
        self.hall_to_hm.get(hall).map(String::as_str)
    }

    fn operations(&self, hall: &str) -> Option<&[String]> {
        self.operations.get(hall).map(Vec::as_slice)
    }

    fn hexagonal_from_rhombohedral(&self, hall: &str) -> Option<&str> {
        self.rhombohedral_to_hexagonal.get(hall).map(String::as_str)
    }

    fn rhombohedral_from_hexagonal(&self, hall: &str) -> Option<&str> {
        self.rhombohedral_to_hexagonal
            .iter()
            .find(|(_, hex)| hex.as_str() == hall)
            .map(|(rhomb, _)| rhomb.as_str())
    }
}

// =================
// Utility functions
// =================

/// Generates the full operation list of a Hall symbol from its coset representatives.
///
/// # Arguments
///
/// * `hall` - The Hall symbol. A leading `-` adds the inversion image of every representative,
///   and the lattice letter selects the centering translations.
/// * `representatives` - The parametric forms of the coset representatives.
///
/// # Returns
///
/// The parametric forms of all operations, representatives first.
fn generate_operations(hall: &str, representatives: &[&str]) -> Vec<String> {
    let thresh = GENERATION_THRESHOLD;
    let mut ops = representatives
        .iter()
        .filter_map(|rep| match SymmetryOperation::from_xyz(rep, thresh) {
            Ok(op) => Some(op),
            Err(err) => {
                log::error!("Invalid representative `{rep}` for `{hall}`: {err}");
                None
            }
        })
        .collect::<Vec<_>>();
    if hall.starts_with('-') {
        let inversion =
            SymmetryOperation::from_parts(-Matrix3::identity(), Vector3::zeros(), thresh);
        let inverted = ops
            .iter()
            .map(|op| inversion.compose(op))
            .collect::<Vec<_>>();
        ops.extend(inverted);
    }
    let centering = hall
        .trim_start_matches('-')
        .chars()
        .next()
        .and_then(Centering::from_setting)
        .unwrap_or(Centering::Primitive);
    let mut generated: Vec<SymmetryOperation> = Vec::with_capacity(ops.len() * 4);
    for translation in centering.translations() {
        let centering_op = SymmetryOperation::from_parts(Matrix3::identity(), translation, thresh);
        for op in ops.iter() {
            let candidate = centering_op.compose(op);
            if !generated.contains(&candidate) {
                generated.push(candidate);
            }
        }
    }
    generated.into_iter().map(|op| op.xyz).collect()
}
