//! Ingestion of data-block fields into a [`CellInput`].

use std::collections::HashSet;

use anyhow::{self, format_err};
use derive_builder::Builder;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log;
use nalgebra::{Matrix3, Vector3};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auxiliary::element::{normalise_element_symbol, ElementMap};
use crate::block::{is_absent, parse_numeric, strip_quotes, DataBlock};
use crate::cell::{AtomSite, CellError, CellWarning, PositionError, Strictness};
use crate::lattice::LatticeParameters;
use crate::symmetry::space_group::SpaceGroupQuery;

#[cfg(test)]
#[path = "ingestion_tests.rs"]
mod ingestion_tests;

const NUMBER_TAGS: [&str; 2] = ["_space_group_IT_number", "_symmetry_Int_Tables_number"];
const HALL_TAGS: [&str; 2] = ["_space_group_name_Hall", "_symmetry_space_group_name_Hall"];
const HM_TAGS: [&str; 2] = ["_space_group_name_H-M_alt", "_symmetry_space_group_name_H-M"];
const OPERATION_TAGS: [&str; 2] = [
    "_space_group_symop_operation_xyz",
    "_symmetry_equiv_pos_as_xyz",
];
const PARAMETER_TAGS: [&str; 6] = [
    "_cell_length_a",
    "_cell_length_b",
    "_cell_length_c",
    "_cell_angle_alpha",
    "_cell_angle_beta",
    "_cell_angle_gamma",
];
const FRACTIONAL_TAGS: [&str; 3] = [
    "_atom_site_fract_x",
    "_atom_site_fract_y",
    "_atom_site_fract_z",
];
const CARTESIAN_TAGS: [&str; 3] = [
    "_atom_site_Cartn_x",
    "_atom_site_Cartn_y",
    "_atom_site_Cartn_z",
];

lazy_static! {
    static ref CHARGE_RE: Regex =
        Regex::new(r"^[A-Za-z]+(\d*)([+-])(\d*)$").expect("Invalid charge regex.");
}

// ==================
// Struct definitions
// ==================

/// The kind of coordinates in which the input sites are given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateKind {
    /// Fractional coordinates of the conventional lattice.
    #[default]
    Fractional,

    /// Cartesian coordinates in the working length unit.
    Cartesian,
}

/// The raw, unexpanded description of a crystal cell.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct CellInput {
    /// The space-group information.
    #[builder(default)]
    pub space_group: SpaceGroupQuery,

    /// The lattice parameters.
    pub parameters: LatticeParameters,

    /// The kind of coordinates of [`Self::sites`].
    #[builder(default)]
    pub coordinates: CoordinateKind,

    /// The symmetry-inequivalent sites. Sites sharing a position may list different species.
    pub sites: Vec<AtomSite>,

    /// The matrix $`\mathbf{M}`$ in $`\mathbf{r} = \mathbf{M}\mathbf{f} + \mathbf{v}`$ relating
    /// fractional coordinates $`\mathbf{f}`$ to cartesian coordinates $`\mathbf{r}`$.
    #[builder(default = "None")]
    pub cartesian_transform: Option<Matrix3<f64>>,

    /// The vector $`\mathbf{v}`$ in $`\mathbf{r} = \mathbf{M}\mathbf{f} + \mathbf{v}`$.
    #[builder(default = "None")]
    pub cartesian_translation: Option<Vector3<f64>>,

    /// The expected total number of atoms in the conventional cell.
    #[builder(default = "None")]
    pub multiplicity_hint: Option<usize>,

    /// Fallbacks taken during ingestion.
    #[builder(default = "vec![]")]
    pub warnings: Vec<CellWarning>,
}

impl CellInput {
    /// Returns a builder to construct a [`CellInput`] structure.
    pub fn builder() -> CellInputBuilder {
        CellInputBuilder::default()
    }

    /// Reads the space-group information, lattice parameters and inequivalent sites from a data
    /// block.
    ///
    /// # Arguments
    ///
    /// * `block` - The data block.
    /// * `strictness` - Under [`Strictness::Forced`], sites with defective positions or
    ///   occupancies are dropped with a warning instead of aborting the ingestion.
    ///
    /// # Errors
    ///
    /// Errors with a [`CellError`] if a lattice parameter is missing, malformed or zero, and with
    /// a [`PositionError`] if the site loops are missing, have inconsistent lengths, or contain
    /// defective entries under [`Strictness::Strict`].
    pub fn from_block(
        block: &dyn DataBlock,
        strictness: Strictness,
    ) -> Result<Self, anyhow::Error> {
        let mut warnings = Vec::new();

        let space_group = SpaceGroupQuery {
            number: block
                .first_value(&NUMBER_TAGS)
                .and_then(parse_numeric)
                .filter(|n| n.fract() == 0.0 && *n > 0.0)
                .map(|n| n as u32),
            hall: block
                .first_value(&HALL_TAGS)
                .map(normalise_hall_symbol)
                .filter(|s| !s.is_empty()),
            hm: block
                .first_value(&HM_TAGS)
                .map(normalise_hm_symbol)
                .filter(|s| !s.is_empty()),
            operations: block.first_loop_column(&OPERATION_TAGS).map(|column| {
                column
                    .iter()
                    .filter(|op| !is_absent(op))
                    .map(|op| strip_quotes(op).to_string())
                    .collect::<Vec<_>>()
            }),
        };

        let parameters = read_parameters(block)?;

        let (coordinates, position_columns) = if let Some(columns) = read_columns(block, &FRACTIONAL_TAGS) {
            (CoordinateKind::Fractional, columns)
        } else if let Some(columns) = read_columns(block, &CARTESIAN_TAGS) {
            (CoordinateKind::Cartesian, columns)
        } else {
            return Err(format_err!(PositionError(
                "No complete set of fractional or cartesian atomic-position fields found."
                    .to_string()
            )));
        };
        let n_sites = position_columns[0].len();
        if position_columns.iter().any(|column| column.len() != n_sites) {
            return Err(format_err!(PositionError(
                "The atomic-position fields have inconsistent lengths.".to_string()
            )));
        }

        let labels = optional_column(block, "_atom_site_label", n_sites)?;
        let symbols = optional_column(block, "_atom_site_type_symbol", n_sites)?;
        let occupancies = optional_column(block, "_atom_site_occupancy", n_sites)?;
        let oxidation_numbers = read_oxidation_numbers(block);

        let elements = ElementMap::new();
        let mut unknown_elements = HashSet::new();
        let mut defective = 0;
        let mut sites = Vec::with_capacity(n_sites);
        for i in 0..n_sites {
            let label = labels
                .map(|column| strip_quotes(&column[i]).to_string())
                .filter(|label| !is_absent(label))
                .unwrap_or_else(|| format!("site{}", i + 1));
            let raw_symbol = symbols
                .map(|column| strip_quotes(&column[i]).to_string())
                .filter(|symbol| !is_absent(symbol))
                .unwrap_or_else(|| label.clone());

            let position = position_columns
                .iter()
                .map(|column| parse_numeric(&column[i]))
                .collect::<Option<Vec<_>>>();
            let occupancy = match occupancies.map(|column| column[i].as_str()) {
                Some(raw) if !is_absent(raw) => parse_numeric(raw),
                _ => Some(1.0),
            };
            let (position, occupancy) = match (position, occupancy) {
                (Some(position), Some(occupancy)) => (position, occupancy),
                _ => {
                    if strictness.is_forced() {
                        log::warn!("Dropping site `{label}` with a defective position or occupancy.");
                        defective += 1;
                        continue;
                    } else {
                        return Err(format_err!(PositionError(format!(
                            "Site `{label}` has a defective position or occupancy."
                        ))));
                    }
                }
            };

            let species = normalise_element_symbol(&raw_symbol);
            if !elements.contains(&species) && unknown_elements.insert(species.clone()) {
                log::warn!("`{raw_symbol}` is not a known element symbol.");
                warnings.push(CellWarning::UnknownElement(species.clone()));
            }
            let charge = oxidation_numbers
                .get(&raw_symbol)
                .or_else(|| {
                    oxidation_numbers
                        .iter()
                        .find(|(symbol, _)| normalise_element_symbol(symbol) == species)
                        .map(|(_, charge)| charge)
                })
                .copied()
                .or_else(|| parse_charge_suffix(&raw_symbol));

            let mut species_map = IndexMap::new();
            species_map.insert(species.clone(), occupancy);
            let mut charges = IndexMap::new();
            if let Some(charge) = charge {
                charges.insert(species, charge);
            }
            sites.push(AtomSite {
                position: Vector3::new(position[0], position[1], position[2]),
                species: species_map,
                charges,
                label,
            });
        }
        if defective > 0 {
            warnings.push(CellWarning::DroppedDefectiveSites { count: defective });
        }
        if sites.is_empty() {
            return Err(format_err!(PositionError(
                "No valid atomic positions found.".to_string()
            )));
        }

        let cartesian_transform = (1..=3)
            .flat_map(|i| (1..=3).map(move |j| format!("_atom_sites_Cartn_tran_matrix_{i}{j}")))
            .map(|tag| block.value(&tag).and_then(parse_numeric))
            .collect::<Option<Vec<_>>>()
            .map(|entries| Matrix3::from_row_slice(&entries));
        let cartesian_translation = (1..=3)
            .map(|i| {
                block
                    .value(&format!("_atom_sites_Cartn_tran_vector_{i}"))
                    .and_then(parse_numeric)
            })
            .collect::<Option<Vec<_>>>()
            .map(|entries| Vector3::from_column_slice(&entries));

        let multiplicity_hint = block
            .loop_column("_atom_site_symmetry_multiplicity")
            .and_then(|column| {
                column
                    .iter()
                    .map(|m| parse_numeric(m).map(|m| m.round() as usize))
                    .sum::<Option<usize>>()
            });

        Ok(Self {
            space_group,
            parameters,
            coordinates,
            sites,
            cartesian_transform,
            cartesian_translation,
            multiplicity_hint,
            warnings,
        })
    }
}

// =================
// Utility functions
// =================

/// Normalises a Hermann–Mauguin symbol: whitespace and quotes are removed, the first letter is
/// put in upper case and the rest in lower case, except for a trailing setting letter `R`, `H`,
/// `S` or `Z` which is put in upper case.
///
/// # Examples
///
/// ```
/// use cellsym::block::ingestion::normalise_hm_symbol;
///
/// assert_eq!(normalise_hm_symbol("'f m -3 m'"), "Fm-3m");
/// assert_eq!(normalise_hm_symbol("R -3 m :H"), "R-3m:H");
/// assert_eq!(normalise_hm_symbol("P 21/n 21/m 21/a"), "P21/n21/m21/a");
/// ```
#[must_use]
pub fn normalise_hm_symbol(raw: &str) -> String {
    let compact = strip_quotes(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    let mut chars = compact.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut normalised = first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase();
    if normalised.chars().count() > 1 {
        if let Some(last) = normalised.pop() {
            if matches!(last, 'r' | 'h' | 's' | 'z') {
                normalised.push(last.to_ascii_uppercase());
            } else {
                normalised.push(last);
            }
        }
    }
    normalised
}

/// Normalises a Hall symbol: quotes are removed, runs of whitespace are collapsed, the
/// centering letter is put in upper case and everything else in lower case.
///
/// # Examples
///
/// ```
/// use cellsym::block::ingestion::normalise_hall_symbol;
///
/// assert_eq!(normalise_hall_symbol("-f 4  2 3"), "-F 4 2 3");
/// assert_eq!(normalise_hall_symbol("'-P 2YBC'"), "-P 2ybc");
/// ```
#[must_use]
pub fn normalise_hall_symbol(raw: &str) -> String {
    let collapsed = strip_quotes(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut centering_done = false;
    collapsed
        .chars()
        .map(|c| {
            if !centering_done && c.is_ascii_alphabetic() {
                centering_done = true;
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// Parses a charge suffix such as those in `Fe3+`, `O2-` or `Na+`.
///
/// # Returns
///
/// The signed charge, or `None` if `raw` carries no charge suffix.
#[must_use]
pub fn parse_charge_suffix(raw: &str) -> Option<f64> {
    let captures = CHARGE_RE.captures(raw.trim())?;
    let before = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let after = captures.get(3).map(|m| m.as_str()).unwrap_or("");
    let digits = if before.is_empty() { after } else { before };
    let magnitude = if digits.is_empty() {
        1.0
    } else {
        digits.parse::<f64>().ok()?
    };
    match captures.get(2).map(|m| m.as_str()) {
        Some("-") => Some(-magnitude),
        _ => Some(magnitude),
    }
}

fn read_parameters(block: &dyn DataBlock) -> Result<LatticeParameters, anyhow::Error> {
    let values = PARAMETER_TAGS
        .iter()
        .map(|tag| {
            block
                .value(tag)
                .and_then(parse_numeric)
                .ok_or_else(|| format_err!(CellError(format!("Missing or malformed `{tag}`."))))
        })
        .collect::<Result<Vec<_>, _>>()?;
    LatticeParameters::new(
        values[0], values[1], values[2], values[3], values[4], values[5],
    )
}

fn read_columns<'a>(block: &'a dyn DataBlock, tags: &[&str; 3]) -> Option<[&'a [String]; 3]> {
    Some([
        block.loop_column(tags[0])?,
        block.loop_column(tags[1])?,
        block.loop_column(tags[2])?,
    ])
}

fn optional_column<'a>(
    block: &'a dyn DataBlock,
    tag: &str,
    n_sites: usize,
) -> Result<Option<&'a [String]>, anyhow::Error> {
    match block.loop_column(tag) {
        Some(column) if column.len() != n_sites => Err(format_err!(PositionError(format!(
            "`{tag}` has {} entries, but there are {n_sites} atomic positions.",
            column.len()
        )))),
        column => Ok(column),
    }
}

fn read_oxidation_numbers(block: &dyn DataBlock) -> IndexMap<String, f64> {
    match (
        block.loop_column("_atom_type_symbol"),
        block.loop_column("_atom_type_oxidation_number"),
    ) {
        (Some(symbols), Some(charges)) => symbols
            .iter()
            .zip(charges.iter())
            .filter_map(|(symbol, charge)| {
                parse_numeric(charge).map(|charge| (strip_quotes(symbol).to_string(), charge))
            })
            .collect(),
        _ => IndexMap::new(),
    }
}
