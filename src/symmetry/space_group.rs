//! Resolution of space-group information against reference tables.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use serde::{Deserialize, Serialize};

use crate::cell::{CellWarning, Strictness};
use crate::data::SpaceGroupTables;
use crate::symmetry::symmetry_operation::SymmetryOperation;
use crate::symmetry::SymmetryError;

#[cfg(test)]
#[path = "space_group_tests.rs"]
mod space_group_tests;

// ==================
// Struct definitions
// ==================

/// The space-group information available from an input data block. Any subset may be present.
#[derive(Clone, Builder, Debug, Default, Serialize, Deserialize)]
pub struct SpaceGroupQuery {
    /// The space-group number. Values outside $`[1, 230]`$ are ignored.
    #[builder(default = "None")]
    pub number: Option<u32>,

    /// The Hall symbol.
    #[builder(default = "None")]
    pub hall: Option<String>,

    /// The normalised Hermann–Mauguin symbol.
    #[builder(default = "None")]
    pub hm: Option<String>,

    /// An explicit list of parametric operation strings, overriding the tabulated list.
    #[builder(default = "None")]
    pub operations: Option<Vec<String>>,
}

impl SpaceGroupQuery {
    /// Returns a builder to construct a [`SpaceGroupQuery`] structure.
    pub fn builder() -> SpaceGroupQueryBuilder {
        SpaceGroupQueryBuilder::default()
    }
}

/// The equivalent obverse hexagonal setting of a space group given in a rhombohedral setting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HexagonalSetting {
    /// The Hall symbol of the hexagonal setting.
    pub hall: String,

    /// The Hermann–Mauguin symbol of the hexagonal setting, if tabulated.
    pub hm: Option<String>,

    /// The operations of the hexagonal setting in fractional coordinates.
    pub operations: Vec<SymmetryOperation>,
}

/// A consistent set of space-group information produced by a [`SpaceGroupResolver`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpaceGroupInfo {
    /// The space-group number, if known.
    pub number: Option<u32>,

    /// The Hall symbol, if known.
    pub hall: Option<String>,

    /// The Hermann–Mauguin symbol, if known.
    pub hm: Option<String>,

    /// The setting letter indicating the lattice centering.
    pub setting: Option<char>,

    /// The operations of the group in fractional coordinates of the conventional cell.
    pub operations: Vec<SymmetryOperation>,

    /// Boolean indicating if the group has a rhombohedral lattice, in either setting.
    pub rhombohedral: bool,

    /// The hexagonal setting to switch to if the group is given in a rhombohedral setting.
    pub hexagonal_setting: Option<HexagonalSetting>,

    /// Fallbacks taken during resolution.
    pub warnings: Vec<CellWarning>,
}

impl SpaceGroupInfo {
    /// Replaces the group description by its hexagonal setting, if one is available.
    ///
    /// # Returns
    ///
    /// `true` if the description has been replaced.
    pub fn switch_to_hexagonal_setting(&mut self) -> bool {
        match self.hexagonal_setting.take() {
            Some(hex) => {
                self.hall = Some(hex.hall);
                if hex.hm.is_some() {
                    self.hm = hex.hm;
                }
                self.setting = Some('R');
                self.operations = hex.operations;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for SpaceGroupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Space group number: {}",
            self.number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "--".to_string())
        )?;
        writeln!(
            f,
            "Hall symbol: {}",
            self.hall.as_deref().unwrap_or("--")
        )?;
        writeln!(
            f,
            "Hermann–Mauguin symbol: {}",
            self.hm.as_deref().unwrap_or("--")
        )?;
        writeln!(
            f,
            "Setting: {}",
            self.setting
                .map(|c| c.to_string())
                .unwrap_or_else(|| "--".to_string())
        )?;
        writeln!(f, "Number of operations: {}", self.operations.len())?;
        Ok(())
    }
}

/// A resolver reconciling Hall symbols, Hermann–Mauguin symbols, space-group numbers and explicit
/// operation lists against a set of reference tables.
pub struct SpaceGroupResolver<'a> {
    tables: &'a dyn SpaceGroupTables,
    strictness: Strictness,
    threshold: f64,
}

impl<'a> SpaceGroupResolver<'a> {
    /// Creates a new resolver.
    ///
    /// # Arguments
    ///
    /// * `tables` - The reference tables.
    /// * `strictness` - The policy for missing or inconsistent information.
    /// * `threshold` - The threshold assigned to the compiled operations.
    #[must_use]
    pub fn new(tables: &'a dyn SpaceGroupTables, strictness: Strictness, threshold: f64) -> Self {
        Self {
            tables,
            strictness,
            threshold,
        }
    }

    /// Resolves a query into a consistent [`SpaceGroupInfo`].
    ///
    /// The Hall symbol is authoritative. If absent, it is looked up from the Hermann–Mauguin
    /// symbol, and failing that from the space-group number. If nothing identifies the group and
    /// no explicit operations are given, the group defaults to $`P1`$ under
    /// [`Strictness::Forced`].
    ///
    /// # Errors
    ///
    /// Errors with a [`SymmetryError`] if the group cannot be identified, if the reference tables
    /// hold no operations for the resolved Hall symbol, or if an explicit operation list does not
    /// match the tabulated one in length under [`Strictness::Strict`].
    pub fn resolve(&self, query: &SpaceGroupQuery) -> Result<SpaceGroupInfo, anyhow::Error> {
        let tables = self.tables;
        let mut warnings = Vec::new();
        let query_number = query.number.filter(|n| (1..=230).contains(n));
        let query_hall = query.hall.clone().filter(|s| !s.trim().is_empty());
        let query_hm = query.hm.clone().filter(|s| !s.trim().is_empty());
        let explicit = query
            .operations
            .as_ref()
            .filter(|ops| !ops.is_empty())
            .map(|ops| {
                ops.iter()
                    .map(|op| SymmetryOperation::from_xyz(op, self.threshold))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let mut hall = query_hall;
        if hall.is_none() {
            if let Some(hm) = query_hm.as_ref() {
                match tables.hall_from_hm(hm) {
                    Some(h) => hall = Some(h.to_string()),
                    None => {
                        log::warn!("Cannot convert the Hermann–Mauguin symbol `{hm}` to a Hall symbol.");
                        warnings.push(CellWarning::UnresolvedHermannMauguin(hm.clone()));
                    }
                }
            }
        }
        if hall.is_none() {
            if let Some(number) = query_number {
                match tables.hall_from_number(number) {
                    Some(h) => hall = Some(h.to_string()),
                    None if explicit.is_none() => {
                        return Err(format_err!(SymmetryError(format!(
                            "Found neither a Hall nor a Hermann–Mauguin symbol, and space group {number} does not have a unique tabulated setting."
                        ))))
                    }
                    None => {}
                }
            }
        }

        let mut number = query_number;
        let mut hm = query_hm;
        if hall.is_none() && explicit.is_none() && number.is_none() {
            if self.strictness.is_forced() {
                log::warn!("Neither space-group symbols nor a space-group number are available. Defaulting to P1.");
                warnings.push(CellWarning::DefaultedToP1);
                hall = Some("P 1".to_string());
                hm = Some("P1".to_string());
                number = Some(1);
            } else {
                return Err(format_err!(SymmetryError(
                    "The input contains neither space-group symbols nor a space-group number."
                        .to_string()
                )));
            }
        }

        let tabulated = hall
            .as_deref()
            .and_then(|h| tables.operations(h))
            .map(|ops| {
                ops.iter()
                    .map(|op| SymmetryOperation::from_xyz(op, self.threshold))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let operations = match (explicit, tabulated) {
            (Some(explicit), Some(tabulated)) => {
                if explicit.len() != tabulated.len() {
                    let hall_str = hall.as_deref().unwrap_or("?");
                    if self.strictness.is_forced() {
                        log::warn!(
                            "{} explicit symmetry operations given, but {} are tabulated for `{hall_str}`.",
                            explicit.len(),
                            tabulated.len()
                        );
                        warnings.push(CellWarning::OperationCountMismatch {
                            explicit: explicit.len(),
                            tabulated: tabulated.len(),
                        });
                    } else {
                        return Err(format_err!(SymmetryError(format!(
                            "{} explicit symmetry operations given, but {} are tabulated for `{hall_str}`.",
                            explicit.len(),
                            tabulated.len()
                        ))));
                    }
                }
                explicit
            }
            (Some(explicit), None) => explicit,
            (None, Some(tabulated)) => tabulated,
            (None, None) => {
                if hall.as_deref() == Some("P 1") {
                    vec![SymmetryOperation::identity(self.threshold)]
                } else {
                    return Err(format_err!(SymmetryError(format!(
                        "No symmetry operations are available for the Hall symbol `{}`.",
                        hall.as_deref().unwrap_or("?")
                    ))));
                }
            }
        };

        if let Some(h) = hall.as_deref() {
            if let Some(resolved) = tables.number_from_hall(h) {
                let hm_number = hm
                    .as_deref()
                    .and_then(|s| tables.hall_from_hm(s))
                    .and_then(|other| tables.number_from_hall(other));
                let contradictions = [
                    number
                        .filter(|n| *n != resolved)
                        .map(|n| format!("space-group number {n}")),
                    hm.as_deref()
                        .filter(|_| matches!(hm_number, Some(n) if n != resolved))
                        .map(|s| format!("Hermann–Mauguin symbol `{s}`")),
                ];
                for given in contradictions.into_iter().flatten() {
                    self.report_contradiction(given, h, &mut warnings)?;
                }
                number = Some(resolved);
            }
            if let Some(resolved) = tables.hm_from_hall(h) {
                hm = Some(resolved.to_string());
            }
        }
        let setting = hall
            .as_deref()
            .and_then(|h| h.trim_start_matches('-').chars().next())
            .or_else(|| hm.as_deref().and_then(|s| s.chars().next()))
            .or_else(|| number.and_then(|n| tables.setting_from_number(n)))
            .map(|c| c.to_ascii_uppercase());

        let rhombohedral = hall
            .as_deref()
            .map(|h| tables.is_rhombohedral_group(h))
            .unwrap_or(false);
        let hexagonal_setting = hall
            .as_deref()
            .and_then(|h| tables.hexagonal_from_rhombohedral(h))
            .map(|hex_hall| {
                let operations = tables
                    .operations(hex_hall)
                    .ok_or_else(|| {
                        format_err!(SymmetryError(format!(
                            "No symmetry operations are available for the hexagonal setting `{hex_hall}`."
                        )))
                    })?
                    .iter()
                    .map(|op| SymmetryOperation::from_xyz(op, self.threshold))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, anyhow::Error>(HexagonalSetting {
                    hall: hex_hall.to_string(),
                    hm: tables.hm_from_hall(hex_hall).map(str::to_string),
                    operations,
                })
            })
            .transpose()?;

        log::debug!(
            "Resolved space group: number {:?}, Hall `{}`, H-M `{}`, {} operations: {}",
            number,
            hall.as_deref().unwrap_or("?"),
            hm.as_deref().unwrap_or("?"),
            operations.len(),
            operations.iter().map(|op| op.xyz.as_str()).join("; ")
        );

        Ok(SpaceGroupInfo {
            number,
            hall,
            hm,
            setting,
            operations,
            rhombohedral,
            hexagonal_setting,
            warnings,
        })
    }

    /// Handles space-group information contradicting the resolved Hall symbol, which takes
    /// precedence.
    fn report_contradiction(
        &self,
        given: String,
        hall: &str,
        warnings: &mut Vec<CellWarning>,
    ) -> Result<(), anyhow::Error> {
        if self.strictness.is_forced() {
            log::warn!("The {given} contradicts the Hall symbol `{hall}` and is overridden.");
            warnings.push(CellWarning::ContradictorySpaceGroup {
                given,
                hall: hall.to_string(),
            });
            Ok(())
        } else {
            Err(format_err!(SymmetryError(format!(
                "The {given} contradicts the Hall symbol `{hall}`."
            ))))
        }
    }
}
