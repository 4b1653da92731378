//! Driver for the construction of crystal cells from data blocks.

use std::fmt;

use anyhow::{self, format_err, Context};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::block::ingestion::CellInput;
use crate::block::DataBlock;
use crate::cell::displacement::RandomDisplacementParams;
use crate::cell::supercell::SupercellParams;
use crate::cell::{BuildStatus, CellOptions, CrystalCell, Strictness};
use crate::data::{SpaceGroupTables, REFERENCE_TABLES};
use crate::drivers::CellDriver;
use crate::io::format::{cellsym_output, log_subtitle, log_title, nice_bool, CellsymOutput};
use crate::lattice::LengthUnit;

#[cfg(test)]
#[path = "cell_construction_tests.rs"]
mod cell_construction_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

fn default_coordinate_threshold() -> f64 {
    2e-4
}

fn default_occupancy_threshold() -> f64 {
    1e-6
}

/// A structure containing control parameters for crystal-cell construction.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellConstructionParams {
    /// Threshold for position and operation comparisons in fractional coordinates.
    #[builder(default = "default_coordinate_threshold()")]
    #[serde(default = "default_coordinate_threshold")]
    pub coordinate_threshold: f64,

    /// Threshold for occupancy comparisons.
    #[builder(default = "default_occupancy_threshold()")]
    #[serde(default = "default_occupancy_threshold")]
    pub occupancy_threshold: f64,

    /// The policy for missing or inconsistent input. Under [`Strictness::Forced`], fallbacks are
    /// taken and recorded as warnings on the cell.
    #[builder(default)]
    #[serde(default)]
    pub strictness: Strictness,

    /// Boolean indicating if the cell is to be reduced to its primitive cell.
    #[builder(default = "false")]
    #[serde(default)]
    pub reduce_to_primitive: bool,

    /// The length unit of the constructed cell. Data blocks are read in ångström.
    #[builder(default)]
    #[serde(default)]
    pub length_unit: LengthUnit,

    /// The species label used to fill the occupancy deficit of partially occupied sites. If
    /// `None`, deficits are left as they are.
    #[builder(default = "None")]
    #[serde(default)]
    pub vacancy_label: Option<String>,

    /// Optional supercell construction applied after the cell has been built.
    #[builder(default = "None")]
    #[serde(default)]
    pub supercell: Option<SupercellParams>,

    /// Optional shape-preserving transformation applied to the lattice vectors after any
    /// supercell construction.
    #[builder(default = "None")]
    #[serde(default)]
    pub transformation: Option<Matrix3<f64>>,

    /// Optional random displacements applied last.
    #[builder(default = "None")]
    #[serde(default)]
    pub random_displacement: Option<RandomDisplacementParams>,
}

impl CellConstructionParams {
    /// Returns a builder to construct a [`CellConstructionParams`] structure.
    pub fn builder() -> CellConstructionParamsBuilder {
        CellConstructionParamsBuilder::default()
    }

    /// Returns the options controlling the cell itself.
    #[must_use]
    pub fn cell_options(&self) -> CellOptions {
        CellOptions {
            coordinate_threshold: self.coordinate_threshold,
            occupancy_threshold: self.occupancy_threshold,
            strictness: self.strictness,
        }
    }
}

impl Default for CellConstructionParams {
    fn default() -> Self {
        Self {
            coordinate_threshold: default_coordinate_threshold(),
            occupancy_threshold: default_occupancy_threshold(),
            strictness: Strictness::default(),
            reduce_to_primitive: false,
            length_unit: LengthUnit::default(),
            vacancy_label: None,
            supercell: None,
            transformation: None,
            random_displacement: None,
        }
    }
}

impl fmt::Display for CellConstructionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Coordinate threshold: {:.3e}",
            self.coordinate_threshold
        )?;
        writeln!(f, "Occupancy threshold: {:.3e}", self.occupancy_threshold)?;
        writeln!(f, "Strictness: {}", self.strictness)?;
        writeln!(
            f,
            "Reduce to primitive cell: {}",
            nice_bool(self.reduce_to_primitive)
        )?;
        writeln!(f, "Length unit: {}", self.length_unit)?;
        writeln!(
            f,
            "Vacancy label: {}",
            self.vacancy_label.as_deref().unwrap_or("--")
        )?;
        writeln!(
            f,
            "Supercell construction: {}",
            nice_bool(self.supercell.is_some())
        )?;
        if let Some(transformation) = self.transformation.as_ref() {
            writeln!(
                f,
                "Cell transformation: [{}]",
                transformation
                    .row_iter()
                    .map(|row| format!("[{}]", row.iter().map(|x| format!("{x:+.3}")).join(", ")))
                    .join(", ")
            )?;
        } else {
            writeln!(f, "Cell transformation: {}", nice_bool(false))?;
        }
        if let Some(displacement) = self.random_displacement.as_ref() {
            writeln!(
                f,
                "Random displacements: {} of size {}{}",
                displacement.distribution,
                displacement.size,
                displacement
                    .seed
                    .map(|seed| format!(" (seed {seed})"))
                    .unwrap_or_default()
            )?;
        } else {
            writeln!(f, "Random displacements: {}", nice_bool(false))?;
        }
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain crystal-cell construction results.
#[derive(Clone, Builder, Debug)]
pub struct CellConstructionResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: CellConstructionParams,

    /// The constructed cell.
    pub cell: CrystalCell,
}

impl CellConstructionResult {
    /// Returns a builder to construct a [`CellConstructionResult`] structure.
    fn builder() -> CellConstructionResultBuilder {
        CellConstructionResultBuilder::default()
    }
}

impl fmt::Display for CellConstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cell)?;
        writeln!(f)?;
        match self.cell.status() {
            BuildStatus::Clean => writeln!(f, "Construction status: clean")?,
            BuildStatus::Degraded(warnings) => writeln!(
                f,
                "Construction status: degraded ({} {})",
                warnings.len(),
                if warnings.len() == 1 {
                    "warning"
                } else {
                    "warnings"
                }
            )?,
        }
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for crystal-cell construction.
#[derive(Clone, Builder)]
pub struct CellConstructionDriver<'a> {
    /// The control parameters for cell construction.
    parameters: &'a CellConstructionParams,

    /// The data block from which the cell is constructed.
    block: &'a dyn DataBlock,

    /// The space-group reference tables. The tables shipped with the crate are used by default.
    #[builder(default = "&REFERENCE_TABLES")]
    tables: &'a dyn SpaceGroupTables,

    /// The result of the cell construction.
    #[builder(setter(skip), default = "None")]
    result: Option<CellConstructionResult>,
}

impl<'a> CellConstructionDriver<'a> {
    /// Returns a builder to construct a [`CellConstructionDriver`] structure.
    pub fn builder() -> CellConstructionDriverBuilder<'a> {
        CellConstructionDriverBuilder::default()
    }

    /// Executes cell construction.
    fn construct_cell(&mut self) -> Result<(), anyhow::Error> {
        log_title("Crystal Cell Construction");
        cellsym_output!("");
        let params = self.parameters;
        params.log_output_display();

        let input = CellInput::from_block(self.block, params.strictness)
            .with_context(|| "Unable to read the cell input from the data block")?;
        let mut cell = CrystalCell::new(input, self.tables, params.cell_options())
            .with_context(|| "Unable to resolve the space group of the cell")?;
        cell.build(params.reduce_to_primitive)
            .with_context(|| "Unable to build the crystal cell")?;
        cell.set_unit(params.length_unit);

        if let Some(label) = params.vacancy_label.as_ref() {
            cell.fill_out_empty(label)?;
        }

        if let Some(supercell_params) = params.supercell.as_ref() {
            log_subtitle("Supercell construction");
            cellsym_output!("");
            supercell_params.log_output_display();
            cellsym_output!("");
            cell.supercell(supercell_params)
                .with_context(|| "Unable to construct the supercell")?;
        }

        if let Some(transformation) = params.transformation.as_ref() {
            cell.transform(transformation)
                .with_context(|| "Unable to transform the cell")?;
        }

        if let Some(displacement) = params.random_displacement.as_ref() {
            let mut rng = match displacement.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            cell.random_displacements(displacement.size, displacement.distribution, &mut rng)?;
        }

        log::debug!(
            "Cell constructed with {} atom(s) and {} operation(s).",
            cell.number_of_atoms(),
            cell.operations.len()
        );
        let result = CellConstructionResult::builder()
            .parameters(params.clone())
            .cell(cell)
            .build()?;
        result.log_output_display();
        self.result = Some(result);
        Ok(())
    }
}

impl CellDriver for CellConstructionDriver<'_> {
    type Params = CellConstructionParams;

    type Outcome = CellConstructionResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No cell construction results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.construct_cell()
    }
}
