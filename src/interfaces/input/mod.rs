//! Configuration files for the `cellsym` binary.

use anyhow::{self, Context};
use serde::{Deserialize, Serialize};

use crate::block::MemoryBlock;
use crate::drivers::cell_construction::{CellConstructionDriver, CellConstructionParams};
use crate::drivers::CellDriver;
use crate::interfaces::InputHandle;
use crate::io::format::cellsym_warn;

#[cfg(test)]
#[path = "input_tests.rs"]
mod input_tests;

/// A structure containing the control parameters and the data block for a cell construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CellConstructionInput {
    /// The control parameters. If not specified, the defaults are used.
    #[serde(default)]
    pub parameters: CellConstructionParams,

    /// The data block holding the crystallographic fields.
    pub block: MemoryBlock,
}

/// A structure containing `cellsym` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Input {
    /// Specification for cell construction. If `None`, no cell will be constructed.
    ///
    /// # Default
    ///
    /// If not specified, this will be taken to be `None`.
    #[serde(default)]
    pub cell_construction: Option<CellConstructionInput>,
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        let Some(cc_input) = self.cell_construction.as_ref() else {
            cellsym_warn!("No cell construction has been requested.");
            return Ok(());
        };
        let mut driver = CellConstructionDriver::builder()
            .parameters(&cc_input.parameters)
            .block(&cc_input.block)
            .build()
            .with_context(|| "Unable to construct a cell construction driver")?;
        driver.run().with_context(|| {
            format!(
                "Unable to construct a cell from data block `{}`",
                cc_input.block.name
            )
        })
    }
}
