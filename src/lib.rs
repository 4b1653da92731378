//! # cellsym: symmetry-consistent crystal cells from partial crystallographic data
//!
//! `cellsym` reconstructs a complete crystal cell from the kind of partial information found in
//! crystallographic data blocks:
//! - lattice parameters $`(a, b, c, \alpha, \beta, \gamma)`$,
//! - a space-group identifier given as a number, a Hermann–Mauguin symbol, a Hall symbol, or an
//!   explicit list of symmetry operations, and
//! - a list of symmetry-inequivalent sites with fractional or cartesian coordinates and
//!   occupancies.
//!
//! From this, the crate derives the Bravais lattice vectors, the full set of symmetry operations,
//! the primitive or conventional cell with every atom generated, and optionally integer
//! supercells with vacuum padding and shape-preserving cell transformations.
//!
//! ## Overview
//!
//! The construction pipeline runs through the following modules:
//! - [`block`]: access to named scalar and looped fields of a crystallographic data block, and
//!   the ingestion of those fields into a [`block::ingestion::CellInput`],
//! - [`symmetry`]: compiled symmetry operations and space-group resolution against reference
//!   tables provided by [`data`],
//! - [`lattice`]: lattice parameters and lattice-vector synthesis per crystal system,
//! - [`cell`]: the [`cell::CrystalCell`] itself together with coordinate normalisation,
//!   primitive-cell reduction, site expansion, supercells and transformations,
//! - [`drivers`]: drivers that run the pipeline from a set of control parameters.
//!
//! ## Examples and usage
//!
//! Usages of most items are illustrated in the test functions next to them. The `cellsym`
//! binary reads a YAML configuration file containing the control parameters and an in-memory data
//! block, and logs the constructed cell.
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod auxiliary;
pub mod block;
pub mod cell;
pub mod data;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod lattice;
pub mod symmetry;
