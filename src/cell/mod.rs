//! Crystal cells constructed from partial crystallographic data.
//!
//! A [`CrystalCell`] is created from a [`CellInput`] by resolving its space-group information,
//! and is populated by [`CrystalCell::build`], which runs in order
//! - the conversion of cartesian input coordinates to fractional ones and the switch of
//!   rhombohedral settings to their hexagonal equivalents ([`coordinates`]),
//! - the construction of the conventional lattice and its optional reduction to the primitive
//!   cell ([`reduction`]), and
//! - the expansion of the inequivalent sites into complete orbits ([`expansion`]).
//!
//! A built cell can then be mapped onto a supercell ([`supercell`]), transformed by a
//! shape-preserving matrix ([`transform`]), or randomly distorted ([`displacement`]).

use std::error::Error;
use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::block::ingestion::{CellInput, CoordinateKind};
use crate::data::SpaceGroupTables;
use crate::io::format::{nice_bool, write_subtitle};
use crate::lattice::{conventional_lattice_vectors, Lattice, LatticeParameters, LengthUnit};
use crate::symmetry::crystal_system::CrystalSystem;
use crate::symmetry::space_group::{SpaceGroupInfo, SpaceGroupResolver};
use crate::symmetry::symmetry_operation::SymmetryOperation;
use crate::symmetry::{Centering, SymmetryError};

pub mod coordinates;
pub mod displacement;
pub mod expansion;
pub mod reduction;
pub mod supercell;
pub mod transform;


// ==================
// Error definitions
// ==================

/// Error for invalid lattices, supercell maps, coordinate transformations, or operations requested
/// on cells that have not been built.
#[derive(Debug, Clone)]
pub struct CellError(pub String);

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell error: {}", self.0)
    }
}

impl Error for CellError {}

/// Error for missing or malformed atomic positions and occupancies.
#[derive(Debug, Clone)]
pub struct PositionError(pub String);

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position error: {}", self.0)
    }
}

impl Error for PositionError {}

/// Error for invalid configuration options.
#[derive(Debug, Clone)]
pub struct SetupError(pub String);

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setup error: {}", self.0)
    }
}

impl Error for SetupError {}

// ================
// Enum definitions
// ================

/// Enumerated type for the policy applied to missing or inconsistent input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strictness {
    /// Missing or inconsistent input is fatal.
    #[default]
    Strict,

    /// A specific set of conditions falls back to a best-effort result recorded as a
    /// [`CellWarning`].
    Forced,
}

impl Strictness {
    /// Checks if fallbacks are allowed.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        *self == Self::Forced
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Forced => write!(f, "forced"),
        }
    }
}

/// Enumerated type for the fallbacks taken while constructing a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellWarning {
    /// No space-group information was found and the group was taken to be $`P1`$.
    DefaultedToP1,

    /// The number of explicit symmetry operations differs from the tabulated one.
    OperationCountMismatch { explicit: usize, tabulated: usize },

    /// The cartesian-to-fractional transformation matrix was derived from the lattice.
    DefaultCartesianTransform,

    /// The cartesian-to-fractional translation vector was taken to be zero.
    DefaultCartesianTranslation,

    /// Sites with defective positions or occupancies were dropped.
    DroppedDefectiveSites { count: usize },

    /// A transformation changing the cell shape was applied.
    ShapeViolatingTransform,

    /// A species symbol is not a known element.
    UnknownElement(String),

    /// A Hermann–Mauguin symbol could not be converted to a Hall symbol.
    UnresolvedHermannMauguin(String),

    /// A space-group number or Hermann–Mauguin symbol contradicting the Hall symbol was
    /// overridden.
    ContradictorySpaceGroup { given: String, hall: String },
}

impl fmt::Display for CellWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultedToP1 => write!(f, "space group defaulted to P1"),
            Self::OperationCountMismatch {
                explicit,
                tabulated,
            } => write!(
                f,
                "{explicit} explicit symmetry operations used instead of {tabulated} tabulated ones"
            ),
            Self::DefaultCartesianTransform => {
                write!(f, "cartesian transformation matrix derived from the lattice")
            }
            Self::DefaultCartesianTranslation => {
                write!(f, "cartesian translation vector taken to be zero")
            }
            Self::DroppedDefectiveSites { count } => {
                write!(f, "{count} site(s) with defective data dropped")
            }
            Self::ShapeViolatingTransform => {
                write!(f, "cell transformation changed the cell shape")
            }
            Self::UnknownElement(symbol) => write!(f, "unknown element `{symbol}`"),
            Self::UnresolvedHermannMauguin(symbol) => {
                write!(f, "unresolved Hermann–Mauguin symbol `{symbol}`")
            }
            Self::ContradictorySpaceGroup { given, hall } => {
                write!(f, "{given} overridden by Hall symbol `{hall}`")
            }
        }
    }
}

/// Enumerated type for the outcome of a cell construction.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildStatus<'a> {
    /// No fallback was taken.
    Clean,

    /// The cell was constructed with the listed fallbacks.
    Degraded(&'a [CellWarning]),
}

// ==================
// Struct definitions
// ==================

/// An atomic site with fractional coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtomSite {
    /// The fractional coordinates of the site.
    pub position: Vector3<f64>,

    /// The species occupying the site and their occupancies. A total below one implies a vacancy.
    pub species: IndexMap<String, f64>,

    /// The charge states of the species, if known.
    #[serde(default)]
    pub charges: IndexMap<String, f64>,

    /// A free-text label.
    #[serde(default)]
    pub label: String,
}

impl AtomSite {
    /// Creates a fully occupied single-species site without charge information.
    #[must_use]
    pub fn new(position: Vector3<f64>, species: &str, label: &str) -> Self {
        let mut species_map = IndexMap::new();
        species_map.insert(species.to_string(), 1.0);
        Self {
            position,
            species: species_map,
            charges: IndexMap::new(),
            label: label.to_string(),
        }
    }

    /// Returns the total occupancy of the site.
    #[must_use]
    pub fn total_occupancy(&self) -> f64 {
        self.species.values().sum()
    }

    /// Checks if any species occupies the site only partially.
    #[must_use]
    pub fn is_partial(&self, occupancy_threshold: f64) -> bool {
        self.species
            .values()
            .any(|occ| *occ < 1.0 - occupancy_threshold)
    }
}

impl fmt::Display for AtomSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let species = self
            .species
            .iter()
            .map(|(symbol, occ)| match self.charges.get(symbol) {
                Some(charge) => format!("{symbol}({charge:+}):{occ:.4}"),
                None => format!("{symbol}:{occ:.4}"),
            })
            .join(" ");
        write!(
            f,
            "{:<8} {:>+12.8} {:>+12.8} {:>+12.8}  {species}",
            self.label, self.position[0], self.position[1], self.position[2]
        )
    }
}

/// An orbit of symmetry-equivalent sites. The first member is the representative.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteGroup {
    pub sites: Vec<AtomSite>,
}

impl SiteGroup {
    /// Returns the representative site of the orbit.
    #[must_use]
    pub fn representative(&self) -> Option<&AtomSite> {
        self.sites.first()
    }

    /// Returns the number of sites in the orbit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Checks if the orbit is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// The mode flags of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMode {
    /// The cell has been reduced to the primitive cell.
    pub primitive: bool,

    /// The cell has been mapped onto a supercell.
    pub supercell: bool,

    /// At least one site is shared fractionally among species.
    pub alloy: bool,

    /// A rhombohedral setting has been switched to its hexagonal equivalent.
    pub rhombohedral_as_hexagonal: bool,
}

/// A structure containing the thresholds and the strictness policy used during cell
/// construction.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellOptions {
    /// Threshold for position and operation comparisons in fractional coordinates.
    #[builder(default = "2e-4")]
    pub coordinate_threshold: f64,

    /// Threshold for occupancy comparisons.
    #[builder(default = "1e-6")]
    pub occupancy_threshold: f64,

    /// The policy for missing or inconsistent input.
    #[builder(default)]
    pub strictness: Strictness,
}

impl CellOptions {
    /// Returns a builder to construct a [`CellOptions`] structure.
    pub fn builder() -> CellOptionsBuilder {
        CellOptionsBuilder::default()
    }
}

impl Default for CellOptions {
    fn default() -> Self {
        Self {
            coordinate_threshold: 2e-4,
            occupancy_threshold: 1e-6,
            strictness: Strictness::Strict,
        }
    }
}

/// A crystal cell.
#[derive(Clone, Debug)]
pub struct CrystalCell {
    /// The space-group description of the cell in the setting actually used.
    pub space_group: SpaceGroupInfo,

    /// The crystal system.
    pub crystal_system: CrystalSystem,

    /// The parameters of the current cell, with lengths in [`Self::unit`].
    pub parameters: LatticeParameters,

    /// The length in [`Self::unit`] corresponding to one unit of [`Self::lattice`].
    pub length_scale: f64,

    /// The length unit.
    pub unit: LengthUnit,

    /// The lattice vectors of the current cell in units of [`Self::length_scale`].
    pub lattice: Lattice,

    /// The symmetry operations in fractional coordinates of the current cell.
    pub operations: Vec<SymmetryOperation>,

    /// The lattice translations that are not translations of the current cell, in fractional
    /// coordinates of the conventional cell for built cells and of the supercell after a
    /// supercell mapping. The zero vector is always the first element.
    pub induced_translations: Vec<Vector3<f64>>,

    /// The transformation from the conventional cell to the current cell, whose rows are the
    /// current lattice vectors in fractional coordinates of the conventional cell.
    pub transformation: Matrix3<f64>,

    /// The site orbits.
    pub site_groups: Vec<SiteGroup>,

    /// The summed occupancy of every species, reduced to a formula unit for non-alloy cells.
    pub composition: IndexMap<String, f64>,

    /// The mode flags.
    pub mode: CellMode,

    /// Fallbacks taken during ingestion, resolution and construction.
    pub warnings: Vec<CellWarning>,

    /// The construction options.
    pub options: CellOptions,

    input: CellInput,
    resolved: SpaceGroupInfo,
    built: bool,
}

impl CrystalCell {
    /// Creates an unbuilt cell by resolving the space-group information of `input`.
    ///
    /// # Arguments
    ///
    /// * `input` - The raw cell description.
    /// * `tables` - The space-group reference tables.
    /// * `options` - The construction options.
    ///
    /// # Errors
    ///
    /// Errors if the space group cannot be resolved or if the lattice parameters are invalid.
    pub fn new(
        input: CellInput,
        tables: &dyn SpaceGroupTables,
        options: CellOptions,
    ) -> Result<Self, anyhow::Error> {
        let resolver = SpaceGroupResolver::new(
            tables,
            options.strictness,
            options.coordinate_threshold,
        );
        let resolved = resolver.resolve(&input.space_group)?;
        let crystal_system = CrystalSystem::from_number(resolved.number);
        let parameters = input.parameters;
        let lattice = Lattice::new(conventional_lattice_vectors(
            &parameters,
            crystal_system,
            options.coordinate_threshold,
        )?)?;
        let warnings = input
            .warnings
            .iter()
            .chain(resolved.warnings.iter())
            .cloned()
            .collect_vec();
        Ok(Self {
            space_group: resolved.clone(),
            crystal_system,
            parameters,
            length_scale: parameters.a,
            unit: LengthUnit::default(),
            lattice,
            operations: resolved.operations.clone(),
            induced_translations: vec![Vector3::zeros()],
            transformation: Matrix3::identity(),
            site_groups: vec![],
            composition: IndexMap::new(),
            mode: CellMode::default(),
            warnings,
            options,
            input,
            resolved,
            built: false,
        })
    }

    /// Builds the conventional or primitive cell from the stored input. Any previous build,
    /// supercell mapping or transformation is discarded.
    ///
    /// # Arguments
    ///
    /// * `primitive` - If `true`, the conventional cell is reduced to the primitive cell.
    ///
    /// # Errors
    ///
    /// Errors if coordinates cannot be converted, if a reduction is requested without a known
    /// lattice centering, or if the lattice is not invariant under the symmetry operations.
    pub fn build(&mut self, primitive: bool) -> Result<(), anyhow::Error> {
        let thresh = self.options.coordinate_threshold;
        let occ_thresh = self.options.occupancy_threshold;
        let strictness = self.options.strictness;
        let mut warnings = self
            .input
            .warnings
            .iter()
            .chain(self.resolved.warnings.iter())
            .cloned()
            .collect_vec();
        let mut space_group = self.resolved.clone();
        let crystal_system = CrystalSystem::from_number(space_group.number);
        let mut parameters = self.input.parameters;

        let rhombohedral_setting =
            space_group.hexagonal_setting.is_some() && (parameters.gamma - 120.0).abs() > thresh;
        let input_vectors = conventional_lattice_vectors(
            &parameters,
            if rhombohedral_setting {
                CrystalSystem::Triclinic
            } else {
                crystal_system
            },
            thresh,
        )?;
        let mut sites = coordinates::fractional_sites(
            &self.input,
            &input_vectors,
            parameters.a,
            strictness,
            thresh,
            &mut warnings,
        )?;

        let mut rhombohedral_as_hexagonal = false;
        if rhombohedral_setting {
            log::debug!(
                "Switching the rhombohedral setting `{}` to its hexagonal equivalent.",
                space_group.hall.as_deref().unwrap_or("?")
            );
            parameters = parameters.rhombohedral_to_hexagonal();
            sites = coordinates::rhombohedral_sites_to_hexagonal(&sites, thresh);
            rhombohedral_as_hexagonal = space_group.switch_to_hexagonal_setting();
        }

        let conventional = Lattice::new(conventional_lattice_vectors(
            &parameters,
            crystal_system,
            thresh,
        )?)?;

        let centering = if primitive {
            space_group
                .setting
                .and_then(Centering::from_setting)
                .ok_or_else(|| {
                    format_err!(SymmetryError(format!(
                        "Cannot reduce to the primitive cell without a known lattice centering (setting: {})",
                        space_group
                            .setting
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "none".to_string())
                    )))
                })?
        } else {
            Centering::Primitive
        };
        let reduced = reduction::reduce(
            &conventional,
            centering,
            crystal_system,
            &space_group.operations,
            thresh,
        )?;
        let expanded = expansion::expand(
            &sites,
            &reduced.conventional_operations,
            &reduced.translations,
            &reduced.transformation,
            thresh,
            occ_thresh,
        )?;

        self.space_group = space_group;
        self.crystal_system = crystal_system;
        self.length_scale = parameters.a;
        self.lattice = reduced.lattice;
        self.refresh_parameters();
        self.operations = reduced.operations;
        self.induced_translations = reduced.translations;
        self.transformation = reduced.transformation;
        self.site_groups = expanded.groups;
        self.composition = expanded.composition;
        self.mode = CellMode {
            primitive,
            supercell: false,
            alloy: expanded.alloy,
            rhombohedral_as_hexagonal,
        };
        self.warnings = warnings;
        self.built = true;

        if !self.mode.primitive {
            if let Some(hint) = self.input.multiplicity_hint {
                if hint != self.number_of_atoms() {
                    log::debug!(
                        "The site multiplicities sum to {hint}, but {} atoms were generated.",
                        self.number_of_atoms()
                    );
                }
            }
        }
        log::debug!(
            "Built {} cell with {} operations, {} orbits and {} atoms.",
            if self.mode.primitive {
                "primitive"
            } else {
                "conventional"
            },
            self.operations.len(),
            self.site_groups.len(),
            self.number_of_atoms()
        );
        Ok(())
    }

    /// Returns a copy of this cell built as the primitive cell.
    pub fn primitive(&self) -> Result<Self, anyhow::Error> {
        let mut cell = self.clone();
        cell.build(true)?;
        Ok(cell)
    }

    /// Returns a copy of this cell built as the conventional cell.
    pub fn conventional(&self) -> Result<Self, anyhow::Error> {
        let mut cell = self.clone();
        cell.build(false)?;
        Ok(cell)
    }

    /// Checks if the cell has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Returns [`BuildStatus::Clean`] if no fallback was taken, and
    /// [`BuildStatus::Degraded`] otherwise.
    #[must_use]
    pub fn status(&self) -> BuildStatus<'_> {
        if self.warnings.is_empty() {
            BuildStatus::Clean
        } else {
            BuildStatus::Degraded(&self.warnings)
        }
    }

    /// Returns the raw input from which the cell is built.
    #[must_use]
    pub fn input(&self) -> &CellInput {
        &self.input
    }

    /// Returns the volume of the cell in cubed [`Self::unit`].
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.lattice.volume() * self.length_scale.powi(3)
    }

    /// Returns the reciprocal lattice in inverse [`Self::unit`].
    pub fn reciprocal_lattice(&self) -> Result<Lattice, anyhow::Error> {
        let reciprocal = self.lattice.reciprocal()?;
        Ok(Lattice {
            vectors: reciprocal.vectors / self.length_scale,
        })
    }

    /// Returns the total number of atomic sites.
    #[must_use]
    pub fn number_of_atoms(&self) -> usize {
        self.site_groups.iter().map(SiteGroup::len).sum()
    }

    /// Returns an iterator over all atomic sites, orbit by orbit.
    pub fn atoms(&self) -> impl Iterator<Item = &AtomSite> + '_ {
        self.site_groups.iter().flat_map(|group| group.sites.iter())
    }

    /// Returns the cartesian positions of all atomic sites in [`Self::unit`].
    #[must_use]
    pub fn cartesian_positions(&self) -> Vec<Vector3<f64>> {
        self.atoms()
            .map(|site| self.lattice.to_cartesian(&site.position) * self.length_scale)
            .collect()
    }

    /// Returns the symmetry operations as cartesian rotations and translations in
    /// [`Self::unit`].
    pub fn cartesian_operations(
        &self,
    ) -> Result<Vec<(Matrix3<f64>, Vector3<f64>)>, anyhow::Error> {
        self.operations
            .iter()
            .map(|op| {
                Ok((
                    self.lattice.cartesian_rotation(&op.rotation)?,
                    self.lattice.to_cartesian(&op.translation) * self.length_scale,
                ))
            })
            .collect()
    }

    /// Changes the length unit, rescaling the length scale, the lattice parameters and any stored
    /// cartesian input.
    pub fn set_unit(&mut self, unit: LengthUnit) {
        let factor = self.unit.conversion_factor(unit);
        if factor == 1.0 {
            self.unit = unit;
            return;
        }
        self.length_scale *= factor;
        self.parameters = self.parameters.scaled(factor);
        self.input.parameters = self.input.parameters.scaled(factor);
        if self.input.coordinates == CoordinateKind::Cartesian {
            for site in self.input.sites.iter_mut() {
                site.position *= factor;
            }
            if let Some(transform) = self.input.cartesian_transform.as_mut() {
                *transform *= factor;
            }
            if let Some(translation) = self.input.cartesian_translation.as_mut() {
                *translation *= factor;
            }
        }
        self.unit = unit;
    }

    /// Fills the occupancy deficit of every site with a vacancy species.
    ///
    /// # Arguments
    ///
    /// * `label` - The species label for vacancies, e.g. `Em`.
    pub fn fill_out_empty(&mut self, label: &str) -> Result<(), anyhow::Error> {
        self.ensure_built("vacancy filling")?;
        let occ_thresh = self.options.occupancy_threshold;
        let mut filled = 0;
        for site in self
            .site_groups
            .iter_mut()
            .flat_map(|group| group.sites.iter_mut())
        {
            let total = site.total_occupancy();
            if total < 1.0 - occ_thresh {
                *site.species.entry(label.to_string()).or_insert(0.0) += 1.0 - total;
                filled += 1;
            }
        }
        log::debug!("Filled the occupancy deficits of {filled} site(s) with `{label}`.");
        self.composition =
            expansion::composition(&self.site_groups, self.mode.alloy, occ_thresh);
        Ok(())
    }

    pub(crate) fn ensure_built(&self, action: &str) -> Result<(), anyhow::Error> {
        if self.built {
            Ok(())
        } else {
            Err(format_err!(CellError(format!(
                "The cell must be built before {action}."
            ))))
        }
    }

    pub(crate) fn refresh_parameters(&mut self) {
        let lengths = self.lattice.lengths();
        let angles = self.lattice.angles();
        self.parameters = LatticeParameters {
            a: lengths[0] * self.length_scale,
            b: lengths[1] * self.length_scale,
            c: lengths[2] * self.length_scale,
            alpha: angles[0],
            beta: angles[1],
            gamma: angles[2],
        };
    }
}

impl fmt::Display for CrystalCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Cell")?;
        writeln!(f, "Crystal system: {}", self.crystal_system)?;
        writeln!(f, "Primitive: {}", nice_bool(self.mode.primitive))?;
        writeln!(f, "Supercell: {}", nice_bool(self.mode.supercell))?;
        writeln!(f, "Alloy: {}", nice_bool(self.mode.alloy))?;
        writeln!(
            f,
            "Rhombohedral setting as hexagonal: {}",
            nice_bool(self.mode.rhombohedral_as_hexagonal)
        )?;
        writeln!(f, "Parameters: {} ({})", self.parameters, self.unit)?;
        writeln!(f, "Length scale: {:.8} {}", self.length_scale, self.unit)?;
        writeln!(f, "Lattice vectors (units of length scale):")?;
        write!(f, "{}", self.lattice)?;
        writeln!(f, "Volume: {:.8} {}^3", self.volume(), self.unit)?;
        writeln!(f)?;

        write_subtitle(f, "Space group")?;
        write!(f, "{}", self.space_group)?;
        writeln!(
            f,
            "Operations in the current cell: {}",
            self.operations.iter().map(|op| op.xyz.as_str()).join("; ")
        )?;
        writeln!(f)?;

        write_subtitle(f, "Atoms")?;
        writeln!(
            f,
            "Composition: {}",
            self.composition
                .iter()
                .map(|(symbol, count)| format!("{symbol}{count}"))
                .join(" ")
        )?;
        writeln!(f, "Number of atoms: {}", self.number_of_atoms())?;
        for (i, group) in self.site_groups.iter().enumerate() {
            writeln!(f, "Orbit {} ({} sites):", i + 1, group.len())?;
            for site in group.sites.iter() {
                writeln!(f, "  {site}")?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f)?;
            write_subtitle(f, "Warnings")?;
            for warning in self.warnings.iter() {
                writeln!(f, "- {warning}")?;
            }
        }
        Ok(())
    }
}
