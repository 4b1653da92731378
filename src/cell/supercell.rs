//! Integer supercells with vacuum padding.

use std::fmt;
use std::str::FromStr;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{
    is_diagonal, maps_lattice_onto_itself, periodic_eq, snap_fractional_vector, wrap_into_cell,
};
use crate::cell::expansion::composition;
use crate::cell::{AtomSite, CellError, CrystalCell, SetupError, SiteGroup};
use crate::lattice::Lattice;
use crate::symmetry::crystal_system::CrystalSystem;
use crate::symmetry::symmetry_operation::SymmetryOperation;

#[cfg(test)]
#[path = "supercell_tests.rs"]
mod supercell_tests;

// ================
// Enum definitions
// ================

/// Enumerated type for supercell maps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SupercellMap {
    /// A diagonal map given by its three multipliers.
    Diagonal([i32; 3]),

    /// A general map whose rows are the new lattice vectors in fractional coordinates of the
    /// current cell.
    General(Matrix3<f64>),
}

impl SupercellMap {
    /// Returns the map as a matrix.
    #[must_use]
    pub fn matrix(&self) -> Matrix3<f64> {
        match self {
            Self::Diagonal(multipliers) => Matrix3::from_diagonal(&Vector3::new(
                f64::from(multipliers[0]),
                f64::from(multipliers[1]),
                f64::from(multipliers[2]),
            )),
            Self::General(matrix) => *matrix,
        }
    }
}

/// Enumerated type for atom orderings in a supercell.
///
/// The textual forms are `zlayer`, a sequence of the letters `x`, `y` and `z` for cartesian axes,
/// or a sequence of the digits `1`, `2` and `3` for lattice axes. Atoms are sorted successively by
/// each axis in the sequence with a stable sort, so the last axis ends up as the primary key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortKey {
    /// Ascending cartesian $`z`$ coordinate.
    ZLayer,

    /// Ascending cartesian coordinates along the listed axes.
    Cartesian(Vec<usize>),

    /// Ascending fractional coordinates along the listed lattice axes.
    Lattice(Vec<usize>),
}

impl FromStr for SortKey {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "zlayer" {
            return Ok(Self::ZLayer);
        }
        let invalid = || SetupError(format!("Invalid atom sort key `{s}`."));
        if s.is_empty() {
            return Err(invalid());
        }
        if s.chars().all(|c| matches!(c, 'x' | 'y' | 'z')) {
            Ok(Self::Cartesian(
                s.chars()
                    .map(|c| match c {
                        'x' => 0,
                        'y' => 1,
                        _ => 2,
                    })
                    .collect(),
            ))
        } else if s.chars().all(|c| matches!(c, '1' | '2' | '3')) {
            Ok(Self::Lattice(
                s.chars()
                    .map(|c| match c {
                        '1' => 0,
                        '2' => 1,
                        _ => 2,
                    })
                    .collect(),
            ))
        } else {
            Err(invalid())
        }
    }
}

impl TryFrom<String> for SortKey {
    type Error = SetupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZLayer => write!(f, "zlayer"),
            Self::Cartesian(axes) => write!(
                f,
                "{}",
                axes.iter()
                    .map(|i| ['x', 'y', 'z'].get(*i).copied().unwrap_or('?'))
                    .collect::<String>()
            ),
            Self::Lattice(axes) => write!(f, "{}", axes.iter().map(|i| i + 1).join("")),
        }
    }
}

// ==================
// Struct definitions
// ==================

/// A structure containing control parameters for supercell construction.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupercellParams {
    /// The supercell map.
    pub map: SupercellMap,

    /// The number of vacuum layers, in units of the mapped lattice vectors, to add along each
    /// axis.
    #[builder(default = "[0.0; 3]")]
    #[serde(default)]
    pub vacuum: [f64; 3],

    /// A shift applied before vacuum padding, in fractional coordinates of the cell before the
    /// mapping.
    #[builder(default = "Vector3::zeros()")]
    #[serde(default = "Vector3::zeros")]
    pub pre_vacuum_shift: Vector3<f64>,

    /// A shift applied after vacuum padding, in fractional coordinates of the final supercell.
    #[builder(default = "Vector3::zeros()")]
    #[serde(default = "Vector3::zeros")]
    pub post_vacuum_shift: Vector3<f64>,

    /// The ordering of the atoms in the supercell. If set, every atom becomes its own orbit.
    #[builder(default = "None")]
    #[serde(default)]
    pub sort: Option<SortKey>,
}

impl SupercellParams {
    /// Returns a builder to construct a [`SupercellParams`] structure.
    pub fn builder() -> SupercellParamsBuilder {
        SupercellParamsBuilder::default()
    }
}

impl fmt::Display for SupercellParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matrix = self.map.matrix();
        writeln!(
            f,
            "Supercell map: [{}]",
            (0..3)
                .map(|i| format!(
                    "[{}, {}, {}]",
                    matrix[(i, 0)],
                    matrix[(i, 1)],
                    matrix[(i, 2)]
                ))
                .join(", ")
        )?;
        writeln!(
            f,
            "Vacuum layers: [{}, {}, {}]",
            self.vacuum[0], self.vacuum[1], self.vacuum[2]
        )?;
        writeln!(
            f,
            "Pre-vacuum shift: [{}, {}, {}]",
            self.pre_vacuum_shift[0], self.pre_vacuum_shift[1], self.pre_vacuum_shift[2]
        )?;
        writeln!(
            f,
            "Post-vacuum shift: [{}, {}, {}]",
            self.post_vacuum_shift[0], self.post_vacuum_shift[1], self.post_vacuum_shift[2]
        )?;
        writeln!(
            f,
            "Atom sort key: {}",
            self.sort
                .as_ref()
                .map(|key| key.to_string())
                .unwrap_or_else(|| "--".to_string())
        )?;
        Ok(())
    }
}

// =======================
// Supercell construction
// =======================

impl CrystalCell {
    /// Maps the cell onto a supercell, in place.
    ///
    /// The symmetry operations are regenerated only for diagonal maps. A general map keeps only
    /// the identity.
    ///
    /// # Errors
    ///
    /// Errors with a [`CellError`] if the cell has not been built, if the map is singular or has
    /// non-integral entries, or if a vacuum count is negative.
    pub fn supercell(&mut self, params: &SupercellParams) -> Result<(), anyhow::Error> {
        self.ensure_built("a supercell mapping")?;
        let thresh = self.options.coordinate_threshold;
        let map = params.map.matrix();
        if params.vacuum.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(format_err!(CellError(format!(
                "Invalid vacuum layer counts {:?}.",
                params.vacuum
            ))));
        }
        if map.iter().any(|x| (x - x.round()).abs() > thresh) {
            return Err(format_err!(CellError(format!(
                "The supercell map must have integral entries, but it is {map}."
            ))));
        }
        let det = map.determinant();
        if det.abs() < thresh || (det - det.round()).abs() > thresh {
            return Err(format_err!(CellError(format!(
                "The supercell map must be invertible with an integral determinant, but its determinant is {det}."
            ))));
        }
        let inverse_transpose = map
            .try_inverse()
            .ok_or_else(|| format_err!(CellError("The supercell map is singular.".to_string())))?
            .transpose();

        let translations = supercell_translations(&map, thresh)?;
        log::debug!(
            "{} lattice translation(s) found in the supercell of determinant {}.",
            translations.len(),
            det.round()
        );
        let padding = Vector3::new(
            1.0 + params.vacuum[0],
            1.0 + params.vacuum[1],
            1.0 + params.vacuum[2],
        );
        let pre_shift = inverse_transpose * params.pre_vacuum_shift;
        let post_shift = params.post_vacuum_shift;

        // Atoms
        let groups = self
            .site_groups
            .iter()
            .map(|group| {
                let sites = group
                    .sites
                    .iter()
                    .flat_map(|site| {
                        let mapped = inverse_transpose * site.position;
                        std::iter::once(Vector3::zeros())
                            .chain(translations.iter().cloned())
                            .map(move |translation| {
                                let shifted =
                                    wrap_into_cell(&(mapped + translation + pre_shift), thresh);
                                AtomSite {
                                    position: shifted.component_div(&padding) + post_shift,
                                    ..site.clone()
                                }
                            })
                            .collect_vec()
                    })
                    .collect_vec();
                SiteGroup { sites }
            })
            .collect_vec();

        // Lattice
        let mut vectors = map * self.lattice.vectors;
        for (j, factor) in padding.iter().enumerate() {
            let row = vectors.row(j) * *factor;
            vectors.set_row(j, &row);
        }
        let lattice = Lattice::new(vectors)?;

        // Operations
        let operations = if is_diagonal(&map, thresh) {
            let padding_matrix = Matrix3::from_diagonal(&padding);
            let padding_inverse = Matrix3::from_diagonal(&padding.map(|p| 1.0 / p));
            let candidates = self
                .operations
                .iter()
                .flat_map(|op| {
                    let rotation = inverse_transpose * op.rotation * map.transpose();
                    let translation = inverse_transpose * op.translation;
                    std::iter::once(Vector3::zeros())
                        .chain(translations.iter().cloned())
                        .map(move |extra| (rotation, translation + extra))
                        .collect_vec()
                })
                .map(|(rotation, translation)| {
                    // Origin shift, vacuum padding and post shift.
                    let translation =
                        translation + (Matrix3::identity() - rotation) * pre_shift;
                    let rotation = padding_inverse * rotation * padding_matrix;
                    let translation = padding_inverse * translation;
                    let translation = translation + (Matrix3::identity() - rotation) * post_shift;
                    SymmetryOperation::from_parts(rotation, translation, thresh).snapped()
                })
                .collect_vec();
            let retained_rotations = prune_rotations(
                &candidates,
                &lattice,
                self.crystal_system,
                self.mode.primitive && self.space_group.rhombohedral,
                thresh,
            );
            let mut operations: Vec<SymmetryOperation> =
                Vec::with_capacity(retained_rotations.len());
            for op in retained_rotations {
                let padded = (0..3).any(|j| {
                    params.vacuum[j] > 0.0
                        && op.translation[j].abs() > thresh
                        && (1.0 - op.translation[j]).abs() > thresh
                });
                if !padded && !operations.contains(&op) {
                    operations.push(op);
                }
            }
            operations
        } else {
            log::debug!("Non-diagonal supercell map: only the identity operation is retained.");
            vec![SymmetryOperation::identity(thresh)]
        };
        log::debug!(
            "{} of {} operations retained in the supercell.",
            operations.len(),
            self.operations.len() * (translations.len() + 1)
        );

        self.site_groups = groups;
        self.lattice = lattice;
        self.operations = operations;
        self.induced_translations = std::iter::once(Vector3::zeros())
            .chain(translations)
            .collect();
        self.transformation = map * self.transformation;
        self.mode.supercell = true;
        self.refresh_parameters();
        self.composition = composition(
            &self.site_groups,
            self.mode.alloy,
            self.options.occupancy_threshold,
        );
        if let Some(key) = params.sort.as_ref() {
            self.sort_atoms(key);
        }
        Ok(())
    }

    /// Flattens all orbits into single-atom orbits and sorts them stably by each axis of `key` in
    /// turn.
    pub fn sort_atoms(&mut self, key: &SortKey) {
        let mut sites = self
            .site_groups
            .drain(..)
            .flat_map(|group| group.sites)
            .collect_vec();
        let lattice = &self.lattice;
        let cartesian = |site: &AtomSite| lattice.to_cartesian(&site.position);
        match key {
            SortKey::ZLayer => {
                sites.sort_by(|a, b| cartesian(a)[2].total_cmp(&cartesian(b)[2]));
            }
            SortKey::Cartesian(axes) => {
                for axis in axes {
                    sites.sort_by(|a, b| cartesian(a)[*axis].total_cmp(&cartesian(b)[*axis]));
                }
            }
            SortKey::Lattice(axes) => {
                for axis in axes {
                    sites.sort_by(|a, b| a.position[*axis].total_cmp(&b.position[*axis]));
                }
            }
        }
        self.site_groups = sites
            .into_iter()
            .map(|site| SiteGroup { sites: vec![site] })
            .collect();
    }
}

/// Finds the lattice translations of the current cell that are not lattice translations of the
/// supercell, in fractional coordinates of the supercell.
///
/// Integer vectors $`\mathbf{n}`$ are searched in a box bounded by the extent of the supercell
/// along each old axis, and mapped to $`\mathbf{M}^{-\mathsf{T}}\mathbf{n}`$. The zero vector is
/// excluded.
pub(crate) fn supercell_translations(
    map: &Matrix3<f64>,
    thresh: f64,
) -> Result<Vec<Vector3<f64>>, anyhow::Error> {
    let inverse_transpose = map
        .try_inverse()
        .ok_or_else(|| format_err!(CellError("The supercell map is singular.".to_string())))?
        .transpose();
    let bounds = (0..3)
        .map(|j| {
            let column = [map[(0, j)], map[(1, j)], map[(2, j)]];
            let mut extents = vec![0.0];
            extents.extend(column);
            extents.extend(
                (0..3)
                    .tuple_combinations()
                    .flat_map(|(i, k)| {
                        [
                            column[i] + column[k],
                            column[i] - column[k],
                            column[k] - column[i],
                        ]
                    }),
            );
            extents.push(column.iter().sum());
            let lo = extents.iter().cloned().fold(f64::INFINITY, f64::min).floor() as i64 - 1;
            let hi = extents
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max)
                .ceil() as i64
                + 1;
            (lo, hi)
        })
        .collect_vec();

    let zero = Vector3::zeros();
    let mut translations: Vec<Vector3<f64>> = vec![];
    for n0 in bounds[0].0..=bounds[0].1 {
        for n1 in bounds[1].0..=bounds[1].1 {
            for n2 in bounds[2].0..=bounds[2].1 {
                let n = Vector3::new(n0 as f64, n1 as f64, n2 as f64);
                let t = wrap_into_cell(
                    &snap_fractional_vector(&(inverse_transpose * n), thresh),
                    thresh,
                );
                if !periodic_eq(&t, &zero, thresh)
                    && !translations.iter().any(|u| periodic_eq(u, &t, thresh))
                {
                    translations.push(t);
                }
            }
        }
    }
    let expected = map.determinant().abs().round() as usize - 1;
    if translations.len() != expected {
        log::debug!(
            "Found {} supercell translations, expected {expected}.",
            translations.len()
        );
    }
    Ok(translations)
}

/// Removes operations whose rotations do not map the supercell lattice onto itself.
///
/// Hexagonal lattices, and trigonal lattices in the hexagonal description, keep all rotations
/// if $`|\mathbf{a}| = |\mathbf{b}|`$ and only the identity and the inversion otherwise.
/// Primitive rhombohedral lattices require all three lengths to be equal. All other lattices keep the
/// rotations mapping every lattice vector onto a lattice vector or its negation.
fn prune_rotations(
    operations: &[SymmetryOperation],
    lattice: &Lattice,
    crystal_system: CrystalSystem,
    rhombohedral_lattice: bool,
    thresh: f64,
) -> Vec<SymmetryOperation> {
    let lengths = lattice.lengths();
    let equal = |i: usize, j: usize| (lengths[i] - lengths[j]).abs() < thresh * lengths[i].max(1.0);
    let keep_trivial_only = match crystal_system {
        CrystalSystem::Hexagonal => Some(!equal(0, 1)),
        CrystalSystem::Trigonal if rhombohedral_lattice => Some(!(equal(0, 1) && equal(0, 2))),
        CrystalSystem::Trigonal => Some(!equal(0, 1)),
        _ => None,
    };
    operations
        .iter()
        .filter(|op| match keep_trivial_only {
            Some(true) => op.is_identity_rotation() || op.is_inversion_rotation(),
            Some(false) => true,
            None => lattice
                .cartesian_rotation(&op.rotation)
                .map(|rotation| maps_lattice_onto_itself(&rotation, &lattice.vectors, thresh))
                .unwrap_or(false),
        })
        .cloned()
        .collect()
}
