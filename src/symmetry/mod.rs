//! Symmetry operations, crystal systems, lattice centerings and space-group resolution.

use std::error::Error;
use std::fmt;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::symmetry::crystal_system::CrystalSystem;

pub mod crystal_system;
pub mod space_group;
pub mod symmetry_operation;

#[cfg(test)]
#[path = "centering_tests.rs"]
mod centering_tests;

// =================
// Error definitions
// =================

/// Error for unresolvable or inconsistent space-group information, unsupported crystal systems,
/// and lattices that are not invariant under the declared symmetry.
#[derive(Debug, Clone)]
pub struct SymmetryError(pub String);

impl fmt::Display for SymmetryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Symmetry error: {}", self.0)
    }
}

impl Error for SymmetryError {}

// ================
// Enum definitions
// ================

/// Enumerated type for lattice centerings, indicated by the setting letter of a space-group
/// symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Centering {
    /// Primitive lattice (`P`).
    Primitive,

    /// Body-centred lattice (`I`).
    BodyCentred,

    /// All-face-centred lattice (`F`).
    FaceCentred,

    /// Lattice centred on the $`bc`$ face (`A`).
    ACentred,

    /// Lattice centred on the $`ac`$ face (`B`).
    BCentred,

    /// Lattice centred on the $`ab`$ face (`C`).
    CCentred,

    /// Rhombohedral lattice described in the obverse hexagonal setting (`R`).
    Rhombohedral,
}

impl Centering {
    /// Returns the centering indicated by a setting letter, or `None` if the letter is not
    /// recognised.
    #[must_use]
    pub fn from_setting(setting: char) -> Option<Self> {
        match setting.to_ascii_uppercase() {
            'P' => Some(Self::Primitive),
            'I' => Some(Self::BodyCentred),
            'F' => Some(Self::FaceCentred),
            'A' => Some(Self::ACentred),
            'B' => Some(Self::BCentred),
            'C' => Some(Self::CCentred),
            'R' => Some(Self::Rhombohedral),
            _ => None,
        }
    }

    /// Returns the setting letter of this centering.
    #[must_use]
    pub fn setting(&self) -> char {
        match self {
            Self::Primitive => 'P',
            Self::BodyCentred => 'I',
            Self::FaceCentred => 'F',
            Self::ACentred => 'A',
            Self::BCentred => 'B',
            Self::CCentred => 'C',
            Self::Rhombohedral => 'R',
        }
    }

    /// Returns the lattice translations induced by this centering, in fractional coordinates of
    /// the conventional cell. The zero vector is always the first element.
    #[must_use]
    pub fn translations(&self) -> Vec<Vector3<f64>> {
        let half = 0.5;
        let third = 1.0 / 3.0;
        let mut translations = vec![Vector3::zeros()];
        match self {
            Self::Primitive => {}
            Self::BodyCentred => translations.push(Vector3::new(half, half, half)),
            Self::FaceCentred => translations.extend([
                Vector3::new(half, half, 0.0),
                Vector3::new(half, 0.0, half),
                Vector3::new(0.0, half, half),
            ]),
            Self::ACentred => translations.push(Vector3::new(0.0, half, half)),
            Self::BCentred => translations.push(Vector3::new(half, 0.0, half)),
            Self::CCentred => translations.push(Vector3::new(half, half, 0.0)),
            Self::Rhombohedral => translations.extend([
                Vector3::new(third, 2.0 * third, 2.0 * third),
                Vector3::new(2.0 * third, third, third),
            ]),
        }
        translations
    }

    /// Returns the transformation from the conventional to the primitive cell. The rows of the
    /// returned matrix are the primitive lattice vectors expressed in fractional coordinates of
    /// the conventional cell.
    ///
    /// # Arguments
    ///
    /// * `crystal_system` - The crystal system of the lattice. Body-centred cubic lattices use the
    ///   symmetric choice of primitive vectors; all other body-centred lattices keep the first two
    ///   conventional vectors.
    #[must_use]
    pub fn primitive_transformation(&self, crystal_system: CrystalSystem) -> Matrix3<f64> {
        let half = 0.5;
        let third = 1.0 / 3.0;
        match self {
            Self::Primitive => Matrix3::identity(),
            Self::BodyCentred => {
                if crystal_system == CrystalSystem::Cubic {
                    Matrix3::new(-half, half, half, half, -half, half, half, half, -half)
                } else {
                    Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, half, half, half)
                }
            }
            Self::FaceCentred => Matrix3::new(half, half, 0.0, half, 0.0, half, 0.0, half, half),
            Self::ACentred => Matrix3::new(1.0, 0.0, 0.0, 0.0, half, -half, 0.0, half, half),
            Self::BCentred => Matrix3::new(half, 0.0, -half, 0.0, 1.0, 0.0, half, 0.0, half),
            Self::CCentred => Matrix3::new(half, -half, 0.0, half, half, 0.0, 0.0, 0.0, 1.0),
            Self::Rhombohedral => rhombohedral_to_hexagonal(),
        }
    }
}

impl fmt::Display for Centering {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Primitive => write!(f, "primitive (P)"),
            Self::BodyCentred => write!(f, "body-centred (I)"),
            Self::FaceCentred => write!(f, "face-centred (F)"),
            Self::ACentred => write!(f, "A-centred (A)"),
            Self::BCentred => write!(f, "B-centred (B)"),
            Self::CCentred => write!(f, "C-centred (C)"),
            Self::Rhombohedral => write!(f, "rhombohedral obverse (R)"),
        }
    }
}

/// Returns the basis change between the rhombohedral and the obverse hexagonal settings. The rows
/// of the matrix are the rhombohedral lattice vectors in fractional coordinates of the hexagonal
/// cell, so that a rhombohedral fractional position $`\mathbf{f}_r`$ corresponds to the hexagonal
/// fractional position $`\mathbf{M}^{\mathsf{T}} \mathbf{f}_r`$.
#[must_use]
pub fn rhombohedral_to_hexagonal() -> Matrix3<f64> {
    let third = 1.0 / 3.0;
    Matrix3::new(
        2.0 * third,
        third,
        third,
        -third,
        third,
        third,
        -third,
        -2.0 * third,
        third,
    )
}
