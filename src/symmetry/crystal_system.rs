//! Crystal systems.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Enumerated type for the seven crystal systems, plus a variant for space groups whose number is
/// not known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Hexagonal,
    Cubic,

    /// The crystal system cannot be deduced. Lattice vectors are then constructed with the general
    /// triclinic formula.
    Unknown,
}

impl CrystalSystem {
    /// Classifies a space-group number into its crystal system.
    #[must_use]
    pub fn from_number(number: Option<u32>) -> Self {
        match number {
            Some(1..=2) => Self::Triclinic,
            Some(3..=15) => Self::Monoclinic,
            Some(16..=74) => Self::Orthorhombic,
            Some(75..=142) => Self::Tetragonal,
            Some(143..=167) => Self::Trigonal,
            Some(168..=194) => Self::Hexagonal,
            Some(195..=230) => Self::Cubic,
            _ => Self::Unknown,
        }
    }

    /// Checks if the crystal system has a sixfold or threefold principal axis along $`c`$ in its
    /// conventional description.
    #[must_use]
    pub fn is_hexagonal_family(&self) -> bool {
        matches!(self, Self::Hexagonal | Self::Trigonal)
    }
}

impl fmt::Display for CrystalSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Triclinic => "triclinic",
            Self::Monoclinic => "monoclinic",
            Self::Orthorhombic => "orthorhombic",
            Self::Tetragonal => "tetragonal",
            Self::Trigonal => "trigonal",
            Self::Hexagonal => "hexagonal",
            Self::Cubic => "cubic",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}
