//! Static space-group reference data for a curated set of standard settings.
//!
//! Operation lists are stored as coset representatives; the full lists are generated once on
//! first use by adding the inversion images (for Hall symbols with a leading `-`) and the
//! centering translations indicated by the Hall symbol's lattice letter.

use phf::{phf_map, Map};

pub(crate) static NUMBER_TO_HALL: Map<u32, &'static str> = phf_map! {
    1u32 => "P 1",
    2u32 => "-P 1",
    4u32 => "P 2yb",
    5u32 => "C 2y",
    12u32 => "-C 2y",
    14u32 => "-P 2ybc",
    38u32 => "A 2 -2",
    47u32 => "-P 2 2",
    62u32 => "-P 2ac 2n",
    65u32 => "-C 2 2",
    123u32 => "-P 4 2",
    139u32 => "-I 4 2",
    146u32 => "R 3",
    166u32 => "-R 3 2\"",
    194u32 => "-P 6c 2c",
    216u32 => "F -4 2 3",
    221u32 => "-P 4 2 3",
    225u32 => "-F 4 2 3",
    229u32 => "-I 4 2 3",
};

pub(crate) static HALL_TO_NUMBER: Map<&'static str, u32> = phf_map! {
    "P 1" => 1,
    "-P 1" => 2,
    "P 2yb" => 4,
    "C 2y" => 5,
    "-C 2y" => 12,
    "-P 2ybc" => 14,
    "A 2 -2" => 38,
    "-P 2 2" => 47,
    "-P 2ac 2n" => 62,
    "-C 2 2" => 65,
    "-P 4 2" => 123,
    "-I 4 2" => 139,
    "R 3" => 146,
    "P 3*" => 146,
    "-R 3 2\"" => 166,
    "-P 3* 2" => 166,
    "-P 6c 2c" => 194,
    "F -4 2 3" => 216,
    "-P 4 2 3" => 221,
    "-F 4 2 3" => 225,
    "-I 4 2 3" => 229,
};

pub(crate) static HALL_TO_HM: Map<&'static str, &'static str> = phf_map! {
    "P 1" => "P1",
    "-P 1" => "P-1",
    "P 2yb" => "P21",
    "C 2y" => "C2",
    "-C 2y" => "C2/m",
    "-P 2ybc" => "P21/c",
    "A 2 -2" => "Amm2",
    "-P 2 2" => "Pmmm",
    "-P 2ac 2n" => "Pnma",
    "-C 2 2" => "Cmmm",
    "-P 4 2" => "P4/mmm",
    "-I 4 2" => "I4/mmm",
    "R 3" => "R3:H",
    "P 3*" => "R3:R",
    "-R 3 2\"" => "R-3m:H",
    "-P 3* 2" => "R-3m:R",
    "-P 6c 2c" => "P63/mmc",
    "F -4 2 3" => "F-43m",
    "-P 4 2 3" => "Pm-3m",
    "-F 4 2 3" => "Fm-3m",
    "-I 4 2 3" => "Im-3m",
};

/// Normalised Hermann–Mauguin symbols (whitespace removed, first letter upper case, remaining
/// letters lower case except a trailing setting letter) to Hall symbols.
pub(crate) static HM_TO_HALL: Map<&'static str, &'static str> = phf_map! {
    "P1" => "P 1",
    "P-1" => "-P 1",
    "P21" => "P 2yb",
    "P1211" => "P 2yb",
    "C2" => "C 2y",
    "C121" => "C 2y",
    "C2/m" => "-C 2y",
    "C12/m1" => "-C 2y",
    "P21/c" => "-P 2ybc",
    "P121/c1" => "-P 2ybc",
    "Amm2" => "A 2 -2",
    "Pmmm" => "-P 2 2",
    "P2/m2/m2/m" => "-P 2 2",
    "Pnma" => "-P 2ac 2n",
    "P21/n21/m21/a" => "-P 2ac 2n",
    "Cmmm" => "-C 2 2",
    "P4/mmm" => "-P 4 2",
    "I4/mmm" => "-I 4 2",
    "R3" => "R 3",
    "R3:H" => "R 3",
    "R3H" => "R 3",
    "R3:R" => "P 3*",
    "R3R" => "P 3*",
    "R-3m" => "-R 3 2\"",
    "R-3m:H" => "-R 3 2\"",
    "R-3mH" => "-R 3 2\"",
    "R-32/m" => "-R 3 2\"",
    "R-3m:R" => "-P 3* 2",
    "R-3mR" => "-P 3* 2",
    "P63/mmc" => "-P 6c 2c",
    "F-43m" => "F -4 2 3",
    "Pm-3m" => "-P 4 2 3",
    "Fm-3m" => "-F 4 2 3",
    "Im-3m" => "-I 4 2 3",
};

/// Rhombohedral-setting Hall symbols to their obverse hexagonal-setting equivalents.
pub(crate) static RHOMBOHEDRAL_TO_HEXAGONAL: Map<&'static str, &'static str> = phf_map! {
    "P 3*" => "R 3",
    "-P 3* 2" => "-R 3 2\"",
};

/// Obverse hexagonal-setting Hall symbols to their rhombohedral-setting equivalents.
pub(crate) static HEXAGONAL_TO_RHOMBOHEDRAL: Map<&'static str, &'static str> = phf_map! {
    "R 3" => "P 3*",
    "-R 3 2\"" => "-P 3* 2",
};

const CUBIC_T: [&str; 12] = [
    "x,y,z", "-x,-y,z", "-x,y,-z", "x,-y,-z", "z,x,y", "z,-x,-y", "-z,-x,y", "-z,x,-y", "y,z,x",
    "-y,z,-x", "y,-z,-x", "-y,-z,x",
];

/// Coset representatives of the point group $`432`$ with respect to its translation-free
/// subgroup, i.e. all 24 rotations.
const CUBIC_O: [&str; 24] = [
    CUBIC_T[0], CUBIC_T[1], CUBIC_T[2], CUBIC_T[3], CUBIC_T[4], CUBIC_T[5], CUBIC_T[6],
    CUBIC_T[7], CUBIC_T[8], CUBIC_T[9], CUBIC_T[10], CUBIC_T[11], "y,x,-z", "-y,-x,-z", "y,-x,z",
    "-y,x,z", "x,z,-y", "-x,z,y", "-x,-z,-y", "x,-z,y", "z,y,-x", "z,-y,x", "-z,y,x", "-z,-y,-x",
];

const CUBIC_TD: [&str; 24] = [
    CUBIC_T[0], CUBIC_T[1], CUBIC_T[2], CUBIC_T[3], CUBIC_T[4], CUBIC_T[5], CUBIC_T[6],
    CUBIC_T[7], CUBIC_T[8], CUBIC_T[9], CUBIC_T[10], CUBIC_T[11], "y,x,z", "-y,-x,z", "y,-x,-z",
    "-y,x,-z", "x,z,y", "-x,z,-y", "-x,-z,y", "x,-z,-y", "z,y,x", "z,-y,-x", "-z,y,-x", "-z,-y,x",
];

const TETRAGONAL_422: [&str; 8] = [
    "x,y,z", "-x,-y,z", "-y,x,z", "y,-x,z", "-x,y,-z", "x,-y,-z", "y,x,-z", "-y,-x,-z",
];

const ORTHORHOMBIC_222: [&str; 4] = ["x,y,z", "-x,-y,z", "-x,y,-z", "x,-y,-z"];

const TRIGONAL_32_HEXAGONAL: [&str; 6] = [
    "x,y,z", "-y,x-y,z", "-x+y,-x,z", "y,x,-z", "x-y,-y,-z", "-x,-x+y,-z",
];

const TRIGONAL_32_RHOMBOHEDRAL: [&str; 6] =
    ["x,y,z", "z,x,y", "y,z,x", "-z,-y,-x", "-y,-x,-z", "-x,-z,-y"];

/// Hall symbols to coset representatives of their operation lists.
pub(crate) static OPERATION_REPRESENTATIVES: Map<&'static str, &'static [&'static str]> = phf_map! {
    "P 1" => &["x,y,z"],
    "-P 1" => &["x,y,z"],
    "P 2yb" => &["x,y,z", "-x,y+1/2,-z"],
    "C 2y" => &["x,y,z", "-x,y,-z"],
    "-C 2y" => &["x,y,z", "-x,y,-z"],
    "-P 2ybc" => &["x,y,z", "-x,y+1/2,-z+1/2"],
    "A 2 -2" => &["x,y,z", "-x,-y,z", "x,-y,z", "-x,y,z"],
    "-P 2 2" => &ORTHORHOMBIC_222,
    "-P 2ac 2n" => &["x,y,z", "-x+1/2,-y,z+1/2", "-x,y+1/2,-z", "x+1/2,-y+1/2,-z+1/2"],
    "-C 2 2" => &ORTHORHOMBIC_222,
    "-P 4 2" => &TETRAGONAL_422,
    "-I 4 2" => &TETRAGONAL_422,
    "R 3" => &["x,y,z", "-y,x-y,z", "-x+y,-x,z"],
    "P 3*" => &["x,y,z", "z,x,y", "y,z,x"],
    "-R 3 2\"" => &TRIGONAL_32_HEXAGONAL,
    "-P 3* 2" => &TRIGONAL_32_RHOMBOHEDRAL,
    "-P 6c 2c" => &[
        "x,y,z", "-y,x-y,z", "-x+y,-x,z", "-x,-y,z+1/2", "y,-x+y,z+1/2", "x-y,x,z+1/2",
        "y,x,-z", "x-y,-y,-z", "-x,-x+y,-z", "-y,-x,-z+1/2", "-x+y,y,-z+1/2", "x,x-y,-z+1/2",
    ],
    "F -4 2 3" => &CUBIC_TD,
    "-P 4 2 3" => &CUBIC_O,
    "-F 4 2 3" => &CUBIC_O,
    "-I 4 2 3" => &CUBIC_O,
};
