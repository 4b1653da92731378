//! Geometrical manipulations of fractional positions, lattice vectors and affine operations.

use approx;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::misc::SnappableFloat;

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod geometry_tests;

/// Exact values occurring in cartesian representations of crystallographic rotations.
const CARTESIAN_ROTATION_ENTRIES: [f64; 7] = [
    0.0,
    1.0,
    -1.0,
    0.5,
    -0.5,
    0.866_025_403_784_438_6,
    -0.866_025_403_784_438_6,
];

// =================
// Utility functions
// =================

/// Maps a fractional position into the unit cell so that every component lies in $`[0, 1)`$.
///
/// # Arguments
///
/// * `position` - A position in fractional coordinates.
/// * `thresh` - A threshold below which components close to 1 are taken to be 0.
///
/// # Returns
///
/// The wrapped position.
#[must_use]
pub fn wrap_into_cell(position: &Vector3<f64>, thresh: f64) -> Vector3<f64> {
    position.map(|x| x.wrap_unit(thresh))
}

/// Returns the difference $`\mathbf{a} - \mathbf{b}`$ reduced to the nearest lattice image, i.e.
/// with each component in $`[-\frac{1}{2}, \frac{1}{2}]`$.
#[must_use]
pub fn periodic_difference(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    (a - b).map(|d| d - d.round())
}

/// Checks if two fractional positions coincide modulo lattice translations.
///
/// # Arguments
///
/// * `a` - The first fractional position.
/// * `b` - The second fractional position.
/// * `thresh` - The threshold for the largest component of the periodic difference.
///
/// # Returns
///
/// `true` if the two positions coincide.
#[must_use]
pub fn periodic_eq(a: &Vector3<f64>, b: &Vector3<f64>, thresh: f64) -> bool {
    periodic_difference(a, b).amax() < thresh
}

/// Checks if two fractional positions coincide modulo lattice translations and any of a set of
/// additional translations.
#[must_use]
pub fn periodic_eq_modulo(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    translations: &[Vector3<f64>],
    thresh: f64,
) -> bool {
    translations
        .iter()
        .any(|translation| periodic_eq(a, &(b + translation), thresh))
}

/// Checks if two vectors are equal within a threshold scaled by the magnitude of the reference.
#[must_use]
pub fn vectors_eq(a: &Vector3<f64>, reference: &Vector3<f64>, thresh: f64) -> bool {
    approx::relative_eq!(a, reference, epsilon = thresh * reference.norm().max(1.0))
}

/// Returns the angle between two vectors in degrees.
#[must_use]
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.angle(b).to_degrees()
}

/// Checks if a cartesian rotation maps every lattice vector onto one of the lattice vectors or its
/// negation.
///
/// # Arguments
///
/// * `rotation` - A cartesian rotation matrix acting on column vectors.
/// * `lattice_rows` - A matrix whose rows are the lattice vectors.
/// * `thresh` - A threshold for vector comparisons.
///
/// # Returns
///
/// `true` if the rotation permutes the lattice vectors up to sign.
#[must_use]
pub fn maps_lattice_onto_itself(
    rotation: &Matrix3<f64>,
    lattice_rows: &Matrix3<f64>,
    thresh: f64,
) -> bool {
    let vectors = (0..3)
        .map(|i| lattice_rows.row(i).transpose())
        .collect::<Vec<_>>();
    vectors.iter().all(|vector| {
        let image = rotation * vector;
        vectors
            .iter()
            .any(|target| vectors_eq(&image, target, thresh) || vectors_eq(&-image, target, thresh))
    })
}

/// Snaps every entry of a fractional matrix onto small-denominator rationals lying within
/// `thresh`.
#[must_use]
pub fn snap_fractional_matrix(matrix: &Matrix3<f64>, thresh: f64) -> Matrix3<f64> {
    matrix.map(|x| x.snap_fraction(thresh))
}

/// Snaps every entry of a fractional vector onto small-denominator rationals lying within
/// `thresh`.
#[must_use]
pub fn snap_fractional_vector(vector: &Vector3<f64>, thresh: f64) -> Vector3<f64> {
    vector.map(|x| x.snap_fraction(thresh))
}

/// Snaps every entry of a cartesian rotation matrix onto the exact values $`0`$, $`\pm 1`$,
/// $`\pm \frac{1}{2}`$ and $`\pm \frac{\sqrt{3}}{2}`$ lying within `thresh`.
#[must_use]
pub fn snap_cartesian_rotation(matrix: &Matrix3<f64>, thresh: f64) -> Matrix3<f64> {
    matrix.map(|x| x.snap_to(&CARTESIAN_ROTATION_ENTRIES, thresh))
}

/// Checks if a matrix has vanishing off-diagonal elements.
#[must_use]
pub fn is_diagonal(matrix: &Matrix3<f64>, thresh: f64) -> bool {
    (0..3).all(|i| (0..3).all(|j| i == j || matrix[(i, j)].abs() < thresh))
}
