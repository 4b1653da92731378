//! Normalisation of input coordinates to fractional coordinates of the conventional cell.

use anyhow::{self, format_err};
use log;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::geometry::wrap_into_cell;
use crate::block::ingestion::{CellInput, CoordinateKind};
use crate::cell::{AtomSite, CellError, CellWarning, Strictness};
use crate::symmetry::rhombohedral_to_hexagonal;

#[cfg(test)]
#[path = "coordinates_tests.rs"]
mod coordinates_tests;

/// Returns the input sites in fractional coordinates.
///
/// Cartesian positions $`\mathbf{r}`$ are converted by $`\mathbf{f} = \mathbf{M}^{-1}(\mathbf{r} -
/// \mathbf{v})`$ using the transformation of the input. Without an input matrix, the fallback
/// $`\mathbf{M} = (a\mathbf{L})^{\mathsf{T}}`$ is only allowed under [`Strictness::Forced`].
///
/// # Arguments
///
/// * `input` - The raw cell description.
/// * `lattice_vectors` - The conventional lattice vectors as rows, in units of `a`.
/// * `a` - The length of the first lattice vector.
/// * `strictness` - The policy for a missing transformation matrix.
/// * `thresh` - The threshold for singular transformations.
/// * `warnings` - Collects the fallbacks taken.
///
/// # Errors
///
/// Errors with a [`CellError`] if the transformation matrix is missing under
/// [`Strictness::Strict`] or is singular.
pub(crate) fn fractional_sites(
    input: &CellInput,
    lattice_vectors: &Matrix3<f64>,
    a: f64,
    strictness: Strictness,
    thresh: f64,
    warnings: &mut Vec<CellWarning>,
) -> Result<Vec<AtomSite>, anyhow::Error> {
    if input.coordinates == CoordinateKind::Fractional {
        return Ok(input.sites.clone());
    }

    let (matrix, translation) = match input.cartesian_transform {
        Some(matrix) => {
            let translation = input.cartesian_translation.unwrap_or_else(|| {
                log::warn!("No cartesian translation vector given. Assuming the zero vector.");
                warnings.push(CellWarning::DefaultCartesianTranslation);
                Vector3::zeros()
            });
            (matrix, translation)
        }
        None if strictness.is_forced() => {
            log::warn!(
                "No cartesian transformation matrix given. Deriving it from the lattice vectors."
            );
            warnings.push(CellWarning::DefaultCartesianTransform);
            (
                (lattice_vectors * a).transpose(),
                input.cartesian_translation.unwrap_or_else(Vector3::zeros),
            )
        }
        None => {
            return Err(format_err!(CellError(
                "Cartesian positions given without a cartesian transformation matrix.".to_string()
            )))
        }
    };
    if matrix.determinant().abs() < thresh {
        return Err(format_err!(CellError(
            "The cartesian transformation matrix is singular.".to_string()
        )));
    }
    let inverse = matrix.try_inverse().ok_or_else(|| {
        format_err!(CellError(
            "The cartesian transformation matrix is singular.".to_string()
        ))
    })?;
    Ok(input
        .sites
        .iter()
        .map(|site| AtomSite {
            position: inverse * (site.position - translation),
            ..site.clone()
        })
        .collect())
}

/// Re-expresses fractional positions of a rhombohedral cell in the obverse hexagonal cell.
pub(crate) fn rhombohedral_sites_to_hexagonal(sites: &[AtomSite], thresh: f64) -> Vec<AtomSite> {
    let basis_change = rhombohedral_to_hexagonal().transpose();
    sites
        .iter()
        .map(|site| AtomSite {
            position: wrap_into_cell(&(basis_change * site.position), thresh),
            ..site.clone()
        })
        .collect()
}
