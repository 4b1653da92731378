//! Reduction of conventional cells to primitive cells.

use anyhow::{self, format_err};
use log;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::geometry::{
    maps_lattice_onto_itself, periodic_eq_modulo, vectors_eq, wrap_into_cell,
};
use crate::cell::CellError;
use crate::lattice::Lattice;
use crate::symmetry::crystal_system::CrystalSystem;
use crate::symmetry::symmetry_operation::SymmetryOperation;
use crate::symmetry::{Centering, SymmetryError};

#[cfg(test)]
#[path = "reduction_tests.rs"]
mod reduction_tests;

/// The result of reducing a conventional cell.
#[derive(Clone, Debug)]
pub(crate) struct Reduction {
    /// The transformation whose rows are the new lattice vectors in fractional coordinates of the
    /// conventional cell.
    pub(crate) transformation: Matrix3<f64>,

    /// The induced translations, zero vector first.
    pub(crate) translations: Vec<Vector3<f64>>,

    /// The reduced lattice.
    pub(crate) lattice: Lattice,

    /// The operations without those made redundant by the induced translations, in fractional
    /// coordinates of the conventional cell.
    pub(crate) conventional_operations: Vec<SymmetryOperation>,

    /// The same operations in fractional coordinates of the reduced cell.
    pub(crate) operations: Vec<SymmetryOperation>,
}

/// Reduces a conventional cell according to its centering.
///
/// # Arguments
///
/// * `conventional` - The conventional lattice.
/// * `centering` - The centering. [`Centering::Primitive`] leaves the cell unchanged.
/// * `crystal_system` - The crystal system, selecting the invariance check on the lattice.
/// * `operations` - The operations of the space group in fractional coordinates of the
///   conventional cell.
/// * `thresh` - The threshold for comparisons and snapping.
///
/// # Errors
///
/// Errors with a [`SymmetryError`] if any operation does not map the conventional lattice onto
/// itself.
pub(crate) fn reduce(
    conventional: &Lattice,
    centering: Centering,
    crystal_system: CrystalSystem,
    operations: &[SymmetryOperation],
    thresh: f64,
) -> Result<Reduction, anyhow::Error> {
    check_lattice_invariance(conventional, crystal_system, operations, thresh)?;

    let translations = centering.translations();
    let transformation = centering.primitive_transformation(crystal_system);
    let lattice = Lattice::new(
        (transformation * conventional.vectors).map(|x| if x.abs() < thresh { 0.0 } else { x }),
    )?;

    let conventional_operations = if translations.len() > 1 {
        remove_redundant_operations(operations, &translations, thresh)
    } else {
        operations.to_vec()
    };
    log::debug!(
        "{} centering: {} induced translation(s), {} of {} operations retained.",
        centering,
        translations.len(),
        conventional_operations.len(),
        operations.len()
    );

    let inverse_transpose = transformation
        .try_inverse()
        .ok_or_else(|| {
            format_err!(CellError(
                "The primitive transformation is singular.".to_string()
            ))
        })?
        .transpose();
    let reduced_operations = conventional_operations
        .iter()
        .map(|op| {
            SymmetryOperation::from_parts(
                inverse_transpose * op.rotation * transformation.transpose(),
                inverse_transpose * op.translation,
                op.threshold,
            )
            .snapped()
        })
        .collect::<Vec<_>>();

    Ok(Reduction {
        transformation,
        translations,
        lattice,
        conventional_operations,
        operations: reduced_operations,
    })
}

/// Removes operations that coincide with an earlier one after adding an induced translation. Of
/// two coinciding operations, the one with the shorter translation is kept.
pub(crate) fn remove_redundant_operations(
    operations: &[SymmetryOperation],
    translations: &[Vector3<f64>],
    thresh: f64,
) -> Vec<SymmetryOperation> {
    let mut retained: Vec<SymmetryOperation> = Vec::with_capacity(operations.len());
    for op in operations {
        let op = op.with_translation(wrap_into_cell(&op.translation, thresh));
        let existing = retained.iter().position(|kept| {
            kept.has_same_rotation(&op)
                && periodic_eq_modulo(&op.translation, &kept.translation, translations, thresh)
        });
        match existing {
            Some(i) => {
                if op.translation.norm() < retained[i].translation.norm() - thresh {
                    log::debug!("Replacing `{}` by `{}`.", retained[i].xyz, op.xyz);
                    retained[i] = op;
                } else {
                    log::debug!("Removing redundant operation `{}`.", op.xyz);
                }
            }
            None => retained.push(op),
        }
    }
    retained
}

/// Checks that every operation maps the lattice onto itself.
///
/// For hexagonal and trigonal lattices only the image of the third lattice vector is required to
/// be $`\pm\mathbf{c}`$. For all other lattices each lattice vector must be mapped onto one of
/// the lattice vectors or its negation.
pub(crate) fn check_lattice_invariance(
    lattice: &Lattice,
    crystal_system: CrystalSystem,
    operations: &[SymmetryOperation],
    thresh: f64,
) -> Result<(), anyhow::Error> {
    let c = lattice.vector(2);
    for op in operations {
        let rotation = lattice.cartesian_rotation(&op.rotation)?;
        let invariant = if crystal_system.is_hexagonal_family() {
            let image = rotation * c;
            vectors_eq(&image, &c, thresh) || vectors_eq(&-image, &c, thresh)
        } else {
            maps_lattice_onto_itself(&rotation, &lattice.vectors, thresh)
        };
        if !invariant {
            return Err(format_err!(SymmetryError(format!(
                "The operation `{}` does not map the lattice onto itself. The input is probably in a non-standard setting.",
                op.xyz
            ))));
        }
    }
    Ok(())
}
