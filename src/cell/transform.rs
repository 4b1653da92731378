//! Shape-preserving cell transformations.

use anyhow::{self, format_err};
use itertools::Itertools;
use log;
use nalgebra::Matrix3;

use crate::auxiliary::geometry::snap_cartesian_rotation;
use crate::cell::{CellError, CellWarning, CrystalCell};
use crate::lattice::Lattice;
use crate::symmetry::symmetry_operation::SymmetryOperation;

#[cfg(test)]
#[path = "transform_tests.rs"]
mod transform_tests;

impl CrystalCell {
    /// Transforms the lattice vectors by a rotation combined with a uniform rescaling, in place.
    ///
    /// Each lattice vector $`\mathbf{a}_i`$, taken as a row, becomes $`\mathbf{a}_i \mathbf{T}`$.
    /// The rescaling factor $`|\det \mathbf{T}|^{1/3}`$ is absorbed into the length scale, so the
    /// physical size of the cell is unchanged. Fractional positions are kept, and the cartesian
    /// form of each symmetry operation is conjugated accordingly and snapped.
    ///
    /// # Errors
    ///
    /// Errors with a [`CellError`] if the cell has not been built, if `matrix` is singular, or if
    /// the sorted angles or sorted rescaled lengths of the cell change under
    /// [`Strictness::Strict`](crate::cell::Strictness::Strict).
    pub fn transform(&mut self, matrix: &Matrix3<f64>) -> Result<(), anyhow::Error> {
        self.ensure_built("a cell transformation")?;
        let thresh = self.options.coordinate_threshold;
        let det = matrix.determinant();
        if det.abs() < thresh {
            return Err(format_err!(CellError(format!(
                "The cell transformation matrix is singular (determinant {det})."
            ))));
        }
        let factor = det.abs().cbrt();
        let lattice = Lattice::new(self.lattice.vectors * matrix)?;

        let sorted = |values: [f64; 3]| {
            values
                .into_iter()
                .sorted_by(|a, b| a.total_cmp(b))
                .collect_vec()
        };
        let old_angles = sorted(self.lattice.angles());
        let new_angles = sorted(lattice.angles());
        let old_lengths = sorted(self.lattice.lengths());
        let new_lengths = sorted(lattice.lengths().map(|l| l / factor));
        let angles_kept = old_angles
            .iter()
            .zip(new_angles.iter())
            .all(|(a, b)| (a - b).to_radians().abs() < thresh);
        let lengths_kept = old_lengths
            .iter()
            .zip(new_lengths.iter())
            .all(|(a, b)| (a - b).abs() < thresh * a.max(1.0));
        if !(angles_kept && lengths_kept) {
            if self.options.strictness.is_forced() {
                log::warn!(
                    "The cell transformation does not preserve the cell shape. Applying it anyway."
                );
                self.warnings.push(CellWarning::ShapeViolatingTransform);
            } else {
                return Err(format_err!(CellError(
                    "The cell transformation does not preserve the cell shape.".to_string()
                )));
            }
        }

        let operations = self
            .operations
            .iter()
            .map(|op| {
                let cartesian =
                    snap_cartesian_rotation(&lattice.cartesian_rotation(&op.rotation)?, thresh);
                let rotation = lattice.fractional_rotation(&cartesian)?;
                Ok(SymmetryOperation::from_parts(rotation, op.translation, op.threshold).snapped())
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;

        log::debug!("Cell transformed with rescaling factor {factor:.8}.");
        self.lattice = lattice;
        self.length_scale /= factor;
        self.operations = operations;
        self.refresh_parameters();
        Ok(())
    }
}
