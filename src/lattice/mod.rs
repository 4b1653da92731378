//! Lattice parameters, Bravais lattice vectors and length units.

use std::f64::consts::PI;
use std::fmt;

use anyhow::{self, format_err};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::angle_between;
use crate::cell::CellError;
use crate::symmetry::crystal_system::CrystalSystem;

#[cfg(test)]
#[path = "lattice_tests.rs"]
mod lattice_tests;

// ==================
// Struct definitions
// ==================

/// The six cell parameters: lengths in the working length unit and angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl LatticeParameters {
    /// Creates a new set of lattice parameters.
    ///
    /// # Errors
    ///
    /// Errors with a [`CellError`] if any parameter is zero or not finite.
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, anyhow::Error> {
        let params = Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks that no parameter is zero or non-finite.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let values = [self.a, self.b, self.c, self.alpha, self.beta, self.gamma];
        if values.iter().any(|v| *v == 0.0 || !v.is_finite()) {
            Err(format_err!(CellError(
                "No crystallographic parameter may be zero.".to_string()
            )))
        } else {
            Ok(())
        }
    }

    /// Converts rhombohedral-setting parameters $`(a_r, \alpha_r)`$ into the parameters of the
    /// obverse hexagonal cell: $`a_h = 2 a_r \sin(\alpha_r/2)`$,
    /// $`c_h = a_r \sqrt{3 + 6\cos\alpha_r}`$ and angles $`(90°, 90°, 120°)`$.
    #[must_use]
    pub fn rhombohedral_to_hexagonal(&self) -> Self {
        let alpha = self.alpha.to_radians();
        let a = 2.0 * self.a * (alpha / 2.0).sin();
        Self {
            a,
            b: a,
            c: self.a * (3.0 + 6.0 * alpha.cos()).sqrt(),
            alpha: 90.0,
            beta: 90.0,
            gamma: 120.0,
        }
    }

    /// Returns a copy with all lengths multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            a: self.a * factor,
            b: self.b * factor,
            c: self.c * factor,
            ..*self
        }
    }
}

impl fmt::Display for LatticeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a = {:.6}, b = {:.6}, c = {:.6}, α = {:.4}°, β = {:.4}°, γ = {:.4}°",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma
        )
    }
}

/// A real-space lattice whose basis vectors are stored as the rows of a matrix, in units of a
/// separately kept length scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// The lattice vectors as rows.
    pub vectors: Matrix3<f64>,
}

impl Lattice {
    /// Creates a lattice from a matrix whose rows are the lattice vectors.
    ///
    /// # Errors
    ///
    /// Errors with a [`CellError`] if the lattice vectors are linearly dependent.
    pub fn new(vectors: Matrix3<f64>) -> Result<Self, anyhow::Error> {
        if vectors.determinant().abs() < f64::EPSILON {
            return Err(format_err!(CellError(
                "The lattice vectors are linearly dependent.".to_string()
            )));
        }
        Ok(Self { vectors })
    }

    /// Returns the `i`th lattice vector.
    #[must_use]
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        self.vectors.row(i).transpose()
    }

    /// Returns the volume $`|\det \mathbf{L}|`$ of the cell spanned by the lattice vectors.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }

    /// Returns the lengths of the three lattice vectors.
    #[must_use]
    pub fn lengths(&self) -> [f64; 3] {
        [
            self.vector(0).norm(),
            self.vector(1).norm(),
            self.vector(2).norm(),
        ]
    }

    /// Returns the angles $`(\alpha, \beta, \gamma)`$ in degrees, i.e. the angles between the
    /// second and third, the first and third, and the first and second lattice vectors.
    #[must_use]
    pub fn angles(&self) -> [f64; 3] {
        [
            angle_between(&self.vector(1), &self.vector(2)),
            angle_between(&self.vector(0), &self.vector(2)),
            angle_between(&self.vector(0), &self.vector(1)),
        ]
    }

    /// Returns the reciprocal lattice $`2\pi (\mathbf{L}^{-1})^{\mathsf{T}}`$, whose rows are the
    /// reciprocal basis vectors.
    pub fn reciprocal(&self) -> Result<Self, anyhow::Error> {
        let inv = self.inverse()?;
        Ok(Self {
            vectors: 2.0 * PI * inv.transpose(),
        })
    }

    /// Converts fractional coordinates to cartesian coordinates in units of the length scale.
    #[must_use]
    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.vectors.transpose() * fractional
    }

    /// Converts cartesian coordinates in units of the length scale to fractional coordinates.
    pub fn to_fractional(&self, cartesian: &Vector3<f64>) -> Result<Vector3<f64>, anyhow::Error> {
        Ok(self.inverse()?.transpose() * cartesian)
    }

    /// Expresses a cartesian rotation in the fractional basis of this lattice, i.e. returns
    /// $`\mathbf{L}^{-\mathsf{T}} \mathbf{R} \mathbf{L}^{\mathsf{T}}`$.
    pub fn fractional_rotation(
        &self,
        cartesian_rotation: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, anyhow::Error> {
        Ok(self.inverse()?.transpose() * cartesian_rotation * self.vectors.transpose())
    }

    /// Expresses a fractional rotation of this lattice in cartesian coordinates, i.e. returns
    /// $`\mathbf{L}^{\mathsf{T}} \mathbf{W} \mathbf{L}^{-\mathsf{T}}`$.
    pub fn cartesian_rotation(
        &self,
        fractional_rotation: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, anyhow::Error> {
        Ok(self.vectors.transpose() * fractional_rotation * self.inverse()?.transpose())
    }

    fn inverse(&self) -> Result<Matrix3<f64>, anyhow::Error> {
        self.vectors.try_inverse().ok_or_else(|| {
            format_err!(CellError(
                "The lattice vectors are linearly dependent.".to_string()
            ))
        })
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..3 {
            let v = self.vector(i);
            writeln!(f, "  a{} = ({:+.8}, {:+.8}, {:+.8})", i + 1, v[0], v[1], v[2])?;
        }
        Ok(())
    }
}

// ================
// Enum definitions
// ================

/// Enumerated type for the supported length units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Angstrom,
    Bohr,
    Nanometre,
}

impl LengthUnit {
    /// Returns the factor by which a length expressed in `self` must be multiplied to be expressed
    /// in `target`.
    #[must_use]
    pub fn conversion_factor(&self, target: LengthUnit) -> f64 {
        match (self, target) {
            (Self::Angstrom, Self::Bohr) => 1.889_726_1,
            (Self::Angstrom, Self::Nanometre) => 0.1,
            (Self::Bohr, Self::Angstrom) => 0.529_177_21,
            (Self::Bohr, Self::Nanometre) => 0.052_917_721,
            (Self::Nanometre, Self::Angstrom) => 10.0,
            (Self::Nanometre, Self::Bohr) => 18.897_261,
            (Self::Angstrom, Self::Angstrom)
            | (Self::Bohr, Self::Bohr)
            | (Self::Nanometre, Self::Nanometre) => 1.0,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angstrom => write!(f, "Å"),
            Self::Bohr => write!(f, "bohr"),
            Self::Nanometre => write!(f, "nm"),
        }
    }
}

// =================
// Utility functions
// =================

/// Constructs the conventional lattice vectors from the cell parameters, in units of $`a`$.
///
/// The first lattice vector is always $`(1, 0, 0)`$ except for hexagonal and trigonal lattices,
/// where it is $`(\sin\gamma, \cos\gamma, 0)`$ with the second vector along $`y`$. Trigonal
/// lattices are forced to $`\gamma = 120°`$.
///
/// # Arguments
///
/// * `params` - The cell parameters.
/// * `crystal_system` - The crystal system selecting the formula.
/// * `thresh` - The threshold for angle comparisons in degrees.
///
/// # Returns
///
/// A matrix whose rows are the lattice vectors.
pub fn conventional_lattice_vectors(
    params: &LatticeParameters,
    crystal_system: CrystalSystem,
    thresh: f64,
) -> Result<Matrix3<f64>, anyhow::Error> {
    params.validate()?;
    let boa = params.b / params.a;
    let coa = params.c / params.a;
    let vectors = match crystal_system {
        CrystalSystem::Cubic => Matrix3::identity(),
        CrystalSystem::Hexagonal | CrystalSystem::Trigonal => {
            let gamma = if crystal_system == CrystalSystem::Trigonal
                && (params.gamma - 120.0).abs() > thresh
            {
                120.0_f64.to_radians()
            } else {
                params.gamma.to_radians()
            };
            Matrix3::new(
                gamma.sin(),
                gamma.cos(),
                0.0,
                0.0,
                1.0,
                0.0,
                0.0,
                0.0,
                coa,
            )
        }
        CrystalSystem::Tetragonal | CrystalSystem::Orthorhombic => {
            Matrix3::from_diagonal(&Vector3::new(1.0, boa, coa))
        }
        CrystalSystem::Triclinic | CrystalSystem::Monoclinic | CrystalSystem::Unknown => {
            let (alpha, beta, gamma) = (
                params.alpha.to_radians(),
                params.beta.to_radians(),
                params.gamma.to_radians(),
            );
            let angfac1 = (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
            let angfac2 = (gamma.sin().powi(2) - beta.cos().powi(2) - alpha.cos().powi(2)
                + 2.0 * alpha.cos() * beta.cos() * gamma.cos())
            .sqrt()
                / gamma.sin();
            Matrix3::new(
                1.0,
                0.0,
                0.0,
                boa * gamma.cos(),
                boa * gamma.sin(),
                0.0,
                coa * beta.cos(),
                coa * angfac1,
                coa * angfac2,
            )
        }
    };
    if !vectors.iter().all(|x| x.is_finite()) || vectors.determinant().abs() < f64::EPSILON {
        return Err(format_err!(CellError(format!(
            "The cell parameters ({params}) do not span a three-dimensional lattice."
        ))));
    }
    Ok(vectors)
}
