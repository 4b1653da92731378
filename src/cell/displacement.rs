//! Random displacements of atomic sites.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use anyhow::{self, format_err};
use derive_builder::Builder;
use log;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::cell::{CrystalCell, SetupError, SiteGroup};
use crate::symmetry::symmetry_operation::SymmetryOperation;

#[cfg(test)]
#[path = "displacement_tests.rs"]
mod displacement_tests;

/// Enumerated type for the distributions of displacement lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplacementDistribution {
    /// Lengths drawn uniformly from $`[0, s)`$.
    #[default]
    Uniform,

    /// Lengths drawn from a normal distribution of zero mean and standard deviation $`s`$.
    Gaussian,
}

impl FromStr for DisplacementDistribution {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "gaussian" => Ok(Self::Gaussian),
            other => Err(SetupError(format!(
                "Unknown random-displacement distribution `{other}`."
            ))),
        }
    }
}

impl TryFrom<String> for DisplacementDistribution {
    type Error = SetupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplacementDistribution> for String {
    fn from(distribution: DisplacementDistribution) -> Self {
        distribution.to_string()
    }
}

impl fmt::Display for DisplacementDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Gaussian => write!(f, "gaussian"),
        }
    }
}

/// A structure containing control parameters for random displacements.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomDisplacementParams {
    /// The displacement size in the length unit of the cell.
    pub size: f64,

    /// The distribution of the displacement lengths.
    #[builder(default)]
    #[serde(default)]
    pub distribution: DisplacementDistribution,

    /// An optional seed for reproducible displacements.
    #[builder(default = "None")]
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RandomDisplacementParams {
    /// Returns a builder to construct a [`RandomDisplacementParams`] structure.
    pub fn builder() -> RandomDisplacementParamsBuilder {
        RandomDisplacementParamsBuilder::default()
    }
}

impl CrystalCell {
    /// Displaces every atom in a random direction, in place.
    ///
    /// Directions are drawn with $`\theta \in [0, \pi)`$ and $`\phi \in [0, 2\pi)`$. Every
    /// displaced atom becomes its own orbit and only the identity operation is kept.
    ///
    /// # Arguments
    ///
    /// * `size` - The displacement size in [`Self::unit`].
    /// * `distribution` - The distribution of the displacement lengths.
    /// * `rng` - The random-number generator.
    ///
    /// # Errors
    ///
    /// Errors if the cell has not been built or if `size` is negative or not finite.
    pub fn random_displacements<R: Rng + ?Sized>(
        &mut self,
        size: f64,
        distribution: DisplacementDistribution,
        rng: &mut R,
    ) -> Result<(), anyhow::Error> {
        self.ensure_built("random displacements")?;
        if !size.is_finite() || size < 0.0 {
            return Err(format_err!(SetupError(format!(
                "Invalid random-displacement size {size}."
            ))));
        }
        let normal = Normal::new(0.0, size).map_err(|err| {
            format_err!(SetupError(format!(
                "Invalid Gaussian displacement size {size}: {err}."
            )))
        })?;
        let sites = self
            .site_groups
            .drain(..)
            .flat_map(|group| group.sites)
            .collect::<Vec<_>>();
        let mut groups = Vec::with_capacity(sites.len());
        for mut site in sites {
            let length = match distribution {
                DisplacementDistribution::Uniform => size * rng.gen::<f64>(),
                DisplacementDistribution::Gaussian => normal.sample(rng),
            };
            let theta = PI * rng.gen::<f64>();
            let phi = 2.0 * PI * rng.gen::<f64>();
            let displacement = Vector3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            ) * (length / self.length_scale);
            site.position += self.lattice.to_fractional(&displacement)?;
            groups.push(SiteGroup { sites: vec![site] });
        }
        log::debug!(
            "Displaced {} atoms with {distribution} lengths of size {size}.",
            groups.len()
        );
        self.site_groups = groups;
        self.operations = vec![SymmetryOperation::identity(
            self.options.coordinate_threshold,
        )];
        Ok(())
    }
}
