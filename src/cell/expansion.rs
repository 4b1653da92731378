//! Expansion of inequivalent sites into complete orbits.

use anyhow::{self, format_err};
use indexmap::IndexMap;
use log;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::geometry::{periodic_eq, periodic_eq_modulo, wrap_into_cell};
use crate::auxiliary::misc::gcd_all;
use crate::cell::{AtomSite, CellError, SiteGroup};
use crate::symmetry::symmetry_operation::SymmetryOperation;

#[cfg(test)]
#[path = "expansion_tests.rs"]
mod expansion_tests;

/// The result of expanding a set of inequivalent sites.
#[derive(Clone, Debug)]
pub(crate) struct Expansion {
    pub(crate) groups: Vec<SiteGroup>,
    pub(crate) alloy: bool,
    pub(crate) composition: IndexMap<String, f64>,
}

/// Expands inequivalent sites into their orbits.
///
/// # Arguments
///
/// * `sites` - The inequivalent sites in fractional coordinates of the conventional cell.
/// * `operations` - The operations in fractional coordinates of the conventional cell.
/// * `translations` - The induced translations. Images differing by one of these are the same
///   site of the reduced cell.
/// * `transformation` - The transformation from the conventional cell to the working cell.
/// * `thresh` - The threshold for position comparisons.
/// * `occ_thresh` - The threshold for occupancy comparisons.
pub(crate) fn expand(
    sites: &[AtomSite],
    operations: &[SymmetryOperation],
    translations: &[Vector3<f64>],
    transformation: &Matrix3<f64>,
    thresh: f64,
    occ_thresh: f64,
) -> Result<Expansion, anyhow::Error> {
    let merged = merge_coincident_sites(sites, thresh, occ_thresh);
    let alloy = merged.iter().any(|site| site.is_partial(occ_thresh));
    let inverse_transpose = transformation
        .try_inverse()
        .ok_or_else(|| format_err!(CellError("The cell transformation is singular.".to_string())))?
        .transpose();

    let mut groups: Vec<SiteGroup> = Vec::with_capacity(merged.len());
    let mut removed = 0;
    for site in merged.iter() {
        let mut orbit = vec![wrap_into_cell(&site.position, thresh)];
        for op in operations {
            let image = wrap_into_cell(&op.apply(&site.position), thresh);
            if !orbit
                .iter()
                .any(|position| periodic_eq_modulo(&image, position, translations, thresh))
            {
                orbit.push(image);
            }
        }

        let mut group = SiteGroup::default();
        for position in orbit {
            let position = wrap_into_cell(&(inverse_transpose * position), thresh);
            let duplicate = groups
                .iter()
                .flat_map(|group| group.sites.iter())
                .chain(group.sites.iter())
                .any(|existing| periodic_eq(&existing.position, &position, thresh));
            if duplicate {
                removed += 1;
            } else {
                group.sites.push(AtomSite {
                    position,
                    ..site.clone()
                });
            }
        }
        if group.is_empty() {
            log::debug!(
                "Site `{}` duplicates an earlier orbit and is dropped.",
                site.label
            );
        } else {
            groups.push(group);
        }
    }
    if removed > 0 {
        log::debug!("{removed} duplicate position(s) removed across orbits.");
    }

    let composition = composition(&groups, alloy, occ_thresh);
    Ok(Expansion {
        groups,
        alloy,
        composition,
    })
}

/// Merges input sites sharing a position. Partial occupancies of a duplicate are accumulated into
/// the first site; full occupancies of a duplicate are taken to repeat the first site. Charge
/// states are united.
pub(crate) fn merge_coincident_sites(
    sites: &[AtomSite],
    thresh: f64,
    occ_thresh: f64,
) -> Vec<AtomSite> {
    let mut merged: Vec<AtomSite> = Vec::with_capacity(sites.len());
    for site in sites {
        match merged
            .iter_mut()
            .find(|existing| periodic_eq(&existing.position, &site.position, thresh))
        {
            Some(existing) => {
                for (species, occ) in site.species.iter() {
                    if *occ < 1.0 - occ_thresh {
                        *existing.species.entry(species.clone()).or_insert(0.0) += occ;
                    }
                }
                for (species, charge) in site.charges.iter() {
                    existing.charges.entry(species.clone()).or_insert(*charge);
                }
                log::debug!(
                    "Site `{}` coincides with site `{}` and is merged.",
                    site.label,
                    existing.label
                );
            }
            None => merged.push(site.clone()),
        }
    }
    merged
}

/// Sums the occupancies of every species. For non-alloy cells whose counts are all integral, the
/// counts are divided by their greatest common divisor.
pub(crate) fn composition(
    groups: &[SiteGroup],
    alloy: bool,
    occ_thresh: f64,
) -> IndexMap<String, f64> {
    let mut counts = IndexMap::<String, f64>::new();
    for site in groups.iter().flat_map(|group| group.sites.iter()) {
        for (species, occ) in site.species.iter() {
            *counts.entry(species.clone()).or_insert(0.0) += occ;
        }
    }
    if alloy {
        return counts;
    }
    let integral = counts
        .values()
        .all(|count| (count - count.round()).abs() < occ_thresh.max(1e-8));
    if !integral {
        return counts;
    }
    match gcd_all(counts.values().map(|count| count.round() as u64)) {
        Some(divisor) if divisor > 1 => counts
            .into_iter()
            .map(|(species, count)| (species, count.round() / divisor as f64))
            .collect(),
        _ => counts,
    }
}
