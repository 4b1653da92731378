use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::block::ingestion::CellInput;
use crate::cell::displacement::{DisplacementDistribution, RandomDisplacementParams};
use crate::cell::supercell::{SupercellMap, SupercellParams};
use crate::cell::{AtomSite, CellError, CellOptions, CrystalCell, SetupError};
use crate::data::REFERENCE_TABLES;
use crate::lattice::LatticeParameters;
use crate::symmetry::space_group::SpaceGroupQuery;

fn fcc_copper(build: bool) -> CrystalCell {
    let input = CellInput::builder()
        .space_group(SpaceGroupQuery::builder().number(Some(225)).build().unwrap())
        .parameters(LatticeParameters::new(3.61, 3.61, 3.61, 90.0, 90.0, 90.0).unwrap())
        .sites(vec![AtomSite::new(Vector3::zeros(), "Cu", "Cu1")])
        .build()
        .unwrap();
    let mut cell = CrystalCell::new(input, &REFERENCE_TABLES, CellOptions::default()).unwrap();
    if build {
        cell.build(false).unwrap();
    }
    cell
}

#[test]
fn test_uniform_displacements_are_bounded() {
    let original = fcc_copper(true);
    let mut cell = original.clone();
    let mut rng = StdRng::seed_from_u64(17);
    cell.random_displacements(0.1, DisplacementDistribution::Uniform, &mut rng)
        .unwrap();

    assert_eq!(cell.number_of_atoms(), 4);
    assert_eq!(cell.site_groups.len(), 4);
    assert!(cell.site_groups.iter().all(|group| group.len() == 1));
    assert_eq!(cell.operations.len(), 1);
    assert!(cell.operations[0].is_identity());

    let before = original.cartesian_positions();
    let after = cell.cartesian_positions();
    let mut moved = 0;
    for (b, a) in before.iter().zip(after.iter()) {
        let shift = (a - b).norm();
        assert!(shift <= 0.1 + 1e-10);
        if shift > 0.0 {
            moved += 1;
        }
    }
    assert!(moved > 0);
}

#[test]
fn test_gaussian_displacement_spread() {
    let mut original = fcc_copper(true);
    original
        .supercell(
            &SupercellParams::builder()
                .map(SupercellMap::Diagonal([3, 3, 3]))
                .build()
                .unwrap(),
        )
        .unwrap();
    assert_eq!(original.number_of_atoms(), 108);
    let mut cell = original.clone();
    cell.random_displacements(
        0.2,
        DisplacementDistribution::Gaussian,
        &mut StdRng::seed_from_u64(29),
    )
    .unwrap();

    // The mean of |N(0, s)| is s * sqrt(2 / pi).
    let shifts = original
        .cartesian_positions()
        .iter()
        .zip(cell.cartesian_positions().iter())
        .map(|(b, a)| (a - b).norm())
        .collect::<Vec<_>>();
    let mean = shifts.iter().sum::<f64>() / shifts.len() as f64;
    assert!(mean > 0.1 && mean < 0.22, "mean displacement {mean}");
    assert!(shifts.iter().all(|shift| *shift < 1.0));
}

#[test]
fn test_seeded_displacements_are_reproducible() {
    let mut first = fcc_copper(true);
    let mut second = fcc_copper(true);
    first
        .random_displacements(
            0.05,
            DisplacementDistribution::Gaussian,
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
    second
        .random_displacements(
            0.05,
            DisplacementDistribution::Gaussian,
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
    for (a, b) in first.atoms().zip(second.atoms()) {
        assert_eq!(a.position, b.position);
    }
    let original = fcc_copper(true);
    assert!(first
        .atoms()
        .zip(original.atoms())
        .any(|(a, b)| a.position != b.position));
}

#[test]
fn test_zero_size_leaves_positions() {
    let original = fcc_copper(true);
    let mut cell = original.clone();
    cell.random_displacements(
        0.0,
        DisplacementDistribution::Uniform,
        &mut StdRng::seed_from_u64(5),
    )
    .unwrap();
    for (a, b) in cell.atoms().zip(original.atoms()) {
        assert_eq!(a.position, b.position);
    }
}

#[test]
fn test_invalid_displacements() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut cell = fcc_copper(false);
    let err = cell
        .random_displacements(0.1, DisplacementDistribution::Uniform, &mut rng)
        .unwrap_err();
    assert!(err.downcast_ref::<CellError>().is_some());

    let mut cell = fcc_copper(true);
    for size in [-0.1, f64::NAN] {
        let err = cell
            .random_displacements(size, DisplacementDistribution::Uniform, &mut rng)
            .unwrap_err();
        assert!(err.downcast_ref::<SetupError>().is_some());
    }
    assert_eq!(cell.operations.len(), 192);
}

#[test]
fn test_distribution_parsing() {
    assert_eq!(
        "Gaussian".parse::<DisplacementDistribution>().unwrap(),
        DisplacementDistribution::Gaussian
    );
    assert_eq!(DisplacementDistribution::Uniform.to_string(), "uniform");
    assert!("poisson".parse::<DisplacementDistribution>().is_err());

    let params: RandomDisplacementParams =
        serde_yaml::from_str("size: 0.2\ndistribution: gaussian\nseed: 42\n").unwrap();
    assert_eq!(params.distribution, DisplacementDistribution::Gaussian);
    assert_eq!(params.seed, Some(42));
    let params: RandomDisplacementParams = serde_yaml::from_str("size: 0.2\n").unwrap();
    assert_eq!(params.distribution, DisplacementDistribution::Uniform);
    assert!(serde_yaml::from_str::<RandomDisplacementParams>(
        "size: 0.2\ndistribution: poisson\n"
    )
    .is_err());
}
