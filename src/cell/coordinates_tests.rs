use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::block::ingestion::{CellInput, CoordinateKind};
use crate::cell::coordinates::{fractional_sites, rhombohedral_sites_to_hexagonal};
use crate::cell::{AtomSite, CellError, CellWarning, Strictness};
use crate::lattice::LatticeParameters;

fn cartesian_input(transform: Option<Matrix3<f64>>, translation: Option<Vector3<f64>>) -> CellInput {
    CellInput::builder()
        .parameters(LatticeParameters::new(4.0, 4.0, 4.0, 90.0, 90.0, 90.0).unwrap())
        .coordinates(CoordinateKind::Cartesian)
        .sites(vec![AtomSite::new(Vector3::new(2.0, 1.0, 3.0), "Si", "Si1")])
        .cartesian_transform(transform)
        .cartesian_translation(translation)
        .build()
        .unwrap()
}

#[test]
fn test_fractional_input_unchanged() {
    let input = CellInput::builder()
        .parameters(LatticeParameters::new(4.0, 4.0, 4.0, 90.0, 90.0, 90.0).unwrap())
        .sites(vec![AtomSite::new(Vector3::new(0.25, 0.5, 0.75), "Si", "Si1")])
        .build()
        .unwrap();
    let mut warnings = vec![];
    let sites = fractional_sites(
        &input,
        &Matrix3::identity(),
        4.0,
        Strictness::Strict,
        1e-6,
        &mut warnings,
    )
    .unwrap();
    assert_eq!(sites, input.sites);
    assert!(warnings.is_empty());
}

#[test]
fn test_explicit_cartesian_transform() {
    let input = cartesian_input(
        Some(Matrix3::from_diagonal_element(4.0)),
        Some(Vector3::new(1.0, 0.0, -1.0)),
    );
    let mut warnings = vec![];
    let sites = fractional_sites(
        &input,
        &Matrix3::identity(),
        4.0,
        Strictness::Strict,
        1e-6,
        &mut warnings,
    )
    .unwrap();
    assert_relative_eq!(sites[0].position, Vector3::new(0.25, 0.25, 1.0));
    assert_eq!(sites[0].label, "Si1");
    assert!(warnings.is_empty());

    let input = cartesian_input(Some(Matrix3::from_diagonal_element(4.0)), None);
    let mut warnings = vec![];
    let sites = fractional_sites(
        &input,
        &Matrix3::identity(),
        4.0,
        Strictness::Strict,
        1e-6,
        &mut warnings,
    )
    .unwrap();
    assert_relative_eq!(sites[0].position, Vector3::new(0.5, 0.25, 0.75));
    assert_eq!(warnings, vec![CellWarning::DefaultCartesianTranslation]);
}

#[test]
fn test_missing_cartesian_transform() {
    let input = cartesian_input(None, None);
    let mut warnings = vec![];
    let err = fractional_sites(
        &input,
        &Matrix3::identity(),
        4.0,
        Strictness::Strict,
        1e-6,
        &mut warnings,
    )
    .unwrap_err();
    assert!(err.downcast_ref::<CellError>().is_some());

    let sites = fractional_sites(
        &input,
        &Matrix3::identity(),
        4.0,
        Strictness::Forced,
        1e-6,
        &mut warnings,
    )
    .unwrap();
    assert_relative_eq!(sites[0].position, Vector3::new(0.5, 0.25, 0.75));
    assert_eq!(warnings, vec![CellWarning::DefaultCartesianTransform]);
}

#[test]
fn test_singular_cartesian_transform() {
    let input = cartesian_input(Some(Matrix3::zeros()), Some(Vector3::zeros()));
    let mut warnings = vec![];
    let err = fractional_sites(
        &input,
        &Matrix3::identity(),
        4.0,
        Strictness::Forced,
        1e-6,
        &mut warnings,
    )
    .unwrap_err();
    assert!(err.downcast_ref::<CellError>().is_some());
}

#[test]
fn test_rhombohedral_sites_to_hexagonal() {
    let sites = vec![
        AtomSite::new(Vector3::zeros(), "Bi", "Bi1"),
        AtomSite::new(Vector3::new(0.5, 0.5, 0.5), "Bi", "Bi2"),
        AtomSite::new(Vector3::new(1.0, 0.0, 0.0), "Bi", "Bi3"),
    ];
    let hexagonal = rhombohedral_sites_to_hexagonal(&sites, 1e-8);
    assert_relative_eq!(hexagonal[0].position, Vector3::zeros());
    assert_relative_eq!(
        hexagonal[1].position,
        Vector3::new(0.0, 0.0, 0.5),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        hexagonal[2].position,
        Vector3::new(2.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0),
        epsilon = 1e-12
    );
}
