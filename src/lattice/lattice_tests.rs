use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::cell::CellError;
use crate::lattice::{conventional_lattice_vectors, Lattice, LatticeParameters, LengthUnit};
use crate::symmetry::crystal_system::CrystalSystem;

#[test]
fn test_lattice_cubic_and_orthorhombic() {
    let params = LatticeParameters::new(4.05, 4.05, 4.05, 90.0, 90.0, 90.0).unwrap();
    let vectors = conventional_lattice_vectors(&params, CrystalSystem::Cubic, 2e-4).unwrap();
    assert_eq!(vectors, Matrix3::identity());

    let params = LatticeParameters::new(2.0, 3.0, 4.0, 90.0, 90.0, 90.0).unwrap();
    let vectors =
        conventional_lattice_vectors(&params, CrystalSystem::Orthorhombic, 2e-4).unwrap();
    let lattice = Lattice::new(vectors).unwrap();
    assert_relative_eq!(lattice.volume(), 6.0, epsilon = 1e-12);
    assert_relative_eq!(lattice.lengths()[1], 1.5, epsilon = 1e-12);
}

#[test]
fn test_lattice_hexagonal_and_trigonal() {
    let params = LatticeParameters::new(3.0, 3.0, 5.0, 90.0, 90.0, 120.0).unwrap();
    let vectors = conventional_lattice_vectors(&params, CrystalSystem::Hexagonal, 2e-4).unwrap();
    let lattice = Lattice::new(vectors).unwrap();
    let [alpha, beta, gamma] = lattice.angles();
    assert_relative_eq!(alpha, 90.0, epsilon = 1e-10);
    assert_relative_eq!(beta, 90.0, epsilon = 1e-10);
    assert_relative_eq!(gamma, 120.0, epsilon = 1e-10);
    assert_relative_eq!(lattice.vector(2), Vector3::new(0.0, 0.0, 5.0 / 3.0));

    // Trigonal lattices are forced to the hexagonal angle.
    let params = LatticeParameters::new(3.0, 3.0, 5.0, 90.0, 90.0, 119.0).unwrap();
    let vectors = conventional_lattice_vectors(&params, CrystalSystem::Trigonal, 2e-4).unwrap();
    let lattice = Lattice::new(vectors).unwrap();
    assert_relative_eq!(lattice.angles()[2], 120.0, epsilon = 1e-10);
}

#[test]
fn test_lattice_general_formula_reproduces_parameters() {
    let params = LatticeParameters::new(5.0, 6.0, 7.0, 80.0, 95.0, 105.0).unwrap();
    for system in [
        CrystalSystem::Triclinic,
        CrystalSystem::Monoclinic,
        CrystalSystem::Unknown,
    ] {
        let vectors = conventional_lattice_vectors(&params, system, 2e-4).unwrap();
        let lattice = Lattice::new(vectors * params.a).unwrap();
        let [a, b, c] = lattice.lengths();
        assert_relative_eq!(a, 5.0, epsilon = 1e-10);
        assert_relative_eq!(b, 6.0, epsilon = 1e-10);
        assert_relative_eq!(c, 7.0, epsilon = 1e-10);
        let [alpha, beta, gamma] = lattice.angles();
        assert_relative_eq!(alpha, 80.0, epsilon = 1e-10);
        assert_relative_eq!(beta, 95.0, epsilon = 1e-10);
        assert_relative_eq!(gamma, 105.0, epsilon = 1e-10);
    }
}

#[test]
fn test_lattice_reciprocal_and_conversions() {
    let params = LatticeParameters::new(5.0, 6.0, 7.0, 80.0, 95.0, 105.0).unwrap();
    let vectors = conventional_lattice_vectors(&params, CrystalSystem::Triclinic, 2e-4).unwrap();
    let lattice = Lattice::new(vectors).unwrap();
    let reciprocal = lattice.reciprocal().unwrap();
    assert_relative_eq!(
        lattice.vectors * reciprocal.vectors.transpose(),
        2.0 * PI * Matrix3::identity(),
        epsilon = 1e-10
    );

    let f = Vector3::new(0.1, 0.2, 0.3);
    let cart = lattice.to_cartesian(&f);
    assert_relative_eq!(lattice.to_fractional(&cart).unwrap(), f, epsilon = 1e-12);

    let w = Matrix3::new(-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0);
    let r = lattice.cartesian_rotation(&w).unwrap();
    assert_relative_eq!(r, w, epsilon = 1e-12);
    assert_relative_eq!(lattice.fractional_rotation(&r).unwrap(), w, epsilon = 1e-12);
}

#[test]
fn test_lattice_rhombohedral_to_hexagonal_parameters() {
    let rhomb = LatticeParameters::new(5.0, 5.0, 5.0, 60.0, 60.0, 60.0).unwrap();
    let hex = rhomb.rhombohedral_to_hexagonal();
    assert_relative_eq!(hex.a, 5.0, epsilon = 1e-12);
    assert_relative_eq!(hex.b, 5.0, epsilon = 1e-12);
    assert_relative_eq!(hex.c, 5.0 * 6.0_f64.sqrt(), epsilon = 1e-12);
    assert_eq!((hex.alpha, hex.beta, hex.gamma), (90.0, 90.0, 120.0));
}

#[test]
fn test_lattice_invalid_parameters() {
    let err = LatticeParameters::new(5.0, 0.0, 5.0, 90.0, 90.0, 90.0).unwrap_err();
    assert!(err.downcast_ref::<CellError>().is_some());

    let params = LatticeParameters {
        a: 1.0,
        b: 1.0,
        c: 1.0,
        alpha: 150.0,
        beta: 150.0,
        gamma: 150.0,
    };
    let err = conventional_lattice_vectors(&params, CrystalSystem::Triclinic, 2e-4).unwrap_err();
    assert!(err.downcast_ref::<CellError>().is_some());
}

#[test]
fn test_lattice_length_units() {
    assert_eq!(LengthUnit::default(), LengthUnit::Angstrom);
    assert_relative_eq!(
        LengthUnit::Angstrom.conversion_factor(LengthUnit::Bohr)
            * LengthUnit::Bohr.conversion_factor(LengthUnit::Angstrom),
        1.0,
        epsilon = 1e-7
    );
    assert_relative_eq!(
        LengthUnit::Nanometre.conversion_factor(LengthUnit::Bohr),
        18.897261,
        epsilon = 1e-9
    );
    assert_eq!(LengthUnit::Bohr.conversion_factor(LengthUnit::Bohr), 1.0);
}
