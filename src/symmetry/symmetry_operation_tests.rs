use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::symmetry::symmetry_operation::{format_xyz, SymmetryOperation};
use crate::symmetry::SymmetryError;

const THRESH: f64 = 2e-4;

#[test]
fn test_symmetry_operation_parsing() {
    let op = SymmetryOperation::from_xyz("-x+1/2, y, -z", THRESH).unwrap();
    assert_eq!(
        op.rotation,
        Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0)
    );
    assert_relative_eq!(op.translation, Vector3::new(0.5, 0.0, 0.0));

    let op = SymmetryOperation::from_xyz("x-y,x,z+1/6", THRESH).unwrap();
    assert_eq!(
        op.rotation,
        Matrix3::new(1.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0)
    );
    assert_relative_eq!(op.translation[2], 1.0 / 6.0);

    let op = SymmetryOperation::from_xyz("1/2+X,-Y+0.25,(z-1)/2", THRESH).unwrap();
    assert_relative_eq!(op.translation, Vector3::new(0.5, 0.25, -0.5));
    assert_relative_eq!(op.rotation[(2, 2)], 0.5);

    let op = SymmetryOperation::from_xyz("'2x, -(y), z'", THRESH).unwrap();
    assert_relative_eq!(op.rotation[(0, 0)], 2.0);
    assert_relative_eq!(op.rotation[(1, 1)], -1.0);
}

#[test]
fn test_symmetry_operation_invalid_strings() {
    for bad in ["x,y", "x,y,z,x", "x*y,y,z", "x,y/z,z", "x,y,1/0", "x,y,(z", "x,y,w", "x,,z"] {
        let err = SymmetryOperation::from_xyz(bad, THRESH).unwrap_err();
        assert!(
            err.downcast_ref::<SymmetryError>().is_some(),
            "`{bad}` should give a symmetry error"
        );
    }
    // No other kind of expression is ever evaluated.
    assert!(SymmetryOperation::from_xyz("x,y,__import__('os')", THRESH).is_err());
}

#[test]
fn test_symmetry_operation_application_and_composition() {
    let screw = SymmetryOperation::from_xyz("-x,-y,z+1/2", THRESH).unwrap();
    let position = Vector3::new(0.1, 0.2, 0.3);
    assert_relative_eq!(screw.apply(&position), Vector3::new(-0.1, -0.2, 0.8));

    let square = screw.compose(&screw);
    assert!(square.is_identity_rotation());
    assert!(square.is_identity());
    assert_eq!(square, SymmetryOperation::identity(THRESH));

    let inversion = SymmetryOperation::from_xyz("-x,-y,-z", THRESH).unwrap();
    assert!(inversion.is_inversion_rotation());
    let mirror = inversion.compose(&SymmetryOperation::from_xyz("-x,-y,z", THRESH).unwrap());
    assert_eq!(mirror, SymmetryOperation::from_xyz("x,y,-z", THRESH).unwrap());
}

#[test]
fn test_symmetry_operation_periodic_equality() {
    let a = SymmetryOperation::from_xyz("-x,y+1/2,-z", THRESH).unwrap();
    let b = SymmetryOperation::from_xyz("-x,y-1/2,-z+1", THRESH).unwrap();
    let c = SymmetryOperation::from_xyz("-x,y,-z", THRESH).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.has_same_rotation(&c));
}

#[test]
fn test_symmetry_operation_formatting() {
    let op = SymmetryOperation::from_xyz("-y, x - y, z + 1/3", THRESH).unwrap();
    assert_eq!(format_xyz(&op.rotation, &op.translation, THRESH), "-y,x-y,z+1/3");

    let op = SymmetryOperation::from_parts(
        Matrix3::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0),
        Vector3::new(0.0, -0.25, 0.123),
        THRESH,
    );
    assert_eq!(op.xyz, "z,x-1/4,2*y+0.123000");
    assert_eq!(SymmetryOperation::identity(THRESH).xyz, "x,y,z");

    let reparsed = SymmetryOperation::from_xyz(&op.xyz, THRESH).unwrap();
    assert_eq!(reparsed, op);
}

#[test]
fn test_symmetry_operation_snapping() {
    let noisy = SymmetryOperation::from_parts(
        Matrix3::new(0.99999, 0.0, 0.0, 0.0, -1.00001, 0.0, 0.0, 0.0, 1.0),
        Vector3::new(1.49999, 0.33331, -0.25),
        THRESH,
    );
    let snapped = noisy.snapped();
    assert_eq!(snapped.rotation[(0, 0)], 1.0);
    assert_eq!(snapped.rotation[(1, 1)], -1.0);
    assert_relative_eq!(snapped.translation, Vector3::new(0.5, 1.0 / 3.0, 0.75));
    assert_eq!(snapped.xyz, "x+1/2,-y+1/3,z+3/4");
}
