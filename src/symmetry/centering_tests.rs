use approx::assert_relative_eq;
use nalgebra::Vector3;

use crate::symmetry::crystal_system::CrystalSystem;
use crate::symmetry::{rhombohedral_to_hexagonal, Centering};

#[test]
fn test_centering_volume_ratios() {
    let cases = [
        ('P', CrystalSystem::Triclinic, 1),
        ('I', CrystalSystem::Cubic, 2),
        ('I', CrystalSystem::Tetragonal, 2),
        ('F', CrystalSystem::Cubic, 4),
        ('A', CrystalSystem::Orthorhombic, 2),
        ('B', CrystalSystem::Orthorhombic, 2),
        ('C', CrystalSystem::Monoclinic, 2),
        ('R', CrystalSystem::Trigonal, 3),
    ];
    for (setting, system, n) in cases {
        let centering = Centering::from_setting(setting).unwrap();
        assert_eq!(centering.setting(), setting);
        assert_eq!(centering.translations().len(), n);
        assert_eq!(centering.translations()[0], Vector3::zeros());
        let det = centering.primitive_transformation(system).determinant();
        assert_relative_eq!(det.abs(), 1.0 / (n as f64), epsilon = 1e-12);
    }
    assert!(Centering::from_setting('Q').is_none());
}

#[test]
fn test_centering_rhombohedral_basis_change() {
    // The hexagonal vectors are a_h = a_r - b_r, b_h = b_r - c_r and c_h = a_r + b_r + c_r.
    let m = rhombohedral_to_hexagonal();
    let (ar, br, cr) = (m.row(0), m.row(1), m.row(2));
    assert_relative_eq!((ar - br).transpose(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    assert_relative_eq!((br - cr).transpose(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    assert_relative_eq!(
        (ar + br + cr).transpose(),
        Vector3::new(0.0, 0.0, 1.0),
        epsilon = 1e-12
    );

    // The centering translations of the obverse setting are lattice vectors of the
    // rhombohedral cell.
    let inv_t = m.transpose().try_inverse().unwrap();
    for translation in Centering::Rhombohedral.translations() {
        let f = inv_t * translation;
        assert_relative_eq!(f, f.map(|x| x.round()), epsilon = 1e-12);
    }
}
