use num::integer;

/// Denominators of the rational values that occur in crystallographic coordinates and
/// symmetry-operation translations.
const FRACTION_DENOMINATORS: [f64; 7] = [1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0];

/// Trait for floats that can be snapped onto exact values lying within a threshold.
pub trait SnappableFloat: Sized {
    /// Snaps the float onto the closest rational value with a small crystallographic denominator
    /// (1, 2, 3, 4, 6, 8 or 12) if that value lies within `threshold`. Otherwise, the float is
    /// returned unchanged.
    fn snap_fraction(self, threshold: Self) -> Self;

    /// Snaps the float onto the first of `targets` lying within `threshold`, or returns it
    /// unchanged.
    fn snap_to(self, targets: &[Self], threshold: Self) -> Self;

    /// Maps the float into the half-open interval $`[0, 1)`$. Values within `threshold` below 1
    /// are mapped to 0.
    fn wrap_unit(self, threshold: Self) -> Self;
}

impl SnappableFloat for f64 {
    fn snap_fraction(self, threshold: f64) -> Self {
        FRACTION_DENOMINATORS
            .iter()
            .find_map(|&den| {
                let numerator = (self * den).round();
                if (self - numerator / den).abs() < threshold {
                    Some(numerator / den)
                } else {
                    None
                }
            })
            .unwrap_or(self)
    }

    fn snap_to(self, targets: &[f64], threshold: f64) -> Self {
        targets
            .iter()
            .find(|&&target| (self - target).abs() < threshold)
            .copied()
            .unwrap_or(self)
    }

    fn wrap_unit(self, threshold: f64) -> Self {
        let wrapped = self - self.floor();
        if (1.0 - wrapped) < threshold || wrapped.abs() < threshold {
            0.0
        } else {
            wrapped
        }
    }
}

/// Returns the greatest common divisor of a sequence of integers, or `None` if the sequence is
/// empty or consists solely of zeros.
pub(crate) fn gcd_all<I: IntoIterator<Item = u64>>(values: I) -> Option<u64> {
    values
        .into_iter()
        .fold(None, |acc: Option<u64>, v| match acc {
            None if v == 0 => None,
            None => Some(v),
            Some(g) => Some(integer::gcd(g, v)),
        })
}
