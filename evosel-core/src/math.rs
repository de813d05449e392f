//! Floating-point helpers: compensated summation and ULP distance.

/// Kahan-compensated sum of `values`.
pub fn sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &value in values {
        let y = value - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Position of `value` on the ordered line of representable doubles.
///
/// Adjacent doubles have adjacent positions; `0.0` and `-0.0` share one.
pub fn ulp_position(value: f64) -> i64 {
    let bits = value.to_bits() as i64;
    if bits < 0 {
        i64::MIN - bits
    } else {
        bits
    }
}

/// Number of representable doubles between `a` and `b`.
pub fn ulp_distance(a: f64, b: f64) -> u64 {
    ulp_position(a).abs_diff(ulp_position(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_compensates_rounding() {
        // Each 1e-16 alone is below half an ULP of 1.0 and vanishes in a
        // naive running sum.
        let mut values = vec![1.0];
        values.extend(std::iter::repeat(1e-16).take(10));
        assert!(sum(&values) > 1.0);
        assert_eq!(sum(&[]), 0.0);
    }

    #[test]
    fn adjacent_doubles_are_one_ulp_apart() {
        let x = 1.0_f64;
        let next = f64::from_bits(x.to_bits() + 1);
        assert_eq!(ulp_distance(x, next), 1);
        assert_eq!(ulp_distance(next, x), 1);
        assert_eq!(ulp_distance(x, x), 0);
    }

    #[test]
    fn signed_zeros_coincide() {
        assert_eq!(ulp_distance(0.0, -0.0), 0);
        let tiny = f64::from_bits(1);
        assert_eq!(ulp_distance(tiny, -tiny), 2);
    }

    #[test]
    fn nan_is_far_from_one() {
        assert!(ulp_distance(f64::NAN, 1.0) > 10_u64.pow(10));
    }

    #[test]
    fn tolerance_is_about_one_in_a_million_near_one() {
        // 1e10 ULPs around 1.0 is ~2.2e-6.
        assert!(ulp_distance(1.0, 1.0 + 1e-7) < 10_u64.pow(10));
        assert!(ulp_distance(1.0, 1.0 + 1e-5) > 10_u64.pow(10));
    }
}
