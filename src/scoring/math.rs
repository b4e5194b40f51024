//! Numeric guards shared by every scorer
//!
//! Ratios never produce NaN or infinity: a bad denominator yields the
//! caller's fallback instead.

/// Divide `numerator` by `denominator`, returning `fallback` when the
/// denominator is zero or non-finite, or the quotient is non-finite.
pub fn safe_divide_value(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return fallback;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        fallback
    }
}

/// `safe_divide_value` with a fallback of 0
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    safe_divide_value(numerator, denominator, 0.0)
}

/// Percent distance of `value` from `reference`: (value - reference) / reference * 100
pub fn percent_distance(value: f64, reference: f64) -> f64 {
    safe_divide(value - reference, reference) * 100.0
}

/// Clamp into [min, max]; NaN maps to `min`
pub fn clamp_score(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// True for a finite, strictly positive price
pub fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Present, finite and strictly positive
pub fn valid_level(value: Option<f64>) -> Option<f64> {
    value.filter(|v| is_valid_price(*v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_divide_value() {
        assert_eq!(safe_divide_value(10.0, 0.0, -1.0), -1.0);
        assert_eq!(safe_divide_value(10.0, 2.0, -1.0), 5.0);
        assert_eq!(safe_divide_value(10.0, f64::NAN, 7.0), 7.0);
        assert_eq!(safe_divide_value(f64::INFINITY, 2.0, 7.0), 7.0);
        assert_eq!(safe_divide(10.0, 2.0), 5.0);
        assert_eq!(safe_divide(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_percent_distance() {
        assert!((percent_distance(101.0, 100.0) - 1.0).abs() < 1e-12);
        assert_eq!(percent_distance(101.0, 0.0), 0.0);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(95.0, 0.0, 90.0), 90.0);
        assert_eq!(clamp_score(-3.0, 0.0, 90.0), 0.0);
        assert_eq!(clamp_score(f64::NAN, 0.0, 90.0), 0.0);
    }

    #[test]
    fn test_valid_level() {
        assert_eq!(valid_level(Some(98.0)), Some(98.0));
        assert_eq!(valid_level(Some(0.0)), None);
        assert_eq!(valid_level(Some(f64::NAN)), None);
        assert_eq!(valid_level(None), None);
    }
}
