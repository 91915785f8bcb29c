//! Degrees-and-minutes coordinate parsing.
//!
//! The registry prints every coordinate as whole degrees, a degree sign and
//! decimal minutes (`45°30.5`). Only the leading degree/minute pair is read;
//! anything after it (hemisphere letters, stray glyphs picked up from the
//! neighbouring column) is ignored.

use crate::error::CoordinateError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DEGREES_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)°([\d.]+)").unwrap());

/// Convert a `<degrees>°<minutes>` string to decimal degrees.
///
/// Minutes are divided by 60 exactly as given; no rounding is applied.
///
/// # Example
/// ```rust
/// use gcgn_geojson::pipeline::coordinate::to_decimal_degrees;
///
/// assert_eq!(to_decimal_degrees("60°15.0").unwrap(), 60.25);
/// ```
pub fn to_decimal_degrees(input: &str) -> Result<f64, CoordinateError> {
    let caps = RE_DEGREES_MINUTES
        .captures(input)
        .ok_or_else(|| CoordinateError::Malformed {
            input: input.to_string(),
        })?;

    let invalid = || CoordinateError::InvalidNumber {
        input: input.to_string(),
    };
    let degrees: f64 = caps[1].parse().map_err(|_| invalid())?;
    let minutes: f64 = caps[2].parse().map_err(|_| invalid())?;

    Ok(degrees + minutes / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn whole_and_fractional_minutes() {
        assert_close(to_decimal_degrees("45°30.0").unwrap(), 45.5);
        assert_close(to_decimal_degrees("60°15.0").unwrap(), 60.25);
        assert_close(to_decimal_degrees("0°0").unwrap(), 0.0);
        assert_close(to_decimal_degrees("179°59.9").unwrap(), 179.0 + 59.9 / 60.0);
    }

    #[test]
    fn matches_d_plus_m_over_60_across_a_grid() {
        for d in [0u32, 1, 42, 89, 135, 179] {
            for m in [0.0f64, 0.5, 7.25, 30.0, 59.99] {
                let s = format!("{d}°{m}");
                assert_close(to_decimal_degrees(&s).unwrap(), d as f64 + m / 60.0);
            }
        }
    }

    #[test]
    fn trailing_content_is_ignored() {
        assert_close(to_decimal_degrees("45°30.0 с.ш.").unwrap(), 45.5);
        assert_close(to_decimal_degrees("45°30.0'N").unwrap(), 45.5);
    }

    #[test]
    fn pattern_must_match_at_start() {
        assert!(matches!(
            to_decimal_degrees(" 45°30.0"),
            Err(CoordinateError::Malformed { .. })
        ));
        assert!(matches!(
            to_decimal_degrees("N45°30.0"),
            Err(CoordinateError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_missing_parts() {
        for bad in ["", "45", "45°", "°30", "45 30", "45,30"] {
            assert!(
                matches!(to_decimal_degrees(bad), Err(CoordinateError::Malformed { .. })),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_unparseable_minutes() {
        assert!(matches!(
            to_decimal_degrees("12°3.4.5"),
            Err(CoordinateError::InvalidNumber { .. })
        ));
    }
}
