//! Tolerant floating-point comparisons for bound values.

use serde::{Deserialize, Serialize};

/// Default comparison epsilon.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Epsilon-based comparisons used when ordering relaxation bounds.
///
/// The tolerance scales with the larger operand magnitude (never below the
/// absolute epsilon), so `10.0` and `10.0 + 2e-9` compare equal while
/// `0.0` and `2e-9` do not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Base epsilon.
    pub epsilon: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl Tolerances {
    /// Create tolerances with the given epsilon.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    fn scaled(&self, a: f64, b: f64) -> f64 {
        self.epsilon * 1.0_f64.max(a.abs()).max(b.abs())
    }

    /// `a` is less than `b` by more than the tolerance.
    pub fn is_lt(&self, a: f64, b: f64) -> bool {
        if !a.is_finite() || !b.is_finite() {
            return a < b;
        }
        a - b < -self.scaled(a, b)
    }

    /// `a` is greater than `b` by more than the tolerance.
    pub fn is_gt(&self, a: f64, b: f64) -> bool {
        if !a.is_finite() || !b.is_finite() {
            return a > b;
        }
        a - b > self.scaled(a, b)
    }

    /// Neither less nor greater within tolerance.
    pub fn is_eq(&self, a: f64, b: f64) -> bool {
        !self.is_lt(a, b) && !self.is_gt(a, b)
    }
}

/// Parse a bound value, accepting `inf`, `+inf`, `infinity` and `-inf`
/// spellings in any case. NaN is rejected.
pub(crate) fn parse_bound(raw: &str) -> Option<f64> {
    match raw.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        other => other.parse::<f64>().ok().filter(|v| !v.is_nan()),
    }
}

/// Serde adapter for bounds: finite values stay numbers, the others are
/// written as `"inf"`, `"-inf"` or `"nan"` since JSON has no literal for them.
pub mod bound_serde {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;

    use super::parse_bound;

    /// Write a bound.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    /// Read a bound written as a number or one of the infinity spellings.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(BoundVisitor)
    }

    struct BoundVisitor;

    impl<'de> Visitor<'de> for BoundVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number, \"inf\", \"-inf\" or \"nan\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            if v.eq_ignore_ascii_case("nan") {
                return Ok(f64::NAN);
            }
            parse_bound(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_separation() {
        let tol = Tolerances::default();
        assert!(tol.is_lt(1.0, 2.0));
        assert!(tol.is_gt(2.0, 1.0));
        assert!(!tol.is_eq(1.0, 2.0));
    }

    #[test]
    fn test_noise_is_equal() {
        let tol = Tolerances::default();
        let a = 10.0;
        let b = 10.0 + 2.0 * DEFAULT_EPSILON;
        assert!(!tol.is_lt(a, b));
        assert!(!tol.is_gt(b, a));
        assert!(tol.is_eq(a, b));
    }

    #[test]
    fn test_absolute_floor_near_zero() {
        let tol = Tolerances::default();
        assert!(tol.is_eq(0.0, 0.5e-9));
        assert!(tol.is_lt(0.0, 2e-9));
    }

    #[test]
    fn test_infinities() {
        let tol = Tolerances::default();
        assert!(tol.is_lt(f64::NEG_INFINITY, -1e300));
        assert!(tol.is_gt(f64::INFINITY, 1e300));
        assert!(tol.is_eq(f64::NEG_INFINITY, f64::NEG_INFINITY));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Bounds {
        #[serde(with = "bound_serde")]
        lo: f64,
        #[serde(with = "bound_serde")]
        hi: f64,
    }

    #[test]
    fn test_bound_serde_keeps_infinities() {
        let json = serde_json::to_string(&Bounds {
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
        })
        .unwrap();
        assert_eq!(json, r#"{"lo":"-inf","hi":"inf"}"#);

        let back: Bounds = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lo, f64::NEG_INFINITY);
        assert_eq!(back.hi, f64::INFINITY);

        let plain: Bounds = serde_json::from_str(r#"{"lo": -2, "hi": "+Infinity"}"#).unwrap();
        assert_eq!(plain.lo, -2.0);
        assert_eq!(plain.hi, f64::INFINITY);

        let nan: Bounds =
            serde_json::from_str(&serde_json::to_string(&Bounds { lo: f64::NAN, hi: 1.5 }).unwrap())
                .unwrap();
        assert!(nan.lo.is_nan());
        assert_eq!(nan.hi, 1.5);

        assert!(serde_json::from_str::<Bounds>(r#"{"lo": "low", "hi": 1}"#).is_err());
        assert!(serde_json::from_str::<Bounds>(r#"{"lo": null, "hi": 1}"#).is_err());
    }
}
