//! Battery discharge curve: maps a battery voltage to an estimated charge percentage.
//!
//! Discharge is approximated by an asymmetrical sigmoid, `y = d + (a - d) / (1 + (x / c)^b)^m`.
//! At the extremes (typically 0-5% and 95-100%) the sigmoid is inaccurate, so the curve switches
//! to a straight line between two anchor points. Below the low line and above the high line the
//! percentage saturates at 0 and 100.

use serde::{Deserialize, Serialize};

/// Lowest percentage the curve reports
pub const EMPTY_PERCENTAGE: f64 = 0.0;
/// Highest percentage the curve reports
pub const FULL_PERCENTAGE: f64 = 100.0;

/// Coefficients of the asymmetrical sigmoid used for the middle of the curve
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigmoidParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub m: f64,
}

impl SigmoidParams {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, m: f64) -> SigmoidParams {
        SigmoidParams { a, b, c, d, m }
    }

    pub fn apply(&self, x: f64) -> f64 {
        self.d + (self.a - self.d) / libm::pow(1. + libm::pow(x / self.c, self.b), self.m)
    }
}

/// Straight line through two (voltage, percentage) anchors.
///
/// `x1` must be less than `x2` and `y1` less than `y2`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearSegment {
    /// Voltage
    pub x1: f64,
    /// Battery percentage
    pub y1: f64,
    /// Voltage
    pub x2: f64,
    /// Battery percentage
    pub y2: f64,
}

impl LinearSegment {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> LinearSegment {
        LinearSegment { x1, y1, x2, y2 }
    }

    pub fn slope(&self) -> f64 {
        (self.y2 - self.y1) / (self.x2 - self.x1)
    }

    pub fn apply(&self, x: f64) -> f64 {
        self.slope() * (x - self.x1) + self.y1
    }

    fn is_well_formed(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

/// Three segment discharge curve: low line, sigmoid, high line
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DischargeCurve {
    /// Main part of the curve
    pub sigmoid: SigmoidParams,
    /// Low linear part, and the threshold below which the battery reads empty
    pub low: LinearSegment,
    /// High linear part, and the threshold above which the battery reads full
    pub high: LinearSegment,
}

impl DischargeCurve {
    pub const fn new(
        sigmoid: SigmoidParams,
        low: LinearSegment,
        high: LinearSegment,
    ) -> DischargeCurve {
        DischargeCurve { sigmoid, low, high }
    }

    /// Converts the given battery voltage to an estimated battery percentage.
    ///
    /// `low.x1` and `high.x2` belong to their lines; `low.x2` and `high.x1` go to the sigmoid.
    pub fn apply(&self, voltage: f64) -> f64 {
        if voltage < self.low.x2 {
            if voltage < self.low.x1 {
                return EMPTY_PERCENTAGE;
            }
            return self.low.apply(voltage);
        }

        if voltage > self.high.x1 {
            if voltage > self.high.x2 {
                return FULL_PERCENTAGE;
            }
            return self.high.apply(voltage);
        }

        self.sigmoid.apply(voltage)
    }

    /// Checks the anchor ordering of both lines and that they don't overlap.
    ///
    /// `apply` does not require this, and monotonicity of the sigmoid is not checked.
    pub fn is_well_formed(&self) -> bool {
        self.low.is_well_formed() && self.high.is_well_formed() && self.low.x2 <= self.high.x1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LIPO_1S;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn curve() -> DischargeCurve {
        LIPO_1S.curve
    }

    #[test]
    fn saturates_outside_lines() {
        let curve = curve();
        assert_eq!(curve.apply(2.5), 0.0);
        assert_eq!(curve.apply(4.5), 100.0);
        assert_eq!(curve.apply(-1.0), 0.0);
        assert_eq!(curve.apply(1_000.0), 100.0);
    }

    #[test]
    fn line_anchors_are_exact() {
        let curve = curve();
        assert!((curve.apply(3.0) - 0.0).abs() < EPSILON);
        assert!((curve.apply(4.2) - 100.0).abs() < EPSILON);
        assert!((curve.apply(3.15) - 2.5).abs() < EPSILON);
        assert!((curve.apply(4.15) - 97.5).abs() < EPSILON);
    }

    #[test]
    fn inner_anchors_use_the_sigmoid() {
        // the sigmoid is fitted to the line ends, so these hold to within the fit
        let curve = curve();
        assert_eq!(curve.apply(3.3), curve.sigmoid.apply(3.3));
        assert_eq!(curve.apply(4.1), curve.sigmoid.apply(4.1));
        assert!((curve.apply(3.3) - 5.0).abs() < 0.1);
        assert!((curve.apply(4.1) - 95.0).abs() < 0.1);
    }

    #[test]
    fn sigmoid_meets_the_lines() {
        // the profile is fitted so the sigmoid starts just above the low line and ends
        // just below the high line
        let curve = curve();
        let just_above_low = curve.apply(3.3 + 1e-6);
        let just_below_high = curve.apply(4.1 - 1e-6);
        assert_eq!(just_above_low, curve.sigmoid.apply(3.3 + 1e-6));
        assert!(just_above_low >= 5.0 && just_above_low < 5.1);
        assert!(just_below_high <= 95.0 && just_below_high > 94.9);
    }

    #[test]
    fn uses_each_segment() {
        let sigmoid = SigmoidParams::new(50., 1., 1., 50., 1.);
        let low = LinearSegment::new(1., 0., 2., 10.);
        let high = LinearSegment::new(3., 90., 4., 100.);
        let curve = DischargeCurve::new(sigmoid, low, high);

        assert_eq!(curve.apply(0.5), 0.0);
        assert_eq!(curve.apply(1.0), 0.0);
        assert_eq!(curve.apply(1.5), 5.0);
        assert_eq!(curve.apply(1.75), 7.5);
        // low.x2 and high.x1 fall through to the sigmoid
        assert_eq!(curve.apply(2.0), 50.0);
        assert_eq!(curve.apply(2.5), 50.0);
        assert_eq!(curve.apply(3.0), 50.0);
        assert_eq!(curve.apply(3.5), 95.0);
        assert_eq!(curve.apply(4.0), 100.0);
        assert_eq!(curve.apply(4.5), 100.0);
    }

    #[test]
    fn sigmoid_formula() {
        let sigmoid = SigmoidParams::new(100., 2., 4., 0., 1.);
        // (4 / 4)^2 = 1, so 100 / 2
        assert!((sigmoid.apply(4.0) - 50.0).abs() < EPSILON);
        // (8 / 4)^2 = 4, so 100 / 5
        assert!((sigmoid.apply(8.0) - 20.0).abs() < EPSILON);
    }

    #[test]
    fn well_formed() {
        assert!(curve().is_well_formed());

        let mut overlapping = curve();
        overlapping.low.x2 = 4.15;
        assert!(!overlapping.is_well_formed());

        let mut reversed = curve();
        reversed.high = LinearSegment::new(4.2, 100., 4.1, 95.);
        assert!(!reversed.is_well_formed());
    }

    proptest! {
        #[test]
        fn below_low_line_is_empty(v in -100.0f64..3.0) {
            prop_assert_eq!(curve().apply(v), 0.0);
        }

        #[test]
        fn above_high_line_is_full(v in 4.2000001f64..100.0) {
            prop_assert_eq!(curve().apply(v), 100.0);
        }

        #[test]
        fn stays_in_range(v in -10.0f64..10.0) {
            let p = curve().apply(v);
            prop_assert!((0.0..=100.0).contains(&p));
        }

        #[test]
        fn non_decreasing(v in 2.5f64..4.5, step in 0.0f64..0.5) {
            let curve = curve();
            prop_assert!(curve.apply(v + step) + EPSILON >= curve.apply(v));
        }
    }
}
