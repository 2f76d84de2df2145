//! Curve profiles and hardware constants for the battery gauge.

use crate::curve::{DischargeCurve, LinearSegment, SigmoidParams};
use serde::{Deserialize, Serialize};

/// Everything the gauge needs to know about the battery and the measuring circuit
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    pub curve: DischargeCurve,
    /// Added to every calibrated voltage, in volts. Covers offsets the one point calibration
    /// can't see, like a diode drop in front of the divider.
    pub voltage_adjust: f64,
}

impl BatteryConfig {
    pub const fn new(curve: DischargeCurve, voltage_adjust: f64) -> BatteryConfig {
        BatteryConfig {
            curve,
            voltage_adjust,
        }
    }

    /// Same profile, different offset
    pub const fn with_voltage_adjust(self, voltage_adjust: f64) -> BatteryConfig {
        BatteryConfig {
            curve: self.curve,
            voltage_adjust,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        LIPO_1S
    }
}

/// Single cell LiPo, 3.0v empty to 4.2v full.
///
/// The sigmoid is fitted to meet the lines at 5% (3.3v) and 95% (4.1v).
pub const LIPO_1S: BatteryConfig = BatteryConfig::new(
    DischargeCurve::new(
        SigmoidParams::new(100.0, -27.0, 3.678, 0.0, 1.0),
        LinearSegment::new(3.0, 0.0, 3.3, 5.0),
        LinearSegment::new(4.1, 95.0, 4.2, 100.0),
    ),
    0.0,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lipo() {
        assert_eq!(BatteryConfig::default(), LIPO_1S);
        assert!(LIPO_1S.curve.is_well_formed());
    }

    #[test]
    fn profiles_are_independent() {
        let diode = LIPO_1S.with_voltage_adjust(0.3);
        assert_eq!(diode.voltage_adjust, 0.3);
        assert_eq!(diode.curve, LIPO_1S.curve);
        assert_eq!(LIPO_1S.voltage_adjust, 0.0);
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{
            "curve": {
                "sigmoid": { "a": 100.0, "b": -27.0, "c": 3.678, "d": 0.0, "m": 1.0 },
                "low": { "x1": 3.0, "y1": 0.0, "x2": 3.3, "y2": 5.0 },
                "high": { "x1": 4.1, "y1": 95.0, "x2": 4.2, "y2": 100.0 }
            },
            "voltage_adjust": 0.0
        }"#;
        let config: BatteryConfig = serde_json::from_str(json).unwrap();
        assert!(config.curve.is_well_formed());
        for v in &[2.9, 3.0, 3.2, 3.5, 3.7, 4.0, 4.15, 4.3] {
            assert!((config.curve.apply(*v) - LIPO_1S.curve.apply(*v)).abs() < 1e-9);
        }
    }
}
