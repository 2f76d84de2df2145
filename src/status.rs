//! Battery status record handed to whatever reports it.
//!
//! Serialized as `{"percentage": 47, "voltage": 3.72}`. Those field names and the rounding below
//! are what existing consumers expect.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Whole percent, 0-100
    pub percentage: u8,
    /// Volts, two decimal places
    pub voltage: f64,
}

impl BatteryStatus {
    /// Rounds a raw estimate for reporting
    pub fn new(voltage: f64, percentage: f64) -> BatteryStatus {
        BatteryStatus {
            percentage: round_percentage(percentage),
            voltage: round_voltage(voltage),
        }
    }

    /// Serializes into `buf` without allocating, returning the number of bytes written
    pub fn write_json(&self, buf: &mut [u8]) -> serde_json_core::ser::Result<usize> {
        serde_json_core::to_slice(self, buf)
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> serde_json::Result<std::string::String> {
        serde_json::to_string(self)
    }

    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> serde_json::Result<BatteryStatus> {
        serde_json::from_str(json)
    }
}

fn round_percentage(percentage: f64) -> u8 {
    // NaN ends up as 0
    libm::round(percentage.max(0.).min(100.)) as u8
}

fn round_voltage(voltage: f64) -> f64 {
    libm::round(voltage * 100.) / 100.
}
