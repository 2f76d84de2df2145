//! One point linear calibration of the analog input.
//!
//! The raw reading is assumed to be proportional to the real voltage, so a single known reference
//! voltage and the raw average measured for it give the scale factor.

use crate::sampler::{self, AnalogSource};
use log::debug;
use serde::{Deserialize, Serialize};

/// Voltage applied to the analog input while calibrating
pub const CALIBRATION_REFERENCE_VOLTAGE: f64 = 5.0;

/// Converts a raw analog reading to volts when multiplied with it
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFactor(pub f64);

impl CalibrationFactor {
    /// Factor that maps `raw` to `reference` volts.
    ///
    /// A `raw` of zero gives an infinite factor.
    pub fn from_raw_average(reference: f64, raw: f64) -> CalibrationFactor {
        CalibrationFactor(reference / raw)
    }

    /// Nominal factor for an ideal converter, where `full_scale` reads as `reference` volts
    pub fn from_adc_range(reference: f64, full_scale: u32) -> CalibrationFactor {
        CalibrationFactor::from_raw_average(reference, full_scale as f64)
    }

    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.0
    }
}

/// Calibrates against [`CALIBRATION_REFERENCE_VOLTAGE`], which must be on the input while this
/// runs.
///
/// For a different reference, average the input and use [`CalibrationFactor::from_raw_average`].
pub fn calibrate<S: AnalogSource>(
    source: &mut S,
    samples: usize,
) -> Result<CalibrationFactor, S::Error> {
    let raw = sampler::average(source, samples)?;
    let factor = CalibrationFactor::from_raw_average(CALIBRATION_REFERENCE_VOLTAGE, raw);
    debug!("calibrated: raw {} -> factor {}", raw, factor.0);
    Ok(factor)
}
