//! Estimates battery voltage and percentage from the raw analog reading.

use crate::calibration::{self, CalibrationFactor};
use crate::config::BatteryConfig;
use crate::sampler::{self, AnalogSource};
use crate::status::BatteryStatus;
use log::debug;

/// A battery wired to an analog input, plus the profile describing it
pub struct Battery<S> {
    source: S,
    config: BatteryConfig,
}

impl<S: AnalogSource> Battery<S> {
    pub fn new(source: S, config: BatteryConfig) -> Battery<S> {
        Battery { source, config }
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Gives back the analog input
    pub fn release(self) -> S {
        self.source
    }

    /// Calibrates the input. The calibration reference voltage must be applied while this runs.
    pub fn calibrate(&mut self, samples: usize) -> Result<CalibrationFactor, S::Error> {
        calibration::calibrate(&mut self.source, samples)
    }

    /// Averages `samples` readings and converts them to volts
    pub fn voltage(&mut self, factor: CalibrationFactor, samples: usize) -> Result<f64, S::Error> {
        let raw = sampler::average(&mut self.source, samples)?;
        let voltage = estimate_voltage(raw, factor, self.config.voltage_adjust);
        debug!("raw {} -> {}v", raw, voltage);
        Ok(voltage)
    }

    /// Estimated charge left, 0-100
    pub fn percentage(
        &mut self,
        factor: CalibrationFactor,
        samples: usize,
    ) -> Result<f64, S::Error> {
        let voltage = self.voltage(factor, samples)?;
        Ok(self.config.curve.apply(voltage))
    }

    /// Voltage and percentage from one round of sampling, rounded for reporting
    pub fn status(
        &mut self,
        factor: CalibrationFactor,
        samples: usize,
    ) -> Result<BatteryStatus, S::Error> {
        let voltage = self.voltage(factor, samples)?;
        let percentage = self.config.curve.apply(voltage);
        Ok(BatteryStatus::new(voltage, percentage))
    }
}

/// Calibrated voltage for an averaged raw reading, including the fixed hardware offset
pub fn estimate_voltage(raw: f64, factor: CalibrationFactor, voltage_adjust: f64) -> f64 {
    factor.apply(raw) + voltage_adjust
}
