//! The abstracted components for the battery-gauge binary.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod battery;
pub mod calibration;
pub mod config;
pub mod curve;
pub mod sampler;
pub mod status;
#[cfg(feature = "usbserial")]
pub mod usbserial;

pub use battery::Battery;
pub use calibration::{CalibrationFactor, CALIBRATION_REFERENCE_VOLTAGE};
pub use config::{BatteryConfig, LIPO_1S};
pub use curve::{DischargeCurve, LinearSegment, SigmoidParams};
pub use sampler::{AdcInput, AnalogSource};
pub use status::BatteryStatus;
