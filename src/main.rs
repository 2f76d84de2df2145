//! Battery gauge for a feather_m0 running off a single cell LiPo.

#![no_std]
#![no_main]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

/// 12 bit ADC
const ADC_FULLSCALE: u32 = 4095;
/// Using VDDA / 2 with digital gain 1/2, our reference is ~3.3v
const ADC_REF_VOLTAGE: f64 = 3.3;
/// External HW divides the battery voltage by two before the ADC
const BATTERY_DIVIDER: f64 = 2.0;
/// Readings averaged per report
const STATUS_SAMPLES: usize = 16;
/// Readings averaged when calibrating against the reference voltage
const CALIBRATION_SAMPLES: usize = 64;
/// Below this we light the red LED
const LOW_BATTERY_PERCENTAGE: u8 = 10;

const DELAY_BETWEEN_REPORTS_MS: u32 = 5_000;
/// Fits `{"percentage":100,"voltage":-12.34}` with room to spare
#[cfg(feature = "usbserial")]
const REPORT_BUFFER_SIZE: usize = 64;

use panic_semihosting as _; // Panic handler

#[cfg(feature = "usbserial")]
use battery_gauge_rs::serial_write;
use battery_gauge_rs::{AdcInput, Battery, BatteryConfig, BatteryStatus, CalibrationFactor};

use core::sync::atomic;
use cortex_m::peripheral::NVIC;
use feather_m0 as hal;
use hal::adc::Adc;
use hal::clock::{enable_internal_32kosc, ClockGenId, ClockSource, GenericClockController};
use hal::entry;
use hal::pac::{adc, interrupt, CorePeripherals, Peripherals, TC4};
use hal::prelude::*;

#[cfg(not(feature = "usbserial"))]
macro_rules! serial_write {
    ($($tt:tt)*) => {{}};
}

/// boolean indicating if our timer interrupt has fired
#[allow(unused)]
static INTERRUPT_FIRED: atomic::AtomicBool = atomic::AtomicBool::new(false);

/// Main function, sampling the battery and reporting on it forever
#[entry]
fn main() -> ! {
    #[allow(unused_mut)] // Only used when usbserial is enabled
    let mut core = CorePeripherals::take().unwrap();
    let mut peripherals = Peripherals::take().unwrap();
    let mut pins = hal::Pins::new(peripherals.PORT);

    // just 8 MHz for lower power consumption
    #[cfg(not(feature = "usbserial"))]
    let mut clocks = GenericClockController::with_internal_8mhz(
        peripherals.GCLK,
        &mut peripherals.PM,
        &mut peripherals.SYSCTRL,
        &mut peripherals.NVMCTRL,
    );

    // 48 MHz needed for USB
    #[cfg(feature = "usbserial")]
    let mut clocks = GenericClockController::with_external_32kosc(
        peripherals.GCLK,
        &mut peripherals.PM,
        &mut peripherals.SYSCTRL,
        &mut peripherals.NVMCTRL,
    );

    #[cfg(feature = "usbserial")]
    {
        use battery_gauge_rs::usbserial::USBSerial;
        USBSerial::init(
            &mut peripherals.PM,
            peripherals.USB,
            &mut core,
            &mut clocks,
            pins.usb_dm,
            pins.usb_dp,
            &mut pins.port,
        );
    }

    let mut red_led = pins.d13.into_open_drain_output(&mut pins.port);
    red_led.set_high().unwrap();

    #[cfg(feature = "sleeping-delay")]
    let mut runner_delay = {
        use hal::sleeping_delay::SleepingDelay;
        use hal::timer;

        // Get a clock & make a sleeping delay object. use internal 32k clock that runs
        // in standby
        enable_internal_32kosc(&mut peripherals.SYSCTRL);
        let timer_clock = clocks
            .configure_gclk_divider_and_source(ClockGenId::GCLK1, 1, ClockSource::OSC32K, false)
            .unwrap();
        clocks.configure_standby(ClockGenId::GCLK1, true);
        let tc45 = &clocks.tc4_tc5(&timer_clock).unwrap();
        let timer = timer::TimerCounter::tc4_(tc45, peripherals.TC4, &mut peripherals.PM);
        // We can also use it in standby mode, if all of the clocks are configured to
        //   opperate in standby, for even more power savings
        core.SCB.set_sleepdeep();

        unsafe {
            // enable interrupts
            core.NVIC.set_priority(interrupt::TC4, 2);
            NVIC::unmask(interrupt::TC4);
        }

        SleepingDelay::new(timer, &INTERRUPT_FIRED)
    };

    #[cfg(not(feature = "sleeping-delay"))]
    let mut runner_delay = {
        use hal::delay::Delay;

        Delay::new(core.SYST, &mut clocks)
    };

    let mut adc = Adc::adc(peripherals.ADC, &mut peripherals.PM, &mut clocks);
    adc.gain(adc::inputctrl::GAIN_A::DIV2);
    adc.reference(adc::refctrl::REFSEL_A::INTVCC1);
    adc.samples(adc::avgctrl::SAMPLENUM_A::_32);

    let batt_in_div_2 = pins.d9.into_function_b(&mut pins.port);
    let mut battery = Battery::new(
        AdcInput::<_, _, u16, _>::new(&mut adc, batt_in_div_2),
        BatteryConfig::default(),
    );

    // Holding A0 low at boot means the reference voltage is on the battery input
    let cal_button = pins.a0.into_pull_up_input(&mut pins.port);
    let calibrated = if cal_button.is_low().unwrap_or(false) {
        battery.calibrate(CALIBRATION_SAMPLES).ok()
    } else {
        None
    };
    serial_write!("battery gauge up, calibrated: {}\r\n", calibrated.is_some());
    let factor = calibrated.unwrap_or_else(nominal_factor);

    red_led.set_low().unwrap();

    loop {
        let status = match battery.status(factor, STATUS_SAMPLES) {
            Ok(status) => status,
            Err(_) => {
                error(&mut red_led, &mut runner_delay);
                continue;
            }
        };

        report(&status);

        if status.percentage < LOW_BATTERY_PERCENTAGE {
            red_led.set_high().unwrap();
        } else {
            red_led.set_low().unwrap();
        }

        runner_delay.delay_ms(DELAY_BETWEEN_REPORTS_MS);
    }
}

/// Factor for an ideal ADC and divider, used when we haven't calibrated
fn nominal_factor() -> CalibrationFactor {
    CalibrationFactor::from_adc_range(BATTERY_DIVIDER * ADC_REF_VOLTAGE, ADC_FULLSCALE)
}

/// Prints the status as a JSON line over serial
#[cfg(feature = "usbserial")]
fn report(status: &BatteryStatus) {
    use battery_gauge_rs::usbserial::USBSerial;

    let mut buf = [0u8; REPORT_BUFFER_SIZE];
    if let Ok(len) = status.write_json(&mut buf) {
        USBSerial::write_bytes_to_usb(&buf[..len]);
        serial_write!("\r\n");
    }
}

#[cfg(not(feature = "usbserial"))]
fn report(_status: &BatteryStatus) {}

/// Blinks an SOS pattern indicating an error
///
/// # Parameters
/// * `red_led`: The LED pin to blink
/// * `delay`: The `Delay` instance to wait
fn error<PIN, T>(red_led: &mut PIN, delay: &mut T)
where
    PIN: embedded_hal::digital::v2::OutputPin<Error = ()>,
    T: embedded_hal::blocking::delay::DelayMs<u32>,
{
    const SHORT_BLIP_MS: u32 = 250;
    const LONG_BLIP_MS: u32 = 500;

    for blip_ms in &[SHORT_BLIP_MS, LONG_BLIP_MS, SHORT_BLIP_MS] {
        for _ in 0..3 {
            red_led.set_high().ok();
            delay.delay_ms(*blip_ms);
            red_led.set_low().ok();
            delay.delay_ms(*blip_ms);
        }
    }

    delay.delay_ms(2 * LONG_BLIP_MS);
}

/// The sleeping timer interrupt that wakes us up
#[interrupt]
fn TC4() {
    // Let the sleepingtimer know that the interrupt fired, and clear it
    INTERRUPT_FIRED.store(true, atomic::Ordering::Relaxed);
    unsafe {
        if let Some(tc4) = TC4::ptr().as_ref() {
            tc4.count16().intflag.modify(|_, w| w.ovf().set_bit());
        }
    }
}
