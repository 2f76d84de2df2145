//! USB CDC serial port for printing battery reports.

extern crate feather_m0 as hal;
extern crate usb_device;
extern crate usbd_serial;

use core::convert::Infallible;
use cortex_m::peripheral::NVIC;
use hal::clock::GenericClockController;
use hal::gpio::{Floating, Input, Port};
use hal::pac::{interrupt, CorePeripherals, PM, USB};
use hal::usb::UsbBus;
use usb_device::bus::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::{SerialPort, USB_CLASS_CDC};

/// Writes `ufmt` formatted text to the USB serial port
#[macro_export]
macro_rules! serial_write {
    ($($tt:tt)*) => {{
        let mut writer = $crate::usbserial::UsbWriter;
        ufmt::uwrite!(writer, $($tt)*).ok();
    }};
}

pub struct USBSerial {
    usb_bus: UsbDevice<'static, UsbBus>,
    usb_serial: SerialPort<'static, UsbBus>,
}

static mut USB_SERIAL: Option<USBSerial> = None;
static mut BUS_ALLOCATOR: Option<UsbBusAllocator<UsbBus>> = None;

impl USBSerial {
    /// Initializes the `USBSerial` singleton.
    ///
    /// # Arguments
    ///  * pm_perph: The power management peripheral
    ///  * usb_perph: The USB peripheral
    ///  * core: The `CorePeripheral` instance for NVIC modifications
    ///  * clocks: The clocks instance for USB peripheral clocking
    ///  * dm: The d- GPIO pad
    ///  * dp: The d+ GPIO pad
    ///  * port: the GPIO port
    pub fn init(
        pm_perph: &mut PM,
        usb_perph: USB,
        core: &mut CorePeripherals,
        clocks: &mut GenericClockController,
        dm: hal::gpio::Pa24<Input<Floating>>,
        dp: hal::gpio::Pa25<Input<Floating>>,
        port: &mut Port,
    ) {
        unsafe {
            if USB_SERIAL.is_some() {
                return;
            }

            BUS_ALLOCATOR = Some(hal::usb_allocator(
                usb_perph, clocks, pm_perph, dm, dp, port,
            ));
            if let Some(allocator) = BUS_ALLOCATOR.as_ref() {
                USB_SERIAL = Some(USBSerial {
                    usb_bus: UsbDeviceBuilder::new(allocator, UsbVidPid(0x16c0, 0x27dd))
                        .manufacturer("Holmes Engineering")
                        .product("Battery gauge")
                        .serial_number("BATT")
                        .device_class(USB_CLASS_CDC)
                        .build(),
                    usb_serial: SerialPort::new(allocator),
                });
            }

            core.NVIC.set_priority(interrupt::USB, 1);
            NVIC::unmask(interrupt::USB);
        }
    }

    /// Writes a message over USB serial. Dropped if the port isn't up or the host isn't reading.
    ///
    /// # Arguments
    /// * message: The message to write to the USB port
    pub fn write_to_usb(message: &str) {
        USBSerial::write_bytes_to_usb(message.as_bytes());
    }

    /// Writes raw bytes over USB serial, same rules as `write_to_usb`
    pub fn write_bytes_to_usb(bytes: &[u8]) {
        unsafe {
            if let Some(usbserial) = USB_SERIAL.as_mut() {
                usbserial.usb_serial.write(bytes).ok();
            }
        }
    }

    /// Services the USB peripheral. Anything the host sends is discarded.
    fn poll_usb() {
        let mut discard = [0u8; 64];
        unsafe {
            if let Some(usbserial) = USB_SERIAL.as_mut() {
                if usbserial.usb_bus.poll(&mut [&mut usbserial.usb_serial]) {
                    usbserial.usb_serial.read(&mut discard).ok();
                }
            }
        }
    }
}

/// `ufmt` sink for the USB serial singleton
pub struct UsbWriter;

impl ufmt::uWrite for UsbWriter {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        USBSerial::write_to_usb(s);
        Ok(())
    }
}

#[interrupt]
fn USB() {
    USBSerial::poll_usb();
}
