//! Opener relay driven from a GPIO.

use esp_idf_hal::gpio::{Gpio3, Output, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use log::debug;

use crate::traits::RelayOutput;

/// Relay across the opener's wall-button terminals.
///
/// # Hardware Setup
///
/// - GPIO3 → relay module IN (active high)
/// - Relay COM/NO → opener push-button terminals
///
/// # Example
///
/// ```ignore
/// use rs_garage::hal::esp32::Esp32Relay;
/// use rs_garage::traits::RelayOutput;
///
/// let peripherals = Peripherals::take()?;
/// let mut relay = Esp32Relay::new(peripherals.pins.gpio3)?;
/// relay.set_active(true)?;
/// ```
pub struct Esp32Relay<'d> {
    pin: PinDriver<'d, Gpio3, Output>,
}

impl<'d> Esp32Relay<'d> {
    /// Creates the relay driver with the relay released.
    ///
    /// # Errors
    ///
    /// Returns an error if the GPIO cannot be configured as an output.
    pub fn new(
        pin: impl Peripheral<P = Gpio3> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }

    /// Returns true while the relay coil is energized.
    pub fn is_active(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl RelayOutput for Esp32Relay<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_active(&mut self, active: bool) -> Result<(), Self::Error> {
        debug!("relay {}", if active { "on" } else { "off" });
        if active {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}
