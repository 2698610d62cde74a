//! Break-beam sensor: laser emitter plus photo resistor on the ADC.
//!
//! # Wiring
//!
//! - GPIO2 → laser module enable (through an NPN transistor)
//! - GPIO4 → photo resistor divider midpoint (ADC1)
//!
//! The laser is aimed at a reflector on the door that only lines up when the
//! door is fully closed. The divider is wired so more reflected light gives a
//! lower reading, which the position sensor compares against the ambient
//! reading taken with the laser off.

use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{Gpio2, Gpio4, Output, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

use crate::traits::LightSensor;

/// Laser and photo resistor pair.
///
/// # Example
///
/// ```ignore
/// use rs_garage::hal::esp32::Esp32LightSensor;
/// use rs_garage::sensor::PositionSensor;
///
/// let peripherals = Peripherals::take()?;
/// let adc = AdcDriver::new(peripherals.adc1)?;
/// let sensor = Esp32LightSensor::new(&adc, peripherals.pins.gpio4, peripherals.pins.gpio2)?;
/// ```
pub struct Esp32LightSensor<'d> {
    photo: AdcChannelDriver<'d, Gpio4, &'d AdcDriver<'d, ADC1>>,
    laser: PinDriver<'d, Gpio2, Output>,
}

impl<'d> Esp32LightSensor<'d> {
    /// Creates the sensor with the laser off.
    ///
    /// # Arguments
    ///
    /// * `adc` - Reference to ADC1 driver (must outlive this struct)
    /// * `photo_pin` - GPIO4 for the photo resistor divider
    /// * `laser_pin` - GPIO2 for the laser enable
    ///
    /// # Errors
    ///
    /// Returns an error if ADC channel or GPIO initialization fails.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        photo_pin: impl Peripheral<P = Gpio4> + 'd,
        laser_pin: impl Peripheral<P = Gpio2> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let photo = AdcChannelDriver::new(adc, photo_pin, &config)?;
        let mut laser = PinDriver::output(laser_pin)?;
        laser.set_low()?;

        Ok(Self { photo, laser })
    }
}

impl LightSensor for Esp32LightSensor<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn read_level(&mut self) -> Result<u16, Self::Error> {
        self.photo.read()
    }

    fn set_emitter(&mut self, on: bool) -> Result<(), Self::Error> {
        if on {
            self.laser.set_high()
        } else {
            self.laser.set_low()
        }
    }

    fn delay_us(&mut self, us: u32) {
        Ets::delay_us(us);
    }
}
