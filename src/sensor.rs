//! Break-beam position sensor.
//!
//! The emitter is aimed at a reflector (or the door itself) so that the
//! beam only reaches the photo sensor when the door is closed. Each scan
//! pulses the emitter and measures how much the sensor level drops
//! relative to ambient, which makes the reading independent of daylight.

use log::debug;

use crate::traits::LightSensor;

/// Emitter on-time before the lit sample is taken (µs).
pub const PULSE_US: u32 = 500;
/// Settle time after the emitter is switched off (µs).
pub const GAP_US: u32 = 1000;

/// Result of one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorReading {
    /// Drop in level with the emitter on, as a percentage of ambient.
    pub percent: u8,
    /// Whether the percentage is above the trip threshold.
    pub tripped: bool,
}

/// Averaging differential sampler over a [`LightSensor`].
pub struct PositionSensor<S: LightSensor> {
    sensor: S,
    reads: u8,
    threshold: u8,
    last_percent: u8,
}

impl<S: LightSensor> PositionSensor<S> {
    /// Wrap a light sensor with the given read count and trip threshold.
    pub fn new(sensor: S, reads: u8, threshold: u8) -> Self {
        Self {
            sensor,
            reads: reads.max(1),
            threshold,
            last_percent: 0,
        }
    }

    /// Change read count and trip threshold.
    pub fn configure(&mut self, reads: u8, threshold: u8) {
        self.reads = reads.max(1);
        self.threshold = threshold;
    }

    /// Take `reads` pulsed measurements and report the averaged result.
    ///
    /// On error the emitter is switched off and the retained reading is
    /// left unchanged.
    pub fn sample(&mut self) -> Result<SensorReading, S::Error> {
        let mut ambient_sum: i64 = 0;
        let mut drop_sum: i64 = 0;

        for _ in 0..self.reads {
            let ambient = self.sensor.read_level()?;
            ambient_sum += i64::from(ambient);

            self.sensor.set_emitter(true)?;
            self.sensor.delay_us(PULSE_US);
            let lit = self.sensor.read_level();
            let off = self.sensor.set_emitter(false);
            drop_sum += i64::from(ambient) - i64::from(lit?);
            off?;
            self.sensor.delay_us(GAP_US);
        }

        let percent = if ambient_sum == 0 {
            debug!("sensor baseline is zero, reporting 0%");
            0
        } else {
            (drop_sum * 100 / ambient_sum).clamp(0, 100) as u8
        };

        self.last_percent = percent;
        let reading = SensorReading {
            percent,
            tripped: percent > self.threshold,
        };
        debug!("sensor sample: {}% tripped={}", percent, reading.tripped);
        Ok(reading)
    }

    /// Percentage from the last successful sample.
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Current read count.
    pub fn reads(&self) -> u8 {
        self.reads
    }

    /// Current trip threshold.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Borrow the underlying sensor.
    pub fn inner(&self) -> &S {
        &self.sensor
    }

    /// Mutably borrow the underlying sensor.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockLightSensor;
    use proptest::prelude::*;

    #[test]
    fn reflected_beam_trips() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(1000, 400), 3, 25);
        let reading = sensor.sample().unwrap();
        assert_eq!(reading.percent, 60);
        assert!(reading.tripped);
        assert_eq!(sensor.last_percent(), 60);
    }

    #[test]
    fn broken_beam_does_not_trip() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(1000, 900), 3, 25);
        let reading = sensor.sample().unwrap();
        assert_eq!(reading.percent, 10);
        assert!(!reading.tripped);
    }

    #[test]
    fn zero_baseline_reports_zero() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(0, 0), 3, 25);
        let reading = sensor.sample().unwrap();
        assert_eq!(reading, SensorReading::default());
    }

    #[test]
    fn brighter_when_lit_clamps_to_zero() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(500, 800), 1, 25);
        assert_eq!(sensor.sample().unwrap().percent, 0);
    }

    #[test]
    fn threshold_is_strict() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(100, 75), 1, 25);
        let reading = sensor.sample().unwrap();
        assert_eq!(reading.percent, 25);
        assert!(!reading.tripped);
    }

    #[test]
    fn pulses_once_per_read() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(1000, 400), 5, 25);
        sensor.sample().unwrap();
        assert_eq!(sensor.inner().pulses, 5);
        assert!(!sensor.inner().emitter_on);
        assert_eq!(sensor.inner().delayed_us, 5 * (PULSE_US + GAP_US) as u64);
    }

    #[test]
    fn configure_changes_reads_and_threshold() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(1000, 400), 3, 25);
        sensor.configure(7, 70);
        assert_eq!(sensor.reads(), 7);
        assert_eq!(sensor.threshold(), 70);
        assert!(!sensor.sample().unwrap().tripped);
    }

    #[test]
    fn failed_read_keeps_last_reading_and_turns_emitter_off() {
        let mut sensor = PositionSensor::new(MockLightSensor::new(1000, 400), 3, 25);
        sensor.sample().unwrap();

        sensor.inner_mut().set_lit_level(900);
        sensor.inner_mut().fail_after(1);
        assert!(sensor.sample().is_err());
        assert_eq!(sensor.last_percent(), 60);
        assert!(!sensor.inner().emitter_on);
    }

    proptest! {
        #[test]
        fn tripped_iff_above_threshold(ambient in 0u16..=4095, lit in 0u16..=4095, threshold in 1u8..=80) {
            let mut sensor = PositionSensor::new(MockLightSensor::new(ambient, lit), 3, threshold);
            let reading = sensor.sample().unwrap();
            prop_assert!(reading.percent <= 100);
            prop_assert_eq!(reading.tripped, reading.percent > threshold);
        }
    }
}
