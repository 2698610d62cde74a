//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without physical hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRelay`] | [`RelayOutput`] | Counts presses and records every edge |
//! | [`MockLightSensor`] | [`LightSensor`] | Fixed ambient/lit levels, error injection |
//! | [`MockClock`] | [`Clock`] | Controllable, wrapping time source |
//! | [`MockEvents`] | [`EventSink`] | Collects emitted events |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//!
//! # Example
//!
//! ```rust
//! use rs_garage::{DoorController, DoorState, Timestamp};
//! use rs_garage::config::DoorConfig;
//! use rs_garage::hal::{MockEvents, MockLightSensor, MockRelay};
//!
//! let mut door = DoorController::new(
//!     MockRelay::new(),
//!     MockLightSensor::closed(),
//!     MockEvents::new(),
//!     DoorConfig::default(),
//!     Timestamp::default(),
//! );
//!
//! door.request_state("open", Timestamp::new(10, 0)).unwrap();
//! assert_eq!(door.state(), DoorState::Opening);
//! assert!(door.relay().active);
//! ```
//!
//! [`RelayOutput`]: crate::traits::RelayOutput
//! [`LightSensor`]: crate::traits::LightSensor
//! [`Clock`]: crate::traits::Clock
//! [`EventSink`]: crate::traits::EventSink
//! [`MqttClient`]: crate::traits::MqttClient

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::door::DoorState;
use crate::events::DoorEvent;
use crate::traits::{Clock, EventSink, LightSensor, MqttClient, MqttMessage, RelayOutput};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock relay for testing.
///
/// Records every edge so tests can check click sequencing. A press is a
/// transition from released to active.
///
/// # Example
///
/// ```rust
/// use rs_garage::hal::MockRelay;
/// use rs_garage::traits::RelayOutput;
///
/// let mut relay = MockRelay::new();
/// relay.set_active(true).unwrap();
/// relay.set_active(false).unwrap();
/// relay.set_active(true).unwrap();
///
/// assert!(relay.active);
/// assert_eq!(relay.presses, 2);
/// assert_eq!(relay.edges, vec![true, false, true]);
/// ```
#[derive(Debug, Default)]
pub struct MockRelay {
    /// Whether the relay is currently energized.
    pub active: bool,
    /// Number of released-to-active transitions.
    pub presses: usize,
    /// Every value passed to `set_active`, in order.
    pub edges: Vec<bool>,
    /// When set, `set_active` fails without changing anything.
    pub fail: bool,
}

impl MockRelay {
    /// Creates a released, working relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a relay that starts energized, as a floating pin might.
    pub fn stuck_active() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Creates a relay whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl RelayOutput for MockRelay {
    type Error = ();

    fn set_active(&mut self, active: bool) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        if active && !self.active {
            self.presses += 1;
        }
        self.active = active;
        self.edges.push(active);
        Ok(())
    }
}

/// Mock beam sensor for testing.
///
/// Returns `ambient` while the emitter is off and `lit` while it is on.
/// The default presets give a tripped (closed) or clear (open) beam with
/// the default 25 % threshold.
///
/// # Example
///
/// ```rust
/// use rs_garage::hal::MockLightSensor;
/// use rs_garage::traits::LightSensor;
///
/// let mut sensor = MockLightSensor::new(1000, 400);
/// assert_eq!(sensor.read_level().unwrap(), 1000);
///
/// sensor.set_emitter(true).unwrap();
/// assert_eq!(sensor.read_level().unwrap(), 400);
/// assert_eq!(sensor.pulses, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockLightSensor {
    /// Level returned with the emitter off.
    pub ambient: u16,
    /// Level returned with the emitter on.
    pub lit: u16,
    /// Whether the emitter is currently on.
    pub emitter_on: bool,
    /// Number of times the emitter was switched on.
    pub pulses: u32,
    /// Total microseconds requested through `delay_us`.
    pub delayed_us: u64,
    /// Number of successful reads.
    pub reads: u32,
    /// Remaining successful reads before every read fails.
    pub fail_after: Option<u32>,
}

impl MockLightSensor {
    /// Creates a sensor with fixed ambient and lit levels.
    pub fn new(ambient: u16, lit: u16) -> Self {
        Self {
            ambient,
            lit,
            ..Self::default()
        }
    }

    /// Beam reflected back: reads as 60 %, a closed door.
    pub fn closed() -> Self {
        Self::new(1000, 400)
    }

    /// Beam lost: reads as 0 %, an open door.
    pub fn open() -> Self {
        Self::new(1000, 1000)
    }

    /// Switch between the [`closed`](Self::closed) and [`open`](Self::open) presets.
    pub fn set_closed(&mut self, closed: bool) {
        self.ambient = 1000;
        self.lit = if closed { 400 } else { 1000 };
    }

    /// Change the level returned with the emitter on.
    pub fn set_lit_level(&mut self, lit: u16) {
        self.lit = lit;
    }

    /// Let `reads` more reads succeed, then fail every read.
    pub fn fail_after(&mut self, reads: u32) {
        self.fail_after = Some(reads);
    }

    /// Make reads succeed again.
    pub fn recover(&mut self) {
        self.fail_after = None;
    }
}

impl LightSensor for MockLightSensor {
    type Error = ();

    fn read_level(&mut self) -> Result<u16, ()> {
        if let Some(left) = self.fail_after.as_mut() {
            if *left == 0 {
                return Err(());
            }
            *left -= 1;
        }
        self.reads += 1;
        Ok(if self.emitter_on { self.lit } else { self.ambient })
    }

    fn set_emitter(&mut self, on: bool) -> Result<(), ()> {
        if on && !self.emitter_on {
            self.pulses += 1;
        }
        self.emitter_on = on;
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += u64::from(us);
    }
}

/// Mock clock for testing time-dependent behavior.
///
/// The millisecond tick wraps like a hardware counter; wall-clock time
/// advances alongside it.
///
/// # Example
///
/// ```rust
/// use rs_garage::hal::MockClock;
/// use rs_garage::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(u32::MAX);
/// clock.advance(1500);
/// assert_eq!(clock.now_ms(), 1499);
/// assert_eq!(clock.epoch_secs(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    tick_ms: u32,
    epoch_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock at tick 0 and epoch 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at the given tick and wall-clock second.
    pub fn starting_at(tick_ms: u32, epoch_secs: u64) -> Self {
        Self {
            tick_ms,
            epoch_ms: epoch_secs * 1000,
        }
    }

    /// Sets the tick without touching wall-clock time.
    pub fn set(&mut self, ms: u32) {
        self.tick_ms = ms;
    }

    /// Sets wall-clock time without touching the tick.
    pub fn set_epoch(&mut self, secs: u64) {
        self.epoch_ms = secs * 1000;
    }

    /// Advances both tick and wall-clock time.
    pub fn advance(&mut self, ms: u32) {
        self.tick_ms = self.tick_ms.wrapping_add(ms);
        self.epoch_ms += u64::from(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.tick_ms
    }

    fn epoch_secs(&self) -> u64 {
        self.epoch_ms / 1000
    }
}

// ============================================================================
// Event Mocks
// ============================================================================

/// Event sink that keeps everything it receives.
///
/// # Example
///
/// ```rust
/// use rs_garage::hal::MockEvents;
/// use rs_garage::traits::EventSink;
/// use rs_garage::{DoorEvent, DoorState};
///
/// let mut events = MockEvents::new();
/// events.publish(DoorEvent::StateChanged(DoorState::Opening));
/// events.publish(DoorEvent::ConfigChanged(2));
///
/// assert_eq!(events.states(), vec![DoorState::Opening]);
/// assert_eq!(events.events.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockEvents {
    /// Every event, in order.
    pub events: Vec<DoorEvent>,
}

impl MockEvents {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// States from every `StateChanged` event.
    pub fn states(&self) -> Vec<DoorState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DoorEvent::StateChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    /// Number of open-timeout alerts.
    pub fn timeout_alerts(&self) -> usize {
        self.count(|e| matches!(e, DoorEvent::OpenTimeout(_)))
    }

    /// Number of night alerts.
    pub fn night_alerts(&self) -> usize {
        self.count(|e| matches!(e, DoorEvent::NightAlert { .. }))
    }

    /// Number of status refreshes.
    pub fn status_updates(&self) -> usize {
        self.count(|e| matches!(e, DoorEvent::Status(_)))
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&DoorEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Most recent event.
    pub fn last(&self) -> Option<&DoorEvent> {
        self.events.last()
    }

    /// Forget everything received so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for MockEvents {
    fn publish(&mut self, event: DoorEvent) {
        self.events.push(event);
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use rs_garage::hal::MockMqtt;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("garage/state/set", b"open".to_vec());
///
/// // Check subscriptions
/// mqtt.subscriptions.push("garage/state/set".into());
/// assert!(mqtt.is_subscribed("garage/state/set"));
///
/// // Check published messages
/// mqtt.published.push(("garage/state".into(), b"opening".to_vec(), true));
/// assert_eq!(mqtt.published_to("garage/state").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }

    /// Payloads published to a topic, as text
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.published_to(topic)
            .into_iter()
            .map(|(_, p, _)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    // =========================================================================
    // MockRelay Tests
    // =========================================================================

    #[test]
    fn mock_relay_default() {
        let relay = MockRelay::new();
        assert!(!relay.active);
        assert_eq!(relay.presses, 0);
        assert!(relay.edges.is_empty());
    }

    #[test]
    fn mock_relay_counts_rising_edges_only() {
        let mut relay = MockRelay::new();
        relay.set_active(true).unwrap();
        relay.set_active(true).unwrap();
        relay.release().unwrap();
        assert_eq!(relay.presses, 1);
        assert_eq!(relay.edges, vec![true, true, false]);
    }

    #[test]
    fn mock_relay_failing() {
        let mut relay = MockRelay::failing();
        assert!(relay.set_active(true).is_err());
        assert!(!relay.active);
        assert!(relay.edges.is_empty());
    }

    // =========================================================================
    // MockLightSensor Tests
    // =========================================================================

    #[test]
    fn mock_sensor_levels_follow_emitter() {
        let mut sensor = MockLightSensor::new(800, 200);
        assert_eq!(sensor.read_level().unwrap(), 800);
        sensor.set_emitter(true).unwrap();
        assert_eq!(sensor.read_level().unwrap(), 200);
        sensor.set_emitter(false).unwrap();
        assert_eq!(sensor.read_level().unwrap(), 800);
        assert_eq!(sensor.reads, 3);
    }

    #[test]
    fn mock_sensor_fail_after() {
        let mut sensor = MockLightSensor::closed();
        sensor.fail_after(2);
        assert!(sensor.read_level().is_ok());
        assert!(sensor.read_level().is_ok());
        assert!(sensor.read_level().is_err());
        sensor.recover();
        assert!(sensor.read_level().is_ok());
    }

    #[test]
    fn mock_sensor_presets() {
        let mut sensor = MockLightSensor::open();
        assert_eq!(sensor.lit, sensor.ambient);
        sensor.set_closed(true);
        assert_eq!(sensor.lit, 400);
    }

    #[test]
    fn mock_sensor_accumulates_delay() {
        let mut sensor = MockLightSensor::closed();
        sensor.delay_us(500);
        sensor.delay_us(1000);
        assert_eq!(sensor.delayed_us, 1500);
    }

    // =========================================================================
    // MockClock Tests
    // =========================================================================

    #[test]
    fn mock_clock_default() {
        let clock = MockClock::new();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.epoch_secs(), 0);
    }

    #[test]
    fn mock_clock_advance() {
        let mut clock = MockClock::starting_at(100, 1_700_000_000);
        clock.advance(2500);
        assert_eq!(clock.now_ms(), 2600);
        assert_eq!(clock.epoch_secs(), 1_700_000_002);
    }

    #[test]
    fn mock_clock_tick_wraps() {
        let mut clock = MockClock::new();
        clock.set(u32::MAX - 9);
        clock.advance(20);
        assert_eq!(clock.now_ms(), 10);
    }

    // =========================================================================
    // MockEvents Tests
    // =========================================================================

    #[test]
    fn mock_events_filters() {
        let mut events = MockEvents::new();
        events.publish(DoorEvent::Started);
        events.publish(DoorEvent::StateChanged(DoorState::Closing));
        events.publish(DoorEvent::NightAlert { hour: 23, minute: 5 });
        events.publish(DoorEvent::StateChanged(DoorState::Closed));

        assert_eq!(events.states(), vec![DoorState::Closing, DoorState::Closed]);
        assert_eq!(events.night_alerts(), 1);
        assert_eq!(events.timeout_alerts(), 0);
        assert_eq!(
            events.last(),
            Some(&DoorEvent::StateChanged(DoorState::Closed))
        );

        events.clear();
        assert!(events.events.is_empty());
    }

    // =========================================================================
    // MockMqtt Tests
    // =========================================================================

    #[test]
    fn mock_mqtt_default() {
        let mqtt = MockMqtt::new();
        assert!(mqtt.connected);
        assert!(mqtt.published.is_empty());
        assert!(mqtt.subscriptions.is_empty());
        assert!(mqtt.incoming.is_empty());
    }

    #[test]
    fn mock_mqtt_queue_and_receive_in_order() {
        let mut mqtt = MockMqtt::new();
        mqtt.queue_message("garage/state/set", b"open".to_vec());
        mqtt.queue_message("garage/state/set", b"stop".to_vec());

        assert_eq!(mqtt.try_recv().unwrap().payload, b"open");
        assert_eq!(mqtt.try_recv().unwrap().payload, b"stop");
        assert!(mqtt.try_recv().is_none());
    }

    #[test]
    fn mock_mqtt_published_to() {
        let mut mqtt = MockMqtt::new();
        mqtt.publish("garage/state", b"open", true).unwrap();
        mqtt.publish("garage/status", b"status=open", false).unwrap();
        mqtt.publish("garage/state", b"closing", true).unwrap();

        assert_eq!(mqtt.published_to("garage/state").len(), 2);
        assert!(mqtt.published_to("garage/state")[0].2);
        assert_eq!(mqtt.payloads("garage/state"), vec!["open", "closing"]);
    }

    #[test]
    fn mock_mqtt_disconnected_publish_fails() {
        let mut mqtt = MockMqtt::new();
        mqtt.connected = false;
        assert!(mqtt.publish("garage/state", b"open", true).is_err());
    }
}
