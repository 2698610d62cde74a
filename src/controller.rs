//! Door controller that ties the relay, sensor, timers and alerts together.
//!
//! This module provides [`DoorController`], the central component. It
//! never blocks: the owner calls [`DoorController::poll`] from its main
//! loop (every 50 ms or so) and forwards remote commands through
//! [`DoorController::request_state`] and [`DoorController::update_config`].
//!
//! # Poll cycle
//!
//! Each poll runs, in order:
//!
//! 1. Relay sequencing: finish a press or start the next one.
//! 2. The periodic scan, when the scan timer is idle: sample the sensor,
//!    publish a status report, evaluate both alerts, restart the timer.
//! 3. Motion timeout: settle `Opening` to `Open`, or re-check a `Closing`
//!    door and mark it `Stopped` if the sensor does not confirm it closed.
//!
//! # Example
//!
//! ```rust
//! use rs_garage::{DoorController, DoorEvent, DoorState, Timestamp};
//! use rs_garage::config::DoorConfig;
//! use rs_garage::hal::{MockEvents, MockLightSensor, MockRelay};
//!
//! let mut door = DoorController::new(
//!     MockRelay::new(),
//!     MockLightSensor::closed(),
//!     MockEvents::new(),
//!     DoorConfig::default(),
//!     Timestamp::new(0, 1_700_000_000),
//! );
//!
//! // The first poll scans and finds the beam tripped.
//! door.poll(Timestamp::new(0, 1_700_000_000));
//! assert_eq!(door.state(), DoorState::Closed);
//!
//! door.request_state("open", Timestamp::new(100, 1_700_000_000)).unwrap();
//! assert_eq!(door.state(), DoorState::Opening);
//! assert_eq!(door.relay().presses, 1);
//!
//! // Release after the relay time (300 ms by default).
//! door.poll(Timestamp::new(400, 1_700_000_000));
//! assert!(!door.relay().active);
//! assert!(door.events().states().contains(&DoorState::Opening));
//! ```

use log::{debug, info, warn};

use crate::alerts::AlertTracker;
use crate::config::{DoorConfig, TimingField};
use crate::door::{DoorRequest, DoorState};
use crate::error::DoorError;
use crate::events::{DoorEvent, Elapsed, StatusReport};
use crate::sensor::PositionSensor;
use crate::timer::Timer;
use crate::traits::{EventSink, LightSensor, RelayOutput, Timestamp};
use crate::transition::{transition, MotionAction};

/// How the controller learns the door position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SensorMode {
    /// Sample the beam sensor every scan.
    #[default]
    Beam,
    /// No sensor fitted: trust commands and the motion timer.
    Virtual,
}

/// Door controller.
///
/// # Type Parameters
///
/// - `R`: relay driving the opener button ([`RelayOutput`])
/// - `S`: beam sensor ([`LightSensor`])
/// - `E`: where events go ([`EventSink`])
///
/// # Thread Safety
///
/// The controller itself is not thread-safe. For multi-threaded scenarios
/// (e.g., web server + main loop), use the `SharedDoorState` wrapper from
/// the services module (requires `web` or `mqtt` feature).
pub struct DoorController<R: RelayOutput, S: LightSensor, E: EventSink> {
    relay: R,
    sensor: PositionSensor<S>,
    events: E,
    config: DoorConfig,
    mode: SensorMode,
    state: DoorState,
    last_event_secs: u64,
    clock_set: bool,
    relay_clicks_left: u8,
    signal_dbm: i8,
    alerts: AlertTracker,
    scan_timer: Timer,
    motion_timer: Timer,
    relay_on_timer: Timer,
    relay_off_timer: Timer,
}

impl<R: RelayOutput, S: LightSensor, E: EventSink> DoorController<R, S, E> {
    /// Create a controller and release the relay.
    ///
    /// The door is assumed open until the first scan, which runs on the
    /// first [`poll`](Self::poll). Emits [`DoorEvent::Started`].
    pub fn new(mut relay: R, sensor: S, mut events: E, config: DoorConfig, now: Timestamp) -> Self {
        if let Err(e) = relay.release() {
            warn!("failed to release relay at startup: {:?}", e);
        }
        let sensor = PositionSensor::new(sensor, config.sensor_reads, config.sensor_threshold);
        info!("door controller started: {}", config);
        events.publish(DoorEvent::Started);

        Self {
            relay,
            sensor,
            events,
            config,
            mode: SensorMode::Beam,
            state: DoorState::Open,
            last_event_secs: now.epoch_secs,
            clock_set: now.wall_clock_set(),
            relay_clicks_left: 0,
            signal_dbm: 0,
            alerts: AlertTracker::new(),
            scan_timer: Timer::bound(TimingField::ReadTime),
            motion_timer: Timer::bound(TimingField::MotionTime),
            relay_on_timer: Timer::bound(TimingField::RelayTime),
            relay_off_timer: Timer::bound(TimingField::RelayPause),
        }
    }

    /// Select how the door position is determined.
    pub fn with_sensor_mode(mut self, mode: SensorMode) -> Self {
        self.mode = mode;
        self
    }

    // ========================================================================
    // Poll cycle
    // ========================================================================

    /// Run one cycle. Call frequently with the current time.
    ///
    /// Hardware faults are logged; the cycle always completes.
    pub fn poll(&mut self, now: Timestamp) {
        if self.relay_on_timer.is_timeout(now.tick_ms) {
            self.finish_press(now.tick_ms);
        } else if self.relay_off_timer.is_timeout(now.tick_ms) {
            if let Err(e) = self.press(now.tick_ms) {
                warn!(
                    "relay press failed, abandoning {} click(s): {:?}",
                    self.relay_clicks_left, e
                );
                self.relay_clicks_left = 0;
            }
        }

        if !self.scan_timer.is_running(now.tick_ms) {
            self.scan(now);
        }

        if self.motion_timer.is_timeout(now.tick_ms) {
            self.motion_timeout(now);
        }
    }

    fn scan(&mut self, now: Timestamp) {
        if self.mode == SensorMode::Beam {
            self.read_position(now);
        }
        // Elapsed time restarts when the wall clock is first set.
        if !self.clock_set && now.wall_clock_set() {
            info!("wall clock set, elapsed time restarts");
            self.clock_set = true;
            self.last_event_secs = now.epoch_secs;
        }
        let report = self.status(now.epoch_secs);
        self.events.publish(DoorEvent::Status(report));

        if self.clock_set {
            self.check_alerts(now);
        }
        self.scan_timer.start(now.tick_ms, &self.config);
    }

    fn check_alerts(&mut self, now: Timestamp) {
        let elapsed = now.epoch_secs.saturating_sub(self.last_event_secs);
        if let Some(alert) = self
            .alerts
            .check_open_timeout(self.state, elapsed, &self.config)
        {
            self.events.publish(alert);
        }
        if let Some(alert) = self
            .alerts
            .check_night(self.state, now.epoch_secs, &self.config)
        {
            self.events.publish(alert);
        }
    }

    /// Sample the beam and reconcile the held state with it.
    fn read_position(&mut self, now: Timestamp) -> DoorState {
        let reading = match self.sensor.sample() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("sensor sample failed: {:?}", e);
                return self.state;
            }
        };

        if reading.tripped && self.state != DoorState::Closed {
            self.alerts.reset();
            self.motion_timer.stop();
            self.set_state(DoorState::Closed, now);
        } else if !reading.tripped && self.state == DoorState::Closed {
            self.motion_timer.start(now.tick_ms, &self.config);
            self.set_state(DoorState::Opening, now);
        }
        self.state
    }

    fn motion_timeout(&mut self, now: Timestamp) {
        match (self.state, self.mode) {
            (DoorState::Opening, _) => self.set_state(DoorState::Open, now),
            (DoorState::Closing, SensorMode::Virtual) => {
                self.alerts.reset();
                self.set_state(DoorState::Closed, now);
            }
            (DoorState::Closing, SensorMode::Beam) => {
                if self.read_position(now) != DoorState::Closed {
                    self.set_state(DoorState::Stopped, now);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Relay sequencing
    // ========================================================================

    fn press(&mut self, now_ms: u32) -> Result<(), R::Error> {
        self.relay.set_active(true)?;
        debug!("relay on, {} click(s) left", self.relay_clicks_left);
        self.relay_on_timer.start(now_ms, &self.config);
        Ok(())
    }

    fn finish_press(&mut self, now_ms: u32) {
        if let Err(e) = self.relay.set_active(false) {
            warn!("relay release failed, retrying: {:?}", e);
            self.relay_on_timer.start(now_ms, &self.config);
            return;
        }
        self.relay_clicks_left = self.relay_clicks_left.saturating_sub(1);
        debug!("relay off, {} click(s) left", self.relay_clicks_left);
        if self.relay_clicks_left > 0 {
            self.relay_off_timer.start(now_ms, &self.config);
        }
    }

    fn start_clicks(&mut self, clicks: u8, now_ms: u32) -> Result<(), R::Error> {
        self.press(now_ms)?;
        self.relay_off_timer.stop();
        self.relay_clicks_left = clicks;
        Ok(())
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Handle a request by name (`open`, `close`, `stop` and their state
    /// forms). Returns the state after the request.
    ///
    /// Unknown names are rejected without side effects.
    pub fn request_state(&mut self, name: &str, now: Timestamp) -> Result<DoorState, DoorError> {
        let request = name.parse::<DoorRequest>().map_err(|e| {
            warn!("rejected state request {:?}", name);
            e
        })?;
        self.request(request, now)
    }

    /// Handle a parsed request. Returns the state after the request.
    ///
    /// Fails with [`DoorError::Relay`] if the first press cannot be made,
    /// in which case nothing changes.
    pub fn request(&mut self, request: DoorRequest, now: Timestamp) -> Result<DoorState, DoorError> {
        let Some(step) = transition(self.state, request) else {
            info!("request {} ignored while {}", request, self.state);
            return Ok(self.state);
        };

        self.start_clicks(step.clicks, now.tick_ms).map_err(|e| {
            warn!("relay failed for request {}: {:?}", request, e);
            DoorError::Relay
        })?;
        info!("request {}: {} click(s)", request, step.clicks);

        match step.motion {
            MotionAction::Restart => self.motion_timer.start(now.tick_ms, &self.config),
            MotionAction::Stop => self.motion_timer.stop(),
        }
        self.set_state(step.target, now);
        Ok(self.state)
    }

    /// Apply a `key=value|...` configuration update.
    ///
    /// Returns the number of fields that changed and emits
    /// [`DoorEvent::ConfigChanged`] when that is non-zero. Sensor
    /// parameters are re-derived after every update.
    pub fn update_config(&mut self, update: &str) -> Result<usize, DoorError> {
        let result = self.config.apply_update(update);
        self.sensor
            .configure(self.config.sensor_reads, self.config.sensor_threshold);

        match result {
            Ok(changed) => {
                info!("config updated ({} changed): {}", changed, self.config);
                if changed > 0 {
                    self.events.publish(DoorEvent::ConfigChanged(changed));
                }
                Ok(changed)
            }
            Err(e) => {
                warn!("config update {:?} rejected: {}", update, e);
                Err(e.into())
            }
        }
    }

    /// Record the network signal strength reported in status updates.
    pub fn set_signal_strength(&mut self, dbm: i8) {
        self.signal_dbm = dbm;
    }

    fn set_state(&mut self, state: DoorState, now: Timestamp) {
        info!("door {} -> {}", self.state, state);
        self.state = state;
        self.last_event_secs = now.epoch_secs;
        self.events.publish(DoorEvent::StateChanged(state));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current door state.
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Status report as of `epoch_secs`.
    pub fn status(&self, epoch_secs: u64) -> StatusReport {
        StatusReport {
            state: self.state,
            elapsed: Elapsed(epoch_secs.saturating_sub(self.last_event_secs)),
            sensor: self.sensor.last_percent(),
            signal: self.signal_dbm,
        }
    }

    /// Full snapshot for UI/API.
    pub fn snapshot(&self, now: Timestamp) -> DoorSnapshot {
        DoorSnapshot {
            state: self.state,
            elapsed_secs: now.epoch_secs.saturating_sub(self.last_event_secs),
            sensor: self.sensor.last_percent(),
            signal: self.signal_dbm,
            relay_clicks_left: self.relay_clicks_left,
            motion_ms_left: self.motion_timer.time_left(now.tick_ms),
            timeout_alert_fired: self.alerts.timeout_fired(),
            night_alert_fired: self.alerts.night_fired(),
            virtual_sensor: self.mode == SensorMode::Virtual,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &DoorConfig {
        &self.config
    }

    /// How the door position is determined.
    pub fn sensor_mode(&self) -> SensorMode {
        self.mode
    }

    /// Relay clicks still to be sent, including one in progress.
    pub fn relay_clicks_left(&self) -> u8 {
        self.relay_clicks_left
    }

    /// Alert flags for the current episode.
    pub fn alerts(&self) -> &AlertTracker {
        &self.alerts
    }

    /// Borrow the relay.
    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Borrow the position sensor.
    pub fn sensor(&self) -> &PositionSensor<S> {
        &self.sensor
    }

    /// Mutably borrow the position sensor.
    pub fn sensor_mut(&mut self) -> &mut PositionSensor<S> {
        &mut self.sensor
    }

    /// Borrow the event sink.
    pub fn events(&self) -> &E {
        &self.events
    }

    /// Mutably borrow the event sink.
    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }
}

/// Snapshot of controller state for UI/API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorSnapshot {
    /// Current door state.
    pub state: DoorState,
    /// Seconds since the last state change.
    pub elapsed_secs: u64,
    /// Last sensor reading in percent.
    pub sensor: u8,
    /// Network signal strength in dBm.
    pub signal: i8,
    /// Relay clicks still pending.
    pub relay_clicks_left: u8,
    /// Milliseconds until the motion timer expires, 0 when idle.
    pub motion_ms_left: u32,
    /// Open-timeout alert already sent this episode.
    pub timeout_alert_fired: bool,
    /// Night alert already sent this episode.
    pub night_alert_fired: bool,
    /// Running without a beam sensor.
    pub virtual_sensor: bool,
}
