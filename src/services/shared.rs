//! Unified shared state for all door controller services.
//!
//! `SharedDoorState` provides thread-safe access to a single `DoorController`
//! that is shared between the poll loop, the web API and the MQTT bridge.
//! Every controller mutation goes through its one mutex.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_garage::services::SharedDoorState;
//!
//! let state = Arc::new(SharedDoorState::new(controller, SystemClock::new()));
//!
//! // Main loop
//! state.poll();
//!
//! // Web service reads snapshots and forwards commands
//! let snapshot = state.snapshot();
//! state.request_state("open")?;
//!
//! // MQTT bridge publishes what the controller emitted
//! for event in state.drain_events() { /* ... */ }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::controller::{DoorController, DoorSnapshot};
use crate::door::DoorState;
use crate::error::DoorError;
use crate::events::{DoorEvent, StatusReport};
use crate::hal::SystemClock;
use crate::traits::{Clock, EventQueue, LightSensor, RelayOutput, Timestamp};

/// Controller type shared by the services: events go to a queue that the
/// publishers drain.
pub type QueuedController<R, S> = DoorController<R, S, EventQueue>;

// ============================================================================
// Door Service Trait
// ============================================================================

/// Trait for providing door controller access to services.
///
/// This abstraction allows services (HTTP, MQTT, etc.) to work with
/// different state management strategies on different platforms.
pub trait DoorService: Send + Sync {
    /// Current snapshot.
    fn snapshot(&self) -> DoorSnapshot;

    /// Current status report.
    fn status(&self) -> StatusReport;

    /// Forward a state request by name.
    fn request_state(&self, name: &str) -> Result<DoorState, DoorError>;

    /// Forward a configuration update string.
    fn update_config(&self, update: &str) -> Result<usize, DoorError>;

    /// Active configuration in `key=value|...` form.
    fn config_string(&self) -> String;

    /// Take events emitted since the last call.
    fn drain_events(&self) -> Vec<DoorEvent>;
}

// ============================================================================
// Shared Door State
// ============================================================================

/// Unified shared state for all services (poll loop, web, MQTT).
///
/// # Thread Safety
///
/// - Uses `Mutex` for controller access: the poll loop writes on every
///   cycle, so there is little to gain from a `RwLock`.
/// - All timestamps come from the same clock for consistency.
/// - A poisoned lock is recovered; the controller holds no invariants
///   that a panicking reader could break.
pub struct SharedDoorState<R, S, C = SystemClock>
where
    R: RelayOutput,
    S: LightSensor,
{
    controller: Mutex<QueuedController<R, S>>,
    clock: C,
}

impl<R, S, C> SharedDoorState<R, S, C>
where
    R: RelayOutput,
    S: LightSensor,
    C: Clock,
{
    /// Create new shared state wrapping a controller.
    pub fn new(controller: QueuedController<R, S>, clock: C) -> Self {
        Self {
            controller: Mutex::new(controller),
            clock,
        }
    }

    /// Current time from the shared clock.
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The shared clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, QueuedController<R, S>> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Access the controller with a mutable lock.
    ///
    /// The closure pattern prevents accidentally holding the lock across
    /// await points.
    pub fn with_controller<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut QueuedController<R, S>) -> T,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Run one controller cycle at the current time.
    pub fn poll(&self) {
        let now = self.now();
        self.lock().poll(now);
    }

    /// Get a snapshot at the current time.
    pub fn snapshot(&self) -> DoorSnapshot {
        let now = self.now();
        self.lock().snapshot(now)
    }

    /// Status report at the current time.
    pub fn status(&self) -> StatusReport {
        let now = self.now();
        self.lock().status(now.epoch_secs)
    }

    /// Forward a state request.
    pub fn request_state(&self, name: &str) -> Result<DoorState, DoorError> {
        let now = self.now();
        self.lock().request_state(name, now)
    }

    /// Forward a configuration update.
    pub fn update_config(&self, update: &str) -> Result<usize, DoorError> {
        self.lock().update_config(update)
    }

    /// Active configuration string.
    pub fn config_string(&self) -> String {
        self.lock().config().to_string()
    }

    /// Record the current signal strength.
    pub fn set_signal_strength(&self, dbm: i8) {
        self.lock().set_signal_strength(dbm);
    }

    /// Take every queued event.
    pub fn drain_events(&self) -> Vec<DoorEvent> {
        self.lock().events_mut().drain().collect()
    }
}

// ============================================================================
// DoorService Implementation for Arc<SharedDoorState>
// ============================================================================

impl<R, S, C> DoorService for Arc<SharedDoorState<R, S, C>>
where
    R: RelayOutput + Send + 'static,
    S: LightSensor + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn snapshot(&self) -> DoorSnapshot {
        SharedDoorState::snapshot(self)
    }

    fn status(&self) -> StatusReport {
        SharedDoorState::status(self)
    }

    fn request_state(&self, name: &str) -> Result<DoorState, DoorError> {
        SharedDoorState::request_state(self, name)
    }

    fn update_config(&self, update: &str) -> Result<usize, DoorError> {
        SharedDoorState::update_config(self, update)
    }

    fn config_string(&self) -> String {
        SharedDoorState::config_string(self)
    }

    fn drain_events(&self) -> Vec<DoorEvent> {
        SharedDoorState::drain_events(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DoorConfig;
    use crate::hal::{MockClock, MockLightSensor, MockRelay};
    use std::thread;

    type TestShared = SharedDoorState<MockRelay, MockLightSensor, MockClock>;

    fn shared(sensor: MockLightSensor) -> TestShared {
        let clock = MockClock::starting_at(0, 1_700_000_000);
        let controller = DoorController::new(
            MockRelay::new(),
            sensor,
            EventQueue::default(),
            DoorConfig::default(),
            clock.now(),
        );
        SharedDoorState::new(controller, clock)
    }

    // ========================================================================
    // SharedDoorState tests
    // ========================================================================

    #[test]
    fn test_started_event_is_queued() {
        let state = shared(MockLightSensor::closed());
        assert_eq!(state.drain_events(), vec![DoorEvent::Started]);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_poll_scans_and_queues_status() {
        let state = shared(MockLightSensor::closed());
        state.drain_events();
        state.poll();

        let events = state.drain_events();
        assert_eq!(events[0], DoorEvent::StateChanged(DoorState::Closed));
        assert!(matches!(events[1], DoorEvent::Status(_)));
        assert_eq!(state.snapshot().state, DoorState::Closed);
    }

    #[test]
    fn test_request_state_through_shared() {
        let state = shared(MockLightSensor::closed());
        state.poll();
        assert_eq!(state.request_state("open"), Ok(DoorState::Opening));
        assert_eq!(
            state.request_state("sideways"),
            Err(DoorError::InvalidStateRequest)
        );
        state.with_controller(|c| assert_eq!(c.relay().presses, 1));
    }

    #[test]
    fn test_config_round_trip() {
        let state = shared(MockLightSensor::closed());
        assert_eq!(state.update_config("rdt=2000"), Ok(1));
        assert!(state.config_string().contains("rdt=2000"));
    }

    #[test]
    fn test_signal_strength_in_status() {
        let state = shared(MockLightSensor::open());
        state.set_signal_strength(-55);
        assert_eq!(state.status().signal, -55);
    }

    #[test]
    fn test_service_trait_concurrent_access() {
        let state = Arc::new(shared(MockLightSensor::closed()));
        state.poll();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = Arc::clone(&state);
                thread::spawn(move || {
                    let name = if i % 2 == 0 { "open" } else { "stop" };
                    let _ = DoorService::request_state(&service, name);
                    DoorService::snapshot(&service)
                })
            })
            .collect();

        for handle in handles {
            let snapshot = handle.join().unwrap();
            assert_ne!(snapshot.state, DoorState::Unknown);
        }
        assert!(!DoorService::drain_events(&state).is_empty());
    }
}
