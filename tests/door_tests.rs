//! Integration tests for the door controller using the mock HAL.

use rs_garage::config::DoorConfig;
use rs_garage::hal::{MockEvents, MockLightSensor, MockRelay};
use rs_garage::transition::{transition, MotionAction};
use rs_garage::{DoorController, DoorError, DoorEvent, DoorRequest, DoorState, Elapsed, Timestamp};

type TestDoor = DoorController<MockRelay, MockLightSensor, MockEvents>;

const EPOCH: u64 = 1_700_000_000;

fn at(ms: u32) -> Timestamp {
    Timestamp::new(ms, EPOCH + u64::from(ms / 1000))
}

fn door_with(sensor: MockLightSensor, config: DoorConfig) -> TestDoor {
    DoorController::new(MockRelay::new(), sensor, MockEvents::new(), config, at(0))
}

fn door(sensor: MockLightSensor) -> TestDoor {
    door_with(sensor, DoorConfig::default())
}

/// Poll every 50 ms over `[from, to]`.
fn run(door: &mut TestDoor, from: u32, to: u32) {
    let mut t = from;
    while t <= to {
        door.poll(at(t));
        t += 50;
    }
}

fn set_beam(door: &mut TestDoor, closed: bool) {
    door.sensor_mut().inner_mut().set_closed(closed);
}

// ============================================================================
// Transition table
// ============================================================================

#[test]
fn transition_table_is_complete() {
    use DoorRequest::{Close, Open, Stop};
    use DoorState::{Closed, Closing, Opening, Stopped};

    let expected = [
        (Closed, Open, Some((1, Opening))),
        (Closed, Close, None),
        (Closed, Stop, None),
        (Opening, Open, None),
        (Opening, Close, Some((2, Closing))),
        (Opening, Stop, Some((1, Stopped))),
        (DoorState::Open, Open, None),
        (DoorState::Open, Close, Some((1, Closing))),
        (DoorState::Open, Stop, None),
        (Closing, Open, Some((2, Opening))),
        (Closing, Close, None),
        (Closing, Stop, Some((2, Stopped))),
        (Stopped, Open, Some((2, Opening))),
        (Stopped, Close, Some((2, Closing))),
        (Stopped, Stop, None),
    ];

    for (state, request, outcome) in expected {
        let got = transition(state, request).map(|t| (t.clicks, t.target));
        assert_eq!(got, outcome, "{state} + {request}");
    }
}

#[test]
fn moving_targets_restart_motion_timer() {
    for state in [DoorState::Closed, DoorState::Open, DoorState::Stopped] {
        for request in [DoorRequest::Open, DoorRequest::Close] {
            if let Some(t) = transition(state, request) {
                assert_eq!(t.motion, MotionAction::Restart);
            }
        }
    }
}

#[test]
fn unknown_state_never_transitions() {
    for request in [DoorRequest::Open, DoorRequest::Close, DoorRequest::Stop] {
        assert!(transition(DoorState::Unknown, request).is_none());
    }
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn startup_releases_relay_and_announces() {
    let door = door(MockLightSensor::open());
    assert_eq!(door.relay().edges, vec![false]);
    assert_eq!(door.events().events, vec![DoorEvent::Started]);
    assert_eq!(door.state(), DoorState::Open);
}

#[test]
fn first_poll_scans_immediately() {
    let mut door = door(MockLightSensor::closed());
    door.poll(at(0));
    assert_eq!(door.state(), DoorState::Closed);
    assert_eq!(door.events().status_updates(), 1);

    // Next scan only after the read time
    door.poll(at(999));
    assert_eq!(door.events().status_updates(), 1);
    door.poll(at(1000));
    assert_eq!(door.events().status_updates(), 2);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn open_from_closed_settles_after_motion_time() {
    let mut door = door(MockLightSensor::closed());
    door.poll(at(0));
    assert_eq!(door.state(), DoorState::Closed);

    // The opener starts moving and the beam clears
    set_beam(&mut door, false);
    assert_eq!(door.request_state("open", at(100)), Ok(DoorState::Opening));
    assert_eq!(door.relay().presses, 1);
    assert!(door.relay().active);

    run(&mut door, 150, 400);
    assert!(!door.relay().active);
    assert_eq!(door.relay_clicks_left(), 0);

    run(&mut door, 450, 10_050);
    assert_eq!(door.state(), DoorState::Opening);

    door.poll(at(10_100));
    assert_eq!(door.state(), DoorState::Open);
    assert_eq!(door.relay().presses, 1);
    assert_eq!(
        door.events().states(),
        vec![DoorState::Closed, DoorState::Opening, DoorState::Open]
    );
}

#[test]
fn close_confirmed_by_beam_clears_alerts() {
    let mut door = door(MockLightSensor::open());
    door.poll(Timestamp::new(0, EPOCH));

    // Left open long enough to alert
    door.poll(Timestamp::new(1000, EPOCH + 1200));
    assert!(door.alerts().timeout_fired());

    door.request_state("close", Timestamp::new(1100, EPOCH + 1200))
        .unwrap();
    assert_eq!(door.state(), DoorState::Closing);
    assert_eq!(door.relay_clicks_left(), 1);

    door.poll(Timestamp::new(1400, EPOCH + 1201));
    assert!(!door.relay().active);

    // Door reaches the floor, next scan sees the beam
    set_beam(&mut door, true);
    door.poll(Timestamp::new(2000, EPOCH + 1202));
    assert_eq!(door.state(), DoorState::Closed);
    assert!(!door.alerts().timeout_fired());
    assert!(!door.alerts().night_fired());
    assert_eq!(door.snapshot(Timestamp::new(2000, EPOCH + 1202)).motion_ms_left, 0);
}

#[test]
fn close_without_beam_ends_stopped() {
    let mut door = door(MockLightSensor::open());
    door.poll(at(0));
    door.request_state("close", at(100)).unwrap();

    run(&mut door, 150, 10_050);
    assert_eq!(door.state(), DoorState::Closing);

    door.poll(at(10_100));
    assert_eq!(door.state(), DoorState::Stopped);
}

#[test]
fn reversing_opening_door_takes_two_clicks() {
    let mut door = door(MockLightSensor::closed());
    door.poll(at(0));
    set_beam(&mut door, false);

    door.request_state("open", at(100)).unwrap();
    run(&mut door, 150, 450);
    assert_eq!(door.relay().presses, 1);

    assert_eq!(door.request_state("close", at(500)), Ok(DoorState::Closing));
    assert_eq!(door.relay_clicks_left(), 2);
    assert_eq!(door.relay().presses, 2);

    // First click released after the relay time
    run(&mut door, 550, 800);
    assert!(!door.relay().active);
    assert_eq!(door.relay_clicks_left(), 1);

    // Second click after the pause
    run(&mut door, 850, 1750);
    assert_eq!(door.relay().presses, 2);
    door.poll(at(1800));
    assert_eq!(door.relay().presses, 3);
    assert!(door.relay().active);

    run(&mut door, 1850, 2100);
    assert!(!door.relay().active);
    assert_eq!(door.relay_clicks_left(), 0);
    assert_eq!(door.state(), DoorState::Closing);
}

#[test]
fn stop_while_closing() {
    let mut door = door(MockLightSensor::open());
    door.poll(at(0));
    door.request_state("close", at(0)).unwrap();
    run(&mut door, 50, 500);

    assert_eq!(door.request_state("stop", at(550)), Ok(DoorState::Stopped));
    assert_eq!(door.relay_clicks_left(), 2);

    // Motion timer cancelled: nothing happens at the old deadline
    run(&mut door, 600, 12_000);
    assert_eq!(door.state(), DoorState::Stopped);
    assert_eq!(door.relay().presses, 3);
}

#[test]
fn beam_clearing_on_closed_door_means_opening() {
    let mut door = door(MockLightSensor::closed());
    door.poll(at(0));

    // Someone used the wall button
    set_beam(&mut door, false);
    door.poll(at(1000));
    assert_eq!(door.state(), DoorState::Opening);
    assert_eq!(door.relay().presses, 0);

    run(&mut door, 1050, 11_000);
    assert_eq!(door.state(), DoorState::Open);
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn noop_request_returns_current_state() {
    let mut door = door(MockLightSensor::closed());
    door.poll(at(0));
    door.events_mut().clear();

    assert_eq!(door.request_state("closed", at(10)), Ok(DoorState::Closed));
    assert_eq!(door.request_state("stop", at(10)), Ok(DoorState::Closed));
    assert_eq!(door.relay().presses, 0);
    assert!(door.events().states().is_empty());
}

#[test]
fn invalid_request_has_no_side_effects() {
    let mut door = door(MockLightSensor::open());
    door.poll(at(0));
    door.events_mut().clear();

    assert_eq!(
        door.request_state("Open", at(10)),
        Err(DoorError::InvalidStateRequest)
    );
    assert_eq!(
        door.request_state("", at(10)),
        Err(DoorError::InvalidStateRequest)
    );
    assert_eq!(door.state(), DoorState::Open);
    assert_eq!(door.relay().presses, 0);
    assert!(door.events().events.is_empty());
}

#[test]
fn relay_failure_leaves_state_untouched() {
    let mut door = DoorController::new(
        MockRelay::failing(),
        MockLightSensor::open(),
        MockEvents::new(),
        DoorConfig::default(),
        at(0),
    );
    door.poll(at(0));

    assert_eq!(door.request_state("close", at(10)), Err(DoorError::Relay));
    assert_eq!(door.state(), DoorState::Open);
    assert_eq!(door.relay_clicks_left(), 0);
}

// ============================================================================
// Alerts
// ============================================================================

#[test]
fn open_timeout_fires_once_at_threshold() {
    let mut door = door(MockLightSensor::open());
    door.poll(Timestamp::new(0, EPOCH));

    door.poll(Timestamp::new(1000, EPOCH + 1199));
    assert_eq!(door.events().timeout_alerts(), 0);

    door.poll(Timestamp::new(2000, EPOCH + 1200));
    assert_eq!(door.events().timeout_alerts(), 1);
    assert!(door
        .events()
        .events
        .contains(&DoorEvent::OpenTimeout(Elapsed(1200))));

    door.poll(Timestamp::new(3000, EPOCH + 1300));
    assert_eq!(door.events().timeout_alerts(), 1);
}

#[test]
fn open_timeout_reported_in_minutes() {
    assert_eq!(Elapsed(1200).to_string(), "20m");
}

#[test]
fn zero_open_timeout_disables_alert() {
    let config = DoorConfig::default().with_alert_open_timeout_secs(0);
    let mut door = door_with(MockLightSensor::open(), config);
    door.poll(Timestamp::new(0, EPOCH));
    door.poll(Timestamp::new(1000, EPOCH + 100_000));
    assert_eq!(door.events().timeout_alerts(), 0);
}

/// 2023-11-14 00:00:00 UTC
const DAY_START: u64 = 1_699_920_000;

#[test]
fn night_alert_in_local_time() {
    // 06:00 UTC is 23:00 at the default -7 h offset
    let night = DAY_START + 86_400 + 6 * 3600;
    let mut door = DoorController::new(
        MockRelay::new(),
        MockLightSensor::open(),
        MockEvents::new(),
        DoorConfig::default(),
        Timestamp::new(0, night - 60),
    );

    door.poll(Timestamp::new(0, night));
    assert_eq!(door.events().night_alerts(), 1);
    assert!(door
        .events()
        .events
        .contains(&DoorEvent::NightAlert { hour: 23, minute: 0 }));

    // Once per episode
    door.poll(Timestamp::new(1000, night + 600));
    assert_eq!(door.events().night_alerts(), 1);
}

#[test]
fn no_night_alert_during_the_day() {
    // 19:00 UTC is noon local
    let noon = DAY_START + 19 * 3600;
    let mut door = DoorController::new(
        MockRelay::new(),
        MockLightSensor::open(),
        MockEvents::new(),
        DoorConfig::default(),
        Timestamp::new(0, noon - 60),
    );

    door.poll(Timestamp::new(0, noon));
    assert_eq!(door.events().night_alerts(), 0);
}

#[test]
fn huge_time_zone_falls_back_to_default_offset() {
    // 06:00 UTC is 23:00 at the default -7 h offset
    let night = DAY_START + 86_400 + 6 * 3600;
    let mut door = DoorController::new(
        MockRelay::new(),
        MockLightSensor::open(),
        MockEvents::new(),
        DoorConfig::default().with_time_zone(1.0),
        Timestamp::new(0, night - 60),
    );
    assert_eq!(door.update_config("tzo=1e30"), Ok(1));

    door.poll(Timestamp::new(0, night));
    assert!(door
        .events()
        .events
        .contains(&DoorEvent::NightAlert { hour: 23, minute: 0 }));
}

#[test]
fn alerts_wait_for_wall_clock() {
    // Boot time with no SNTP yet; 06:00 would be 23:00 local if trusted
    let mut door = DoorController::new(
        MockRelay::new(),
        MockLightSensor::open(),
        MockEvents::new(),
        DoorConfig::default(),
        Timestamp::new(0, 10),
    );
    door.poll(Timestamp::new(0, 6 * 3600));
    assert_eq!(door.events().night_alerts(), 0);
    assert_eq!(door.events().timeout_alerts(), 0);

    // Clock steps to real noon local time
    let noon = DAY_START + 19 * 3600;
    door.poll(Timestamp::new(1000, noon));
    assert_eq!(door.events().timeout_alerts(), 0);
    assert_eq!(door.status(noon).elapsed, Elapsed(0));

    door.poll(Timestamp::new(2000, noon + 1200));
    assert_eq!(door.events().timeout_alerts(), 1);
}

#[test]
fn closed_door_never_alerts() {
    let night = DAY_START + 86_400 + 6 * 3600;
    let mut door = DoorController::new(
        MockRelay::new(),
        MockLightSensor::closed(),
        MockEvents::new(),
        DoorConfig::default(),
        Timestamp::new(0, night - 5000),
    );

    door.poll(Timestamp::new(0, night));
    assert_eq!(door.state(), DoorState::Closed);
    assert_eq!(door.events().night_alerts(), 0);
    assert_eq!(door.events().timeout_alerts(), 0);
}

// ============================================================================
// Status and configuration
// ============================================================================

#[test]
fn status_string_format() {
    let mut door = door(MockLightSensor::closed());
    door.set_signal_strength(-61);
    door.poll(Timestamp::new(0, EPOCH));

    let report = door.status(EPOCH + 90);
    assert_eq!(
        report.to_string(),
        "status=closed|time=90s|sensor=60|signal=-61"
    );
    assert_eq!(door.status(EPOCH + 600).elapsed.to_string(), "10m");
}

#[test]
fn config_update_emits_change_count() {
    let mut door = door(MockLightSensor::open());
    assert_eq!(door.update_config("rdt=500|mtt=10000"), Ok(1));
    assert_eq!(door.events().last(), Some(&DoorEvent::ConfigChanged(1)));

    // Nothing changed, nothing emitted
    let before = door.events().events.len();
    assert_eq!(door.update_config("rdt=500"), Ok(0));
    assert_eq!(door.events().events.len(), before);
}

#[test]
fn config_update_changes_scan_interval() {
    let mut door = door(MockLightSensor::open());
    door.poll(at(0));
    door.update_config("rdt=500").unwrap();

    // Timer already running keeps its old deadline, then uses the new one
    door.poll(at(1000));
    let scans = door.events().status_updates();
    door.poll(at(1500));
    assert_eq!(door.events().status_updates(), scans + 1);
}

#[test]
fn sensor_threshold_update_applies_to_next_scan() {
    let mut door = door(MockLightSensor::closed());
    door.poll(at(0));
    assert_eq!(door.state(), DoorState::Closed);

    // 60 % no longer counts as tripped
    door.update_config("srt=80").unwrap();
    door.poll(at(1000));
    assert_eq!(door.state(), DoorState::Opening);
}
