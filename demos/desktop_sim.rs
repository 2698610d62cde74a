//! Desktop simulator for the web API and MQTT integration.
//!
//! Runs the door controller against a simulated opener: relay clicks start,
//! stop and reverse a virtual door that takes a few seconds to travel, and
//! the beam sensor reports "closed" only when it is fully down.
//!
//! # Usage
//!
//! Scripted run, no network:
//! ```sh
//! cargo run --example desktop_sim
//! ```
//!
//! Web server (http://localhost:8080/api/status):
//! ```sh
//! cargo run --example desktop_sim --features web
//! curl -X POST -d '{"state":"close"}' http://localhost:8080/api/state
//! ```
//!
//! Web server + MQTT:
//! ```sh
//! cargo run --example desktop_sim --features web,mqtt
//! mosquitto_pub -t garage/state/set -m open
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rs_garage::config::DoorConfig;
use rs_garage::hal::SystemClock;
use rs_garage::traits::{Clock, EventQueue, LightSensor, RelayOutput};
use rs_garage::{Config, DoorController};

/// Full travel time of the simulated door.
const TRAVEL: Duration = Duration::from_secs(6);

/// Controller poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Simulated Opener
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Motion {
    Up,
    Down,
    Idle,
}

/// Door position in [0, 1], 0 = closed.
#[derive(Debug)]
struct SimDoor {
    position: f32,
    motion: Motion,
    last_motion: Motion,
    since: Instant,
}

impl SimDoor {
    fn new() -> Self {
        Self {
            position: 1.0,
            motion: Motion::Idle,
            last_motion: Motion::Up,
            since: Instant::now(),
        }
    }

    fn advance(&mut self) {
        let dt = self.since.elapsed().as_secs_f32() / TRAVEL.as_secs_f32();
        self.since = Instant::now();
        match self.motion {
            Motion::Up => self.position = (self.position + dt).min(1.0),
            Motion::Down => self.position = (self.position - dt).max(0.0),
            Motion::Idle => {}
        }
        if (self.motion == Motion::Up && self.position >= 1.0)
            || (self.motion == Motion::Down && self.position <= 0.0)
        {
            self.motion = Motion::Idle;
        }
    }

    /// One button press. A press while closing reverses the door, as most
    /// openers do.
    fn click(&mut self) {
        self.advance();
        self.motion = match (self.motion, self.last_motion) {
            (Motion::Down, _) => Motion::Up,
            (Motion::Up, _) => Motion::Idle,
            (Motion::Idle, Motion::Up) => Motion::Down,
            (Motion::Idle, _) => Motion::Up,
        };
        if self.motion != Motion::Idle {
            self.last_motion = self.motion;
        }
        log::debug!("sim door {:?} at {:.0}%", self.motion, self.position * 100.0);
    }

    fn is_closed(&mut self) -> bool {
        self.advance();
        self.position <= 0.0
    }
}

type Sim = Arc<Mutex<SimDoor>>;

struct SimRelay {
    door: Sim,
    active: bool,
}

impl RelayOutput for SimRelay {
    type Error = ();

    fn set_active(&mut self, active: bool) -> Result<(), ()> {
        if active && !self.active {
            self.door
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .click();
        }
        self.active = active;
        Ok(())
    }
}

struct SimSensor {
    door: Sim,
    emitter: bool,
}

impl LightSensor for SimSensor {
    type Error = ();

    fn read_level(&mut self) -> Result<u16, ()> {
        let closed = self
            .door
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_closed();
        // Reflector only lines up with the door fully closed.
        Ok(if self.emitter && closed { 300 } else { 900 })
    }

    fn set_emitter(&mut self, on: bool) -> Result<(), ()> {
        self.emitter = on;
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {}
}

type SimController = DoorController<SimRelay, SimSensor, EventQueue>;

fn build_controller(door: DoorConfig, clock: &SystemClock) -> SimController {
    let sim = Arc::new(Mutex::new(SimDoor::new()));
    DoorController::new(
        SimRelay {
            door: Arc::clone(&sim),
            active: false,
        },
        SimSensor {
            door: sim,
            emitter: false,
        },
        EventQueue::default(),
        door,
        clock.now(),
    )
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Shorter timings so the simulation moves along.
    let config = Config::default().with_door(
        DoorConfig::default()
            .with_motion_time_ms(8000)
            .with_alert_open_timeout_secs(60),
    );

    log::info!("rs-garage desktop simulator, door config: {}", config.door);

    #[cfg(any(feature = "web", feature = "mqtt"))]
    {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(run_services(&config))
    }

    #[cfg(not(any(feature = "web", feature = "mqtt")))]
    {
        run_scripted(&config);
        Ok(())
    }
}

/// Close the door, then open it again, logging every event.
#[cfg(not(any(feature = "web", feature = "mqtt")))]
fn run_scripted(config: &Config) {
    let clock = SystemClock::new();
    let mut door = build_controller(config.door.clone(), &clock);
    let start = Instant::now();
    let mut script = [
        (Duration::from_secs(2), "close"),
        (Duration::from_secs(12), "open"),
    ]
    .into_iter()
    .peekable();

    while start.elapsed() < Duration::from_secs(22) {
        let now = clock.now();
        if let Some((at, request)) = script.next_if(|(at, _)| start.elapsed() >= *at) {
            log::info!("t+{}s: requesting {}", at.as_secs(), request);
            if let Err(e) = door.request_state(request, now) {
                log::warn!("request {} failed: {}", request, e);
            }
        }
        door.poll(now);
        for event in door.events_mut().drain() {
            log::info!("event: {:?}", event);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(any(feature = "web", feature = "mqtt"))]
async fn run_services(config: &Config) -> anyhow::Result<()> {
    use rs_garage::services::SharedDoorState;

    let clock = SystemClock::new();
    let controller = build_controller(config.door.clone(), &clock);
    let state = Arc::new(SharedDoorState::new(controller, clock));

    // Single poll loop for all services
    let poller = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            poller.poll();

            // The MQTT handler publishes events; otherwise just log them.
            #[cfg(not(feature = "mqtt"))]
            for event in poller.drain_events() {
                log::info!("event: {:?}", event);
            }
        }
    });

    #[cfg(feature = "mqtt")]
    let handler = rs_garage::services::MqttHandler::new(
        Arc::clone(&state),
        rs_garage::services::MqttRuntimeConfig::from_config(&config.mqtt),
    );

    #[cfg(feature = "web")]
    {
        use rs_garage::services::{run_server, WebServerConfig};

        #[cfg(feature = "mqtt")]
        tokio::spawn(async move {
            if let Err(e) = handler.run().await {
                log::error!("{}", e);
            }
        });

        run_server(state, WebServerConfig::from_config(&config.web)).await?;
    }

    #[cfg(all(feature = "mqtt", not(feature = "web")))]
    {
        drop(state);
        handler.run().await?;
    }

    Ok(())
}
