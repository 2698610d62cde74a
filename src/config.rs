//! Shared configuration system for desktop and ESP32.
//!
//! [`DoorConfig`] holds the tunable parameters of the door controller and
//! understands the compact `key=value|key=value` update format accepted
//! from the command interface. The remaining structs configure the
//! network side and use `heapless::String` for `no_std` compatibility.
//!
//! # Example
//!
//! ```rust
//! use rs_garage::config::{Config, DoorConfig, MqttConfig};
//!
//! let mut door = DoorConfig::default();
//! let changed = door.apply_update("rdt=500|mtt=6000").unwrap();
//! assert_eq!(changed, 2);
//!
//! let config = Config::default()
//!     .with_door(door)
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"));
//! assert_eq!(config.door.read_time_ms, 500);
//! ```

use core::fmt;
use core::ops::RangeInclusive;

use heapless::String as HString;

use crate::error::ConfigError;

/// Maximum length for short config strings (hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topic prefixes, paths)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(truncate_utf8(s, MAX_SHORT_STRING));
    hs
}

fn truncate_utf8(s: &str, max: usize) -> &str {
    let take = s.len().min(max);
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &s[..valid_end]
}

// ============================================================================
// Door Config
// ============================================================================

/// Configuration layout version, checked when loading persisted settings.
pub const CONFIG_VERSION: (u8, u8) = (1, 4);

/// Default delay between sensor scans (ms).
pub const DEFAULT_READ_TIME_MS: u16 = 1000;
/// Default time for the door to complete a full open or close (ms).
pub const DEFAULT_MOTION_TIME_MS: u16 = 10_000;
/// Default relay press length (ms).
pub const DEFAULT_RELAY_TIME_MS: u16 = 300;
/// Default pause between relay presses (ms).
pub const DEFAULT_RELAY_PAUSE_MS: u16 = 1000;
/// Default number of averaged sensor reads.
pub const DEFAULT_SENSOR_READS: u8 = 3;
/// Default sensor trip threshold (percent).
pub const DEFAULT_SENSOR_THRESHOLD: u8 = 25;
/// Default open-door alert timeout (seconds, 0 disables).
pub const DEFAULT_ALERT_OPEN_TIMEOUT_SECS: u16 = 20 * 60;
/// Default night window start (minute of day).
pub const DEFAULT_ALERT_NIGHT_START: u16 = 22 * 60;
/// Default night window end (minute of day).
pub const DEFAULT_ALERT_NIGHT_END: u16 = 6 * 60;
/// Default time zone offset from UTC (hours).
pub const DEFAULT_TIME_ZONE: f32 = -7.0;

const READ_TIME_RANGE: RangeInclusive<i64> = 200..=60_000;
const MOTION_TIME_RANGE: RangeInclusive<i64> = 500..=10_000;
const RELAY_TIME_RANGE: RangeInclusive<i64> = 10..=2000;
const RELAY_PAUSE_RANGE: RangeInclusive<i64> = 10..=5000;
const SENSOR_READS_RANGE: RangeInclusive<i64> = 1..=20;
const SENSOR_THRESHOLD_RANGE: RangeInclusive<i64> = 1..=80;
const TIME_ZONE_RANGE: RangeInclusive<f32> = -12.0..=14.0;

/// Handle to one of the timing fields of [`DoorConfig`].
///
/// Timers hold a handle instead of a copied value so that a configuration
/// update takes effect the next time the timer starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingField {
    /// Interval between sensor scans.
    ReadTime,
    /// Full travel time of the door.
    MotionTime,
    /// Relay press length.
    RelayTime,
    /// Pause between relay presses.
    RelayPause,
}

/// Door controller configuration.
///
/// Values are always within range: updates that fall outside a field's
/// range store that field's default instead.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorConfig {
    /// Delay between sensor scans in milliseconds (`rdt`).
    pub read_time_ms: u16,
    /// Expected time for a full open/close in milliseconds (`mtt`).
    pub motion_time_ms: u16,
    /// Relay press length in milliseconds (`rlt`).
    pub relay_time_ms: u16,
    /// Minimum pause between relay presses in milliseconds (`rlp`).
    pub relay_pause_ms: u16,
    /// Number of sensor reads averaged per scan (`srr`).
    pub sensor_reads: u8,
    /// Brightness change (percent) that trips the sensor (`srt`).
    pub sensor_threshold: u8,
    /// Seconds the door may stay open before alerting, 0 disables (`aot`).
    pub alert_open_timeout_secs: u16,
    /// Night window start as minute of day (`ans`).
    pub alert_night_start: u16,
    /// Night window end as minute of day (`ane`). Equal to start disables.
    pub alert_night_end: u16,
    /// Offset from UTC in hours (`tzo`).
    pub time_zone: f32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            read_time_ms: DEFAULT_READ_TIME_MS,
            motion_time_ms: DEFAULT_MOTION_TIME_MS,
            relay_time_ms: DEFAULT_RELAY_TIME_MS,
            relay_pause_ms: DEFAULT_RELAY_PAUSE_MS,
            sensor_reads: DEFAULT_SENSOR_READS,
            sensor_threshold: DEFAULT_SENSOR_THRESHOLD,
            alert_open_timeout_secs: DEFAULT_ALERT_OPEN_TIMEOUT_SECS,
            alert_night_start: DEFAULT_ALERT_NIGHT_START,
            alert_night_end: DEFAULT_ALERT_NIGHT_END,
            time_zone: DEFAULT_TIME_ZONE,
        }
    }
}

/// One validated assignment from an update string.
#[derive(Clone, Copy, Debug)]
enum Assignment {
    ReadTime(u16),
    MotionTime(u16),
    RelayTime(u16),
    RelayPause(u16),
    SensorReads(u8),
    SensorThreshold(u8),
    AlertOpenTimeout(u16),
    AlertNightStart(u16),
    AlertNightEnd(u16),
    TimeZone(f32),
    Version,
}

impl DoorConfig {
    /// Duration in milliseconds behind a [`TimingField`] handle.
    pub fn timing_ms(&self, field: TimingField) -> u32 {
        let ms = match field {
            TimingField::ReadTime => self.read_time_ms,
            TimingField::MotionTime => self.motion_time_ms,
            TimingField::RelayTime => self.relay_time_ms,
            TimingField::RelayPause => self.relay_pause_ms,
        };
        u32::from(ms)
    }

    /// Set the scan interval, falling back to the default when out of range.
    pub fn with_read_time_ms(mut self, ms: u16) -> Self {
        self.read_time_ms = ranged(i64::from(ms), READ_TIME_RANGE, DEFAULT_READ_TIME_MS);
        self
    }

    /// Set the motion time, falling back to the default when out of range.
    pub fn with_motion_time_ms(mut self, ms: u16) -> Self {
        self.motion_time_ms = ranged(i64::from(ms), MOTION_TIME_RANGE, DEFAULT_MOTION_TIME_MS);
        self
    }

    /// Set the relay press length, falling back to the default when out of range.
    pub fn with_relay_time_ms(mut self, ms: u16) -> Self {
        self.relay_time_ms = ranged(i64::from(ms), RELAY_TIME_RANGE, DEFAULT_RELAY_TIME_MS);
        self
    }

    /// Set the relay pause, falling back to the default when out of range.
    pub fn with_relay_pause_ms(mut self, ms: u16) -> Self {
        self.relay_pause_ms = ranged(i64::from(ms), RELAY_PAUSE_RANGE, DEFAULT_RELAY_PAUSE_MS);
        self
    }

    /// Set sensor read count and threshold, each falling back to its default.
    pub fn with_sensor(mut self, reads: u8, threshold: u8) -> Self {
        self.sensor_reads = ranged(i64::from(reads), SENSOR_READS_RANGE, DEFAULT_SENSOR_READS);
        self.sensor_threshold = ranged(
            i64::from(threshold),
            SENSOR_THRESHOLD_RANGE,
            DEFAULT_SENSOR_THRESHOLD,
        );
        self
    }

    /// Set the open-door alert timeout in seconds (0 disables).
    pub fn with_alert_open_timeout_secs(mut self, secs: u16) -> Self {
        self.alert_open_timeout_secs = secs;
        self
    }

    /// Set the night window as minutes of day.
    pub fn with_night_window(mut self, start: u16, end: u16) -> Self {
        self.alert_night_start = start;
        self.alert_night_end = end;
        self
    }

    /// Set the time zone offset in hours. Offsets outside UTC-12..UTC+14
    /// store the default.
    pub fn with_time_zone(mut self, hours: f32) -> Self {
        self.time_zone = zone_or_default(hours);
        self
    }

    /// Apply an update string such as `rdt=500|mtt=6000`.
    ///
    /// Every assignment is validated before anything is written: a segment
    /// without `=`, an unknown key, or a value that is not a number rejects
    /// the whole update and leaves the config untouched. Numeric values
    /// outside a field's range store the field default. `ver` is accepted
    /// and ignored.
    ///
    /// Returns the number of fields whose value changed.
    pub fn apply_update(&mut self, update: &str) -> Result<usize, ConfigError> {
        if update.trim().is_empty() {
            return Err(ConfigError::Empty);
        }

        // Validate into a scratch copy so a late error leaves `self` intact.
        let mut staged = self.clone();
        for segment in update.split('|') {
            let (key, value) = segment
                .split_once('=')
                .ok_or(ConfigError::MissingAssignment)?;
            staged.assign(parse_assignment(key.trim(), value.trim())?);
        }

        let changed = staged.changed_fields(self);
        *self = staged;
        Ok(changed)
    }

    fn assign(&mut self, assignment: Assignment) {
        match assignment {
            Assignment::ReadTime(v) => self.read_time_ms = v,
            Assignment::MotionTime(v) => self.motion_time_ms = v,
            Assignment::RelayTime(v) => self.relay_time_ms = v,
            Assignment::RelayPause(v) => self.relay_pause_ms = v,
            Assignment::SensorReads(v) => self.sensor_reads = v,
            Assignment::SensorThreshold(v) => self.sensor_threshold = v,
            Assignment::AlertOpenTimeout(v) => self.alert_open_timeout_secs = v,
            Assignment::AlertNightStart(v) => self.alert_night_start = v,
            Assignment::AlertNightEnd(v) => self.alert_night_end = v,
            Assignment::TimeZone(v) => self.time_zone = v,
            Assignment::Version => {}
        }
    }

    fn changed_fields(&self, before: &Self) -> usize {
        [
            self.read_time_ms != before.read_time_ms,
            self.motion_time_ms != before.motion_time_ms,
            self.relay_time_ms != before.relay_time_ms,
            self.relay_pause_ms != before.relay_pause_ms,
            self.sensor_reads != before.sensor_reads,
            self.sensor_threshold != before.sensor_threshold,
            self.alert_open_timeout_secs != before.alert_open_timeout_secs,
            self.alert_night_start != before.alert_night_start,
            self.alert_night_end != before.alert_night_end,
            self.time_zone.to_bits() != before.time_zone.to_bits(),
        ]
        .iter()
        .filter(|changed| **changed)
        .count()
    }

    /// Time zone offset in whole seconds.
    ///
    /// The field is public, so a value outside UTC-12..UTC+14 is read as
    /// the default here too.
    pub fn time_zone_secs(&self) -> i64 {
        (zone_or_default(self.time_zone) * 3600.0) as i64
    }
}

fn zone_or_default(hours: f32) -> f32 {
    if TIME_ZONE_RANGE.contains(&hours) {
        hours
    } else {
        DEFAULT_TIME_ZONE
    }
}

fn parse_int(value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidValue)
}

fn ranged<T: TryFrom<i64>>(value: i64, range: RangeInclusive<i64>, default: T) -> T {
    if range.contains(&value) {
        T::try_from(value).unwrap_or(default)
    } else {
        default
    }
}

fn parse_assignment(key: &str, value: &str) -> Result<Assignment, ConfigError> {
    let assignment = match key {
        "rdt" => Assignment::ReadTime(ranged(
            parse_int(value)?,
            READ_TIME_RANGE,
            DEFAULT_READ_TIME_MS,
        )),
        "mtt" => Assignment::MotionTime(ranged(
            parse_int(value)?,
            MOTION_TIME_RANGE,
            DEFAULT_MOTION_TIME_MS,
        )),
        "rlt" => Assignment::RelayTime(ranged(
            parse_int(value)?,
            RELAY_TIME_RANGE,
            DEFAULT_RELAY_TIME_MS,
        )),
        "rlp" => Assignment::RelayPause(ranged(
            parse_int(value)?,
            RELAY_PAUSE_RANGE,
            DEFAULT_RELAY_PAUSE_MS,
        )),
        "srr" => Assignment::SensorReads(ranged(
            parse_int(value)?,
            SENSOR_READS_RANGE,
            DEFAULT_SENSOR_READS,
        )),
        "srt" => Assignment::SensorThreshold(ranged(
            parse_int(value)?,
            SENSOR_THRESHOLD_RANGE,
            DEFAULT_SENSOR_THRESHOLD,
        )),
        "aot" => Assignment::AlertOpenTimeout(parse_u16(value)?),
        "ans" => Assignment::AlertNightStart(parse_u16(value)?),
        "ane" => Assignment::AlertNightEnd(parse_u16(value)?),
        "tzo" => {
            let hours = value.parse::<f32>().map_err(|_| ConfigError::InvalidValue)?;
            if !hours.is_finite() {
                return Err(ConfigError::InvalidValue);
            }
            Assignment::TimeZone(zone_or_default(hours))
        }
        "ver" => Assignment::Version,
        _ => return Err(ConfigError::UnknownField),
    };
    Ok(assignment)
}

fn parse_u16(value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidValue)
}

impl fmt::Display for DoorConfig {
    /// Renders the same compact format accepted by [`DoorConfig::apply_update`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ver={}.{}|rdt={}|mtt={}|rlt={}|rlp={}|srr={}|srt={}|aot={}|ans={}|ane={}|tzo={:.1}",
            CONFIG_VERSION.0,
            CONFIG_VERSION.1,
            self.read_time_ms,
            self.motion_time_ms,
            self.relay_time_ms,
            self.relay_pause_ms,
            self.sensor_reads,
            self.sensor_threshold,
            self.alert_open_timeout_secs,
            self.alert_night_start,
            self.alert_night_end,
            self.time_zone,
        )
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Door controller configuration
    pub door: DoorConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set door configuration
    pub fn with_door(mut self, door: DoorConfig) -> Self {
        self.door = door;
        self
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic prefix for all pub/sub (e.g., "garage" -> "garage/state")
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Whether MQTT is enabled
    pub enabled: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: 1883,
            client_id: short_string("rs-garage"),
            topic_prefix: short_string("garage"),
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 30,
            enabled: true,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Enable or disable MQTT
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build a topic string with the configured prefix
    pub fn topic(&self, suffix: &str) -> LongString {
        let mut topic = LongString::new();
        let _ = topic.push_str(self.topic_prefix.as_str());
        let _ = topic.push('/');
        let _ = topic.push_str(suffix);
        topic
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Whether WiFi is enabled
    pub enabled: bool,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            enabled: true,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Enable or disable WiFi
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
