//! Focuser configuration parameters.
//!
//! All tunables for one firmware image.  There is no configuration file
//! and nothing is persisted: the variant and Wi-Fi credentials are baked
//! in at build time (see [`FocuserConfig::from_build_env`]).
//!
//! | Preset                  | Transport | Driver    | v_max | accel |
//! |-------------------------|-----------|-----------|-------|-------|
//! | `default()`             | serial    | 4-wire    | 1000  | 100   |
//! | `duration_diagnostic()` | serial +D | 4-wire    | 1000  | 100   |
//! | `step_dir_driver()`     | serial    | step/dir  | 1000  | 100   |
//! | `wifi()`                | HTTP :80  | 4-wire    | 200   | 50    |

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::commands::ParseMode;
use crate::motion::MAX_STEP_RATE;

/// Errors from [`FocuserConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

/// How the stepper is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorInterface {
    /// Four coil outputs through a ULN2003-style darlington array.
    FourWire,
    /// Step and direction inputs of a dedicated driver (A4988, DRV8825).
    StepDir,
}

/// Which command binding the control loop serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    Serial,
    Http,
}

/// Static IPv4 settings for the Wi-Fi station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticIp {
    pub address: [u8; 4],
    pub gateway: [u8; 4],
    /// Netmask prefix length (24 = 255.255.255.0).
    pub prefix: u8,
}

/// Core focuser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocuserConfig {
    // --- Motion ---
    /// Speed ceiling in steps/s.
    pub max_speed: f32,
    /// Ramp rate in steps/s².
    pub acceleration: f32,
    pub motor_interface: MotorInterface,

    // --- Command channel ---
    pub transport: TransportKind,
    pub parse_mode: ParseMode,
    /// Accept the `D` (last line duration) diagnostic command.
    pub duration_command: bool,
    pub serial_baud: u32,
    pub http_port: u16,

    // --- Network ---
    pub wifi_ssid: String<32>,
    pub wifi_password: String<64>,
    /// `None` uses DHCP.
    pub static_ip: Option<StaticIp>,
    pub hostname: String<32>,

    // --- Diagnostics ---
    /// Loop statistics report interval (seconds, 0 = off).
    pub stats_interval_secs: u32,
}

impl Default for FocuserConfig {
    fn default() -> Self {
        Self {
            max_speed: 1000.0,
            acceleration: 100.0,
            motor_interface: MotorInterface::FourWire,

            transport: TransportKind::Serial,
            parse_mode: ParseMode::Lenient,
            duration_command: false,
            serial_baud: 9600,
            http_port: 80,

            wifi_ssid: String::new(),
            wifi_password: String::new(),
            static_ip: None,
            hostname: bounded("lna-focuser"),

            stats_interval_secs: 60,
        }
    }
}

impl FocuserConfig {
    /// Serial firmware that also answers `D` with the last line's read time.
    pub fn duration_diagnostic() -> Self {
        Self {
            duration_command: true,
            ..Self::default()
        }
    }

    /// Serial firmware for a step/direction driver board.
    pub fn step_dir_driver() -> Self {
        Self {
            motor_interface: MotorInterface::StepDir,
            ..Self::default()
        }
    }

    /// HTTP firmware on the observatory network.
    pub fn wifi() -> Self {
        Self {
            max_speed: 200.0,
            acceleration: 50.0,
            transport: TransportKind::Http,
            wifi_ssid: bounded("LNA"),
            static_ip: Some(StaticIp {
                address: [192, 168, 11, 75],
                gateway: [192, 168, 11, 1],
                prefix: 24,
            }),
            ..Self::default()
        }
    }

    /// Pick a preset by name; unknown names fall back to the serial default.
    pub fn preset(name: &str) -> Self {
        match name {
            "duration" => Self::duration_diagnostic(),
            "stepdir" => Self::step_dir_driver(),
            "wifi" => Self::wifi(),
            _ => Self::default(),
        }
    }

    /// Configuration selected at build time through `FOCUSER_VARIANT`,
    /// `FOCUSER_WIFI_SSID` and `FOCUSER_WIFI_PASSWORD`.
    pub fn from_build_env() -> Self {
        let mut config = Self::preset(option_env!("FOCUSER_VARIANT").unwrap_or("serial"));
        if let Some(ssid) = option_env!("FOCUSER_WIFI_SSID") {
            config.wifi_ssid = bounded(ssid);
        }
        if let Some(password) = option_env!("FOCUSER_WIFI_PASSWORD") {
            config.wifi_password = bounded(password);
        }
        config
    }

    /// Range-check every field the firmware depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(ConfigError::ValidationFailed("max_speed must be positive"));
        }
        if self.max_speed > MAX_STEP_RATE {
            return Err(ConfigError::ValidationFailed("max_speed above step-rate ceiling"));
        }
        if !self.acceleration.is_finite() || self.acceleration <= 0.0 {
            return Err(ConfigError::ValidationFailed("acceleration must be positive"));
        }
        if self.serial_baud == 0 {
            return Err(ConfigError::ValidationFailed("serial_baud must be non-zero"));
        }
        if self.transport == TransportKind::Http {
            if self.wifi_ssid.is_empty() {
                return Err(ConfigError::ValidationFailed("HTTP transport needs a Wi-Fi SSID"));
            }
            if self.http_port == 0 {
                return Err(ConfigError::ValidationFailed("http_port must be non-zero"));
            }
        }
        if let Some(ip) = &self.static_ip {
            if ip.prefix == 0 || ip.prefix > 32 {
                return Err(ConfigError::ValidationFailed("static_ip prefix must be 1..=32"));
            }
        }
        Ok(())
    }

    /// JSON dump for the boot log with the Wi-Fi password masked.
    pub fn to_log_json(&self) -> std::string::String {
        let mut shown = self.clone();
        if !shown.wifi_password.is_empty() {
            shown.wifi_password = bounded("********");
        }
        serde_json::to_string(&shown).unwrap_or_default()
    }
}

/// Copy `s` into a fixed-capacity string, truncating at the capacity.
fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
