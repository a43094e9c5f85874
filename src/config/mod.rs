//! # Configuration
//!
//! TOML configuration for the mirror. Every section and field has a default, so a partial
//! file (or none at all) works; command line flags override file values.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 38400
//! read_timeout_ms = 200
//!
//! [keypad]
//! release_key = 19     # -1 never sends a release
//! ptt_hold_key = 16
//! keydown_ms = 60
//!
//! [display]
//! poll_interval_ms = 20
//! refresh_interval_ms = 0   # 0 disables periodic screen requests
//!
//! [logging]
//! level = "info"
//! # file = "k5dock.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::fs;

use crate::protocol::keys::{DEFAULT_PTT_HOLD_KEY, DEFAULT_RELEASE_KEY};
use crate::protocol::DEFAULT_BAUD;

/// Shortest key hold the radio reliably registers.
const MIN_KEYDOWN_MS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub keypad: KeypadConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path; empty means it must be given on the command line.
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout (ms). Also the upper bound on shutdown latency of the reader.
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD,
            read_timeout_ms: 200,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadConfig {
    /// Keycode sent after every tap; negative disables the release.
    pub release_key: i32,
    pub ptt_hold_key: u16,
    pub keydown_ms: u64,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            release_key: DEFAULT_RELEASE_KEY as i32,
            ptt_hold_key: DEFAULT_PTT_HOLD_KEY,
            keydown_ms: 60,
        }
    }
}

impl KeypadConfig {
    pub fn release(&self) -> Option<u16> {
        u16::try_from(self.release_key).ok()
    }

    /// Tap hold time, never shorter than 10 ms.
    pub fn keydown(&self) -> Duration {
        Duration::from_millis(self.keydown_ms.max(MIN_KEYDOWN_MS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How often queued packets are drained into the screen model (ms).
    pub poll_interval_ms: u64,
    /// Periodic screen request interval (ms); 0 disables.
    pub refresh_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            refresh_interval_ms: 0,
        }
    }
}

impl DisplayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_ms > 0).then(|| Duration::from_millis(self.refresh_interval_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown strings fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::parse(path, &content)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(anyhow!("Failed to read config file {}: {}", path, e)),
        }
    }

    fn parse(path: &str, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
