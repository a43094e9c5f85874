//! Console presentation: turns screen events into output lines and parses typed commands.

use std::str::FromStr;

use crate::protocol::Key;
use crate::screen::{ScreenEvent, ScreenModel};

/// A line typed on the console while mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Tap(Key),
    /// Key the transmitter until [`ConsoleCommand::Release`].
    Hold,
    Release,
    Screen,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = crate::protocol::keys::UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold" => Ok(ConsoleCommand::Hold),
            "release" => Ok(ConsoleCommand::Release),
            "screen" => Ok(ConsoleCommand::Screen),
            "quit" | "q" => Ok(ConsoleCommand::Quit),
            _ => s.parse().map(ConsoleCommand::Tap),
        }
    }
}

pub struct Presenter {
    json: bool,
    keydown_ms: u128,
}

impl Presenter {
    pub fn new(json: bool, keydown_ms: u128) -> Self {
        Self { json, keydown_ms }
    }

    /// Output line for `event`, if it is worth printing.
    ///
    /// JSON mode prints every event; text mode prints frequency changes and status.
    pub fn render(&self, event: &ScreenEvent) -> Option<String> {
        if self.json {
            return serde_json::to_string(event).ok();
        }
        match event {
            ScreenEvent::FrequencyChange { position, text, .. } => {
                Some(format!("FREQ {}: {} MHz", position, text))
            }
            ScreenEvent::Status(status) => Some(format!(
                "VFO={} | flags1=0x{:02X} flags2=0x{:02X} | bat≈{:.2}V ({:.0}%) | keydown={}ms",
                status.vfo,
                status.flags1,
                status.flags2,
                status.battery.volts,
                status.battery.percent,
                self.keydown_ms
            )),
            _ => None,
        }
    }

    /// Text dump of the whole screen, one line per row.
    pub fn dump(&self, model: &ScreenModel) -> Vec<String> {
        if self.json {
            return serde_json::to_string(&model.snapshot())
                .map(|s| vec![s])
                .unwrap_or_default();
        }
        model
            .text_rows()
            .into_iter()
            .map(|(row, line)| format!("{:>2}|{}", row, line))
            .collect()
    }
}
