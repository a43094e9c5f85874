//! Events produced by [`ScreenModel`](super::ScreenModel) for a renderer.

use serde::Serialize;
use std::fmt;

use crate::protocol::RawUiPacket;

/// Identity of one text cell: packet kind, resolved row and resolved column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellKey {
    pub kind: u8,
    pub row: u16,
    pub x: u16,
}

/// One positioned, scaled text element of the mirrored screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenCell {
    pub x: u16,
    pub row: u16,
    pub scale: f64,
    pub text: String,
}

/// Which of the radio's two frequency contexts is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Vfo {
    A,
    B,
    #[serde(rename = "?")]
    Unknown,
}

impl fmt::Display for Vfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vfo::A => "A",
            Vfo::B => "B",
            Vfo::Unknown => "?",
        })
    }
}

/// Battery reading carried in the length byte of a status packet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatterySample {
    pub volts: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub vfo: Vfo,
    pub flags1: u8,
    pub flags2: u8,
    pub battery: BatterySample,
}

/// Screen half a frequency readout sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FreqPosition {
    #[serde(rename = "TOP")]
    Top,
    #[serde(rename = "BOT")]
    Bot,
}

impl fmt::Display for FreqPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FreqPosition::Top => "TOP",
            FreqPosition::Bot => "BOT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScreenEvent {
    CellUpsert {
        key: CellKey,
        cell: ScreenCell,
    },
    /// Rows `from..=to` were wiped (cells and cursors).
    RowsCleared {
        from: u16,
        to: u16,
    },
    Cursor {
        row: u16,
        style: u8,
        glyph: char,
    },
    Status(StatusReport),
    FrequencyChange {
        position: FreqPosition,
        row: u16,
        text: String,
    },
    /// Packet of a kind the model does not interpret.
    Unhandled(RawUiPacket),
}
