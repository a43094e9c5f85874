//! # Screen Model
//!
//! Turns decoded UI packets into a mirror of the radio's display: positioned text cells,
//! cursor markers, the active VFO and battery status. The model owns all mutable screen
//! state and is meant to live on a single presentation task; it is never shared with the
//! ingest thread.
//!
//! | kind  | meaning | effect |
//! |-------|---------|--------|
//! | 0–3   | text    | upsert a cell (kind-specific scale, row + 1) |
//! | 5     | clear   | drop cells and cursors on rows `v1..=v2` |
//! | 6     | status  | battery from the length byte, VFO re-derived |
//! | 7     | cursor  | cursor style for row `v1` |
//!
//! Other kinds are passed through as [`ScreenEvent::Unhandled`].

mod events;

pub use events::{
    BatterySample, CellKey, FreqPosition, ScreenCell, ScreenEvent, StatusReport, Vfo,
};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::logutil::escape_log;
use crate::protocol::{RawUiPacket, LCD_WIDTH};
use log::debug;

const KIND_CLEAR: u8 = 5;
const KIND_STATUS: u8 = 6;
const KIND_CURSOR: u8 = 7;

/// Rows below this belong to VFO A.
const VFO_SPLIT_ROW: u16 = 4;

/// Frequencies on rows up to this one are the top readout.
const TOP_FREQ_MAX_ROW: u16 = 2;

const MAX_VOLTS: f64 = 8.4;

/// Split a raw column that may run past the row width into `(x, row)`.
pub fn unpack_xy(v1: u16, v2: u16) -> (u16, u16) {
    let mut x = v1;
    let mut row = v2;
    while x > LCD_WIDTH {
        x -= LCD_WIDTH;
        row += 1;
    }
    (x, row)
}

/// Battery volts and percentage from the status packet's length byte.
///
/// Volts are clamped to a full pack; the percentage is not clamped.
pub fn decode_battery(raw: u8) -> BatterySample {
    BatterySample {
        volts: (raw as f64 * 0.04).min(MAX_VOLTS),
        percent: raw as f64 / 2.1,
    }
}

pub fn looks_like_frequency(text: &str) -> bool {
    text.contains('.') && text.chars().any(|c| c.is_ascii_digit())
}

fn decode_text(data: &[u8]) -> String {
    data.iter()
        .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
        .collect()
}

fn cursor_glyph(style: u8) -> char {
    if style == 0 {
        '▻'
    } else {
        '➤'
    }
}

/// Point-in-time copy of the model's visible state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenSnapshot {
    pub cells: Vec<ScreenCell>,
    pub cursors: BTreeMap<u16, u8>,
    pub vfo: Vfo,
}

#[derive(Debug, Default)]
pub struct ScreenModel {
    cells: BTreeMap<CellKey, ScreenCell>,
    cursors: BTreeMap<u16, u8>,
    // Survives clears so the VFO stays known between redraws.
    last_cursor_row: Option<u16>,
    last_freq_by_row: BTreeMap<u16, String>,
}

impl ScreenModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one packet, returning what changed.
    pub fn apply(&mut self, packet: &RawUiPacket) -> Vec<ScreenEvent> {
        match packet.kind {
            KIND_CLEAR => vec![self.clear_rows(packet.v1 as u16, packet.v2 as u16)],
            KIND_STATUS => vec![ScreenEvent::Status(StatusReport {
                vfo: self.vfo(),
                flags1: packet.v1,
                flags2: packet.v2,
                battery: decode_battery(packet.declared_len),
            })],
            KIND_CURSOR => {
                let row = packet.v1 as u16;
                let style = packet.v2;
                self.cursors.insert(row, style);
                self.last_cursor_row = Some(row);
                vec![ScreenEvent::Cursor {
                    row,
                    style,
                    glyph: cursor_glyph(style),
                }]
            }
            0..=3 => self.apply_text(packet),
            _ => vec![ScreenEvent::Unhandled(packet.clone())],
        }
    }

    fn clear_rows(&mut self, from: u16, to: u16) -> ScreenEvent {
        let in_range = |row: u16| from <= row && row <= to;
        self.cells.retain(|key, _| !in_range(key.row));
        self.cursors.retain(|row, _| !in_range(*row));
        ScreenEvent::RowsCleared { from, to }
    }

    fn apply_text(&mut self, packet: &RawUiPacket) -> Vec<ScreenEvent> {
        let (x, base_row) = unpack_xy(packet.v1 as u16, packet.v2 as u16);
        let text = decode_text(&packet.data);
        let scale = match packet.kind {
            0 => 1.5,
            3 => 2.0,
            _ => packet.v3 as f64 / 6.0,
        };
        let row = base_row + 1;

        let mut events = Vec::with_capacity(2);
        if packet.kind == 3 && looks_like_frequency(&text) {
            if let Some(change) = self.note_frequency(row, &text) {
                events.push(change);
            }
        }

        let key = CellKey {
            kind: packet.kind,
            row,
            x,
        };
        let cell = ScreenCell {
            x,
            row,
            scale,
            text,
        };
        debug!(
            "cell kind={} row={} x={} scale={:.2} text=\"{}\"",
            key.kind,
            row,
            x,
            scale,
            escape_log(&cell.text)
        );
        self.cells.insert(key, cell.clone());
        events.push(ScreenEvent::CellUpsert { key, cell });
        events
    }

    fn note_frequency(&mut self, row: u16, text: &str) -> Option<ScreenEvent> {
        if self.last_freq_by_row.get(&row).map(String::as_str) == Some(text) {
            return None;
        }
        self.last_freq_by_row.insert(row, text.to_string());
        let position = if row <= TOP_FREQ_MAX_ROW {
            FreqPosition::Top
        } else {
            FreqPosition::Bot
        };
        Some(ScreenEvent::FrequencyChange {
            position,
            row,
            text: text.to_string(),
        })
    }

    /// Active VFO: the lowest row with a highlighted cursor, else the last cursor row seen.
    pub fn vfo(&self) -> Vfo {
        let row = self
            .cursors
            .iter()
            .find(|(_, &style)| style != 0)
            .map(|(&row, _)| row)
            .or(self.last_cursor_row);
        match row {
            Some(r) if r < VFO_SPLIT_ROW => Vfo::A,
            Some(_) => Vfo::B,
            None => Vfo::Unknown,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &ScreenCell)> {
        self.cells.iter()
    }

    pub fn cursor_rows(&self) -> &BTreeMap<u16, u8> {
        &self.cursors
    }

    /// Last frequency text reported for `row`, if any.
    pub fn last_frequency(&self, row: u16) -> Option<&str> {
        self.last_freq_by_row.get(&row).map(String::as_str)
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            cells: self.cells.values().cloned().collect(),
            cursors: self.cursors.clone(),
            vfo: self.vfo(),
        }
    }

    /// Plain-text rendering: one line per occupied row, cursor glyph first, cells in x order.
    pub fn text_rows(&self) -> Vec<(u16, String)> {
        let mut rows: BTreeMap<u16, Vec<&ScreenCell>> = BTreeMap::new();
        for cell in self.cells.values() {
            rows.entry(cell.row).or_default().push(cell);
        }
        for row in self.cursors.keys() {
            rows.entry(*row).or_default();
        }

        rows.into_iter()
            .map(|(row, mut cells)| {
                cells.sort_by_key(|c| c.x);
                let glyph = self.cursors.get(&row).map_or(' ', |&s| cursor_glyph(s));
                let texts: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
                (row, format!("{} {}", glyph, texts.join(" ")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(kind: u8, v1: u8, v2: u8, v3: u8, s: &str) -> RawUiPacket {
        RawUiPacket {
            kind,
            v1,
            v2,
            v3,
            declared_len: s.len() as u8,
            data: s.as_bytes().to_vec(),
        }
    }

    #[test]
    fn unpack_without_wrap() {
        assert_eq!(unpack_xy(128, 3), (128, 3));
        assert_eq!(unpack_xy(129, 3), (1, 4));
    }

    #[test]
    fn non_ascii_bytes_become_replacement_chars() {
        let mut p = text(0, 0, 0, 0, "");
        p.data = vec![b'O', 0xFF, b'K'];
        let mut model = ScreenModel::new();
        model.apply(&p);
        let (_, cell) = model.cells().next().unwrap();
        assert_eq!(cell.text, "O\u{FFFD}K");
    }

    #[test]
    fn small_text_scale_follows_v3() {
        let mut model = ScreenModel::new();
        let events = model.apply(&text(1, 10, 0, 9, "MR"));
        match &events[0] {
            ScreenEvent::CellUpsert { cell, .. } => {
                assert_eq!(cell.scale, 1.5);
                assert_eq!(cell.row, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn text_rows_put_cursor_first() {
        let mut model = ScreenModel::new();
        model.apply(&text(0, 20, 0, 0, "B"));
        model.apply(&text(0, 10, 0, 0, "A"));
        model.apply(&RawUiPacket {
            kind: 7,
            v1: 1,
            v2: 1,
            v3: 0,
            declared_len: 0,
            data: Vec::new(),
        });
        assert_eq!(model.text_rows(), vec![(1, "➤ A B".to_string())]);
    }
}
