//! Incremental parser for the radio → host byte stream.
//!
//! Two packet families share the stream:
//!
//! - `AB CD <len:u16le> <len bytes> <crc:2> DC BA` acknowledgement frames. Content, CRC and the
//!   final trailer byte are not checked; the frame is only walked so its bytes are not
//!   mistaken for UI packets.
//! - `B5 <kind> <v1> <v2> <v3> <len> <len bytes>` UI packets. For kind 6 (status) the length
//!   byte carries the battery reading and the packet has no data bytes.
//!
//! The parser is a byte-at-a-time state machine holding at most one packet in flight, so
//! feeding a stream in any chunking yields the same packets. A byte that fails a sync check
//! drops the machine back to idle; bytes already consumed are never rescanned.

use serde::Serialize;

use super::UI_SYNC;

/// Kind whose length byte is data (battery) rather than a payload size.
const KIND_STATUS: u8 = 6;

/// One decoded UI packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawUiPacket {
    pub kind: u8,
    pub v1: u8,
    pub v2: u8,
    pub v3: u8,
    /// Length byte exactly as received (battery magnitude for kind 6).
    pub declared_len: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AckCd,
    AckLenLo,
    AckLenHi,
    AckData,
    AckCrcLo,
    AckCrcHi,
    AckDc,
    AckBa,
    UiType,
    UiV1,
    UiV2,
    UiV3,
    UiLen,
    UiData,
}

#[derive(Debug)]
pub struct StreamParser {
    state: State,
    ack_len: u16,
    ack_count: u16,
    kind: u8,
    v1: u8,
    v2: u8,
    v3: u8,
    declared_len: u8,
    need: usize,
    buf: Vec<u8>,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            ack_len: 0,
            ack_count: 0,
            kind: 0,
            v1: 0,
            v2: 0,
            v3: 0,
            declared_len: 0,
            need: 0,
            buf: Vec::with_capacity(64),
        }
    }

    /// Drop any partially received packet.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.buf.clear();
    }

    /// True when no packet is partially received.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Push bytes, returning any completed UI packets in stream order.
    pub fn push(&mut self, data: &[u8]) -> Vec<RawUiPacket> {
        data.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Advance the state machine by one byte.
    pub fn feed(&mut self, b: u8) -> Option<RawUiPacket> {
        match self.state {
            State::Idle => {
                self.state = match b {
                    0xAB => State::AckCd,
                    UI_SYNC => State::UiType,
                    _ => State::Idle,
                };
            }

            State::AckCd => {
                self.state = if b == 0xCD {
                    State::AckLenLo
                } else {
                    State::Idle
                };
            }
            State::AckLenLo => {
                self.ack_len = b as u16;
                self.state = State::AckLenHi;
            }
            State::AckLenHi => {
                self.ack_len |= (b as u16) << 8;
                self.ack_count = 0;
                self.state = if self.ack_len == 0 {
                    State::AckCrcLo
                } else {
                    State::AckData
                };
            }
            State::AckData => {
                self.ack_count += 1;
                if self.ack_count >= self.ack_len {
                    self.state = State::AckCrcLo;
                }
            }
            State::AckCrcLo => self.state = State::AckCrcHi,
            State::AckCrcHi => self.state = State::AckDc,
            State::AckDc => {
                self.state = if b == 0xDC { State::AckBa } else { State::Idle };
            }
            // Trailer byte is accepted whatever its value.
            State::AckBa => self.state = State::Idle,

            State::UiType => {
                self.kind = b;
                self.state = State::UiV1;
            }
            State::UiV1 => {
                self.v1 = b;
                self.state = State::UiV2;
            }
            State::UiV2 => {
                self.v2 = b;
                self.state = State::UiV3;
            }
            State::UiV3 => {
                self.v3 = b;
                self.state = State::UiLen;
            }
            State::UiLen => {
                self.declared_len = b;
                self.buf.clear();
                self.need = if self.kind == KIND_STATUS {
                    0
                } else {
                    b as usize
                };
                if self.need == 0 {
                    self.state = State::Idle;
                    return Some(self.take_packet());
                }
                self.state = State::UiData;
            }
            State::UiData => {
                self.buf.push(b);
                if self.buf.len() >= self.need {
                    self.state = State::Idle;
                    return Some(self.take_packet());
                }
            }
        }
        None
    }

    fn take_packet(&mut self) -> RawUiPacket {
        RawUiPacket {
            kind: self.kind,
            v1: self.v1,
            v2: self.v2,
            v3: self.v3,
            declared_len: self.declared_len,
            data: std::mem::take(&mut self.buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_packet_ignores_length_byte() {
        let mut p = StreamParser::new();
        let out = p.push(&[0xB5, 0x06, 0x01, 0x02, 0x00, 0xD2]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].declared_len, 0xD2);
        assert!(out[0].data.is_empty());
        assert!(p.is_idle());
    }

    #[test]
    fn zero_length_ack_frame_skips_data_state() {
        let mut p = StreamParser::new();
        // AB CD 00 00 crc crc DC BA, then a UI packet
        let out = p.push(&[
            0xAB, 0xCD, 0x00, 0x00, 0x11, 0x22, 0xDC, 0xBA, 0xB5, 0x05, 0x00, 0x07, 0x00, 0x00,
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, 5);
    }

    #[test]
    fn ack_frame_hides_ui_sync_in_its_body() {
        let mut p = StreamParser::new();
        let out = p.push(&[0xAB, 0xCD, 0x02, 0x00, 0xB5, 0x05, 0x00, 0x00, 0xDC, 0xBA]);
        assert!(out.is_empty());
        assert!(p.is_idle());
    }

    #[test]
    fn reset_discards_partial_packet() {
        let mut p = StreamParser::new();
        assert!(p.push(&[0xB5, 0x00, 0x10, 0x00, 0x06, 0x03, b'A']).is_empty());
        assert!(!p.is_idle());
        p.reset();
        assert!(p.is_idle());
    }
}
