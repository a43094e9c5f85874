//! # Radio UI Protocol
//!
//! Wire-level pieces of the radio's serial UI protocol. The link carries two independent
//! directions:
//!
//! - **Command frames** (host → radio): `AB CD <len> <xor(cmd, prm_len, payload, crc)> DC BA`,
//!   produced by [`cipher::encode_frame`].
//! - **UI packets** (radio → host): `B5 <kind> <v1> <v2> <v3> <len> <data...>`, interleaved
//!   on the same stream with `AB CD` acknowledgement frames. [`parser::StreamParser`] tracks
//!   both sync families and yields only the UI packets.
//!
//! ```rust
//! use k5dock::protocol::{encode_frame, StreamParser, CMD_GET_SCREEN};
//!
//! let frame = encode_frame(CMD_GET_SCREEN, &[]);
//! assert_eq!(&frame[..2], &[0xAB, 0xCD]);
//!
//! let mut parser = StreamParser::new();
//! let packets = parser.push(&[0xB5, 0x05, 0x00, 0x07, 0x00, 0x00]);
//! assert_eq!(packets.len(), 1);
//! ```

pub mod cipher;
pub mod keys;
pub mod parser;

pub use cipher::{crc16, decode_frame, encode_frame, xor_crypt};
pub use keys::Key;
pub use parser::{RawUiPacket, StreamParser};

/// Frame start sequence for command and acknowledgement frames.
pub const FRAME_START: [u8; 2] = [0xAB, 0xCD];

/// Frame end sequence.
pub const FRAME_END: [u8; 2] = [0xDC, 0xBA];

/// Sync byte opening every UI telemetry packet.
pub const UI_SYNC: u8 = 0xB5;

/// Key press command; payload is the 2-byte little-endian keycode.
pub const CMD_KEYPRESS: u16 = 0x0801;

/// Ask the radio to redraw (and therefore re-send) its whole screen.
pub const CMD_GET_SCREEN: u16 = 0x0803;

/// XOR stream applied to the body of command frames.
pub const XOR_KEY: [u8; 16] = [
    0x16, 0x6c, 0x14, 0xe6, 0x2e, 0x91, 0x0d, 0x40, 0x21, 0x35, 0xd5, 0x40, 0x13, 0x03, 0xe9, 0x80,
];

/// Default baud rate for the radio UART.
pub const DEFAULT_BAUD: u32 = 38400;

/// Width of one logical screen row in dock coordinates.
pub const LCD_WIDTH: u16 = 128;
