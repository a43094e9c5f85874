//! # k5dock - Screen mirror and remote keypad for handheld radios
//!
//! k5dock speaks the serial UI protocol of Quansheng-style handheld transceivers: it mirrors
//! the radio's display on the host and sends key presses back, the way a docking app does.
//!
//! ## Features
//!
//! - **Command Frames**: XOR-obfuscated, CRC16-protected key press and screen request frames.
//! - **Stream Parsing**: Incremental, self-resynchronizing parser for the interleaved
//!   acknowledgement and UI telemetry packets.
//! - **Screen Model**: Text cells, cursor markers, VFO detection, battery status and
//!   change-only frequency reporting.
//! - **Serial Link**: Reader thread + serialized writer over a USB/UART connection.
//!
//! ## Quick Start
//!
//! ```rust
//! use k5dock::protocol::StreamParser;
//! use k5dock::screen::{ScreenEvent, ScreenModel};
//!
//! let mut parser = StreamParser::new();
//! let mut model = ScreenModel::new();
//!
//! // Big-text frequency at column 10, row 0
//! let bytes = [0xB5, 0x03, 10, 0, 0, 7, b'1', b'4', b'5', b'.', b'5', b'0', b'0'];
//! for packet in parser.push(&bytes) {
//!     for event in model.apply(&packet) {
//!         if let ScreenEvent::FrequencyChange { position, text, .. } = event {
//!             println!("FREQ {}: {} MHz", position, text);
//!         }
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`protocol`] - frame codec, stream parser, keycodes
//! - [`screen`] - screen/VFO/battery model built from UI packets
//! - [`radio`] - command channel, keypad, ingest thread, serial port
//! - [`console`] - text/JSON presentation used by the binary
//! - [`config`] - TOML configuration
//!
//! ## Architecture
//!
//! ```text
//!  serial RX ──► ingest thread ──► StreamParser ──► queue ──► ScreenModel ──► console
//!  console/keys ──► Keypad ──► CommandChannel ──► encode_frame ──► serial TX
//! ```

pub mod config;
pub mod console;
pub mod logutil;
pub mod protocol;
pub mod radio;
pub mod screen;
