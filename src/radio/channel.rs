//! Outbound command path: key presses and screen refresh requests.

use log::{debug, trace};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::errors::{RadioError, Result};
use crate::config::KeypadConfig;
use crate::logutil::hex_snippet;
use crate::protocol::keys::WAKE_KEY;
use crate::protocol::{encode_frame, Key, CMD_GET_SCREEN, CMD_KEYPRESS};

/// How long the wake key is held, and the pause before the screen request that follows.
const WAKE_HOLD: Duration = Duration::from_millis(50);

/// Cloneable handle that serializes command frames onto a shared sink.
///
/// Only one frame is written at a time. [`tap_key`](Self::tap_key) keeps the sink locked for
/// the whole press/hold/release sequence, so concurrent taps never interleave.
pub struct CommandChannel<W> {
    sink: Arc<Mutex<W>>,
}

impl<W> Clone for CommandChannel<W> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<W: Write + Send> CommandChannel<W> {
    pub fn new(sink: W) -> Self {
        Self::from_shared(Arc::new(Mutex::new(sink)))
    }

    pub fn from_shared(sink: Arc<Mutex<W>>) -> Self {
        Self { sink }
    }

    /// Shared sink, e.g. for inspecting written bytes in tests.
    pub fn sink(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.sink)
    }

    fn lock(&self) -> Result<MutexGuard<'_, W>> {
        self.sink.lock().map_err(|_| RadioError::LockPoisoned)
    }

    pub fn send_command(&self, command: u16, payload: &[u8]) -> Result<()> {
        let mut sink = self.lock()?;
        write_frame(&mut *sink, command, payload)
    }

    pub fn send_key(&self, code: u16) -> Result<()> {
        self.send_command(CMD_KEYPRESS, &code.to_le_bytes())
    }

    /// Press `code`, hold it for `down`, then send `release` if given.
    pub fn tap_key(&self, code: u16, release: Option<u16>, down: Duration) -> Result<()> {
        let mut sink = self.lock()?;
        write_frame(&mut *sink, CMD_KEYPRESS, &code.to_le_bytes())?;
        thread::sleep(down);
        if let Some(release) = release {
            write_frame(&mut *sink, CMD_KEYPRESS, &release.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn request_screen(&self) -> Result<()> {
        self.send_command(CMD_GET_SCREEN, &[])
    }
}

fn write_frame<W: Write + ?Sized>(sink: &mut W, command: u16, payload: &[u8]) -> Result<()> {
    let frame = encode_frame(command, payload);
    trace!("TX {}", hex_snippet(&frame, 32));
    sink.write_all(&frame)?;
    sink.flush()?;
    debug!(
        "Sent command 0x{:04x} ({} byte payload)",
        command,
        payload.len()
    );
    Ok(())
}

/// Keypad operations with the configured release key, PTT key and hold time.
pub struct Keypad<W> {
    channel: CommandChannel<W>,
    release_key: Option<u16>,
    ptt_hold_key: u16,
    keydown: Duration,
}

impl<W> Clone for Keypad<W> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            release_key: self.release_key,
            ptt_hold_key: self.ptt_hold_key,
            keydown: self.keydown,
        }
    }
}

impl<W: Write + Send> Keypad<W> {
    pub fn new(channel: CommandChannel<W>, config: &KeypadConfig) -> Self {
        Self {
            channel,
            release_key: config.release(),
            ptt_hold_key: config.ptt_hold_key,
            keydown: config.keydown(),
        }
    }

    pub fn channel(&self) -> &CommandChannel<W> {
        &self.channel
    }

    pub fn keydown(&self) -> Duration {
        self.keydown
    }

    pub fn tap(&self, key: Key) -> Result<()> {
        self.tap_for(key, self.keydown)
    }

    pub fn tap_for(&self, key: Key, down: Duration) -> Result<()> {
        debug!("Tap {} (code {}) for {}ms", key, key.code(), down.as_millis());
        self.channel.tap_key(key.code(), self.release_key, down)
    }

    /// Key the transmitter. It stays keyed until [`ptt_release`](Self::ptt_release).
    pub fn ptt_press(&self) -> Result<()> {
        self.channel.send_key(self.ptt_hold_key)
    }

    /// Send the release key; does nothing when no release key is configured.
    pub fn ptt_release(&self) -> Result<()> {
        match self.release_key {
            Some(code) => self.channel.send_key(code),
            None => Ok(()),
        }
    }

    pub fn request_screen(&self) -> Result<()> {
        self.channel.request_screen()
    }

    /// Nudge the radio into redrawing: tap the wake key, pause, request the screen.
    pub fn wake(&self) -> Result<()> {
        self.channel.tap_key(WAKE_KEY, self.release_key, WAKE_HOLD)?;
        thread::sleep(WAKE_HOLD);
        self.channel.request_screen()
    }
}
