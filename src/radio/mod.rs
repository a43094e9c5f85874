//! # Radio Link
//!
//! Connects the protocol codec to a real byte stream.
//!
//! - [`CommandChannel`] / [`Keypad`]: serialized key presses and screen requests. Any
//!   `Write + Send` sink works; with the `serial` feature the sink is the serial port.
//! - [`spawn_ingest`]: reader thread feeding a [`StreamParser`](crate::protocol::StreamParser)
//!   and queueing packets on a tokio channel, drained per tick with [`drain`].
//!
//! ```rust,no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> anyhow::Result<()> {
//! use k5dock::config::KeypadConfig;
//! use k5dock::protocol::Key;
//! use k5dock::radio::{open_serial, CommandChannel, Keypad};
//! use std::time::Duration;
//!
//! let (_reader, writer) = open_serial("/dev/ttyUSB0", 38400, Duration::from_millis(200))?;
//! let keypad = Keypad::new(CommandChannel::new(writer), &KeypadConfig::default());
//! keypad.tap(Key::Menu)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

mod channel;
pub mod errors;
mod ingest;

pub use channel::{CommandChannel, Keypad};
pub use errors::RadioError;
pub use ingest::{drain, run_ingest, spawn_ingest, IngestEvent};

#[cfg(feature = "serial")]
pub use serial::open_serial;

#[cfg(feature = "serial")]
mod serial {
    use log::debug;
    use serialport::SerialPort;
    use std::time::Duration;

    use super::errors::{RadioError, Result};

    /// Open `port_name` 8N1 and return `(reader, writer)` handles onto the same device.
    ///
    /// Reads time out after `timeout`, which bounds how quickly the ingest thread notices a
    /// stop request.
    pub fn open_serial(
        port_name: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<(Box<dyn SerialPort>, Box<dyn SerialPort>)> {
        debug!("Opening serial port {} at {} baud", port_name, baud_rate);
        let serial_err = |e: serialport::Error| RadioError::Serial {
            port: port_name.to_string(),
            reason: e.to_string(),
        };

        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(serial_err)?;

        // Drop whatever the radio emitted before we attached.
        let _ = port.clear(serialport::ClearBuffer::Input);

        let reader = port.try_clone().map_err(serial_err)?;
        debug!("Serial port {} ready", port_name);
        Ok((reader, port))
    }
}
