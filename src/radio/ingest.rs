//! Inbound path: a dedicated thread reads the serial stream, runs the [`StreamParser`] and
//! queues every UI packet, in order, for the presentation loop.

use log::{debug, error, info, trace};
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use crate::logutil::hex_snippet;
use crate::protocol::{RawUiPacket, StreamParser};

const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    Packet(RawUiPacket),
    /// The stream broke or closed. Sent once; the ingest thread has ended.
    Failed(String),
}

/// Start the ingest thread. It runs until `stop` is set, the stream fails, or the receiver
/// is dropped.
pub fn spawn_ingest<R>(
    reader: R,
    tx: mpsc::UnboundedSender<IngestEvent>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("k5dock-ingest".to_string())
        .spawn(move || run_ingest(reader, &tx, &stop))
}

/// Blocking ingest loop. The reader's own timeout bounds how long a stop request waits.
pub fn run_ingest<R: Read>(
    mut reader: R,
    tx: &mpsc::UnboundedSender<IngestEvent>,
    stop: &AtomicBool,
) {
    info!("Ingest started");
    let mut parser = StreamParser::new();
    let mut buffer = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Relaxed) {
        let n = match reader.read(&mut buffer) {
            Ok(0) => {
                report_failure(tx, "stream closed".to_string());
                return;
            }
            Ok(n) => n,
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => {
                report_failure(tx, format!("serial read error: {}", e));
                return;
            }
        };

        let chunk = &buffer[..n];
        trace!("RX {} bytes: {}", n, hex_snippet(chunk, 32));
        for packet in parser.push(chunk) {
            debug!(
                "UI packet kind={} v1={} v2={} v3={} len={}",
                packet.kind, packet.v1, packet.v2, packet.v3, packet.declared_len
            );
            if tx.send(IngestEvent::Packet(packet)).is_err() {
                info!("Packet receiver dropped, stopping ingest");
                return;
            }
        }
    }
    info!("Ingest stopped");
}

fn report_failure(tx: &mpsc::UnboundedSender<IngestEvent>, message: String) {
    error!("Ingest terminated: {}", message);
    let _ = tx.send(IngestEvent::Failed(message));
}

/// Take everything queued right now, in arrival order, without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<IngestEvent>) -> Vec<IngestEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
