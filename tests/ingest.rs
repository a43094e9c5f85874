use k5dock::radio::{drain, run_ingest, spawn_ingest, IngestEvent};
use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn ui(kind: u8, v1: u8, v2: u8, v3: u8, data: &[u8]) -> Vec<u8> {
    let mut out = vec![0xB5, kind, v1, v2, v3, data.len() as u8];
    out.extend_from_slice(data);
    out
}

/// Replays scripted read results, then reports end of stream.
struct ScriptedReader {
    steps: VecDeque<io::Result<Vec<u8>>>,
}

impl ScriptedReader {
    fn new(steps: Vec<io::Result<Vec<u8>>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl Read for ScriptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            Some(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }
}

fn kinds(events: &[IngestEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            IngestEvent::Packet(p) => Some(p.kind),
            IngestEvent::Failed(_) => None,
        })
        .collect()
}

#[test]
fn packets_then_single_close_failure() {
    let mut bytes = ui(5, 0, 7, 0, &[]);
    bytes.extend(ui(3, 10, 0, 0, b"145.500"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let stop = AtomicBool::new(false);

    run_ingest(Cursor::new(bytes), &tx, &stop);

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec![5, 3]);
    assert_eq!(
        events.last(),
        Some(&IngestEvent::Failed("stream closed".to_string()))
    );
    assert_eq!(events.len(), 3);
}

#[test]
fn timeouts_are_not_failures() {
    let packet = ui(7, 1, 1, 0, &[]);
    let reader = ScriptedReader::new(vec![
        Err(io::Error::new(io::ErrorKind::TimedOut, "quiet line")),
        Ok(packet[..3].to_vec()),
        Err(io::Error::new(io::ErrorKind::WouldBlock, "nothing yet")),
        Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
        Ok(packet[3..].to_vec()),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    run_ingest(reader, &tx, &AtomicBool::new(false));

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec![7]);
    assert_eq!(
        events.last(),
        Some(&IngestEvent::Failed("stream closed".to_string()))
    );
}

#[test]
fn read_error_is_reported_once() {
    let reader = ScriptedReader::new(vec![
        Ok(ui(5, 0, 7, 0, &[])),
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")),
        Ok(ui(5, 0, 7, 0, &[])),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    run_ingest(reader, &tx, &AtomicBool::new(false));

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    match &events[1] {
        IngestEvent::Failed(msg) => {
            assert!(msg.starts_with("serial read error"), "{}", msg);
            assert!(msg.contains("device unplugged"), "{}", msg);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn stop_flag_prevents_reading() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let stop = AtomicBool::new(true);
    run_ingest(Cursor::new(ui(5, 0, 7, 0, &[])), &tx, &stop);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn dropped_receiver_ends_ingest_quietly() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let reader = ScriptedReader::new(vec![Ok(ui(5, 0, 7, 0, &[]))]);
    run_ingest(reader, &tx, &AtomicBool::new(false));
}

/// Endless quiet line that times out like a serial port with a read timeout.
struct QuietLine;

impl Read for QuietLine {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        std::thread::sleep(Duration::from_millis(5));
        Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
    }
}

#[tokio::test]
async fn spawned_ingest_stops_on_request() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_ingest(QuietLine, tx, Arc::clone(&stop)).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    stop.store(true, Ordering::Relaxed);
    handle.join().unwrap();
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn spawned_ingest_delivers_in_order() {
    let mut bytes = Vec::new();
    for row in 0..5u8 {
        bytes.extend(ui(7, row, 0, 0, &[]));
    }
    let (tx, mut rx) = mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_ingest(Cursor::new(bytes), tx, stop).unwrap();

    let mut rows = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            IngestEvent::Packet(p) => rows.push(p.v1),
            IngestEvent::Failed(msg) => {
                assert_eq!(msg, "stream closed");
                break;
            }
        }
    }
    handle.join().unwrap();
    assert_eq!(rows, vec![0, 1, 2, 3, 4]);
}
