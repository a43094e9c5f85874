use k5dock::config::KeypadConfig;
use k5dock::protocol::{decode_frame, Key, CMD_GET_SCREEN, CMD_KEYPRESS};
use k5dock::radio::{CommandChannel, Keypad};
use std::thread;
use std::time::{Duration, Instant};

const FRAME_LEN_KEY: usize = 14;

/// Split a captured byte stream back into decoded `(command, payload)` frames.
fn frames(bytes: &[u8]) -> Vec<(u16, Vec<u8>)> {
    let mut out = Vec::new();
    let mut rest = bytes;
    while rest.len() >= 4 {
        let len = u16::from_le_bytes([rest[2], rest[3]]) as usize;
        let total = 4 + len + 2 + 2;
        let (frame, tail) = rest.split_at(total);
        out.push(decode_frame(frame).expect("well-formed frame"));
        rest = tail;
    }
    assert!(rest.is_empty(), "trailing bytes {:02x?}", rest);
    out
}

fn keycodes(bytes: &[u8]) -> Vec<u16> {
    frames(bytes)
        .into_iter()
        .map(|(cmd, payload)| {
            assert_eq!(cmd, CMD_KEYPRESS);
            u16::from_le_bytes([payload[0], payload[1]])
        })
        .collect()
}

fn written(channel: &CommandChannel<Vec<u8>>) -> Vec<u8> {
    channel.sink().lock().unwrap().clone()
}

#[test]
fn send_key_writes_golden_frame() {
    let channel = CommandChannel::new(Vec::new());
    channel.send_key(0x2A).unwrap();
    assert_eq!(
        written(&channel),
        vec![0xAB, 0xCD, 0x06, 0x00, 0x17, 0x64, 0x16, 0xE6, 0x04, 0x91, 0xC5, 0x03, 0xDC, 0xBA]
    );
}

#[test]
fn request_screen_writes_get_screen_frame() {
    let channel = CommandChannel::new(Vec::new());
    channel.request_screen().unwrap();
    assert_eq!(frames(&written(&channel)), vec![(CMD_GET_SCREEN, vec![])]);
}

#[test]
fn tap_holds_then_releases() {
    let channel = CommandChannel::new(Vec::new());
    let started = Instant::now();
    channel
        .tap_key(Key::Menu.code(), Some(19), Duration::from_millis(30))
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(keycodes(&written(&channel)), vec![42, 19]);
}

#[test]
fn tap_without_release_sends_single_frame_but_still_waits() {
    let channel = CommandChannel::new(Vec::new());
    let started = Instant::now();
    channel
        .tap_key(Key::Up.code(), None, Duration::from_millis(20))
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(keycodes(&written(&channel)), vec![43]);
}

#[test]
fn concurrent_taps_never_interleave() {
    let channel = CommandChannel::new(Vec::new());
    let handles: Vec<_> = (0..8u16)
        .map(|i| {
            let channel = channel.clone();
            thread::spawn(move || {
                channel
                    .tap_key(32 + i, Some(19), Duration::from_millis(5))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let codes = keycodes(&written(&channel));
    assert_eq!(codes.len(), 16);
    for pair in codes.chunks(2) {
        assert!((32..40).contains(&pair[0]), "press out of place: {:?}", codes);
        assert_eq!(pair[1], 19, "release out of place: {:?}", codes);
    }
    assert_eq!(written(&channel).len(), 16 * FRAME_LEN_KEY);
}

#[test]
fn keypad_uses_configured_keys() {
    let config = KeypadConfig {
        release_key: 21,
        ptt_hold_key: 17,
        keydown_ms: 10,
    };
    let keypad = Keypad::new(CommandChannel::new(Vec::new()), &config);
    keypad.tap(Key::Digit(5)).unwrap();
    keypad.ptt_press().unwrap();
    keypad.ptt_release().unwrap();
    assert_eq!(keycodes(&written(keypad.channel())), vec![37, 21, 17, 21]);
}

#[test]
fn ptt_release_is_noop_without_release_key() {
    let config = KeypadConfig {
        release_key: -1,
        ..KeypadConfig::default()
    };
    let keypad = Keypad::new(CommandChannel::new(Vec::new()), &config);
    keypad.ptt_release().unwrap();
    assert!(written(keypad.channel()).is_empty());

    keypad.tap(Key::Exit).unwrap();
    assert_eq!(keycodes(&written(keypad.channel())), vec![45]);
}

#[test]
fn keydown_below_minimum_is_raised() {
    let config = KeypadConfig {
        keydown_ms: 1,
        ..KeypadConfig::default()
    };
    let keypad = Keypad::new(CommandChannel::new(Vec::new()), &config);
    assert_eq!(keypad.keydown(), Duration::from_millis(10));
}

#[test]
fn wake_taps_wake_key_then_requests_screen() {
    let keypad = Keypad::new(CommandChannel::new(Vec::new()), &KeypadConfig::default());
    let started = Instant::now();
    keypad.wake().unwrap();
    assert!(started.elapsed() >= Duration::from_millis(100));

    let sent = frames(&written(keypad.channel()));
    assert_eq!(
        sent,
        vec![
            (CMD_KEYPRESS, vec![13, 0]),
            (CMD_KEYPRESS, vec![19, 0]),
            (CMD_GET_SCREEN, vec![]),
        ]
    );
}
