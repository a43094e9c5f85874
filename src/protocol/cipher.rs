//! Command frame encoding: CRC16, XOR obfuscation and `AB CD ... DC BA` framing.
//!
//! The radio expects
//!
//!   `AB CD <len:u16le> xor(<cmd:u16le> <prm_len:u16le> <payload> <crc:u16le>) DC BA`
//!
//! where `len = 4 + payload.len()` (the CRC is not counted) and the CRC is computed over the
//! plain `cmd ‖ prm_len ‖ payload` bytes before obfuscation.

use bytes::{BufMut, BytesMut};
use crc::{Crc, CRC_16_XMODEM};

use super::{FRAME_END, FRAME_START, XOR_KEY};

/// CRC-16/XMODEM (polynomial 0x1021, MSB first, zero seed), the checksum the radio
/// computes over the plain frame body.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// XOR `data` with the key stream, treating `data[0]` as absolute position `start`.
///
/// Applying it twice with the same `start` returns the original bytes.
pub fn xor_crypt(data: &[u8], start: usize) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[(start + i) & 0x0F])
        .collect()
}

/// Serialize one command into a complete wire frame.
///
/// # Panics
///
/// If `payload` is too long for the 16-bit length field. Keypad and screen commands carry at
/// most two bytes, so this only fires on misuse.
pub fn encode_frame(command: u16, payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= (u16::MAX - 4) as usize,
        "command payload of {} bytes does not fit the frame length field",
        payload.len()
    );
    let prm_len = payload.len() as u16;

    let mut plain = BytesMut::with_capacity(payload.len() + 6);
    plain.put_u16_le(command);
    plain.put_u16_le(prm_len);
    plain.put_slice(payload);
    let crc = crc16(&plain);
    plain.put_u16_le(crc);

    let mut frame = BytesMut::with_capacity(plain.len() + 6);
    frame.put_slice(&FRAME_START);
    frame.put_u16_le(4 + prm_len);
    frame.put_slice(&xor_crypt(&plain, 0));
    frame.put_slice(&FRAME_END);
    frame.to_vec()
}

/// Inverse of [`encode_frame`]: returns `(command, payload)` when `frame` is exactly one
/// well-formed command frame with a matching CRC.
///
/// The radio never echoes command frames in this form; this exists for diagnostics.
pub fn decode_frame(frame: &[u8]) -> Option<(u16, Vec<u8>)> {
    if frame.len() < 12 || frame[..2] != FRAME_START || frame[frame.len() - 2..] != FRAME_END {
        return None;
    }
    let len = u16::from_le_bytes([frame[2], frame[3]]) as usize;
    let body = &frame[4..frame.len() - 2];
    if body.len() != len + 2 {
        return None;
    }
    let plain = xor_crypt(body, 0);
    let (record, crc_bytes) = plain.split_at(len);
    let crc = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    if crc16(record) != crc {
        return None;
    }
    let command = u16::from_le_bytes([record[0], record[1]]);
    let prm_len = u16::from_le_bytes([record[2], record[3]]) as usize;
    if prm_len + 4 != len {
        return None;
    }
    Some((command, record[4..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_of_empty_input_is_zero() {
        assert_eq!(crc16(&[]), 0);
    }

    #[test]
    fn frame_length_field_excludes_crc() {
        let frame = encode_frame(0x0801, &[0x2A, 0x00]);
        assert_eq!(u16::from_le_bytes([frame[2], frame[3]]), 6);
        assert_eq!(frame.len(), 2 + 2 + 6 + 2 + 2);
    }

    #[test]
    fn decode_rejects_corrupted_body() {
        let mut frame = encode_frame(0x0801, &[0x2A, 0x00]);
        frame[6] ^= 0x01;
        assert!(decode_frame(&frame).is_none());
    }
}
