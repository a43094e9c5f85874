//! Keypad keycodes understood by the key press command.

use std::fmt;
use std::str::FromStr;

/// Keycode the radio treats as "all keys released".
pub const DEFAULT_RELEASE_KEY: u16 = 19;

/// Keycode that keys the transmitter for as long as it is held. Careful: this transmits.
pub const DEFAULT_PTT_HOLD_KEY: u16 = 16;

/// Keycode tapped at startup to make the radio redraw its screen.
pub const WAKE_KEY: u16 = 13;

/// A physical key on the radio's keypad.
///
/// `Digit` holds 0 to 9; build it from untrusted input with [`Key::digit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Digit(u8),
    Menu,
    Up,
    Down,
    Exit,
    /// `*`
    Scan,
    /// `#`
    Fn,
    PttTap,
    F2,
    F1,
}

impl Key {
    /// Every key in keypad order.
    pub const ALL: [Key; 19] = [
        Key::Digit(1),
        Key::Digit(2),
        Key::Digit(3),
        Key::Digit(4),
        Key::Digit(5),
        Key::Digit(6),
        Key::Digit(7),
        Key::Digit(8),
        Key::Digit(9),
        Key::Scan,
        Key::Digit(0),
        Key::Fn,
        Key::Up,
        Key::Down,
        Key::Menu,
        Key::Exit,
        Key::F1,
        Key::F2,
        Key::PttTap,
    ];

    /// Digit key `d`, or `None` when `d` is not a single decimal digit.
    pub fn digit(d: u8) -> Option<Key> {
        (d <= 9).then_some(Key::Digit(d))
    }

    pub fn code(self) -> u16 {
        match self {
            Key::Digit(d) => {
                debug_assert!(d <= 9, "digit key out of range: {}", d);
                32 + (d.min(9) as u16)
            }
            Key::Menu => 42,
            Key::Up => 43,
            Key::Down => 44,
            Key::Exit => 45,
            Key::Scan => 46,
            Key::Fn => 47,
            Key::PttTap => 48,
            Key::F2 => 49,
            Key::F1 => 50,
        }
    }

    /// Secondary function printed on digit keys (reached with `#` first).
    pub fn function_label(self) -> Option<&'static str> {
        match self {
            Key::Digit(1) => Some("BAND"),
            Key::Digit(2) => Some("A/B"),
            Key::Digit(3) => Some("VFO/MR"),
            Key::Digit(4) => Some("FC"),
            Key::Digit(5) => Some("NOAA"),
            Key::Digit(6) => Some("TX PWR"),
            Key::Digit(7) => Some("VOX"),
            Key::Digit(8) => Some("R"),
            Key::Digit(9) => Some("CALL"),
            Key::Digit(0) => Some("FM"),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Digit(d) => write!(f, "{}", d),
            Key::Menu => f.write_str("MENU"),
            Key::Up => f.write_str("UP"),
            Key::Down => f.write_str("DN"),
            Key::Exit => f.write_str("EXIT"),
            Key::Scan => f.write_str("*"),
            Key::Fn => f.write_str("#"),
            Key::PttTap => f.write_str("PTT"),
            Key::F2 => f.write_str("F2"),
            Key::F1 => f.write_str("F1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase();
        let key = match label.as_str() {
            "MENU" | "ENTER" => Key::Menu,
            "UP" => Key::Up,
            "DN" | "DOWN" => Key::Down,
            "EXIT" | "ESC" => Key::Exit,
            "*" | "SCAN" => Key::Scan,
            "#" | "FN" => Key::Fn,
            "PTT" | "PTT_TAP" => Key::PttTap,
            "F1" => Key::F1,
            "F2" => Key::F2,
            d if d.len() == 1 && d.as_bytes()[0].is_ascii_digit() => {
                return Key::digit(d.as_bytes()[0] - b'0')
                    .ok_or_else(|| UnknownKey(s.trim().to_string()));
            }
            _ => return Err(UnknownKey(s.trim().to_string())),
        };
        Ok(key)
    }
}
