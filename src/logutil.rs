//! Helpers that keep log lines single-line and bounded: screen text and raw serial bytes.

use std::fmt::Write;

/// Longest preview of screen text emitted in one log line.
const MAX_TEXT_PREVIEW: usize = 64;

/// Escape screen text for logging. Control characters become `\xNN`, backslashes are
/// doubled, and anything past [`MAX_TEXT_PREVIEW`] characters is replaced by an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_TEXT_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_TEXT_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Space-separated hex of at most `max` leading bytes, with `..` when truncated.
pub fn hex_snippet(data: &[u8], max: usize) -> String {
    let mut out = String::with_capacity(max.min(data.len()) * 3 + 2);
    for (i, b) in data.iter().take(max).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(&mut out, "{:02x}", b);
    }
    if data.len() > max {
        out.push_str(" ..");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_bytes() {
        assert_eq!(escape_log("145.500\n"), "145.500\\x0A");
        assert_eq!(escape_log("a\\b"), "a\\\\b");
    }

    #[test]
    fn truncates_long_text() {
        let long = "x".repeat(100);
        let out = escape_log(&long);
        assert_eq!(out.chars().count(), MAX_TEXT_PREVIEW + 1);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn hex_snippet_marks_truncation() {
        assert_eq!(hex_snippet(&[0xab, 0xcd], 8), "ab cd");
        assert_eq!(hex_snippet(&[1, 2, 3], 2), "01 02 ..");
        assert_eq!(hex_snippet(&[], 4), "");
    }
}
