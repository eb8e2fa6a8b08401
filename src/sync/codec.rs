//! Backslash escaping for overlay payloads.
//!
//! The key/value transport cannot carry raw control characters, so the
//! published text is escaped byte by byte: `\` becomes `\\`, newline, carriage
//! return and tab become `\n`, `\r`, `\t`, and every other byte outside
//! printable ASCII becomes `\xhh`. [`unescape`] accepts exactly those forms,
//! which makes the pair a bijection between strings and well-formed payloads.

use crate::error::DecodeError;

/// First line of every stored or published overlay.
pub const ENCODING_CHECK: &str = "#\\ projrc encoding check, line must begin with '#\\ '\n";

/// Prefix of a payload that was escaped twice.
const DOUBLE_ESCAPED: &str = "#\\\\ ";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &b in text.as_bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}

pub fn unescape(payload: &str) -> Result<String, DecodeError> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let Some(&next) = bytes.get(i + 1) else {
            return Err(DecodeError::TrailingBackslash);
        };
        match next {
            b'\\' => out.push(b'\\'),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'x' => {
                let hex = bytes
                    .get(i + 2..i + 4)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or(DecodeError::TruncatedHex { offset: i })?;
                out.push(hex);
                i += 4;
                continue;
            }
            _ => {
                return Err(DecodeError::InvalidEscape {
                    found: payload[i + 1..].chars().next().unwrap_or('\\'),
                    offset: i,
                });
            }
        }
        i += 2;
    }

    String::from_utf8(out).map_err(|_| DecodeError::InvalidUtf8)
}

/// Decode a published payload, rejecting payloads that were escaped twice.
pub fn decode_payload(payload: &str) -> Result<String, DecodeError> {
    let text = unescape(payload)?;
    if text.starts_with(DOUBLE_ESCAPED) {
        return Err(DecodeError::DoubleEscaped);
    }
    Ok(text)
}
