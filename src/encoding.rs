//! Name Encoding
//!
//! Display names are arbitrary Unicode; on-disk names must be safe on every
//! filesystem the store runs on. Every byte of the UTF-8 form that is not an
//! ASCII alphanumeric or one of `- _ , .` is written as `%XX` (uppercase hex).
//! A leading `.` is escaped as well, which keeps `.`/`..` and hidden names
//! (including the ordering sidecar) out of the encoded space.

use thiserror::Error;

/// Malformed escape or non-UTF-8 content in an on-disk name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated escape at byte {position} in '{token}'")]
    TruncatedEscape { token: String, position: usize },

    #[error("unexpected character 0x{byte:02X} in escape at byte {position} in '{token}'")]
    InvalidHexDigit {
        token: String,
        position: usize,
        byte: u8,
    },

    #[error("decoded name of '{0}' is not valid UTF-8")]
    InvalidUtf8(String),
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b',' | b'.')
}

fn hex_digit(nibble: u8) -> char {
    char::from(b"0123456789ABCDEF"[(nibble & 0x0F) as usize])
}

fn nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Encode a display name into a filesystem-safe token.
pub fn encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (index, byte) in name.bytes().enumerate() {
        if is_plain(byte) && !(index == 0 && byte == b'.') {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push(hex_digit(byte >> 4));
            out.push(hex_digit(byte));
        }
    }
    out
}

/// Decode a token produced by [`encode`].
pub fn decode(token: &str) -> Result<String, DecodeError> {
    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        if i + 2 >= bytes.len() {
            return Err(DecodeError::TruncatedEscape {
                token: token.to_string(),
                position: i,
            });
        }
        let mut value = 0u8;
        for offset in 1..=2 {
            let byte = bytes[i + offset];
            let digit = nibble(byte).ok_or_else(|| DecodeError::InvalidHexDigit {
                token: token.to_string(),
                position: i + offset,
                byte,
            })?;
            value = (value << 4) | digit;
        }
        out.push(value);
        i += 3;
    }
    String::from_utf8(out).map_err(|_| DecodeError::InvalidUtf8(token.to_string()))
}
