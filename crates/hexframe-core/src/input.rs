//! Hex text input.
//!
//! Users paste captures as free-form hex. Whitespace, `,`, `;`, `:` and `-`
//! are accepted as separators and case is ignored; what remains must be an
//! even number of hex digits.

use serde::Serializer;
use thiserror::Error;

/// Errors returned when hex text cannot be turned into bytes.
///
/// # Examples
/// ```
/// use hexframe_core::{HexError, parse_hex_text};
///
/// let err = parse_hex_text("68 1G 16").unwrap_err();
/// assert!(matches!(err, HexError::InvalidCharacter { character: 'G', .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex character '{character}' at digit {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("hex text must contain an even number of digits, got {digits}")]
    OddLength { digits: usize },
}

impl From<hex::FromHexError> for HexError {
    fn from(value: hex::FromHexError) -> Self {
        match value {
            hex::FromHexError::InvalidHexCharacter { c, index } => HexError::InvalidCharacter {
                character: c,
                position: index,
            },
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                HexError::OddLength { digits: 0 }
            }
        }
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-')
}

/// Convert free-form hex text into bytes.
///
/// Character validation runs before the length check, so `"68 1G 1"` reports
/// the bad digit rather than the odd length.
///
/// # Examples
/// ```
/// use hexframe_core::parse_hex_text;
///
/// let bytes = parse_hex_text("68,05;0a:16-ff\n").unwrap();
/// assert_eq!(bytes, vec![0x68, 0x05, 0x0A, 0x16, 0xFF]);
/// ```
///
/// # Errors
/// Returns `HexError` when a non-hex character remains after separators are
/// removed, or when the digit count is odd.
pub fn parse_hex_text(text: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = text.chars().filter(|c| !is_separator(*c)).collect();

    if let Some((position, character)) = cleaned
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii_hexdigit())
    {
        return Err(HexError::InvalidCharacter {
            character,
            position,
        });
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength {
            digits: cleaned.len(),
        });
    }

    Ok(hex::decode(&cleaned)?)
}

/// Render bytes as space-separated uppercase hex pairs (`"68 05 0A 16"`).
///
/// # Examples
/// ```
/// use hexframe_core::format_hex;
///
/// assert_eq!(format_hex(&[0x68, 0x05, 0x0a]), "68 05 0A");
/// assert_eq!(format_hex(&[]), "");
/// ```
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_hex(bytes))
}
