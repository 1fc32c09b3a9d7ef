use tracing::warn;

use super::error::FrameError;
use super::reader::FieldReader;
use crate::protocol::{FieldDefinition, FieldType};
use crate::{DecodedField, FieldValue};

/// Decode the data segment of one frame against the field schema.
///
/// Fields are consumed left to right. A variable-length field takes its
/// length from an already decoded field named by `length_field`, or the rest
/// of the segment when there is none. Decoding stops once the offset reaches
/// the end of the segment; a declared length running past the end yields a
/// shorter slice.
///
/// # Errors
/// Returns `FrameError::InvalidLength` when a length field decoded to a value
/// that is not a byte count (negative, fractional or non-numeric).
pub fn decode_fields(
    data: &[u8],
    fields: &[FieldDefinition],
) -> Result<Vec<DecodedField>, FrameError> {
    let mut decoded: Vec<DecodedField> = Vec::with_capacity(fields.len());
    let mut offset = 0usize;

    for field in fields {
        if offset >= data.len() {
            break;
        }
        let len = field_len(field, &decoded, data.len() - offset)?;
        let end = offset.saturating_add(len).min(data.len());
        let value = decode_value(&data[offset..end], field.field_type);
        decoded.push(DecodedField::new(&field.name, field.field_type, value));
        offset = offset.saturating_add(len);
    }

    Ok(decoded)
}

fn field_len(
    field: &FieldDefinition,
    decoded: &[DecodedField],
    remaining: usize,
) -> Result<usize, FrameError> {
    if !field.is_variable() {
        return Ok(field.byte_count);
    }
    let Some(length_field) = field.length_field.as_deref() else {
        return Ok(remaining);
    };
    let Some(length) = decoded.iter().find(|d| d.name() == length_field) else {
        return Ok(remaining);
    };
    length
        .value()
        .as_length()
        .ok_or_else(|| FrameError::InvalidLength {
            field: field.name.clone(),
            length_field: length_field.to_string(),
            value: length.value().to_string(),
        })
}

/// Decode one field's bytes. Numeric types read little-endian and fall back
/// to zero when fewer bytes than their width are available.
///
/// # Examples
/// ```
/// use hexframe_core::{FieldType, FieldValue, decode_value};
///
/// assert_eq!(decode_value(&[0x34, 0x12], FieldType::UInt16), FieldValue::Unsigned(0x1234));
/// assert_eq!(decode_value(&[0x34], FieldType::UInt16), FieldValue::Unsigned(0));
/// assert_eq!(decode_value(b"ok\0\0", FieldType::String), FieldValue::Text("ok".into()));
/// ```
pub fn decode_value(bytes: &[u8], field_type: FieldType) -> FieldValue {
    let reader = FieldReader::new(bytes);
    match field_type {
        FieldType::UInt8 => unsigned(reader.read_u8()),
        FieldType::UInt16 => unsigned(reader.read_u16_le()),
        FieldType::UInt32 => unsigned(reader.read_u32_le()),
        FieldType::Int8 => signed(reader.read_i8()),
        FieldType::Int16 => signed(reader.read_i16_le()),
        FieldType::Int32 => signed(reader.read_i32_le()),
        FieldType::Float32 => float(reader.read_f32_le()),
        FieldType::Float64 => float(reader.read_f64_le()),
        FieldType::Bytes => FieldValue::Bytes(reader.bytes().to_vec()),
        FieldType::String => FieldValue::Text(decode_text(reader.bytes())),
    }
}

fn unsigned<T: Into<u64>>(read: Result<T, FrameError>) -> FieldValue {
    FieldValue::Unsigned(read.map(Into::into).unwrap_or_default())
}

fn signed<T: Into<i64>>(read: Result<T, FrameError>) -> FieldValue {
    FieldValue::Signed(read.map(Into::into).unwrap_or_default())
}

fn float<T: Into<f64>>(read: Result<T, FrameError>) -> FieldValue {
    FieldValue::Float(read.map(Into::into).unwrap_or_default())
}

/// UTF-8, or Latin-1 when the bytes are not valid UTF-8. Trailing NULs are
/// stripped either way.
fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(err) => {
            warn!(error = %err, "string field is not UTF-8, decoding as Latin-1");
            bytes.iter().copied().map(char::from).collect()
        }
    };
    text.trim_end_matches('\0').to_string()
}
