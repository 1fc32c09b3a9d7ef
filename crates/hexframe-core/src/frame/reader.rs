use std::ops::Range;

use super::error::FrameError;

/// Bounds-checked access to the bytes of one field.
pub struct FieldReader<'a> {
    data: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), FrameError> {
        if self.data.len() < needed {
            return Err(FrameError::TooShort {
                needed,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], FrameError> {
        self.data.get(range.clone()).ok_or(FrameError::TooShort {
            needed: range.end,
            actual: self.data.len(),
        })
    }

    /// Leading `N` bytes; trailing bytes beyond `N` are ignored.
    pub fn read_array<const N: usize>(&self) -> Result<[u8; N], FrameError> {
        self.require_len(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(0..N)?);
        Ok(out)
    }

    pub fn read_u8(&self) -> Result<u8, FrameError> {
        self.read_array::<1>().map(u8::from_le_bytes)
    }

    pub fn read_u16_le(&self) -> Result<u16, FrameError> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&self) -> Result<u32, FrameError> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i8(&self) -> Result<i8, FrameError> {
        self.read_array().map(i8::from_le_bytes)
    }

    pub fn read_i16_le(&self) -> Result<i16, FrameError> {
        self.read_array().map(i16::from_le_bytes)
    }

    pub fn read_i32_le(&self) -> Result<i32, FrameError> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_f32_le(&self) -> Result<f32, FrameError> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_f64_le(&self) -> Result<f64, FrameError> {
        self.read_array().map(f64::from_le_bytes)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::FieldReader;
    use crate::frame::error::FrameError;

    #[test]
    fn reads_little_endian_prefix() {
        let reader = FieldReader::new(&[0x34, 0x12, 0xFF]);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u8().unwrap(), 0x34);
    }

    #[test]
    fn signed_reads() {
        let reader = FieldReader::new(&[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(reader.read_i8().unwrap(), -2);
        assert_eq!(reader.read_i16_le().unwrap(), -2);
        assert_eq!(reader.read_i32_le().unwrap(), -2);
    }

    #[test]
    fn short_input_reports_needed_bytes() {
        let reader = FieldReader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read_u32_le(),
            Err(FrameError::TooShort {
                needed: 4,
                actual: 2
            })
        );
        assert!(reader.read_slice(1..5).is_err());
    }

    #[test]
    fn float_reads() {
        let f32_bytes = 1.5f32.to_le_bytes();
        let reader = FieldReader::new(&f32_bytes);
        assert_eq!(reader.read_f32_le().unwrap(), 1.5);
        let f64_bytes = (-0.25f64).to_le_bytes();
        let reader = FieldReader::new(&f64_bytes);
        assert_eq!(reader.read_f64_le().unwrap(), -0.25);
    }
}
