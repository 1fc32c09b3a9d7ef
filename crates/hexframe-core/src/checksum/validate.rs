use tracing::warn;

use super::compute::compute;
use super::error::ChecksumError;
use super::layout::{TAIL_LEN, checksum_range, covered_range};
use crate::protocol::{ChecksumAlgorithm, MAX_CHECKSUM_LENGTH};

/// Outcome of checking one frame's checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumCheck {
    pub valid: bool,
    /// Value computed over the covered range, masked to the algorithm width.
    pub expected: u64,
    /// Value stored in the frame, read little-endian.
    pub actual: u64,
}

impl ChecksumCheck {
    const NOT_CONFIGURED: Self = Self {
        valid: true,
        expected: 0,
        actual: 0,
    };

    const FAILED: Self = Self {
        valid: false,
        expected: 0,
        actual: 0,
    };
}

/// Validate the checksum embedded in `frame`.
///
/// Evaluation problems (frame too short, unsupported width) are reported as
/// an invalid check with both values 0.
///
/// # Examples
/// ```
/// use hexframe_core::ChecksumAlgorithm;
/// use hexframe_core::checksum::validate_frame;
///
/// // 68 | 01 02 | 03 | 16 with sum(01 02) == 03
/// let frame = [0x68, 0x01, 0x02, 0x03, 0x16];
/// let check = validate_frame(&frame, ChecksumAlgorithm::Sum, 0, -2, 1);
/// assert!(check.valid);
/// assert_eq!(check.expected, 0x03);
/// ```
pub fn validate_frame(
    frame: &[u8],
    algorithm: ChecksumAlgorithm,
    start_offset: i64,
    end_offset: i64,
    checksum_length: usize,
) -> ChecksumCheck {
    match try_validate(frame, algorithm, start_offset, end_offset, checksum_length) {
        Ok(check) => check,
        Err(err) => {
            warn!(%algorithm, error = %err, "checksum validation failed");
            ChecksumCheck::FAILED
        }
    }
}

/// Like [`validate_frame`], but surfaces the reason evaluation failed.
pub fn try_validate(
    frame: &[u8],
    algorithm: ChecksumAlgorithm,
    start_offset: i64,
    end_offset: i64,
    checksum_length: usize,
) -> Result<ChecksumCheck, ChecksumError> {
    if algorithm == ChecksumAlgorithm::None {
        return Ok(ChecksumCheck::NOT_CONFIGURED);
    }
    if checksum_length > MAX_CHECKSUM_LENGTH {
        return Err(ChecksumError::UnsupportedLength {
            length: checksum_length,
            max: MAX_CHECKSUM_LENGTH,
        });
    }
    let needed = checksum_length + TAIL_LEN + 1;
    if frame.len() < needed {
        return Err(ChecksumError::FrameTooShort {
            needed,
            actual: frame.len(),
        });
    }

    let stored = checksum_range(frame.len(), checksum_length);
    let actual = read_le(&frame[stored.clone()]);
    let covered = covered_range(frame.len(), stored.start, start_offset, end_offset);
    let expected = compute(&frame[covered], algorithm) & algorithm.mask();

    Ok(ChecksumCheck {
        valid: expected == actual,
        expected,
        actual,
    })
}

fn read_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; MAX_CHECKSUM_LENGTH];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::compute::sum8;

    #[test]
    fn none_is_always_valid() {
        let check = validate_frame(&[], ChecksumAlgorithm::None, 0, -1, 1);
        assert_eq!(check, ChecksumCheck::NOT_CONFIGURED);
    }

    #[test]
    fn short_frame_fails_without_values() {
        let err = try_validate(&[0x68, 0x16], ChecksumAlgorithm::Sum, 0, -1, 1).unwrap_err();
        assert_eq!(
            err,
            ChecksumError::FrameTooShort {
                needed: 3,
                actual: 2
            }
        );
        let check = validate_frame(&[0x68, 0x16], ChecksumAlgorithm::Sum, 0, -1, 1);
        assert_eq!(check, ChecksumCheck::FAILED);
    }

    #[test]
    fn three_byte_frame_is_long_enough_for_one_byte_checksum() {
        // 68 | 68 | 16: checksum covers the header byte only
        let check = validate_frame(&[0x68, 0x68, 0x16], ChecksumAlgorithm::Sum, -1, -2, 1);
        assert!(check.valid);
    }

    #[test]
    fn sum_mismatch_reports_both_values() {
        // 68 05 0A 16, sum over 68 05 == 6D but frame carries 0A
        let check = validate_frame(&[0x68, 0x05, 0x0A, 0x16], ChecksumAlgorithm::Sum, -1, -2, 1);
        assert!(!check.valid);
        assert_eq!(check.expected, 0x6D);
        assert_eq!(check.actual, 0x0A);
    }

    #[test]
    fn default_range_includes_checksum_byte() {
        // start 0, end -1: bytes 1..len-1, which contains the checksum itself
        let frame = [0x68, 0x01, 0x02, 0x03, 0x16];
        let check = validate_frame(&frame, ChecksumAlgorithm::Sum, 0, -1, 1);
        assert_eq!(check.expected, u64::from(sum8(&[0x01, 0x02, 0x03])));
        assert!(!check.valid);
    }

    #[test]
    fn crc16_stored_little_endian() {
        // 68 | 01 03 00 00 00 01 | 84 0A | 16
        let frame = [0x68, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A, 0x16];
        let check = validate_frame(&frame, ChecksumAlgorithm::Crc16, 0, -2, 2);
        assert!(check.valid);
        assert_eq!(check.actual, 0x0A84);
    }

    #[test]
    fn crc32_over_check_string() {
        let mut frame = vec![0x68];
        frame.extend_from_slice(b"123456789");
        frame.extend_from_slice(&0xCBF4_3926u32.to_le_bytes());
        frame.push(0x16);
        let check = validate_frame(&frame, ChecksumAlgorithm::Crc32, 0, -2, 4);
        assert!(check.valid);
        assert_eq!(check.expected, 0xCBF4_3926);
    }

    #[test]
    fn oversized_width_is_rejected() {
        let frame = [0u8; 16];
        let err = try_validate(&frame, ChecksumAlgorithm::Sum, 0, -1, 9).unwrap_err();
        assert!(matches!(err, ChecksumError::UnsupportedLength { length: 9, .. }));
    }

    #[test]
    fn wide_sum_field_compares_against_masked_value() {
        // two-byte checksum field holding 0x0003 for a sum of 0x03
        let frame = [0x68, 0x01, 0x02, 0x03, 0x00, 0x16];
        let check = validate_frame(&frame, ChecksumAlgorithm::Sum, 0, -2, 2);
        assert!(check.valid);
    }
}
