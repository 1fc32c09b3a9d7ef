use crc::{CRC_16_MODBUS, CRC_32_ISO_HDLC, Crc};

use crate::protocol::ChecksumAlgorithm;

/// CRC-16/MODBUS: init `0xFFFF`, reflected polynomial `0xA001`, no final XOR.
const CRC16_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);
/// CRC-32/ISO-HDLC: init `0xFFFFFFFF`, reflected polynomial `0xEDB88320`,
/// final XOR `0xFFFFFFFF`.
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Compute `algorithm` over `data`. `None` always yields 0.
///
/// # Examples
/// ```
/// use hexframe_core::{ChecksumAlgorithm, compute};
///
/// assert_eq!(compute(b"123456789", ChecksumAlgorithm::Crc16), 0x4B37);
/// assert_eq!(compute(b"123456789", ChecksumAlgorithm::Crc32), 0xCBF4_3926);
/// assert_eq!(compute(&[1, 2, 3, 4], ChecksumAlgorithm::Sum), 0x0A);
/// ```
pub fn compute(data: &[u8], algorithm: ChecksumAlgorithm) -> u64 {
    match algorithm {
        ChecksumAlgorithm::None => 0,
        ChecksumAlgorithm::Sum => u64::from(sum8(data)),
        ChecksumAlgorithm::Xor => u64::from(xor8(data)),
        ChecksumAlgorithm::Crc16 => u64::from(CRC16_MODBUS.checksum(data)),
        ChecksumAlgorithm::Crc32 => u64::from(CRC32.checksum(data)),
    }
}

/// Sum of all bytes modulo 256.
pub fn sum8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Running exclusive-or of all bytes.
pub fn xor8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}
