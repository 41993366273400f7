//! Bit field extraction from 64-bit words and byte strings

use std::fmt;
use std::str::FromStr;

/// Error parsing a hexadecimal byte string
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HexError {
    #[error("invalid hexadecimal byte string: {0}")]
    Invalid(#[from] hex::FromHexError),
}

/// Extract the unsigned `size`-bit field starting at bit `start` (bit 0 is
/// the least significant bit) of `value`.
///
/// Panics if `size` is not in `1..32` or if `start..start + size` is not
/// contained in `0..64`.
#[inline]
pub fn extract_unsigned(value: u64, start: usize, size: usize) -> u32 {
    assert!(0 < size && size < 32, "bit field size {} out of range", size);
    assert!(
        start < 64 && size <= 64 - start,
        "bit field {}..{} out of range",
        start,
        start + size
    );
    ((value >> start) & ((1u64 << size) - 1)) as u32
}

/// Test the bit at `index` of `value`.
///
/// Panics if `index` is not in `0..64`.
#[inline]
pub fn test_bit(value: u64, index: usize) -> bool {
    assert!(index < 64, "bit index {} out of range", index);
    (value >> index) & 1 == 1
}

/// Immutable sequence of bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ByteString {
    bytes: Box<[u8]>,
}

impl ByteString {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parse an even-length hexadecimal string
    pub fn from_hex(hex_str: &str) -> Result<Self, HexError> {
        let bytes = hex::decode(hex_str)?;
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Unsigned byte at `index`; panics if out of range
    pub fn byte_at(&self, index: usize) -> u8 {
        assert!(
            index < self.bytes.len(),
            "byte index {} out of range for length {}",
            index,
            self.bytes.len()
        );
        self.bytes[index]
    }

    /// Bytes `from..to` as a big-endian unsigned word.
    ///
    /// Panics if the range is not within the string or spans more than 8 bytes.
    pub fn bytes_in_range(&self, from: usize, to: usize) -> u64 {
        assert!(
            from <= to && to <= self.bytes.len(),
            "byte range {}..{} out of range for length {}",
            from,
            to,
            self.bytes.len()
        );
        assert!(to - from <= 8, "byte range {}..{} wider than 8 bytes", from, to);
        self.bytes[from..to]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.bytes))
    }
}

impl FromStr for ByteString {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_unsigned_matches_shift_and_mask() {
        let values = [0u64, u64::MAX, 0x8D4840D6202CC371, 0x0123_4567_89AB_CDEF];
        for &v in &values {
            for size in 1..32 {
                for start in 0..=(64 - size) {
                    let field = extract_unsigned(v, start, size);
                    assert_eq!(field as u64, (v >> start) & ((1u64 << size) - 1));
                    assert!((field as u64) < (1u64 << size));
                }
            }
        }
    }

    #[test]
    fn test_extract_unsigned_fields() {
        let payload = 0x58B302E6E15FA3u64;
        assert_eq!(extract_unsigned(payload, 51, 5), 11);
        assert_eq!(extract_unsigned(payload, 36, 12), 0xB30);
        assert_eq!(extract_unsigned(payload, 0, 17), 90019);
    }

    #[test]
    #[should_panic]
    fn test_extract_unsigned_rejects_size_32() {
        extract_unsigned(0, 0, 32);
    }

    #[test]
    #[should_panic]
    fn test_extract_unsigned_rejects_size_0() {
        extract_unsigned(0, 0, 0);
    }

    #[test]
    #[should_panic]
    fn test_extract_unsigned_rejects_range_past_64() {
        extract_unsigned(0, 60, 5);
    }

    #[test]
    fn test_test_bit() {
        assert!(test_bit(1 << 63, 63));
        assert!(!test_bit(1 << 63, 62));
        assert!(test_bit(0b100, 2));
    }

    #[test]
    #[should_panic]
    fn test_test_bit_rejects_64() {
        test_bit(0, 64);
    }

    #[test]
    fn test_byte_string_hex_round_trip() {
        let bs = ByteString::from_hex("8d4840d6202cc371c32ce0576098").unwrap();
        assert_eq!(bs.len(), 14);
        assert_eq!(bs.byte_at(0), 0x8D);
        assert_eq!(bs.to_string(), "8D4840D6202CC371C32CE0576098");
        assert_eq!(bs, "8D4840D6202CC371C32CE0576098".parse::<ByteString>().unwrap());
    }

    #[test]
    fn test_byte_string_rejects_odd_length() {
        assert!(ByteString::from_hex("ABC").is_err());
        assert!(ByteString::from_hex("ZZ").is_err());
    }

    #[test]
    fn test_bytes_in_range() {
        let bs = ByteString::from_hex("8D4840D6202CC371C32CE0576098").unwrap();
        assert_eq!(bs.bytes_in_range(1, 4), 0x4840D6);
        assert_eq!(bs.bytes_in_range(4, 11), 0x202CC371C32CE0);
        assert_eq!(bs.bytes_in_range(0, 8), 0x8D4840D6202CC371);
        assert_eq!(bs.bytes_in_range(3, 3), 0);
    }

    #[test]
    #[should_panic]
    fn test_bytes_in_range_rejects_nine_bytes() {
        let bs = ByteString::new(&[0; 14]);
        bs.bytes_in_range(0, 9);
    }

    #[test]
    #[should_panic]
    fn test_byte_at_out_of_range() {
        ByteString::new(&[1, 2]).byte_at(2);
    }
}
