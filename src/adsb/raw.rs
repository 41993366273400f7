//! CRC-checked DF17 frames

use std::fmt;

use super::crc::MODE_S_CRC;
use super::types::IcaoAddress;
use crate::bits::{self, ByteString};

/// Length in bytes of an extended squitter frame
pub const FRAME_LENGTH: usize = 14;

/// Downlink format of ADS-B extended squitters
pub const DF_EXTENDED_SQUITTER: u8 = 17;

/// Raw frame construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("invalid frame length {0}, expected 14")]
    InvalidLength(usize),
    #[error("CRC check failed (remainder {0:06X})")]
    Crc(u32),
}

/// A 14-byte Mode S frame whose CRC-24 is zero
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawFrame {
    timestamp_ns: u64,
    bytes: ByteString,
}

impl RawFrame {
    /// Checked constructor
    pub fn new(timestamp_ns: u64, bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != FRAME_LENGTH {
            return Err(FrameError::InvalidLength(bytes.len()));
        }
        let crc = MODE_S_CRC.crc(bytes);
        if crc != 0 {
            return Err(FrameError::Crc(crc));
        }
        Ok(Self {
            timestamp_ns,
            bytes: ByteString::new(bytes),
        })
    }

    /// Frame if the CRC check passes, `None` otherwise.
    ///
    /// Panics if `bytes` is not exactly 14 bytes long.
    pub fn of(timestamp_ns: u64, bytes: &[u8]) -> Option<Self> {
        assert_eq!(
            bytes.len(),
            FRAME_LENGTH,
            "raw frame must be {} bytes long",
            FRAME_LENGTH
        );
        Self::new(timestamp_ns, bytes).ok()
    }

    /// Frame length announced by the first byte: 14 for DF17, 0 for anything else
    pub fn size(byte0: u8) -> usize {
        if byte0 >> 3 == DF_EXTENDED_SQUITTER {
            FRAME_LENGTH
        } else {
            0
        }
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub fn bytes(&self) -> &ByteString {
        &self.bytes
    }

    pub fn downlink_format(&self) -> u8 {
        self.bytes.byte_at(0) >> 3
    }

    pub fn icao_address(&self) -> IcaoAddress {
        IcaoAddress::from_u32(self.bytes.bytes_in_range(1, 4) as u32)
    }

    /// The 56-bit ME field
    pub fn payload(&self) -> u64 {
        self.bytes.bytes_in_range(4, 11)
    }

    pub fn type_code(&self) -> u8 {
        bits::extract_unsigned(self.payload(), 51, 5) as u8
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFrame{{timestamp={}ns, bytes={}}}", self.timestamp_ns, self.bytes)
    }
}
