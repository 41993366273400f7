//! ADS-B data types

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::units::{self, angle};

/// Rejected value for one of the validated ADS-B types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidValue {
    #[error("invalid ICAO address {0:?}")]
    IcaoAddress(String),
    #[error("invalid call sign {0:?}")]
    CallSign(String),
    #[error("latitude {0} (T32) outside of [-2^30, 2^30]")]
    Latitude(i32),
}

/// ICAO 24-bit aircraft address, displayed as 6 uppercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IcaoAddress(u32);

impl IcaoAddress {
    pub const LENGTH: usize = 6;

    /// Address from the 24 low bits of `value`
    pub const fn from_u32(value: u32) -> Self {
        Self(value & 0xFF_FFFF)
    }
}

impl fmt::Display for IcaoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl FromStr for IcaoAddress {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == Self::LENGTH
            && s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b));
        if !valid {
            return Err(InvalidValue::IcaoAddress(s.to_string()));
        }
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| InvalidValue::IcaoAddress(s.to_string()))
    }
}

impl Serialize for IcaoAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Flight call sign: up to 8 characters from `A-Z`, `0-9` and space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CallSign(String);

impl CallSign {
    pub const MAX_LENGTH: usize = 8;

    pub fn new(s: impl Into<String>) -> Result<Self, InvalidValue> {
        let s = s.into();
        let valid = s.len() <= Self::MAX_LENGTH
            && s
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b' ');
        if valid {
            Ok(Self(s))
        } else {
            Err(InvalidValue::CallSign(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CallSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CPR format of an airborne position message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even = 0,
    Odd = 1,
}

impl Parity {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Geographic position with both angles stored in T32 (2^-32 turn) units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeoPos {
    longitude_t32: i32,
    latitude_t32: i32,
}

impl GeoPos {
    const MAX_LATITUDE_T32: i64 = 1 << 30;

    pub fn new(longitude_t32: i32, latitude_t32: i32) -> Result<Self, InvalidValue> {
        if Self::is_valid_latitude_t32(latitude_t32 as i64) {
            Ok(Self {
                longitude_t32,
                latitude_t32,
            })
        } else {
            Err(InvalidValue::Latitude(latitude_t32))
        }
    }

    /// True if `latitude_t32` lies within ±90°
    pub fn is_valid_latitude_t32(latitude_t32: i64) -> bool {
        latitude_t32.abs() <= Self::MAX_LATITUDE_T32
    }

    pub fn longitude_t32(&self) -> i32 {
        self.longitude_t32
    }

    pub fn latitude_t32(&self) -> i32 {
        self.latitude_t32
    }

    /// Longitude in radians
    pub fn longitude(&self) -> f64 {
        units::convert_from(self.longitude_t32 as f64, angle::T32)
    }

    /// Latitude in radians
    pub fn latitude(&self) -> f64 {
        units::convert_from(self.latitude_t32 as f64, angle::T32)
    }

    pub fn longitude_deg(&self) -> f64 {
        units::convert(self.longitude_t32 as f64, angle::T32, angle::DEGREE)
    }

    pub fn latitude_deg(&self) -> f64 {
        units::convert(self.latitude_t32 as f64, angle::T32, angle::DEGREE)
    }
}

impl fmt::Display for GeoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}°, {}°)", self.longitude_deg(), self.latitude_deg())
    }
}
