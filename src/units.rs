//! Unit constants and conversions
//!
//! Every unit is expressed as a multiple of its base unit (radian, meter,
//! second, meter per second), so converting is a single multiplication.

use std::f64::consts::TAU;

/// Angle units, base unit radian
pub mod angle {
    use super::TAU;

    pub const RADIAN: f64 = 1.0;
    pub const TURN: f64 = TAU;
    pub const DEGREE: f64 = TURN / 360.0;
    /// 2^-32 of a turn
    pub const T32: f64 = TURN / 4_294_967_296.0;
}

/// Length units, base unit meter
pub mod length {
    pub const METER: f64 = 1.0;
    pub const CENTIMETER: f64 = 1e-2;
    pub const KILOMETER: f64 = 1e3;
    pub const INCH: f64 = 2.54 * CENTIMETER;
    pub const FOOT: f64 = 12.0 * INCH;
    pub const NAUTICAL_MILE: f64 = 1852.0;
}

/// Time units, base unit second
pub mod time {
    pub const SECOND: f64 = 1.0;
    pub const MINUTE: f64 = 60.0;
    pub const HOUR: f64 = 60.0 * MINUTE;
}

/// Speed units, base unit meter per second
pub mod speed {
    use super::{length, time};

    pub const KNOT: f64 = length::NAUTICAL_MILE / time::HOUR;
    pub const KILOMETER_PER_HOUR: f64 = length::KILOMETER / time::HOUR;
}

/// Convert `value` expressed in `from` into `to`
#[inline]
pub fn convert(value: f64, from: f64, to: f64) -> f64 {
    value * (from / to)
}

/// Convert `value` expressed in `from` into the base unit
#[inline]
pub fn convert_from(value: f64, from: f64) -> f64 {
    value * from
}

/// Convert `value` expressed in the base unit into `to`
#[inline]
pub fn convert_to(value: f64, to: f64) -> f64 {
    value / to
}
