//! ADS-B message parser

use std::f64::consts::TAU;

use super::raw::RawFrame;
use super::types::{CallSign, IcaoAddress, Parity};
use crate::bits::{extract_unsigned, test_bit};
use crate::units::{self, angle, length, speed};

/// Callsign character lookup table, `#` marks codes outside the character set
const CALLSIGN_CHARS: &[u8; 64] = b"#ABCDEFGHIJKLMNOPQRSTUVWXYZ##### ###############0123456789######";

/// Bit order of the Gillham altitude code (D1 A1 ... C4 reordered to D A B C)
const GILLHAM_ORDER: [u32; 12] = [4, 2, 0, 10, 8, 6, 5, 3, 1, 11, 9, 7];

/// Normalisation of the 17-bit CPR coordinates
const CPR_SCALE: f64 = (1 << 17) as f64;

/// Aircraft identification and category (type codes 1-4)
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationMessage {
    pub timestamp_ns: u64,
    pub icao_address: IcaoAddress,
    pub category: u8,
    pub call_sign: CallSign,
}

/// Airborne position with barometric or GNSS altitude (type codes 9-18, 20-22)
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMessage {
    pub timestamp_ns: u64,
    pub icao_address: IcaoAddress,
    /// Altitude in meters
    pub altitude: f64,
    pub parity: Parity,
    /// Local longitude in [0, 1)
    pub x: f64,
    /// Local latitude in [0, 1)
    pub y: f64,
}

/// Airborne velocity (type code 19)
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityMessage {
    pub timestamp_ns: u64,
    pub icao_address: IcaoAddress,
    /// Speed in m/s
    pub speed: f64,
    /// Track (ground subtypes) or heading (airborne subtypes) in radians, [0, 2π)
    pub track_or_heading: f64,
}

/// A decoded ADS-B message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Identification(IdentificationMessage),
    Position(PositionMessage),
    Velocity(VelocityMessage),
}

impl Message {
    pub fn timestamp_ns(&self) -> u64 {
        match self {
            Message::Identification(m) => m.timestamp_ns,
            Message::Position(m) => m.timestamp_ns,
            Message::Velocity(m) => m.timestamp_ns,
        }
    }

    pub fn icao_address(&self) -> IcaoAddress {
        match self {
            Message::Identification(m) => m.icao_address,
            Message::Position(m) => m.icao_address,
            Message::Velocity(m) => m.icao_address,
        }
    }
}

/// Dispatches raw frames to the typed decoders
pub struct MessageDecoder;

impl MessageDecoder {
    /// Parse a frame, `None` for unsupported type codes and invalid content
    pub fn parse(frame: &RawFrame) -> Option<Message> {
        match frame.type_code() {
            1..=4 => decode_identification(frame).map(Message::Identification),
            9..=18 | 20..=22 => decode_airborne_position(frame).map(Message::Position),
            19 => decode_airborne_velocity(frame).map(Message::Velocity),
            _ => None,
        }
    }
}

/// Decode callsign and category from type codes 1-4
fn decode_identification(frame: &RawFrame) -> Option<IdentificationMessage> {
    let payload = frame.payload();

    let mut callsign = String::with_capacity(8);
    for start in (0..=42).rev().step_by(6) {
        let code = extract_unsigned(payload, start, 6) as usize;
        match CALLSIGN_CHARS[code] {
            b'#' => return None,
            c => callsign.push(c as char),
        }
    }

    let category = ((14 - frame.type_code()) << 4) | extract_unsigned(payload, 48, 3) as u8;
    let call_sign = CallSign::new(callsign.trim_end()).ok()?;

    Some(IdentificationMessage {
        timestamp_ns: frame.timestamp_ns(),
        icao_address: frame.icao_address(),
        category,
        call_sign,
    })
}

/// Decode airborne position (type codes 9-18, 20-22)
fn decode_airborne_position(frame: &RawFrame) -> Option<PositionMessage> {
    let payload = frame.payload();
    let altitude = decode_altitude(extract_unsigned(payload, 36, 12))?;

    Some(PositionMessage {
        timestamp_ns: frame.timestamp_ns(),
        icao_address: frame.icao_address(),
        altitude,
        parity: Parity::from_bit(test_bit(payload, 34)),
        x: extract_unsigned(payload, 0, 17) as f64 / CPR_SCALE,
        y: extract_unsigned(payload, 17, 17) as f64 / CPR_SCALE,
    })
}

/// Decode the 12-bit altitude field into meters
fn decode_altitude(field: u32) -> Option<f64> {
    let field = field as u64;

    let feet = if test_bit(field, 4) {
        // 25 ft resolution
        let n = (extract_unsigned(field, 5, 7) << 4) | extract_unsigned(field, 0, 4);
        n as i32 * 25 - 1000
    } else {
        // 100 ft resolution, Gillham code
        let gillham = GILLHAM_ORDER
            .iter()
            .fold(0u32, |acc, &i| (acc << 1) | ((field >> i) & 1) as u32) as u64;
        let mut hundreds = gray_decode(extract_unsigned(gillham, 0, 3), 3);
        let five_hundreds = gray_decode(extract_unsigned(gillham, 3, 9), 9);

        match hundreds {
            0 | 5 | 6 => return None,
            7 => hundreds = 5,
            _ => {}
        }
        if five_hundreds & 1 == 1 {
            hundreds = 6 - hundreds;
        }
        -1300 + hundreds as i32 * 100 + five_hundreds as i32 * 500
    };

    Some(units::convert_from(feet as f64, length::FOOT))
}

fn gray_decode(code: u32, size: u32) -> u32 {
    (0..size).fold(0, |decoded, i| decoded ^ (code >> i))
}

/// Decode airborne velocity (type code 19)
fn decode_airborne_velocity(frame: &RawFrame) -> Option<VelocityMessage> {
    let payload = frame.payload();
    let subtype = extract_unsigned(payload, 48, 3);
    let content = extract_unsigned(payload, 21, 22) as u64;

    let (speed_kts, track_or_heading) = match subtype {
        1 | 2 => {
            // Ground speed
            let v_ns = extract_unsigned(content, 0, 10) as i32 - 1;
            let v_ew = extract_unsigned(content, 11, 10) as i32 - 1;
            if v_ns < 0 || v_ew < 0 {
                return None;
            }

            let multiplier = if subtype == 2 { 4.0 } else { 1.0 };
            let speed = (v_ns as f64).hypot(v_ew as f64) * multiplier;

            let sign_ns = if test_bit(content, 10) { -1.0 } else { 1.0 };
            let mut track = (v_ew as f64).atan2(sign_ns * v_ns as f64);
            if test_bit(content, 21) {
                track = TAU - track;
            }
            (speed, track.rem_euclid(TAU))
        }
        3 | 4 => {
            // Airspeed
            if !test_bit(content, 21) {
                return None;
            }
            let airspeed = extract_unsigned(content, 0, 10) as i32 - 1;
            if airspeed < 0 {
                return None;
            }

            let multiplier = if subtype == 4 { 4.0 } else { 1.0 };
            let heading_turns = extract_unsigned(content, 11, 10) as f64 / 1024.0;
            (
                airspeed as f64 * multiplier,
                units::convert_from(heading_turns, angle::TURN),
            )
        }
        _ => return None,
    };

    Some(VelocityMessage {
        timestamp_ns: frame.timestamp_ns(),
        icao_address: frame.icao_address(),
        speed: units::convert_from(speed_kts, speed::KNOT),
        track_or_heading,
    })
}
