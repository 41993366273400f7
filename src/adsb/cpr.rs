//! CPR (Compact Position Reporting) global position decoding

use std::f64::consts::TAU;

use super::types::{GeoPos, Parity};
use crate::units::{self, angle};

/// Latitude zones of even messages
const EVEN_LATITUDE_ZONES: f64 = 60.0;
/// Latitude zones of odd messages
const ODD_LATITUDE_ZONES: f64 = 59.0;

/// Number of longitude zones at latitude `phi` (in turns).
///
/// Returns 1 when the latitude lies beyond the last zone boundary (the
/// `acos` argument leaves its domain near the poles).
fn longitude_zones(phi: f64) -> u32 {
    let cos_phi = (units::convert_from(phi, angle::TURN)).cos();
    let a = (1.0 - (1.0 - (TAU / EVEN_LATITUDE_ZONES).cos()) / (cos_phi * cos_phi)).acos();
    if a.is_nan() {
        1
    } else {
        (TAU / a).floor() as u32
    }
}

/// Re-center an angle in turns from [0, 1) into [-0.5, 0.5)
fn recenter(turns: f64) -> f64 {
    if turns >= 0.5 {
        turns - 1.0
    } else {
        turns
    }
}

fn to_t32(turns: f64) -> f64 {
    units::convert(turns, angle::TURN, angle::T32).round_ties_even()
}

/// Global decoder for even/odd position pairs
pub struct CprDecoder;

impl CprDecoder {
    /// Decode the position from the local coordinates of an even (`x0`,
    /// `y0`) and an odd (`x1`, `y1`) message, all in [0, 1).
    ///
    /// `most_recent` selects the message whose zone the result is expressed
    /// in. Returns `None` if the two messages fall in latitude bands with a
    /// different number of longitude zones, or if the decoded latitude is
    /// out of range.
    pub fn decode(x0: f64, y0: f64, x1: f64, y1: f64, most_recent: Parity) -> Option<GeoPos> {
        let z_phi = (y0 * ODD_LATITUDE_ZONES - y1 * EVEN_LATITUDE_ZONES).round_ties_even();
        let (z_phi0, z_phi1) = if z_phi < 0.0 {
            (z_phi + EVEN_LATITUDE_ZONES, z_phi + ODD_LATITUDE_ZONES)
        } else {
            (z_phi, z_phi)
        };

        let phi_even = recenter((z_phi0 + y0) / EVEN_LATITUDE_ZONES);
        let phi_odd = recenter((z_phi1 + y1) / ODD_LATITUDE_ZONES);
        let (phi, phi_other) = match most_recent {
            Parity::Even => (phi_even, phi_odd),
            Parity::Odd => (phi_odd, phi_even),
        };

        let nl = longitude_zones(phi);
        if nl != longitude_zones(phi_other) {
            return None;
        }

        let lambda = if nl == 1 {
            match most_recent {
                Parity::Even => x0,
                Parity::Odd => x1,
            }
        } else {
            let nl0 = nl as f64;
            let nl1 = nl0 - 1.0;
            let z_lambda = (x0 * nl1 - x1 * nl0).round_ties_even();
            match most_recent {
                Parity::Even => {
                    let z = if z_lambda < 0.0 { z_lambda + nl0 } else { z_lambda };
                    (z + x0) / nl0
                }
                Parity::Odd => {
                    let z = if z_lambda < 0.0 { z_lambda + nl1 } else { z_lambda };
                    (z + x1) / nl1
                }
            }
        };
        let lambda = recenter(lambda);

        let latitude_t32 = to_t32(phi);
        if !GeoPos::is_valid_latitude_t32(latitude_t32 as i64) {
            return None;
        }
        GeoPos::new(to_t32(lambda) as i32, latitude_t32 as i32).ok()
    }
}
