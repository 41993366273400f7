//! ADS-B decoding from raw I/Q samples
//!
//! Demodulates 1090 MHz extended squitter frames, decodes identification,
//! airborne position and airborne velocity messages, reconstructs positions
//! from CPR pairs and tracks the state of every aircraft heard.

pub mod adsb;
pub mod aircraft_tracker;
pub mod bits;
pub mod config;
pub mod output;
pub mod registry;
pub mod replay;
pub mod sdr;
pub mod units;

pub use aircraft_tracker::{AircraftState, AircraftTracker};
pub use config::Config;
