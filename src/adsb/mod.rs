//! ADS-B message decoding module

pub mod accumulator;
pub mod cpr;
pub mod crc;
pub mod parser;
pub mod raw;
pub mod types;

pub use accumulator::{AircraftStateAccumulator, AircraftStateSetter};
pub use cpr::CprDecoder;
pub use parser::{Message, MessageDecoder};
pub use raw::{FrameError, RawFrame};
pub use types::{CallSign, GeoPos, IcaoAddress, Parity};
