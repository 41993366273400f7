//! Sample capture and Mode S/ADS-B demodulation
//!
//! 1. Decode 12-bit I/Q samples
//! 2. Combine sample pairs into power values
//! 3. Slide a window over the power stream and detect preambles
//! 4. Extract frames and verify CRC-24

pub mod capture;
pub mod demod;
pub mod detect;
pub mod window;

pub use capture::{Capture, CaptureStats};
pub use demod::{PowerComputer, SampleDecoder};
pub use detect::{Demodulator, DetectorStats};
pub use window::PowerWindow;
