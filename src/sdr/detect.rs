//! ADS-B preamble detection and frame extraction
//!
//! Power values are spaced 100 ns apart. A Mode S preamble consists of four
//! 0.5 µs pulses starting at 0, 1, 3.5 and 4.5 µs, i.e. power offsets 0,
//! 10, 35 and 45. The 112 data bits follow at 8 µs (offset 80), each bit
//! taking 1 µs with its pulse either in the first half (1) or the second
//! half (0).

use std::io::{self, Read};

use tracing::{debug, trace};

use super::window::{PowerWindow, BATCH_SIZE};
use crate::adsb::raw::{RawFrame, DF_EXTENDED_SQUITTER, FRAME_LENGTH};

/// Window length, long enough for a preamble and a 112-bit frame
pub const WINDOW_SIZE: usize = 1200;

/// Time between two power values
const SAMPLE_PERIOD_NS: u64 = 100;

/// Offsets of the preamble pulses, sampled one value after the window start
const PULSE_OFFSETS: [usize; 4] = [1, 11, 36, 46];
/// Offsets between the preamble pulses
const VALLEY_OFFSETS: [usize; 6] = [5, 15, 20, 25, 30, 40];

const DATA_OFFSET: usize = 80;
const BIT_LENGTH: usize = 10;
const HALF_BIT_LENGTH: usize = 5;
const DF_BITS: usize = 5;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectorStats {
    /// Stream position reached by the window
    pub positions_scanned: u64,
    pub preambles_detected: u64,
    pub frames_decoded: u64,
    pub crc_errors: u64,
}

/// Pulls CRC-checked DF17 frames out of a sample stream
pub struct Demodulator<R> {
    window: PowerWindow<R>,
    sigma_p_minus_one: u64,
    sigma_p0: u64,
    stats: DetectorStats,
}

impl<R: Read> Demodulator<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_batch_size(reader, BATCH_SIZE)
    }

    pub fn with_batch_size(reader: R, batch_size: usize) -> io::Result<Self> {
        Ok(Self {
            window: PowerWindow::with_batch_size(reader, WINDOW_SIZE, batch_size)?,
            sigma_p_minus_one: 0,
            sigma_p0: 0,
            stats: DetectorStats::default(),
        })
    }

    /// Next valid frame, or `None` at end of stream
    pub fn next_frame(&mut self) -> io::Result<Option<RawFrame>> {
        self.next_frame_within(u64::MAX)
    }

    /// Next valid frame among the next `max_positions` window positions.
    ///
    /// `None` means either the end of the stream (see [`is_finished`]) or that
    /// the scan gave up, in which case the next call resumes where it stopped.
    ///
    /// [`is_finished`]: Demodulator::is_finished
    pub fn next_frame_within(&mut self, max_positions: u64) -> io::Result<Option<RawFrame>> {
        let mut scanned = 0u64;
        while self.window.is_full() && scanned < max_positions {
            scanned += 1;
            let sigma_p1 = self.sum_at(&PULSE_OFFSETS);
            let sigma_v = self.sum_at(&VALLEY_OFFSETS);

            if self.sigma_p_minus_one < self.sigma_p0
                && self.sigma_p0 > sigma_p1
                && self.sigma_p0 >= 2 * sigma_v
                && self.downlink_format() == DF_EXTENDED_SQUITTER
            {
                self.stats.preambles_detected += 1;
                let timestamp_ns = self.window.position() * SAMPLE_PERIOD_NS;

                match RawFrame::new(timestamp_ns, &self.frame_bytes()) {
                    Ok(frame) => {
                        trace!(
                            "Frame detected at position {}: {}",
                            self.window.position(),
                            frame.bytes()
                        );
                        self.stats.frames_decoded += 1;

                        // Skip past this frame
                        self.window.advance_by(WINDOW_SIZE)?;
                        self.sigma_p_minus_one = 0;
                        self.sigma_p0 = 0;
                        return Ok(Some(frame));
                    }
                    Err(e) => {
                        // Sample the log to avoid spam
                        self.stats.crc_errors += 1;
                        if self.stats.crc_errors <= 10 || self.stats.crc_errors % 50 == 0 {
                            debug!(
                                "Candidate #{} at position {} rejected: {}",
                                self.stats.crc_errors,
                                self.window.position(),
                                e
                            );
                        }
                    }
                }
            }

            self.sigma_p_minus_one = self.sigma_p0;
            self.sigma_p0 = sigma_p1;
            self.window.advance()?;
        }
        Ok(None)
    }

    /// True once the stream ended
    pub fn is_finished(&self) -> bool {
        !self.window.is_full()
    }

    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            positions_scanned: self.window.position(),
            ..self.stats
        }
    }

    fn sum_at(&self, offsets: &[usize]) -> u64 {
        offsets.iter().map(|&i| self.window.get(i)).sum()
    }

    /// Bit `i` of the frame: 1 if the pulse is in the first half of the bit
    #[inline]
    fn bit(&self, i: usize) -> u8 {
        let start = DATA_OFFSET + BIT_LENGTH * i;
        (self.window.get(start) >= self.window.get(start + HALF_BIT_LENGTH)) as u8
    }

    fn downlink_format(&self) -> u8 {
        (0..DF_BITS).fold(0, |df, i| (df << 1) | self.bit(i))
    }

    fn frame_bytes(&self) -> [u8; FRAME_LENGTH] {
        let mut bytes = [0u8; FRAME_LENGTH];
        for (byte_idx, byte) in bytes.iter_mut().enumerate() {
            *byte = (0..8).fold(0, |b, bit_idx| (b << 1) | self.bit(byte_idx * 8 + bit_idx));
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};
    use std::io::Cursor;

    const AMPLITUDE: i32 = 1000;

    /// Sample stream of `total_pairs` sample pairs carrying `frame` with its
    /// preamble detected at window position `offset`
    fn modulate(frame: &[u8], offset: usize, total_pairs: usize) -> Vec<u8> {
        let mut on = vec![false; total_pairs];
        let start = offset - 3;
        let mut pulse = |at: usize| on[at..at + 4].iter_mut().for_each(|p| *p = true);

        for &p in &[0, 10, 35, 45] {
            pulse(start + p);
        }
        for i in 0..FRAME_LENGTH * 8 {
            let bit = (frame[i / 8] >> (7 - i % 8)) & 1;
            let at = start + DATA_OFFSET + BIT_LENGTH * i;
            pulse(if bit == 1 { at } else { at + HALF_BIT_LENGTH });
        }

        let mut words = Vec::with_capacity(total_pairs * 2);
        for (j, &is_on) in on.iter().enumerate() {
            let value = if !is_on {
                0
            } else if j % 2 == 0 {
                AMPLITUDE
            } else {
                -AMPLITUDE
            };
            let word = (2048 + value) as u16;
            words.push(word);
            words.push(word);
        }
        let mut bytes = vec![0; words.len() * 2];
        LittleEndian::write_u16_into(&words, &mut bytes);
        bytes
    }

    fn collect_frames<R: Read>(mut demod: Demodulator<R>) -> Vec<RawFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = demod.next_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_frame() {
        let msg = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        let demod = Demodulator::new(Cursor::new(modulate(&msg, 1000, 4000))).unwrap();
        let frames = collect_frames(demod);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_ns(), 100_000);
        assert_eq!(frames[0].bytes().as_bytes(), &msg[..]);
    }

    #[test]
    fn test_corrupted_frame_is_rejected() {
        let mut msg = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        msg[6] ^= 0x10;
        let mut demod = Demodulator::new(Cursor::new(modulate(&msg, 1000, 4000))).unwrap();
        assert!(demod.next_frame().unwrap().is_none());
        assert!(demod.stats().crc_errors >= 1);
        assert_eq!(demod.stats().frames_decoded, 0);
    }

    #[test]
    fn test_two_frames() {
        let first = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        let second = hex::decode("8D4D2228234994B7284820323B81").unwrap();
        let mut bytes = modulate(&first, 1000, 2500);
        bytes.extend(modulate(&second, 500, 2500));

        let frames = collect_frames(Demodulator::new(Cursor::new(bytes)).unwrap());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_ns(), 100_000);
        assert_eq!(frames[0].bytes().as_bytes(), &first[..]);
        assert_eq!(frames[1].timestamp_ns(), 300_000);
        assert_eq!(frames[1].bytes().as_bytes(), &second[..]);
    }

    #[test]
    fn test_frames_across_batches() {
        let first = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        let second = hex::decode("8D4D2228234994B7284820323B81").unwrap();
        let mut bytes = modulate(&first, 1000, 2500);
        bytes.extend(modulate(&second, 500, 2500));

        let demod = Demodulator::with_batch_size(Cursor::new(bytes), 1600).unwrap();
        let frames = collect_frames(demod);
        let timestamps: Vec<u64> = frames.iter().map(RawFrame::timestamp_ns).collect();
        assert_eq!(timestamps, vec![100_000, 300_000]);
    }

    #[test]
    fn test_frame_needs_full_window() {
        let msg = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();

        let demod = Demodulator::new(Cursor::new(modulate(&msg, 1000, 2199))).unwrap();
        assert!(collect_frames(demod).is_empty());

        let demod = Demodulator::new(Cursor::new(modulate(&msg, 1000, 2200))).unwrap();
        assert_eq!(collect_frames(demod).len(), 1);
    }

    #[test]
    fn test_silence() {
        let mut demod = Demodulator::new(Cursor::new(vec![0u8; 40_000])).unwrap();
        assert!(demod.next_frame().unwrap().is_none());
        assert_eq!(demod.stats().preambles_detected, 0);
        assert_eq!(demod.stats().positions_scanned, 10_000 - WINDOW_SIZE as u64 + 1);
        // End of stream is sticky
        assert!(demod.next_frame().unwrap().is_none());
        assert!(demod.is_finished());
    }

    #[test]
    fn test_scan_in_slices() {
        let msg = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        let mut demod = Demodulator::new(Cursor::new(modulate(&msg, 1000, 4000))).unwrap();

        assert!(demod.next_frame_within(600).unwrap().is_none());
        assert!(!demod.is_finished());
        assert_eq!(demod.stats().positions_scanned, 600);

        let frame = demod.next_frame_within(600).unwrap().unwrap();
        assert_eq!(frame.timestamp_ns(), 100_000);
        assert_eq!(demod.stats().positions_scanned, 1000 + WINDOW_SIZE as u64);

        assert!(demod.next_frame_within(u64::MAX).unwrap().is_none());
        assert!(demod.is_finished());
    }

    #[test]
    fn test_long_stream_with_default_batches() {
        let first = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        let second = hex::decode("8D4D2228234994B7284820323B81").unwrap();
        // Both frames sit at odd positions past a batch boundary
        let mut bytes = modulate(&first, BATCH_SIZE + 3, 100_000);
        bytes.extend(modulate(&second, 2 * BATCH_SIZE - 1, 250_000));
        assert!(bytes.len() / 4 > 5 * BATCH_SIZE);

        let frames = collect_frames(Demodulator::new(Cursor::new(bytes)).unwrap());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_ns(), 6_553_900);
        assert_eq!(frames[0].bytes().as_bytes(), &first[..]);
        assert_eq!(frames[1].timestamp_ns(), 23_107_100);
        assert_eq!(frames[1].bytes().as_bytes(), &second[..]);
    }
}
