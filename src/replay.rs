//! Replay of pre-demodulated frames
//!
//! Two formats are supported: binary records (8-byte big-endian timestamp in
//! nanoseconds followed by the 14 frame bytes) and `*HEX;` text lines.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use byteorder::{BigEndian, ByteOrder};

use crate::adsb::raw::{RawFrame, FRAME_LENGTH};
use crate::bits::ByteString;
use crate::sdr::demod::read_fully;

/// Size of one binary record
pub const RECORD_LENGTH: usize = 8 + FRAME_LENGTH;

/// Longest uninterrupted sleep of a paced replay
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// One binary replay record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub timestamp_ns: u64,
    pub bytes: [u8; FRAME_LENGTH],
}

impl Record {
    /// The record as a frame, `None` if its CRC is invalid
    pub fn into_frame(self) -> Option<RawFrame> {
        RawFrame::of(self.timestamp_ns, &self.bytes)
    }
}

/// Reads binary replay records
pub struct RecordReader<R> {
    reader: R,
    records_read: u64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            records_read: 0,
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Next record, `None` at end of stream.
    ///
    /// A stream ending inside a record is an `UnexpectedEof` error.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        let mut buf = [0u8; RECORD_LENGTH];
        match read_fully(&mut self.reader, &mut buf)? {
            0 => Ok(None),
            RECORD_LENGTH => {
                self.records_read += 1;
                let mut bytes = [0u8; FRAME_LENGTH];
                bytes.copy_from_slice(&buf[8..]);
                Ok(Some(Record {
                    timestamp_ns: BigEndian::read_u64(&buf[..8]),
                    bytes,
                }))
            }
            n => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "truncated record #{}: {} of {} bytes",
                    self.records_read + 1,
                    n,
                    RECORD_LENGTH
                ),
            )),
        }
    }
}

/// Parse a `*<hex bytes>;` frame log line.
/// Returns the raw message bytes if valid
pub fn parse_hex_line(line: &str) -> Option<ByteString> {
    let line = line.trim();

    // Must start with '*'
    let rest = line.strip_prefix('*')?;

    // Find the semicolon
    let end_idx = rest.find(';')?;
    let hex_str = &rest[..end_idx];

    // Valid lengths: 14 hex chars (7 bytes) or 28 hex chars (14 bytes)
    if hex_str.len() != 14 && hex_str.len() != 2 * FRAME_LENGTH {
        return None;
    }

    ByteString::from_hex(hex_str).ok()
}

/// Sleeps until the wall clock catches up with replayed timestamps
#[derive(Debug)]
pub struct Pacer {
    start: Instant,
}

impl Pacer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time left before `timestamp_ns` is due
    pub fn delay(&self, timestamp_ns: u64) -> Duration {
        Duration::from_nanos(timestamp_ns).saturating_sub(self.start.elapsed())
    }

    /// Sleep until `timestamp_ns` is due, returns false if `running` was
    /// cleared first
    pub fn wait(&self, timestamp_ns: u64, running: &AtomicBool) -> bool {
        loop {
            if !running.load(Ordering::SeqCst) {
                return false;
            }
            let delay = self.delay(timestamp_ns);
            if delay.is_zero() {
                return true;
            }
            thread::sleep(delay.min(WAIT_SLICE));
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}
