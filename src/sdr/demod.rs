//! Sample decoding and power computation for I/Q samples
//!
//! The receiver outputs 12-bit samples stored as little-endian 16-bit
//! words. Consecutive sample pairs are combined into instantaneous power
//! values for preamble detection.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};

/// Offset subtracted from raw samples to center them on zero
pub const CENTERING_OFFSET: u16 = 2048;

/// Number of samples combined into each power value
const HISTORY_LENGTH: usize = 8;

/// Fill `buf` from `reader`, stopping early only at end of input
pub(crate) fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Converts raw bytes into centered signed samples, one batch at a time
pub struct SampleDecoder<R> {
    reader: R,
    bytes: Vec<u8>,
}

impl<R: Read> SampleDecoder<R> {
    /// Panics if `batch_size` is zero.
    pub fn new(reader: R, batch_size: usize) -> Self {
        assert!(batch_size > 0, "sample batch size must be positive");
        Self {
            reader,
            bytes: vec![0; batch_size * 2],
        }
    }

    pub fn batch_size(&self) -> usize {
        self.bytes.len() / 2
    }

    /// Decode the next batch into `batch`, returning the number of samples
    /// written. Fewer than `batch_size` samples are returned only at end of
    /// input.
    ///
    /// Panics if `batch` is not exactly `batch_size` long.
    pub fn read_batch(&mut self, batch: &mut [i16]) -> io::Result<usize> {
        assert_eq!(
            batch.len(),
            self.batch_size(),
            "sample batch length must match the decoder batch size"
        );
        let count = read_fully(&mut self.reader, &mut self.bytes)? / 2;
        for (sample, word) in batch.iter_mut().zip(self.bytes[..count * 2].chunks_exact(2)) {
            *sample = LittleEndian::read_u16(word).wrapping_sub(CENTERING_OFFSET) as i16;
        }
        Ok(count)
    }
}

/// Computes power values from sample pairs over the last 8 samples
pub struct PowerComputer<R> {
    decoder: SampleDecoder<R>,
    samples: Vec<i16>,
    history: [i32; HISTORY_LENGTH],
    tail: usize,
}

impl<R: Read> PowerComputer<R> {
    /// Panics if `batch_size` is not a positive multiple of 8.
    pub fn new(reader: R, batch_size: usize) -> Self {
        assert!(
            batch_size > 0 && batch_size % HISTORY_LENGTH == 0,
            "power batch size must be a positive multiple of 8, got {}",
            batch_size
        );
        Self {
            decoder: SampleDecoder::new(reader, batch_size * 2),
            samples: vec![0; batch_size * 2],
            history: [0; HISTORY_LENGTH],
            tail: HISTORY_LENGTH - 1,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.samples.len() / 2
    }

    /// Compute the next batch of power values into `batch`, returning the
    /// number written.
    ///
    /// Panics if `batch` is not exactly `batch_size` long.
    pub fn read_batch(&mut self, batch: &mut [u64]) -> io::Result<usize> {
        assert_eq!(
            batch.len(),
            self.batch_size(),
            "power batch length must match the computer batch size"
        );
        let count = self.decoder.read_batch(&mut self.samples)?;
        let pairs = count / 2;
        for (i, power) in batch.iter_mut().enumerate().take(pairs) {
            self.push(self.samples[2 * i]);
            self.push(self.samples[2 * i + 1]);

            let h = &self.history;
            let p1 = (h[0] - h[2] + h[4] - h[6]) as i64;
            let p2 = (h[1] - h[3] + h[5] - h[7]) as i64;
            *power = (p1 * p1 + p2 * p2) as u64;
        }
        Ok(pairs)
    }

    #[inline(always)]
    fn push(&mut self, sample: i16) {
        self.tail = (self.tail + 1) % HISTORY_LENGTH;
        self.history[self.tail] = sample as i32;
    }
}
