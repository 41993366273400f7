//! Sliding window over the power stream

use std::io::{self, Read};

use super::demod::PowerComputer;

/// Power values read from the source per batch
pub const BATCH_SIZE: usize = 1 << 16;

/// Fixed-size window over the most recent power values.
///
/// Values live in an arena of two batches, indexed by absolute stream
/// position modulo the arena length. A new batch is read into the half
/// that no longer overlaps the window.
pub struct PowerWindow<R> {
    computer: PowerComputer<R>,
    arena: Vec<u64>,
    batch_size: usize,
    window_size: usize,
    /// Stream offset of the first window value
    position: u64,
    /// Number of power values read so far
    available: u64,
    exhausted: bool,
}

impl<R: Read> PowerWindow<R> {
    /// Panics if `window_size` is not in `1..=65536`.
    pub fn new(reader: R, window_size: usize) -> io::Result<Self> {
        Self::with_batch_size(reader, window_size, BATCH_SIZE)
    }

    /// Window reading `batch_size` values at a time.
    ///
    /// Panics if `window_size` is not in `1..=batch_size` or if `batch_size`
    /// is not a positive multiple of 8.
    pub fn with_batch_size(reader: R, window_size: usize, batch_size: usize) -> io::Result<Self> {
        assert!(
            window_size > 0 && window_size <= batch_size,
            "window size {} out of range 1..={}",
            window_size,
            batch_size
        );
        let mut window = Self {
            computer: PowerComputer::new(reader, batch_size),
            arena: vec![0; 2 * batch_size],
            batch_size,
            window_size,
            position: 0,
            available: 0,
            exhausted: false,
        };
        window.fill()?;
        Ok(window)
    }

    pub fn size(&self) -> usize {
        self.window_size
    }

    /// Stream offset of the first value of the window
    pub fn position(&self) -> u64 {
        self.position
    }

    /// False once the stream ended before the window could be filled
    pub fn is_full(&self) -> bool {
        self.position + self.window_size as u64 <= self.available
    }

    /// Value at index `i` of the window; panics unless `i < size()`.
    #[inline]
    pub fn get(&self, i: usize) -> u64 {
        assert!(
            i < self.window_size,
            "window index {} out of range for size {}",
            i,
            self.window_size
        );
        let index = (self.position + i as u64) % self.arena.len() as u64;
        self.arena[index as usize]
    }

    pub fn advance(&mut self) -> io::Result<()> {
        self.position += 1;
        self.fill()
    }

    /// Advance by `offset` values; panics if `offset` is zero.
    pub fn advance_by(&mut self, offset: usize) -> io::Result<()> {
        assert!(offset > 0, "window offset must be positive");
        self.position += offset as u64;
        self.fill()
    }

    /// Read batches until the window is covered or the stream ends
    fn fill(&mut self) -> io::Result<()> {
        while !self.exhausted && !self.is_full() {
            let half = ((self.available / self.batch_size as u64) % 2) as usize;
            let start = half * self.batch_size;
            let count = self
                .computer
                .read_batch(&mut self.arena[start..start + self.batch_size])?;
            self.available += count as u64;
            if count < self.batch_size {
                self.exhausted = true;
            }
        }
        Ok(())
    }
}
