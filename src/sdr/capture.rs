//! Frame capture thread
//!
//! Reads the configured source (raw samples, binary records or hex lines),
//! decodes every valid frame into a message and hands the messages to the
//! consumer through a bounded queue. The queue blocks when full, so a slow
//! consumer slows the capture down instead of losing messages.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use super::detect::Demodulator;
use super::window::BATCH_SIZE;
use crate::adsb::raw::{DF_EXTENDED_SQUITTER, FRAME_LENGTH};
use crate::adsb::{Message, MessageDecoder, RawFrame};
use crate::config::{Config, InputFormat};
use crate::replay::{parse_hex_line, Pacer, RecordReader};

/// Statistics for capture (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct CaptureStats {
    /// Power values scanned by the demodulator
    pub positions_scanned: AtomicU64,
    pub preambles_detected: AtomicU64,
    /// Frames with a valid CRC
    pub frames_received: AtomicU64,
    pub crc_errors: AtomicU64,
    /// Valid frames that are not DF17 identification, position or velocity
    pub unsupported_frames: AtomicU64,
    pub messages_decoded: AtomicU64,
    /// Input lines that are not frames
    pub lines_rejected: AtomicU64,
}

impl CaptureStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn count_frame(&self, frame: &RawFrame, message: Option<&Message>) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        match message {
            Some(_) => self.messages_decoded.fetch_add(1, Ordering::Relaxed),
            None => {
                trace!("Unsupported frame {}", frame);
                self.unsupported_frames.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    fn count_crc_error(&self) {
        self.crc_errors.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scanned: {} | Preambles: {} | Frames: {} | Messages: {} | Unsupported: {} | CRC errors: {}",
            self.positions_scanned.load(Ordering::Relaxed),
            self.preambles_detected.load(Ordering::Relaxed),
            self.frames_received.load(Ordering::Relaxed),
            self.messages_decoded.load(Ordering::Relaxed),
            self.unsupported_frames.load(Ordering::Relaxed),
            self.crc_errors.load(Ordering::Relaxed)
        )
    }
}

/// Capture controller
pub struct Capture {
    config: Config,
    running: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
}

impl Capture {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            stats: CaptureStats::new(),
        }
    }

    /// Start capturing and return a receiver for decoded messages.
    ///
    /// The receiver disconnects once the source is exhausted.
    pub fn start(&self) -> Result<Receiver<Message>> {
        info!("Starting capture");
        match &self.config.sampler_command {
            Some(command) => info!("  Sampler command: {}", command),
            None if self.config.reads_stdin() => info!("  Input: stdin"),
            None => info!("  Input: {}", self.config.input_path),
        }
        info!("  Format: {:?}", self.config.input_format);

        let (message_tx, message_rx) = bounded::<Message>(self.config.queue_capacity);

        let config = self.config.clone();
        let running = self.running.clone();
        let stats = self.stats.clone();

        running.store(true, Ordering::SeqCst);

        thread::Builder::new()
            .name("adsb-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture(&config, &running, &stats, &message_tx) {
                    error!("Capture error: {:#}", e);
                }
                running.store(false, Ordering::SeqCst);
            })
            .context("Failed to spawn capture thread")?;

        Ok(message_rx)
    }

    /// Stop capturing
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Stopping capture...");
        }
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get statistics
    pub fn stats(&self) -> &Arc<CaptureStats> {
        &self.stats
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main capture loop (runs in dedicated thread)
fn run_capture(
    config: &Config,
    running: &AtomicBool,
    stats: &CaptureStats,
    message_tx: &Sender<Message>,
) -> Result<()> {
    let (reader, mut child) = open_source(config)?;

    let result = match config.input_format {
        InputFormat::Samples => capture_samples(reader, running, stats, message_tx),
        InputFormat::Records => {
            let pacer = config.replay_realtime.then(Pacer::new);
            replay_records(BufReader::new(reader), pacer, running, stats, message_tx)
        }
        InputFormat::Hex => replay_hex_lines(BufReader::new(reader), running, stats, message_tx),
    };

    if let Some(child) = child.as_mut() {
        let _ = child.kill();
        let _ = child.wait();
    }

    info!("Capture stopped. Final stats: {}", stats);
    result
}

/// Open the sample source: a spawned sampler, stdin or a file
fn open_source(config: &Config) -> Result<(Box<dyn Read + Send>, Option<Child>)> {
    if let Some(command) = &config.sampler_command {
        let mut parts = command.split_whitespace();
        let program = parts.next().context("Empty sampler command")?;

        let mut cmd = Command::new(program);
        cmd.args(parts).stdout(Stdio::piped()).stderr(Stdio::piped());
        info!("Executing: {:?}", cmd);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn sampler '{}'", program))?;
        let stdout = child
            .stdout
            .take()
            .context("Failed to capture sampler stdout")?;

        // Spawn stderr reader for logging
        if let Some(stderr) = child.stderr.take() {
            let name = program.to_string();
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if !line.trim().is_empty() {
                        info!("[{}] {}", name, line.trim());
                    }
                }
            });
        }
        return Ok((Box::new(stdout), Some(child)));
    }

    if config.reads_stdin() {
        return Ok((Box::new(io::stdin()), None));
    }
    let file = File::open(&config.input_path)
        .with_context(|| format!("Failed to open input {}", config.input_path))?;
    Ok((Box::new(file), None))
}

/// Parse a frame and queue its message; false once the consumer is gone
fn dispatch(frame: RawFrame, stats: &CaptureStats, message_tx: &Sender<Message>) -> bool {
    // Replayed frames may carry any downlink format
    let message = if frame.downlink_format() == DF_EXTENDED_SQUITTER {
        MessageDecoder::parse(&frame)
    } else {
        None
    };
    stats.count_frame(&frame, message.as_ref());
    match message {
        Some(message) => message_tx.send(message).is_ok(),
        None => true,
    }
}

fn capture_samples<R: Read>(
    reader: R,
    running: &AtomicBool,
    stats: &CaptureStats,
    message_tx: &Sender<Message>,
) -> Result<()> {
    let mut demod = Demodulator::new(reader).context("Failed to read samples")?;
    let mut first_frame = true;

    while running.load(Ordering::SeqCst) {
        // Bounded scans keep the stop flag and the stats fresh during silence
        let frame = demod
            .next_frame_within(BATCH_SIZE as u64)
            .context("Failed to read samples")?;

        let detector = demod.stats();
        stats.positions_scanned.store(detector.positions_scanned, Ordering::Relaxed);
        stats.preambles_detected.store(detector.preambles_detected, Ordering::Relaxed);
        stats.crc_errors.store(detector.crc_errors, Ordering::Relaxed);

        let Some(frame) = frame else {
            if demod.is_finished() {
                info!("End of sample stream after {} positions", detector.positions_scanned);
                break;
            }
            continue;
        };
        if first_frame {
            info!("First frame received: {}", frame);
            first_frame = false;
        }
        if !dispatch(frame, stats, message_tx) {
            debug!("Message queue closed");
            break;
        }
    }
    Ok(())
}

fn replay_records<R: Read>(
    reader: R,
    pacer: Option<Pacer>,
    running: &AtomicBool,
    stats: &CaptureStats,
    message_tx: &Sender<Message>,
) -> Result<()> {
    let mut records = RecordReader::new(reader);

    while running.load(Ordering::SeqCst) {
        let record = match records.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("End of record stream after {} records", records.records_read());
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!("{}", e);
                break;
            }
            Err(e) => return Err(e).context("Failed to read records"),
        };

        if let Some(pacer) = &pacer {
            if !pacer.wait(record.timestamp_ns, running) {
                break;
            }
        }
        let Some(frame) = record.into_frame() else {
            stats.count_crc_error();
            debug!("Record #{} has an invalid CRC", records.records_read());
            continue;
        };
        if !dispatch(frame, stats, message_tx) {
            debug!("Message queue closed");
            break;
        }
    }
    Ok(())
}

/// Frames of a `*HEX;` log, timestamped on arrival
fn replay_hex_lines<R: BufRead>(
    reader: R,
    running: &AtomicBool,
    stats: &CaptureStats,
    message_tx: &Sender<Message>,
) -> Result<()> {
    let start = Instant::now();

    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = line.context("Failed to read frame lines")?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(bytes) = parse_hex_line(&line) else {
            stats.lines_rejected.fetch_add(1, Ordering::Relaxed);
            debug!("Skipping line: {}", line.trim());
            continue;
        };
        // Short Mode S frames carry no extended squitter
        if bytes.len() != FRAME_LENGTH {
            continue;
        }

        let timestamp_ns = start.elapsed().as_nanos() as u64;
        match RawFrame::new(timestamp_ns, bytes.as_bytes()) {
            Ok(frame) => {
                if !dispatch(frame, stats, message_tx) {
                    debug!("Message queue closed");
                    break;
                }
            }
            Err(e) => {
                stats.count_crc_error();
                debug!("Rejected {}: {}", bytes, e);
            }
        }
    }
    Ok(())
}
