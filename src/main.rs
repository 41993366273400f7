//! ADS-B decoder
//!
//! Demodulates raw I/Q samples (or replays recorded frames), tracks every
//! aircraft heard and writes aircraft events to stdout as JSON lines.

use anyhow::Result;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use adsb_decode::output::{self, AircraftEvent};
use adsb_decode::registry::{AircraftRegistry, CsvRegistry};
use adsb_decode::sdr::Capture;
use adsb_decode::{AircraftTracker, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, stdout carries the events
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("===========================================");
    info!("   ADS-B Decoder");
    info!("===========================================");

    // Load configuration
    let config = Config::from_env();
    info!("Configuration:");
    info!("  Purge interval: {} ms", config.purge_interval_ms);
    info!("  Stats interval: {} s", config.stats_interval_secs);
    info!("  Queue capacity: {}", config.queue_capacity);

    let registry: Box<dyn AircraftRegistry> = match &config.registry_path {
        Some(path) => Box::new(CsvRegistry::open(path)?),
        None => {
            info!("  No aircraft registry configured");
            Box::new(CsvRegistry::default())
        }
    };

    // Event output task
    let (event_tx, event_rx) = mpsc::channel::<AircraftEvent>(1000);
    let output_handle = tokio::spawn(async move {
        if let Err(e) = output::stream_events(event_rx, tokio::io::stdout()).await {
            error!("Event output failed: {:#}", e);
        }
    });

    let capture = Capture::new(config.clone());
    let message_rx = match capture.start() {
        Ok(rx) => rx,
        Err(e) => {
            error!("Failed to start capture: {:#}", e);
            return Err(e);
        }
    };

    let mut tracker = AircraftTracker::new(registry);

    let purge_interval = Duration::from_millis(config.purge_interval_ms);
    let stats_interval = Duration::from_secs(config.stats_interval_secs);
    let mut messages_processed = 0u64;
    let mut last_purge = Instant::now();
    let mut last_stats_report = Instant::now();

    // Main processing loop - receive decoded messages from the capture thread
    loop {
        match message_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(message) => {
                messages_processed += 1;
                if let Some(state) = tracker.update_with_message(&message) {
                    if let Some(event) = AircraftEvent::from_state(state, chrono::Utc::now()) {
                        if event_tx.send(event).await.is_err() {
                            warn!("Event output closed");
                            break;
                        }
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                // No message received, continue with periodic tasks
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                info!("Capture finished");
                break;
            }
        }

        if last_purge.elapsed() >= purge_interval {
            tracker.purge();
            last_purge = Instant::now();
        }

        if last_stats_report.elapsed() >= stats_interval {
            info!("[Tracker] {}", tracker.stats_summary());
            info!("[Capture] {}", capture.stats());
            last_stats_report = Instant::now();
        }
    }

    capture.stop();

    // Let the output task drain
    drop(event_tx);
    if let Err(e) = output_handle.await {
        error!("Output task failed: {}", e);
    }

    info!("[Tracker] {}", tracker.stats_summary());
    info!(
        "Shutdown complete. Messages processed: {}, frames received: {}",
        messages_processed,
        capture.stats().frames_received.load(Ordering::Relaxed)
    );
    Ok(())
}
