//! JSON-lines output of aircraft events

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::info;

use crate::adsb::IcaoAddress;
use crate::aircraft_tracker::{AirbornePos, AircraftState};
use crate::registry::WakeTurbulenceCategory;
use crate::units::{angle, convert_to};

/// Snapshot of an aircraft, emitted after each update once it has a position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftEvent {
    pub icao: IcaoAddress,
    /// Emission time
    pub timestamp: DateTime<Utc>,
    pub last_message_timestamp_ns: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u8>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_designator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_turbulence_category: Option<WakeTurbulenceCategory>,
    /// Number of recorded trajectory points
    pub trajectory_points: usize,
    /// Most recent trajectory point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trajectory_point: Option<TrajectoryPoint>,
}

/// Trajectory point in degrees and meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

impl From<&AirbornePos> for TrajectoryPoint {
    fn from(point: &AirbornePos) -> Self {
        Self {
            latitude: point.position.latitude_deg(),
            longitude: point.position.longitude_deg(),
            altitude_m: point.altitude,
        }
    }
}

impl AircraftEvent {
    /// Event for `state`, `None` while it has no position
    pub fn from_state(state: &AircraftState, timestamp: DateTime<Utc>) -> Option<Self> {
        let position = state.position?;
        let data = state.aircraft_data.as_ref();
        Some(Self {
            icao: state.icao,
            timestamp,
            last_message_timestamp_ns: state.last_message_timestamp_ns,
            callsign: state.call_sign.as_ref().map(|c| c.to_string()),
            category: state.category,
            latitude: position.latitude_deg(),
            longitude: position.longitude_deg(),
            altitude_m: state.altitude,
            speed_ms: state.velocity,
            track_deg: state
                .track_or_heading
                .map(|t| convert_to(t, angle::DEGREE)),
            registration: data.map(|d| d.registration.clone()),
            type_designator: data
                .map(|d| d.type_designator.clone())
                .filter(|t| !t.is_empty()),
            model: data.map(|d| d.model.clone()).filter(|m| !m.is_empty()),
            wake_turbulence_category: data.map(|d| d.wake_turbulence_category),
            trajectory_points: state.trajectory().len(),
            last_trajectory_point: state.trajectory().last().map(TrajectoryPoint::from),
        })
    }
}

/// Write events as JSON lines until the channel closes, returns the number
/// of events written
pub async fn stream_events<W>(mut rx: mpsc::Receiver<AircraftEvent>, mut writer: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event).context("Failed to serialize event")?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .context("Failed to write event")?;
        writer.flush().await.context("Failed to flush events")?;
        written += 1;
    }
    info!("[Output] Stream ended after {} events", written);
    Ok(written)
}
