//! Aircraft state tracking and aggregation
//!
//! Every aircraft gets its own accumulator, which folds identification,
//! position and velocity messages into an [`AircraftState`].

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::adsb::{
    AircraftStateAccumulator, AircraftStateSetter, CallSign, GeoPos, IcaoAddress, Message,
};
use crate::registry::{AircraftData, AircraftRegistry};

/// Maximum silence before an aircraft is purged, relative to the most recent
/// message received from any aircraft
pub const AIRCRAFT_TIMEOUT_NS: u64 = 60_000_000_000;

/// Point of the trajectory of an aircraft
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirbornePos {
    pub position: GeoPos,
    /// Altitude in meters
    pub altitude: f64,
}

/// Aggregated aircraft state
#[derive(Debug, Clone)]
pub struct AircraftState {
    /// ICAO 24-bit address
    pub icao: IcaoAddress,
    /// Static data from the registry
    pub aircraft_data: Option<AircraftData>,
    pub last_message_timestamp_ns: u64,
    pub category: Option<u8>,
    pub call_sign: Option<CallSign>,
    pub position: Option<GeoPos>,
    /// Altitude in meters
    pub altitude: Option<f64>,
    /// Speed in m/s
    pub velocity: Option<f64>,
    /// Track or heading in radians
    pub track_or_heading: Option<f64>,
    /// Message count
    pub messages: u64,
    trajectory: Vec<AirbornePos>,
    /// Timestamp of the message that last touched the trajectory
    trajectory_timestamp_ns: Option<u64>,
}

impl AircraftState {
    pub fn new(icao: IcaoAddress, aircraft_data: Option<AircraftData>) -> Self {
        Self {
            icao,
            aircraft_data,
            last_message_timestamp_ns: 0,
            category: None,
            call_sign: None,
            position: None,
            altitude: None,
            velocity: None,
            track_or_heading: None,
            messages: 0,
            trajectory: Vec::new(),
            trajectory_timestamp_ns: None,
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Positions seen so far, each with the altitude known at that time
    pub fn trajectory(&self) -> &[AirbornePos] {
        &self.trajectory
    }
}

impl AircraftStateSetter for AircraftState {
    fn set_last_message_timestamp_ns(&mut self, timestamp_ns: u64) {
        self.last_message_timestamp_ns = timestamp_ns;
        self.messages += 1;
    }

    fn set_category(&mut self, category: u8) {
        self.category = Some(category);
    }

    fn set_call_sign(&mut self, call_sign: CallSign) {
        self.call_sign = Some(call_sign);
    }

    fn set_position(&mut self, position: GeoPos) {
        if let Some(altitude) = self.altitude {
            self.trajectory.push(AirbornePos { position, altitude });
        }
        self.trajectory_timestamp_ns = Some(self.last_message_timestamp_ns);
        self.position = Some(position);
    }

    fn set_altitude(&mut self, altitude: f64) {
        if let Some(position) = self.position {
            let point = AirbornePos { position, altitude };
            if self.trajectory.is_empty() {
                self.trajectory.push(point);
            } else if self.trajectory_timestamp_ns == Some(self.last_message_timestamp_ns) {
                if let Some(last) = self.trajectory.last_mut() {
                    *last = point;
                }
            }
        }
        self.trajectory_timestamp_ns = Some(self.last_message_timestamp_ns);
        self.altitude = Some(altitude);
    }

    fn set_velocity(&mut self, velocity: f64) {
        self.velocity = Some(velocity);
    }

    fn set_track_or_heading(&mut self, track_or_heading: f64) {
        self.track_or_heading = Some(track_or_heading);
    }
}

/// Aircraft tracker - manages state for all tracked aircraft
pub struct AircraftTracker {
    aircraft: HashMap<IcaoAddress, AircraftStateAccumulator<AircraftState>>,
    registry: Box<dyn AircraftRegistry>,
    /// Timestamp of the most recent message
    last_timestamp_ns: u64,
}

impl AircraftTracker {
    pub fn new(registry: Box<dyn AircraftRegistry>) -> Self {
        Self {
            aircraft: HashMap::new(),
            registry,
            last_timestamp_ns: 0,
        }
    }

    /// Update aircraft state with a message, returns the state once the
    /// aircraft has a position
    pub fn update_with_message(&mut self, message: &Message) -> Option<&AircraftState> {
        self.last_timestamp_ns = message.timestamp_ns();
        let icao = message.icao_address();

        let registry = &self.registry;
        let accumulator = self.aircraft.entry(icao).or_insert_with(|| {
            let data = registry.get(&icao);
            debug!(
                "New aircraft tracked: {} {}",
                icao,
                data.as_ref().map_or("-", |d| d.registration.as_str())
            );
            AircraftStateAccumulator::new(AircraftState::new(icao, data))
        });

        let had_position = accumulator.state().has_position();
        accumulator.update(message);

        let state = accumulator.state();
        if !state.has_position() {
            return None;
        }
        if !had_position {
            info!(
                "Aircraft {} {} first position {} | msgs={}",
                icao,
                state.call_sign.as_ref().map_or("-", CallSign::as_str),
                state.position.map_or_else(String::new, |p| p.to_string()),
                state.messages
            );
        }
        Some(state)
    }

    /// Get aircraft state by ICAO
    pub fn get(&self, icao: &IcaoAddress) -> Option<&AircraftState> {
        self.aircraft.get(icao).map(AircraftStateAccumulator::state)
    }

    /// Aircraft with a known position
    pub fn states(&self) -> impl Iterator<Item = &AircraftState> {
        self.aircraft
            .values()
            .map(AircraftStateAccumulator::state)
            .filter(|s| s.has_position())
    }

    /// Get count of tracked aircraft
    pub fn count(&self) -> usize {
        self.aircraft.len()
    }

    /// Remove aircraft silent for more than a minute before the most recent
    /// message; returns the number removed
    pub fn purge(&mut self) -> usize {
        let now = self.last_timestamp_ns;
        let before = self.aircraft.len();
        self.aircraft.retain(|_, accumulator| {
            now.saturating_sub(accumulator.state().last_message_timestamp_ns) <= AIRCRAFT_TIMEOUT_NS
        });
        let removed = before - self.aircraft.len();
        if removed > 0 {
            debug!("Purged {} stale aircraft, {} remaining", removed, self.aircraft.len());
        }
        removed
    }

    /// Get summary statistics
    pub fn stats_summary(&self) -> TrackerStats {
        let states = || self.aircraft.values().map(AircraftStateAccumulator::state);
        TrackerStats {
            total_aircraft: self.aircraft.len(),
            with_position: states().filter(|s| s.has_position()).count(),
            with_callsign: states().filter(|s| s.call_sign.is_some()).count(),
            total_messages: states().map(|s| s.messages).sum(),
        }
    }
}

/// Tracker statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerStats {
    pub total_aircraft: usize,
    pub with_position: usize,
    pub with_callsign: usize,
    pub total_messages: u64,
}

impl fmt::Display for TrackerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Aircraft: {} total, {} with position, {} with callsign, {} msgs",
            self.total_aircraft, self.with_position, self.with_callsign, self.total_messages
        )
    }
}
