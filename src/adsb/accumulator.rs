//! Per-aircraft message accumulation

use super::cpr::CprDecoder;
use super::parser::{Message, PositionMessage};
use super::types::{CallSign, GeoPos};

/// Maximum age difference of an even/odd pair usable for position decoding
pub const POSITION_PAIR_WINDOW_NS: u64 = 10_000_000_000;

/// Mutable aircraft state, updated by an accumulator
pub trait AircraftStateSetter {
    fn set_last_message_timestamp_ns(&mut self, timestamp_ns: u64);

    fn set_category(&mut self, category: u8);

    fn set_call_sign(&mut self, call_sign: CallSign);

    fn set_position(&mut self, position: GeoPos);

    /// Altitude in meters
    fn set_altitude(&mut self, altitude: f64);

    /// Speed in m/s
    fn set_velocity(&mut self, velocity: f64);

    /// Track or heading in radians
    fn set_track_or_heading(&mut self, track_or_heading: f64);
}

/// Feeds the messages of one aircraft into its state, pairing even and odd
/// position messages to decode positions.
#[derive(Debug)]
pub struct AircraftStateAccumulator<S> {
    state: S,
    /// Latest even and odd position messages, indexed by parity
    positions: [Option<PositionMessage>; 2],
}

impl<S: AircraftStateSetter> AircraftStateAccumulator<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            positions: [None, None],
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn update(&mut self, message: &Message) {
        self.state.set_last_message_timestamp_ns(message.timestamp_ns());

        match message {
            Message::Identification(m) => {
                self.state.set_category(m.category);
                self.state.set_call_sign(m.call_sign.clone());
            }
            Message::Position(m) => {
                self.state.set_altitude(m.altitude);
                self.positions[m.parity.index()] = Some(m.clone());

                if let [Some(even), Some(odd)] = &self.positions {
                    if even.timestamp_ns.abs_diff(odd.timestamp_ns) < POSITION_PAIR_WINDOW_NS {
                        if let Some(position) =
                            CprDecoder::decode(even.x, even.y, odd.x, odd.y, m.parity)
                        {
                            self.state.set_position(position);
                        }
                    }
                }
            }
            Message::Velocity(m) => {
                self.state.set_velocity(m.speed);
                self.state.set_track_or_heading(m.track_or_heading);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adsb::parser::{IdentificationMessage, VelocityMessage};
    use crate::adsb::types::{IcaoAddress, Parity};

    const CPR_SCALE: f64 = (1 << 17) as f64;

    #[derive(Debug, Default)]
    struct RecordingState {
        last_timestamp_ns: u64,
        category: Option<u8>,
        call_sign: Option<CallSign>,
        positions: Vec<GeoPos>,
        altitude: Option<f64>,
        velocity: Option<f64>,
        track_or_heading: Option<f64>,
    }

    impl AircraftStateSetter for RecordingState {
        fn set_last_message_timestamp_ns(&mut self, timestamp_ns: u64) {
            self.last_timestamp_ns = timestamp_ns;
        }
        fn set_category(&mut self, category: u8) {
            self.category = Some(category);
        }
        fn set_call_sign(&mut self, call_sign: CallSign) {
            self.call_sign = Some(call_sign);
        }
        fn set_position(&mut self, position: GeoPos) {
            self.positions.push(position);
        }
        fn set_altitude(&mut self, altitude: f64) {
            self.altitude = Some(altitude);
        }
        fn set_velocity(&mut self, velocity: f64) {
            self.velocity = Some(velocity);
        }
        fn set_track_or_heading(&mut self, track_or_heading: f64) {
            self.track_or_heading = Some(track_or_heading);
        }
    }

    fn icao() -> IcaoAddress {
        IcaoAddress::from_u32(0x40621D)
    }

    fn even(timestamp_ns: u64) -> Message {
        Message::Position(PositionMessage {
            timestamp_ns,
            icao_address: icao(),
            altitude: 11_582.4,
            parity: Parity::Even,
            x: 51372.0 / CPR_SCALE,
            y: 93000.0 / CPR_SCALE,
        })
    }

    fn odd(timestamp_ns: u64) -> Message {
        Message::Position(PositionMessage {
            timestamp_ns,
            icao_address: icao(),
            altitude: 11_582.4,
            parity: Parity::Odd,
            x: 50194.0 / CPR_SCALE,
            y: 74158.0 / CPR_SCALE,
        })
    }

    #[test]
    fn test_pair_within_window_sets_position() {
        let mut acc = AircraftStateAccumulator::new(RecordingState::default());
        acc.update(&even(0));
        assert!(acc.state().positions.is_empty());
        acc.update(&odd(5_000_000_000));

        let state = acc.state();
        assert_eq!(state.positions.len(), 1);
        assert_eq!(state.positions[0].longitude_t32(), 46_993_057);
        assert_eq!(state.positions[0].latitude_t32(), 623_555_046);
        assert_eq!(state.last_timestamp_ns, 5_000_000_000);
        assert_eq!(state.altitude, Some(11_582.4));
    }

    #[test]
    fn test_most_recent_parity_selects_zone() {
        let mut acc = AircraftStateAccumulator::new(RecordingState::default());
        acc.update(&odd(0));
        acc.update(&even(1_000_000_000));
        let pos = acc.state().positions[0];
        assert_eq!(pos.longitude_t32(), 46_759_936);
        assert_eq!(pos.latitude_t32(), 623_452_706);
    }

    #[test]
    fn test_pair_outside_window_is_ignored() {
        let mut acc = AircraftStateAccumulator::new(RecordingState::default());
        acc.update(&even(0));
        acc.update(&odd(15_000_000_000));
        assert!(acc.state().positions.is_empty());

        // Exactly 10 s apart is also too old
        acc.update(&even(25_000_000_000));
        assert!(acc.state().positions.is_empty());
    }

    #[test]
    fn test_replaced_slot_pairs_with_newest() {
        let mut acc = AircraftStateAccumulator::new(RecordingState::default());
        acc.update(&even(0));
        acc.update(&odd(15_000_000_000));
        acc.update(&even(20_000_000_000));
        assert_eq!(acc.state().positions.len(), 1);
        acc.update(&odd(21_000_000_000));
        assert_eq!(acc.into_state().positions.len(), 2);
    }

    #[test]
    fn test_identification_and_velocity() {
        let mut acc = AircraftStateAccumulator::new(RecordingState::default());
        acc.update(&Message::Identification(IdentificationMessage {
            timestamp_ns: 10,
            icao_address: icao(),
            category: 160,
            call_sign: CallSign::new("KLM1023").unwrap(),
        }));
        acc.update(&Message::Velocity(VelocityMessage {
            timestamp_ns: 20,
            icao_address: icao(),
            speed: 81.9,
            track_or_heading: 3.19,
        }));

        let state = acc.state();
        assert_eq!(state.last_timestamp_ns, 20);
        assert_eq!(state.category, Some(160));
        assert_eq!(state.call_sign.as_ref().map(CallSign::as_str), Some("KLM1023"));
        assert_eq!(state.velocity, Some(81.9));
        assert_eq!(state.track_or_heading, Some(3.19));
        assert!(state.altitude.is_none());
    }
}
