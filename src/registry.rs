//! Static aircraft data looked up by ICAO address

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adsb::IcaoAddress;

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid {field} {value:?}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeTurbulenceCategory {
    Light,
    Medium,
    Heavy,
    Unknown,
}

impl WakeTurbulenceCategory {
    pub fn of(s: &str) -> Self {
        match s {
            "L" => WakeTurbulenceCategory::Light,
            "M" => WakeTurbulenceCategory::Medium,
            "H" => WakeTurbulenceCategory::Heavy,
            _ => WakeTurbulenceCategory::Unknown,
        }
    }
}

/// Registration, type and model of an aircraft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AircraftData {
    pub registration: String,
    pub type_designator: String,
    pub model: String,
    pub description: String,
    pub wake_turbulence_category: WakeTurbulenceCategory,
}

impl AircraftData {
    /// Validated aircraft data.
    ///
    /// The registration uses `A-Z`, `0-9` and ` .?/_+-`; the type designator
    /// is empty or 2 to 4 characters from `A-Z0-9`; the description is empty
    /// or an ICAO aircraft description such as `L2J`.
    pub fn new(
        registration: &str,
        type_designator: &str,
        model: &str,
        description: &str,
        wake_turbulence_category: WakeTurbulenceCategory,
    ) -> Result<Self, RegistryError> {
        if !is_valid_registration(registration) {
            return Err(invalid("registration", registration));
        }
        if !is_valid_type_designator(type_designator) {
            return Err(invalid("type designator", type_designator));
        }
        if !is_valid_description(description) {
            return Err(invalid("description", description));
        }
        Ok(Self {
            registration: registration.to_string(),
            type_designator: type_designator.to_string(),
            model: model.to_string(),
            description: description.to_string(),
            wake_turbulence_category,
        })
    }
}

fn invalid(field: &'static str, value: &str) -> RegistryError {
    RegistryError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn is_valid_registration(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b" .?/_+-".contains(&b))
}

fn is_valid_type_designator(s: &str) -> bool {
    s.is_empty()
        || ((2..=4).contains(&s.len())
            && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()))
}

fn is_valid_description(s: &str) -> bool {
    match s.as_bytes() {
        [] => true,
        [kind, engines, propulsion] => {
            b"ABDGHLPRSTV-".contains(kind)
                && b"0123468".contains(engines)
                && b"EJPT-".contains(propulsion)
        }
        _ => false,
    }
}

/// Lookup of static aircraft data
pub trait AircraftRegistry: Send + Sync {
    fn get(&self, icao: &IcaoAddress) -> Option<AircraftData>;
}

impl AircraftRegistry for HashMap<IcaoAddress, AircraftData> {
    fn get(&self, icao: &IcaoAddress) -> Option<AircraftData> {
        HashMap::get(self, icao).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct RegistryRow {
    icao: String,
    registration: String,
    #[serde(rename = "type")]
    type_designator: String,
    model: String,
    description: String,
    wtc: String,
}

/// Registry loaded from a CSV file with the header
/// `icao,registration,type,model,description,wtc`
#[derive(Debug, Default)]
pub struct CsvRegistry {
    entries: HashMap<IcaoAddress, AircraftData>,
}

impl CsvRegistry {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let registry = Self::from_csv(csv::Reader::from_path(path)?)?;
        info!(
            "Loaded {} aircraft from registry {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, RegistryError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, RegistryError> {
        let mut entries = HashMap::new();
        for row in reader.deserialize() {
            let row: RegistryRow = row?;
            let icao = match row.icao.parse::<IcaoAddress>() {
                Ok(icao) => icao,
                Err(e) => {
                    warn!("Skipping registry row: {}", e);
                    continue;
                }
            };
            match AircraftData::new(
                &row.registration,
                &row.type_designator,
                &row.model,
                &row.description,
                WakeTurbulenceCategory::of(&row.wtc),
            ) {
                Ok(data) => {
                    entries.insert(icao, data);
                }
                Err(e) => warn!("Skipping registry row for {}: {}", icao, e),
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AircraftRegistry for CsvRegistry {
    fn get(&self, icao: &IcaoAddress) -> Option<AircraftData> {
        self.entries.get(icao).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
icao,registration,type,model,description,wtc
4B1805,HB-JCA,BCS3,AIRBUS A220-300,L2J,M
4D2228,9H-QAB,B38M,BOEING 737 MAX 8,L2J,M
4840D6,PH-BXH,,,,L
abcdef,XX-BAD,A320,AIRBUS A320,L2J,M
3C6589,D-AIBD,A3199,AIRBUS A319,L2J,M
";

    #[test]
    fn test_wake_turbulence_category() {
        assert_eq!(WakeTurbulenceCategory::of("L"), WakeTurbulenceCategory::Light);
        assert_eq!(WakeTurbulenceCategory::of("M"), WakeTurbulenceCategory::Medium);
        assert_eq!(WakeTurbulenceCategory::of("H"), WakeTurbulenceCategory::Heavy);
        assert_eq!(WakeTurbulenceCategory::of("J"), WakeTurbulenceCategory::Unknown);
        assert_eq!(WakeTurbulenceCategory::of(""), WakeTurbulenceCategory::Unknown);
    }

    #[test]
    fn test_csv_registry() {
        let registry = CsvRegistry::from_reader(CSV.as_bytes()).unwrap();
        // Lowercase address and 5-character type designator are skipped
        assert_eq!(registry.len(), 3);

        let data = registry.get(&"4B1805".parse().unwrap()).unwrap();
        assert_eq!(data.registration, "HB-JCA");
        assert_eq!(data.type_designator, "BCS3");
        assert_eq!(data.model, "AIRBUS A220-300");
        assert_eq!(data.description, "L2J");
        assert_eq!(data.wake_turbulence_category, WakeTurbulenceCategory::Medium);

        let data = registry.get(&"4840D6".parse().unwrap()).unwrap();
        assert_eq!(data.type_designator, "");
        assert_eq!(data.wake_turbulence_category, WakeTurbulenceCategory::Light);

        assert!(registry.get(&"3C6589".parse().unwrap()).is_none());
        assert!(registry.get(&"000001".parse().unwrap()).is_none());
    }

    #[test]
    fn test_aircraft_data_validation() {
        let wtc = WakeTurbulenceCategory::Unknown;
        assert!(AircraftData::new("HB-JCA", "BCS3", "", "L2J", wtc).is_ok());
        assert!(AircraftData::new("", "BCS3", "", "L2J", wtc).is_err());
        assert!(AircraftData::new("hb-jca", "BCS3", "", "L2J", wtc).is_err());
        assert!(AircraftData::new("HB-JCA", "B", "", "L2J", wtc).is_err());
        assert!(AircraftData::new("HB-JCA", "BCS3", "", "L5J", wtc).is_err());
        assert!(AircraftData::new("HB-JCA", "BCS3", "", "L2", wtc).is_err());
    }

    #[test]
    fn test_hash_map_registry() {
        let mut map = HashMap::new();
        let icao: IcaoAddress = "4B1805".parse().unwrap();
        let data = AircraftData::new(
            "HB-JCA",
            "BCS3",
            "AIRBUS A220-300",
            "L2J",
            WakeTurbulenceCategory::Medium,
        )
        .unwrap();
        map.insert(icao, data.clone());
        let registry: &dyn AircraftRegistry = &map;
        assert_eq!(registry.get(&icao), Some(data));
    }
}
