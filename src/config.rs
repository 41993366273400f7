//! Configuration loaded from environment variables

use std::path::PathBuf;
use std::str::FromStr;

/// Layout of the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Raw 12-bit I/Q samples as little-endian 16-bit words
    Samples,
    /// Binary records: 8-byte big-endian timestamp followed by 14 frame bytes
    Records,
    /// `*HEX;` frame lines
    Hex,
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "samples" | "iq" => Ok(InputFormat::Samples),
            "records" => Ok(InputFormat::Records),
            "hex" => Ok(InputFormat::Hex),
            other => Err(format!("unknown input format '{}'", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Input file, `-` for stdin
    pub input_path: String,

    pub input_format: InputFormat,

    /// Command whose stdout delivers samples, overrides `input_path`
    pub sampler_command: Option<String>,

    /// Pace record replay by frame timestamps
    pub replay_realtime: bool,

    /// CSV aircraft registry
    pub registry_path: Option<PathBuf>,

    /// Tracker purge interval in milliseconds
    pub purge_interval_ms: u64,

    /// Tracker statistics logging interval in seconds
    pub stats_interval_secs: u64,

    /// Capacity of the decoded message queue
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            input_path: var("INPUT_PATH")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "-".to_string()),

            input_format: var("INPUT_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(InputFormat::Samples),

            sampler_command: var("SAMPLER_COMMAND").filter(|s| !s.trim().is_empty()),

            replay_realtime: var("REPLAY_REALTIME")
                .map(|s| matches!(s.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),

            registry_path: var("REGISTRY_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),

            purge_interval_ms: var("PURGE_INTERVAL_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),

            stats_interval_secs: var("STATS_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            queue_capacity: var("QUEUE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(1000),
        }
    }

    pub fn reads_stdin(&self) -> bool {
        self.sampler_command.is_none() && self.input_path == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.input_path, "-");
        assert_eq!(config.input_format, InputFormat::Samples);
        assert!(config.sampler_command.is_none());
        assert!(!config.replay_realtime);
        assert!(config.registry_path.is_none());
        assert_eq!(config.purge_interval_ms, 1000);
        assert_eq!(config.stats_interval_secs, 10);
        assert_eq!(config.queue_capacity, 1000);
        assert!(config.reads_stdin());
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("INPUT_PATH", "/data/capture.bin"),
            ("INPUT_FORMAT", "Records"),
            ("REPLAY_REALTIME", "true"),
            ("REGISTRY_PATH", "/data/aircraft.csv"),
            ("PURGE_INTERVAL_MS", "250"),
            ("QUEUE_CAPACITY", "64"),
        ]);
        assert_eq!(config.input_path, "/data/capture.bin");
        assert_eq!(config.input_format, InputFormat::Records);
        assert!(config.replay_realtime);
        assert_eq!(config.registry_path, Some(PathBuf::from("/data/aircraft.csv")));
        assert_eq!(config.purge_interval_ms, 250);
        assert_eq!(config.queue_capacity, 64);
        assert!(!config.reads_stdin());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_with(&[
            ("INPUT_FORMAT", "wav"),
            ("PURGE_INTERVAL_MS", "soon"),
            ("QUEUE_CAPACITY", "0"),
            ("SAMPLER_COMMAND", "  "),
        ]);
        assert_eq!(config.input_format, InputFormat::Samples);
        assert_eq!(config.purge_interval_ms, 1000);
        assert_eq!(config.queue_capacity, 1000);
        assert!(config.sampler_command.is_none());
    }

    #[test]
    fn test_sampler_command_replaces_stdin() {
        let config = config_with(&[("SAMPLER_COMMAND", "rx_sdr -f 1090000000 -s 2400000 -")]);
        assert!(!config.reads_stdin());
    }

    #[test]
    fn test_input_format_from_str() {
        assert_eq!("hex".parse::<InputFormat>(), Ok(InputFormat::Hex));
        assert_eq!(" IQ ".parse::<InputFormat>(), Ok(InputFormat::Samples));
        assert!("json".parse::<InputFormat>().is_err());
    }
}
