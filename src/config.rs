//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default number of notification writes in flight during a fan-out.
const DEFAULT_FANOUT_CONCURRENCY: usize = 16;

/// Runtime configuration for the placement service.
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    /// Path of the local libSQL database file.
    pub db_path: PathBuf,
    /// Use the in-memory store instead of libSQL.
    pub in_memory: bool,
    /// Maximum concurrent notification writes per fan-out.
    pub fanout_concurrency: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/placement.db"),
            in_memory: false,
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
        }
    }
}

impl PlacementConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("PLACEMENT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let in_memory = match lookup("PLACEMENT_IN_MEMORY") {
            Some(v) => parse_flag("PLACEMENT_IN_MEMORY", &v)?,
            None => defaults.in_memory,
        };

        let fanout_concurrency = match lookup("PLACEMENT_FANOUT_CONCURRENCY") {
            Some(v) => {
                let n: usize = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: "PLACEMENT_FANOUT_CONCURRENCY".into(),
                    message: format!("{e}"),
                })?;
                n.max(1)
            }
            None => defaults.fanout_concurrency,
        };

        Ok(Self {
            db_path,
            in_memory,
            fanout_concurrency,
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = PlacementConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./data/placement.db"));
        assert!(!config.in_memory);
        assert_eq!(config.fanout_concurrency, 16);
    }

    #[test]
    fn reads_overrides() {
        let config = PlacementConfig::from_lookup(lookup_from(&[
            ("PLACEMENT_DB_PATH", "/tmp/p.db"),
            ("PLACEMENT_IN_MEMORY", "TRUE"),
            ("PLACEMENT_FANOUT_CONCURRENCY", "4"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/p.db"));
        assert!(config.in_memory);
        assert_eq!(config.fanout_concurrency, 4);
    }

    #[test]
    fn zero_concurrency_clamps_to_one() {
        let config =
            PlacementConfig::from_lookup(lookup_from(&[("PLACEMENT_FANOUT_CONCURRENCY", "0")]))
                .unwrap();
        assert_eq!(config.fanout_concurrency, 1);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(
            PlacementConfig::from_lookup(lookup_from(&[("PLACEMENT_IN_MEMORY", "maybe")]))
                .is_err()
        );
        assert!(
            PlacementConfig::from_lookup(lookup_from(&[("PLACEMENT_FANOUT_CONCURRENCY", "lots")]))
                .is_err()
        );
    }
}
