//! Shared serialization/deserialization utilities for configuration
//!
//! This module provides common serde helpers used across configuration types.

/// Helper module for Duration serialization as milliseconds
///
/// Scheduler timings are sub-minute, so they are written as integer
/// milliseconds in TOML/JSON configuration files.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Config {
///     #[serde(with = "rt_core::config::serde_utils::duration_millis")]
///     tick: Duration,
/// }
/// ```
pub mod duration_millis {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as milliseconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    /// Deserialize a Duration from milliseconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        #[serde(with = "duration_millis")]
        tick: Duration,
    }

    #[test]
    fn test_duration_millis_serialize() {
        let config = TestConfig {
            tick: Duration::from_millis(1500),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"tick":1500}"#);
    }

    #[test]
    fn test_duration_millis_deserialize() {
        let config: TestConfig = toml::from_str("tick = 250").unwrap();
        assert_eq!(config.tick, Duration::from_millis(250));
    }
}
