//! Sequencer configuration

use crate::{Direction, Error, Result, Year, YearRange};
use std::time::Duration;

/// Tuned constants for the transition sequencer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SequencerConfig {
    /// Navigable years
    pub range: YearRange,
    /// Year shown on mount
    pub initial_year: Year,
    /// Progress fraction at which a forward clip commits the new year
    pub forward_threshold: f64,
    /// Progress fraction at which a back clip commits the new year
    pub back_threshold: f64,
    /// Pause between chained steps so the previous clip can reset
    #[cfg_attr(feature = "serde", serde(with = "millis"))]
    pub chain_delay: Duration,
    /// Longest a session may play before it is forced to end (None = no guard)
    #[cfg_attr(feature = "serde", serde(with = "opt_millis"))]
    pub stall_timeout: Option<Duration>,
}

impl SequencerConfig {
    /// Threshold for the given direction.
    ///
    /// The cut point differs per clip, so the two values are independent.
    pub fn threshold(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Forward => self.forward_threshold,
            Direction::Back => self.back_threshold,
        }
    }

    /// Checks thresholds and initial year
    pub fn validate(&self) -> Result<()> {
        for threshold in [self.forward_threshold, self.back_threshold] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::InvalidThreshold(threshold));
            }
        }
        self.range.check(self.initial_year)?;
        Ok(())
    }

    /// Parses a JSON config; missing fields fall back to defaults
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let range = YearRange::default();
        Self {
            range,
            initial_year: range.max(),
            forward_threshold: 0.45,
            back_threshold: 0.50,
            chain_delay: Duration::from_millis(50),
            stall_timeout: Some(Duration::from_secs(8)),
        }
    }
}

#[cfg(feature = "serde")]
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(feature = "serde")]
mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = SequencerConfig::default();
        assert_eq!(config.threshold(Direction::Forward), 0.45);
        assert_eq!(config.threshold(Direction::Back), 0.50);
        assert_eq!(config.initial_year, Year(2026));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SequencerConfig {
            forward_threshold: 1.5,
            ..SequencerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidThreshold(_))));

        let config = SequencerConfig {
            initial_year: Year(2030),
            ..SequencerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::YearOutOfRange { .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_partial() {
        let config = SequencerConfig::from_json_str(
            r#"{ "initial_year": 2024, "chain_delay": 10, "stall_timeout": null }"#,
        )
        .unwrap();
        assert_eq!(config.initial_year, Year(2024));
        assert_eq!(config.chain_delay, Duration::from_millis(10));
        assert_eq!(config.stall_timeout, None);
        assert_eq!(config.forward_threshold, 0.45);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_inverted_range() {
        let err = SequencerConfig::from_json_str(r#"{ "range": { "min": 2026, "max": 2023 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
