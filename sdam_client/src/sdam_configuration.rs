use std::time::Duration;

use serde::Deserialize;
use tracing::instrument;

use crate::{error_chain_fmt, ServerAddress, TopologyType};

/// Startup configuration for topology discovery.
///
/// Consumed once when a [`TopologyDescription`](crate::TopologyDescription) or
/// [`TopologyStateMachine`](crate::TopologyStateMachine) is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSdamConfiguration")]
pub struct SdamConfiguration {
    seed_list: Vec<ServerAddress>,
    initial_type: TopologyType,
    heartbeat_frequency: Duration,
    set_name: Option<String>,
}

impl SdamConfiguration {
    pub const DEFAULT_HEARTBEAT_FREQUENCY: Duration = Duration::from_secs(10);
    pub const MIN_HEARTBEAT_FREQUENCY: Duration = Duration::from_millis(500);

    /// Validates and creates a configuration.
    ///
    /// When `initial_type` is `None` the starting type is derived: `ReplicaSetNoPrimary`
    /// if a set name is expected, `Single` for exactly one seed, otherwise `Unknown`.
    #[instrument(level = "debug", name = "Create SdamConfiguration")]
    pub fn new(
        seed_list: Vec<ServerAddress>,
        initial_type: Option<TopologyType>,
        heartbeat_frequency: Duration,
        set_name: Option<String>,
    ) -> Result<Self, SdamConfigurationError> {
        let mut seeds: Vec<ServerAddress> = Vec::with_capacity(seed_list.len());
        for seed in seed_list {
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }

        if seeds.is_empty() {
            tracing::error!("No seeds were supplied and a topology can't exist without one");
            return Err(SdamConfigurationError::EmptySeedList);
        }

        let initial_type = match initial_type {
            Some(t) => t,
            None if set_name.is_some() => TopologyType::ReplicaSetNoPrimary,
            None if seeds.len() == 1 => TopologyType::Single,
            None => TopologyType::Unknown,
        };

        match initial_type {
            TopologyType::Single if seeds.len() != 1 => {
                return Err(SdamConfigurationError::SingleRequiresOneSeed(seeds.len()));
            }
            TopologyType::ReplicaSetWithPrimary => {
                return Err(SdamConfigurationError::InvalidInitialType(initial_type));
            }
            _ => {}
        }

        if set_name.is_some()
            && !matches!(
                initial_type,
                TopologyType::ReplicaSetNoPrimary | TopologyType::Single
            )
        {
            return Err(SdamConfigurationError::SetNameRequiresReplicaSet(
                initial_type,
            ));
        }

        if heartbeat_frequency < Self::MIN_HEARTBEAT_FREQUENCY {
            return Err(SdamConfigurationError::HeartbeatFrequencyTooLow(
                heartbeat_frequency,
            ));
        }

        Ok(Self {
            seed_list: seeds,
            initial_type,
            heartbeat_frequency,
            set_name,
        })
    }

    pub fn seed_list(&self) -> &[ServerAddress] {
        &self.seed_list
    }

    pub fn initial_type(&self) -> TopologyType {
        self.initial_type
    }

    pub fn heartbeat_frequency(&self) -> Duration {
        self.heartbeat_frequency
    }

    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }
}

#[derive(Deserialize)]
struct RawSdamConfiguration {
    seeds: Vec<ServerAddress>,
    #[serde(default)]
    initial_type: Option<TopologyType>,
    #[serde(default)]
    heartbeat_frequency_ms: Option<u64>,
    #[serde(default)]
    set_name: Option<String>,
}

impl TryFrom<RawSdamConfiguration> for SdamConfiguration {
    type Error = SdamConfigurationError;

    fn try_from(raw: RawSdamConfiguration) -> Result<Self, Self::Error> {
        let heartbeat_frequency = raw
            .heartbeat_frequency_ms
            .map(Duration::from_millis)
            .unwrap_or(Self::DEFAULT_HEARTBEAT_FREQUENCY);
        Self::new(
            raw.seeds,
            raw.initial_type,
            heartbeat_frequency,
            raw.set_name,
        )
    }
}

#[derive(thiserror::Error)]
pub enum SdamConfigurationError {
    #[error("No seeds were supplied and a topology can't exist without at least one")]
    EmptySeedList,
    #[error("A Single topology requires exactly one seed, got {0}")]
    SingleRequiresOneSeed(usize),
    #[error("{0} can't be used as an initial topology type")]
    InvalidInitialType(TopologyType),
    #[error("A set name can only be given for a ReplicaSetNoPrimary or Single topology, not {0}")]
    SetNameRequiresReplicaSet(TopologyType),
    #[error("Heartbeat frequency {0:?} is below the 500ms minimum")]
    HeartbeatFrequencyTooLow(Duration),
}
impl std::fmt::Debug for SdamConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{SdamConfiguration, SdamConfigurationError, ServerAddress, TopologyType};

    fn seeds(addresses: &[&str]) -> Vec<ServerAddress> {
        addresses.iter().map(|a| a.parse().unwrap()).collect()
    }

    #[test]
    fn one_seed_without_override_is_single() {
        let config = SdamConfiguration::new(
            seeds(&["localhost:123"]),
            None,
            SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
            None,
        )
        .unwrap();

        assert_eq!(config.initial_type(), TopologyType::Single);
    }

    #[test]
    fn explicit_type_overrides_single_seed() {
        let config = SdamConfiguration::new(
            seeds(&["localhost:123"]),
            Some(TopologyType::Unknown),
            SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
            None,
        )
        .unwrap();

        assert_eq!(config.initial_type(), TopologyType::Unknown);
    }

    #[test]
    fn several_seeds_default_to_unknown() {
        let config = SdamConfiguration::new(
            seeds(&["localhost:123", "localhost:456"]),
            None,
            Duration::from_millis(500),
            None,
        )
        .unwrap();

        assert_eq!(config.initial_type(), TopologyType::Unknown);
        assert_eq!(config.seed_list().len(), 2);
        assert_eq!(config.heartbeat_frequency(), Duration::from_millis(500));
    }

    #[test]
    fn set_name_defaults_to_replica_set_no_primary() {
        let config = SdamConfiguration::new(
            seeds(&["localhost:123", "localhost:456"]),
            None,
            SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
            Some("setName".to_string()),
        )
        .unwrap();

        assert_eq!(config.initial_type(), TopologyType::ReplicaSetNoPrimary);
        assert_eq!(config.set_name(), Some("setName"));
    }

    #[test]
    fn duplicate_seeds_are_collapsed() {
        let config = SdamConfiguration::new(
            seeds(&["localhost:123", "LOCALHOST:123", "localhost:456"]),
            None,
            SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
            None,
        )
        .unwrap();

        assert_eq!(config.seed_list(), seeds(&["localhost:123", "localhost:456"]));
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let freq = SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY;

        assert!(matches!(
            SdamConfiguration::new(vec![], None, freq, None),
            Err(SdamConfigurationError::EmptySeedList)
        ));
        assert!(matches!(
            SdamConfiguration::new(
                seeds(&["a:1", "b:1"]),
                Some(TopologyType::Single),
                freq,
                None
            ),
            Err(SdamConfigurationError::SingleRequiresOneSeed(2))
        ));
        assert!(matches!(
            SdamConfiguration::new(
                seeds(&["a:1"]),
                Some(TopologyType::ReplicaSetWithPrimary),
                freq,
                None
            ),
            Err(SdamConfigurationError::InvalidInitialType(_))
        ));
        assert!(matches!(
            SdamConfiguration::new(
                seeds(&["a:1", "b:1"]),
                Some(TopologyType::Sharded),
                freq,
                Some("rs".to_string())
            ),
            Err(SdamConfigurationError::SetNameRequiresReplicaSet(
                TopologyType::Sharded
            ))
        ));
        assert!(matches!(
            SdamConfiguration::new(seeds(&["a:1"]), None, Duration::from_millis(499), None),
            Err(SdamConfigurationError::HeartbeatFrequencyTooLow(_))
        ));
    }

    #[test]
    fn deserializes_through_validation() {
        let config: SdamConfiguration = serde_json::from_str(
            r#"{
                "seeds": ["localhost:123", "localhost:456"],
                "initial_type": "ReplicaSetNoPrimary",
                "heartbeat_frequency_ms": 500,
                "set_name": "setName"
            }"#,
        )
        .unwrap();

        assert_eq!(config.initial_type(), TopologyType::ReplicaSetNoPrimary);
        assert_eq!(config.heartbeat_frequency(), Duration::from_millis(500));
        assert_eq!(config.set_name(), Some("setName"));

        let minimal: SdamConfiguration =
            serde_json::from_str(r#"{ "seeds": ["localhost:123"] }"#).unwrap();
        assert_eq!(minimal.initial_type(), TopologyType::Single);
        assert_eq!(
            minimal.heartbeat_frequency(),
            SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY
        );

        assert!(serde_json::from_str::<SdamConfiguration>(r#"{ "seeds": [] }"#).is_err());
    }
}
