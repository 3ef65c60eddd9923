use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ElectionId, SdamConfiguration, ServerAddress, ServerDescription, ServerType};

/// The overall shape of a deployment.
///
/// Once a topology is `Single` it never becomes anything else.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyType {
    #[default]
    Unknown,
    Single,
    ReplicaSetNoPrimary,
    ReplicaSetWithPrimary,
    Sharded,
}

impl TopologyType {
    pub fn is_replica_set(&self) -> bool {
        matches!(
            self,
            TopologyType::ReplicaSetNoPrimary | TopologyType::ReplicaSetWithPrimary
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyType::Unknown => "Unknown",
            TopologyType::Single => "Single",
            TopologyType::ReplicaSetNoPrimary => "ReplicaSetNoPrimary",
            TopologyType::ReplicaSetWithPrimary => "ReplicaSetWithPrimary",
            TopologyType::Sharded => "Sharded",
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The driver's current belief about the whole deployment.
///
/// Readers get accessors only. All mutation goes through the crate-private methods used
/// by [`TopologyStateMachine`](crate::TopologyStateMachine); callers that share a
/// description between tasks must serialize access to it.
#[derive(Debug, Clone)]
pub struct TopologyDescription {
    /// Identifies this topology in log output
    id: Uuid,
    topology_type: TopologyType,
    /// Tracked servers, ordered by address
    servers: BTreeMap<ServerAddress, ServerDescription>,
    set_name: Option<String>,
    /// Highest set version ever reported by a primary
    max_set_version: Option<i32>,
    /// Highest election id ever reported by a primary
    max_election_id: Option<ElectionId>,
    heartbeat_frequency: Duration,
}

impl TopologyDescription {
    pub fn new(config: &SdamConfiguration) -> Self {
        let servers = config
            .seed_list()
            .iter()
            .map(|address| (address.clone(), ServerDescription::unknown(address.clone())))
            .collect::<BTreeMap<_, _>>();

        Self {
            id: Uuid::new_v4(),
            topology_type: config.initial_type(),
            servers,
            set_name: config.set_name().map(str::to_string),
            max_set_version: None,
            max_election_id: None,
            heartbeat_frequency: config.heartbeat_frequency(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topology_type(&self) -> TopologyType {
        self.topology_type
    }

    /// All tracked servers, ordered by address.
    pub fn servers(&self) -> impl Iterator<Item = &ServerDescription> {
        self.servers.values()
    }

    pub fn server_addresses(&self) -> impl Iterator<Item = &ServerAddress> {
        self.servers.keys()
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn find_server_by_address(&self, address: &ServerAddress) -> Option<&ServerDescription> {
        self.servers.get(address)
    }

    pub fn find_servers<P>(&self, predicate: P) -> Vec<&ServerDescription>
    where
        P: Fn(&ServerDescription) -> bool,
    {
        self.servers.values().filter(|s| predicate(s)).collect()
    }

    /// The tracked server currently typed `RSPrimary`, if any.
    pub fn primary(&self) -> Option<&ServerDescription> {
        self.servers
            .values()
            .find(|s| s.server_type() == ServerType::RSPrimary)
    }

    pub fn contains_primary(&self) -> bool {
        self.primary().is_some()
    }

    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    pub fn max_set_version(&self) -> Option<i32> {
        self.max_set_version
    }

    pub fn max_election_id(&self) -> Option<ElectionId> {
        self.max_election_id
    }

    pub fn heartbeat_frequency(&self) -> Duration {
        self.heartbeat_frequency
    }

    /// Returns what changed between this description and `other`, or `None` if they
    /// track the same servers with the same descriptions and metadata.
    ///
    /// Addresses present only in `other` are reported as added, addresses present only
    /// in `self` as removed.
    pub fn diff<'a>(&'a self, other: &'a TopologyDescription) -> Option<TopologyDescriptionDiff<'a>> {
        if self.topology_type == other.topology_type
            && self.set_name == other.set_name
            && self.max_set_version == other.max_set_version
            && self.max_election_id == other.max_election_id
            && self.servers == other.servers
        {
            return None;
        }

        let addresses = self.servers.keys().collect::<BTreeSet<_>>();
        let other_addresses = other.servers.keys().collect::<BTreeSet<_>>();

        let changed_servers = self
            .servers
            .iter()
            .filter_map(|(address, description)| match other.servers.get(address) {
                Some(other_description) if description != other_description => {
                    Some((address, (description, other_description)))
                }
                _ => None,
            })
            .collect();

        Some(TopologyDescriptionDiff {
            previous_type: self.topology_type,
            new_type: other.topology_type,
            removed_addresses: addresses.difference(&other_addresses).copied().collect(),
            added_addresses: other_addresses.difference(&addresses).copied().collect(),
            changed_servers,
        })
    }
}

// Mutators used by the state machine
impl TopologyDescription {
    pub(crate) fn set_type(&mut self, topology_type: TopologyType) {
        if self.topology_type != topology_type {
            tracing::info!(
                topology_id = %self.id,
                old = %self.topology_type,
                new = %topology_type,
                "Topology type changed"
            );
        }
        self.topology_type = topology_type;
    }

    pub(crate) fn adopt_set_name(&mut self, set_name: Option<&str>) {
        self.set_name = set_name.map(str::to_string);
    }

    /// Installs `description`, replacing whatever was tracked for its address.
    pub(crate) fn install_server(&mut self, description: ServerDescription) {
        tracing::trace!(
            topology_id = %self.id,
            address = %description.address(),
            server_type = %description.server_type(),
            "Installing server description"
        );
        self.servers
            .insert(description.address().clone(), description);
    }

    /// Replaces every tracked server with `description`.
    pub(crate) fn replace_servers(&mut self, description: ServerDescription) {
        self.servers.clear();
        self.install_server(description);
    }

    pub(crate) fn remove_server(&mut self, address: &ServerAddress) -> Option<ServerDescription> {
        let removed = self.servers.remove(address);
        if removed.is_some() {
            tracing::debug!(topology_id = %self.id, %address, "Removed server from topology");
        }
        removed
    }

    /// Tracks `address` as an unknown placeholder if it isn't tracked already.
    pub(crate) fn add_placeholder(&mut self, address: &ServerAddress) {
        if !self.servers.contains_key(address) {
            tracing::debug!(topology_id = %self.id, %address, "Discovered new server");
            self.servers
                .insert(address.clone(), ServerDescription::unknown(address.clone()));
        }
    }

    /// Keeps only the servers whose address satisfies `keep`.
    pub(crate) fn retain_servers<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ServerAddress) -> bool,
    {
        let id = self.id;
        self.servers.retain(|address, _| {
            let retained = keep(address);
            if !retained {
                tracing::debug!(topology_id = %id, %address, "Removed server from topology");
            }
            retained
        });
    }

    pub(crate) fn bump_max_set_version(&mut self, set_version: i32) {
        if self.max_set_version.map_or(true, |max| set_version > max) {
            self.max_set_version = Some(set_version);
        }
    }

    pub(crate) fn bump_max_election_id(&mut self, election_id: ElectionId) {
        if self.max_election_id.map_or(true, |max| election_id > max) {
            self.max_election_id = Some(election_id);
        }
    }

    /// Sets a replica set topology to `ReplicaSetWithPrimary` or `ReplicaSetNoPrimary`
    /// depending on whether any tracked server is a primary. Other types are untouched.
    pub(crate) fn record_primary_state(&mut self) {
        if !self.topology_type.is_replica_set() {
            return;
        }
        let topology_type = if self.contains_primary() {
            TopologyType::ReplicaSetWithPrimary
        } else {
            TopologyType::ReplicaSetNoPrimary
        };
        self.set_type(topology_type);
    }
}

/// The changes between two [`TopologyDescription`] snapshots.
///
/// A monitoring layer starts checking every address in `added_addresses` and stops
/// checking every address in `removed_addresses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyDescriptionDiff<'a> {
    pub previous_type: TopologyType,
    pub new_type: TopologyType,
    pub removed_addresses: BTreeSet<&'a ServerAddress>,
    pub added_addresses: BTreeSet<&'a ServerAddress>,
    pub changed_servers: BTreeMap<&'a ServerAddress, (&'a ServerDescription, &'a ServerDescription)>,
}

/// An owned summary of a [`TopologyDescriptionDiff`], suitable for sending between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyChange {
    pub previous_type: TopologyType,
    pub new_type: TopologyType,
    pub added_addresses: Vec<ServerAddress>,
    pub removed_addresses: Vec<ServerAddress>,
    pub changed_addresses: Vec<ServerAddress>,
}

impl From<TopologyDescriptionDiff<'_>> for TopologyChange {
    fn from(diff: TopologyDescriptionDiff<'_>) -> Self {
        Self {
            previous_type: diff.previous_type,
            new_type: diff.new_type,
            added_addresses: diff.added_addresses.into_iter().cloned().collect(),
            removed_addresses: diff.removed_addresses.into_iter().cloned().collect(),
            changed_addresses: diff.changed_servers.into_keys().cloned().collect(),
        }
    }
}
