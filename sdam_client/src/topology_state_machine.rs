use tracing::instrument;

use crate::{
    ElectionId, SdamConfiguration, ServerDescription, ServerType, TopologyDescription,
    TopologyType,
};

/// Applies incoming [`ServerDescription`]s to a [`TopologyDescription`].
///
/// The state machine holds nothing but the configuration it was created with. Every
/// transition is synchronous and deterministic, so two callers feeding the same
/// descriptions in the same order end up with the same topology.
#[derive(Debug, Clone)]
pub struct TopologyStateMachine {
    config: SdamConfiguration,
}

impl TopologyStateMachine {
    pub fn new(config: SdamConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SdamConfiguration {
        &self.config
    }

    /// Creates a topology seeded from this state machine's configuration.
    pub fn new_topology_description(&self) -> TopologyDescription {
        TopologyDescription::new(&self.config)
    }

    /// Installs `incoming` into `topology` and reconciles membership, primary and
    /// topology type.
    #[instrument(
        level = "debug",
        name = "Apply ServerDescription",
        skip(self, topology, incoming),
        fields(
            topology_id = %topology.id(),
            address = %incoming.address(),
            server_type = %incoming.server_type(),
        )
    )]
    pub fn on_server_description(
        &self,
        topology: &mut TopologyDescription,
        incoming: ServerDescription,
    ) {
        let previous_type = topology.topology_type();

        if previous_type == TopologyType::Single {
            if topology.find_server_by_address(incoming.address()).is_none() {
                tracing::warn!(
                    "Single topology received a description for an untracked address, replacing the tracked server"
                );
            }
            topology.replace_servers(incoming);
            return;
        }

        let was_primary = topology
            .find_server_by_address(incoming.address())
            .map(|s| s.server_type() == ServerType::RSPrimary)
            .unwrap_or(false);
        topology.install_server(incoming.clone());

        if previous_type == TopologyType::Sharded {
            update_sharded(topology, &incoming);
            return;
        }

        match incoming.server_type() {
            ServerType::Unknown | ServerType::PossiblePrimary | ServerType::RSGhost => {}
            ServerType::Standalone | ServerType::Mongos => {
                if previous_type.is_replica_set() {
                    tracing::debug!("Server is not a replica set member, removing it");
                    topology.remove_server(incoming.address());
                }
            }
            ServerType::RSPrimary => {
                update_from_primary(topology, &incoming, was_primary);
                return;
            }
            ServerType::RSSecondary | ServerType::RSArbiter | ServerType::RSOther => {
                if !update_from_member(topology, &incoming) {
                    return;
                }
            }
        }

        let next = next_topology_type(
            previous_type,
            incoming.server_type(),
            topology.contains_primary(),
        );
        topology.set_type(next);
    }
}

/// Looks up the topology type that follows `previous` after a server of type `incoming`
/// was observed. `has_primary` tells whether a primary is still tracked.
pub fn next_topology_type(
    previous: TopologyType,
    incoming: ServerType,
    has_primary: bool,
) -> TopologyType {
    use ServerType as S;
    use TopologyType as T;

    match (previous, incoming) {
        (T::Single, _) => T::Single,
        (T::Sharded, _) => T::Sharded,

        (T::Unknown, S::Unknown | S::Standalone | S::RSGhost | S::PossiblePrimary) => T::Unknown,
        (T::Unknown, S::Mongos) => T::Sharded,
        (T::Unknown, S::RSPrimary) => T::ReplicaSetWithPrimary,
        (T::Unknown, S::RSSecondary | S::RSArbiter | S::RSOther) => T::ReplicaSetNoPrimary,

        (T::ReplicaSetNoPrimary, S::RSPrimary) => T::ReplicaSetWithPrimary,
        (
            T::ReplicaSetNoPrimary,
            S::Unknown
            | S::Standalone
            | S::Mongos
            | S::RSSecondary
            | S::RSArbiter
            | S::RSOther
            | S::RSGhost
            | S::PossiblePrimary,
        ) => T::ReplicaSetNoPrimary,

        (T::ReplicaSetWithPrimary, S::RSPrimary) => T::ReplicaSetWithPrimary,
        (
            T::ReplicaSetWithPrimary,
            S::Unknown
            | S::Standalone
            | S::Mongos
            | S::RSSecondary
            | S::RSArbiter
            | S::RSOther
            | S::RSGhost
            | S::PossiblePrimary,
        ) => {
            if has_primary {
                T::ReplicaSetWithPrimary
            } else {
                T::ReplicaSetNoPrimary
            }
        }
    }
}

/// The `(setVersion, electionId)` pair a primary reports, ordered with set version
/// first. An absent value orders below any present one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrimaryVersion {
    pub set_version: Option<i32>,
    pub election_id: Option<ElectionId>,
}

impl PrimaryVersion {
    pub fn of(description: &ServerDescription) -> Self {
        Self {
            set_version: description.set_version(),
            election_id: description.election_id(),
        }
    }

    /// The highest versions the topology has recorded.
    pub fn recorded(topology: &TopologyDescription) -> Self {
        Self {
            set_version: topology.max_set_version(),
            election_id: topology.max_election_id(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set_version.is_none() && self.election_id.is_none()
    }
}

/// A primary is stale when it reports versions below the recorded maximum, or equal
/// to it while another server held the primary role.
fn is_stale_primary(
    topology: &TopologyDescription,
    incoming: &ServerDescription,
    was_primary: bool,
) -> bool {
    let recorded = PrimaryVersion::recorded(topology);
    if recorded.is_empty() {
        return false;
    }
    let reported = PrimaryVersion::of(incoming);
    reported < recorded || (reported == recorded && !was_primary)
}

fn update_sharded(topology: &mut TopologyDescription, incoming: &ServerDescription) {
    match incoming.server_type() {
        ServerType::Unknown
        | ServerType::PossiblePrimary
        | ServerType::Mongos
        | ServerType::Standalone
        | ServerType::RSGhost => {}
        ServerType::RSPrimary
        | ServerType::RSSecondary
        | ServerType::RSArbiter
        | ServerType::RSOther => {
            tracing::debug!("Sharded topology does not track replica set members, removing it");
            topology.remove_server(incoming.address());
        }
    }
}

/// Returns true when the set name is compatible, adopting it if the topology has none.
fn check_set_name(topology: &mut TopologyDescription, incoming: &ServerDescription) -> bool {
    if topology.set_name().is_none() {
        topology.adopt_set_name(incoming.set_name());
        return true;
    }
    if topology.set_name() == incoming.set_name() {
        return true;
    }

    tracing::debug!(
        expected = ?topology.set_name(),
        reported = ?incoming.set_name(),
        "Server reported a different replica set name, removing it"
    );
    false
}

fn update_from_primary(
    topology: &mut TopologyDescription,
    incoming: &ServerDescription,
    was_primary: bool,
) {
    let address = incoming.address();

    if !check_set_name(topology, incoming) {
        topology.remove_server(address);
        topology.record_primary_state();
        return;
    }

    if is_stale_primary(topology, incoming, was_primary) {
        tracing::info!(
            reported = ?PrimaryVersion::of(incoming),
            recorded = ?PrimaryVersion::recorded(topology),
            "Ignoring stale primary"
        );
        topology.install_server(ServerDescription::unknown(address.clone()));
        topology.record_primary_state();
        return;
    }

    if let Some(set_version) = incoming.set_version() {
        topology.bump_max_set_version(set_version);
    }
    if let Some(election_id) = incoming.election_id() {
        topology.bump_max_election_id(election_id);
    }

    let demoted = topology
        .find_servers(|s| s.server_type() == ServerType::RSPrimary && s.address() != address)
        .into_iter()
        .map(|s| s.address().clone())
        .collect::<Vec<_>>();
    for old_primary in demoted {
        tracing::info!(%old_primary, "Demoting previous primary");
        topology.install_server(ServerDescription::unknown(old_primary));
    }

    for host in incoming.hosts() {
        topology.add_placeholder(host);
    }
    topology.retain_servers(|tracked| tracked == address || incoming.hosts().contains(tracked));

    topology.set_type(TopologyType::ReplicaSetWithPrimary);
}

/// Handles a secondary, arbiter or other member. Returns false when the server was
/// removed and the transition is finished.
fn update_from_member(topology: &mut TopologyDescription, incoming: &ServerDescription) -> bool {
    let address = incoming.address();

    if !check_set_name(topology, incoming) {
        topology.remove_server(address);
        topology.record_primary_state();
        return false;
    }

    if incoming.has_mismatched_me() {
        tracing::debug!(
            me = ?incoming.me(),
            "Server is not reachable at the address it is tracked under, removing it"
        );
        topology.remove_server(address);
        topology.record_primary_state();
        return false;
    }

    for host in incoming.hosts() {
        topology.add_placeholder(host);
    }
    true
}
