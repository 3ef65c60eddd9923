/*!
sdam_client is the topology discovery and monitoring core of a database driver.

It keeps a single consistent view of a deployment's shape (standalone, sharded
cluster, or replica set) from the stream of self-reported [`ServerDescription`]s
that a monitoring layer collects from individual nodes.

The transition logic lives in [`TopologyStateMachine`], which mutates a
[`TopologyDescription`] in place. It is synchronous and performs no I/O. Callers
that receive descriptions from several tasks at once must serialize access to the
topology; [`TopologyMonitor`] does this by owning the topology inside a single
actor task.

# Example
```rust
use sdam_client::{
    SdamConfiguration, ServerDescription, ServerType, TopologyDescription,
    TopologyStateMachine, TopologyType,
};

let seed = "db1.example.com:27017".parse().unwrap();
let config = SdamConfiguration::new(
    vec![seed],
    Some(TopologyType::Unknown),
    SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
    None,
)
.unwrap();

let state_machine = TopologyStateMachine::new(config);
let mut topology = state_machine.new_topology_description();

let primary = ServerDescription::builder()
    .with_address("db1.example.com:27017".parse().unwrap())
    .with_type(ServerType::RSPrimary)
    .with_host("db1.example.com:27017".parse().unwrap())
    .with_host("db2.example.com:27017".parse().unwrap())
    .with_set_name("rs0")
    .build()
    .unwrap();

state_machine.on_server_description(&mut topology, primary);

assert_eq!(topology.topology_type(), TopologyType::ReplicaSetWithPrimary);
assert_eq!(topology.server_count(), 2);
```
*/

mod election_id;
mod sdam_configuration;
mod server_address;
mod server_description;
mod topology_description;
mod topology_monitor;
mod topology_state_machine;

#[cfg(test)]
mod test_support;

pub use election_id::*;
pub use sdam_configuration::*;
pub use server_address::*;
pub use server_description::*;
pub use topology_description::*;
pub use topology_monitor::*;
pub use topology_state_machine::*;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
