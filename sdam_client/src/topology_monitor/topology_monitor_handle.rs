use anyhow::Context;
use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

use crate::{
    run_topology_monitor_actor, SdamConfiguration, ServerDescription, TopologyChange,
    TopologyDescription, TopologyMonitorActor, TopologyMonitorError, TopologyMonitorMessage,
};

/**
A handle to the actor that owns a deployment's [`TopologyDescription`].

Server monitoring tasks run concurrently, but topology transitions must not interleave.
Every handle sends into the same actor, which applies descriptions one at a time.
Cloning this handle is cheap and will not start a new actor. When the last handle is
dropped the backing actor stops.

```rust
# tokio_test::block_on(async {
use sdam_client::{SdamConfiguration, ServerDescription, ServerType, TopologyMonitor, TopologyType};

let config = SdamConfiguration::new(
    vec!["localhost:27017".parse().unwrap(), "localhost:27018".parse().unwrap()],
    None,
    SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
    None,
)
.unwrap();
let monitor = TopologyMonitor::new(config);

let mongos = ServerDescription::builder()
    .with_address("localhost:27017".parse().unwrap())
    .with_type(ServerType::Mongos)
    .build()
    .unwrap();
let change = monitor.on_server_description(mongos).await.unwrap().unwrap();
assert_eq!(change.new_type, TopologyType::Sharded);
# })
```
*/
#[derive(Clone, Debug)]
pub struct TopologyMonitor {
    sender: mpsc::Sender<TopologyMonitorMessage>,
}

impl TopologyMonitor {
    /// Spawns the backing actor onto the current tokio runtime.
    pub fn new(config: SdamConfiguration) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let actor = TopologyMonitorActor::new(receiver, config);
        tokio::spawn(run_topology_monitor_actor(actor));

        Self { sender }
    }

    /// Applies `description` to the topology. Returns what changed, or `None` if the
    /// topology is identical afterwards.
    #[instrument(
        level = "debug",
        name = "Actor Handle - On Server Description",
        skip(self, description),
        fields(address = %description.address())
    )]
    pub async fn on_server_description(
        &self,
        description: ServerDescription,
    ) -> Result<Option<TopologyChange>, TopologyMonitorError> {
        let (tx, rx) = oneshot::channel();

        tracing::trace!("Sending message to actor");
        self.sender
            .send(TopologyMonitorMessage::ServerDescriptionReceived {
                description,
                respond_to: tx,
            })
            .await
            .map_err(|_| TopologyMonitorError::ActorUnavailable)?;

        tracing::trace!("Waiting for oneshot to return");
        Ok(rx
            .await
            .context("TopologyMonitorActor task has been killed")?)
    }

    /// Returns a snapshot of the current topology.
    #[instrument(level = "debug", name = "Actor Handle - Get Topology Description", skip(self))]
    pub async fn topology_description(&self) -> Result<TopologyDescription, TopologyMonitorError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TopologyMonitorMessage::GetTopologyDescription { respond_to: tx })
            .await
            .map_err(|_| TopologyMonitorError::ActorUnavailable)?;
        Ok(rx
            .await
            .context("TopologyMonitorActor task has been killed")?)
    }
}
