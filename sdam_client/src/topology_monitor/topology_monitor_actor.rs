use tokio::sync::{mpsc, oneshot};
use tracing::{instrument, Span};
use uuid::Uuid;

use crate::{
    SdamConfiguration, ServerDescription, TopologyChange, TopologyDescription,
    TopologyStateMachine,
};

#[derive(Debug)]
pub(crate) enum TopologyMonitorMessage {
    /// Applies a freshly checked [`ServerDescription`] and answers with what changed.
    ServerDescriptionReceived {
        description: ServerDescription,
        respond_to: oneshot::Sender<Option<TopologyChange>>,
    },
    GetTopologyDescription {
        respond_to: oneshot::Sender<TopologyDescription>,
    },
}

/// Sole owner of a [`TopologyDescription`]. Messages are handled one at a time, so
/// every transition runs to completion before the next one starts.
pub(crate) struct TopologyMonitorActor {
    receiver: mpsc::Receiver<TopologyMonitorMessage>,
    state_machine: TopologyStateMachine,
    topology: TopologyDescription,
}

impl TopologyMonitorActor {
    pub(crate) fn new(
        receiver: mpsc::Receiver<TopologyMonitorMessage>,
        config: SdamConfiguration,
    ) -> Self {
        let state_machine = TopologyStateMachine::new(config);
        let topology = state_machine.new_topology_description();
        tracing::info!(
            topology_id = %topology.id(),
            topology_type = %topology.topology_type(),
            seeds = topology.server_count(),
            "Topology monitor created"
        );
        Self {
            receiver,
            state_machine,
            topology,
        }
    }

    /// Message handler for the TopologyMonitorActor
    #[instrument(
        level = "debug",
        name = "TopologyMonitor Actor - Handle Message",
        skip(self, msg),
        fields(correlation_id)
    )]
    fn handle_message(&mut self, msg: TopologyMonitorMessage) {
        // Apply a correlation id to all child spans of this message handler
        Span::current().record("correlation_id", Uuid::new_v4().to_string().as_str());
        match msg {
            TopologyMonitorMessage::ServerDescriptionReceived {
                description,
                respond_to,
            } => {
                let before = self.topology.clone();
                self.state_machine
                    .on_server_description(&mut self.topology, description);
                let change = before.diff(&self.topology).map(TopologyChange::from);
                if let Some(change) = &change {
                    tracing::debug!(?change, "Topology changed");
                }
                let _ = respond_to.send(change);
            }
            TopologyMonitorMessage::GetTopologyDescription { respond_to } => {
                let _ = respond_to.send(self.topology.clone());
            }
        }
    }
}

#[instrument(level = "debug", name = "Running Topology Monitor Actor", skip(actor))]
pub(crate) async fn run_topology_monitor_actor(mut actor: TopologyMonitorActor) {
    while let Some(msg) = actor.receiver.recv().await {
        actor.handle_message(msg);
    }
    tracing::debug!(
        topology_id = %actor.topology.id(),
        "All topology monitor handles dropped, stopping"
    );
}
