use crate::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum TopologyMonitorError {
    #[error("The topology monitor actor has shut down")]
    ActorUnavailable,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}
impl std::fmt::Debug for TopologyMonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
