use crate::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum ServerDescriptionError {
    #[error("A server description can't be built without the address it describes")]
    MissingAddress,
}
impl std::fmt::Debug for ServerDescriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
