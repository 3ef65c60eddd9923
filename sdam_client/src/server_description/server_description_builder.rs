use std::collections::BTreeSet;

use tracing::instrument;

use crate::{ElectionId, ServerAddress, ServerDescription, ServerDescriptionError, ServerType};

/// Accumulates the fields of a [`ServerDescription`] and validates them once in
/// [`build`](ServerDescriptionBuilder::build).
#[derive(Debug, Default)]
pub struct ServerDescriptionBuilder {
    address: Option<ServerAddress>,
    server_type: ServerType,
    me: Option<ServerAddress>,
    hosts: BTreeSet<ServerAddress>,
    set_name: Option<String>,
    set_version: Option<i32>,
    election_id: Option<ElectionId>,
    primary: Option<ServerAddress>,
}

impl ServerDescriptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: ServerAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_type(mut self, server_type: ServerType) -> Self {
        self.server_type = server_type;
        self
    }

    pub fn with_me(mut self, me: ServerAddress) -> Self {
        self.me = Some(me);
        self
    }

    /// Adds one entry to the host list. May be called repeatedly.
    pub fn with_host(mut self, host: ServerAddress) -> Self {
        tracing::trace!("Adding host `{}`", &host);
        self.hosts.insert(host);
        self
    }

    pub fn with_hosts<I>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = ServerAddress>,
    {
        self.hosts.extend(hosts);
        self
    }

    pub fn with_set_name(mut self, set_name: &str) -> Self {
        self.set_name = Some(set_name.to_string());
        self
    }

    pub fn with_set_version(mut self, set_version: i32) -> Self {
        self.set_version = Some(set_version);
        self
    }

    pub fn with_election_id(mut self, election_id: ElectionId) -> Self {
        self.election_id = Some(election_id);
        self
    }

    pub fn with_primary(mut self, primary: ServerAddress) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Consumes the builder and returns the finished [`ServerDescription`].
    #[instrument(level = "trace", name = "Build ServerDescription", skip(self))]
    pub fn build(self) -> Result<ServerDescription, ServerDescriptionError> {
        let address = match self.address {
            Some(address) => address,
            None => {
                tracing::error!(
                    "A {} server description was built without an address",
                    self.server_type
                );
                return Err(ServerDescriptionError::MissingAddress);
            }
        };

        Ok(ServerDescription {
            address,
            server_type: self.server_type,
            me: self.me,
            hosts: self.hosts,
            set_name: self.set_name,
            set_version: self.set_version,
            election_id: self.election_id,
            primary: self.primary,
        })
    }
}
