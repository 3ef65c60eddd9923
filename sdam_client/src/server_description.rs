mod server_description_builder;
mod server_description_error;
mod server_type;

use std::collections::BTreeSet;

pub use server_description_builder::*;
pub use server_description_error::*;
pub use server_type::*;

use crate::{ElectionId, ServerAddress};

/// One server's self-reported state at a point in time.
///
/// A description is immutable once built. A newer description for the same address
/// replaces it in the topology rather than updating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDescription {
    pub(crate) address: ServerAddress,
    pub(crate) server_type: ServerType,
    pub(crate) me: Option<ServerAddress>,
    pub(crate) hosts: BTreeSet<ServerAddress>,
    pub(crate) set_name: Option<String>,
    pub(crate) set_version: Option<i32>,
    pub(crate) election_id: Option<ElectionId>,
    pub(crate) primary: Option<ServerAddress>,
}

impl ServerDescription {
    pub fn builder() -> ServerDescriptionBuilder {
        ServerDescriptionBuilder::default()
    }

    /// A placeholder for an address nobody has checked yet.
    pub fn unknown(address: ServerAddress) -> Self {
        Self {
            address,
            server_type: ServerType::Unknown,
            me: None,
            hosts: BTreeSet::new(),
            set_name: None,
            set_version: None,
            election_id: None,
            primary: None,
        }
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn server_type(&self) -> ServerType {
        self.server_type
    }

    /// The address the server claims to be reachable at.
    pub fn me(&self) -> Option<&ServerAddress> {
        self.me.as_ref()
    }

    /// The replica set members this server knows about.
    pub fn hosts(&self) -> &BTreeSet<ServerAddress> {
        &self.hosts
    }

    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    pub fn set_version(&self) -> Option<i32> {
        self.set_version
    }

    pub fn election_id(&self) -> Option<ElectionId> {
        self.election_id
    }

    /// The address this server believes is the current primary.
    pub fn primary(&self) -> Option<&ServerAddress> {
        self.primary.as_ref()
    }

    /// True when the server reports a `me` that differs from the address it is tracked under.
    pub fn has_mismatched_me(&self) -> bool {
        self.me.as_ref().map(|me| *me != self.address).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerDescription, ServerType};

    #[test]
    fn unknown_placeholder_has_only_an_address() {
        let address = "localhost:123".parse().unwrap();

        let description = ServerDescription::unknown(address);

        assert_eq!(description.address().to_string(), "localhost:123");
        assert_eq!(description.server_type(), ServerType::Unknown);
        assert!(description.hosts().is_empty());
        assert!(description.me().is_none());
        assert!(description.set_name().is_none());
        assert!(description.set_version().is_none());
        assert!(description.election_id().is_none());
        assert!(description.primary().is_none());
    }

    #[test]
    fn mismatched_me_is_detected_case_insensitively() {
        let matching = ServerDescription::builder()
            .with_address("localhost:123".parse().unwrap())
            .with_me("LOCALHOST:123".parse().unwrap())
            .build()
            .unwrap();
        let mismatched = ServerDescription::builder()
            .with_address("localhost:123".parse().unwrap())
            .with_me("foolocalhost:123".parse().unwrap())
            .build()
            .unwrap();
        let absent = ServerDescription::builder()
            .with_address("localhost:123".parse().unwrap())
            .build()
            .unwrap();

        assert!(!matching.has_mismatched_me());
        assert!(mismatched.has_mismatched_me());
        assert!(!absent.has_mismatched_me());
    }
}
