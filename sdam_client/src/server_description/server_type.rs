use std::fmt;

use serde::{Deserialize, Serialize};

/// The role a server reported for itself in its handshake reply.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerType {
    #[default]
    Unknown,
    Standalone,
    /// A stateless query router in front of a sharded cluster.
    Mongos,
    RSPrimary,
    RSSecondary,
    RSArbiter,
    RSOther,
    RSGhost,
    PossiblePrimary,
}

impl ServerType {
    pub const ALL: [ServerType; 9] = [
        ServerType::Unknown,
        ServerType::Standalone,
        ServerType::Mongos,
        ServerType::RSPrimary,
        ServerType::RSSecondary,
        ServerType::RSArbiter,
        ServerType::RSOther,
        ServerType::RSGhost,
        ServerType::PossiblePrimary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Unknown => "Unknown",
            ServerType::Standalone => "Standalone",
            ServerType::Mongos => "Mongos",
            ServerType::RSPrimary => "RSPrimary",
            ServerType::RSSecondary => "RSSecondary",
            ServerType::RSArbiter => "RSArbiter",
            ServerType::RSOther => "RSOther",
            ServerType::RSGhost => "RSGhost",
            ServerType::PossiblePrimary => "PossiblePrimary",
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
