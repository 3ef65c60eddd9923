use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error_chain_fmt;

/// A normalized `host:port` identifier for a single server.
///
/// The host is lower-cased on construction, so equality, hashing and ordering are
/// case-insensitive on the host. This is the key used for topology membership.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    pub const DEFAULT_PORT: u16 = 27017;

    pub fn new(host: &str, port: u16) -> Result<Self, ServerAddressError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ServerAddressError::EmptyHost);
        }
        Ok(Self {
            host: host.to_ascii_lowercase(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for ServerAddress {
    type Err = ServerAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Bracketed IPv6 literal, optionally followed by `:port`
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| ServerAddressError::UnterminatedIpv6(s.to_string()))?;
            let port = match tail {
                "" => Self::DEFAULT_PORT,
                _ => match tail.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => return Err(ServerAddressError::InvalidPort(tail.to_string())),
                },
            };
            return Self::new(host, port);
        }

        match s.matches(':').count() {
            0 => Self::new(s, Self::DEFAULT_PORT),
            1 => {
                let (host, port) = s
                    .split_once(':')
                    .ok_or_else(|| ServerAddressError::InvalidPort(s.to_string()))?;
                Self::new(host, parse_port(port)?)
            }
            _ => Err(ServerAddressError::UnbracketedIpv6(s.to_string())),
        }
    }
}

fn parse_port(port: &str) -> Result<u16, ServerAddressError> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(ServerAddressError::InvalidPort(port.to_string())),
        Ok(p) => Ok(p),
    }
}

impl TryFrom<String> for ServerAddress {
    type Error = ServerAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerAddress> for String {
    fn from(address: ServerAddress) -> Self {
        address.to_string()
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerAddress({})", self)
    }
}

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum ServerAddressError {
    #[error("A server address must have a non-empty host")]
    EmptyHost,
    #[error("`{0}` is not a valid port")]
    InvalidPort(String),
    #[error("IPv6 address `{0}` is missing its closing bracket")]
    UnterminatedIpv6(String),
    #[error("IPv6 address `{0}` must be enclosed in brackets")]
    UnbracketedIpv6(String),
}
impl std::fmt::Debug for ServerAddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
