use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error_chain_fmt;

/// Identifier of a primary's election epoch, as reported by a replica set primary.
///
/// Twelve opaque bytes compared bytewise; a later election always yields a greater id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElectionId([u8; 12]);

impl ElectionId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }
}

impl From<[u8; 12]> for ElectionId {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}

impl FromStr for ElectionId {
    type Err = ElectionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = hex::decode(s)?;
        let bytes: [u8; 12] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| ElectionIdError::InvalidLength(decoded.len()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ElectionId {
    type Error = ElectionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ElectionId> for String {
    fn from(id: ElectionId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElectionId({})", self)
    }
}

#[derive(thiserror::Error)]
pub enum ElectionIdError {
    #[error("Election id is not valid hex")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Election id must be 12 bytes, got {0}")]
    InvalidLength(usize),
}
impl std::fmt::Debug for ElectionIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
