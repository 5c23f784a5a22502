//! Error taxonomy.
//!
//! None of these are fatal to the process. Transport and decode failures stop
//! the sync loop; placement failures skip a single object.

use std::time::Duration;

use thiserror::Error;

use crate::scene::PrefabKind;

/// A request could not be completed, or the server answered with a non-2xx
/// status.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid server url `{0}`")]
    InvalidUrl(String),
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed http response: {0}")]
    MalformedResponse(String),
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// The snapshot payload could not be decoded.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty snapshot payload")]
    Empty,
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a snapshot fetch: either the request or the payload.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A single placement could not be performed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no asset configured for prefab {0:?}")]
    MissingPrefab(PrefabKind),
    #[error("backend rejected {prefab:?}: {reason}")]
    Rejected { prefab: PrefabKind, reason: String },
}

impl PlacementError {
    pub fn prefab(&self) -> PrefabKind {
        match self {
            PlacementError::MissingPrefab(p) => *p,
            PlacementError::Rejected { prefab, .. } => *prefab,
        }
    }
}
