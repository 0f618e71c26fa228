//! Access gating
//!
//! Streaming is locked per identity until an external signing step
//! succeeds. The unlock decision is persisted through an `AccessStore`
//! keyed by the lowercased identity and is never cleared automatically.

pub mod gate;
pub mod signer;
pub mod sqlite_store;
pub mod store;

pub use gate::{access_key, AccessGate, AccessGrant, AccessState};
pub use signer::{access_request_message, CommandSigner, SignatureOutcome, SignatureRequest, Signer};
pub use sqlite_store::SqliteAccessStore;
pub use store::{AccessStore, JsonFileAccessStore, MemoryAccessStore};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Identity must not be empty")]
    EmptyIdentity,
    #[error("Streaming is locked for {0}; sign the access request first")]
    Locked(String),
    #[error("Signature failed: {0}. Please try again.")]
    SignatureRejected(String),
    #[error("Access store error: {0}")]
    Store(String),
}

impl From<std::io::Error> for AccessError {
    fn from(err: std::io::Error) -> Self {
        AccessError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for AccessError {
    fn from(err: serde_json::Error) -> Self {
        AccessError::Store(err.to_string())
    }
}

impl From<rusqlite::Error> for AccessError {
    fn from(err: rusqlite::Error) -> Self {
        AccessError::Store(err.to_string())
    }
}
