use {
    super::{signer::SignatureOutcome, store::AccessStore, AccessError},
    std::sync::Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Locked,
    Unlocked,
}

/// Proof that the gate is unlocked for an identity
///
/// Only the gate can construct one, and `StreamConnection::open` requires
/// it, so streaming cannot start for a locked identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    identity: String,
}

impl AccessGrant {
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Normalised store key for an identity (trimmed, lowercased)
pub fn access_key(identity: &str) -> Result<String, AccessError> {
    let key = identity.trim().to_lowercase();
    if key.is_empty() {
        return Err(AccessError::EmptyIdentity);
    }
    Ok(key)
}

/// Per-identity Locked/Unlocked state machine over a persisted store
#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn AccessStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Persisted state for `identity`; Locked when no record exists
    pub async fn check_unlocked(&self, identity: &str) -> Result<AccessState, AccessError> {
        let key = access_key(identity)?;
        match self.store.get(&key).await? {
            Some(true) => Ok(AccessState::Unlocked),
            _ => Ok(AccessState::Locked),
        }
    }

    /// Grant for an identity that is already unlocked
    pub async fn grant(&self, identity: &str) -> Result<AccessGrant, AccessError> {
        match self.check_unlocked(identity).await? {
            AccessState::Unlocked => Ok(AccessGrant {
                identity: access_key(identity)?,
            }),
            AccessState::Locked => Err(AccessError::Locked(identity.trim().to_string())),
        }
    }

    /// Record the outcome of the external signing step
    ///
    /// An identity that is already unlocked stays unlocked and the call
    /// succeeds without consulting `outcome`. A rejected signature leaves
    /// the identity locked; the caller may retry.
    pub async fn unlock(
        &self,
        identity: &str,
        outcome: SignatureOutcome,
    ) -> Result<AccessGrant, AccessError> {
        let key = access_key(identity)?;

        if self.store.get(&key).await? == Some(true) {
            log::debug!("Identity {} already unlocked", key);
            return Ok(AccessGrant { identity: key });
        }

        match outcome {
            SignatureOutcome::Accepted => {
                self.store.set(&key, true).await?;
                log::info!("🔓 Streaming unlocked for {} ({} store)", key, self.store.backend_type());
                Ok(AccessGrant { identity: key })
            }
            SignatureOutcome::Rejected(reason) => {
                log::warn!("Signature rejected for {}: {}", key, reason);
                Err(AccessError::SignatureRejected(reason))
            }
        }
    }
}
