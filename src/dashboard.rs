//! Dashboard session controller
//!
//! Owns one access gate, one feed connection and the shared event state for
//! a single identity. Presentation layers drive it through explicit calls
//! and observe it through `subscribe` (state revisions) and
//! `subscribe_status` (connection status).

use {
    crate::{
        access::{AccessError, AccessGate, AccessGrant, AccessState, SignatureOutcome, SignatureRequest, Signer},
        config::Config,
        export::{export_to_file, ExportError},
        state::{current_timestamp_millis, state_aggregator_task, DashboardSnapshot, DashboardState, StateMessage},
        stream::{ConnectionStatus, StreamConnection, StreamError},
    },
    std::{path::PathBuf, sync::Arc},
    tokio::{
        sync::{mpsc, oneshot, watch, RwLock},
        task::JoinHandle,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("State aggregator is not running")]
    StateClosed,
}

pub struct Dashboard {
    identity: String,
    gate: AccessGate,
    grant: Option<AccessGrant>,
    connection: StreamConnection,
    state: Arc<RwLock<DashboardState>>,
    state_tx: mpsc::Sender<StateMessage>,
    revisions: watch::Receiver<u64>,
    aggregator: JoinHandle<()>,
    export_dir: PathBuf,
}

impl Dashboard {
    /// Build the session and spawn its state aggregator task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &Config, identity: impl Into<String>, gate: AccessGate) -> Self {
        // tokio channels need a non-zero bound
        let (state_tx, state_rx) = mpsc::channel::<StateMessage>(config.channel_buffer.max(1));
        let (revision_tx, revisions) = watch::channel(0u64);
        let state = Arc::new(RwLock::new(DashboardState::new(config.buffer_capacity)));

        let aggregator = tokio::spawn(state_aggregator_task(state_rx, state.clone(), revision_tx));
        let connection = StreamConnection::new(
            config.backend_url.clone(),
            config.connect_timeout,
            state_tx.clone(),
        );

        Self {
            identity: identity.into(),
            gate,
            grant: None,
            connection,
            state,
            state_tx,
            revisions,
            aggregator,
            export_dir: config.export_dir.clone(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_unlocked(&self) -> bool {
        self.grant.is_some()
    }

    /// Re-read the persisted access record for this identity
    pub async fn refresh_access(&mut self) -> Result<AccessState, DashboardError> {
        let state = self.gate.check_unlocked(&self.identity).await?;
        self.grant = match state {
            AccessState::Unlocked => Some(self.gate.grant(&self.identity).await?),
            AccessState::Locked => None,
        };
        Ok(state)
    }

    /// Ask the external signer for a signature and record the outcome
    pub async fn unlock(&mut self, signer: &dyn Signer) -> Result<(), DashboardError> {
        if self.refresh_access().await? == AccessState::Unlocked {
            return Ok(());
        }

        let request = SignatureRequest::new(&self.identity, current_timestamp_millis());
        log::info!("✍️  Requesting access signature for {}", self.identity);
        let outcome = signer.sign(&request).await;
        self.unlock_with(outcome).await
    }

    /// Record an outcome obtained elsewhere
    pub async fn unlock_with(&mut self, outcome: SignatureOutcome) -> Result<(), DashboardError> {
        let grant = self.gate.unlock(&self.identity, outcome).await?;
        self.grant = Some(grant);
        Ok(())
    }

    /// Open the feed connection. Fails with `AlreadyConnected` while streaming.
    pub fn start_streaming(&mut self, filter: Option<&str>) -> Result<(), DashboardError> {
        let grant = self
            .grant
            .as_ref()
            .ok_or_else(|| AccessError::Locked(self.identity.clone()))?;
        self.connection.open(grant, filter)?;
        Ok(())
    }

    pub fn stop_streaming(&mut self) {
        self.connection.close();
    }

    /// Empty the buffer and reset metrics
    ///
    /// Goes through the same queue as incoming events, so it never
    /// interleaves with an insert.
    pub async fn clear(&self) -> Result<(), DashboardError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.state_tx
            .send(StateMessage::Clear(done_tx))
            .await
            .map_err(|_| DashboardError::StateClosed)?;
        done_rx.await.map_err(|_| DashboardError::StateClosed)
    }

    /// Export the buffer as CSV. `Ok(None)` when the buffer is empty.
    pub async fn export(&self) -> Result<Option<PathBuf>, DashboardError> {
        let events = self.state.read().await.buffer().snapshot();
        Ok(export_to_file(&self.export_dir, &events, current_timestamp_millis())?)
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().await.snapshot()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }

    /// Receiver that changes after every buffer/metrics mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revisions.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.subscribe()
    }

    /// Close the feed and stop the state aggregator
    pub async fn shutdown(mut self) {
        self.connection.close();
        let _ = self.state_tx.send(StateMessage::Shutdown).await;
        if let Err(e) = (&mut self.aggregator).await {
            log::error!("State aggregator task failed: {}", e);
        }
    }
}
