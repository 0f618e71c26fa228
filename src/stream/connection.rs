use {
    super::{endpoint::stream_url, error::StreamError},
    crate::{access::AccessGrant, classify::classify, event::decode_message, state::StateMessage},
    chrono::{DateTime, Utc},
    futures_util::{SinkExt, StreamExt},
    std::{sync::Arc, time::Duration},
    tokio::sync::{mpsc, oneshot, watch},
    tokio_tungstenite::{
        connect_async,
        tungstenite::{
            protocol::{frame::coding::CloseCode, CloseFrame},
            Message,
        },
    },
    url::Url,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected - Streaming events",
        }
    }
}

/// Observable connection status
///
/// `generation` increases on every `open`/`close`; a background task only
/// publishes while its generation is still the current one, so a superseded
/// attempt can never overwrite the status of its replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub generation: u64,
    pub session_start: Option<DateTime<Utc>>,
    pub error: Option<StreamError>,
    pub filter: Option<String>,
}

impl ConnectionStatus {
    fn disconnected(generation: u64) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            generation,
            session_start: None,
            error: None,
            filter: None,
        }
    }
}

/// Single logical connection to the event feed
///
/// Decoded events are sent to the state aggregator through `sink`. There is
/// no reconnect loop: a failed or dropped connection stays `Disconnected`
/// until the caller opens it again.
pub struct StreamConnection {
    endpoint: String,
    connect_timeout: Option<Duration>,
    sink: mpsc::Sender<StateMessage>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    generation: u64,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StreamConnection {
    pub fn new(
        endpoint: impl Into<String>,
        connect_timeout: Option<Duration>,
        sink: mpsc::Sender<StateMessage>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::disconnected(0));
        Self {
            endpoint: endpoint.into(),
            connect_timeout,
            sink,
            status: Arc::new(status),
            generation: 0,
            shutdown: None,
        }
    }

    /// Start streaming from the feed
    ///
    /// Valid from `Disconnected` or `Connecting`; a pending attempt is shut
    /// down first. A live connection is left alone and `AlreadyConnected` is
    /// returned, `close` it before opening again. The status becomes
    /// `Connecting` before this returns; the transition to `Connected` or
    /// `Disconnected` happens in the background.
    /// Must be called from within a Tokio runtime.
    pub fn open(&mut self, grant: &AccessGrant, filter: Option<&str>) -> Result<(), StreamError> {
        if self.state() == ConnectionState::Connected {
            return Err(StreamError::AlreadyConnected);
        }
        let url = stream_url(&self.endpoint, filter)?;
        let filter = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        if self.stop_active() {
            log::info!("🔁 Replacing pending feed connection attempt");
        }

        self.generation += 1;
        let generation = self.generation;
        self.status.send_replace(ConnectionStatus {
            state: ConnectionState::Connecting,
            generation,
            session_start: None,
            error: None,
            filter: filter.clone(),
        });

        log::info!("🔌 Connecting to feed: {} (identity {})", url, grant.identity());
        if let Some(filter) = &filter {
            log::info!("   Contract filter: {}", filter);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown = Some(shutdown_tx);

        tokio::spawn(run_connection(
            url,
            generation,
            self.connect_timeout,
            self.sink.clone(),
            self.status.clone(),
            shutdown_rx,
        ));

        Ok(())
    }

    /// Clean shutdown; no error is surfaced
    pub fn close(&mut self) {
        if self.stop_active() {
            log::info!("🔌 Disconnected from feed");
        }
        self.generation += 1;
        self.status
            .send_replace(ConnectionStatus::disconnected(self.generation));
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Signal the running task (if any) to stop. Does not wait for it.
    fn stop_active(&mut self) -> bool {
        match self.shutdown.take() {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.stop_active();
    }
}

/// Update the status only if `generation` is still current
fn publish(
    status: &watch::Sender<ConnectionStatus>,
    generation: u64,
    update: impl FnOnce(&mut ConnectionStatus),
) -> bool {
    status.send_if_modified(|current| {
        if current.generation != generation {
            return false;
        }
        update(current);
        true
    })
}

async fn connect(
    url: &Url,
    connect_timeout: Option<Duration>,
) -> Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    StreamError,
> {
    let (ws, _response) = match connect_timeout {
        Some(limit) => tokio::time::timeout(limit, connect_async(url.as_str()))
            .await
            .map_err(|_| StreamError::ConnectTimeout(limit))??,
        None => connect_async(url.as_str()).await?,
    };
    Ok(ws)
}

/// Run a single connection until it fails, the peer closes it, or the
/// owner signals shutdown
async fn run_connection(
    url: Url,
    generation: u64,
    connect_timeout: Option<Duration>,
    sink: mpsc::Sender<StateMessage>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let attempt = tokio::select! {
        _ = &mut shutdown => {
            log::debug!("Connection attempt #{} cancelled", generation);
            return;
        }
        result = connect(&url, connect_timeout) => result,
    };

    let ws = match attempt {
        Ok(ws) => ws,
        Err(e) => {
            log::error!("❌ Feed connection failed: {}", e);
            publish(&status, generation, |s| {
                s.state = ConnectionState::Disconnected;
                s.error = Some(e);
            });
            return;
        }
    };

    let started = Utc::now();
    if !publish(&status, generation, |s| {
        s.state = ConnectionState::Connected;
        s.session_start = Some(started);
    }) {
        return;
    }
    log::info!("✅ Connected to feed");

    let (mut write, mut read) = ws.split();
    let mut delivered: u64 = 0;

    let outcome = loop {
        // shutdown wins over a ready frame
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                let _ = write.send(Message::Close(None)).await;
                log::debug!("Connection #{} closed by owner after {} events", generation, delivered);
                return;
            }
            frame = read.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_string(),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            log::warn!("Dropping non UTF-8 binary frame ({} bytes)", bytes.len());
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => break close_error(frame),
                    // pings are answered by tungstenite itself
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Some(StreamError::from(e)),
                    None => break Some(StreamError::UnexpectedClose {
                        code: 1006,
                        reason: "stream ended without a close frame".to_string(),
                    }),
                };

                match deliver(&text, &sink, &mut shutdown).await {
                    Delivery::Sent => {
                        delivered += 1;
                        if delivered == 1 {
                            log::info!("📥 First event received");
                        }
                    }
                    Delivery::Dropped => {}
                    Delivery::Cancelled => {
                        let _ = write.send(Message::Close(None)).await;
                        log::debug!("Connection #{} closed by owner after {} events", generation, delivered);
                        return;
                    }
                    Delivery::SinkClosed => {
                        log::warn!("State aggregator is gone, stopping feed connection");
                        break None;
                    }
                }
            }
        }
    };

    match &outcome {
        Some(e) => log::error!("❌ Feed connection lost: {}", e),
        None => log::info!("Feed closed the connection ({} events)", delivered),
    }
    publish(&status, generation, |s| {
        s.state = ConnectionState::Disconnected;
        s.error = outcome;
    });
}

enum Delivery {
    Sent,
    /// Malformed frame, nothing forwarded
    Dropped,
    /// Owner closed or replaced the connection while the send was pending
    Cancelled,
    SinkClosed,
}

/// Decode, classify and forward one frame. Malformed frames are dropped.
///
/// The send races the shutdown signal so a closed connection never pushes
/// another event into the shared queue.
async fn deliver(
    text: &str,
    sink: &mpsc::Sender<StateMessage>,
    shutdown: &mut oneshot::Receiver<()>,
) -> Delivery {
    let raw = match decode_message(text) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Failed to parse event, dropping it: {}", e);
            return Delivery::Dropped;
        }
    };
    let event = classify(raw);

    tokio::select! {
        biased;
        _ = shutdown => Delivery::Cancelled,
        sent = sink.send(StateMessage::Event(event)) => match sent {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::SinkClosed,
        },
    }
}

fn close_error(frame: Option<CloseFrame>) -> Option<StreamError> {
    match frame {
        Some(frame) if frame.code == CloseCode::Normal => None,
        Some(frame) => Some(StreamError::UnexpectedClose {
            code: u16::from(frame.code),
            reason: frame.reason.to_string(),
        }),
        None => Some(StreamError::UnexpectedClose {
            code: u16::from(CloseCode::Status),
            reason: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_error_codes() {
        assert_eq!(
            close_error(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "bye".into(),
            })),
            None
        );
        assert_eq!(
            close_error(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "restart".into(),
            })),
            Some(StreamError::UnexpectedClose {
                code: 1001,
                reason: "restart".to_string()
            })
        );
        assert!(matches!(
            close_error(None),
            Some(StreamError::UnexpectedClose { code: 1005, .. })
        ));
    }

    #[test]
    fn test_publish_ignores_stale_generation() {
        let (status, _) = watch::channel(ConnectionStatus::disconnected(2));

        assert!(!publish(&status, 1, |s| s.state = ConnectionState::Connected));
        assert_eq!(status.borrow().state, ConnectionState::Disconnected);

        assert!(publish(&status, 2, |s| s.state = ConnectionState::Connected));
        assert_eq!(status.borrow().state, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_deliver_drops_malformed_frames() {
        let (tx, mut rx) = mpsc::channel(4);
        let (_shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        assert!(matches!(deliver("{not json", &tx, &mut shutdown_rx).await, Delivery::Dropped));
        assert!(matches!(
            deliver(r#"{"type": "burn", "data": {"amount": 5}, "cursor": 11}"#, &tx, &mut shutdown_rx).await,
            Delivery::Sent
        ));

        match rx.recv().await {
            Some(StateMessage::Event(event)) => {
                assert_eq!(event.sequence, 11);
                assert_eq!(event.kind, "burn");
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deliver_gives_up_on_shutdown() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(StateMessage::Shutdown).await.unwrap();

        // queue full: the send would block, but shutdown already fired
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        shutdown_tx.send(()).unwrap();
        let outcome = deliver(r#"{"type": "mint", "cursor": 1}"#, &tx, &mut shutdown_rx).await;
        assert!(matches!(outcome, Delivery::Cancelled));

        assert!(matches!(rx.recv().await, Some(StateMessage::Shutdown)));
        assert!(rx.try_recv().is_err());
    }
}
