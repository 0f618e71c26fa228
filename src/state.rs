use {
    crate::{
        buffer::EventBuffer,
        event::Event,
        metrics::{Metrics, MetricsAggregator},
    },
    std::sync::Arc,
    tokio::sync::{mpsc, oneshot, watch, RwLock},
};

/// Message sent through the channel from the feed connection (or the
/// dashboard) to the state aggregator
#[derive(Debug)]
pub enum StateMessage {
    Event(Event),
    /// Empty the buffer and reset metrics; the sender is notified once done
    Clear(oneshot::Sender<()>),
    Shutdown,
}

/// Read-only view handed to renderers and the exporter
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub events: Vec<Event>,
    pub metrics: Metrics,
    pub capacity: usize,
}

/// In-memory session state: the event buffer and its metrics, mutated in lockstep
///
/// Uses channel-based ingestion: the feed connection sends `Event` messages
/// via channel, a single background task receives and applies them.
pub struct DashboardState {
    buffer: EventBuffer,
    aggregator: MetricsAggregator,
}

impl DashboardState {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: EventBuffer::new(capacity),
            aggregator: MetricsAggregator::new(),
        }
    }

    /// Add an event (called by the background aggregator task)
    pub fn ingest(&mut self, event: Event) {
        self.aggregator.apply_insert(&event);
        if let Some(evicted) = self.buffer.push(event) {
            log::trace!("Evicted event #{} from buffer", evicted.sequence);
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.aggregator.reset();
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    pub fn metrics(&self) -> &Metrics {
        self.aggregator.metrics()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            events: self.buffer.snapshot(),
            metrics: self.aggregator.metrics().clone(),
            capacity: self.buffer.capacity(),
        }
    }
}

/// Background task that receives messages from the channel and applies them to
/// `DashboardState`, bumping `revision` after every mutation
pub async fn state_aggregator_task(
    mut receiver: mpsc::Receiver<StateMessage>,
    state: Arc<RwLock<DashboardState>>,
    revision: watch::Sender<u64>,
) {
    log::info!("State aggregator task started");

    while let Some(message) = receiver.recv().await {
        match message {
            StateMessage::Event(event) => {
                let mut state = state.write().await;
                log::debug!(
                    "Event #{} {} ({} buffered)",
                    event.sequence,
                    event.category,
                    state.buffer().len()
                );
                state.ingest(event);
            }
            StateMessage::Clear(done) => {
                state.write().await.clear();
                log::info!("🧹 Cleared event buffer and metrics");
                let _ = done.send(());
            }
            StateMessage::Shutdown => {
                log::info!("State aggregator received shutdown signal");
                break;
            }
        }
        revision.send_modify(|rev| *rev += 1);
    }

    log::info!("State aggregator task stopped");
}

/// Current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, EventData};

    fn create_test_event(sequence: u64, amount: f64) -> Event {
        Event {
            category: Category::Mint,
            kind: "mint".to_string(),
            sequence,
            data: EventData {
                amount: Some(amount),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_metrics_stay_cumulative_past_capacity() {
        let mut state = DashboardState::new(100);
        for seq in 0..150 {
            state.ingest(create_test_event(seq, 1.0));
        }

        assert_eq!(state.buffer().len(), 100);
        assert_eq!(state.metrics().total, 150);
        assert_eq!(state.metrics().mints, 150);
        assert_eq!(state.metrics().total_volume, 150.0);
    }

    #[test]
    fn test_clear_resets_buffer_and_metrics() {
        let mut state = DashboardState::new(10);
        state.ingest(create_test_event(1, 5.0));
        state.clear();

        let snapshot = state.snapshot();
        assert!(snapshot.events.is_empty());
        assert_eq!(snapshot.metrics, Metrics::default());
        assert_eq!(snapshot.capacity, 10);
    }

    #[tokio::test]
    async fn test_aggregator_task_serializes_messages() {
        let (tx, rx) = mpsc::channel(16);
        let (rev_tx, mut rev_rx) = watch::channel(0u64);
        let state = Arc::new(RwLock::new(DashboardState::new(10)));
        let handle = tokio::spawn(state_aggregator_task(rx, state.clone(), rev_tx));

        tx.send(StateMessage::Event(create_test_event(1, 2.0))).await.unwrap();
        tx.send(StateMessage::Event(create_test_event(2, 3.0))).await.unwrap();
        rev_rx.wait_for(|rev| *rev >= 2).await.unwrap();
        assert_eq!(state.read().await.metrics().total, 2);

        let (done_tx, done_rx) = oneshot::channel();
        tx.send(StateMessage::Clear(done_tx)).await.unwrap();
        done_rx.await.unwrap();
        assert!(state.read().await.buffer().is_empty());
        assert_eq!(state.read().await.metrics().total, 0);

        tx.send(StateMessage::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
