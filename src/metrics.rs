use {
    crate::{
        classify::contribution,
        event::{Category, Event},
    },
    std::collections::HashSet,
};

/// Session totals, as shown on the dashboard cards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total: u64,
    pub swaps: u64,
    pub transfers: u64,
    pub mints: u64,
    pub burns: u64,
    pub other: u64,
    /// Raw on-chain units (octas)
    pub total_volume: f64,
    pub unique_participants: usize,
}

impl Metrics {
    pub fn count(&self, category: Category) -> u64 {
        match category {
            Category::Swap => self.swaps,
            Category::Transfer => self.transfers,
            Category::Mint => self.mints,
            Category::Burn => self.burns,
            Category::Other => self.other,
        }
    }

    /// Percentage of all events falling in `category` (0 when empty)
    pub fn share(&self, category: Category) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(category) as f64 / self.total as f64 * 100.0
    }
}

/// Running aggregation over every event inserted this session
///
/// Totals are cumulative: an event evicted from the bounded buffer stays
/// counted. Only `reset` (paired with a buffer clear) zeroes them.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    metrics: Metrics,
    participants: HashSet<String>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_insert(&mut self, event: &Event) {
        let m = &mut self.metrics;
        m.total += 1;
        match event.category {
            Category::Swap => m.swaps += 1,
            Category::Transfer => m.transfers += 1,
            Category::Mint => m.mints += 1,
            Category::Burn => m.burns += 1,
            Category::Other => m.other += 1,
        }

        let contribution = contribution(event);
        m.total_volume += contribution.volume;

        for participant in contribution.participants {
            if !self.participants.contains(participant) {
                self.participants.insert(participant.to_string());
            }
        }
        m.unique_participants = self.participants.len();
    }

    pub fn reset(&mut self) {
        self.metrics = Metrics::default();
        self.participants.clear();
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn participants(&self) -> &HashSet<String> {
        &self.participants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventData;

    fn create_test_event(category: Category, data: EventData) -> Event {
        Event {
            category,
            kind: category.as_str().to_string(),
            sequence: 0,
            data,
        }
    }

    fn transfer(amount: f64) -> Event {
        create_test_event(
            Category::Transfer,
            EventData {
                amount: Some(amount),
                ..Default::default()
            },
        )
    }

    fn assert_counts_consistent(m: &Metrics) {
        assert_eq!(m.total, m.swaps + m.transfers + m.mints + m.burns + m.other);
    }

    #[test]
    fn test_three_transfers() {
        let mut agg = MetricsAggregator::new();
        for amount in [100.0, 200.0, 300.0] {
            agg.apply_insert(&transfer(amount));
        }

        let m = agg.metrics();
        assert_eq!(m.total, 3);
        assert_eq!(m.transfers, 3);
        assert_eq!(m.total_volume, 600.0);
        assert_eq!(m.unique_participants, 0);
        assert_counts_consistent(m);
    }

    #[test]
    fn test_mixed_categories_and_participants() {
        let mut agg = MetricsAggregator::new();
        let events = vec![
            create_test_event(
                Category::Swap,
                EventData {
                    amount_in: Some(10.0),
                    amount_out: Some(5.0),
                    account: Some("0xa".to_string()),
                    ..Default::default()
                },
            ),
            create_test_event(
                Category::Transfer,
                EventData {
                    amount: Some(7.0),
                    from: Some("0xa".to_string()),
                    to: Some("0xb".to_string()),
                    ..Default::default()
                },
            ),
            create_test_event(
                Category::Mint,
                EventData {
                    account: Some("0xc".to_string()),
                    ..Default::default()
                },
            ),
            create_test_event(
                Category::Burn,
                EventData {
                    amount: Some(3.0),
                    ..Default::default()
                },
            ),
            create_test_event(
                Category::Other,
                EventData {
                    amount: Some(1_000.0),
                    account: Some("0xb".to_string()),
                    ..Default::default()
                },
            ),
        ];

        let mut last_volume = 0.0;
        let mut last_unique = 0;
        for event in &events {
            agg.apply_insert(event);
            let m = agg.metrics();
            assert_counts_consistent(m);
            assert!(m.total_volume >= last_volume);
            assert!(m.unique_participants >= last_unique);
            assert!(m.unique_participants as u64 <= m.total * 3);
            last_volume = m.total_volume;
            last_unique = m.unique_participants;
        }

        let m = agg.metrics();
        assert_eq!(m.total, 5);
        assert_eq!((m.swaps, m.transfers, m.mints, m.burns, m.other), (1, 1, 1, 1, 1));
        assert_eq!(m.total_volume, 25.0);
        assert_eq!(m.unique_participants, 3);
        assert_eq!(m.share(Category::Swap), 20.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut agg = MetricsAggregator::new();
        agg.apply_insert(&create_test_event(
            Category::Swap,
            EventData {
                amount_in: Some(1.0),
                account: Some("0xa".to_string()),
                ..Default::default()
            },
        ));

        agg.reset();

        assert_eq!(agg.metrics(), &Metrics::default());
        assert!(agg.participants().is_empty());
        assert_eq!(agg.metrics().share(Category::Swap), 0.0);
    }
}
