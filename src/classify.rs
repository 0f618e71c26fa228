//! Event classification
//!
//! Pure mapping from a raw feed message to a categorised `Event`, plus the
//! aggregation contribution of an event (volume and participants).
//! Classification never fails: anything unrecognised degrades to `Other`.

use crate::event::{Category, Event, RawMessage};

/// What one event adds to the running metrics
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution<'a> {
    pub volume: f64,
    pub participants: Vec<&'a str>,
}

/// Turn a decoded wire message into an `Event`
///
/// The sequence comes from `cursor`, falling back to the payload's
/// `version` and finally to 0.
pub fn classify(raw: RawMessage) -> Event {
    let category = Category::from_tag(&raw.kind);
    let sequence = raw.cursor.or(raw.data.version).unwrap_or(0);

    Event {
        category,
        kind: raw.kind,
        sequence,
        data: raw.data,
    }
}

/// Volume and participants an event contributes
///
/// - swap: `amount_in + amount_out`
/// - transfer / mint / burn: `amount`
/// - other: nothing
///
/// Missing, negative or non-finite amounts count as 0.
pub fn contribution(event: &Event) -> Contribution<'_> {
    let data = &event.data;
    let volume = match event.category {
        Category::Swap => non_negative(data.amount_in) + non_negative(data.amount_out),
        Category::Transfer | Category::Mint | Category::Burn => non_negative(data.amount),
        Category::Other => 0.0,
    };

    let participants = [&data.account, &data.from, &data.to]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter(|address| !address.is_empty())
        .collect();

    Contribution {
        volume,
        participants,
    }
}

fn non_negative(amount: Option<f64>) -> f64 {
    amount
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(0.0)
}
