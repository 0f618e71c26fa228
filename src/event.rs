//! Feed messages and decoded events
//!
//! The feed sends one JSON text frame per occurrence:
//! `{ "type": "swap", "data": { ... }, "cursor": 1234 }`.
//! Every payload field is optional; numeric fields arrive either as JSON
//! numbers or as numeric strings depending on the upstream indexer.

use serde::{Deserialize, Deserializer};

/// Closed set of event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Swap,
    Transfer,
    Mint,
    Burn,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Swap => "swap",
            Category::Transfer => "transfer",
            Category::Mint => "mint",
            Category::Burn => "burn",
            Category::Other => "other",
        }
    }

    /// Map a feed `type` tag to a category. Unknown tags land in `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "swap" => Category::Swap,
            "transfer" => Category::Transfer,
            "mint" => Category::Mint,
            "burn" => Category::Burn,
            _ => Category::Other,
        }
    }

    pub fn all() -> [Category; 5] {
        [
            Category::Swap,
            Category::Transfer,
            Category::Mint,
            Category::Burn,
            Category::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific payload fields
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventData {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub version: Option<u64>,
    pub hash: Option<String>,
    pub account: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount_in: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount_out: Option<f64>,
    pub token_in: Option<String>,
    pub token_out: Option<String>,
    pub token_type: Option<String>,
    pub activity_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub timestamp: Option<u64>,
    pub contract_address: Option<String>,
}

/// Message as it arrives on the wire, before classification
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type", default, deserialize_with = "lenient_tag")]
    pub kind: String,
    #[serde(default)]
    pub data: EventData,
    #[serde(default, alias = "sequence", deserialize_with = "lenient_u64")]
    pub cursor: Option<u64>,
}

/// One decoded occurrence from the feed. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub category: Category,
    /// Tag exactly as sent by the feed (e.g. `account_activity`)
    pub kind: String,
    pub sequence: u64,
    pub data: EventData,
}

/// Parse one inbound text frame
pub fn decode_message(text: &str) -> Result<RawMessage, serde_json::Error> {
    serde_json::from_str(text)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

/// A non-string `type` is kept as its JSON text and classifies as `Other`
fn lenient_tag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(tag)) => tag,
        Some(other) => other.to_string(),
        None => String::new(),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => n.as_f64(),
        Some(NumberOrString::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        }),
        Some(NumberOrString::Text(s)) => s.trim().parse::<u64>().ok(),
        None => None,
    })
}
