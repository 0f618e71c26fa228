//! CSV export of the buffered events
//!
//! One header line followed by one line per event in buffer order (newest
//! first). Absent fields are empty. Fields containing a comma, a quote or a
//! line break are quoted, with embedded quotes doubled.

use {
    crate::event::Event,
    std::{
        borrow::Cow,
        fs,
        path::{Path, PathBuf},
    },
};

pub const EXPORT_HEADERS: [&str; 12] = [
    "category",
    "sequence",
    "hash",
    "account",
    "from",
    "to",
    "amount",
    "amount_in",
    "amount_out",
    "token_in",
    "token_out",
    "timestamp",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render events as CSV text. Never mutates anything.
pub fn serialize(events: &[Event]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(EXPORT_HEADERS.join(","));

    for event in events {
        let fields = row(event);
        let escaped: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
        lines.push(escaped.join(","));
    }

    lines.join("\n")
}

/// Write `lightombo-events-<millis>.csv` into `dir`
///
/// Returns `Ok(None)` without touching the filesystem when there is
/// nothing to export.
pub fn export_to_file(
    dir: &Path,
    events: &[Event],
    timestamp_ms: i64,
) -> Result<Option<PathBuf>, ExportError> {
    if events.is_empty() {
        log::debug!("Export skipped: no buffered events");
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(format!("lightombo-events-{}.csv", timestamp_ms));
    fs::write(&path, serialize(events))?;

    log::info!("📝 Exported {} events to {}", events.len(), path.display());
    Ok(Some(path))
}

fn row(event: &Event) -> [String; 12] {
    let data = &event.data;
    [
        event.category.as_str().to_string(),
        event.sequence.to_string(),
        text(&data.hash),
        text(&data.account),
        text(&data.from),
        text(&data.to),
        number(data.amount),
        number(data.amount_in),
        number(data.amount_out),
        text(&data.token_in),
        text(&data.token_out),
        data.timestamp.map(|t| t.to_string()).unwrap_or_default(),
    ]
}

fn text(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}

fn number(field: Option<f64>) -> String {
    field.map(|n| n.to_string()).unwrap_or_default()
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, EventData};
    use tempfile::TempDir;

    fn swap_event() -> Event {
        Event {
            category: Category::Swap,
            kind: "swap".to_string(),
            sequence: 77,
            data: EventData {
                hash: Some("0xhash".to_string()),
                account: Some("0xtrader".to_string()),
                amount_in: Some(100000000.0),
                amount_out: Some(2.5),
                token_in: Some("0x1::aptos_coin::AptosCoin".to_string()),
                timestamp: Some(1_700_000_000),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_header_and_row_layout() {
        let csv = serialize(&[swap_event()]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "category,sequence,hash,account,from,to,amount,amount_in,amount_out,token_in,token_out,timestamp"
        );
        assert_eq!(
            lines[1],
            "swap,77,0xhash,0xtrader,,,,100000000,2.5,0x1::aptos_coin::AptosCoin,,1700000000"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_rows_follow_buffer_order() {
        let mut older = swap_event();
        older.sequence = 1;
        let newer = swap_event();

        let csv = serialize(&[newer, older]);
        let sequences: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(sequences, vec!["77", "1"]);
    }

    #[test]
    fn test_delimiters_are_quoted() {
        let mut event = swap_event();
        event.data.token_out = Some("coin,\"special\"".to_string());

        let csv = serialize(&[event]);
        assert!(csv.contains(",\"coin,\"\"special\"\"\","));
    }

    #[test]
    fn test_empty_export_is_noop() {
        let dir = TempDir::new().unwrap();
        let result = export_to_file(dir.path(), &[], 1).unwrap();

        assert!(result.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(serialize(&[]), EXPORT_HEADERS.join(","));
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = export_to_file(dir.path(), &[swap_event()], 1_700_000_000_123)
            .unwrap()
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "lightombo-events-1700000000123.csv"
        );
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, serialize(&[swap_event()]));
    }
}
