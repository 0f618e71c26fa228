// Formatting utilities shared by the layout

/// Octas per MOVE
const OCTAS_PER_MOVE: f64 = 100_000_000.0;

/// Format an on-chain amount (octas) as MOVE with up to `decimals` places
pub fn format_move(amount: Option<f64>, decimals: usize) -> String {
    let value = amount.unwrap_or(0.0) / OCTAS_PER_MOVE;
    let formatted = format!("{:.*}", decimals, value);
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

/// `0x1234...abcd`, or `Unknown` when absent
pub fn shorten_address(address: Option<&str>) -> String {
    match address {
        None | Some("") => "Unknown".to_string(),
        Some(addr) if addr.chars().count() <= 10 => addr.to_string(),
        Some(addr) => {
            let chars: Vec<char> = addr.chars().collect();
            let head: String = chars[..6].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

/// Last `::` segment of a Move type path (`0x1::coin::Transfer` → `Transfer`)
pub fn short_type_name(type_path: &str) -> &str {
    type_path.rsplit("::").next().unwrap_or(type_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_move() {
        assert_eq!(format_move(Some(150_000_000.0), 4), "1.5");
        assert_eq!(format_move(Some(123_456_789.0), 4), "1.2346");
        assert_eq!(format_move(None, 4), "0");
        assert_eq!(format_move(Some(200_000_000.0), 2), "2");
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(shorten_address(Some("0x1234567890abcdef")), "0x1234...cdef");
        assert_eq!(shorten_address(Some("0xabc")), "0xabc");
        assert_eq!(shorten_address(None), "Unknown");
        assert_eq!(shorten_address(Some("")), "Unknown");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("0x1::coin::CoinDeposit"), "CoinDeposit");
        assert_eq!(short_type_name("plain"), "plain");
    }
}
