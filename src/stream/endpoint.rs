use super::error::StreamError;
use url::Url;

/// Build the feed URL from the configured backend address
///
/// - `http://` becomes `ws://`, `https://` becomes `wss://`
/// - the path gets a trailing `/ws` unless it already ends with one
/// - a non-empty contract filter is appended as `?contract=<encoded>`
pub fn stream_url(base: &str, contract: Option<&str>) -> Result<Url, StreamError> {
    let mut url = Url::parse(base.trim())
        .map_err(|e| StreamError::InvalidEndpoint(format!("{}: {}", base, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(StreamError::InvalidEndpoint(format!(
                "unsupported scheme '{}' in {}",
                other, base
            )))
        }
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|_| StreamError::InvalidEndpoint(format!("cannot switch {} to {}", base, scheme)))?;
    }

    if !url.path().ends_with("/ws") {
        let path = format!("{}/ws", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }

    if let Some(contract) = contract.map(str::trim).filter(|c| !c.is_empty()) {
        url.query_pairs_mut().append_pair("contract", contract);
    }

    Ok(url)
}
