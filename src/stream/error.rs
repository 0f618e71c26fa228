use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error("Invalid feed endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Connection error: {0}. Make sure the backend is running.")]
    Transport(String),
    #[error("Connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("Already connected; disconnect before starting a new stream")]
    AlreadyConnected,
    #[error("Connection closed unexpectedly (code: {code})")]
    UnexpectedClose { code: u16, reason: String },
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        StreamError::Transport(err.to_string())
    }
}
