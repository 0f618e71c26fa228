use {
    async_trait::async_trait,
    std::process::Stdio,
    tokio::{io::AsyncWriteExt, process::Command},
};

/// Nonce sent along with every access request
pub const ACCESS_NONCE: &str = "lightombo-mvp";

/// Result of the external signing step. The gate never inspects signatures,
/// only this outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    Accepted,
    Rejected(String),
}

/// Message shown to the wallet holder when requesting access
pub fn access_request_message(identity: &str, timestamp_ms: i64) -> String {
    format!(
        "Lightombo Access Request\nWallet: {}\nTimestamp: {}",
        identity, timestamp_ms
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequest {
    pub identity: String,
    pub message: String,
    pub nonce: String,
}

impl SignatureRequest {
    pub fn new(identity: &str, timestamp_ms: i64) -> Self {
        Self {
            identity: identity.to_string(),
            message: access_request_message(identity, timestamp_ms),
            nonce: ACCESS_NONCE.to_string(),
        }
    }
}

/// External collaborator that asks the wallet to sign a request
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, request: &SignatureRequest) -> SignatureOutcome;
}

/// Signer backed by an external command
///
/// The command receives the request through `LIGHTOMBO_IDENTITY`,
/// `LIGHTOMBO_SIGN_MESSAGE` and `LIGHTOMBO_SIGN_NONCE`, and the message
/// on stdin. Exit status 0 means the signature was accepted; otherwise
/// stderr (or the exit status) becomes the rejection reason.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: String,
    args: Vec<String>,
}

impl CommandSigner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line. `None` if blank.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl Signer for CommandSigner {
    async fn sign(&self, request: &SignatureRequest) -> SignatureOutcome {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("LIGHTOMBO_IDENTITY", &request.identity)
            .env("LIGHTOMBO_SIGN_MESSAGE", &request.message)
            .env("LIGHTOMBO_SIGN_NONCE", &request.nonce)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return SignatureOutcome::Rejected(format!("failed to run signer '{}': {}", self.program, e)),
        };

        if let Some(mut stdin) = child.stdin.take() {
            // the signer may exit without reading stdin
            let _ = stdin.write_all(request.message.as_bytes()).await;
        }

        match child.wait_with_output().await {
            Ok(output) if output.status.success() => SignatureOutcome::Accepted,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    SignatureOutcome::Rejected(format!("signer exited with {}", output.status))
                } else {
                    SignatureOutcome::Rejected(stderr)
                }
            }
            Err(e) => SignatureOutcome::Rejected(format!("signer failed: {}", e)),
        }
    }
}
