use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    /// The HTTP call itself failed (connection refused, timeout, ...).
    #[error("model transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The inference service answered with a non-success status.
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Model output is not recoverable JSON even after salvage.
    #[error("model contract violation: {0}")]
    Contract(String),
}
