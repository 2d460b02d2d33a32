//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not valid JSON at all.
    #[cfg(feature = "json")]
    #[error("invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    /// The message is invalid at the protocol level — well-formed JSON
    /// that doesn't match any known command/event shape.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
