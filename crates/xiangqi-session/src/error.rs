//! Error types for the session layer.

use xiangqi_transport::ConnectionId;

/// Errors that can occur while managing the display-name registry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No display name is bound to this connection yet.
    #[error("connection {0} has not set a username")]
    NoUsername(ConnectionId),

    /// The requested display name is already in use by another connection.
    #[error("username \"{0}\" is already in use")]
    UsernameTaken(String),
}
