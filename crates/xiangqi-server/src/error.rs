//! Unified error type for the Xiangqi server binary.

use xiangqi_protocol::ProtocolError;
use xiangqi_room::RoomError;
use xiangqi_session::SessionError;
use xiangqi_transport::TransportError;

/// Top-level error wrapping every sub-crate's error type.
///
/// The `#[from]` attribute on each variant auto-generates a `From` impl,
/// so `?` converts sub-crate errors automatically wherever this type is
/// the function's return error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Transport(_)));
        assert!(server_err.to_string().contains("gone"));
    }

    #[test]
    fn wraps_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
    }

    #[test]
    fn wraps_session_error() {
        let err = SessionError::UsernameTaken("alice".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Session(_)));
    }

    #[test]
    fn wraps_room_error() {
        let err = RoomError::NotFound;
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Room(_)));
    }
}
