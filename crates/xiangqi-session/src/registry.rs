//! The display-name registry: the server-wide mapping from `ConnectionId`
//! to the self-declared display name bound to it.
//!
//! Identity here is intentionally thin — there is no authentication, only
//! an in-session uniqueness check. A display name is bound by
//! `set_username` and released when the connection disconnects.

use std::collections::HashMap;

use xiangqi_transport::ConnectionId;

use crate::SessionError;

/// Bidirectional ConnectionId ↔ display-name mapping enforcing uniqueness.
#[derive(Debug, Default)]
pub struct UsernameRegistry {
    by_connection: HashMap<ConnectionId, String>,
}

impl UsernameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `username` to `conn_id`. Rejects an empty name, and rejects a
    /// name already bound to a *different* connection. Re-binding the same
    /// name to the connection that already holds it is a no-op success.
    pub fn set_username(
        &mut self,
        conn_id: ConnectionId,
        username: String,
    ) -> Result<(), SessionError> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(SessionError::UsernameTaken(String::new()));
        }
        if let Some(holder) = self.find_by_name(trimmed) {
            if holder != conn_id {
                return Err(SessionError::UsernameTaken(trimmed.to_string()));
            }
        }
        self.by_connection.insert(conn_id, trimmed.to_string());
        tracing::info!(%conn_id, username = trimmed, "username bound");
        Ok(())
    }

    pub fn get(&self, conn_id: ConnectionId) -> Option<&str> {
        self.by_connection.get(&conn_id).map(String::as_str)
    }

    /// Like [`get`](Self::get), but for call sites that must treat "no
    /// username bound yet" as a distinct error rather than an `Option`.
    pub fn require_username(&self, conn_id: ConnectionId) -> Result<&str, SessionError> {
        self.get(conn_id).ok_or(SessionError::NoUsername(conn_id))
    }

    pub fn find_by_name(&self, username: &str) -> Option<ConnectionId> {
        self.by_connection
            .iter()
            .find(|(_, name)| name.as_str() == username)
            .map(|(id, _)| *id)
    }

    /// Releases the display name bound to `conn_id`, if any. Called on
    /// disconnect.
    pub fn remove(&mut self, conn_id: ConnectionId) -> Option<String> {
        let released = self.by_connection.remove(&conn_id);
        if let Some(username) = &released {
            tracing::info!(%conn_id, %username, "username released");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.by_connection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_connection.is_empty()
    }
}
