//! Room manager: creates, tracks, and routes connections to rooms.

use std::collections::HashMap;

use rand::Rng;
use xiangqi_protocol::{Role, RoomId, RoomListEntry};
use xiangqi_transport::ConnectionId;

use crate::room::{spawn_room, EventSender, RoomHandle};
use crate::RoomError;

const ROOM_ID_LEN: usize = 8;
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let id: String = (0..ROOM_ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_ID_ALPHABET.len());
            ROOM_ID_ALPHABET[idx] as char
        })
        .collect();
    RoomId(id)
}

/// Manages all active rooms and tracks which connection is in which room.
///
/// A connection can be in at most one room at a time — this is a
/// simplifying design choice, not something the wire protocol enforces
/// independently; see the grounding ledger.
pub struct RoomManager {
    rooms: HashMap<RoomId, RoomHandle>,
    connection_room: HashMap<ConnectionId, RoomId>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            connection_room: HashMap::new(),
        }
    }

    /// Creates a new room owned by `owner_name` and returns its ID.
    ///
    /// Creating a room does not add the owner as a member — ownership is
    /// bound to whichever connection later joins under that display name
    /// (see `Room::handle_join`).
    pub fn create_room(
        &mut self,
        owner_name: String,
        room_name: Option<String>,
        password: Option<String>,
    ) -> (RoomId, String) {
        let mut room_id = generate_room_id();
        while self.rooms.contains_key(&room_id) {
            room_id = generate_room_id();
        }

        let room_name = room_name.unwrap_or_else(|| format!("{owner_name}'s room"));
        let handle = spawn_room(room_id.clone(), room_name.clone(), owner_name, password);
        tracing::info!(room_id = %room_id, "room created");
        self.rooms.insert(room_id.clone(), handle);
        (room_id, room_name)
    }

    /// Joins `connection_id` into `room_id`, enforcing one room per
    /// connection.
    pub async fn join_room(
        &mut self,
        connection_id: ConnectionId,
        room_id: RoomId,
        username: String,
        join_as: Option<Role>,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        if self.connection_room.contains_key(&connection_id) {
            let _ = self.leave_current_room(connection_id).await;
        }

        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound)?;
        handle
            .join(connection_id, username, join_as, password, sender)
            .await?;
        self.connection_room.insert(connection_id, room_id);
        Ok(())
    }

    /// Removes `connection_id` from whichever room it is in. Used for both
    /// the explicit `leave_room` command and connection teardown on
    /// disconnect — both paths must destroy an owner-held room the same
    /// way, so they share this one routine.
    pub async fn leave_current_room(&mut self, connection_id: ConnectionId) -> Result<(), RoomError> {
        let room_id = self
            .connection_room
            .remove(&connection_id)
            .ok_or(RoomError::NotInRoom)?;

        let Some(handle) = self.rooms.get(&room_id) else {
            return Ok(());
        };

        let outcome = handle.leave(connection_id).await?;
        if outcome.owner_left {
            if let Some(handle) = self.rooms.remove(&room_id) {
                handle.shutdown().await;
            }
            self.connection_room.retain(|_, rid| *rid != room_id);
        }
        Ok(())
    }

    /// Returns the room a connection currently occupies, if any.
    pub fn room_of(&self, connection_id: ConnectionId) -> Option<&RoomId> {
        self.connection_room.get(&connection_id)
    }

    pub fn room_handle(&self, room_id: &RoomId) -> Option<&RoomHandle> {
        self.rooms.get(room_id)
    }

    /// Returns the room handle for a connection's current room, if any.
    pub fn handle_for_connection(&self, connection_id: ConnectionId) -> Option<&RoomHandle> {
        self.connection_room
            .get(&connection_id)
            .and_then(|room_id| self.rooms.get(room_id))
    }

    /// Builds the public room list: snapshots of every active room.
    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let mut entries = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.info().await {
                entries.push(RoomListEntry {
                    room_id: info.room_id,
                    room_name: info.room_name,
                    is_private: info.is_private,
                    players: info.player_count,
                    spectators: info.spectator_count,
                    game_status: info.status,
                });
            }
        }
        entries
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
