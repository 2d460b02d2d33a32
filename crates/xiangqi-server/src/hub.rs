//! Dispatch layer: routes decoded commands from every connection to the
//! session registry and room manager, and owns the per-connection outbound
//! channels those lower layers send events through.
//!
//! This is the seam the connection handler talks to — one `SessionHub`
//! is shared (behind a `Mutex`) across all connections, the same way the
//! original single-threaded server kept one dict of rooms and one dict of
//! sessions for the whole process.

use std::collections::HashMap;

use xiangqi_protocol::{ClientCommand, Role, RoomId, ServerEvent};
use xiangqi_room::{EventSender, RoomManager};
use xiangqi_session::{SessionError, UsernameRegistry};
use xiangqi_transport::ConnectionId;

pub struct SessionHub {
    usernames: UsernameRegistry,
    rooms: RoomManager,
    connections: HashMap<ConnectionId, EventSender>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self {
            usernames: UsernameRegistry::new(),
            rooms: RoomManager::new(),
            connections: HashMap::new(),
        }
    }

    /// Registers a freshly accepted connection's outbound channel. Must be
    /// called before any command from that connection is dispatched.
    pub fn register(&mut self, connection_id: ConnectionId, sender: EventSender) {
        self.connections.insert(connection_id, sender);
    }

    /// Tears down everything bound to a dropped connection: its username,
    /// its room membership, and its outbound channel.
    pub async fn unregister(&mut self, connection_id: ConnectionId) {
        self.usernames.remove(connection_id);
        let _ = self.rooms.leave_current_room(connection_id).await;
        self.connections.remove(&connection_id);
        tracing::debug!(%connection_id, "connection unregistered");
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    fn send(&self, connection_id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(&connection_id) {
            let _ = sender.send(event);
        }
    }

    fn send_error(&self, connection_id: ConnectionId, message: impl Into<String>) {
        self.send(
            connection_id,
            ServerEvent::Error {
                message: message.into(),
            },
        );
    }

    pub async fn dispatch(&mut self, connection_id: ConnectionId, command: ClientCommand) {
        match command {
            ClientCommand::SetUsername { username } => {
                self.handle_set_username(connection_id, username)
            }
            ClientCommand::CreateRoom {
                room_name,
                password,
            } => self.handle_create_room(connection_id, room_name, password),
            ClientCommand::JoinRoom {
                room_id,
                password,
                join_as,
            } => {
                self.handle_join_room(connection_id, room_id, password, join_as)
                    .await
            }
            ClientCommand::LeaveRoom {} => self.handle_leave_room(connection_id).await,
            ClientCommand::GetRoomList {} => self.handle_get_room_list(connection_id).await,
            ClientCommand::ChatMessage { message } => {
                self.handle_chat_message(connection_id, message).await
            }
            ClientCommand::MakeMove {
                from_row,
                from_col,
                to_row,
                to_col,
            } => {
                self.handle_make_move(connection_id, from_row, from_col, to_row, to_col)
                    .await
            }
            ClientCommand::StartGame {} => self.handle_start_game(connection_id).await,
            ClientCommand::PrivateMessage {
                target_username,
                message,
            } => self.handle_private_message(connection_id, target_username, message),
            ClientCommand::ChangeMemberRole {
                target_connection_id,
                new_role,
            } => {
                self.handle_change_role(connection_id, target_connection_id, new_role)
                    .await
            }
            ClientCommand::KickMember {
                target_connection_id,
            } => self.handle_kick(connection_id, target_connection_id).await,
            ClientCommand::GetMemberList {} => self.handle_get_member_list(connection_id).await,
            ClientCommand::MuteMember {
                target_connection_id,
            } => {
                self.handle_mute(connection_id, target_connection_id, true)
                    .await
            }
            ClientCommand::UnmuteMember {
                target_connection_id,
            } => {
                self.handle_mute(connection_id, target_connection_id, false)
                    .await
            }
            ClientCommand::Unknown => self.send_error(connection_id, "Unknown action"),
        }
    }

    fn handle_set_username(&mut self, connection_id: ConnectionId, username: String) {
        if username.trim().is_empty() {
            self.send_error(connection_id, "Username cannot be empty");
            return;
        }

        match self.usernames.set_username(connection_id, username) {
            Ok(()) => {
                let bound = self.usernames.get(connection_id).unwrap().to_string();
                self.send(connection_id, ServerEvent::UsernameSet { username: bound });
            }
            Err(SessionError::UsernameTaken(name)) => {
                self.send_error(connection_id, format!("username \"{name}\" is already in use"));
            }
            Err(err) => self.send_error(connection_id, err.to_string()),
        }
    }

    fn handle_create_room(
        &mut self,
        connection_id: ConnectionId,
        room_name: Option<String>,
        password: Option<String>,
    ) {
        let username = match self.usernames.require_username(connection_id) {
            Ok(name) => name.to_string(),
            Err(_) => {
                self.send_error(connection_id, "Please set username first");
                return;
            }
        };

        let is_private = password.is_some();
        let (room_id, room_name) = self.rooms.create_room(username, room_name, password);
        self.send(
            connection_id,
            ServerEvent::RoomCreated {
                room_id,
                room_name,
                is_private,
            },
        );
    }

    async fn handle_join_room(
        &mut self,
        connection_id: ConnectionId,
        room_id: RoomId,
        password: Option<String>,
        join_as: Option<Role>,
    ) {
        let username = match self.usernames.require_username(connection_id) {
            Ok(name) => name.to_string(),
            Err(_) => {
                self.send_error(connection_id, "Please set username first");
                return;
            }
        };
        let Some(sender) = self.connections.get(&connection_id).cloned() else {
            return;
        };

        if let Err(err) = self
            .rooms
            .join_room(connection_id, room_id, username, join_as, password, sender)
            .await
        {
            self.send_error(connection_id, err.to_string());
        }
    }

    /// The room actor itself sends `left_room` to whoever it just removed,
    /// so this only needs to cover the case where there was nothing to
    /// leave — the original server always acknowledges a leave request
    /// even from a connection that wasn't in a room.
    async fn handle_leave_room(&mut self, connection_id: ConnectionId) {
        if self.rooms.leave_current_room(connection_id).await.is_err() {
            self.send(connection_id, ServerEvent::LeftRoom {});
        }
    }

    async fn handle_get_room_list(&mut self, connection_id: ConnectionId) {
        let rooms = self.rooms.list_rooms().await;
        self.send(connection_id, ServerEvent::RoomList { rooms });
    }

    async fn handle_chat_message(&mut self, connection_id: ConnectionId, message: String) {
        if self.usernames.require_username(connection_id).is_err() {
            return;
        }
        if let Some(handle) = self.rooms.handle_for_connection(connection_id) {
            let _ = handle.chat_message(connection_id, message).await;
        }
    }

    async fn handle_make_move(
        &mut self,
        connection_id: ConnectionId,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) {
        if self.usernames.require_username(connection_id).is_err() {
            return;
        }
        let Some(handle) = self.rooms.handle_for_connection(connection_id).cloned() else {
            self.send_error(connection_id, "You are not a player in any room");
            return;
        };
        if let Err(err) = handle
            .make_move(connection_id, from_row, from_col, to_row, to_col)
            .await
        {
            self.send_error(connection_id, err.to_string());
        }
    }

    async fn handle_start_game(&mut self, connection_id: ConnectionId) {
        let Some(handle) = self.rooms.handle_for_connection(connection_id).cloned() else {
            self.send_error(connection_id, "Only room owner can start the game");
            return;
        };
        if let Err(err) = handle.start_game(connection_id).await {
            self.send_error(connection_id, err.to_string());
        }
    }

    fn handle_private_message(
        &mut self,
        connection_id: ConnectionId,
        target_username: String,
        message: String,
    ) {
        let Ok(sender_name) = self.usernames.require_username(connection_id).map(str::to_string)
        else {
            return;
        };

        let trimmed = message.trim();
        if target_username.trim().is_empty() || trimmed.is_empty() {
            self.send_error(connection_id, "Invalid private message");
            return;
        }

        let Some(target_id) = self.usernames.find_by_name(&target_username) else {
            self.send_error(connection_id, "User not found");
            return;
        };

        let timestamp = chrono::Utc::now();
        self.send(
            target_id,
            ServerEvent::PrivateMessage {
                from: sender_name.clone(),
                to: target_username.clone(),
                message: trimmed.to_string(),
                timestamp,
            },
        );
        self.send(
            connection_id,
            ServerEvent::PrivateMessageSent {
                from: sender_name,
                to: target_username,
                message: trimmed.to_string(),
                timestamp,
            },
        );
    }

    async fn handle_change_role(
        &mut self,
        connection_id: ConnectionId,
        target_connection_id: ConnectionId,
        new_role: Role,
    ) {
        let Some(handle) = self.rooms.handle_for_connection(connection_id).cloned() else {
            self.send_error(connection_id, "You are not a room owner or not in any room");
            return;
        };
        if let Err(err) = handle
            .change_role(connection_id, target_connection_id, new_role)
            .await
        {
            self.send_error(connection_id, err.to_string());
        }
    }

    async fn handle_kick(&mut self, connection_id: ConnectionId, target_connection_id: ConnectionId) {
        let Some(handle) = self.rooms.handle_for_connection(connection_id).cloned() else {
            self.send_error(connection_id, "You are not a room owner or not in any room");
            return;
        };
        if let Err(err) = handle.kick(connection_id, target_connection_id).await {
            self.send_error(connection_id, err.to_string());
        }
    }

    async fn handle_get_member_list(&mut self, connection_id: ConnectionId) {
        let Some(handle) = self.rooms.handle_for_connection(connection_id).cloned() else {
            self.send_error(connection_id, "Not in any room");
            return;
        };
        if let Err(err) = handle.member_list(connection_id).await {
            self.send_error(connection_id, err.to_string());
        }
    }

    async fn handle_mute(
        &mut self,
        connection_id: ConnectionId,
        target_connection_id: ConnectionId,
        mute: bool,
    ) {
        let Some(handle) = self.rooms.handle_for_connection(connection_id).cloned() else {
            let message = if mute {
                "Only room owner can mute members"
            } else {
                "Only room owner can unmute members"
            };
            self.send_error(connection_id, message);
            return;
        };

        let result = if mute {
            handle.mute(connection_id, target_connection_id).await
        } else {
            handle.unmute(connection_id, target_connection_id).await
        };
        if let Err(err) = result {
            self.send_error(connection_id, err.to_string());
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn cid(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn wire(hub: &mut SessionHub, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(id, tx);
        rx
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_with_localized_error() {
        let mut hub = SessionHub::new();
        let mut rx1 = wire(&mut hub, cid(1));
        let mut rx2 = wire(&mut hub, cid(2));

        hub.dispatch(cid(1), ClientCommand::SetUsername { username: "alice".into() })
            .await;
        assert!(matches!(rx1.recv().await.unwrap(), ServerEvent::UsernameSet { .. }));

        hub.dispatch(cid(2), ClientCommand::SetUsername { username: "alice".into() })
            .await;
        let event = rx2.recv().await.unwrap();
        assert!(matches!(event, ServerEvent::Error { message } if message.contains("alice")));
    }

    #[tokio::test]
    async fn creating_a_room_requires_a_username_first() {
        let mut hub = SessionHub::new();
        let mut rx = wire(&mut hub, cid(1));

        hub.dispatch(
            cid(1),
            ClientCommand::CreateRoom {
                room_name: None,
                password: None,
            },
        )
        .await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ServerEvent::Error { message } if message == "Please set username first"));
    }

    #[tokio::test]
    async fn private_message_round_trips_between_two_users() {
        let mut hub = SessionHub::new();
        let mut rx1 = wire(&mut hub, cid(1));
        let mut rx2 = wire(&mut hub, cid(2));

        hub.dispatch(cid(1), ClientCommand::SetUsername { username: "alice".into() })
            .await;
        let _ = rx1.recv().await.unwrap();
        hub.dispatch(cid(2), ClientCommand::SetUsername { username: "bob".into() })
            .await;
        let _ = rx2.recv().await.unwrap();

        hub.dispatch(
            cid(1),
            ClientCommand::PrivateMessage {
                target_username: "bob".into(),
                message: "hi".into(),
            },
        )
        .await;

        let received = rx2.recv().await.unwrap();
        assert!(matches!(received, ServerEvent::PrivateMessage { message, .. } if message == "hi"));
        let sent_ack = rx1.recv().await.unwrap();
        assert!(matches!(sent_ack, ServerEvent::PrivateMessageSent { .. }));
    }

    #[tokio::test]
    async fn private_message_to_unknown_user_errors() {
        let mut hub = SessionHub::new();
        let mut rx = wire(&mut hub, cid(1));
        hub.dispatch(cid(1), ClientCommand::SetUsername { username: "alice".into() })
            .await;
        let _ = rx.recv().await.unwrap();

        hub.dispatch(
            cid(1),
            ClientCommand::PrivateMessage {
                target_username: "ghost".into(),
                message: "hi".into(),
            },
        )
        .await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ServerEvent::Error { message } if message == "User not found"));
    }

    #[tokio::test]
    async fn leave_room_without_ever_joining_still_acknowledges() {
        let mut hub = SessionHub::new();
        let mut rx = wire(&mut hub, cid(1));
        hub.dispatch(cid(1), ClientCommand::LeaveRoom {}).await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ServerEvent::LeftRoom {}));
    }

    #[tokio::test]
    async fn unregister_releases_username_for_reuse() {
        let mut hub = SessionHub::new();
        let mut rx = wire(&mut hub, cid(1));
        hub.dispatch(cid(1), ClientCommand::SetUsername { username: "alice".into() })
            .await;
        let _ = rx.recv().await.unwrap();

        hub.unregister(cid(1)).await;

        let mut rx2 = wire(&mut hub, cid(2));
        hub.dispatch(cid(2), ClientCommand::SetUsername { username: "alice".into() })
            .await;
        assert!(matches!(rx2.recv().await.unwrap(), ServerEvent::UsernameSet { .. }));
    }
}
