//! Room lifecycle management for the Xiangqi server.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one game,
//! its membership, and its chat log. The actor serializes every mutation
//! against that state, which is what makes concurrent commands against the
//! same room safe without a lock.

mod error;
mod manager;
mod room;

pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{EventSender, LeaveOutcome, RoomHandle, RoomInfo};

#[cfg(test)]
mod tests {
    use super::*;
    use xiangqi_protocol::Role;
    use xiangqi_transport::ConnectionId;

    fn cid(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn unbounded_sink() -> (EventSender, tokio::sync::mpsc::UnboundedReceiver<xiangqi_protocol::ServerEvent>) {
        tokio::sync::mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn create_and_join_room_assigns_owner_on_matching_username() {
        let mut manager = RoomManager::new();
        let (room_id, _) = manager.create_room("alice".into(), None, None);

        let (tx, mut rx) = unbounded_sink();
        manager
            .join_room(cid(1), room_id.clone(), "alice".into(), Some(Role::Player), None, tx)
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, xiangqi_protocol::ServerEvent::JoinedRoom { join_as: Role::Player, .. }));
        assert_eq!(manager.room_of(cid(1)), Some(&room_id));
    }

    #[tokio::test]
    async fn default_room_name_uses_owner_display_name() {
        let mut manager = RoomManager::new();
        let (room_id, _) = manager.create_room("bob".into(), None, None);
        let handle = manager.room_handle(&room_id).unwrap();
        let info = handle.info().await.unwrap();
        assert_eq!(info.room_name, "bob's room");
    }

    #[tokio::test]
    async fn incorrect_password_is_rejected() {
        let mut manager = RoomManager::new();
        let (room_id, _) = manager.create_room("alice".into(), None, Some("secret".into()));

        let (tx, _rx) = unbounded_sink();
        let err = manager
            .join_room(cid(1), room_id, "mallory".into(), None, Some("wrong".into()), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::IncorrectPassword));
    }

    #[tokio::test]
    async fn third_player_request_is_downgraded_to_spectator() {
        let mut manager = RoomManager::new();
        let (room_id, _) = manager.create_room("alice".into(), None, None);

        for (n, name) in [(1, "alice"), (2, "bob")] {
            let (tx, _rx) = unbounded_sink();
            manager
                .join_room(cid(n), room_id.clone(), name.into(), Some(Role::Player), None, tx)
                .await
                .unwrap();
        }

        let (tx, mut rx) = unbounded_sink();
        manager
            .join_room(cid(3), room_id, "carol".into(), Some(Role::Player), None, tx)
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, xiangqi_protocol::ServerEvent::JoinedRoom { join_as: Role::Spectator, .. }));
    }

    #[tokio::test]
    async fn owner_leaving_tears_down_the_room() {
        let mut manager = RoomManager::new();
        let (room_id, _) = manager.create_room("alice".into(), None, None);

        let (tx, mut rx) = unbounded_sink();
        manager
            .join_room(cid(1), room_id.clone(), "alice".into(), None, None, tx)
            .await
            .unwrap();
        let _ = rx.recv().await.unwrap();

        manager.leave_current_room(cid(1)).await.unwrap();
        assert!(manager.room_of(cid(1)).is_none());
        assert!(manager.room_handle(&room_id).is_none());
    }

    #[tokio::test]
    async fn illegal_move_broadcasts_a_system_chat_accusation_before_rejecting() {
        let mut manager = RoomManager::new();
        let (room_id, _) = manager.create_room("alice".into(), None, None);

        let (tx1, mut rx1) = unbounded_sink();
        manager
            .join_room(cid(1), room_id.clone(), "alice".into(), Some(Role::Player), None, tx1)
            .await
            .unwrap();
        let _ = rx1.recv().await.unwrap();

        let (tx2, mut rx2) = unbounded_sink();
        manager
            .join_room(cid(2), room_id.clone(), "bob".into(), Some(Role::Player), None, tx2)
            .await
            .unwrap();
        let _ = rx1.recv().await.unwrap(); // user_joined to alice
        let _ = rx2.recv().await.unwrap(); // joined_room to bob

        let handle = manager.room_handle(&room_id).unwrap();
        handle.start_game(cid(1)).await.unwrap();
        let _ = rx1.recv().await.unwrap(); // game_started
        let _ = rx2.recv().await.unwrap();

        // Red's rook cannot move diagonally.
        handle.make_move(cid(1), 0, 0, 1, 1).await.unwrap();

        let accusation = rx1.recv().await.unwrap();
        assert!(matches!(accusation, xiangqi_protocol::ServerEvent::ChatMessage { username, .. } if username == "System"));
        let rejection = rx1.recv().await.unwrap();
        assert!(matches!(rejection, xiangqi_protocol::ServerEvent::MoveRejected { .. }));
    }
}
