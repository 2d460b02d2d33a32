//! Wire types: client commands, server events, and the structures they
//! carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use xiangqi_rules::{Board, Color, GameStatus};
use xiangqi_transport::ConnectionId;

/// An 8-character uppercase alphanumeric room identifier, unique among
/// active rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        RoomId(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Spectator,
}

/// Inbound commands, tagged on the `action` field.
///
/// Any `action` value that doesn't match a known command decodes to
/// [`ClientCommand::Unknown`] rather than failing outright — the dispatch
/// layer turns that into an `error` event with the message
/// `"Unknown action"`, per the wire contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    SetUsername {
        username: String,
    },
    CreateRoom {
        #[serde(default)]
        room_name: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    JoinRoom {
        room_id: RoomId,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        join_as: Option<Role>,
    },
    LeaveRoom {},
    GetRoomList {},
    ChatMessage {
        message: String,
    },
    MakeMove {
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    },
    StartGame {},
    PrivateMessage {
        target_username: String,
        message: String,
    },
    ChangeMemberRole {
        target_connection_id: ConnectionId,
        new_role: Role,
    },
    KickMember {
        target_connection_id: ConnectionId,
    },
    GetMemberList {},
    MuteMember {
        target_connection_id: ConnectionId,
    },
    UnmuteMember {
        target_connection_id: ConnectionId,
    },
    #[serde(other)]
    Unknown,
}

/// Snapshot of a single room member, as listed in `member_list`.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub websocket_id: ConnectionId,
    pub username: String,
    pub role: Role,
    pub is_owner: bool,
    pub is_muted: bool,
    pub join_time: DateTime<Utc>,
}

/// One entry in `room_list`.
#[derive(Debug, Clone, Serialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub room_name: String,
    pub is_private: bool,
    pub players: usize,
    pub spectators: usize,
    pub game_status: GameStatus,
}

/// Embedded game snapshot sent on room join.
#[derive(Debug, Clone, Serialize)]
pub struct GameStateView {
    pub board: Board,
    pub current_player: Color,
    pub game_status: GameStatus,
    pub winner: Option<Color>,
}

/// The most recently accepted move, echoed to late joiners.
#[derive(Debug, Clone, Serialize)]
pub struct LastMoveView {
    pub from_row: i32,
    pub from_col: i32,
    pub to_row: i32,
    pub to_col: i32,
    pub player_name: String,
}

/// One line of room chat history.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEntryView {
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Outbound events, tagged on the `type` field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    UsernameSet {
        username: String,
    },
    RoomCreated {
        room_id: RoomId,
        room_name: String,
        is_private: bool,
    },
    RoomList {
        rooms: Vec<RoomListEntry>,
    },
    JoinedRoom {
        room_id: RoomId,
        room_name: String,
        join_as: Role,
        players: Vec<String>,
        spectators: usize,
        member_list: Vec<MemberView>,
        chat_history: Vec<ChatEntryView>,
        last_move: Option<LastMoveView>,
        game_state: GameStateView,
    },
    UserJoined {
        username: String,
        join_as: Role,
        players: Vec<String>,
        spectators: usize,
        member_list: Vec<MemberView>,
    },
    UserLeft {
        username: String,
        players: Vec<String>,
        spectators: usize,
        member_list: Vec<MemberView>,
    },
    ChatMessage {
        username: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    ChatRejected {
        reason: String,
    },
    MoveMade {
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
        player_name: String,
        current_player: Color,
        game_status: GameStatus,
        winner: Option<Color>,
        board: Board,
        last_move: LastMoveView,
    },
    MoveRejected {
        reason: String,
    },
    GameStarted {
        current_player: Color,
        board: Board,
    },
    PrivateMessage {
        from: String,
        to: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    PrivateMessageSent {
        from: String,
        to: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    MemberRoleChanged {
        username: String,
        new_role: Role,
        member_list: Vec<MemberView>,
        players: usize,
        spectators: usize,
    },
    MemberKicked {
        username: String,
        member_list: Vec<MemberView>,
        players: usize,
        spectators: usize,
    },
    MemberMuted {
        username: String,
        member_list: Vec<MemberView>,
    },
    MemberUnmuted {
        username: String,
        member_list: Vec<MemberView>,
    },
    KickedFromRoom {
        message: String,
    },
    RoomDeleted {
        message: String,
    },
    LeftRoom {},
    MemberList {
        member_list: Vec<MemberView>,
        is_owner: bool,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_username_decodes_by_action_tag() {
        let json = r#"{"action":"set_username","username":"alice"}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, ClientCommand::SetUsername { username } if username == "alice"));
    }

    #[test]
    fn unknown_action_decodes_to_unknown_variant() {
        let json = r#"{"action":"do_a_barrel_roll"}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, ClientCommand::Unknown));
    }

    #[test]
    fn make_move_round_trips_field_names() {
        let json = r#"{"action":"make_move","from_row":0,"from_col":1,"to_row":2,"to_col":1}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        match cmd {
            ClientCommand::MakeMove {
                from_row,
                from_col,
                to_row,
                to_col,
            } => {
                assert_eq!((from_row, from_col, to_row, to_col), (0, 1, 2, 1));
            }
            _ => panic!("expected MakeMove"),
        }
    }

    #[test]
    fn error_event_serializes_with_type_tag() {
        let event = ServerEvent::Error {
            message: "Unknown action".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "Unknown action");
    }

    #[test]
    fn username_set_serializes_expected_shape() {
        let event = ServerEvent::UsernameSet {
            username: "bob".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "username_set");
        assert_eq!(json["username"], "bob");
    }

    #[test]
    fn room_id_serializes_as_bare_string() {
        let id = RoomId("ABCD1234".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ABCD1234\"");
    }
}
