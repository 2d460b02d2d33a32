//! Error types for the room layer.
//!
//! Each variant's `Display` text is the literal message a client sees in
//! an `error` event — these are precondition failures (§7 category 2),
//! not unexpected internal faults.

use xiangqi_protocol::RoomId;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("You are not a player in any room")]
    NotAPlayerInRoom,

    #[error("Need 2 players to make moves")]
    NeedTwoPlayersToMove,

    #[error("Only room owner can start the game")]
    OnlyOwnerCanStart,

    #[error("Need 2 players to start game")]
    NeedTwoPlayersToStart,

    #[error("You are not a room owner or not in any room")]
    NotOwnerOrNotInRoom,

    #[error("Target user not in room")]
    TargetNotMember,

    #[error("Failed to change role")]
    RoleChangeFailed,

    #[error("Failed to kick member")]
    KickFailed,

    #[error("Only room owner can mute members")]
    OnlyOwnerCanMute,

    #[error("Only room owner can unmute members")]
    OnlyOwnerCanUnmute,

    #[error("Failed to mute member")]
    MuteFailed,

    #[error("Failed to unmute member")]
    UnmuteFailed,

    #[error("Not in any room")]
    NotInRoom,

    /// The room actor's command channel is closed — the room is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
