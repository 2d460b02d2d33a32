//! Room actor: an isolated Tokio task that owns one Xiangqi game and the
//! membership/chat state around it.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the actor model: no shared mutable
//! state, just message passing, so every command against a room's state
//! executes as a single atomic step even with many connections hammering
//! the same room concurrently. The actor is also the single place that
//! holds outbound channels to each member, so it performs all sends and
//! broadcasts itself rather than handing events back to a caller to
//! deliver.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use xiangqi_protocol::{
    ChatEntryView, GameStateView, LastMoveView, MemberView, Role, RoomId, ServerEvent,
};
use xiangqi_rules::{Color, Game, GameStatus};
use xiangqi_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// Maximum number of players a room seats; additional joiners become
/// spectators regardless of the role they requested.
const MAX_PLAYERS: usize = 2;

/// A channel for delivering wire events to one connection's handler task.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone)]
struct Member {
    username: String,
    role: Role,
    join_time: DateTime<Utc>,
    is_muted: bool,
}

#[derive(Debug, Clone)]
struct ChatEntry {
    username: String,
    message: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LastMove {
    from_row: i32,
    from_col: i32,
    to_row: i32,
    to_col: i32,
    player_name: String,
}

/// Outcome of a successful `leave`, telling the manager whether the room
/// must now be torn down.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    pub owner_left: bool,
}

/// A snapshot of room metadata, used for the room list and for nothing
/// else — it carries no membership or game detail.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub room_name: String,
    pub is_private: bool,
    pub player_count: usize,
    pub spectator_count: usize,
    pub status: GameStatus,
}

pub(crate) enum RoomCommand {
    Join {
        connection_id: ConnectionId,
        username: String,
        join_as: Option<Role>,
        password: Option<String>,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },
    Chat {
        connection_id: ConnectionId,
        message: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    MakeMove {
        connection_id: ConnectionId,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    StartGame {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    ChangeRole {
        caller: ConnectionId,
        target: ConnectionId,
        new_role: Role,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Kick {
        caller: ConnectionId,
        target: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Mute {
        caller: ConnectionId,
        target: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Unmute {
        caller: ConnectionId,
        target: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    MemberList {
        caller: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. The `RoomManager` holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn join(
        &self,
        connection_id: ConnectionId,
        username: String,
        join_as: Option<Role>,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Join {
            connection_id,
            username,
            join_as,
            password,
            sender,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, connection_id: ConnectionId) -> Result<LeaveOutcome, RoomError> {
        self.call(|reply| RoomCommand::Leave {
            connection_id,
            reply,
        })
        .await?
    }

    pub async fn chat_message(
        &self,
        connection_id: ConnectionId,
        message: String,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Chat {
            connection_id,
            message,
            reply,
        })
        .await?
    }

    pub async fn make_move(
        &self,
        connection_id: ConnectionId,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::MakeMove {
            connection_id,
            from_row,
            from_col,
            to_row,
            to_col,
            reply,
        })
        .await?
    }

    pub async fn start_game(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::StartGame {
            connection_id,
            reply,
        })
        .await?
    }

    pub async fn change_role(
        &self,
        caller: ConnectionId,
        target: ConnectionId,
        new_role: Role,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::ChangeRole {
            caller,
            target,
            new_role,
            reply,
        })
        .await?
    }

    pub async fn kick(
        &self,
        caller: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Kick {
            caller,
            target,
            reply,
        })
        .await?
    }

    pub async fn mute(&self, caller: ConnectionId, target: ConnectionId) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Mute {
            caller,
            target,
            reply,
        })
        .await?
    }

    pub async fn unmute(
        &self,
        caller: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Unmute {
            caller,
            target,
            reply,
        })
        .await?
    }

    pub async fn member_list(&self, caller: ConnectionId) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::MemberList { caller, reply })
            .await?
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.call(|reply| RoomCommand::Info { reply }).await
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

struct RoomActor {
    room_id: RoomId,
    room_name: String,
    password: Option<String>,
    owner_name: String,
    owner_connection_id: Option<ConnectionId>,
    created_at: DateTime<Utc>,
    game: Game,
    last_move: Option<LastMove>,
    chat_log: Vec<ChatEntry>,
    members: HashMap<ConnectionId, Member>,
    player_order: Vec<ConnectionId>,
    senders: HashMap<ConnectionId, EventSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    connection_id,
                    username,
                    join_as,
                    password,
                    sender,
                    reply,
                } => {
                    let result =
                        self.handle_join(connection_id, username, join_as, password, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave {
                    connection_id,
                    reply,
                } => {
                    let result = self.handle_leave(connection_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Chat {
                    connection_id,
                    message,
                    reply,
                } => {
                    let result = self.handle_chat(connection_id, message);
                    let _ = reply.send(result);
                }
                RoomCommand::MakeMove {
                    connection_id,
                    from_row,
                    from_col,
                    to_row,
                    to_col,
                    reply,
                } => {
                    let result =
                        self.handle_make_move(connection_id, from_row, from_col, to_row, to_col);
                    let _ = reply.send(result);
                }
                RoomCommand::StartGame {
                    connection_id,
                    reply,
                } => {
                    let result = self.handle_start_game(connection_id);
                    let _ = reply.send(result);
                }
                RoomCommand::ChangeRole {
                    caller,
                    target,
                    new_role,
                    reply,
                } => {
                    let result = self.handle_change_role(caller, target, new_role);
                    let _ = reply.send(result);
                }
                RoomCommand::Kick {
                    caller,
                    target,
                    reply,
                } => {
                    let result = self.handle_kick(caller, target);
                    let _ = reply.send(result);
                }
                RoomCommand::Mute {
                    caller,
                    target,
                    reply,
                } => {
                    let result = self.handle_mute(caller, target, true);
                    let _ = reply.send(result);
                }
                RoomCommand::Unmute {
                    caller,
                    target,
                    reply,
                } => {
                    let result = self.handle_mute(caller, target, false);
                    let _ = reply.send(result);
                }
                RoomCommand::MemberList { caller, reply } => {
                    let result = self.handle_member_list(caller);
                    let _ = reply.send(result);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        username: String,
        join_as: Option<Role>,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        if let Some(expected) = &self.password {
            if password.as_deref() != Some(expected.as_str()) {
                return Err(RoomError::IncorrectPassword);
            }
        }

        let requested = join_as.unwrap_or(Role::Spectator);
        let role = if requested == Role::Player && self.player_order.len() >= MAX_PLAYERS {
            Role::Spectator
        } else {
            requested
        };

        if role == Role::Player {
            self.player_order.push(connection_id);
        }
        if username == self.owner_name && self.owner_connection_id.is_none() {
            self.owner_connection_id = Some(connection_id);
        }

        self.members.insert(
            connection_id,
            Member {
                username: username.clone(),
                role,
                join_time: Utc::now(),
                is_muted: false,
            },
        );
        self.senders.insert(connection_id, sender.clone());

        tracing::info!(
            room_id = %self.room_id,
            %username,
            ?role,
            members = self.members.len(),
            "member joined"
        );

        let _ = sender.send(ServerEvent::JoinedRoom {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            join_as: role,
            players: self.player_names(),
            spectators: self.spectator_count(),
            member_list: self.member_views(),
            chat_history: self.chat_views(),
            last_move: self.last_move_view(),
            game_state: self.game_state_view(),
        });

        self.broadcast_except(
            connection_id,
            ServerEvent::UserJoined {
                username,
                join_as: role,
                players: self.player_names(),
                spectators: self.spectator_count(),
                member_list: self.member_views(),
            },
        );

        Ok(())
    }

    fn handle_leave(&mut self, connection_id: ConnectionId) -> Result<LeaveOutcome, RoomError> {
        let member = self
            .members
            .remove(&connection_id)
            .ok_or(RoomError::NotInRoom)?;
        if let Some(sender) = self.senders.remove(&connection_id) {
            let _ = sender.send(ServerEvent::LeftRoom {});
        }
        self.player_order.retain(|id| *id != connection_id);

        let owner_left = self.owner_connection_id == Some(connection_id);
        tracing::info!(
            room_id = %self.room_id,
            username = %member.username,
            owner_left,
            "member left"
        );

        if owner_left {
            self.broadcast_all(ServerEvent::RoomDeleted {
                message: "房主已退出，房间即将关闭".to_string(),
            });
            self.members.clear();
            self.senders.clear();
            self.player_order.clear();
        } else {
            self.broadcast_all(ServerEvent::UserLeft {
                username: member.username,
                players: self.player_names(),
                spectators: self.spectator_count(),
                member_list: self.member_views(),
            });
        }

        Ok(LeaveOutcome { owner_left })
    }

    fn handle_chat(
        &mut self,
        connection_id: ConnectionId,
        message: String,
    ) -> Result<(), RoomError> {
        let member = self
            .members
            .get(&connection_id)
            .ok_or(RoomError::NotInRoom)?;

        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        if member.is_muted {
            if let Some(sender) = self.senders.get(&connection_id) {
                let _ = sender.send(ServerEvent::ChatRejected {
                    reason: "You are muted in this room".to_string(),
                });
            }
            return Ok(());
        }

        let entry = ChatEntry {
            username: member.username.clone(),
            message: trimmed.to_string(),
            timestamp: Utc::now(),
        };
        self.chat_log.push(entry.clone());

        self.broadcast_all(ServerEvent::ChatMessage {
            username: entry.username,
            message: entry.message,
            timestamp: entry.timestamp,
        });

        Ok(())
    }

    fn handle_make_move(
        &mut self,
        connection_id: ConnectionId,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) -> Result<(), RoomError> {
        let seat = self
            .player_order
            .iter()
            .position(|id| *id == connection_id)
            .ok_or(RoomError::NotAPlayerInRoom)?;
        if self.player_order.len() < MAX_PLAYERS {
            return Err(RoomError::NeedTwoPlayersToMove);
        }
        let color = if seat == 0 { Color::Red } else { Color::Black };
        let username = self.members[&connection_id].username.clone();

        match self.game.try_move(color, from_row, from_col, to_row, to_col) {
            Ok(outcome) => {
                let last_move = LastMove {
                    from_row,
                    from_col,
                    to_row,
                    to_col,
                    player_name: username.clone(),
                };
                self.last_move = Some(last_move.clone());
                self.broadcast_all(ServerEvent::MoveMade {
                    from_row,
                    from_col,
                    to_row,
                    to_col,
                    player_name: username,
                    current_player: outcome.current_player,
                    game_status: outcome.status,
                    winner: outcome.winner,
                    board: self.game.board.clone(),
                    last_move: LastMoveView {
                        from_row: last_move.from_row,
                        from_col: last_move.from_col,
                        to_row: last_move.to_row,
                        to_col: last_move.to_col,
                        player_name: last_move.player_name,
                    },
                });
            }
            Err(move_error) => {
                let accusation = ChatEntry {
                    username: "System".to_string(),
                    message: format!("{username}可能在作弊，已经拦截！"),
                    timestamp: Utc::now(),
                };
                self.chat_log.push(accusation.clone());
                self.broadcast_all(ServerEvent::ChatMessage {
                    username: accusation.username,
                    message: accusation.message,
                    timestamp: accusation.timestamp,
                });

                if let Some(sender) = self.senders.get(&connection_id) {
                    let _ = sender.send(ServerEvent::MoveRejected {
                        reason: move_error.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn handle_start_game(&mut self, connection_id: ConnectionId) -> Result<(), RoomError> {
        if self.owner_connection_id != Some(connection_id)
            || !self.player_order.contains(&connection_id)
        {
            return Err(RoomError::OnlyOwnerCanStart);
        }
        if self.player_order.len() < MAX_PLAYERS {
            return Err(RoomError::NeedTwoPlayersToStart);
        }

        self.game.status = GameStatus::Playing;
        self.broadcast_all(ServerEvent::GameStarted {
            current_player: self.game.current_player,
            board: self.game.board.clone(),
        });

        Ok(())
    }

    fn handle_change_role(
        &mut self,
        caller: ConnectionId,
        target: ConnectionId,
        new_role: Role,
    ) -> Result<(), RoomError> {
        self.require_owner(caller)?;
        if !self.members.contains_key(&target) {
            return Err(RoomError::TargetNotMember);
        }

        let currently_player = self.player_order.contains(&target);
        if new_role == Role::Player && !currently_player && self.player_order.len() >= MAX_PLAYERS
        {
            return Err(RoomError::RoleChangeFailed);
        }

        if new_role == Role::Player && !currently_player {
            self.player_order.push(target);
        } else if new_role == Role::Spectator && currently_player {
            self.player_order.retain(|id| *id != target);
        }
        self.members.get_mut(&target).unwrap().role = new_role;

        let username = self.members[&target].username.clone();
        self.broadcast_all(ServerEvent::MemberRoleChanged {
            username,
            new_role,
            member_list: self.member_views(),
            players: self.player_order.len(),
            spectators: self.spectator_count(),
        });

        Ok(())
    }

    fn handle_kick(&mut self, caller: ConnectionId, target: ConnectionId) -> Result<(), RoomError> {
        self.require_owner(caller)?;
        if !self.members.contains_key(&target) {
            return Err(RoomError::TargetNotMember);
        }
        if self.owner_connection_id == Some(target) {
            return Err(RoomError::KickFailed);
        }

        let member = self.members.remove(&target).unwrap();
        self.player_order.retain(|id| *id != target);

        if let Some(sender) = self.senders.remove(&target) {
            let _ = sender.send(ServerEvent::KickedFromRoom {
                message: "You have been kicked from the room".to_string(),
            });
        }

        self.broadcast_all(ServerEvent::MemberKicked {
            username: member.username,
            member_list: self.member_views(),
            players: self.player_order.len(),
            spectators: self.spectator_count(),
        });

        Ok(())
    }

    fn handle_mute(
        &mut self,
        caller: ConnectionId,
        target: ConnectionId,
        mute: bool,
    ) -> Result<(), RoomError> {
        if self.owner_connection_id != Some(caller) || !self.members.contains_key(&caller) {
            return Err(if mute {
                RoomError::OnlyOwnerCanMute
            } else {
                RoomError::OnlyOwnerCanUnmute
            });
        }
        if !self.members.contains_key(&target) {
            return Err(RoomError::TargetNotMember);
        }
        // Muting the owner is refused; unmuting the owner is allowed (the
        // original never blocks it, since an owner is never muted in the
        // first place).
        if mute && self.owner_connection_id == Some(target) {
            return Err(RoomError::MuteFailed);
        }

        self.members.get_mut(&target).unwrap().is_muted = mute;
        let username = self.members[&target].username.clone();

        let event = if mute {
            ServerEvent::MemberMuted {
                username,
                member_list: self.member_views(),
            }
        } else {
            ServerEvent::MemberUnmuted {
                username,
                member_list: self.member_views(),
            }
        };
        self.broadcast_all(event);

        Ok(())
    }

    fn handle_member_list(&mut self, caller: ConnectionId) -> Result<(), RoomError> {
        if !self.members.contains_key(&caller) {
            return Err(RoomError::NotInRoom);
        }
        let is_owner = self.owner_connection_id == Some(caller);
        if let Some(sender) = self.senders.get(&caller) {
            let _ = sender.send(ServerEvent::MemberList {
                member_list: self.member_views(),
                is_owner,
            });
        }
        Ok(())
    }

    fn require_owner(&self, caller: ConnectionId) -> Result<(), RoomError> {
        if self.owner_connection_id != Some(caller) || !self.members.contains_key(&caller) {
            return Err(RoomError::NotOwnerOrNotInRoom);
        }
        Ok(())
    }

    fn broadcast_all(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    fn broadcast_except(&self, excluded: ConnectionId, event: ServerEvent) {
        for (id, sender) in &self.senders {
            if *id != excluded {
                let _ = sender.send(event.clone());
            }
        }
    }

    fn player_names(&self) -> Vec<String> {
        self.player_order
            .iter()
            .filter_map(|id| self.members.get(id))
            .map(|m| m.username.clone())
            .collect()
    }

    fn spectator_count(&self) -> usize {
        self.members
            .values()
            .filter(|m| m.role == Role::Spectator)
            .count()
    }

    fn member_views(&self) -> Vec<MemberView> {
        self.members
            .iter()
            .map(|(id, m)| MemberView {
                websocket_id: *id,
                username: m.username.clone(),
                role: m.role,
                is_owner: self.owner_connection_id == Some(*id),
                is_muted: m.is_muted,
                join_time: m.join_time,
            })
            .collect()
    }

    fn chat_views(&self) -> Vec<ChatEntryView> {
        self.chat_log
            .iter()
            .map(|c| ChatEntryView {
                username: c.username.clone(),
                message: c.message.clone(),
                timestamp: c.timestamp,
            })
            .collect()
    }

    fn last_move_view(&self) -> Option<LastMoveView> {
        self.last_move.as_ref().map(|m| LastMoveView {
            from_row: m.from_row,
            from_col: m.from_col,
            to_row: m.to_row,
            to_col: m.to_col,
            player_name: m.player_name.clone(),
        })
    }

    fn game_state_view(&self) -> GameStateView {
        GameStateView {
            board: self.game.board.clone(),
            current_player: self.game.current_player,
            game_status: self.game.status,
            winner: self.game.winner,
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            is_private: self.password.is_some(),
            player_count: self.player_order.len(),
            spectator_count: self.spectator_count(),
            status: self.game.status,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    room_name: String,
    owner_name: String,
    password: Option<String>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(64);

    let actor = RoomActor {
        room_id: room_id.clone(),
        room_name,
        password,
        owner_name,
        owner_connection_id: None,
        created_at: Utc::now(),
        game: Game::new(),
        last_move: None,
        chat_log: Vec::new(),
        members: HashMap::new(),
        player_order: Vec::new(),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
