//! # xiangqi-server
//!
//! Authoritative multiplayer Xiangqi (Chinese Chess) game server: rooms,
//! membership, chat, and rule enforcement over JSON-over-WebSocket.
//!
//! This crate wires together the lower layers — transport, protocol,
//! session, room, rules — into a runnable binary. The pieces:
//!
//! - [`hub::SessionHub`] dispatches decoded commands to the username
//!   registry and room manager, and owns each connection's outbound
//!   channel.
//! - [`handler`] runs one Tokio task per connection, racing inbound frames
//!   against outbound events destined for that connection.
//! - [`server::XiangqiServer`] accepts connections and spawns handlers.

mod config;
mod error;
mod handler;
mod hub;
mod server;

pub use config::Config;
pub use error::ServerError;
pub use server::{XiangqiServer, XiangqiServerBuilder, DEFAULT_BIND_ADDR};
