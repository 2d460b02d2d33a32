//! Wire protocol for the Xiangqi server.
//!
//! This crate defines the JSON shapes clients and the server exchange:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], and the view structs
//!   they carry) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand/ServerEvent) → SessionHub
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatEntryView, ClientCommand, GameStateView, LastMoveView, MemberView, Role, RoomId,
    RoomListEntry, ServerEvent,
};
