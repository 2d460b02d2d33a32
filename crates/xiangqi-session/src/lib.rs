//! Display-name registry for the Xiangqi server.
//!
//! Identity is a self-declared display name, validated only for in-session
//! uniqueness — there is no authentication and no reconnection/session
//! resumption. This crate owns exactly that mapping.
//!
//! # How it fits in the stack
//!
//! ```text
//! SessionHub (above)  ← binds/releases names as connections set_username / disconnect
//!     ↕
//! Session Layer (this crate)  ← UsernameRegistry
//!     ↕
//! Transport Layer (below)  ← provides ConnectionId
//! ```

mod error;
mod registry;

pub use error::SessionError;
pub use registry::UsernameRegistry;
