//! Transport channel connection lifecycle
//!
//! Both channels (wireless and wired) share one explicit, finite state
//! machine. There is no automatic reconnection: every path back to
//! `Connected` goes through a user-initiated connect.

pub mod events;
pub mod machine;

pub use events::LinkEvent;
pub use machine::{ChannelKind, LinkState};
