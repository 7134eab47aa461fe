//! Chromalink host runtime
//!
//! Wires the core pipeline to the transport drivers on a single-threaded
//! cooperative executor:
//!
//! - [`Session`] - registry, classifier, decision gate and channels
//! - [`TransportChannel`] - connection state and the one-write-in-flight rule
//! - [`Dispatcher`] - encodes once, sends to both channels concurrently
//! - [`tasks`] - sampler tick, prediction loop, device receive
//! - [`config`] - TOML deployment profile loading
//!
//! The host integration (camera, UI, BLE stack, serial API) implements the
//! `chromalink-hal` traits and [`StatusSink`], then drives the tasks.

#![deny(unsafe_code)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod channel;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod session;
pub mod status;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use channel::{SendOutcome, TransportChannel};
pub use clock::{Clock, SystemClock};
pub use config::{load_profile, load_profile_or_preset, parse_profile, ConfigError};
pub use dispatcher::{Broadcast, Dispatcher};
pub use session::{ExampleError, Facing, LabelSummary, Preview, Session, LINK_LOST_REASON};
pub use status::StatusSink;
