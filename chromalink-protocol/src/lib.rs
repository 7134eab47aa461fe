//! Chromalink Wire Protocol
//!
//! This crate defines the text protocol spoken between the host (color
//! classifier) and the microcontroller on the far end of the BLE or serial
//! link. Both transports carry exactly the same bytes.
//!
//! # Protocol Overview
//!
//! Every message is one ASCII line:
//! ```text
//! ┌───┬────────┬───┬─────┬───┬─────┬───┬─────┬────────────┐
//! │ I │ label  │ R │ rrr │ G │ ggg │ B │ bbb │ terminator │
//! │1B │ 1–10B  │1B │ 3B  │1B │ 3B  │1B │ 3B  │ \n | \r\n  │
//! └───┴────────┴───┴─────┴───┴─────┴───┴─────┴────────────┘
//! ```
//!
//! The label is a plain decimal number; each color channel is zero-padded to
//! three digits so the numeric tail is always nine characters wide. The only
//! control message is the literal `stop`. The terminator is fixed per
//! deployment, never mixed.

#![no_std]
#![deny(unsafe_code)]

pub mod color;
pub mod frame;
pub mod messages;

pub use color::Rgb;
pub use frame::{Frame, FrameError, FrameParser, LineEnding, MAX_FRAME_SIZE, MAX_WIRE_SIZE};
pub use messages::HostMessage;
