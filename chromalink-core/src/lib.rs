//! Host-agnostic core logic for the Chromalink color link
//!
//! This crate contains all application logic that does not depend on a
//! camera, a UI toolkit or a particular transport:
//!
//! - Region color sampling from RGBA frame buffers
//! - Label registry and k-nearest-neighbor classifier
//! - Decision gate (confidence threshold + send throttling)
//! - Connection state machine shared by both transport channels
//! - Deployment profile definitions

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod classifier;
pub mod config;
pub mod gate;
pub mod link;
pub mod sampler;

pub use chromalink_protocol::Rgb;
