//! Configuration types
//!
//! Deployment profiles: the knobs that differ between installations of the
//! same pipeline (threshold, terminator, baud rate, device filters).

pub mod profile;

pub use profile::*;
