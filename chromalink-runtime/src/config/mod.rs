//! Configuration loading
//!
//! Loads the deployment profile from a TOML document whose keys override a
//! named base preset. Falls back to the preset when asked to.

pub mod loader;

pub use loader::{load_profile, load_profile_or_preset, parse_profile, ConfigError};
