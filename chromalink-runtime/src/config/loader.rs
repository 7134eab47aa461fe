//! Deployment profile loader
//!
//! ```toml
//! preset = "legacy"          # base profile, default "standard"
//! threshold_percent = 65
//! line_ending = "crlf"       # "lf" or "crlf"
//! serial_baud = 9600
//! ble_name_prefix = "BBC micro:bit"
//! serial_vendor_id = 3368
//! ```
//!
//! Every key except `preset` is optional and overrides the preset value.

use std::path::Path;

use serde::Deserialize;

use chromalink_core::config::{DeploymentProfile, ProfileError, ProfilePreset};
use chromalink_protocol::LineEnding;

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// File could not be read
    Io,
    /// TOML syntax error, unknown key or wrong value type
    TomlParse,
    /// Values parsed but are out of range
    Invalid(ProfileError),
}

impl From<ProfileError> for ConfigError {
    fn from(e: ProfileError) -> Self {
        ConfigError::Invalid(e)
    }
}

/// On-disk shape of the profile
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    #[serde(default)]
    preset: ProfilePreset,
    threshold_percent: Option<u8>,
    line_ending: Option<LineEnding>,
    serial_baud: Option<u32>,
    min_interval_ms: Option<u32>,
    k_neighbors: Option<u8>,
    sample_box_size: Option<u16>,
    sample_period_ms: Option<u32>,
    ble_name_prefix: Option<String>,
    serial_vendor_id: Option<u16>,
}

impl ProfileFile {
    fn into_profile(self) -> Result<DeploymentProfile, ProfileError> {
        let mut profile = DeploymentProfile::preset(self.preset);

        if let Some(v) = self.threshold_percent {
            profile.threshold_percent = v;
        }
        if let Some(v) = self.line_ending {
            profile.line_ending = v;
        }
        if let Some(v) = self.serial_baud {
            profile.serial_baud = v;
        }
        if let Some(v) = self.min_interval_ms {
            profile.min_interval_ms = v;
        }
        if let Some(v) = self.k_neighbors {
            profile.k_neighbors = v;
        }
        if let Some(v) = self.sample_box_size {
            profile.sample_box_size = v;
        }
        if let Some(v) = self.sample_period_ms {
            profile.sample_period_ms = v;
        }
        if let Some(v) = self.ble_name_prefix {
            profile.set_ble_name_prefix(&v)?;
        }
        if self.serial_vendor_id.is_some() {
            profile.serial_vendor_id = self.serial_vendor_id;
        }

        profile.validate()?;
        Ok(profile)
    }
}

/// Parse and validate a profile from TOML text
pub fn parse_profile(text: &str) -> Result<DeploymentProfile, ConfigError> {
    let file: ProfileFile = toml::from_str(text).map_err(|e| {
        warn!("TOML parse error: {}", e.message());
        ConfigError::TomlParse
    })?;

    let profile = file.into_profile().map_err(|e| {
        warn!("Invalid profile: {:?}", e);
        ConfigError::from(e)
    })?;

    log_profile_summary(&profile);
    Ok(profile)
}

/// Read, parse and validate a profile file
pub fn load_profile(path: &Path) -> Result<DeploymentProfile, ConfigError> {
    info!("Loading profile from {}", path.display().to_string().as_str());

    let text = std::fs::read_to_string(path).map_err(|e| {
        warn!("Failed to read profile: {}", e.to_string().as_str());
        ConfigError::Io
    })?;
    debug!("Read {} bytes of TOML", text.len());

    parse_profile(&text)
}

/// Load a profile file, falling back to `preset` on any error
pub fn load_profile_or_preset(path: &Path, preset: ProfilePreset) -> DeploymentProfile {
    match load_profile(path) {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Using {:?} preset, profile not loaded: {:?}", preset, e);
            DeploymentProfile::preset(preset)
        }
    }
}

/// Log a summary of the loaded profile
fn log_profile_summary(profile: &DeploymentProfile) {
    info!("Profile loaded successfully");
    debug!("  threshold {}%", profile.threshold_percent);
    debug!("  line ending {:?}", profile.line_ending);
    debug!("  serial {} baud", profile.serial_baud);
    debug!("  send interval {} ms", profile.min_interval_ms);
    debug!("  k = {}", profile.k_neighbors);
}
