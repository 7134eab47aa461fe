//! Deployment profile definitions
//!
//! Installations of the pipeline disagree on three values that must match
//! the device firmware: the confidence threshold, the line terminator and
//! the serial baud rate. None of them supersedes the other, so each
//! deployment picks one profile and sticks to it.

use heapless::String;

use chromalink_protocol::LineEnding;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::classifier::DEFAULT_K;
use crate::gate::DEFAULT_MIN_INTERVAL_MS;
use crate::sampler::DEFAULT_BOX_SIZE;

/// Maximum BLE name prefix length
pub const MAX_NAME_PREFIX_LEN: usize = 32;

/// Serial baud rates the device firmware is known to use
pub const SUPPORTED_BAUD_RATES: [u32; 2] = [9600, 115200];

/// Default BLE advertised-name prefix (micro:bit family)
pub const DEFAULT_BLE_NAME_PREFIX: &str = "BBC micro:bit";

/// Default sampler tick period (ms), one render frame at 60 Hz
pub const DEFAULT_SAMPLE_PERIOD_MS: u32 = 16;

/// Profile validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileError {
    /// Threshold must be within 1..=99 percent
    ThresholdOutOfRange,
    /// Baud rate is not one of [`SUPPORTED_BAUD_RATES`]
    UnsupportedBaud,
    /// k must be at least 1
    ZeroNeighbors,
    /// Send interval must be at least 1 ms
    ZeroInterval,
    /// Sample box must be at least 1 pixel
    ZeroBoxSize,
    /// Sample period must be at least 1 ms
    ZeroSamplePeriod,
    /// BLE name prefix empty or longer than [`MAX_NAME_PREFIX_LEN`]
    InvalidNamePrefix,
}

/// Named base profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProfilePreset {
    /// 70 %, `\n`, 115200 baud
    #[default]
    Standard,
    /// 60 %, `\r\n`, 9600 baud
    Legacy,
}

/// Per-deployment pipeline settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeploymentProfile {
    /// Confidence must be strictly above this to transmit (percent)
    pub threshold_percent: u8,
    /// Terminator on every outgoing frame
    pub line_ending: LineEnding,
    /// Wired channel baud rate
    pub serial_baud: u32,
    /// Minimum spacing between data frames (ms)
    pub min_interval_ms: u32,
    /// Neighbors consulted per classification
    pub k_neighbors: u8,
    /// Edge length of the centered sample square (px)
    pub sample_box_size: u16,
    /// Sampler tick period (ms)
    pub sample_period_ms: u32,
    /// BLE discovery filter on the advertised name
    pub ble_name_prefix: String<MAX_NAME_PREFIX_LEN>,
    /// Optional USB vendor id filter for the serial picker
    pub serial_vendor_id: Option<u16>,
}

impl Default for DeploymentProfile {
    fn default() -> Self {
        Self::standard()
    }
}

impl DeploymentProfile {
    /// Profile for a named preset
    pub fn preset(preset: ProfilePreset) -> Self {
        match preset {
            ProfilePreset::Standard => Self::standard(),
            ProfilePreset::Legacy => Self::legacy(),
        }
    }

    /// 70 % threshold, `\n` terminator, 115200 baud
    pub fn standard() -> Self {
        let mut ble_name_prefix = String::new();
        let _ = ble_name_prefix.push_str(DEFAULT_BLE_NAME_PREFIX);

        Self {
            threshold_percent: 70,
            line_ending: LineEnding::Lf,
            serial_baud: 115200,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS as u32,
            k_neighbors: DEFAULT_K as u8,
            sample_box_size: DEFAULT_BOX_SIZE as u16,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            ble_name_prefix,
            serial_vendor_id: None,
        }
    }

    /// 60 % threshold, `\r\n` terminator, 9600 baud
    pub fn legacy() -> Self {
        Self {
            threshold_percent: 60,
            line_ending: LineEnding::CrLf,
            serial_baud: 9600,
            ..Self::standard()
        }
    }

    /// Check every field is within the range the pipeline supports
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(1..=99).contains(&self.threshold_percent) {
            return Err(ProfileError::ThresholdOutOfRange);
        }
        if !SUPPORTED_BAUD_RATES.contains(&self.serial_baud) {
            return Err(ProfileError::UnsupportedBaud);
        }
        if self.k_neighbors == 0 {
            return Err(ProfileError::ZeroNeighbors);
        }
        if self.min_interval_ms == 0 {
            return Err(ProfileError::ZeroInterval);
        }
        if self.sample_box_size == 0 {
            return Err(ProfileError::ZeroBoxSize);
        }
        if self.sample_period_ms == 0 {
            return Err(ProfileError::ZeroSamplePeriod);
        }
        if self.ble_name_prefix.trim().is_empty() {
            return Err(ProfileError::InvalidNamePrefix);
        }
        Ok(())
    }

    /// Set the BLE name prefix, rejecting empty or oversized values
    pub fn set_ble_name_prefix(&mut self, prefix: &str) -> Result<(), ProfileError> {
        let mut s = String::new();
        if prefix.trim().is_empty() || s.push_str(prefix).is_err() {
            return Err(ProfileError::InvalidNamePrefix);
        }
        self.ble_name_prefix = s;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(DeploymentProfile::standard().validate(), Ok(()));
        assert_eq!(DeploymentProfile::legacy().validate(), Ok(()));
    }

    #[test]
    fn test_presets_differ_only_in_firmware_knobs() {
        let standard = DeploymentProfile::standard();
        let legacy = DeploymentProfile::legacy();

        assert_eq!(standard.threshold_percent, 70);
        assert_eq!(legacy.threshold_percent, 60);
        assert_eq!(standard.line_ending, LineEnding::Lf);
        assert_eq!(legacy.line_ending, LineEnding::CrLf);
        assert_eq!(standard.serial_baud, 115200);
        assert_eq!(legacy.serial_baud, 9600);

        assert_eq!(standard.min_interval_ms, legacy.min_interval_ms);
        assert_eq!(standard.ble_name_prefix, legacy.ble_name_prefix);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut p = DeploymentProfile::standard();
        p.threshold_percent = 100;
        assert_eq!(p.validate(), Err(ProfileError::ThresholdOutOfRange));

        let mut p = DeploymentProfile::standard();
        p.serial_baud = 57600;
        assert_eq!(p.validate(), Err(ProfileError::UnsupportedBaud));

        let mut p = DeploymentProfile::standard();
        p.k_neighbors = 0;
        assert_eq!(p.validate(), Err(ProfileError::ZeroNeighbors));

        let mut p = DeploymentProfile::standard();
        p.min_interval_ms = 0;
        assert_eq!(p.validate(), Err(ProfileError::ZeroInterval));
    }

    #[test]
    fn test_name_prefix_capacity() {
        let mut p = DeploymentProfile::standard();
        assert_eq!(p.set_ble_name_prefix("micro"), Ok(()));
        assert_eq!(p.ble_name_prefix.as_str(), "micro");

        let long = "x".repeat(MAX_NAME_PREFIX_LEN + 1);
        assert_eq!(
            p.set_ble_name_prefix(&long),
            Err(ProfileError::InvalidNamePrefix)
        );
        assert_eq!(p.set_ble_name_prefix("  "), Err(ProfileError::InvalidNamePrefix));
    }
}
