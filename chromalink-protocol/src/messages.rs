//! Message types for the Chromalink protocol
//!
//! The host only ever sends two kinds of message:
//! - Data: the winning label plus the currently sampled color
//! - Stop: prediction was halted, the device should idle

use core::fmt::Write;

use heapless::String;

use crate::color::Rgb;
use crate::frame::{Frame, FrameError, LineEnding, MAX_FRAME_SIZE, MAX_WIRE_SIZE};

/// Leading byte of a data frame
pub const DATA_PREFIX: u8 = b'I';

/// Control token sent when prediction stops
pub const STOP_TOKEN: &str = "stop";

/// Messages from the host to the microcontroller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostMessage {
    /// Classification result: `I<label>R<rrr>G<ggg>B<bbb>`
    Data { label: u32, color: Rgb },
    /// Prediction stopped
    Stop,
}

impl HostMessage {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            HostMessage::Data { label, color } => {
                let mut body = String::<MAX_FRAME_SIZE>::new();
                write!(
                    body,
                    "I{}R{:03}G{:03}B{:03}",
                    label, color.r, color.g, color.b
                )
                .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(body.as_bytes())
            }
            HostMessage::Stop => Frame::new(STOP_TOKEN.as_bytes()),
        }
    }

    /// Encode this message straight to wire bytes
    pub fn encode(&self, line_ending: LineEnding) -> Result<heapless::Vec<u8, MAX_WIRE_SIZE>, FrameError> {
        self.to_frame()?.encode_to_vec(line_ending)
    }

    /// Parse a message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let body = frame.body();
        if body == STOP_TOKEN.as_bytes() {
            return Ok(HostMessage::Stop);
        }

        let rest = match body.split_first() {
            Some((&DATA_PREFIX, rest)) => rest,
            _ => return Err(FrameError::InvalidFrame),
        };

        // Label runs up to the 'R' marker; the tail is fixed width
        let r_pos = rest
            .iter()
            .position(|&b| b == b'R')
            .ok_or(FrameError::InvalidFrame)?;
        let (label_digits, tail) = rest.split_at(r_pos);
        if label_digits.is_empty() || tail.len() != 12 {
            return Err(FrameError::InvalidFrame);
        }

        let label = parse_decimal(label_digits).ok_or(FrameError::InvalidFrame)?;

        let mut channels = [0u8; 3];
        for (i, marker) in [b'R', b'G', b'B'].iter().enumerate() {
            let field = &tail[i * 4..i * 4 + 4];
            if field[0] != *marker {
                return Err(FrameError::InvalidFrame);
            }
            let value = parse_decimal(&field[1..]).ok_or(FrameError::InvalidFrame)?;
            channels[i] = u8::try_from(value).map_err(|_| FrameError::InvalidFrame)?;
        }

        Ok(HostMessage::Data {
            label,
            color: Rgb::from(channels),
        })
    }
}

/// Parse an unsigned decimal made only of ASCII digits
fn parse_decimal(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u32, |acc, &d| {
        if !d.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add((d - b'0') as u32)
    })
}
