//! Line framing for the Chromalink protocol.
//!
//! Frame format:
//! - BODY (1-64 bytes): printable ASCII, never containing CR or LF
//! - TERMINATOR: `\n` or `\r\n`, fixed per deployment
//!
//! The parser accepts either terminator so a host can read lines from a
//! device regardless of how the device firmware ends them.

use heapless::Vec;

/// Maximum frame body size in bytes (terminator excluded)
pub const MAX_FRAME_SIZE: usize = 64;

/// Maximum bytes on the wire for one frame (body + `\r\n`)
pub const MAX_WIRE_SIZE: usize = MAX_FRAME_SIZE + 2;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Body exceeds [`MAX_FRAME_SIZE`]
    PayloadTooLarge,
    /// Body contains a line terminator or is not a recognised message
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// An incoming line overflowed the parser buffer and was discarded
    LineTooLong,
}

/// Line terminator appended to every outgoing frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Terminator bytes
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

/// One protocol line, stored without its terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    body: Vec<u8, MAX_FRAME_SIZE>,
}

impl Frame {
    /// Create a frame from its body bytes
    pub fn new(body: &[u8]) -> Result<Self, FrameError> {
        if body.len() > MAX_FRAME_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }
        if body.iter().any(|&b| b == CR || b == LF) {
            return Err(FrameError::InvalidFrame);
        }

        let mut vec = Vec::new();
        vec.extend_from_slice(body)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { body: vec })
    }

    /// Body bytes (no terminator)
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }

    /// Encode this frame with its terminator into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, line_ending: LineEnding, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let terminator = line_ending.as_bytes();
        let frame_len = self.body.len() + terminator.len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[..self.body.len()].copy_from_slice(&self.body);
        buffer[self.body.len()..frame_len].copy_from_slice(terminator);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self, line_ending: LineEnding) -> Result<Vec<u8, MAX_WIRE_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_WIRE_SIZE];
        let len = self.encode(line_ending, &mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Incremental line parser for bytes arriving from a device
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
    buffer: Vec<u8, MAX_FRAME_SIZE>,
    /// Current line overflowed; discard until the next LF
    overflowed: bool,
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete non-empty line is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err(LineTooLong)` once the
    /// terminator of an oversized line is seen.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if byte != LF {
            if self.overflowed {
                return Ok(None);
            }
            if self.buffer.push(byte).is_err() {
                self.overflowed = true;
            }
            return Ok(None);
        }

        if self.overflowed {
            self.reset();
            return Err(FrameError::LineTooLong);
        }

        if self.buffer.last() == Some(&CR) {
            self.buffer.pop();
        }

        // Blank lines carry nothing
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let frame = Frame {
            body: self.buffer.clone(),
        };
        self.reset();

        // A stray CR in the middle of a line is not a valid body
        if frame.body.contains(&CR) {
            return Err(FrameError::InvalidFrame);
        }
        Ok(Some(frame))
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
