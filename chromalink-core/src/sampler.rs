//! Region color sampling
//!
//! Reduces a square region in the middle of a camera frame to a single
//! averaged color. Frames are row-major RGBA, 4 bytes per pixel.

use chromalink_protocol::Rgb;

/// Bytes per pixel in the RGBA frame buffer
pub const BYTES_PER_PIXEL: usize = 4;

/// Default edge length of the sampled square (pixels)
pub const DEFAULT_BOX_SIZE: u32 = 50;

/// Borrowed view of one RGBA frame
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap raw RGBA bytes with the frame dimensions
    ///
    /// `data` may be shorter than `width * height * 4` while the frame
    /// source is being resized; missing pixels are treated as out of bounds.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB of the pixel at (x, y), or None if outside the frame or buffer
    pub fn rgb_at(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.data.get(index..index + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Rectangular sampling region in frame coordinates
///
/// The origin may be negative when the frame is smaller than the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Square of edge `size` centered in a `frame_width` × `frame_height` frame
    pub fn centered(frame_width: u32, frame_height: u32, size: u32) -> Self {
        Self {
            x: (frame_width as i64 - size as i64).div_euclid(2),
            y: (frame_height as i64 - size as i64).div_euclid(2),
            width: size,
            height: size,
        }
    }
}

/// Average the in-bounds pixels of `region`
///
/// Each channel is rounded to the nearest integer independently, halves
/// rounding up. Returns None when no pixel of the region is in bounds.
pub fn sample_region(frame: &PixelBuffer<'_>, region: Region) -> Option<Rgb> {
    let mut sums = [0u64; 3];
    let mut count = 0u64;

    for x in region.x..region.x + region.width as i64 {
        for y in region.y..region.y + region.height as i64 {
            if let Some(px) = frame.rgb_at(x, y) {
                for (sum, &c) in sums.iter_mut().zip(px.iter()) {
                    *sum += c as u64;
                }
                count += 1;
            }
        }
    }

    if count == 0 {
        return None;
    }

    let avg = |sum: u64| ((sum * 2 + count) / (count * 2)) as u8;
    Some(Rgb::new(avg(sums[0]), avg(sums[1]), avg(sums[2])))
}
