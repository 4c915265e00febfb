//! Frame buffer types for rasterized pages in CPU memory.
//!
//! Pixels are tightly packed (no row padding) so a buffer can be piped
//! straight into an encoder as `rawvideo`.

use serde::{Deserialize, Serialize};

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGBA (32 bits per pixel)
    #[default]
    Rgba8,
    /// 8-bit grayscale
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Gray8 => 1,
        }
    }

    /// Calculate total bytes needed for a frame of this format.
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }

    /// Name understood by ffmpeg's `-pixel_format`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Self::Rgba8 => "rgba",
            Self::Gray8 => "gray",
        }
    }
}

/// A rasterized page in CPU memory.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    /// Pixel format
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Packed pixel data, `width * bytes_per_pixel` bytes per row
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Create a zeroed frame buffer with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            format,
            width,
            height,
            data: vec![0u8; format.frame_size(width, height)],
        }
    }

    /// Wrap existing packed pixels. Returns `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        (data.len() == format.frame_size(width, height)).then_some(Self {
            format,
            width,
            height,
            data,
        })
    }

    /// Total memory usage of this frame in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride();
        &self.data[start..start + self.stride()]
    }

    /// Get a mutable row of pixel data.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Overwrite every byte of this buffer from `src`.
    ///
    /// Returns `false` (leaving the buffer untouched) when `src` has the wrong length.
    pub fn fill_from(&mut self, src: &[u8]) -> bool {
        if src.len() != self.data.len() {
            return false;
        }
        self.data.copy_from_slice(src);
        true
    }

    /// Paint an opaque rectangle, clipped to the frame. RGBA only.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgba: [u8; 4]) {
        if self.format != PixelFormat::Rgba8 {
            return;
        }
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for row_y in y.min(self.height)..y_end {
            let row = self.row_mut(row_y);
            for px in x.min(x_end)..x_end {
                let i = px as usize * 4;
                row[i..i + 4].copy_from_slice(&rgba);
            }
        }
    }
}
