//! Grayscale and binary-mask image utilities for edge analysis.

use pagecast_core::{FrameBuffer, PixelFormat, Rect};
use rayon::prelude::*;

/// A grayscale image stored as f32 values [0, 1].
#[derive(Debug, Clone)]
pub struct GrayImage {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl GrayImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Convert a frame to luma. Gray frames are copied as-is.
    pub fn from_frame(frame: &FrameBuffer) -> Self {
        match frame.format {
            PixelFormat::Rgba8 => rgb_to_gray(&frame.data, frame.width, frame.height),
            PixelFormat::Gray8 => Self {
                data: frame.data.iter().map(|&v| v as f32 / 255.0).collect(),
                width: frame.width,
                height: frame.height,
            },
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, val: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = val;
        }
    }
}

/// Convert RGBA u8 frame data to a grayscale image.
pub fn rgb_to_gray(rgba: &[u8], w: u32, h: u32) -> GrayImage {
    let mut gray = GrayImage::new(w, h);
    gray.data
        .par_iter_mut()
        .zip(rgba.par_chunks_exact(4))
        .for_each(|(g, px)| {
            *g = (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32) / 255.0;
        });
    gray
}

// ── Binary masks ────────────────────────────────────────────────

/// Pixel value treated as "on" in a mask.
pub const ON: u8 = 255;

/// An 8-bit mask where 255 is on and 0 is off.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    fn is_on(&self, idx: usize) -> bool {
        self.data[idx] > 128
    }

    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v > 128).count()
    }
}

/// 3×3 Sobel gradient magnitude, binarized at `threshold` (in 0..255 luma units).
///
/// The one-pixel border is always off.
pub fn sobel_edges(img: &GrayImage, threshold: f32) -> BinaryMask {
    let (w, h) = (img.width, img.height);
    let mut mask = BinaryMask::new(w, h);
    if w < 3 || h < 3 {
        return mask;
    }

    mask.data
        .par_chunks_mut(w as usize)
        .enumerate()
        .skip(1)
        .take(h as usize - 2)
        .for_each(|(y, row)| {
            let y = y as i32;
            for x in 1..(w as i32 - 1) {
                let p = |dx: i32, dy: i32| img.get(x + dx, y + dy) * 255.0;
                let gx = -p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1) + p(1, -1) + 2.0 * p(1, 0) + p(1, 1);
                let gy = -p(-1, -1) - 2.0 * p(0, -1) - p(1, -1) + p(-1, 1) + 2.0 * p(0, 1) + p(1, 1);
                if (gx * gx + gy * gy).sqrt() > threshold {
                    row[x as usize] = ON;
                }
            }
        });
    mask
}

/// Max-filter dilation with a `kernel`×`kernel` window, repeated `iterations` times.
///
/// Each pass only writes pixels at least `kernel / 2` from the border, so
/// that margin is cleared after every pass.
pub fn dilate(mask: &BinaryMask, kernel: u32, iterations: u32) -> BinaryMask {
    let half = (kernel / 2) as usize;
    let (w, h) = (mask.width as usize, mask.height as usize);
    let mut current = mask.clone();

    for _ in 0..iterations {
        let mut next = BinaryMask::new(mask.width, mask.height);
        if w > 2 * half && h > 2 * half {
            let src = &current;
            next.data
                .par_chunks_mut(w)
                .enumerate()
                .skip(half)
                .take(h - 2 * half)
                .for_each(|(y, row)| {
                    for (x, out) in row.iter_mut().enumerate().skip(half).take(w - 2 * half) {
                        let mut max = 0u8;
                        'window: for wy in (y - half)..=(y + half) {
                            for wx in (x - half)..=(x + half) {
                                let v = src.data[wy * w + wx];
                                if v > max {
                                    max = v;
                                    if max == ON {
                                        break 'window;
                                    }
                                }
                            }
                        }
                        *out = max;
                    }
                });
        }
        current = next;
    }
    current
}

/// Bounding boxes of 4-connected "on" components (value > 128).
pub fn connected_components(mask: &BinaryMask) -> Vec<Rect> {
    let (w, h) = (mask.width as usize, mask.height as usize);
    let mut visited = vec![false; w * h];
    let mut boxes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if visited[start] || !mask.is_on(start) {
            continue;
        }

        visited[start] = true;
        stack.push(start);
        let (mut min_x, mut min_y) = (start % w, start / w);
        let (mut max_x, mut max_y) = (min_x, min_y);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let mut visit = |n: usize| {
                if !visited[n] && mask.is_on(n) {
                    visited[n] = true;
                    stack.push(n);
                }
            };
            if x > 0 {
                visit(idx - 1);
            }
            if x + 1 < w {
                visit(idx + 1);
            }
            if y > 0 {
                visit(idx - w);
            }
            if y + 1 < h {
                visit(idx + w);
            }
        }

        boxes.push(Rect::from_corners(
            min_x as i32,
            min_y as i32,
            max_x as i32 + 1,
            max_y as i32 + 1,
        ));
    }
    boxes
}
