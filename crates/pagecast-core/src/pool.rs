//! Frame buffer pool for reusing page rasters.
//!
//! Avoids allocating a fresh multi-megabyte buffer per page by keeping
//! released buffers keyed by (width, height, format). A buffer is only
//! ever handed out for the exact shape it was allocated with.

use crate::frame::{FrameBuffer, PixelFormat};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

/// Key for pooled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameKey {
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl FrameKey {
    fn of(frame: &FrameBuffer) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            format: frame.format,
        }
    }
}

struct PoolState {
    /// Available (free) frames, keyed by dimensions + format.
    free: HashMap<FrameKey, Vec<FrameBuffer>>,
    /// Total memory held by free frames.
    total_memory: usize,
    /// Maximum memory budget for free frames.
    max_memory: usize,
    /// Frames currently checked out.
    outstanding: usize,
}

/// Thread-safe pool of reusable frame buffers.
///
/// Cloning the pool is cheap; clones share the same free lists.
#[derive(Clone)]
pub struct FramePool {
    state: Arc<Mutex<PoolState>>,
}

impl FramePool {
    /// Create a new frame pool with the given memory budget for idle frames.
    pub fn new(max_memory: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                free: HashMap::new(),
                total_memory: 0,
                max_memory,
                outstanding: 0,
            })),
        }
    }

    /// Check out a frame of the given shape, reusing a free one if available.
    ///
    /// A reused frame still holds the previous page's pixels; the caller must
    /// overwrite it completely before handing it on.
    pub fn checkout(&self, width: u32, height: u32, format: PixelFormat) -> PooledFrame {
        let key = FrameKey {
            width,
            height,
            format,
        };

        let reused = {
            let mut state = self.state.lock();
            state.outstanding += 1;
            let frame = state.free.get_mut(&key).and_then(Vec::pop);
            if let Some(ref f) = frame {
                state.total_memory -= f.memory_size();
            }
            frame
        };

        let frame = match reused {
            Some(frame) => {
                trace!(width, height, "Reusing pooled frame");
                frame
            }
            None => FrameBuffer::new(width, height, format),
        };

        PooledFrame {
            frame,
            pool: self.clone(),
        }
    }

    /// Return a frame to the pool for reuse.
    fn release(&self, frame: FrameBuffer) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);

        let mem = frame.memory_size();
        // If returning this frame would exceed budget, drop it instead
        if state.total_memory + mem > state.max_memory {
            return;
        }

        state.total_memory += mem;
        state.free.entry(FrameKey::of(&frame)).or_default().push(frame);
    }

    /// Total memory used by pooled (free) frames.
    pub fn memory_usage(&self) -> usize {
        self.state.lock().total_memory
    }

    /// Number of idle frames in the pool.
    pub fn free_count(&self) -> usize {
        self.state.lock().free.values().map(Vec::len).sum()
    }

    /// Number of frames checked out and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Drop all idle frames.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.free.clear();
        state.total_memory = 0;
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new(crate::memory_budget::FRAME_POOL_SIZE)
    }
}

impl std::fmt::Debug for FramePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FramePool")
            .field("total_memory", &state.total_memory)
            .field("max_memory", &state.max_memory)
            .field("outstanding", &state.outstanding)
            .finish()
    }
}

/// A checked-out frame. Returns itself to its pool exactly once, on drop.
pub struct PooledFrame {
    frame: FrameBuffer,
    pool: FramePool,
}

impl Deref for PooledFrame {
    type Target = FrameBuffer;

    fn deref(&self) -> &FrameBuffer {
        &self.frame
    }
}

impl DerefMut for PooledFrame {
    fn deref_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }
}

impl Drop for PooledFrame {
    fn drop(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        self.pool.release(frame);
    }
}

impl std::fmt::Debug for PooledFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}
