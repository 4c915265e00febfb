//! Pagecast Core - Foundation types for slide-to-video rendering
//!
//! This crate provides the fundamental types used throughout Pagecast:
//! - Error taxonomy shared by every pipeline stage
//! - Integer viewport geometry
//! - Frame buffers and the shape-keyed frame pool
//! - Cooperative cancellation
//! - Per-segment render parameters

pub mod cancel;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod pool;
pub mod segment;

pub use cancel::CancelToken;
pub use error::{PagecastError, Result};
pub use frame::{FrameBuffer, PixelFormat};
pub use geometry::Rect;
pub use pool::{FramePool, PooledFrame};
pub use segment::{DebugOverlays, SegmentParams, Transition, ZoomMode};

/// Memory budget constants.
pub mod memory_budget {
    /// Default budget for idle pooled frames (A4 at 300 DPI RGBA is ~35 MB).
    pub const FRAME_POOL_SIZE: usize = 512 * 1024 * 1024; // 512 MB
}
