//! Time-based camera interpolation between keyframes.

use glam::DVec2;
use pagecast_director::Keyframe;
use serde::{Deserialize, Serialize};

/// Shortest keyframe span used as a divisor, in seconds.
const MIN_SPAN: f64 = 0.001;

/// Instantaneous camera pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Pan center X in viewport pixels.
    pub x: f64,
    /// Pan center Y in viewport pixels.
    pub y: f64,
    pub zoom: f64,
}

impl CameraState {
    fn of(k: &Keyframe) -> Self {
        let c = k.rect.center();
        Self {
            x: c.x,
            y: c.y,
            zoom: k.zoom,
        }
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Cubic ease-in-out on `t` in [0, 1].
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Camera pose at `time` seconds. `None` only for an empty path.
///
/// Times before the first or after the last keyframe clamp to that keyframe.
pub fn interpolate(keyframes: &[Keyframe], time: f64) -> Option<CameraState> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;

    if time <= first.time {
        return Some(CameraState::of(first));
    }
    if time >= last.time {
        return Some(CameraState::of(last));
    }

    // First keyframe strictly after `time`; its predecessor brackets from below.
    let idx = keyframes.partition_point(|k| k.time <= time);
    let (k0, k1) = (&keyframes[idx - 1], &keyframes[idx]);

    let span = (k1.time - k0.time).max(MIN_SPAN);
    let t = ease_in_out_cubic(((time - k0.time) / span).clamp(0.0, 1.0));

    let center = k0.rect.center().lerp(k1.rect.center(), t);
    Some(CameraState {
        x: center.x,
        y: center.y,
        zoom: k0.zoom + (k1.zoom - k0.zoom) * t,
    })
}
