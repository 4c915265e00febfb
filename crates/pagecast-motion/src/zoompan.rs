//! ffmpeg `zoompan` expressions built from a keyframe path.
//!
//! The encoder evaluates `z`, `x` and `y` once per output frame `on` with no
//! memory of earlier frames, so each expression is a sum of mutually
//! exclusive interval terms: `between(on,s,e-1)*(...)` for every keyframe
//! pair plus a `gte(on,last)*(...)` hold. Exactly one term is non-zero for
//! any frame at or after the first keyframe.

use pagecast_director::Keyframe;

/// Frame index of `time` seconds (truncating).
#[inline]
fn frame_of(time: f64, fps: u32) -> i64 {
    (time * fps as f64) as i64
}

/// Per-keyframe values in zoompan input space.
struct Anchor {
    frame: i64,
    zoom: f64,
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
}

fn anchors(keyframes: &[Keyframe], fps: u32, scale: f64) -> Vec<Anchor> {
    keyframes
        .iter()
        .map(|k| {
            let c = k.rect.center() * scale;
            Anchor {
                frame: frame_of(k.time, fps),
                zoom: k.zoom,
                cx: c.x,
                cy: c.y,
                w: k.rect.w as f64 * scale,
                h: k.rect.h as f64 * scale,
            }
        })
        .collect()
}

/// Builds `[lead] + Σ between-terms + tail` for one channel over frame
/// variable `var`.
///
/// `value(a)` renders a constant; `ramp(a, b)` renders the linear ramp
/// between two anchors in terms of `var`.
fn piecewise(
    anchors: &[Anchor],
    var: &str,
    value: impl Fn(&Anchor) -> String,
    ramp: impl Fn(&Anchor, &Anchor) -> String,
) -> String {
    let (Some(first), Some(last)) = (anchors.first(), anchors.last()) else {
        return String::new();
    };
    if anchors.len() == 1 {
        return value(first);
    }

    let mut terms = Vec::with_capacity(anchors.len() + 1);
    if first.frame > 0 {
        terms.push(format!("lt({var},{})*({})", first.frame, value(first)));
    }
    for pair in anchors.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.frame > a.frame {
            terms.push(format!("between({var},{},{})*({})", a.frame, b.frame - 1, ramp(a, b)));
        }
    }
    terms.push(format!("gte({var},{})*({})", last.frame, value(last)));
    terms.join("+")
}

fn lerp_expr(var: &str, start: i64, end: i64, v0: f64, v1: f64) -> String {
    format!("{v0:.6}+({var}-{start})*({v1:.6}-{v0:.6})/{}", end - start)
}

/// Linear channel over `var`, reading one field of each anchor.
fn channel(anchors: &[Anchor], var: &str, field: impl Fn(&Anchor) -> f64) -> String {
    piecewise(
        anchors,
        var,
        |a| format!("{:.6}", field(a)),
        |a, b| lerp_expr(var, a.frame, b.frame, field(a), field(b)),
    )
}

/// Zoom expression.
pub fn zoom_expr(keyframes: &[Keyframe], fps: u32) -> String {
    channel(&anchors(keyframes, fps, 1.0), "on", |a| a.zoom)
}

/// Pan expressions `(x, y)` for an input of `input_w`×`input_h` pixels.
///
/// Keyframe rectangles are in viewport pixels and are scaled by `scale` to
/// reach input space. Pan is the interpolated center minus half of the view,
/// where the view is the input size divided by the current `zoom`.
pub fn pan_exprs(keyframes: &[Keyframe], fps: u32, input_w: u32, input_h: u32, scale: f64) -> (String, String) {
    let anchors = anchors(keyframes, fps, scale);
    let x = piecewise(
        &anchors,
        "on",
        |a| format!("{:.6}-({input_w}/zoom)/2", a.cx),
        |a, b| format!("{}-({input_w}/zoom)/2", lerp_expr("on", a.frame, b.frame, a.cx, b.cx)),
    );
    let y = piecewise(
        &anchors,
        "on",
        |a| format!("{:.6}-({input_h}/zoom)/2", a.cy),
        |a, b| format!("{}-({input_h}/zoom)/2", lerp_expr("on", a.frame, b.frame, a.cy, b.cy)),
    );
    (x, y)
}

/// Complete `zoompan` filter for a clip of `duration` seconds.
///
/// The filter's input is the page letterboxed onto a canvas `scale` times
/// the `width`×`height` output. Returns an empty string for an empty path.
pub fn zoompan_filter_scaled(
    keyframes: &[Keyframe],
    duration: f64,
    fps: u32,
    width: u32,
    height: u32,
    scale: u32,
) -> String {
    if keyframes.is_empty() {
        return String::new();
    }
    let frames = frame_of(duration, fps).max(1);
    let z = zoom_expr(keyframes, fps);
    let (x, y) = pan_exprs(keyframes, fps, width * scale, height * scale, scale as f64);
    format!("zoompan=z='{z}':x='{x}':y='{y}':d={frames}:s={width}x{height}:fps={fps}")
}

/// [`zoompan_filter_scaled`] with the standard supersampled canvas.
pub fn zoompan_filter(keyframes: &[Keyframe], duration: f64, fps: u32, width: u32, height: u32) -> String {
    zoompan_filter_scaled(keyframes, duration, fps, width, height, crate::effect::SUPERSAMPLE)
}

/// `drawbox` chain outlining the camera target on the zoompan output.
///
/// `drawbox` reads its geometry once at configure time, so each keyframe
/// interval gets its own box with constant geometry taken from the
/// interval's start pose, switched on by the timeline option
/// `enable='between(n,s,e)'`. The camera keeps the target centered and
/// magnifies it by the zoom, which puts it at `(width - z*w)/2` with size
/// `z*w` (same for the vertical axis). Empty when no keyframe zooms in.
pub fn debug_box_filter(keyframes: &[Keyframe], fps: u32, width: u32, height: u32) -> String {
    if !keyframes.iter().any(|k| k.zoom > 1.0) {
        return String::new();
    }
    let anchors = anchors(keyframes, fps, 1.0);
    let (Some(first), Some(last)) = (anchors.first(), anchors.last()) else {
        return String::new();
    };

    let draw = |a: &Anchor, enable: String| {
        let (bw, bh) = ((a.zoom * a.w).round() as i64, (a.zoom * a.h).round() as i64);
        let x = (width as i64 - bw) / 2;
        let y = (height as i64 - bh) / 2;
        format!("drawbox=x={x}:y={y}:w={bw}:h={bh}:color=red:t=5:enable='{enable}'")
    };

    let mut boxes = Vec::with_capacity(anchors.len() + 1);
    if first.frame > 0 {
        boxes.push(draw(first, format!("lt(n,{})", first.frame)));
    }
    for pair in anchors.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.frame > a.frame {
            boxes.push(draw(a, format!("between(n,{},{})", a.frame, b.frame - 1)));
        }
    }
    boxes.push(draw(last, format!("gte(n,{})", last.frame)));
    boxes.join(",")
}
