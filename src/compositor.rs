//! The disposal/blend state machine that turns partial, delta-encoded
//! sub-frames into full-canvas images.
//!
//! Each [`Compositor::composite`] call runs three named steps, in this order:
//!
//! 1. apply the *previous* frame's deferred disposal,
//! 2. snapshot the canvas (the restore point for a later `Previous` dispose),
//! 3. blend the current sub-frame in.
//!
//! Disposal is deferred because a frame's dispose op describes what happens
//! *after* that frame was shown; applying the current frame's op instead is
//! the classic off-by-one.

use crate::{
    error::ConvertResult,
    frame::{BlendOp, CompositedFrame, DisposeOp, SubFrame, alloc_rgba, rgba_len},
};

#[derive(Clone, Copy, Debug)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Disposal recorded for the frame just blended, applied on the next call.
#[derive(Clone, Copy, Debug)]
struct PendingDisposal {
    op: DisposeOp,
    rect: Rect,
}

/// Owns the persistent canvas and the rolling snapshot for one conversion.
/// Not shareable across conversions; build a fresh one per input.
pub struct Compositor {
    width: u32,
    height: u32,
    canvas: Vec<u8>,
    snapshot: Vec<u8>,
    pending: Option<PendingDisposal>,
}

impl Compositor {
    /// Create a compositor over a fully transparent `width x height` canvas.
    pub fn new(width: u32, height: u32) -> ConvertResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            canvas: alloc_rgba(len)?,
            snapshot: alloc_rgba(len)?,
            pending: None,
        })
    }

    /// Resolve one sub-frame into a full-canvas frame. Must be called once
    /// per sub-frame, in file order.
    pub fn composite(&mut self, sub: &SubFrame) -> ConvertResult<CompositedFrame> {
        sub.validate(self.width, self.height)?;

        self.apply_pending_disposal();
        self.capture_snapshot();
        self.blend_sub_frame(sub);

        self.pending = Some(PendingDisposal {
            op: sub.dispose,
            rect: Rect {
                x: sub.x_offset,
                y: sub.y_offset,
                width: sub.width,
                height: sub.height,
            },
        });

        // The canvas keeps mutating on later calls, so the emitted frame
        // must be an independent copy.
        let mut pixels = alloc_rgba(self.canvas.len())?;
        pixels.copy_from_slice(&self.canvas);
        Ok(CompositedFrame {
            pixels,
            duration_ms: sub.delay_ms,
        })
    }

    /// Step 1: the previous frame's dispose op, now that its display
    /// interval is over. No-op on the first frame.
    fn apply_pending_disposal(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending.op {
            DisposeOp::None => {}
            DisposeOp::Background => self.clear_rect(pending.rect),
            DisposeOp::Previous => self.canvas.copy_from_slice(&self.snapshot),
        }
    }

    /// Step 2: record the post-disposal, pre-blend canvas. If the current
    /// frame disposes to `Previous`, this is what gets restored.
    fn capture_snapshot(&mut self) {
        self.snapshot.copy_from_slice(&self.canvas);
    }

    /// Step 3: draw the sub-frame into its rectangle.
    fn blend_sub_frame(&mut self, sub: &SubFrame) {
        let stride = self.width as usize * 4;
        let row_len = sub.width as usize * 4;
        for row in 0..sub.height as usize {
            let src = &sub.pixels[row * row_len..(row + 1) * row_len];
            let dst_start =
                (sub.y_offset as usize + row) * stride + sub.x_offset as usize * 4;
            let dst = &mut self.canvas[dst_start..dst_start + row_len];
            match sub.blend {
                BlendOp::Source => dst.copy_from_slice(src),
                BlendOp::Over => {
                    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                        d.copy_from_slice(&out);
                    }
                }
            }
        }
    }

    fn clear_rect(&mut self, rect: Rect) {
        let stride = self.width as usize * 4;
        let row_len = rect.width as usize * 4;
        for row in 0..rect.height as usize {
            let start = (rect.y as usize + row) * stride + rect.x as usize * 4;
            self.canvas[start..start + row_len].fill(0);
        }
    }
}

/// Straight-alpha source-over of one pixel.
///
/// All channels are treated as fractions of 255; the composite is computed
/// on a common 255^2 scale so the un-premultiply divide stays in integers:
/// `out.a = sa + da*(1-sa)` and `out.rgb = (src*sa + dst*da*(1-sa)) / out.a`.
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    // out alpha on a 255^2 scale.
    let out_a = sa * 255 + da * inv;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((num + out_a / 2) / out_a) as u8;
    }
    out[3] = ((out_a + 127) / 255) as u8;
    out
}
