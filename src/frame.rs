use crate::error::{ConvertError, ConvertResult};

/// Animation-wide header, read once before any frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationMeta {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// Number of times the animation plays; `0` means forever.
    pub loop_count: u32,
}

/// What happens to the canvas after a frame's display interval ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisposeOp {
    #[default]
    None,
    Background,
    Previous,
}

impl From<png::DisposeOp> for DisposeOp {
    fn from(op: png::DisposeOp) -> Self {
        match op {
            png::DisposeOp::None => Self::None,
            png::DisposeOp::Background => Self::Background,
            png::DisposeOp::Previous => Self::Previous,
        }
    }
}

/// How a sub-frame's pixels combine with what is already on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendOp {
    #[default]
    Source,
    Over,
}

impl From<png::BlendOp> for BlendOp {
    fn from(op: png::BlendOp) -> Self {
        match op {
            png::BlendOp::Source => Self::Source,
            png::BlendOp::Over => Self::Over,
        }
    }
}

/// One decoded animation frame as stored: covers only the rectangle that
/// changed, positioned at `(x_offset, y_offset)` on the canvas.
#[derive(Clone, Debug)]
pub struct SubFrame {
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    pub delay_ms: u32,
    pub dispose: DisposeOp,
    pub blend: BlendOp,
    /// Straight-alpha RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl SubFrame {
    /// Bounds and buffer-size invariants against the canvas this frame will
    /// be composited onto. Violations mean the input stream is corrupt.
    pub fn validate(&self, canvas_width: u32, canvas_height: u32) -> ConvertResult<()> {
        let x_end = self.x_offset.checked_add(self.width);
        let y_end = self.y_offset.checked_add(self.height);
        match (x_end, y_end) {
            (Some(x), Some(y)) if x <= canvas_width && y <= canvas_height => {}
            _ => {
                return Err(ConvertError::Malformed(format!(
                    "sub-frame {}x{}+{}+{} exceeds {}x{} canvas",
                    self.width,
                    self.height,
                    self.x_offset,
                    self.y_offset,
                    canvas_width,
                    canvas_height
                )));
            }
        }

        let expected = rgba_len(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(ConvertError::Malformed(format!(
                "sub-frame pixel buffer holds {} bytes, expected {}",
                self.pixels.len(),
                expected
            )));
        }
        Ok(())
    }
}

/// One output unit: a full-canvas RGBA8 image plus how long it is shown.
#[derive(Clone, Debug)]
pub struct CompositedFrame {
    pub pixels: Vec<u8>,
    pub duration_ms: u32,
}

/// Convert an fcTL delay fraction to milliseconds. A zero denominator means
/// the numerator already is milliseconds, not the APNG "assume 100" default.
pub fn delay_to_ms(delay_num: u16, delay_den: u16) -> u32 {
    if delay_den == 0 {
        u32::from(delay_num)
    } else {
        u32::from(delay_num) * 1000 / u32::from(delay_den)
    }
}

/// Byte length of a `width x height` RGBA8 buffer, guarding the multiply.
pub fn rgba_len(width: u32, height: u32) -> ConvertResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| ConvertError::resource(format!("{width}x{height} raster overflows usize")))
}

/// Allocate a zeroed RGBA8 buffer, reporting allocation failure instead of
/// aborting the process.
pub fn alloc_rgba(len: usize) -> ConvertResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ConvertError::resource(format!("failed to allocate {len} byte frame buffer")))?;
    buf.resize(len, 0);
    Ok(buf)
}
