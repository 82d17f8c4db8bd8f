//! Animated WebP sink.
//!
//! The encoder's timing model is "this frame appears at time T"; the last
//! frame's display interval is closed by the end timestamp handed to
//! [`AnimationSink::finish`]. Callers feed it timestamps produced by
//! [`crate::TimestampAccumulator`].

use crate::{
    error::{ConvertError, ConvertResult},
    frame::rgba_len,
};

/// Consumer of composited full-canvas frames. Implementations assemble the
/// whole output in memory; no bytes reach the destination until `finish`
/// succeeds.
pub trait AnimationSink {
    /// Accept one canvas-sized RGBA8 frame appearing at `timestamp_ms`.
    /// Timestamps must be non-decreasing.
    fn add_frame(&mut self, pixels: &[u8], timestamp_ms: u32) -> ConvertResult<()>;

    /// Close the final frame's display interval at `end_timestamp_ms` and
    /// return the assembled byte stream.
    fn finish(self, end_timestamp_ms: u32) -> ConvertResult<Vec<u8>>
    where
        Self: Sized;
}

/// [`AnimationSink`] backed by libwebp's animation encoder.
pub struct WebpSink {
    encoder: webp_animation::Encoder,
    frame_len: usize,
    frames_added: u64,
}

impl WebpSink {
    pub fn new(width: u32, height: u32, loop_count: u32) -> ConvertResult<Self> {
        let options = webp_animation::EncoderOptions {
            anim_params: webp_animation::AnimParams {
                // Same convention on both sides: 0 plays forever.
                loop_count: i32::try_from(loop_count).unwrap_or(0),
            },
            // Frames arrive fully resolved; keep them bit-exact in the
            // container rather than falling back to libwebp's lossy default.
            encoding_config: Some(webp_animation::EncodingConfig {
                encoding_type: webp_animation::EncodingType::Lossless,
                ..Default::default()
            }),
            ..Default::default()
        };
        let encoder = webp_animation::Encoder::new_with_options((width, height), options)?;
        Ok(Self {
            encoder,
            frame_len: rgba_len(width, height)?,
            frames_added: 0,
        })
    }
}

impl AnimationSink for WebpSink {
    fn add_frame(&mut self, pixels: &[u8], timestamp_ms: u32) -> ConvertResult<()> {
        if pixels.len() != self.frame_len {
            return Err(ConvertError::encode(format!(
                "frame buffer holds {} bytes, encoder expects {}",
                pixels.len(),
                self.frame_len
            )));
        }
        let ts = checked_timestamp(timestamp_ms)?;
        self.encoder.add_frame(pixels, ts)?;
        self.frames_added += 1;
        Ok(())
    }

    fn finish(self, end_timestamp_ms: u32) -> ConvertResult<Vec<u8>> {
        let data = self.encoder.finalize(checked_timestamp(end_timestamp_ms)?)?;
        tracing::debug!(
            frames = self.frames_added,
            bytes = data.len(),
            "assembled webp animation"
        );
        Ok(data.to_vec())
    }
}

fn checked_timestamp(timestamp_ms: u32) -> ConvertResult<i32> {
    i32::try_from(timestamp_ms)
        .map_err(|_| ConvertError::encode(format!("timestamp {timestamp_ms}ms overflows encoder")))
}
