//! Wires the stages together: decode → composite → timestamp → encode.
//!
//! The driver is the only place errors become user-visible outcomes, and the
//! destination file is written only after the encoder has assembled the whole
//! animation, so a mid-stream failure never leaves partial output behind.

use std::{fs::File, io::BufReader, path::Path};

use crate::{
    compositor::Compositor,
    decode::{ApngReader, FrameSource},
    encode::{AnimationSink, WebpSink},
    error::{ConvertError, ConvertResult},
    timestamp::TimestampAccumulator,
};

/// Drive an already-open source into an already-open sink. Rejects inputs
/// that declare one frame or fewer before touching the sink.
pub fn run<F: FrameSource, S: AnimationSink>(mut source: F, mut sink: S) -> ConvertResult<Vec<u8>> {
    let meta = source.meta();
    if meta.frame_count <= 1 {
        return Err(ConvertError::NotAnimated(meta.frame_count));
    }

    let mut compositor = Compositor::new(meta.width, meta.height)?;
    let mut clock = TimestampAccumulator::new();

    for index in 0..meta.frame_count {
        let sub = source.next_sub_frame()?;
        let frame = compositor.composite(&sub)?;
        let timestamp_ms = clock.begin_frame(frame.duration_ms);
        tracing::trace!(index, timestamp_ms, duration_ms = frame.duration_ms, "frame composited");
        sink.add_frame(&frame.pixels, timestamp_ms)?;
    }

    sink.finish(clock.end_timestamp())
}

/// Convert an APNG file into an animated WebP file.
#[tracing::instrument]
pub fn convert_file(input: &Path, output: &Path) -> ConvertResult<()> {
    let file = File::open(input)?;
    let source = ApngReader::new(BufReader::new(file))?;

    let meta = source.meta();
    if meta.frame_count <= 1 {
        return Err(ConvertError::NotAnimated(meta.frame_count));
    }

    let sink = WebpSink::new(meta.width, meta.height, meta.loop_count)?;
    let bytes = run(source, sink)?;

    std::fs::write(output, &bytes)?;
    tracing::info!(
        frames = meta.frame_count,
        bytes = bytes.len(),
        "conversion finished"
    );
    Ok(())
}
