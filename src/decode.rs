//! APNG frame source.
//!
//! Wraps the `png` crate's streaming reader and yields raw, *uncomposited*
//! sub-frames: each covers only its fcTL rectangle and still carries its
//! dispose/blend ops. Pixels are normalized to straight-alpha RGBA8 whatever
//! the source bit depth and color type.

use std::io::Read;

use crate::{
    error::{ConvertError, ConvertResult},
    frame::{AnimationMeta, SubFrame, alloc_rgba, delay_to_ms, rgba_len},
};

/// Ordered supplier of decoded sub-frames. `meta` is available before the
/// first frame is read; `next_sub_frame` may be called `meta.frame_count`
/// times, in order.
pub trait FrameSource {
    fn meta(&self) -> AnimationMeta;
    fn next_sub_frame(&mut self) -> ConvertResult<SubFrame>;
}

/// [`FrameSource`] over an APNG byte stream.
pub struct ApngReader<R: Read> {
    reader: png::Reader<R>,
    meta: AnimationMeta,
}

impl<R: Read> ApngReader<R> {
    pub fn new(input: R) -> ConvertResult<Self> {
        let mut decoder = png::Decoder::new(input);
        // Palette/bit-depth/tRNS expansion plus forced alpha: frames come out
        // as RGBA8 or GrayscaleAlpha8, never indexed or 16-bit.
        decoder.set_transformations(
            png::Transformations::normalize_to_color8() | png::Transformations::ALPHA,
        );
        let reader = decoder.read_info()?;
        let info = reader.info();

        // A plain PNG has no acTL; report it as a single-frame animation and
        // let the pipeline driver reject it as not animated.
        let (frame_count, loop_count) = match info.animation_control() {
            Some(actl) => (actl.num_frames, actl.num_plays),
            None => (1, 0),
        };
        let meta = AnimationMeta {
            width: info.width,
            height: info.height,
            frame_count,
            loop_count,
        };
        tracing::debug!(
            width = meta.width,
            height = meta.height,
            frames = meta.frame_count,
            plays = meta.loop_count,
            "read animation header"
        );
        Ok(Self { reader, meta })
    }
}

impl<R: Read> FrameSource for ApngReader<R> {
    fn meta(&self) -> AnimationMeta {
        self.meta
    }

    fn next_sub_frame(&mut self) -> ConvertResult<SubFrame> {
        // Positions the reader on the next fcTL, skipping the default image
        // when it is not part of the animation.
        let fctl = *self.reader.next_frame_info()?;

        let mut buf = alloc_rgba(self.reader.output_buffer_size())?;
        let out = self.reader.next_frame(&mut buf)?;
        buf.truncate(out.buffer_size());

        let pixels = normalize_to_rgba(&buf, out.color_type, fctl.width, fctl.height)?;
        Ok(SubFrame {
            x_offset: fctl.x_offset,
            y_offset: fctl.y_offset,
            width: fctl.width,
            height: fctl.height,
            delay_ms: delay_to_ms(fctl.delay_num, fctl.delay_den),
            dispose: fctl.dispose_op.into(),
            blend: fctl.blend_op.into(),
            pixels,
        })
    }
}

/// Widen a decoded scanline buffer to RGBA8. After the transformations set in
/// [`ApngReader::new`] only the alpha-carrying forms should appear, but the
/// opaque forms are cheap to support.
fn normalize_to_rgba(
    data: &[u8],
    color: png::ColorType,
    width: u32,
    height: u32,
) -> ConvertResult<Vec<u8>> {
    let expected = rgba_len(width, height)?;
    let mut rgba = match color {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => {
            let mut rgba = alloc_rgba(expected)?;
            for (dst, src) in rgba.chunks_exact_mut(4).zip(data.chunks_exact(3)) {
                dst[..3].copy_from_slice(src);
                dst[3] = 255;
            }
            rgba
        }
        png::ColorType::GrayscaleAlpha => {
            let mut rgba = alloc_rgba(expected)?;
            for (dst, src) in rgba.chunks_exact_mut(4).zip(data.chunks_exact(2)) {
                dst[..3].fill(src[0]);
                dst[3] = src[1];
            }
            rgba
        }
        png::ColorType::Grayscale => {
            let mut rgba = alloc_rgba(expected)?;
            for (dst, src) in rgba.chunks_exact_mut(4).zip(data.chunks_exact(1)) {
                dst[..3].fill(src[0]);
                dst[3] = 255;
            }
            rgba
        }
        png::ColorType::Indexed => {
            return Err(ConvertError::malformed(
                "indexed pixels survived palette expansion",
            ));
        }
    };

    if rgba.len() != expected {
        return Err(ConvertError::Malformed(format!(
            "frame data holds {} rgba bytes, expected {} for {}x{}",
            rgba.len(),
            expected,
            width,
            height
        )));
    }
    rgba.shrink_to_fit();
    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BlendOp, DisposeOp};
    use std::io::Cursor;

    fn encode_apng(width: u32, height: u32, frames: &[(Vec<u8>, u16, u16)]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut enc = png::Encoder::new(&mut out, width, height);
            enc.set_color(png::ColorType::Rgba);
            enc.set_depth(png::BitDepth::Eight);
            enc.set_animated(frames.len() as u32, 0).unwrap();
            let mut writer = enc.write_header().unwrap();
            for (pixels, num, den) in frames {
                writer.set_frame_delay(*num, *den).unwrap();
                writer.write_image_data(pixels).unwrap();
            }
            writer.finish().unwrap();
        }
        out
    }

    #[test]
    fn reads_meta_and_full_canvas_frames() {
        let red = [255u8, 0, 0, 255].repeat(4);
        let blue = [0u8, 0, 255, 255].repeat(4);
        let apng = encode_apng(2, 2, &[(red.clone(), 100, 1000), (blue.clone(), 1, 10)]);

        let mut source = ApngReader::new(Cursor::new(apng)).unwrap();
        let meta = source.meta();
        assert_eq!(
            meta,
            AnimationMeta {
                width: 2,
                height: 2,
                frame_count: 2,
                loop_count: 0
            }
        );

        let f0 = source.next_sub_frame().unwrap();
        assert_eq!((f0.x_offset, f0.y_offset, f0.width, f0.height), (0, 0, 2, 2));
        assert_eq!(f0.delay_ms, 100);
        assert_eq!(f0.dispose, DisposeOp::None);
        assert_eq!(f0.blend, BlendOp::Source);
        assert_eq!(f0.pixels, red);

        let f1 = source.next_sub_frame().unwrap();
        assert_eq!(f1.delay_ms, 100);
        assert_eq!(f1.pixels, blue);
    }

    #[test]
    fn plain_png_reports_single_frame_meta() {
        let mut out = Vec::new();
        {
            let mut enc = png::Encoder::new(&mut out, 1, 1);
            enc.set_color(png::ColorType::Rgba);
            enc.set_depth(png::BitDepth::Eight);
            let mut writer = enc.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3, 4]).unwrap();
            writer.finish().unwrap();
        }
        let source = ApngReader::new(Cursor::new(out)).unwrap();
        assert_eq!(source.meta().frame_count, 1);
    }

    #[test]
    fn truncated_stream_is_malformed() {
        let red = [255u8, 0, 0, 255].repeat(4);
        let mut apng = encode_apng(2, 2, &[(red.clone(), 10, 1000), (red, 10, 1000)]);
        apng.truncate(apng.len() / 2);

        match ApngReader::new(Cursor::new(apng)) {
            Ok(mut source) => {
                let err = loop {
                    match source.next_sub_frame() {
                        Ok(_) => continue,
                        Err(e) => break e,
                    }
                };
                assert!(matches!(
                    err,
                    ConvertError::Malformed(_) | ConvertError::Io(_)
                ));
            }
            Err(err) => assert!(matches!(
                err,
                ConvertError::Malformed(_) | ConvertError::Io(_)
            )),
        }
    }

    #[test]
    fn grayscale_alpha_widens_to_rgba() {
        let rgba = normalize_to_rgba(&[9, 200], png::ColorType::GrayscaleAlpha, 1, 1).unwrap();
        assert_eq!(rgba, vec![9, 9, 9, 200]);
    }

    #[test]
    fn rgb_widens_to_opaque_rgba() {
        let rgba = normalize_to_rgba(&[1, 2, 3], png::ColorType::Rgb, 1, 1).unwrap();
        assert_eq!(rgba, vec![1, 2, 3, 255]);
    }
}
