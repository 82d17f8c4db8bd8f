#![forbid(unsafe_code)]

pub mod compositor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod timestamp;

pub use compositor::Compositor;
pub use decode::{ApngReader, FrameSource};
pub use encode::{AnimationSink, WebpSink};
pub use error::{ConvertError, ConvertResult};
pub use frame::{AnimationMeta, BlendOp, CompositedFrame, DisposeOp, SubFrame};
pub use pipeline::{convert_file, run};
pub use timestamp::TimestampAccumulator;
