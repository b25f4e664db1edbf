//! FFmpeg-based media assembly engine for StoryMV.
//!
//! Concatenates heterogeneous video/audio segments (remote URLs or
//! local paths) into one exportable mp4 via a subprocess transcoder,
//! with a single-segment fast path that avoids re-encoding.

pub mod assemble;
pub mod command;
pub mod error;
pub mod fetch;

pub use assemble::{ExportDestination, ExportedMedia, MediaAssembler, EXPORT_MIME_TYPE};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fetch::SegmentSource;
