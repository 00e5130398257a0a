#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for lossless clip assembly.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Lossless repackage (MP4 to TS) and concat-demuxer stitching
//! - A single-flight assembly pipeline with phase progress reporting
//! - Bulk export of clips to a local directory

pub mod assemble;
pub mod command;
pub mod engine;
pub mod error;
pub mod export;

pub use assemble::{Assembler, AssemblyJob, ClipSource, DEFAULT_DOWNLOAD_BATCH};
pub use command::{check_ffmpeg, FfmpegCommand};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use export::{export_clips, ExportFailure, ExportReport, ExportedClip};
