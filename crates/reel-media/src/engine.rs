//! Lossless repackage and concatenation on top of the FFmpeg CLI.
//!
//! Browser-downloaded clips are plain MP4 files. Concatenating those
//! directly would require re-encoding, so each one is first repackaged
//! into an MPEG-TS segment (stream copy, no quality loss), and the
//! segments are then stitched back into a single MP4 with the concat
//! demuxer.

use std::path::Path;

use async_trait::async_trait;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Interface to the media engine. The production implementation shells
/// out to FFmpeg; tests substitute an in-memory fake.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Losslessly repackage one MP4 input into a transport segment that
    /// can be concatenated with others.
    async fn repackage(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Concatenate the segments listed in a concat-demuxer manifest into
    /// a single MP4.
    async fn concatenate(&self, manifest: &Path, output: &Path) -> MediaResult<()>;
}

/// FFmpeg-backed engine. All streams are copied, never re-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    fn repackage_command(input: &Path, output: &Path) -> FfmpegCommand {
        // h264_mp4toannexb rewrites the bitstream for the TS container.
        FfmpegCommand::new(input, output)
            .output_args(["-c", "copy", "-bsf:v", "h264_mp4toannexb", "-f", "mpegts"])
    }

    fn concatenate_command(manifest: &Path, output: &Path) -> FfmpegCommand {
        // aac_adtstoasc undoes the ADTS framing the TS segments carry;
        // +faststart moves the moov atom up front for streaming playback.
        FfmpegCommand::new(manifest, output)
            .input_args(["-f", "concat", "-safe", "0"])
            .output_args(["-c", "copy", "-bsf:a", "aac_adtstoasc", "-movflags", "+faststart"])
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn repackage(&self, input: &Path, output: &Path) -> MediaResult<()> {
        Self::repackage_command(input, output).run().await
    }

    async fn concatenate(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        Self::concatenate_command(manifest, output).run().await
    }
}
