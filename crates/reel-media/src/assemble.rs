//! Download, repackage, concatenate pipeline with guaranteed cleanup.
//!
//! An [`Assembler`] runs at most one job at a time. Callers obtain an
//! [`AssemblyJob`] through [`Assembler::begin`], which reserves the
//! single slot and a private working directory; a second `begin` while
//! a job is alive fails with [`MediaError::AssemblyBusy`]. Every
//! intermediate artifact lives under the job directory and is removed
//! when the job finishes, whether it succeeded or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use tokio::fs;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use reel_models::{AssemblyPhase, AssemblyProgress, Clip};

use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};

/// Clips downloaded concurrently per batch.
pub const DEFAULT_DOWNLOAD_BATCH: usize = 3;

/// Where assembly and export jobs fetch clip bytes from.
///
/// The production implementation resolves a signed playback URL and
/// streams the media; tests substitute canned bytes.
#[async_trait]
pub trait ClipSource: Send + Sync {
    async fn fetch(&self, clip: &Clip) -> Result<Bytes, Box<dyn std::error::Error + Send + Sync>>;
}

/// Single-flight clip assembler.
pub struct Assembler {
    work_root: PathBuf,
    source: Arc<dyn ClipSource>,
    engine: Arc<dyn MediaEngine>,
    batch_size: usize,
    slot: Arc<Mutex<()>>,
    progress_tx: Arc<watch::Sender<AssemblyProgress>>,
    // Held so progress updates outlive any subscriber churn.
    progress_rx: watch::Receiver<AssemblyProgress>,
}

impl Assembler {
    /// Create an assembler that stages its jobs under `work_root`.
    pub fn new(
        work_root: impl Into<PathBuf>,
        source: Arc<dyn ClipSource>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        let (progress_tx, progress_rx) = watch::channel(AssemblyProgress::idle());
        Self {
            work_root: work_root.into(),
            source,
            engine,
            batch_size: DEFAULT_DOWNLOAD_BATCH,
            slot: Arc::new(Mutex::new(())),
            progress_tx: Arc::new(progress_tx),
            progress_rx,
        }
    }

    /// Override the download batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Watch progress updates for the current and future jobs.
    pub fn subscribe(&self) -> watch::Receiver<AssemblyProgress> {
        self.progress_tx.subscribe()
    }

    /// Snapshot of the latest progress update.
    pub fn progress(&self) -> AssemblyProgress {
        *self.progress_rx.borrow()
    }

    /// Reserve the assembly slot and a fresh working directory.
    ///
    /// Fails with [`MediaError::AssemblyBusy`] while another job holds
    /// the slot.
    pub async fn begin(&self) -> MediaResult<AssemblyJob> {
        let slot = Arc::clone(&self.slot)
            .try_lock_owned()
            .map_err(|_| MediaError::AssemblyBusy)?;

        let dir = self.work_root.join(format!("job-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "assembly job started");

        Ok(AssemblyJob {
            dir,
            source: Arc::clone(&self.source),
            engine: Arc::clone(&self.engine),
            batch_size: self.batch_size,
            progress: Arc::clone(&self.progress_tx),
            _slot: slot,
        })
    }
}

/// An in-flight assembly run. Owns the slot and the working directory;
/// both are released when the job is consumed or dropped.
pub struct AssemblyJob {
    dir: PathBuf,
    source: Arc<dyn ClipSource>,
    engine: Arc<dyn MediaEngine>,
    batch_size: usize,
    progress: Arc<watch::Sender<AssemblyProgress>>,
    _slot: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for AssemblyJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyJob")
            .field("dir", &self.dir)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl AssemblyJob {
    /// The job's private working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run the full pipeline and return the assembled MP4 bytes.
    ///
    /// All intermediate artifacts are removed before this returns, on
    /// the success path and the failure path alike.
    pub async fn run(self, clips: &[Clip]) -> MediaResult<Bytes> {
        let result = self.run_phases(clips).await;
        self.cleanup().await;

        match &result {
            Ok(bytes) => {
                info!(clips = clips.len(), bytes = bytes.len(), "assembly complete");
                self.mark(AssemblyPhase::Complete, clips.len(), clips.len());
            }
            Err(error) => {
                warn!(error = %error, "assembly failed");
                self.mark(AssemblyPhase::Failed, 0, clips.len());
            }
        }

        result
    }

    async fn run_phases(&self, clips: &[Clip]) -> MediaResult<Bytes> {
        if clips.is_empty() {
            return Err(MediaError::EmptyInput);
        }
        let total = clips.len();

        // Phase 1: download in parallel batches, writing inputs in the
        // caller's order so concatenation preserves it.
        self.mark(AssemblyPhase::Downloading, 0, total);
        let mut inputs = Vec::with_capacity(total);
        for batch in clips.chunks(self.batch_size) {
            let fetched = try_join_all(batch.iter().map(|clip| async move {
                self.source
                    .fetch(clip)
                    .await
                    .map_err(|source| MediaError::item_download(&clip.title, source))
            }))
            .await?;

            for bytes in fetched {
                let index = inputs.len();
                let path = self.dir.join(format!("input_{index:03}.mp4"));
                fs::write(&path, &bytes).await?;
                inputs.push(path);
                self.mark(AssemblyPhase::Downloading, inputs.len(), total);
            }
            debug!(downloaded = inputs.len(), total, "clip batch fetched");
        }

        // Phase 2: repackage each input into a concatenable segment.
        self.mark(AssemblyPhase::Repackaging, 0, total);
        let mut segments = Vec::with_capacity(total);
        for (index, input) in inputs.iter().enumerate() {
            let segment = self.dir.join(format!("seg_{index:03}.ts"));
            self.engine.repackage(input, &segment).await?;
            segments.push(segment);
            self.mark(AssemblyPhase::Repackaging, index + 1, total);
        }

        // Phase 3: one concat pass over the manifest.
        self.mark(AssemblyPhase::Concatenating, 0, 1);
        let manifest = self.dir.join("filelist.txt");
        fs::write(&manifest, concat_manifest(&segments)).await?;

        let output = self.dir.join("output.mp4");
        self.engine.concatenate(&manifest, &output).await?;
        self.mark(AssemblyPhase::Concatenating, 1, 1);

        Ok(Bytes::from(fs::read(&output).await?))
    }

    /// Remove the working directory and everything under it. Failures
    /// are logged, never returned.
    async fn cleanup(&self) {
        if let Err(error) = fs::remove_dir_all(&self.dir).await {
            warn!(
                dir = %self.dir.display(),
                error = %error,
                "failed to remove assembly work dir"
            );
        }
    }

    fn mark(&self, phase: AssemblyPhase, current: usize, total: usize) {
        let _ = self.progress.send(AssemblyProgress::new(phase, current, total));
    }
}

impl Drop for AssemblyJob {
    fn drop(&mut self) {
        // A job abandoned without running still releases its directory.
        if self.dir.exists() {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }
}

/// Render the concat demuxer manifest for the given segments.
fn concat_manifest(segments: &[PathBuf]) -> String {
    let mut lines = String::new();
    for segment in segments {
        lines.push_str(&format!("file '{}'\n", segment.display()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_manifest_format() {
        let segments = vec![
            PathBuf::from("/tmp/job/seg_000.ts"),
            PathBuf::from("/tmp/job/seg_001.ts"),
        ];
        assert_eq!(
            concat_manifest(&segments),
            "file '/tmp/job/seg_000.ts'\nfile '/tmp/job/seg_001.ts'\n"
        );
    }

    #[test]
    fn test_concat_manifest_empty() {
        assert_eq!(concat_manifest(&[]), "");
    }
}
