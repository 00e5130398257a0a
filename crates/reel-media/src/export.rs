//! Bulk export of clips to a local directory.
//!
//! Unlike assembly, export is partial-tolerant: each clip succeeds or
//! fails on its own, and the report tallies both sides.

use std::path::Path;

use futures::future::join_all;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use reel_models::Clip;

use crate::assemble::ClipSource;
use crate::error::MediaResult;

/// One clip written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedClip {
    pub id: String,
    pub file: String,
}

/// One clip that could not be exported.
#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub id: String,
    pub title: String,
    pub error: String,
}

/// Outcome of a bulk export run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub saved: Vec<ExportedClip>,
    pub failed: Vec<ExportFailure>,
}

/// Download every clip and write each under `dir` with its display
/// filename. Clips are fetched in parallel batches of `batch_size`;
/// individual failures land in the report instead of aborting the run.
pub async fn export_clips(
    source: &dyn ClipSource,
    clips: &[Clip],
    dir: &Path,
    batch_size: usize,
) -> MediaResult<ExportReport> {
    fs::create_dir_all(dir).await?;

    let mut report = ExportReport::default();
    for batch in clips.chunks(batch_size.max(1)) {
        let results = join_all(batch.iter().map(|clip| async move {
            let bytes = source.fetch(clip).await?;
            let file = clip.download_filename();
            fs::write(dir.join(&file), &bytes).await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(file)
        }))
        .await;

        for (clip, result) in batch.iter().zip(results) {
            match result {
                Ok(file) => report.saved.push(ExportedClip {
                    id: clip.id.clone(),
                    file,
                }),
                Err(error) => {
                    warn!(clip = %clip.id, error = %error, "clip export failed");
                    report.failed.push(ExportFailure {
                        id: clip.id.clone(),
                        title: clip.title.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }
    }

    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        dir = %dir.display(),
        "bulk export finished"
    );
    Ok(report)
}
