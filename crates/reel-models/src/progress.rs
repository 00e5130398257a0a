//! Assembly phase and progress reporting types.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of an assembly job.
///
/// `idle -> downloading -> repackaging -> concatenating -> complete`, with
/// `failed` reachable from any of the three active phases. Both terminal
/// phases are preceded by a cleanup pass over the job's artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyPhase {
    #[default]
    Idle,
    Downloading,
    Repackaging,
    Concatenating,
    Complete,
    Failed,
}

impl AssemblyPhase {
    /// String form used in logs and progress payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyPhase::Idle => "idle",
            AssemblyPhase::Downloading => "downloading",
            AssemblyPhase::Repackaging => "repackaging",
            AssemblyPhase::Concatenating => "concatenating",
            AssemblyPhase::Complete => "complete",
            AssemblyPhase::Failed => "failed",
        }
    }

    /// True for phases that can never advance again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssemblyPhase::Complete | AssemblyPhase::Failed)
    }

    /// True while the assembler is doing work on the job.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AssemblyPhase::Downloading | AssemblyPhase::Repackaging | AssemblyPhase::Concatenating
        )
    }
}

impl std::fmt::Display for AssemblyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress snapshot published after every batch/stage boundary.
///
/// `current` counts items finished within the current phase and never
/// decreases while the phase is unchanged; `total` is the number of items
/// the phase will process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssemblyProgress {
    pub phase: AssemblyPhase,
    pub current: usize,
    pub total: usize,
}

impl AssemblyProgress {
    pub fn new(phase: AssemblyPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
        }
    }

    /// The resting state before any job has started.
    pub fn idle() -> Self {
        Self::default()
    }
}
