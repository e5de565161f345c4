//! Per-job isolated workspaces.
//!
//! Every job gets its own directory under the runs root; no filesystem is
//! shared between jobs of the same run.

use gantry_core::ids::RunId;
use gantry_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Provisions and removes job workspaces.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    runs_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(runs_root: PathBuf) -> Self {
        Self { runs_root }
    }

    /// Create the workspace directory for one job of one run.
    pub async fn provision(&self, run_id: RunId, job_name: &str) -> Result<PathBuf> {
        let workspace = self
            .runs_root
            .join(run_id.to_string())
            .join(dir_name(job_name));

        fs::create_dir_all(&workspace)
            .await
            .map_err(|e| Error::WorkspaceProvisioning(format!("{}: {}", workspace.display(), e)))?;

        info!(path = %workspace.display(), "Workspace created");
        Ok(workspace)
    }

    /// Remove a job workspace. Best effort; a stale directory is not a
    /// job failure.
    pub async fn cleanup(&self, workspace: &Path) {
        if workspace.exists()
            && let Err(e) = fs::remove_dir_all(workspace).await
        {
            warn!(path = %workspace.display(), error = %e, "Failed to cleanup workspace");
        }
    }
}

fn dir_name(job_name: &str) -> String {
    job_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '-'
        })
        .collect()
}
