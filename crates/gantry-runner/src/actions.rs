//! Built-in provisioning actions.
//!
//! Steps may reference a built-in action instead of a shell command. Two
//! exist: `checkout`, which places the triggering revision into the job
//! workspace, and `setup_runtime`, which resolves the requested interpreter
//! on PATH and exports its location to later steps.

use gantry_core::workflow::{BuiltinAction, RuntimeSpec};
use gantry_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Inputs a built-in action draws from the job and trigger.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub workspace: PathBuf,
    pub repo: PathBuf,
    pub revision: Option<String>,
    pub runtime: Option<RuntimeSpec>,
}

/// Run a built-in action. On success, returns environment variables to
/// export to the job's subsequent steps.
pub async fn run(action: BuiltinAction, ctx: &ActionContext) -> Result<HashMap<String, String>> {
    match action {
        BuiltinAction::Checkout => checkout(ctx).await,
        BuiltinAction::SetupRuntime => setup_runtime(ctx).await,
    }
}

/// Materialize the triggering revision in the workspace. Git sources get a
/// shared-object clone plus a detached checkout of the revision; anything
/// else is copied as-is.
async fn checkout(ctx: &ActionContext) -> Result<HashMap<String, String>> {
    if !ctx.repo.exists() {
        return Err(Error::ActionFailed(format!(
            "checkout source does not exist: {}",
            ctx.repo.display()
        )));
    }

    if ctx.repo.join(".git").exists() {
        git(&[
            "clone",
            "--shared",
            "--quiet",
            &ctx.repo.to_string_lossy(),
            &ctx.workspace.to_string_lossy(),
        ])
        .await?;

        if let Some(revision) = &ctx.revision {
            git(&[
                "-C",
                &ctx.workspace.to_string_lossy(),
                "checkout",
                "--quiet",
                "--detach",
                revision,
            ])
            .await?;
        }
        info!(repo = %ctx.repo.display(), revision = ?ctx.revision, "Checked out revision");
    } else {
        let src = ctx.repo.clone();
        let dst = ctx.workspace.clone();
        tokio::task::spawn_blocking(move || copy_tree(&src, &dst))
            .await
            .map_err(|e| Error::Internal(e.to_string()))??;
        debug!(repo = %ctx.repo.display(), "Copied non-git source into workspace");
    }

    Ok(HashMap::from([(
        "GANTRY_WORKSPACE".to_string(),
        ctx.workspace.to_string_lossy().to_string(),
    )]))
}

/// Locate an interpreter satisfying the job's runtime spec and export it.
async fn setup_runtime(ctx: &ActionContext) -> Result<HashMap<String, String>> {
    let spec = ctx.runtime.as_ref().ok_or_else(|| {
        Error::ActionFailed("setup_runtime requires a `runtime` spec on the job".to_string())
    })?;

    let candidates = [
        format!("python{}", spec.version),
        "python3".to_string(),
        "python".to_string(),
    ];

    for candidate in &candidates {
        let probe = Command::new(candidate).arg("--version").output().await;
        if let Ok(output) = probe
            && output.status.success()
        {
            info!(interpreter = %candidate, version = %spec.version, "Runtime resolved");
            return Ok(HashMap::from([
                ("GANTRY_RUNTIME".to_string(), candidate.clone()),
                ("GANTRY_RUNTIME_VERSION".to_string(), spec.version.clone()),
                ("GANTRY_RUNTIME_ARCH".to_string(), spec.arch.clone()),
            ]));
        }
    }

    Err(Error::ActionFailed(format!(
        "no interpreter for version {} found on PATH",
        spec.version
    )))
}

async fn git(args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .output()
        .await
        .map_err(|e| Error::ActionFailed(format!("git could not be invoked: {}", e)))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::ActionFailed(format!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(workspace: &Path, repo: &Path) -> ActionContext {
        ActionContext {
            workspace: workspace.to_path_buf(),
            repo: repo.to_path_buf(),
            revision: None,
            runtime: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_copies_non_git_source() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::create_dir(repo.path().join("check")).unwrap();
        std::fs::write(repo.path().join("check/pytest-changed-files"), "#!/bin/sh\n").unwrap();
        std::fs::write(repo.path().join("requirements.txt"), "numpy\n").unwrap();

        let workspace = tempfile::tempdir().unwrap();
        let exports = run(
            BuiltinAction::Checkout,
            &context(workspace.path(), repo.path()),
        )
        .await
        .unwrap();

        assert!(workspace.path().join("requirements.txt").is_file());
        assert!(workspace.path().join("check/pytest-changed-files").is_file());
        assert_eq!(
            exports.get("GANTRY_WORKSPACE").map(String::as_str),
            Some(&*workspace.path().to_string_lossy())
        );
    }

    #[tokio::test]
    async fn test_checkout_missing_source_fails() {
        let workspace = tempfile::tempdir().unwrap();
        let missing = workspace.path().join("nowhere");

        let result = run(
            BuiltinAction::Checkout,
            &context(workspace.path(), &missing),
        )
        .await;
        assert!(matches!(result, Err(Error::ActionFailed(_))));
    }

    #[tokio::test]
    async fn test_setup_runtime_without_spec_fails() {
        let workspace = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();

        let result = run(
            BuiltinAction::SetupRuntime,
            &context(workspace.path(), repo.path()),
        )
        .await;
        assert!(matches!(result, Err(Error::ActionFailed(_))));
    }
}
