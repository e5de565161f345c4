//! Command handlers.

use crate::commands::EventKind;
use crate::config::{CliConfig, OutputFormat};
use crate::template::STARTER_WORKFLOW;
use console::style;
use gantry_core::events::Event;
use gantry_core::run::{JobVerdict, LogStream};
use gantry_core::workflow::WorkflowDefinition;
use gantry_scheduler::{BroadcastSink, JobMatrix, TriggerEvent, TriggerMatcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Write a starter workflow file.
pub async fn init(force: bool) -> CliResult {
    let path = Path::new("gantry.yaml");

    if path.exists() && !force {
        println!(
            "{} gantry.yaml already exists (use --force to overwrite)",
            style("!").yellow()
        );
        return Ok(());
    }

    std::fs::write(path, STARTER_WORKFLOW)?;
    println!("{} Created gantry.yaml", style("✓").green());
    Ok(())
}

/// Validate a workflow file.
pub async fn validate(config: &CliConfig, path: Option<&str>) -> CliResult {
    let path = find_workflow_file(config, path).ok_or_else(workflow_not_found)?;
    let workflow = load_workflow(&path)?;

    let problems = workflow.check();
    if problems.is_empty() {
        println!(
            "{} Workflow \"{}\" is valid",
            style("✓").green(),
            workflow.name
        );
        println!("  Jobs: {}", workflow.jobs.len());
        for job in &workflow.jobs {
            println!("    - {} ({} setup steps)", job.name, job.setup.len());
        }
        Ok(())
    } else {
        for problem in &problems {
            println!("{} {}", style("✗").red(), problem);
        }
        Err(format!("workflow has {} problem(s)", problems.len()).into())
    }
}

/// List the jobs a workflow defines.
pub async fn jobs(config: &CliConfig, path: Option<&str>) -> CliResult {
    let path = find_workflow_file(config, path).ok_or_else(workflow_not_found)?;
    let workflow = load_workflow(&path)?;

    match config.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&workflow.jobs)?);
        }
        OutputFormat::Table => {
            println!(
                "{:<20} {:<10} {:<10} STEPS",
                "JOB", "PLATFORM", "REQUIRED"
            );
            for job in &workflow.jobs {
                println!(
                    "{:<20} {:<10} {:<10} {}",
                    job.name,
                    job.runs_on.to_string(),
                    job.required,
                    job.setup.len() + 1
                );
            }
        }
    }
    Ok(())
}

/// Run the job matrix for a simulated repository event.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &CliConfig,
    path: Option<&str>,
    branch: Option<String>,
    base: String,
    revision: Option<String>,
    event_kind: EventKind,
    job: Option<String>,
) -> CliResult {
    let path = find_workflow_file(config, path).ok_or_else(workflow_not_found)?;
    let workflow = load_workflow(&path)?;
    workflow.validate()?;

    let repo = std::env::current_dir()?;
    let revision = match revision {
        Some(r) => Some(r),
        None => git_output(&repo, &["rev-parse", "HEAD"]).await,
    };
    let head_ref = match branch {
        Some(b) => b,
        None => git_output(&repo, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .unwrap_or_else(|| "work".to_string()),
    };
    let paths_changed = git_changed_paths(&repo, &base).await;

    let event = match event_kind {
        EventKind::PullRequest => TriggerEvent::PullRequest {
            repo: repo.clone(),
            head_ref,
            base_ref: base,
            revision,
            paths_changed,
        },
        EventKind::Push => TriggerEvent::Push {
            repo: repo.clone(),
            branch: head_ref,
            revision,
            paths_changed,
        },
        EventKind::Manual => TriggerEvent::Manual {
            repo: repo.clone(),
            revision,
        },
    };

    let matcher = TriggerMatcher::new();
    if !matcher.matches(&workflow, &event) {
        println!(
            "{} No trigger matches this event; nothing to run",
            style("i").blue()
        );
        return Ok(());
    }

    println!(
        "\n{} Running workflow: {}",
        style("▶").cyan().bold(),
        style(&workflow.name).bold()
    );
    println!(
        "  {} jobs, timeout: {} min\n",
        workflow.jobs.len(),
        workflow.timeout_minutes
    );

    let sink = Arc::new(BroadcastSink::default());
    let rx = sink.subscribe();
    let renderer = tokio::spawn(render_events(rx));

    let matrix = JobMatrix::new(config.runs_root(), sink.clone());
    let run = matrix.launch(&workflow, &event, job.as_deref()).await?;

    let _ = renderer.await;

    let seconds = run.duration_ms.unwrap_or(0) as f64 / 1000.0;
    println!();
    if run.verdict.is_success() {
        println!(
            "{} All required checks passed in {:.2}s",
            style("✓").green().bold(),
            seconds
        );
        Ok(())
    } else {
        let failed = run
            .jobs
            .iter()
            .filter(|j| j.required && j.verdict == JobVerdict::Failure)
            .count();
        println!(
            "{} {} required job(s) failed after {:.2}s",
            style("✗").red().bold(),
            failed,
            seconds
        );
        std::process::exit(1);
    }
}

/// Show current configuration.
pub fn show_config(config: &CliConfig) -> CliResult {
    println!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

/// Set a configuration value.
pub fn set_config(key: &str, value: &str) -> CliResult {
    let mut config = CliConfig::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;
    println!("{} {} = {}", style("✓").green(), key, value);
    Ok(())
}

async fn render_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(Event::JobStarted(p)) => {
                println!("{} Job: {}", style("━━▶").cyan(), style(&p.job_name).bold());
            }
            Ok(Event::StepStarted(p)) => {
                println!("    {} {}", style("▪").dim(), style(&p.step_name).dim());
            }
            Ok(Event::StepCompleted(p)) => match p.exit_code {
                Some(0) => println!(
                    "      {} ({:.2}s)",
                    style("✓").green(),
                    p.duration_ms as f64 / 1000.0
                ),
                Some(code) => println!(
                    "      {} exit code {} ({:.2}s)",
                    style("✗").red(),
                    code,
                    p.duration_ms as f64 / 1000.0
                ),
                None => println!("      {} step did not run", style("✗").red()),
            },
            Ok(Event::JobLog(p)) => match p.stream {
                LogStream::Stdout => println!("      {}", style(&p.content).dim()),
                LogStream::Stderr => println!("      {}", style(&p.content).red().dim()),
            },
            Ok(Event::JobCompleted(p)) => match p.verdict {
                JobVerdict::Success => println!(
                    "    {} Job {} passed\n",
                    style("✓").green(),
                    style(&p.job_name).dim()
                ),
                JobVerdict::Skipped => println!(
                    "    {} Job {} skipped (other platform)\n",
                    style("⊘").dim(),
                    style(&p.job_name).dim()
                ),
                _ => println!(
                    "    {} Job {} failed\n",
                    style("✗").red(),
                    style(&p.job_name).dim()
                ),
            },
            Ok(Event::RunStarted(_)) => {}
            Ok(Event::RunCompleted(_)) => break,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Find the workflow file: explicit path, configured default, then the
/// standard locations.
pub fn find_workflow_file(config: &CliConfig, path: Option<&str>) -> Option<PathBuf> {
    if let Some(p) = path {
        let p = PathBuf::from(p);
        return p.exists().then_some(p);
    }

    if let Some(p) = &config.workflow {
        let p = PathBuf::from(p);
        if p.exists() {
            return Some(p);
        }
    }

    let candidates = ["gantry.yaml", "gantry.yml", ".gantry/workflow.yaml"];
    for candidate in candidates {
        let p = PathBuf::from(candidate);
        if p.exists() {
            debug!(path = %p.display(), "Workflow file found");
            return Some(p);
        }
    }

    None
}

fn workflow_not_found() -> gantry_core::Error {
    gantry_core::Error::WorkflowNotFound(
        "no workflow file found (tried gantry.yaml, gantry.yml, .gantry/workflow.yaml)".to_string(),
    )
}

fn load_workflow(path: &Path) -> Result<WorkflowDefinition, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(WorkflowDefinition::from_yaml(&content)?)
}

async fn git_output(repo: &Path, args: &[&str]) -> Option<String> {
    let output = tokio::process::Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

async fn git_changed_paths(repo: &Path, base: &str) -> Vec<String> {
    match git_output(repo, &["diff", "--name-only", &format!("{}...HEAD", base)]).await {
        Some(out) => out.lines().map(str::to_string).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_workflow_file_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ci.yaml");
        std::fs::write(&file, "name: x\njobs: []\n").unwrap();

        let config = CliConfig::default();
        let found = find_workflow_file(&config, Some(&file.to_string_lossy()));
        assert_eq!(found, Some(file));

        let missing = dir.path().join("missing.yaml");
        assert!(find_workflow_file(&config, Some(&missing.to_string_lossy())).is_none());
    }

    #[test]
    fn test_find_workflow_file_prefers_configured_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.yaml");
        std::fs::write(&file, "name: x\njobs: []\n").unwrap();

        let config = CliConfig {
            workflow: Some(file.to_string_lossy().to_string()),
            ..Default::default()
        };
        assert_eq!(find_workflow_file(&config, None), Some(file));
    }
}
