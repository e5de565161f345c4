//! Job execution logic.
//!
//! A job runs its setup steps in order, then its single action step. The
//! first non-zero step stops the sequence and fails the job; setup and
//! action failures are externally indistinguishable.

use crate::actions::{self, ActionContext};
use crate::runner::{OutputLine, RunnerConfig, StepContext, StepRunner};
use crate::shell::ShellRunner;
use crate::workspace::WorkspaceManager;
use chrono::Utc;
use gantry_core::Result;
use gantry_core::events::{
    Event, JobCompletedPayload, JobLogPayload, JobStartedPayload, StepCompletedPayload,
    StepStartedPayload,
};
use gantry_core::ids::{JobId, RunId};
use gantry_core::ports::EventSink;
use gantry_core::run::{JobExecution, JobVerdict, StepOutcome, StepPhase};
use gantry_core::workflow::{JobDefinition, StepDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Executes a single job of a run.
pub struct JobExecutor {
    workspaces: WorkspaceManager,
    sink: Arc<dyn EventSink>,
}

/// A job to execute.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub run_id: RunId,
    pub job: JobDefinition,
    pub workflow_env: HashMap<String, String>,
    pub workflow_timeout: u32,
    pub repo: PathBuf,
    pub revision: Option<String>,
}

impl JobExecutor {
    pub fn new(runs_root: PathBuf, sink: Arc<dyn EventSink>) -> Self {
        Self {
            workspaces: WorkspaceManager::new(runs_root),
            sink,
        }
    }

    /// Execute a job to completion and report its verdict.
    pub async fn execute(&self, req: JobRequest) -> Result<JobExecution> {
        let start = std::time::Instant::now();
        let started_at = Utc::now();
        let step_count = req.job.setup.len() as u32 + 1;

        info!(
            run_id = %req.run_id,
            job = %req.job.name,
            "Starting job execution"
        );

        self.publish_job_started(&req, step_count).await?;

        let mut steps = Vec::new();
        let mut verdict = JobVerdict::Success;

        let workspace = match self.workspaces.provision(req.run_id, &req.job.name).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(job = %req.job.name, error = %e, "Workspace provisioning failed");
                verdict = JobVerdict::Failure;
                None
            }
        };

        if let Some(workspace) = &workspace {
            let mut env = req.workflow_env.clone();
            env.extend(req.job.env.clone());
            let timeout_seconds = req.job.timeout(req.workflow_timeout) as u64 * 60;

            let sequence = req
                .job
                .setup
                .iter()
                .map(|s| (s, StepPhase::Setup))
                .chain(std::iter::once((&req.job.action, StepPhase::Action)));

            for (step, phase) in sequence {
                self.publish_step_started(&req, step, phase).await?;

                let outcome = self
                    .run_step(&req, step, phase, workspace, &mut env, timeout_seconds)
                    .await;

                self.publish_step_completed(&req, &outcome).await?;

                let ok = outcome.succeeded();
                steps.push(outcome);

                if !ok {
                    verdict = JobVerdict::Failure;
                    break;
                }
            }
        }

        if let Some(workspace) = &workspace {
            self.workspaces.cleanup(workspace).await;
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        self.publish_job_completed(&req, verdict, duration_ms)
            .await?;

        Ok(JobExecution {
            id: JobId::new(),
            job_name: req.job.name.clone(),
            platform: req.job.runs_on,
            required: req.job.required,
            verdict,
            steps,
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
            duration_ms: Some(duration_ms),
        })
    }

    async fn run_step(
        &self,
        req: &JobRequest,
        step: &StepDefinition,
        phase: StepPhase,
        workspace: &Path,
        env: &mut HashMap<String, String>,
        timeout_seconds: u64,
    ) -> StepOutcome {
        let start = std::time::Instant::now();

        let exit_code = if let Some(action) = step.uses {
            let ctx = ActionContext {
                workspace: workspace.to_path_buf(),
                repo: req.repo.clone(),
                revision: req.revision.clone(),
                runtime: req.job.runtime.clone(),
            };
            match actions::run(action, &ctx).await {
                Ok(exports) => {
                    env.extend(exports);
                    Some(0)
                }
                Err(e) => {
                    error!(step = %step.name, error = %e, "Built-in action failed");
                    None
                }
            }
        } else {
            let runner = ShellRunner::new(RunnerConfig {
                timeout_seconds: Some(timeout_seconds),
            });

            if runner.can_handle(step) {
                let mut step_env = env.clone();
                step_env.extend(step.env.clone());

                let ctx = StepContext {
                    workspace: workspace.to_path_buf(),
                    env: step_env,
                    step: step.clone(),
                };

                let (tx, rx) = mpsc::channel::<OutputLine>(256);
                let forwarder = self.forward_logs(req.run_id, req.job.name.clone(), rx);

                let result = runner.execute(&ctx, tx).await;
                let _ = forwarder.await;

                match result {
                    Ok(res) => Some(res.exit_code),
                    Err(e) => {
                        error!(step = %step.name, error = %e, "Step failed to run");
                        None
                    }
                }
            } else {
                warn!(step = %step.name, "No runner can handle step");
                None
            }
        };

        StepOutcome {
            step_name: step.name.clone(),
            phase,
            exit_code,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn forward_logs(
        &self,
        run_id: RunId,
        job_name: String,
        mut rx: mpsc::Receiver<OutputLine>,
    ) -> tokio::task::JoinHandle<()> {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let event = Event::JobLog(JobLogPayload {
                    run_id,
                    job_name: job_name.clone(),
                    stream: line.stream,
                    line_number: line.line_number,
                    content: line.content,
                    timestamp: line.timestamp,
                });
                if let Err(e) = sink.publish(event).await {
                    warn!(error = %e, "Failed to publish log line");
                }
            }
        })
    }

    async fn publish_job_started(&self, req: &JobRequest, step_count: u32) -> Result<()> {
        let event = Event::JobStarted(JobStartedPayload {
            run_id: req.run_id,
            job_name: req.job.name.clone(),
            step_count,
            started_at: Utc::now(),
        });
        self.sink.publish(event).await
    }

    async fn publish_job_completed(
        &self,
        req: &JobRequest,
        verdict: JobVerdict,
        duration_ms: u64,
    ) -> Result<()> {
        let event = Event::JobCompleted(JobCompletedPayload {
            run_id: req.run_id,
            job_name: req.job.name.clone(),
            verdict,
            duration_ms,
            completed_at: Utc::now(),
        });
        self.sink.publish(event).await
    }

    async fn publish_step_started(
        &self,
        req: &JobRequest,
        step: &StepDefinition,
        phase: StepPhase,
    ) -> Result<()> {
        let event = Event::StepStarted(StepStartedPayload {
            run_id: req.run_id,
            job_name: req.job.name.clone(),
            step_name: step.name.clone(),
            phase,
            started_at: Utc::now(),
        });
        self.sink.publish(event).await
    }

    async fn publish_step_completed(&self, req: &JobRequest, outcome: &StepOutcome) -> Result<()> {
        let event = Event::StepCompleted(StepCompletedPayload {
            run_id: req.run_id,
            job_name: req.job.name.clone(),
            step_name: outcome.step_name.clone(),
            phase: outcome.phase,
            exit_code: outcome.exit_code,
            duration_ms: outcome.duration_ms,
            completed_at: Utc::now(),
        });
        self.sink.publish(event).await
    }
}
