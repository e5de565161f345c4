//! Job matrix fan-out and verdict aggregation.
//!
//! Given a trigger event, every job definition becomes an independent
//! execution unit. Jobs share nothing: each gets its own workspace and its
//! own checkout, and no job observes another's state. The aggregate
//! verdict is the logical AND of the required jobs.

use crate::triggers::TriggerEvent;
use chrono::Utc;
use gantry_core::events::{Event, JobCompletedPayload, RunCompletedPayload, RunStartedPayload};
use gantry_core::ids::{JobId, RunId};
use gantry_core::ports::EventSink;
use gantry_core::run::{JobExecution, JobVerdict, Run, RunVerdict, TriggerInfo};
use gantry_core::workflow::{JobDefinition, Platform, WorkflowDefinition};
use gantry_core::{Error, Result};
use gantry_runner::{JobExecutor, JobRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Instantiates every job of a workflow for one trigger event and collects
/// the verdicts.
pub struct JobMatrix {
    runs_root: PathBuf,
    sink: Arc<dyn EventSink>,
}

impl JobMatrix {
    pub fn new(runs_root: PathBuf, sink: Arc<dyn EventSink>) -> Self {
        Self { runs_root, sink }
    }

    /// Launch the matrix. Jobs run in parallel with no ordering guarantee;
    /// a failing job does not interrupt its peers, and no job is retried.
    pub async fn launch(
        &self,
        workflow: &WorkflowDefinition,
        event: &TriggerEvent,
        job_filter: Option<&str>,
    ) -> Result<Run> {
        workflow.validate()?;

        if let Some(filter) = job_filter
            && workflow.job(filter).is_none()
        {
            return Err(Error::JobNotFound(filter.to_string()));
        }

        let run_id = RunId::new();
        let queued_at = Utc::now();
        let start = std::time::Instant::now();
        let host = Platform::current();

        let selected: Vec<JobDefinition> = workflow
            .jobs
            .iter()
            .filter(|j| job_filter.is_none_or(|f| j.name == f))
            .cloned()
            .collect();

        info!(
            run_id = %run_id,
            workflow = %workflow.name,
            jobs = selected.len(),
            "Launching job matrix"
        );

        self.sink
            .publish(Event::RunStarted(RunStartedPayload {
                run_id,
                workflow_name: workflow.name.clone(),
                job_count: selected.len() as u32,
                started_at: Utc::now(),
            }))
            .await?;
        let started_at = Utc::now();

        let mut jobs: Vec<JobExecution> = Vec::with_capacity(selected.len());
        let mut join_set = JoinSet::new();

        for job in selected {
            if job.runs_on != host {
                info!(job = %job.name, platform = %job.runs_on, "Skipping job for other platform");
                let execution = skipped_execution(&job);
                self.sink
                    .publish(Event::JobCompleted(JobCompletedPayload {
                        run_id,
                        job_name: execution.job_name.clone(),
                        verdict: JobVerdict::Skipped,
                        duration_ms: 0,
                        completed_at: Utc::now(),
                    }))
                    .await?;
                jobs.push(execution);
                continue;
            }

            let executor = JobExecutor::new(self.runs_root.clone(), self.sink.clone());
            let request = JobRequest {
                run_id,
                job,
                workflow_env: workflow.env.clone(),
                workflow_timeout: workflow.timeout_minutes,
                repo: event.repo().to_path_buf(),
                revision: event.revision().map(String::from),
            };

            join_set.spawn(async move { executor.execute(request).await });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(execution)) => jobs.push(execution),
                Ok(Err(e)) => {
                    warn!(error = %e, "Job execution aborted");
                    return Err(e);
                }
                Err(e) => return Err(Error::Internal(format!("job task panicked: {}", e))),
            }
        }

        // Completion order is nondeterministic; report in definition order.
        let order: Vec<&str> = workflow.jobs.iter().map(|j| j.name.as_str()).collect();
        jobs.sort_by_key(|j| order.iter().position(|n| *n == j.job_name));

        let verdict = RunVerdict::aggregate(&jobs);
        let duration_ms = start.elapsed().as_millis() as u64;

        self.sink
            .publish(Event::RunCompleted(RunCompletedPayload {
                run_id,
                workflow_name: workflow.name.clone(),
                verdict,
                jobs_passed: count(&jobs, JobVerdict::Success),
                jobs_failed: count(&jobs, JobVerdict::Failure),
                jobs_skipped: count(&jobs, JobVerdict::Skipped),
                duration_ms,
                completed_at: Utc::now(),
            }))
            .await?;

        Ok(Run {
            id: run_id,
            workflow_name: workflow.name.clone(),
            trigger: TriggerInfo {
                trigger_type: event.trigger_type(),
                head_ref: event.head_ref().map(String::from),
                revision: event.revision().map(String::from),
            },
            verdict,
            jobs,
            queued_at,
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
            duration_ms: Some(duration_ms),
        })
    }
}

fn skipped_execution(job: &JobDefinition) -> JobExecution {
    JobExecution {
        id: JobId::new(),
        job_name: job.name.clone(),
        platform: job.runs_on,
        required: job.required,
        verdict: JobVerdict::Skipped,
        steps: Vec::new(),
        started_at: None,
        completed_at: None,
        duration_ms: None,
    }
}

fn count(jobs: &[JobExecution], verdict: JobVerdict) -> u32 {
    jobs.iter().filter(|j| j.verdict == verdict).count() as u32
}
