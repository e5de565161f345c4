//! Lifecycle events emitted while a run executes.
//!
//! The triggering system observes a run exclusively through these events:
//! per-job log streams and terminal statuses, plus run-level start and
//! completion.

use crate::ids::RunId;
use crate::run::{JobVerdict, LogStream, RunVerdict, StepPhase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All events in the Gantry system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Run lifecycle
    RunStarted(RunStartedPayload),
    RunCompleted(RunCompletedPayload),

    // Job lifecycle
    JobStarted(JobStartedPayload),
    JobLog(JobLogPayload),
    JobCompleted(JobCompletedPayload),

    // Step lifecycle
    StepStarted(StepStartedPayload),
    StepCompleted(StepCompletedPayload),
}

impl Event {
    /// Returns the routing subject for this event.
    pub fn subject(&self) -> String {
        match self {
            Event::RunStarted(p) => format!("run.started.{}", p.run_id),
            Event::RunCompleted(p) => format!("run.completed.{}", p.run_id),
            Event::JobStarted(p) => format!("job.started.{}.{}", p.run_id, p.job_name),
            Event::JobLog(p) => format!("job.log.{}.{}", p.run_id, p.job_name),
            Event::JobCompleted(p) => format!("job.completed.{}.{}", p.run_id, p.job_name),
            Event::StepStarted(p) => format!("step.started.{}.{}", p.run_id, p.job_name),
            Event::StepCompleted(p) => format!("step.completed.{}.{}", p.run_id, p.job_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedPayload {
    pub run_id: RunId,
    pub workflow_name: String,
    pub job_count: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedPayload {
    pub run_id: RunId,
    pub workflow_name: String,
    pub verdict: RunVerdict,
    pub jobs_passed: u32,
    pub jobs_failed: u32,
    pub jobs_skipped: u32,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStartedPayload {
    pub run_id: RunId,
    pub job_name: String,
    pub step_count: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogPayload {
    pub run_id: RunId,
    pub job_name: String,
    pub stream: LogStream,
    pub line_number: u32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompletedPayload {
    pub run_id: RunId,
    pub job_name: String,
    pub verdict: JobVerdict,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStartedPayload {
    pub run_id: RunId,
    pub job_name: String,
    pub step_name: String,
    pub phase: StepPhase,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompletedPayload {
    pub run_id: RunId,
    pub job_name: String,
    pub step_name: String,
    pub phase: StepPhase,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}
