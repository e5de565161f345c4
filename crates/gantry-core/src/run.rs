//! Run and execution record types.
//!
//! A `Run` is one instantiation of the job matrix for one trigger event.
//! It is built, executed, reported, and discarded; nothing persists across
//! runs.

use crate::ids::{JobId, RunId};
use crate::workflow::{Platform, TriggerType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub workflow_name: String,
    pub trigger: TriggerInfo,
    pub verdict: RunVerdict,
    pub jobs: Vec<JobExecution>,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerInfo {
    pub trigger_type: TriggerType,
    pub head_ref: Option<String>,
    pub revision: Option<String>,
}

/// Aggregate verdict of a run: the logical AND of all required jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunVerdict {
    Pending,
    Running,
    Success,
    Failure,
}

impl RunVerdict {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunVerdict::Success | RunVerdict::Failure)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunVerdict::Success)
    }

    /// Aggregate over finished job executions. Optional jobs report their
    /// verdicts but cannot fail the run.
    pub fn aggregate(jobs: &[JobExecution]) -> Self {
        let all_passing = jobs
            .iter()
            .filter(|j| j.required)
            .all(|j| j.verdict.is_passing());
        if all_passing {
            RunVerdict::Success
        } else {
            RunVerdict::Failure
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: JobId,
    pub job_name: String,
    pub platform: Platform,
    pub required: bool,
    pub verdict: JobVerdict,
    pub steps: Vec<StepOutcome>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobVerdict {
    Pending,
    Running,
    Success,
    Failure,
    Skipped,
}

impl JobVerdict {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobVerdict::Success | JobVerdict::Failure | JobVerdict::Skipped
        )
    }

    /// Skipped jobs (platform mismatch on a local host) do not count
    /// against the aggregate verdict.
    pub fn is_passing(&self) -> bool {
        matches!(self, JobVerdict::Success | JobVerdict::Skipped)
    }
}

/// Which part of the job's step sequence an outcome belongs to. Setup and
/// action failures produce the same job verdict; the phase survives for
/// log rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    Setup,
    Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_name: String,
    pub phase: StepPhase,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
    Stdout,
    Stderr,
}
