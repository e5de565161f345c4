//! Serialization roundtrip tests for gantry-core types.

use chrono::Utc;
use gantry_core::events::*;
use gantry_core::ids::*;
use gantry_core::run::*;
use gantry_core::workflow::*;
use pretty_assertions::assert_eq;

#[test]
fn test_run_started_payload_roundtrip() {
    let payload = RunStartedPayload {
        run_id: RunId::new(),
        workflow_name: "pull-request-checks".to_string(),
        job_count: 12,
        started_at: Utc::now(),
    };

    let json = serde_json::to_string(&payload).expect("serialize");
    let parsed: RunStartedPayload = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(payload.run_id, parsed.run_id);
    assert_eq!(payload.workflow_name, parsed.workflow_name);
    assert_eq!(payload.job_count, parsed.job_count);
}

#[test]
fn test_run_completed_payload_roundtrip() {
    let payload = RunCompletedPayload {
        run_id: RunId::new(),
        workflow_name: "pull-request-checks".to_string(),
        verdict: RunVerdict::Success,
        jobs_passed: 10,
        jobs_failed: 0,
        jobs_skipped: 2,
        duration_ms: 84000,
        completed_at: Utc::now(),
    };

    let json = serde_json::to_string(&payload).expect("serialize");
    let parsed: RunCompletedPayload = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(payload.verdict, parsed.verdict);
    assert_eq!(payload.jobs_skipped, parsed.jobs_skipped);
}

#[test]
fn test_job_log_payload_roundtrip() {
    let payload = JobLogPayload {
        run_id: RunId::new(),
        job_name: "mypy".to_string(),
        stream: LogStream::Stderr,
        line_number: 7,
        content: "error: incompatible types".to_string(),
        timestamp: Utc::now(),
    };

    let json = serde_json::to_string(&payload).expect("serialize");
    let parsed: JobLogPayload = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(payload.stream, parsed.stream);
    assert_eq!(payload.content, parsed.content);
}

#[test]
fn test_step_completed_payload_roundtrip() {
    let payload = StepCompletedPayload {
        run_id: RunId::new(),
        job_name: "doctest".to_string(),
        step_name: "run doctests".to_string(),
        phase: StepPhase::Action,
        exit_code: Some(0),
        duration_ms: 5000,
        completed_at: Utc::now(),
    };

    let json = serde_json::to_string(&payload).expect("serialize");
    let parsed: StepCompletedPayload = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(payload.step_name, parsed.step_name);
    assert_eq!(payload.exit_code, parsed.exit_code);
}

#[test]
fn test_event_tag_is_snake_case() {
    let event = Event::JobStarted(JobStartedPayload {
        run_id: RunId::new(),
        job_name: "lint".to_string(),
        step_count: 3,
        started_at: Utc::now(),
    });

    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["type"], "job_started");
}

#[test]
fn test_workflow_yaml_roundtrip() {
    let yaml = r#"
name: pull-request-checks
on:
  - type: pull_request
    branches: ["main"]
env:
  CI: "true"
jobs:
  - name: pytest-windows
    runs_on: windows
    runtime:
      version: "3.6"
      arch: x64
    setup:
      - name: checkout
        uses: checkout
      - name: install requirements
        run: pip install -r requirements.txt
    action:
      name: run tests
      run: pytest src
"#;

    let wf = WorkflowDefinition::from_yaml(yaml).expect("parse");
    assert_eq!(wf.triggers[0].trigger_type, TriggerType::PullRequest);
    assert_eq!(wf.jobs[0].runs_on, Platform::Windows);

    let reserialized = serde_yaml::to_string(&wf).expect("serialize");
    let reparsed = WorkflowDefinition::from_yaml(&reserialized).expect("reparse");
    assert_eq!(reparsed.jobs[0].name, "pytest-windows");
    assert_eq!(reparsed.jobs[0].setup.len(), 2);
}

#[test]
fn test_run_record_roundtrip() {
    let run = Run {
        id: RunId::new(),
        workflow_name: "pull-request-checks".to_string(),
        trigger: TriggerInfo {
            trigger_type: TriggerType::PullRequest,
            head_ref: Some("feature/decompose".to_string()),
            revision: Some("abc123".to_string()),
        },
        verdict: RunVerdict::Failure,
        jobs: vec![JobExecution {
            id: JobId::new(),
            job_name: "pylint".to_string(),
            platform: Platform::Linux,
            required: true,
            verdict: JobVerdict::Failure,
            steps: vec![StepOutcome {
                step_name: "run pylint".to_string(),
                phase: StepPhase::Action,
                exit_code: Some(2),
                duration_ms: 900,
            }],
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
            duration_ms: Some(900),
        }],
        queued_at: Utc::now(),
        started_at: Some(Utc::now()),
        completed_at: Some(Utc::now()),
        duration_ms: Some(1000),
    };

    let json = serde_json::to_string(&run).expect("serialize");
    let parsed: Run = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(parsed.verdict, RunVerdict::Failure);
    assert_eq!(parsed.jobs[0].steps[0].exit_code, Some(2));
}
