//! Workflow definition types.
//!
//! These types represent the user-authored workflow YAML configuration: a
//! set of independent jobs, each bound to one runtime environment, with
//! setup steps followed by a single action step whose exit code is the
//! job's verdict.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(rename = "on", default)]
    pub triggers: Vec<TriggerConfig>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub jobs: Vec<JobDefinition>,
    #[serde(default = "default_timeout")]
    pub timeout_minutes: u32,
}

fn default_timeout() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub paths_ignore: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    PullRequest,
    Push,
    Manual,
}

/// Target operating system for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linux,
    Windows,
    Macos,
}

impl Platform {
    /// The platform this process is running on.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else {
            Platform::Linux
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Macos => "macos",
        };
        write!(f, "{}", s)
    }
}

/// Interpreter requested by a job's runtime-setup action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub version: String,
    #[serde(default = "default_arch")]
    pub arch: String,
}

fn default_arch() -> String {
    "x64".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub runs_on: Platform,
    #[serde(default)]
    pub runtime: Option<RuntimeSpec>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub setup: Vec<StepDefinition>,
    pub action: StepDefinition,
    #[serde(default)]
    pub timeout_minutes: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl JobDefinition {
    /// Effective wall-clock ceiling, falling back to the workflow's.
    pub fn timeout(&self, workflow_timeout: u32) -> u32 {
        self.timeout_minutes.unwrap_or(workflow_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    #[serde(default)]
    pub uses: Option<BuiltinAction>,
    #[serde(default)]
    pub run: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Built-in provisioning actions a step can invoke instead of a shell
/// command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinAction {
    Checkout,
    SetupRuntime,
}

impl WorkflowDefinition {
    /// Parse a workflow from YAML.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let definition: WorkflowDefinition = serde_yaml::from_str(content)?;
        Ok(definition)
    }

    /// Validate the definition, returning every problem found.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("workflow name is empty".to_string());
        }
        if self.jobs.is_empty() {
            problems.push("workflow defines no jobs".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                problems.push("job with empty name".to_string());
                continue;
            }
            if !seen.insert(job.name.as_str()) {
                problems.push(format!("duplicate job name: {}", job.name));
            }
            for step in &job.setup {
                check_step(&job.name, step, &mut problems);
            }
            check_step(&job.name, &job.action, &mut problems);
        }

        problems
    }

    /// Validate the definition, failing on the first set of problems.
    pub fn validate(&self) -> Result<()> {
        let problems = self.check();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::WorkflowValidation(problems.join("; ")))
        }
    }

    pub fn job(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|j| j.name == name)
    }
}

fn check_step(job: &str, step: &StepDefinition, problems: &mut Vec<String>) {
    if step.name.trim().is_empty() {
        problems.push(format!("job {}: step with empty name", job));
    }
    match (&step.uses, &step.run) {
        (Some(_), Some(_)) => problems.push(format!(
            "job {}: step {} sets both `uses` and `run`",
            job, step.name
        )),
        (None, None) => problems.push(format!(
            "job {}: step {} sets neither `uses` nor `run`",
            job, step.name
        )),
        (None, Some(cmd)) if cmd.trim().is_empty() => problems.push(format!(
            "job {}: step {} has an empty command",
            job, step.name
        )),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
name: checks
on:
  - type: pull_request
jobs:
  - name: lint
    runs_on: linux
    setup:
      - name: checkout
        uses: checkout
    action:
      name: run lint
      run: ./check/pylint-changed-files
"#
    }

    #[test]
    fn test_parse_minimal_workflow() {
        let wf = WorkflowDefinition::from_yaml(minimal_yaml()).unwrap();
        assert_eq!(wf.name, "checks");
        assert_eq!(wf.jobs.len(), 1);
        assert_eq!(wf.timeout_minutes, 60);
        assert!(wf.jobs[0].required);
        assert_eq!(wf.jobs[0].runs_on, Platform::Linux);
        assert_eq!(wf.jobs[0].setup.len(), 1);
        assert_eq!(wf.jobs[0].setup[0].uses, Some(BuiltinAction::Checkout));
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_duplicate_job_names_rejected() {
        let mut wf = WorkflowDefinition::from_yaml(minimal_yaml()).unwrap();
        wf.jobs.push(wf.jobs[0].clone());
        let problems = wf.check();
        assert!(problems.iter().any(|p| p.contains("duplicate job name")));
        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_step_with_both_uses_and_run_rejected() {
        let mut wf = WorkflowDefinition::from_yaml(minimal_yaml()).unwrap();
        wf.jobs[0].action.uses = Some(BuiltinAction::Checkout);
        let problems = wf.check();
        assert!(problems.iter().any(|p| p.contains("both `uses` and `run`")));
    }

    #[test]
    fn test_step_with_neither_uses_nor_run_rejected() {
        let mut wf = WorkflowDefinition::from_yaml(minimal_yaml()).unwrap();
        wf.jobs[0].action.run = None;
        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_empty_job_list_rejected() {
        let mut wf = WorkflowDefinition::from_yaml(minimal_yaml()).unwrap();
        wf.jobs.clear();
        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_job_timeout_falls_back_to_workflow() {
        let mut wf = WorkflowDefinition::from_yaml(minimal_yaml()).unwrap();
        assert_eq!(wf.jobs[0].timeout(45), 45);
        wf.jobs[0].timeout_minutes = Some(10);
        assert_eq!(wf.jobs[0].timeout(45), 10);
    }

    #[test]
    fn test_runtime_arch_defaults_to_x64() {
        let yaml = r#"
name: checks
jobs:
  - name: typecheck
    runs_on: linux
    runtime:
      version: "3.6"
    action:
      name: mypy
      run: ./check/mypy
"#;
        let wf = WorkflowDefinition::from_yaml(yaml).unwrap();
        let runtime = wf.jobs[0].runtime.as_ref().unwrap();
        assert_eq!(runtime.version, "3.6");
        assert_eq!(runtime.arch, "x64");
    }
}
