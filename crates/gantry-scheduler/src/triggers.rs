//! Trigger matching and evaluation.

use gantry_core::workflow::{TriggerConfig, TriggerType, WorkflowDefinition};
use std::path::{Path, PathBuf};

/// Repository event that can instantiate the job matrix. Carries the
/// identity of the revision the jobs will check out.
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    PullRequest {
        repo: PathBuf,
        head_ref: String,
        base_ref: String,
        revision: Option<String>,
        paths_changed: Vec<String>,
    },
    Push {
        repo: PathBuf,
        branch: String,
        revision: Option<String>,
        paths_changed: Vec<String>,
    },
    Manual {
        repo: PathBuf,
        revision: Option<String>,
    },
}

impl TriggerEvent {
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            TriggerEvent::PullRequest { .. } => TriggerType::PullRequest,
            TriggerEvent::Push { .. } => TriggerType::Push,
            TriggerEvent::Manual { .. } => TriggerType::Manual,
        }
    }

    pub fn repo(&self) -> &Path {
        match self {
            TriggerEvent::PullRequest { repo, .. }
            | TriggerEvent::Push { repo, .. }
            | TriggerEvent::Manual { repo, .. } => repo,
        }
    }

    pub fn revision(&self) -> Option<&str> {
        match self {
            TriggerEvent::PullRequest { revision, .. }
            | TriggerEvent::Push { revision, .. }
            | TriggerEvent::Manual { revision, .. } => revision.as_deref(),
        }
    }

    pub fn head_ref(&self) -> Option<&str> {
        match self {
            TriggerEvent::PullRequest { head_ref, .. } => Some(head_ref),
            TriggerEvent::Push { branch, .. } => Some(branch),
            TriggerEvent::Manual { .. } => None,
        }
    }
}

/// Matcher for determining if a workflow should run for an event.
pub struct TriggerMatcher;

impl TriggerMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Check if a workflow should be triggered by an event.
    pub fn matches(&self, workflow: &WorkflowDefinition, event: &TriggerEvent) -> bool {
        if workflow.triggers.is_empty() {
            // Default: trigger on pull-request activity
            return matches!(event, TriggerEvent::PullRequest { .. });
        }

        workflow
            .triggers
            .iter()
            .any(|trigger| self.trigger_matches(trigger, event))
    }

    fn trigger_matches(&self, trigger: &TriggerConfig, event: &TriggerEvent) -> bool {
        match event {
            TriggerEvent::PullRequest {
                base_ref,
                paths_changed,
                ..
            } => {
                trigger.trigger_type == TriggerType::PullRequest
                    && self.branch_matches(&trigger.branches, base_ref)
                    && self.paths_match(&trigger.paths, &trigger.paths_ignore, paths_changed)
            }
            TriggerEvent::Push {
                branch,
                paths_changed,
                ..
            } => {
                trigger.trigger_type == TriggerType::Push
                    && self.branch_matches(&trigger.branches, branch)
                    && self.paths_match(&trigger.paths, &trigger.paths_ignore, paths_changed)
            }
            TriggerEvent::Manual { .. } => trigger.trigger_type == TriggerType::Manual,
        }
    }

    fn branch_matches(&self, patterns: &[String], branch: &str) -> bool {
        if patterns.is_empty() {
            return true; // Match all branches if no patterns specified
        }
        patterns.iter().any(|p| self.glob_match(p, branch))
    }

    fn paths_match(&self, include: &[String], exclude: &[String], changed: &[String]) -> bool {
        if include.is_empty() && exclude.is_empty() {
            return true; // No path filtering
        }
        if changed.is_empty() {
            // Unknown change set: run everything rather than silently skip
            return true;
        }

        let included = if include.is_empty() {
            true
        } else {
            changed
                .iter()
                .any(|path| include.iter().any(|p| self.glob_match(p, path)))
        };

        let excluded = changed
            .iter()
            .all(|path| exclude.iter().any(|p| self.glob_match(p, path)));

        included && !excluded
    }

    fn glob_match(&self, pattern: &str, text: &str) -> bool {
        if pattern == "*" || pattern == "**" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix("/**") {
            return text.starts_with(prefix);
        }
        if let Some(prefix) = pattern.strip_suffix("/*") {
            let prefix_slash = format!("{}/", prefix);
            if text.starts_with(&prefix_slash) {
                return !text[prefix_slash.len()..].contains('/');
            }
            return false;
        }
        if pattern.contains('*') {
            let parts: Vec<&str> = pattern.split('*').collect();
            if parts.len() == 2 {
                return text.starts_with(parts[0]) && text.ends_with(parts[1]);
            }
        }
        pattern == text
    }
}

impl Default for TriggerMatcher {
    fn default() -> Self {
        Self::new()
    }
}
