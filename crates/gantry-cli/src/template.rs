//! Starter workflow written by `gantry init`.

/// A pull-request check matrix for a Python project: formatting, typing,
/// lint, doctests, unit tests on three operating systems, coverage, docs,
/// generated protocol sources, and install smoke tests.
pub const STARTER_WORKFLOW: &str = r#"name: pull-request-checks

on:
  - type: pull_request

env:
  CI: "true"

timeout_minutes: 60

jobs:
  - name: format-check
    runs_on: linux
    runtime:
      version: "3.6"
      arch: x64
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install dev tools
        run: pip install -r dev_tools/conf/pip-list-dev-tools.txt
    action:
      name: format
      run: check/format-incremental

  - name: type-check
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install dev tools
        run: pip install -r dev_tools/conf/pip-list-dev-tools.txt
    action:
      name: mypy
      run: check/mypy

  - name: lint
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install dev tools
        run: pip install -r dev_tools/conf/pip-list-dev-tools.txt
    action:
      name: pylint
      run: check/pylint-changed-files

  - name: doctest
    runs_on: linux
    runtime:
      version: "3.6"
    env:
      GIT_AUTHOR_NAME: gantry
      GIT_AUTHOR_EMAIL: gantry@localhost
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install requirements
        run: pip install -r requirements.txt
    action:
      name: doctest
      run: check/doctest -q

  - name: pytest-linux
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install requirements
        run: pip install -r requirements.txt
      - name: install test tools
        run: pip install -r dev_tools/conf/pip-list-test.txt
    action:
      name: pytest
      run: check/pytest

  - name: pytest-windows
    runs_on: windows
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install requirements
        run: pip install -r requirements.txt
      - name: install test tools
        run: pip install -r dev_tools/conf/pip-list-test.txt
    action:
      name: pytest
      run: check/pytest

  - name: pytest-macos
    runs_on: macos
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install requirements
        run: pip install -r requirements.txt
      - name: install test tools
        run: pip install -r dev_tools/conf/pip-list-test.txt
    action:
      name: pytest
      run: check/pytest

  - name: coverage
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install requirements
        run: pip install -r requirements.txt
      - name: install test tools
        run: pip install -r dev_tools/conf/pip-list-test.txt
    action:
      name: incremental coverage
      run: check/pytest-and-incremental-coverage

  - name: docs
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install docs requirements
        run: pip install -r rtd_docs/requirements.txt
    action:
      name: build docs
      run: check/build-docs

  - name: protos
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
      - name: install bazel
        run: |
          curl -fsSL -o bazel https://github.com/bazelbuild/bazel/releases/download/0.26.0/bazel-0.26.0-linux-x86_64
          chmod +x bazel
    action:
      name: build protos
      run: check/build-changed-protos

  - name: install-linux
    runs_on: linux
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
    action:
      name: pip install
      run: pip install .

  - name: install-windows
    runs_on: windows
    runtime:
      version: "3.6"
    setup:
      - name: checkout
        uses: checkout
      - name: setup python
        uses: setup_runtime
    action:
      name: pip install
      run: pip install .
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::workflow::{BuiltinAction, Platform, WorkflowDefinition};

    #[test]
    fn test_starter_workflow_parses_and_validates() {
        let wf = WorkflowDefinition::from_yaml(STARTER_WORKFLOW).unwrap();
        assert_eq!(wf.name, "pull-request-checks");
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_starter_workflow_has_twelve_jobs() {
        let wf = WorkflowDefinition::from_yaml(STARTER_WORKFLOW).unwrap();
        assert_eq!(wf.jobs.len(), 12);

        // One action step per job is structural; every job here also
        // checks out sources first.
        for job in &wf.jobs {
            assert_eq!(job.setup[0].uses, Some(BuiltinAction::Checkout), "{}", job.name);
            assert!(job.action.run.is_some(), "{}", job.name);
        }
    }

    #[test]
    fn test_starter_workflow_spans_three_platforms() {
        let wf = WorkflowDefinition::from_yaml(STARTER_WORKFLOW).unwrap();
        let on = |p: Platform| wf.jobs.iter().filter(|j| j.runs_on == p).count();
        assert_eq!(on(Platform::Linux), 9);
        assert_eq!(on(Platform::Windows), 2);
        assert_eq!(on(Platform::Macos), 1);
    }

    #[test]
    fn test_starter_workflow_requests_python_3_6_x64() {
        let wf = WorkflowDefinition::from_yaml(STARTER_WORKFLOW).unwrap();
        for job in &wf.jobs {
            let runtime = job.runtime.as_ref().expect("runtime spec");
            assert_eq!(runtime.version, "3.6");
            assert_eq!(runtime.arch, "x64");
        }
    }

    #[test]
    fn test_starter_workflow_triggers_on_pull_requests_only() {
        let wf = WorkflowDefinition::from_yaml(STARTER_WORKFLOW).unwrap();
        assert_eq!(wf.triggers.len(), 1);
        assert_eq!(
            wf.triggers[0].trigger_type,
            gantry_core::workflow::TriggerType::PullRequest
        );
    }
}
