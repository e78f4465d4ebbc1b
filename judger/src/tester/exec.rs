//! The execution stage: one fresh process per test case.

use crate::{
    fs::Workspace,
    runner::{CommandRunOptions, CommandRunner, ExitStatus, ProcessOutput},
};

use super::{
    build::workspace_vars,
    model::{JudgeMode, TestCase, TestFailure, TestResult},
    utils::{describe_exit, normalize_output},
};

/// Runs a compiled or interpreted program against test cases.
pub struct ExecStage<'a> {
    runner: &'a dyn CommandRunner,
    /// Options of every test run. `timeout` is the per-test limit.
    opt: &'a CommandRunOptions,
    mode: JudgeMode,
}

impl<'a> ExecStage<'a> {
    pub fn new(runner: &'a dyn CommandRunner, opt: &'a CommandRunOptions, mode: JudgeMode) -> Self {
        ExecStage { runner, opt, mode }
    }

    /// Run every case in order. A failing case never stops the loop, and the
    /// next case only starts after the previous process is gone.
    pub async fn run_all(
        &self,
        ws: &Workspace,
        run_template: &[String],
        cases: &[TestCase],
    ) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(cases.len());
        for (idx, case) in cases.iter().enumerate() {
            tracing::debug!(case = idx, "Running test case");
            let res = self.run_one(ws, run_template, case).await;
            tracing::debug!(case = idx, passed = res.passed, error = ?res.error, "Test case finished");
            results.push(res);
        }
        results
    }

    pub async fn run_one(
        &self,
        ws: &Workspace,
        run_template: &[String],
        case: &TestCase,
    ) -> TestResult {
        let command = workspace_vars(ws).expand_all(run_template);
        match self.runner.run(&command, Some(&case.input), self.opt).await {
            Ok(output) => self.judge_output(case, output),
            Err(e) => {
                tracing::info!("Failed to run test case: {:#}", e);
                TestResult::failed(case, None, TestFailure::SpawnFailed(format!("{:#}", e)))
            }
        }
    }

    fn judge_output(&self, case: &TestCase, output: ProcessOutput) -> TestResult {
        let produced = normalize_output(&output.stdout).to_owned();
        let stderr = match self.mode {
            JudgeMode::Trial => Some(normalize_output(&output.stderr)).filter(|s| !s.is_empty()),
            JudgeMode::Submit => None,
        };
        let mut res = match output.ret_code {
            // The exit code of a program that exited on its own is not judged.
            ExitStatus::ReturnCode(code) => {
                if code != 0 {
                    tracing::debug!(code, "Program exited with non-zero code");
                }
                let passed = produced == normalize_output(&case.expected_output);
                TestResult {
                    input: case.input.clone(),
                    produced_output: Some(produced),
                    expected_output: case.expected_output.clone(),
                    passed,
                    error: None,
                }
            }
            ExitStatus::Timeout => {
                tracing::info!(timeout = ?self.opt.timeout, "Time limit exceeded");
                TestResult::failed(case, None, TestFailure::TimeLimitExceeded)
            }
            status => TestResult::failed(
                case,
                Some(produced),
                TestFailure::RuntimeError(describe_exit(&status)),
            ),
        };
        if let Some(stderr) = stderr {
            res.error = Some(match res.error.take() {
                Some(failure) => format!("{}\n{}", failure, stderr),
                None => stderr.to_owned(),
            });
        }
        res
    }
}
