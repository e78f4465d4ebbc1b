//! The judging pipeline.
//!
//! Registry lookup → workspace creation → build → execution → aggregation →
//! workspace teardown. Every judging run is independent; the only state
//! shared between runs is the read-only language registry.

mod err;

pub use err::JudgeError;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_futures::Instrument;

use crate::{
    config::JudgerConfig,
    fs::{Workspace, WorkspaceManager},
    lang::LanguageRegistry,
    question::{CodingQuestion, GradedQuestion},
    runner::{CommandRunner, TokioCommandRunner},
    tester::{self, aggregate, BuildOutcome, ExecStage, JudgeMode, Submission, TestCase, Verdict},
};

/// A judging request as delivered by the request-handling layer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmissionRequest {
    pub language: String,
    #[serde(alias = "code")]
    pub source_code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Per-test time limit. The configured default applies when absent.
    #[serde(default, alias = "time_limit")]
    pub time_limit_seconds: Option<f64>,
    #[serde(default)]
    pub mode: JudgeMode,
}

/// The judging engine. Cheap to clone, and safe to share between tasks.
#[derive(Clone)]
pub struct Judge {
    cfg: Arc<JudgerConfig>,
    registry: Arc<LanguageRegistry>,
    workspaces: WorkspaceManager,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Judge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Judge")
            .field("cfg", &self.cfg)
            .field("registry", &self.registry)
            .field("workspaces", &self.workspaces)
            .field("runner", &self.runner.name())
            .finish()
    }
}

impl Judge {
    /// A judge that runs programs as local child processes.
    pub fn new(cfg: JudgerConfig) -> Self {
        Self::with_runner(cfg, Arc::new(TokioCommandRunner))
    }

    pub fn with_runner(cfg: JudgerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let registry = LanguageRegistry::with_builtins(cfg.languages.iter().cloned());
        let workspaces = WorkspaceManager::new(cfg.workspace_root.clone());
        Judge {
            cfg: Arc::new(cfg),
            registry: Arc::new(registry),
            workspaces,
            runner,
        }
    }

    pub fn config(&self) -> &JudgerConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Judge one request.
    ///
    /// # Error Handling
    ///
    /// Unsupported languages and invalid time limits are rejected before any
    /// filesystem or process work happens. A compile failure is *not* an
    /// `Err`: it comes back as [`Verdict::compile_error`] with no results. Use
    /// [`Verdict::into_result`] to turn it into a [`JudgeError::Compile`].
    pub async fn judge(&self, req: SubmissionRequest) -> Result<Verdict, JudgeError> {
        let language = self.registry.resolve(&req.language)?;
        tracing::debug!(language = %language.id, "Language resolved");

        let time_limit = req
            .time_limit_seconds
            .unwrap_or(self.cfg.default_time_limit_secs);
        let submission = Submission::new(language, req.source_code, req.test_cases, time_limit)
            .map_err(JudgeError::InvalidSubmission)?;

        self.judge_submission(&submission, req.mode).await
    }

    /// Judge an already validated submission.
    pub async fn judge_submission(
        &self,
        submission: &Submission,
        mode: JudgeMode,
    ) -> Result<Verdict, JudgeError> {
        if submission.test_cases.is_empty() {
            tracing::info!("Submission has no test cases");
            return Ok(aggregate(vec![]));
        }

        let span = tracing::info_span!(
            "judge",
            language = %submission.language.id,
            cases = submission.test_cases.len(),
            ?mode
        );
        async move {
            let ws = self.workspaces.acquire(&submission.language).await?;
            tracing::info!(path = %ws.root_path().display(), "Workspace acquired");

            let res = self.judge_in(&ws, submission, mode).await;

            let path = ws.root_path().to_owned();
            if let Err(e) = ws.release() {
                tracing::error!("Failed to remove workspace {}: {}", path.display(), e);
            }

            let verdict = res?;
            tracing::info!(
                all_passed = verdict.all_passed,
                passed = verdict.passed_count(),
                compile_error = verdict.compile_error.is_some(),
                "Judging finished"
            );
            Ok::<_, JudgeError>(verdict)
        }
        .instrument(span)
        .await
    }

    async fn judge_in(
        &self,
        ws: &Workspace,
        submission: &Submission,
        mode: JudgeMode,
    ) -> Result<Verdict, JudgeError> {
        let compile_opt = self.cfg.compile_options(ws.root_path());
        match tester::build(ws, submission, &*self.runner, &compile_opt).await? {
            BuildOutcome::Success => {}
            BuildOutcome::CompileError(diagnostics) => {
                tracing::info!("Compilation failed, skipping all test cases");
                return Ok(Verdict::compile_failed(diagnostics));
            }
        }

        let run_opt = self
            .cfg
            .run_options(ws.root_path(), submission.per_test_timeout);
        let results = ExecStage::new(&*self.runner, &run_opt, mode)
            .run_all(ws, &submission.language.run_template, &submission.test_cases)
            .await;
        Ok(aggregate(results))
    }

    /// Grade `code` against a coding question: the full score iff every
    /// visible and invisible test case passes.
    pub async fn grade(
        &self,
        question: &CodingQuestion,
        language: &str,
        code: String,
        mode: JudgeMode,
    ) -> Result<GradedQuestion, JudgeError> {
        let test_cases = question.all_test_cases();
        if test_cases.is_empty() {
            return Ok(GradedQuestion::no_test_cases());
        }
        let verdict = self
            .judge(SubmissionRequest {
                language: language.to_owned(),
                source_code: code,
                test_cases,
                time_limit_seconds: question.time_limit_seconds,
                mode,
            })
            .await?;
        Ok(GradedQuestion::from_verdict(question, verdict))
    }
}

impl Verdict {
    /// Report a compile failure as the single submission-level error.
    pub fn into_result(self) -> Result<Verdict, JudgeError> {
        match self.compile_error {
            Some(diagnostics) => Err(JudgeError::Compile(diagnostics)),
            None => Ok(self),
        }
    }
}
