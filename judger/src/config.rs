use crate::{
    lang::LanguageSpec,
    question::CodingQuestion,
    runner::CommandRunOptions,
    tester::{utils::duration_from_secs, TestCase},
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Configuration of the judging engine, usually read from `judger.toml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct JudgerConfig {
    /// Parent directory of per-submission workspaces. Defaults to the OS temp
    /// directory.
    pub workspace_root: Option<PathBuf>,

    /// Wall-clock bound of a single compiler invocation, in seconds.
    pub compile_timeout_secs: f64,

    /// Per-test time limit used when a request does not carry one, in seconds.
    pub default_time_limit_secs: f64,

    /// Captured standard output beyond this many bytes is dropped.
    pub stdout_size_limit: usize,

    /// Captured standard error beyond this many bytes is dropped.
    pub stderr_size_limit: usize,

    /// Additional toolchains. An entry with a built-in id replaces it.
    pub languages: Vec<LanguageSpec>,
}

impl Default for JudgerConfig {
    fn default() -> Self {
        JudgerConfig {
            workspace_root: None,
            compile_timeout_secs: 10.0,
            default_time_limit_secs: 1.0,
            stdout_size_limit: 100 * 1024,
            stderr_size_limit: 100 * 1024,
            languages: vec![],
        }
    }
}

impl JudgerConfig {
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let cfg: JudgerConfig = toml::from_str(s).context("parsing judger config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let s = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading judger config at {}", path.display()))?;
        Self::from_toml(&s)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, secs) in [
            ("compileTimeoutSecs", self.compile_timeout_secs),
            ("defaultTimeLimitSecs", self.default_time_limit_secs),
        ] {
            if duration_from_secs(secs).is_none() {
                anyhow::bail!("{} must be a positive number, got {}", name, secs);
            }
        }
        Ok(())
    }

    /// Options of compiler invocations inside `dir`.
    ///
    /// A compile timeout that [`JudgerConfig::validate`] would reject makes
    /// every compilation time out immediately.
    pub fn compile_options(&self, dir: &Path) -> CommandRunOptions {
        let timeout = duration_from_secs(self.compile_timeout_secs).unwrap_or(Duration::ZERO);
        self.run_options(dir, timeout)
    }

    /// Options of test runs inside `dir`, bounded by `timeout`.
    pub fn run_options(&self, dir: &Path, timeout: Duration) -> CommandRunOptions {
        CommandRunOptions {
            stdout_size_limit: self.stdout_size_limit,
            stderr_size_limit: self.stderr_size_limit,
            timeout: Some(timeout),
            cwd: Some(dir.to_owned()),
        }
    }
}

/// The contents of a job file, describing one coding question and the code
/// to be judged against it.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobToml {
    pub language: String,
    /// Path of the source file, relative to the job file.
    pub source: Option<PathBuf>,
    /// Inline source code, used when `source` is absent.
    pub code: Option<String>,
    #[serde(default = "default_score")]
    pub score: u32,
    pub time_limit: Option<f64>,
    #[serde(default)]
    pub visible_test_cases: Vec<TestCase>,
    #[serde(default)]
    pub invisible_test_cases: Vec<TestCase>,
}

fn default_score() -> u32 {
    1
}

impl JobToml {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let s = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading job file at {}", path.display()))?;
        toml::from_str(&s).context("parsing job file")
    }

    /// Resolve the source code, reading `source` relative to `base_dir`.
    pub async fn source_code(&self, base_dir: &Path) -> anyhow::Result<String> {
        match (&self.source, &self.code) {
            (Some(path), _) => {
                let path = base_dir.join(path);
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading source file at {}", path.display()))
            }
            (None, Some(code)) => Ok(code.clone()),
            (None, None) => anyhow::bail!("job file has neither `source` nor `code`"),
        }
    }

    pub fn question(&self) -> CodingQuestion {
        CodingQuestion {
            score: self.score,
            time_limit_seconds: self.time_limit,
            visible_test_cases: self.visible_test_cases.clone(),
            invisible_test_cases: self.invisible_test_cases.clone(),
        }
    }
}
