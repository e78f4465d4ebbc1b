use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::{
    config::JudgerConfig,
    judge::Judge,
    runner::{CommandRunOptions, CommandRunner, ExitStatus, ProcessOutput},
};

impl From<i32> for ExitStatus {
    fn from(code: i32) -> Self {
        ExitStatus::ReturnCode(code as i64)
    }
}

/// A recorded invocation, with the workspace path replaced by `$dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub command: String,
    pub input: Option<String>,
    pub cwd: Option<String>,
}

#[derive(Debug, Clone)]
struct Rule {
    command: String,
    input: Option<String>,
    spawn_error: Option<String>,
    ret_code: ExitStatus,
    stdout: String,
    stderr: String,
    delay: Option<Duration>,
}

/// A [`CommandRunner`] answering from a script of rules instead of running
/// anything. Commands are matched after the working directory is replaced
/// with `$dir`, so rules look like `g++ $dir/solution.cpp -o $dir/a.out`.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Call>>,
}

pub struct RuleBuilder<'a> {
    runner: &'a mut MockRunner,
    rule: Rule,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(&mut self, command: &str) -> RuleBuilder<'_> {
        RuleBuilder {
            runner: self,
            rule: Rule {
                command: command.into(),
                input: None,
                spawn_error: None,
                ret_code: ExitStatus::ReturnCode(0),
                stdout: String::new(),
                stderr: String::new(),
                delay: None,
            },
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl<'a> RuleBuilder<'a> {
    /// Only match when the process is fed exactly `input`.
    pub fn input(mut self, input: &str) -> Self {
        self.rule.input = Some(input.into());
        self
    }

    pub fn returns(mut self, ret_code: impl Into<ExitStatus>) -> Self {
        self.rule.ret_code = ret_code.into();
        self
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        self.rule.stdout = stdout.into();
        self
    }

    pub fn stderr(mut self, stderr: &str) -> Self {
        self.rule.stderr = stderr.into();
        self
    }

    pub fn fails_to_spawn(mut self, message: &str) -> Self {
        self.rule.spawn_error = Some(message.into());
        self
    }

    /// Take this long before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.rule.delay = Some(delay);
        self
    }

    pub fn finish(self) {
        self.runner.rules.push(self.rule);
    }
}

fn strip_dir(s: &str, dir: Option<&Path>) -> String {
    match dir {
        Some(dir) => s.replace(&dir.display().to_string(), "$dir"),
        None => s.to_owned(),
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    fn name(&self) -> std::borrow::Cow<'static, str> {
        "mock".into()
    }

    async fn run(
        &self,
        command: &[String],
        input: Option<&str>,
        opt: &CommandRunOptions,
    ) -> anyhow::Result<ProcessOutput> {
        let cwd = opt.cwd.as_deref();
        let command = strip_dir(&command.join(" "), cwd);
        self.calls.lock().unwrap().push(Call {
            command: command.clone(),
            input: input.map(|s| s.to_owned()),
            cwd: cwd.map(|p| p.display().to_string()),
        });

        let rule = self
            .rules
            .iter()
            .find(|r| {
                r.command == command
                    && r.input
                        .as_deref()
                        .map_or(true, |expected| Some(expected) == input)
            })
            .unwrap_or_else(|| panic!("No rule for command `{}` with input {:?}", command, input))
            .clone();

        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = rule.spawn_error {
            anyhow::bail!("{}", e);
        }
        Ok(ProcessOutput {
            ret_code: rule.ret_code,
            command,
            stdout: rule.stdout,
            stderr: rule.stderr,
        })
    }
}

/// A judge whose workspaces live in a fresh temporary directory.
pub fn make_judge(cfg: JudgerConfig, runner: Arc<dyn CommandRunner>) -> (TempDir, Judge) {
    let root = tempfile::tempdir().expect("Failed to create workspace root");
    let cfg = JudgerConfig {
        workspace_root: Some(root.path().to_owned()),
        ..cfg
    };
    (root, Judge::with_runner(cfg, runner))
}

/// Number of entries directly inside `dir`.
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|d| d.count())
        .unwrap_or_default()
}
