use async_trait::async_trait;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// The result returned by running a subprocess.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ProcessOutput {
    pub ret_code: ExitStatus,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum ExitStatus {
    ReturnCode(i64),
    Signal(u32),
    /// The process ran past its deadline and was killed.
    Timeout,
    Unknown,
}

impl From<std::process::ExitStatus> for ExitStatus {
    #[cfg(unix)]
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;
        match (status.code(), status.signal()) {
            (Some(x), _) => ExitStatus::ReturnCode(x as i64),
            (None, Some(x)) => ExitStatus::Signal(x as u32),
            _ => ExitStatus::Unknown,
        }
    }

    #[cfg(not(unix))]
    fn from(status: std::process::ExitStatus) -> Self {
        status
            .code()
            .map_or(ExitStatus::Unknown, |x| ExitStatus::ReturnCode(x as i64))
    }
}

/// Something that can run a command line to completion.
#[async_trait]
pub trait CommandRunner: Sync + Send {
    /// The name of this runner, used in logs
    fn name(&self) -> std::borrow::Cow<'static, str>;

    /// Run `command` (program followed by its arguments), feeding `input` to
    /// its standard input.
    ///
    /// Returns `Err(_)` only when the process could not be started or
    /// supervised. Timeouts and abnormal exits are reported through
    /// [`ProcessOutput::ret_code`].
    async fn run(
        &self,
        command: &[String],
        input: Option<&str>,
        opt: &CommandRunOptions,
    ) -> anyhow::Result<ProcessOutput>;
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct CommandRunOptions {
    #[builder(default = "100*1024")]
    pub stdout_size_limit: usize,

    #[builder(default = "100*1024")]
    pub stderr_size_limit: usize,

    /// Wall-clock bound. The whole process group is killed when it expires.
    #[builder(default)]
    pub timeout: Option<Duration>,

    /// Working directory of the process.
    #[builder(default)]
    pub cwd: Option<PathBuf>,
}

impl Default for CommandRunOptions {
    fn default() -> Self {
        CommandRunOptions {
            stdout_size_limit: 100 * 1024,
            stderr_size_limit: 100 * 1024,
            timeout: None,
            cwd: None,
        }
    }
}
