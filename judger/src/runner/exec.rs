//! Running commands as local child processes.

use std::{fmt::Write, process::Stdio, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use bytes::BytesMut;
use itertools::Itertools;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
    task::JoinHandle,
};

use super::model::{CommandRunOptions, CommandRunner, ExitStatus, ProcessOutput};

/// How long to wait for pipes to drain after the process itself is gone.
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runs commands directly on the host with tokio's process API.
///
/// Every command gets a process group of its own, so that a timeout kills
/// everything the program spawned and not only the direct child.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    fn name(&self) -> std::borrow::Cow<'static, str> {
        "local".into()
    }

    async fn run(
        &self,
        command: &[String],
        input: Option<&str>,
        opt: &CommandRunOptions,
    ) -> anyhow::Result<ProcessOutput> {
        let cmd_str = command.iter().join(" ");
        let (program, args) = command.split_first().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Command must contain at least one string",
            )
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &opt.cwd {
            cmd.current_dir(cwd);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", program))?;
        let pgid = child.id();

        let stdin_task = match (child.stdin.take(), input) {
            (Some(mut pipe), Some(input)) => {
                let input = input.to_owned();
                Some(tokio::spawn(async move {
                    // The program is free to exit without reading its input.
                    let _ = pipe.write_all(input.as_bytes()).await;
                    let _ = pipe.shutdown().await;
                }))
            }
            _ => None,
        };
        let stdout_task = tokio::spawn(read_capped(child.stdout.take(), opt.stdout_size_limit));
        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), opt.stderr_size_limit));

        let ret_code: ExitStatus = match opt.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status?.into(),
                Err(_) => {
                    tracing::debug!(command = %cmd_str, ?timeout, "Deadline reached, killing");
                    kill_group(pgid);
                    reap(&mut child).await;
                    ExitStatus::Timeout
                }
            },
            None => child.wait().await?.into(),
        };
        // Leftover background processes would otherwise keep the pipes open.
        kill_group(pgid);

        if let Some(task) = stdin_task {
            let _ = join_with_grace(task).await;
        }
        let stdout = join_with_grace(stdout_task).await?;
        let stderr = join_with_grace(stderr_task).await?;

        Ok(ProcessOutput {
            ret_code,
            command: cmd_str,
            stdout: stdout.into_string(),
            stderr: stderr.into_string(),
        })
    }
}

async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to kill timed out process: {}", e);
        let _ = child.wait().await;
    }
}

#[cfg(unix)]
fn kill_group(pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        // SAFETY: plain syscall; a negative pid addresses the whole group.
        // ESRCH (group already gone) is expected and ignored.
        unsafe {
            libc::kill(-(pgid as libc::pid_t), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: Option<u32>) {}

/// Wait for a pipe task, giving up after [`PIPE_DRAIN_GRACE`].
async fn join_with_grace<T: Default>(mut task: JoinHandle<T>) -> anyhow::Result<T> {
    match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut task).await {
        Ok(res) => Ok(res?),
        Err(_) => {
            tracing::warn!("Pipe still open after process exit, abandoning it");
            task.abort();
            Ok(T::default())
        }
    }
}

async fn read_capped<R>(reader: Option<R>, size_limit: usize) -> SizeConstraintBytesMut
where
    R: AsyncRead + Unpin,
{
    let mut buf = SizeConstraintBytesMut::new(size_limit);
    if let Some(mut reader) = reader {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buf.append(&chunk[..n]),
                Err(e) => {
                    tracing::debug!("Pipe read failed: {}", e);
                    break;
                }
            }
        }
    }
    buf
}

/// A byte buffer that silently drops everything past `size_limit`.
///
/// The pipe keeps being drained after the limit is hit, so a chatty program
/// never blocks on a full pipe.
#[derive(Debug, Default)]
pub struct SizeConstraintBytesMut {
    size_limit: usize,
    bytes: BytesMut,
    truncated: bool,
}

impl SizeConstraintBytesMut {
    pub fn new(size_limit: usize) -> Self {
        SizeConstraintBytesMut {
            size_limit,
            bytes: BytesMut::new(),
            truncated: false,
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        let room = self.size_limit.saturating_sub(self.bytes.len());
        if bytes.len() > room {
            self.bytes.extend_from_slice(&bytes[..room]);
            self.truncated = true;
        } else {
            self.bytes.extend_from_slice(bytes);
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        let mut s = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            let _ = writeln!(s);
            let _ = writeln!(
                s,
                "--- output buffer capped out at {} bytes ---",
                self.size_limit
            );
        }
        s
    }
}
