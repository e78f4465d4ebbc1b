//! The build stage: write the source, then compile it if the language needs it.

use crate::{
    fs::Workspace,
    lang::{template, TemplateVars},
    runner::{CommandRunOptions, CommandRunner, ExitStatus},
};

use super::{
    model::{BuildOutcome, Submission, COMPILE_TIMED_OUT},
    utils::describe_exit,
};

/// Placeholder values for commands running inside `ws`.
pub fn workspace_vars(ws: &Workspace) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.set_path(template::VAR_SOURCE, ws.source_file_path())
        .set_path(template::VAR_BINARY, ws.run_target())
        .set_path(template::VAR_DIR, ws.root_path());
    vars
}

/// Write `submission.source_code` into the workspace and run the compiler.
///
/// # Error Handling
///
/// `Err(_)` means the source could not be written. A compiler that fails,
/// times out, or cannot be started yields `Ok(BuildOutcome::CompileError(_))`.
pub async fn build(
    ws: &Workspace,
    submission: &Submission,
    runner: &dyn CommandRunner,
    opt: &CommandRunOptions,
) -> std::io::Result<BuildOutcome> {
    ws.write_source(&submission.source_code).await?;

    let compile_template = match &submission.language.compile_template {
        Some(t) => t,
        None => {
            tracing::debug!("No build step, running the source directly");
            return Ok(BuildOutcome::Success);
        }
    };

    let command = workspace_vars(ws).expand_all(compile_template);
    tracing::debug!(command = ?command, "Compiling");
    let output = match runner.run(&command, None, opt).await {
        Ok(o) => o,
        Err(e) => {
            tracing::info!("Compiler could not be started: {:#}", e);
            return Ok(BuildOutcome::CompileError(format!("{:#}", e)));
        }
    };

    match output.ret_code {
        ExitStatus::ReturnCode(0) => {
            tracing::debug!("Compilation finished");
            Ok(BuildOutcome::Success)
        }
        ExitStatus::Timeout => {
            tracing::warn!(timeout = ?opt.timeout, "Compilation timed out");
            Ok(BuildOutcome::CompileError(COMPILE_TIMED_OUT.into()))
        }
        status => {
            tracing::debug!(?status, "Compilation failed");
            let diagnostics = if output.stderr.trim().is_empty() {
                format!("compiler {}", describe_exit(&status))
            } else {
                output.stderr
            };
            Ok(BuildOutcome::CompileError(diagnostics))
        }
    }
}
