//! Concrete implementation on running external processes.
//!
//! This module knows nothing about test cases or verdicts. See
//! [`crate::tester`] for the code that interprets process results.

pub mod exec;
pub mod model;

pub use exec::TokioCommandRunner;
pub use model::{CommandRunOptions, CommandRunOptionsBuilder, CommandRunner, ExitStatus, ProcessOutput};
