use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(version, about = "Judge contest submissions locally")]
pub struct Opts {
    #[clap(subcommand)]
    pub cmd: SubCmd,

    #[clap(flatten)]
    pub opt: GlobalOpts,
}

#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Judger configuration file. Built-in defaults are used when absent.
    #[clap(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCmd {
    /// Judge a single job file and print the graded result as JSON
    #[clap(name = "run")]
    Run(RunSubCmd),

    /// List every language the judger can build and run
    #[clap(name = "languages")]
    Languages,
}

#[derive(Parser, Debug, Clone)]
pub struct RunSubCmd {
    /// The job file, describing the question, its test cases and the code.
    #[clap(name = "job-path")]
    pub job: PathBuf,

    /// Report standard error of every test run, like a preview run would.
    #[clap(long)]
    pub trial: bool,

    /// Print a line diff for every failed test case to stderr.
    #[clap(long)]
    pub diff: bool,
}
