use anyhow::Context;
use clap::Parser;
use contest_judger::{
    question::GradedQuestion,
    tester::{utils::diff, JudgeMode},
    Judge, JudgerConfig,
};
use itertools::Itertools;
use std::{path::Path, process::exit};
use tracing_subscriber::EnvFilter;

mod opt;

#[tokio::main]
async fn main() {
    let opt = opt::Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let res = match opt.cmd {
        opt::SubCmd::Run(cmd) => run(&opt.opt, cmd).await,
        opt::SubCmd::Languages => languages(&opt.opt).await.map(|_| true),
    };
    match res {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            tracing::error!("{:?}", e);
            exit(2);
        }
    }
}

async fn load_config(opt: &opt::GlobalOpts) -> anyhow::Result<JudgerConfig> {
    match &opt.config {
        Some(path) => JudgerConfig::load(path).await,
        None => Ok(JudgerConfig::default()),
    }
}

/// Returns whether every test case passed.
async fn run(opt: &opt::GlobalOpts, cmd: opt::RunSubCmd) -> anyhow::Result<bool> {
    let judge = Judge::new(load_config(opt).await?);

    let job = contest_judger::config::JobToml::load(&cmd.job).await?;
    let base_dir = cmd.job.parent().unwrap_or_else(|| Path::new("."));
    let code = job.source_code(base_dir).await?;
    let mode = if cmd.trial {
        JudgeMode::Trial
    } else {
        JudgeMode::Submit
    };

    let graded = judge
        .grade(&job.question(), &job.language, code, mode)
        .await
        .context("judging job")?;

    if cmd.diff {
        print_diffs(&graded);
    }
    println!("{}", serde_json::to_string_pretty(&graded)?);
    Ok(graded.passed)
}

fn print_diffs(graded: &GradedQuestion) {
    let results = graded.verdict.iter().flat_map(|v| v.results.iter());
    for (idx, res) in results.enumerate().filter(|(_, r)| !r.passed) {
        eprintln!("--- test case #{} ---", idx);
        if let Some(err) = &res.error {
            eprintln!("{}", err);
        }
        if let Some(got) = &res.produced_output {
            let (_, d) = diff(got, res.expected_output.trim());
            eprint!("{}", d);
        }
    }
}

async fn languages(opt: &opt::GlobalOpts) -> anyhow::Result<()> {
    let judge = Judge::new(load_config(opt).await?);
    for lang in judge.registry().iter() {
        let compile = lang
            .compile_template
            .as_ref()
            .map(|t| t.iter().join(" "))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {:<8} compile: {:<32} run: {}",
            lang.id,
            lang.source_file_name(),
            compile,
            lang.run_template.iter().join(" ")
        );
    }
    Ok(())
}
