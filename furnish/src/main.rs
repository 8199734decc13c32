//! Scaffold runner CLI.
//!
//! `furnish run` executes the customization plan against a freshly generated
//! Rails application; `furnish plan` prints the plan without side effects.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use furnish::core::types::{RunReport, StepOutcome};
use furnish::io::config::load_config;
use furnish::io::fetch::HttpFetcher;
use furnish::io::prompt::StdinPrompter;
use furnish::io::tools::SystemToolRunner;
use furnish::plan::describe_plan;
use furnish::run::{CONFIG_FILE, RunnerEnv, StepFailedError, run_plan};
use furnish::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "furnish",
    version,
    about = "Customize a freshly generated Rails application, one commit per step"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute the customization plan (prompting for the optional steps).
    Run {
        /// Project root (the directory the generator created).
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Print the run report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the ordered step list without touching the project.
    Plan {
        /// Print the plan as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        let code = if err.downcast_ref::<StepFailedError>().is_some() {
            exit_codes::ABORTED
        } else {
            exit_codes::INVALID
        };
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { root, json } => cmd_run(&root, json),
        Command::Plan { json } => cmd_plan(json),
    }
}

fn cmd_run(root: &PathBuf, json: bool) -> Result<()> {
    // The fetcher needs its timeout before run_plan re-reads the config for
    // everything else.
    let config = load_config(&root.join(CONFIG_FILE))?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs));
    let env = RunnerEnv {
        tools: &SystemToolRunner,
        fetcher: &fetcher,
        prompter: &StdinPrompter,
    };

    let report = run_plan(root, &env)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_plan(json: bool) -> Result<()> {
    let entries = describe_plan();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        let mut line = format!("{:2}. {}", i + 1, entry.name);
        if let Some(guard) = &entry.guard {
            line.push_str(&format!("  [{guard}]"));
        }
        if let Some(commit) = &entry.commit {
            line.push_str(&format!("  -> \"{commit}\""));
        }
        println!("{line}");
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("framework version: {}", report.framework_version);
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Executed {
                commit: Some(message),
            } => println!("ran {} -> \"{message}\"", step.name),
            StepOutcome::Executed { commit: None } => println!("ran {} (no commit)", step.name),
            StepOutcome::Skipped => println!("skipped {}", step.name),
        }
    }
}
