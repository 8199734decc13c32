//! Orchestration for a full scaffold run.
//!
//! Steps execute in plan order. Per step: evaluate the guard (absent means
//! always run), perform the action, then checkpoint — format unless the step
//! opts out, stage everything, commit. The first failure aborts the run;
//! commits checkpointed before it remain for inspection, and the idempotent
//! mutation primitives make re-invocation the recovery path.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::core::types::{Guard, RunReport, StepOutcome, StepReport};
use crate::core::version::FrameworkVersion;
use crate::io::config::{ScaffoldConfig, load_config};
use crate::io::fetch::Fetcher;
use crate::io::git::Git;
use crate::io::manifest::locked_framework_version;
use crate::io::prompt::{Answers, Prompter};
use crate::io::tools::ToolRunner;
use crate::plan::{Step, StepContext, build_plan};

pub const CONFIG_FILE: &str = "furnish.toml";

/// Marker error recorded in the chain when a step aborts the run, so the CLI
/// can distinguish mid-run aborts from precondition failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailedError {
    pub step: String,
}

impl fmt::Display for StepFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed", self.step)
    }
}

impl std::error::Error for StepFailedError {}

/// Side-effecting collaborators, injected so tests can script them.
pub struct RunnerEnv<'a> {
    pub tools: &'a dyn ToolRunner,
    pub fetcher: &'a dyn Fetcher,
    pub prompter: &'a dyn Prompter,
}

/// Execute the whole plan against the project at `root`.
pub fn run_plan(root: &Path, env: &RunnerEnv<'_>) -> Result<RunReport> {
    let git = Git::new(root);
    if !git.is_repo()? {
        return Err(anyhow!(
            "{} is not a git repository (the runner checkpoints every step as a commit)",
            root.display()
        ));
    }

    let config = load_config(&root.join(CONFIG_FILE))?;
    let framework_version = declared_framework_version(root, &config)?;
    info!(%framework_version, "starting scaffold run");

    let mut answers = Answers::new();
    config.answers.apply(&mut answers);

    let mut steps = Vec::new();
    for step in build_plan() {
        if let Some(guard) = &step.guard {
            let wanted = evaluate_guard(guard, &mut answers, env.prompter, &framework_version)?;
            if !wanted {
                debug!(step = step.name, "guard off, skipping");
                steps.push(StepReport {
                    name: step.name.to_string(),
                    outcome: StepOutcome::Skipped,
                });
                continue;
            }
        }

        let ctx = StepContext {
            root,
            config: &config,
            framework_version: &framework_version,
            tools: env.tools,
            fetcher: env.fetcher,
            answers: &answers,
        };
        let commit = execute_step(&step, &ctx, &git).with_context(|| StepFailedError {
            step: step.name.to_string(),
        })?;
        steps.push(StepReport {
            name: step.name.to_string(),
            outcome: StepOutcome::Executed { commit },
        });
    }

    if !git.is_clean()? {
        warn!("working tree not clean after a full run; a step left unstaged changes");
    }

    Ok(RunReport {
        framework_version: framework_version.to_string(),
        steps,
    })
}

/// Run one step's action and checkpoint it. Returns the commit message when a
/// commit was actually created.
fn execute_step(step: &Step, ctx: &StepContext<'_>, git: &Git) -> Result<Option<String>> {
    info!(step = step.name, "running step");
    let effect = (step.action)(ctx)?;

    let Some(commit) = &step.commit else {
        return Ok(None);
    };

    if !commit.skip_formatting {
        ctx.run_tool(&ctx.config.tools.formatter)
            .context("auto-format before commit")?;
    }

    git.add_all()?;
    let message = effect
        .commit_message
        .clone()
        .unwrap_or_else(|| commit.message.clone());
    let committed = git.commit_staged(&message)?;
    if !committed {
        debug!(step = step.name, "nothing to commit");
        return Ok(None);
    }
    info!(step = step.name, message = %message, "checkpointed");
    Ok(Some(message))
}

fn declared_framework_version(root: &Path, config: &ScaffoldConfig) -> Result<FrameworkVersion> {
    if let Some(version) = &config.framework_version {
        return version
            .parse()
            .with_context(|| format!("framework_version override '{version}'"));
    }
    locked_framework_version(root)
}

fn evaluate_guard(
    guard: &Guard,
    answers: &mut Answers,
    prompter: &dyn Prompter,
    framework_version: &FrameworkVersion,
) -> Result<bool> {
    match guard {
        Guard::Ask(key) => answers.resolve(*key, prompter),
        Guard::AskAny(keys) => {
            // Ask every question so the action can consult each answer.
            let mut any = false;
            for key in keys {
                if answers.resolve(*key, prompter)? {
                    any = true;
                }
            }
            Ok(any)
        }
        Guard::VersionBelow(bound) => Ok(framework_version < bound),
    }
}
