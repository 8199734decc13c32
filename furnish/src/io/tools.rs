//! External tool invocation.
//!
//! The [`ToolRunner`] trait decouples step actions from the actual child
//! processes (bundler, the Rails generator, the formatter). Tests use
//! scripted runners that record invocations without spawning anything.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::io::process::run_command_with_timeout;

/// One external command to run inside the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub argv: Vec<String>,
    pub workdir: PathBuf,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl ToolInvocation {
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
    pub timed_out: bool,
}

impl ToolRun {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Abstraction over external tool execution.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun>;
}

/// Runner that spawns real child processes.
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun> {
        let program = invocation
            .argv
            .first()
            .ok_or_else(|| anyhow!("empty tool argv"))?;
        info!(command = %invocation.display(), "running tool");

        let mut cmd = Command::new(program);
        cmd.args(&invocation.argv[1..])
            .current_dir(&invocation.workdir);

        let output =
            run_command_with_timeout(cmd, invocation.timeout, invocation.output_limit_bytes)?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let run = ToolRun {
            exit_code: output.status.code(),
            stderr_tail: tail(&stderr, 2_000),
            timed_out: output.timed_out,
        };
        debug!(exit_code = ?run.exit_code, timed_out = run.timed_out, "tool finished");
        Ok(run)
    }
}

/// Run an invocation and turn any unsuccessful outcome into a fatal error.
pub fn run_tool_checked(runner: &dyn ToolRunner, invocation: &ToolInvocation) -> Result<()> {
    let run = runner.run(invocation)?;
    if run.timed_out {
        warn!(command = %invocation.display(), "tool timed out");
        return Err(anyhow!(
            "{} timed out after {:?}",
            invocation.display(),
            invocation.timeout
        ));
    }
    if !run.success() {
        warn!(command = %invocation.display(), exit_code = ?run.exit_code, "tool failed");
        return Err(anyhow!(
            "{} failed with status {:?}: {}",
            invocation.display(),
            run.exit_code,
            run.stderr_tail.trim()
        ));
    }
    Ok(())
}

fn tail(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut start = s.len() - limit;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}
