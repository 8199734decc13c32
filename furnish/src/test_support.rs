//! Test-only helpers: a seeded Rails-skeleton repository and scripted
//! doubles for the runner's side-effecting collaborators.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

use crate::core::types::AnswerKey;
use crate::io::fetch::Fetcher;
use crate::io::prompt::Prompter;
use crate::io::tools::{ToolInvocation, ToolRun, ToolRunner};

pub const GEMFILE_SEED: &str = concat!(
    "source \"https://rubygems.org\"\n",
    "\n",
    "gem \"rails\", \"~> 6.1.4\"\n",
    "gem \"puma\", \"~> 5.0\"\n",
    "gem \"jbuilder\", \"~> 2.7\"\n",
);

pub const APPLICATION_RB_SEED: &str = concat!(
    "require_relative \"boot\"\n",
    "\n",
    "require \"rails/all\"\n",
    "\n",
    "module SampleApp\n",
    "  class Application < Rails::Application\n",
    "    config.load_defaults 6.1\n",
    "  end\n",
    "end\n",
);

/// A temporary git repository seeded like a fresh `rails new` output, before
/// any commit exists.
pub struct TestRepo {
    temp: tempfile::TempDir,
}

impl TestRepo {
    /// Skeleton pinned to framework version 6.1.4.
    pub fn new() -> Result<Self> {
        Self::with_framework_version("6.1.4")
    }

    pub fn with_framework_version(version: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let repo = Self { temp };
        repo.git(&["init"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "user.name", "test"])?;

        repo.seed("Gemfile", GEMFILE_SEED)?;
        repo.seed("Gemfile.lock", &lockfile_for(version))?;
        repo.seed(".gitignore", "log/\ntmp/\n")?;
        repo.seed("config/application.rb", APPLICATION_RB_SEED)?;
        repo.seed("test/test_helper.rb", "require \"minitest/autorun\"\n")?;
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        fs::read_to_string(self.root().join(rel)).with_context(|| format!("read {rel}"))
    }

    fn seed(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create dir for {rel}"))?;
        }
        fs::write(&path, contents).with_context(|| format!("seed {rel}"))
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !status.success() {
            return Err(anyhow!("git {} failed", args.join(" ")));
        }
        Ok(())
    }
}

fn lockfile_for(version: &str) -> String {
    format!(
        concat!(
            "GEM\n",
            "  remote: https://rubygems.org/\n",
            "  specs:\n",
            "    actionpack ({version})\n",
            "    rails ({version})\n",
            "      actionpack (= {version})\n",
            "    puma (5.6.2)\n",
            "\n",
            "PLATFORMS\n",
            "  ruby\n",
        ),
        version = version
    )
}

/// Prompter answering from a fixed table, erroring on unexpected questions.
pub struct ScriptedPrompter {
    answers: BTreeMap<AnswerKey, bool>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[(AnswerKey, bool)]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
        }
    }

    /// Answer every question with the same value.
    pub fn always(value: bool) -> Self {
        Self::new(&[
            (AnswerKey::UninstallJbuilder, value),
            (AnswerKey::LocalizeJapan, value),
            (AnswerKey::DisableActiveStorage, value),
            (AnswerKey::DisableActionText, value),
        ])
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        let key = self
            .answers
            .keys()
            .find(|key| key.question() == question)
            .ok_or_else(|| anyhow!("unexpected question: {question}"))?;
        Ok(self.answers[key])
    }
}

/// Tool runner that records invocations instead of spawning processes.
///
/// Succeeds by default; `failing_on` makes any invocation whose rendered
/// command contains the pattern return a non-zero exit.
pub struct ScriptedToolRunner {
    invocations: RefCell<Vec<Vec<String>>>,
    fail_when_contains: Option<String>,
}

impl ScriptedToolRunner {
    pub fn new() -> Self {
        Self {
            invocations: RefCell::new(Vec::new()),
            fail_when_contains: None,
        }
    }

    pub fn failing_on(pattern: &str) -> Self {
        Self {
            invocations: RefCell::new(Vec::new()),
            fail_when_contains: Some(pattern.to_string()),
        }
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.borrow().clone()
    }
}

impl Default for ScriptedToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRunner for ScriptedToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun> {
        self.invocations.borrow_mut().push(invocation.argv.clone());
        let command = invocation.display();
        if let Some(pattern) = &self.fail_when_contains {
            if command.contains(pattern) {
                return Ok(ToolRun {
                    exit_code: Some(1),
                    stderr_tail: format!("scripted failure for '{command}'"),
                    timed_out: false,
                });
            }
        }
        Ok(ToolRun {
            exit_code: Some(0),
            stderr_tail: String::new(),
            timed_out: false,
        })
    }
}

pub const BASELINE_BODY: &str = concat!(
    "Layout/Tab:\n",
    "  Enabled: true\n",
    "\n",
    "Layout/EndOfLine:\n",
    "  EnforcedStyle: lf\n",
);

pub const LOCALE_BODY: &str = "ja:\n  date:\n    abbr_day_names:\n    - \"\u{65e5}\"\n";

/// Fetcher serving canned bodies for the two remote baselines.
pub struct ScriptedFetcher;

impl Fetcher for ScriptedFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        if url.contains(".rubocop") {
            return Ok(BASELINE_BODY.to_string());
        }
        if url.ends_with("ja.yml") {
            return Ok(LOCALE_BODY.to_string());
        }
        Err(anyhow!("HTTP 404 fetching {url}"))
    }
}
