//! Shared deterministic types for the scaffold runner.
//!
//! These types define stable contracts between plan construction, guard
//! evaluation, and run reporting. They hold no I/O state.

use serde::Serialize;

use crate::core::version::FrameworkVersion;

/// One interactive yes/no question, asked at most once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnswerKey {
    UninstallJbuilder,
    LocalizeJapan,
    DisableActiveStorage,
    DisableActionText,
}

impl AnswerKey {
    /// Prompt text shown to the operator (without the trailing `(y/n):`).
    pub fn question(self) -> &'static str {
        match self {
            AnswerKey::UninstallJbuilder => "Would you like to uninstall jbuilder?",
            AnswerKey::LocalizeJapan => "Would you like to localize to Japan?",
            AnswerKey::DisableActiveStorage => "Would you like to disable active_storage?",
            AnswerKey::DisableActionText => "Would you like to disable action_text?",
        }
    }

    /// Key used for seeding from the `[answers]` config table.
    pub fn config_key(self) -> &'static str {
        match self {
            AnswerKey::UninstallJbuilder => "uninstall_jbuilder",
            AnswerKey::LocalizeJapan => "localize_japan",
            AnswerKey::DisableActiveStorage => "disable_active_storage",
            AnswerKey::DisableActionText => "disable_action_text",
        }
    }
}

/// Predicate gating a step, evaluated lazily in step order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Run the step when the answer is yes.
    Ask(AnswerKey),
    /// Run the step when any of the answers is yes. Every question is still
    /// asked, in order, so the action can consult the individual answers.
    AskAny(Vec<AnswerKey>),
    /// Run the step when the declared framework version is below the bound.
    VersionBelow(FrameworkVersion),
}

impl Guard {
    /// Short human-readable description for `furnish plan` output.
    pub fn describe(&self) -> String {
        match self {
            Guard::Ask(key) => format!("ask {}", key.config_key()),
            Guard::AskAny(keys) => {
                let keys = keys
                    .iter()
                    .map(|k| k.config_key())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("ask any of {keys}")
            }
            Guard::VersionBelow(bound) => format!("framework version < {bound}"),
        }
    }
}

/// Commit checkpoint requested by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Default commit message; an action may override it.
    pub message: String,
    /// Skip the auto-format pass before staging (used by steps that run
    /// before the formatter is configured, and by the formatter setup
    /// commits themselves).
    pub skip_formatting: bool,
}

impl Commit {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            skip_formatting: false,
        }
    }

    pub fn without_formatting(message: &str) -> Self {
        Self {
            message: message.to_string(),
            skip_formatting: true,
        }
    }
}

/// Side data an action hands back to the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionEffect {
    /// Replaces the step's static commit message (e.g. the railtie step
    /// names the engines it disabled).
    pub commit_message: Option<String>,
}

/// What happened to one step during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum StepOutcome {
    /// Action ran; `commit` is the created commit's message, or `None` when
    /// the step requested no checkpoint or nothing was staged.
    Executed { commit: Option<String> },
    /// Guard evaluated false; no side effect, no commit.
    Skipped,
}

/// Per-step entry in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Summary of a full `furnish run`, printed at the end (optionally as JSON).
///
/// Steps are recorded in execution order; skipped steps appear here and in
/// debug logs only, never as commits or on-disk artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub framework_version: String,
    pub steps: Vec<StepReport>,
}
