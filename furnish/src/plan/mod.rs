//! The scaffold plan: a declarative, ordered list of steps.
//!
//! Every conditional lives in a step's guard or inside its action; the list
//! itself is fixed at authoring time. Ordering is significant: dependency
//! installs precede code generation, formatter setup precedes the first
//! auto-formatted commit, and destructive steps come after constructive ones.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use minijinja::{Environment, context};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::core::types::{ActionEffect, AnswerKey, Commit, Guard};
use crate::core::version::FrameworkVersion;
use crate::io::config::ScaffoldConfig;
use crate::io::fetch::{Fetcher, download_to};
use crate::io::manifest;
use crate::io::mutate::{
    append_line_if_absent, comment_out_matching_lines, create_file, insert_after_marker,
    remove_path_if_present, replace_in_file,
};
use crate::io::prompt::Answers;
use crate::io::tools::{ToolInvocation, ToolRunner, run_tool_checked};

const RUBOCOP_CONFIG_TEMPLATE: &str = include_str!("templates/rubocop.yml.j2");
const RAILTIES_TEMPLATE: &str = include_str!("templates/railties.rb.j2");
const BACKPORTS_INITIALIZER: &str = include_str!("templates/active_support_backports.rb");

const APPLICATION_CONFIG: &str = "config/application.rb";
const APPLICATION_CLASS_MARKER: &str = "class Application < Rails::Application";
const RAILS_ALL_REQUIRE: &str = r#"require "rails/all""#;

/// Railties a stock `rails/all` pulls in, in require order.
const DEFAULT_RAILTIES: [&str; 11] = [
    "active_record/railtie",
    "active_storage/engine",
    "action_controller/railtie",
    "action_view/railtie",
    "action_mailer/railtie",
    "active_job/railtie",
    "action_cable/engine",
    "action_mailbox/engine",
    "action_text/engine",
    "rails/test_unit/railtie",
    "sprockets/railtie",
];

/// Everything a step action may touch. Commits are the runner's business and
/// are deliberately absent here.
pub struct StepContext<'a> {
    pub root: &'a Path,
    pub config: &'a ScaffoldConfig,
    pub framework_version: &'a FrameworkVersion,
    pub tools: &'a dyn ToolRunner,
    pub fetcher: &'a dyn Fetcher,
    /// Answers resolved so far; guard evaluation fills these in before the
    /// action runs.
    pub answers: &'a Answers,
}

impl StepContext<'_> {
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn answered_yes(&self, key: AnswerKey) -> bool {
        self.answers.get(key).unwrap_or(false)
    }

    fn invocation(&self, argv: &[String]) -> ToolInvocation {
        ToolInvocation {
            argv: argv.to_vec(),
            workdir: self.root.to_path_buf(),
            timeout: Duration::from_secs(self.config.tool_timeout_secs),
            output_limit_bytes: self.config.tool_output_limit_bytes,
        }
    }

    pub fn run_tool(&self, argv: &[String]) -> Result<()> {
        run_tool_checked(self.tools, &self.invocation(argv))
    }

    pub fn bundle_install(&self) -> Result<()> {
        self.run_tool(&self.config.tools.bundle_install)
    }
}

/// Action body of a step. Returns side data for the runner (currently only a
/// commit-message override).
pub type StepAction = Box<dyn Fn(&StepContext<'_>) -> Result<ActionEffect>>;

/// One ordered unit of scaffold mutation, optionally checkpointed.
pub struct Step {
    pub name: &'static str,
    pub guard: Option<Guard>,
    pub action: StepAction,
    pub commit: Option<Commit>,
}

impl Step {
    fn new(name: &'static str, commit: Commit, action: StepAction) -> Self {
        Self {
            name,
            guard: None,
            action,
            commit: Some(commit),
        }
    }

    fn guarded(name: &'static str, guard: Guard, commit: Commit, action: StepAction) -> Self {
        Self {
            name,
            guard: Some(guard),
            action,
            commit: Some(commit),
        }
    }
}

fn done() -> Result<ActionEffect> {
    Ok(ActionEffect::default())
}

/// Build the full customization plan in execution order.
pub fn build_plan() -> Vec<Step> {
    let packaging_floor: FrameworkVersion = "6.1.0"
        .parse()
        .expect("static version bound should parse");
    let backports_ceiling: FrameworkVersion = "6.0.4"
        .parse()
        .expect("static version bound should parse");

    vec![
        // Checkpoint whatever the generator left behind before touching it.
        Step::new(
            "initial-commit",
            Commit::without_formatting("rails new"),
            Box::new(|_ctx| done()),
        ),
        Step::new(
            "install-rubocop",
            Commit::without_formatting("Install rubocop"),
            Box::new(move |ctx| {
                let mut gems = vec!["rubocop"];
                if ctx.framework_version >= &packaging_floor {
                    gems.push("rubocop-packaging");
                }
                gems.push("rubocop-performance");
                gems.push("rubocop-rails");
                manifest::append_gem_group(ctx.root, &["development"], &gems)?;
                ctx.bundle_install()?;
                done()
            }),
        ),
        Step::new(
            "rubocop-config",
            Commit::new("rubocop -a"),
            Box::new(|ctx| {
                let baseline_file = format!(".rubocop-{}.yml", ctx.framework_version.dashed());
                let url = ctx
                    .config
                    .urls
                    .rubocop_baseline
                    .replace("{version}", &ctx.framework_version.to_string());
                let baseline_path = ctx.path(&baseline_file);
                download_to(ctx.fetcher, &url, &baseline_path)?;
                // The upstream baseline may still reference the retired cop name.
                replace_in_file(&baseline_path, "Layout/Tab", "Layout/IndentationStyle")?;
                create_file(&ctx.path(".rubocop.yml"), &render_rubocop_config(&baseline_file)?)?;
                done()
            }),
        ),
        Step::new(
            "install-rspec",
            Commit::new("Install rspec-rails"),
            Box::new(|ctx| {
                manifest::append_gem_group(ctx.root, &["development", "test"], &["rspec-rails"])?;
                ctx.bundle_install()?;
                done()
            }),
        ),
        Step::new(
            "rspec-generator",
            Commit::new("rails g rspec:install"),
            Box::new(|ctx| {
                ctx.run_tool(&ctx.config.tools.rspec_generator)?;
                remove_path_if_present(&ctx.path("test"))?;
                done()
            }),
        ),
        Step::new(
            "install-simplecov",
            Commit::new("Install simplecov"),
            Box::new(|ctx| {
                manifest::append_gem_group(ctx.root, &["test"], &["simplecov"])?;
                ctx.bundle_install()?;
                append_line_if_absent(&ctx.path(".gitignore"), "coverage")?;
                done()
            }),
        ),
        Step::new(
            "install-pry",
            Commit::new("Install pry-byebug"),
            Box::new(|ctx| {
                manifest::append_gem_group(ctx.root, &["development"], &["pry-byebug"])?;
                ctx.bundle_install()?;
                done()
            }),
        ),
        Step::new(
            "install-hamlit",
            Commit::new("Install hamlit-rails"),
            Box::new(|ctx| {
                manifest::append_gems(ctx.root, &["hamlit-rails", "html2haml"])?;
                ctx.bundle_install()?;
                done()
            }),
        ),
        Step::new(
            "erb2haml",
            Commit::new("rake hamlit:erb2haml"),
            Box::new(|ctx| {
                ctx.run_tool(&ctx.config.tools.erb2haml)?;
                done()
            }),
        ),
        Step::guarded(
            "uninstall-jbuilder",
            Guard::Ask(AnswerKey::UninstallJbuilder),
            Commit::new("Uninstall jbuilder"),
            Box::new(|ctx| {
                manifest::comment_gem(ctx.root, "jbuilder")?;
                ctx.bundle_install()?;
                done()
            }),
        ),
        Step::guarded(
            "localize-japan",
            Guard::Ask(AnswerKey::LocalizeJapan),
            Commit::new("Localize to Japan"),
            Box::new(|ctx| {
                insert_after_marker(
                    &ctx.path(APPLICATION_CONFIG),
                    APPLICATION_CLASS_MARKER,
                    "    config.time_zone = \"Tokyo\"\n    config.i18n.default_locale = :ja",
                )?;
                download_to(
                    ctx.fetcher,
                    &ctx.config.urls.locale_data,
                    &ctx.path("config/locales/ja.yml"),
                )?;
                done()
            }),
        ),
        Step::guarded(
            "prune-railties",
            Guard::AskAny(vec![
                AnswerKey::DisableActiveStorage,
                AnswerKey::DisableActionText,
            ]),
            Commit::new("Disable railties"),
            Box::new(|ctx| {
                let mut disabled = Vec::new();
                if ctx.answered_yes(AnswerKey::DisableActiveStorage) {
                    disabled.push("active_storage/engine");
                }
                if ctx.answered_yes(AnswerKey::DisableActionText) {
                    disabled.push("action_text/engine");
                }
                let kept: Vec<&str> = DEFAULT_RAILTIES
                    .iter()
                    .copied()
                    .filter(|r| !disabled.contains(r))
                    .collect();
                debug!(?disabled, "pruning railties");

                let config_path = ctx.path(APPLICATION_CONFIG);
                let pattern = Regex::new(&format!("^{}", regex::escape(RAILS_ALL_REQUIRE)))
                    .context("compile rails/all pattern")?;
                comment_out_matching_lines(&config_path, &pattern)?;
                insert_after_marker(
                    &config_path,
                    &format!("# {RAILS_ALL_REQUIRE}"),
                    &render_railtie_requires(&kept)?,
                )?;

                Ok(ActionEffect {
                    commit_message: Some(format!("Disable {}", disabled.join(", "))),
                })
            }),
        ),
        Step::guarded(
            "legacy-backports",
            Guard::VersionBelow(backports_ceiling),
            Commit::new("Add backport of irb completion"),
            Box::new(|ctx| {
                create_file(
                    &ctx.path("config/initializers/active_support_backports.rb"),
                    BACKPORTS_INITIALIZER,
                )?;
                done()
            }),
        ),
    ]
}

/// One row of `furnish plan` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub name: &'static str,
    pub guard: Option<String>,
    pub commit: Option<String>,
}

/// Describe the plan without touching the project.
pub fn describe_plan() -> Vec<PlanEntry> {
    build_plan()
        .iter()
        .map(|step| PlanEntry {
            name: step.name,
            guard: step.guard.as_ref().map(Guard::describe),
            commit: step.commit.as_ref().map(|c| c.message.clone()),
        })
        .collect()
}

fn render_rubocop_config(baseline_file: &str) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("rubocop", RUBOCOP_CONFIG_TEMPLATE)
        .expect("rubocop template should be valid");
    let rendered = env
        .get_template("rubocop")?
        .render(context! { baseline_file })?;
    Ok(ensure_trailing_newline(rendered))
}

fn render_railtie_requires(railties: &[&str]) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("railties", RAILTIES_TEMPLATE)
        .expect("railties template should be valid");
    let rendered = env
        .get_template("railties")?
        .render(context! { railties })?;
    Ok(rendered.trim().to_string())
}

fn ensure_trailing_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
