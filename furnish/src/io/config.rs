//! Runner configuration stored in `furnish.toml` at the project root.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::AnswerKey;
use crate::io::prompt::Answers;

/// Scaffold configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values for a stock Rails
/// skeleton.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScaffoldConfig {
    /// Override the framework version instead of reading `Gemfile.lock`.
    pub framework_version: Option<String>,

    /// Wall-clock budget for each external tool invocation.
    pub tool_timeout_secs: u64,

    /// Truncate captured tool stdout/stderr beyond this many bytes.
    pub tool_output_limit_bytes: usize,

    /// Timeout for each remote baseline fetch.
    pub fetch_timeout_secs: u64,

    pub tools: ToolsConfig,
    pub urls: UrlsConfig,
    pub answers: AnswerSeeds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Dependency install command (e.g. `["bundle", "install", "--jobs=4"]`).
    pub bundle_install: Vec<String>,
    /// Auto-format command run before formatted commits.
    pub formatter: Vec<String>,
    /// Test-framework install generator.
    pub rspec_generator: Vec<String>,
    /// Template conversion task.
    pub erb2haml: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UrlsConfig {
    /// Lint baseline for the pinned framework version; `{version}` is
    /// substituted with the dotted version.
    pub rubocop_baseline: String,
    /// Localization dataset written verbatim to `config/locales/ja.yml`.
    pub locale_data: String,
}

/// Pre-collected guard answers; unset keys fall back to interactive prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnswerSeeds {
    pub uninstall_jbuilder: Option<bool>,
    pub localize_japan: Option<bool>,
    pub disable_active_storage: Option<bool>,
    pub disable_action_text: Option<bool>,
}

impl AnswerSeeds {
    /// Copy every set seed into `answers`.
    pub fn apply(&self, answers: &mut Answers) {
        let seeds = [
            (AnswerKey::UninstallJbuilder, self.uninstall_jbuilder),
            (AnswerKey::LocalizeJapan, self.localize_japan),
            (AnswerKey::DisableActiveStorage, self.disable_active_storage),
            (AnswerKey::DisableActionText, self.disable_action_text),
        ];
        for (key, seed) in seeds {
            if let Some(value) = seed {
                answers.seed(key, value);
            }
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bundle_install: argv(&["bundle", "install", "--jobs=4"]),
            formatter: argv(&["bundle", "exec", "rubocop", "-a"]),
            rspec_generator: argv(&["bin/rails", "generate", "rspec:install"]),
            erb2haml: argv(&["bundle", "exec", "rake", "hamlit:erb2haml"]),
        }
    }
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            rubocop_baseline:
                "https://raw.githubusercontent.com/rails/rails/v{version}/.rubocop.yml".to_string(),
            locale_data:
                "https://raw.githubusercontent.com/svenfuchs/rails-i18n/master/rails/locale/ja.yml"
                    .to_string(),
        }
    }
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            framework_version: None,
            tool_timeout_secs: 15 * 60,
            tool_output_limit_bytes: 100_000,
            fetch_timeout_secs: 60,
            tools: ToolsConfig::default(),
            urls: UrlsConfig::default(),
            answers: AnswerSeeds::default(),
        }
    }
}

impl ScaffoldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tool_timeout_secs == 0 {
            return Err(anyhow!("tool_timeout_secs must be > 0"));
        }
        if self.tool_output_limit_bytes == 0 {
            return Err(anyhow!("tool_output_limit_bytes must be > 0"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(anyhow!("fetch_timeout_secs must be > 0"));
        }
        for (name, command) in [
            ("tools.bundle_install", &self.tools.bundle_install),
            ("tools.formatter", &self.tools.formatter),
            ("tools.rspec_generator", &self.tools.rspec_generator),
            ("tools.erb2haml", &self.tools.erb2haml),
        ] {
            if command.is_empty() || command[0].trim().is_empty() {
                return Err(anyhow!("{name} must be a non-empty array"));
            }
        }
        if !self.urls.rubocop_baseline.contains("{version}") {
            return Err(anyhow!(
                "urls.rubocop_baseline must contain a {{version}} placeholder"
            ));
        }
        if self.urls.locale_data.trim().is_empty() {
            return Err(anyhow!("urls.locale_data must not be empty"));
        }
        Ok(())
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScaffoldConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScaffoldConfig> {
    if !path.exists() {
        let cfg = ScaffoldConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScaffoldConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
