//! Gemfile and Gemfile.lock surface.
//!
//! Gem installs append declarations to the Gemfile; uninstalls comment the
//! line out rather than deleting it, so the manifest keeps its shape and the
//! operator can revert by hand. The lockfile is only ever read, to discover
//! the framework version the generator pinned.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use tracing::debug;

use crate::core::version::FrameworkVersion;
use crate::io::mutate::comment_out_matching_lines;

pub const GEMFILE: &str = "Gemfile";
pub const LOCKFILE: &str = "Gemfile.lock";

/// Append a `group :<name>, ... do ... end` block declaring `gems`.
///
/// Idempotent: if the first gem in the list is declared anywhere in the
/// Gemfile already, the whole block is assumed present and nothing is
/// written.
pub fn append_gem_group(root: &Path, groups: &[&str], gems: &[&str]) -> Result<bool> {
    if groups.is_empty() {
        return Err(anyhow!("empty group list"));
    }
    let first = gems
        .first()
        .ok_or_else(|| anyhow!("empty gem list for group :{}", groups[0]))?;
    let path = root.join(GEMFILE);
    let contents = read_gemfile(&path)?;
    if declares_gem(&contents, first) {
        debug!(gem = first, "gem already declared, skipping group append");
        return Ok(false);
    }

    let labels = groups
        .iter()
        .map(|g| format!(":{g}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut block = format!("\ngroup {labels} do\n");
    for gem in gems {
        block.push_str(&format!("  gem \"{gem}\"\n"));
    }
    block.push_str("end\n");

    append_block(&path, &contents, &block)?;
    Ok(true)
}

/// Append top-level gem declarations (no group).
pub fn append_gems(root: &Path, gems: &[&str]) -> Result<bool> {
    let first = gems
        .first()
        .ok_or_else(|| anyhow!("empty gem list"))?;
    let path = root.join(GEMFILE);
    let contents = read_gemfile(&path)?;
    if declares_gem(&contents, first) {
        debug!(gem = first, "gem already declared, skipping append");
        return Ok(false);
    }

    let mut block = String::from("\n");
    for gem in gems {
        block.push_str(&format!("gem \"{gem}\"\n"));
    }

    append_block(&path, &contents, &block)?;
    Ok(true)
}

/// Comment out the declaration line for `gem_name`, preserving line count.
pub fn comment_gem(root: &Path, gem_name: &str) -> Result<usize> {
    let pattern = Regex::new(&format!(r#"^gem ['"]{}['"]"#, regex::escape(gem_name)))
        .context("compile gem pattern")?;
    comment_out_matching_lines(&root.join(GEMFILE), &pattern)
}

/// Framework version pinned in `Gemfile.lock` (the `rails (x.y.z)` spec line).
pub fn locked_framework_version(root: &Path) -> Result<FrameworkVersion> {
    let path = root.join(LOCKFILE);
    if !path.exists() {
        return Err(anyhow!(
            "missing {} (run the generator and bundle install first)",
            path.display()
        ));
    }
    let contents =
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let pattern = Regex::new(r"^\s{4}rails \(([0-9][0-9.]*)\)$").context("compile lock pattern")?;
    for line in contents.lines() {
        if let Some(caps) = pattern.captures(line) {
            let version: FrameworkVersion = caps[1].parse()?;
            debug!(%version, "framework version from lockfile");
            return Ok(version);
        }
    }
    Err(anyhow!("no rails spec found in {}", path.display()))
}

fn declares_gem(contents: &str, gem_name: &str) -> bool {
    contents.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with(&format!("gem \"{gem_name}\""))
            || trimmed.starts_with(&format!("gem '{gem_name}'"))
    })
}

fn read_gemfile(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(anyhow!("target file not found: {}", path.display()));
    }
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn append_block(path: &Path, contents: &str, block: &str) -> Result<()> {
    let mut out = contents.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(block);
    fs::write(path, out).with_context(|| format!("write {}", path.display()))
}
