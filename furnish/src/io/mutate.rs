//! Idempotent file-mutation primitives.
//!
//! Every primitive is safe to re-apply with identical arguments: the second
//! application detects the existing effect and no-ops. That property is the
//! intended recovery path after an aborted run — the operator fixes the cause
//! and re-invokes the whole plan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use tracing::debug;

/// Append `line` to the file unless an identical line is already present.
///
/// Creates the file (and parent directories) when missing, matching shell
/// `>>` semantics.
pub fn append_line_if_absent(path: &Path, line: &str) -> Result<bool> {
    let mut contents = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
    } else {
        String::new()
    };

    if contents.lines().any(|l| l == line) {
        debug!(path = %path.display(), line, "line already present");
        return Ok(false);
    }

    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(line);
    contents.push('\n');
    write_file(path, &contents)?;
    Ok(true)
}

/// Prefix every line matching `pattern` with `# `, preserving line count.
///
/// Already-commented lines no longer match an anchored pattern, so re-running
/// is a no-op. Errors when the file does not exist.
pub fn comment_out_matching_lines(path: &Path, pattern: &Regex) -> Result<usize> {
    let contents = read_existing(path)?;
    let mut changed = 0usize;
    let lines: Vec<String> = contents
        .lines()
        .map(|line| {
            if pattern.is_match(line) {
                changed += 1;
                format!("# {line}")
            } else {
                line.to_string()
            }
        })
        .collect();

    if changed == 0 {
        debug!(path = %path.display(), pattern = %pattern, "no lines matched");
        return Ok(0);
    }

    write_file(path, &rejoin(lines, &contents))?;
    Ok(changed)
}

/// Write `contents` to `path`, creating parent directories.
///
/// An existing file is replaced wholesale, so re-running with the same
/// contents converges trivially.
pub fn create_file(path: &Path, contents: &str) -> Result<()> {
    write_file(path, contents)
}

/// Replace every occurrence of `from` with `to`. Errors when the file does
/// not exist; no-ops when `from` is no longer present.
pub fn replace_in_file(path: &Path, from: &str, to: &str) -> Result<bool> {
    let contents = read_existing(path)?;
    if !contents.contains(from) {
        debug!(path = %path.display(), from, "substring not present");
        return Ok(false);
    }
    write_file(path, &contents.replace(from, to))?;
    Ok(true)
}

/// Insert `block` on its own lines after the first line containing `marker`.
///
/// No-ops when the block is already present anywhere in the file. Errors when
/// the file or the marker is missing.
pub fn insert_after_marker(path: &Path, marker: &str, block: &str) -> Result<bool> {
    let contents = read_existing(path)?;
    let block = block.trim_end_matches('\n');
    if contents.contains(block) {
        debug!(path = %path.display(), "block already present");
        return Ok(false);
    }

    let mut out: Vec<String> = Vec::new();
    let mut inserted = false;
    for line in contents.lines() {
        out.push(line.to_string());
        if !inserted && line.contains(marker) {
            out.push(block.to_string());
            inserted = true;
        }
    }
    if !inserted {
        return Err(anyhow!(
            "marker '{}' not found in {}",
            marker,
            path.display()
        ));
    }

    write_file(path, &rejoin(out, &contents))?;
    Ok(true)
}

/// Remove a file or directory tree if it exists.
pub fn remove_path_if_present(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    if path.is_dir() {
        fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))?;
    } else {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(true)
}

fn read_existing(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(anyhow!("target file not found: {}", path.display()));
    }
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Reassemble lines, keeping the source's trailing-newline convention.
fn rejoin(lines: Vec<String>, original: &str) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("target.txt");
        fs::write(&path, contents).expect("seed file");
        (temp, path)
    }

    #[test]
    fn append_creates_then_noops() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".gitignore");

        assert!(append_line_if_absent(&path, "coverage").expect("first"));
        let once = fs::read_to_string(&path).expect("read");
        assert!(!append_line_if_absent(&path, "coverage").expect("second"));
        let twice = fs::read_to_string(&path).expect("read");
        assert_eq!(once, twice);
        assert_eq!(once, "coverage\n");
    }

    #[test]
    fn append_adds_newline_to_unterminated_file() {
        let (_temp, path) = temp_file("log");
        append_line_if_absent(&path, "coverage").expect("append");
        assert_eq!(fs::read_to_string(&path).expect("read"), "log\ncoverage\n");
    }

    #[test]
    fn comment_out_preserves_line_count_and_is_idempotent() {
        let (_temp, path) = temp_file("gem \"rails\"\ngem \"jbuilder\"\ngem \"puma\"\n");
        let pattern = Regex::new(r#"^gem "jbuilder""#).expect("regex");

        assert_eq!(comment_out_matching_lines(&path, &pattern).expect("first"), 1);
        let once = fs::read_to_string(&path).expect("read");
        assert_eq!(once.lines().count(), 3);
        assert!(once.contains("# gem \"jbuilder\""));

        assert_eq!(
            comment_out_matching_lines(&path, &pattern).expect("second"),
            0
        );
        assert_eq!(once, fs::read_to_string(&path).expect("read"));
    }

    #[test]
    fn comment_out_errors_on_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let pattern = Regex::new("x").expect("regex");
        let err = comment_out_matching_lines(&temp.path().join("missing"), &pattern).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn create_file_converges_on_rerun() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config/initializers/backports.rb");

        create_file(&path, "module A\nend\n").expect("first");
        create_file(&path, "module A\nend\n").expect("second");
        assert_eq!(fs::read_to_string(&path).expect("read"), "module A\nend\n");
    }

    #[test]
    fn replace_applies_once_then_noops() {
        let (_temp, path) = temp_file("Layout/Tab:\n  Enabled: true\n");

        assert!(replace_in_file(&path, "Layout/Tab", "Layout/IndentationStyle").expect("first"));
        let once = fs::read_to_string(&path).expect("read");
        assert!(once.starts_with("Layout/IndentationStyle:"));

        assert!(!replace_in_file(&path, "Layout/Tab", "Layout/IndentationStyle").expect("second"));
        assert_eq!(once, fs::read_to_string(&path).expect("read"));
    }

    #[test]
    fn insert_after_marker_once_then_noops() {
        let (_temp, path) = temp_file("module App\n  class Application\n  end\nend\n");

        let block = "    config.time_zone = \"Tokyo\"";
        assert!(insert_after_marker(&path, "class Application", block).expect("first"));
        let once = fs::read_to_string(&path).expect("read");
        assert!(!insert_after_marker(&path, "class Application", block).expect("second"));
        assert_eq!(once, fs::read_to_string(&path).expect("read"));

        let lines: Vec<&str> = once.lines().collect();
        assert_eq!(lines[2], block);
    }

    #[test]
    fn insert_after_marker_errors_when_marker_missing() {
        let (_temp, path) = temp_file("nothing here\n");
        let err = insert_after_marker(&path, "class Application", "x").unwrap_err();
        assert!(err.to_string().contains("marker"));
    }

    #[test]
    fn remove_path_handles_files_dirs_and_absence() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("test");
        fs::create_dir_all(dir.join("models")).expect("mkdir");
        fs::write(dir.join("models/user_test.rb"), "").expect("write");

        assert!(remove_path_if_present(&dir).expect("first"));
        assert!(!dir.exists());
        assert!(!remove_path_if_present(&dir).expect("second"));
    }
}
