//! Interactive yes/no prompts and memoized answers.
//!
//! Guards resolve lazily in step order, but each question is asked at most
//! once: [`Answers`] memoizes resolutions and accepts seeds from the config
//! file, so guard evaluation never depends on stdin when the operator has
//! pre-answered.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::types::AnswerKey;

/// Abstraction over the operator's yes/no input.
pub trait Prompter {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Prompter that asks on stdout and reads one line from stdin.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        print!("{question} (y/n): ");
        io::stdout().flush().context("flush stdout")?;

        let mut response = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut response)
            .context("read answer from stdin")?;
        if read == 0 {
            return Err(anyhow!("stdin closed while waiting for an answer"));
        }
        let answer = response.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }
}

/// Resolved guard answers, seeded from config and filled in lazily.
#[derive(Debug, Default)]
pub struct Answers {
    resolved: BTreeMap<AnswerKey, bool>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an answer (from `furnish.toml` `[answers]`), so the prompter
    /// is never consulted for this key.
    pub fn seed(&mut self, key: AnswerKey, value: bool) {
        self.resolved.insert(key, value);
    }

    /// Current resolution without prompting, if any.
    pub fn get(&self, key: AnswerKey) -> Option<bool> {
        self.resolved.get(&key).copied()
    }

    /// Resolve `key`, asking the prompter on first use and memoizing.
    pub fn resolve(&mut self, key: AnswerKey, prompter: &dyn Prompter) -> Result<bool> {
        if let Some(value) = self.resolved.get(&key) {
            return Ok(*value);
        }
        let value = prompter.confirm(key.question())?;
        debug!(key = key.config_key(), value, "answer resolved");
        self.resolved.insert(key, value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingPrompter {
        asked: Cell<u32>,
        answer: bool,
    }

    impl Prompter for CountingPrompter {
        fn confirm(&self, _question: &str) -> Result<bool> {
            self.asked.set(self.asked.get() + 1);
            Ok(self.answer)
        }
    }

    #[test]
    fn resolve_asks_once_and_memoizes() {
        let prompter = CountingPrompter {
            asked: Cell::new(0),
            answer: true,
        };
        let mut answers = Answers::new();

        assert!(answers
            .resolve(AnswerKey::UninstallJbuilder, &prompter)
            .expect("resolve"));
        assert!(answers
            .resolve(AnswerKey::UninstallJbuilder, &prompter)
            .expect("resolve again"));
        assert_eq!(prompter.asked.get(), 1);
    }

    #[test]
    fn seeded_answers_never_prompt() {
        let prompter = CountingPrompter {
            asked: Cell::new(0),
            answer: true,
        };
        let mut answers = Answers::new();
        answers.seed(AnswerKey::LocalizeJapan, false);

        assert!(!answers
            .resolve(AnswerKey::LocalizeJapan, &prompter)
            .expect("resolve"));
        assert_eq!(prompter.asked.get(), 0);
    }
}
