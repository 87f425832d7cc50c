// src/importer/legacy.rs

//! Parser for the older paragraph-only template:
//!
//! ```text
//! Câu 1: Question text
//! A. first choice
//! B. second choice
//! Đáp án: B
//! ```
//!
//! A pending question (non-empty text and at least one choice) is emitted with its
//! answer when `Đáp án` arrives, or without one when the next `Câu` line or the end
//! of the document is reached first.

use std::mem;

use crate::importer::{
    ParsedChoice, ParsedQuestion, error::ImportError, metadata::value_after_colon,
};

const QUESTION_PREFIX: &str = "Câu";
const ANSWER_PREFIX: &str = "Đáp án";
const CHOICE_PREFIXES: [&str; 4] = ["A.", "B.", "C.", "D."];

#[derive(Debug, Default)]
struct LegacyState {
    question: Option<String>,
    choices: Vec<ParsedChoice>,
    output: Vec<ParsedQuestion>,
}

impl LegacyState {
    fn is_pending(&self) -> bool {
        self.question.as_deref().is_some_and(|q| !q.is_empty()) && !self.choices.is_empty()
    }

    fn flush(&mut self, correct_choice: Option<String>) {
        let text = self.question.take().unwrap_or_default();
        let choices = mem::take(&mut self.choices);
        self.output.push(ParsedQuestion::plain(text, choices, correct_choice));
    }

    fn step(mut self, line: &str) -> Result<Self, ImportError> {
        if line.starts_with(QUESTION_PREFIX) {
            if self.is_pending() {
                self.flush(None);
            }
            self.question = Some(value_after_colon(line)?);
            self.choices.clear();
        } else if CHOICE_PREFIXES.iter().any(|p| line.starts_with(p)) {
            if let Some((option, text)) = line.split_once('.') {
                self.choices.push(ParsedChoice {
                    option: option.trim().to_string(),
                    text: text.trim().to_string(),
                });
            }
        } else if line.starts_with(ANSWER_PREFIX) {
            let answer = value_after_colon(line)?;
            if self.is_pending() {
                self.flush(Some(answer));
            }
        }
        Ok(self)
    }
}

/// Parses paragraphs of the legacy template into question records.
pub fn parse_legacy_paragraphs<S: AsRef<str>>(
    paragraphs: &[S],
) -> Result<Vec<ParsedQuestion>, ImportError> {
    let mut state = paragraphs
        .iter()
        .map(|p| p.as_ref().trim())
        .try_fold(LegacyState::default(), LegacyState::step)?;

    if state.is_pending() {
        state.flush(None);
    }

    Ok(state.output)
}
