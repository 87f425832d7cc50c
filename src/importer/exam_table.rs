// src/importer/exam_table.rs

//! Row-driven parser for the question table of an exam template.
//!
//! Each row is `[marker, value, ...]`. Markers are matched by prefix, case-sensitively,
//! first match wins:
//!
//! | marker          | effect                                                    |
//! |-----------------|-----------------------------------------------------------|
//! | `QN...`         | start a new question, snapshotting the carried defaults   |
//! | `a.` .. `d.`    | append a choice to the current question                   |
//! | `ANSWER:`       | set the carried correct choice and the current question's |
//! | `MARK:`         | same, for the mark (parsed as a float)                    |
//! | `UNIT:`         | same, for the unit label                                  |
//! | `MIX CHOICES:`  | same, for the shuffle flag (`yes`, any case, is true)     |
//!
//! The carried values are never reset between questions: a `MARK:` row applies to
//! every later question until another `MARK:` row overrides it.

use crate::importer::{ParsedChoice, ParsedQuestion, docx::Table, error::ImportError};

const IMAGE_MARKER: &str = "[file:";
const CHOICE_MARKERS: [(&str, char); 4] = [("a.", 'a'), ("b.", 'b'), ("c.", 'c'), ("d.", 'd')];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Question,
    Choice(char),
    Answer,
    Mark,
    Unit,
    MixChoices,
}

impl RowKind {
    fn classify(marker: &str) -> Option<Self> {
        if marker.starts_with("QN") {
            return Some(Self::Question);
        }
        if let Some((_, letter)) = CHOICE_MARKERS
            .iter()
            .find(|(prefix, _)| marker.starts_with(prefix))
        {
            return Some(Self::Choice(*letter));
        }
        if marker.starts_with("ANSWER:") {
            Some(Self::Answer)
        } else if marker.starts_with("MARK:") {
            Some(Self::Mark)
        } else if marker.starts_with("UNIT:") {
            Some(Self::Unit)
        } else if marker.starts_with("MIX CHOICES:") {
            Some(Self::MixChoices)
        } else {
            None
        }
    }
}

/// Values applied to each new question at the moment its `QN` row is seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarriedDefaults {
    pub correct_choice: Option<String>,
    pub mark: Option<f64>,
    pub unit: Option<String>,
    pub mix_choices: bool,
}

#[derive(Debug, Default)]
struct TableState {
    defaults: CarriedDefaults,
    questions: Vec<ParsedQuestion>,
}

impl TableState {
    /// The question currently being built is always the last one started.
    fn current(&mut self) -> Option<&mut ParsedQuestion> {
        self.questions.last_mut()
    }

    fn step(mut self, kind: RowKind, value: &str) -> Result<Self, ImportError> {
        match kind {
            RowKind::Question => {
                let (text, image_ref) = split_image_marker(value);
                self.questions.push(ParsedQuestion {
                    text,
                    image_ref,
                    image_url: None,
                    choices: Vec::new(),
                    correct_choice: self.defaults.correct_choice.clone(),
                    mark: self.defaults.mark,
                    unit: self.defaults.unit.clone(),
                    mix_choices: self.defaults.mix_choices,
                });
            }
            RowKind::Choice(letter) => {
                if let Some(question) = self.current() {
                    question.choices.push(ParsedChoice {
                        option: letter.to_string(),
                        text: value.to_string(),
                    });
                }
            }
            RowKind::Answer => {
                self.defaults.correct_choice = Some(value.to_string());
                if let Some(question) = self.current() {
                    question.correct_choice = Some(value.to_string());
                }
            }
            RowKind::Mark => {
                let mark = value
                    .parse::<f64>()
                    .map_err(|_| ImportError::InvalidMark(value.to_string()))?;
                self.defaults.mark = Some(mark);
                if let Some(question) = self.current() {
                    question.mark = Some(mark);
                }
            }
            RowKind::Unit => {
                self.defaults.unit = Some(value.to_string());
                if let Some(question) = self.current() {
                    question.unit = Some(value.to_string());
                }
            }
            RowKind::MixChoices => {
                let mix = value.eq_ignore_ascii_case("yes");
                self.defaults.mix_choices = mix;
                if let Some(question) = self.current() {
                    question.mix_choices = mix;
                }
            }
        }
        Ok(self)
    }
}

/// Parses the question table. Rows with fewer than two cells or an unknown marker are skipped.
pub fn parse_question_table(table: &Table) -> Result<Vec<ParsedQuestion>, ImportError> {
    let state = table
        .rows
        .iter()
        .filter(|row| row.len() >= 2)
        .try_fold(TableState::default(), |state, row| {
            let marker = row[0].trim();
            let value = row[1].trim();
            match RowKind::classify(marker) {
                Some(kind) => state.step(kind, value),
                None => Ok(state),
            }
        })?;

    Ok(state.questions)
}

/// Splits `body[file:reference]trailing` into the body and the image reference.
/// The reference is the text between `file:` and the next `]`; anything after it is dropped.
fn split_image_marker(value: &str) -> (String, Option<String>) {
    match value.split_once(IMAGE_MARKER) {
        Some((body, rest)) => {
            let reference = rest.split_once(']').map_or(rest, |(reference, _)| reference);
            (body.trim().to_string(), Some(reference.trim().to_string()))
        }
        None => (value.to_string(), None),
    }
}
