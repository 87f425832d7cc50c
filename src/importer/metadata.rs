// src/importer/metadata.rs

use crate::importer::error::ImportError;

const SUBJECT_LABEL: &str = "Subject:";
const QUESTION_COUNT_LABEL: &str = "Number of Quiz:";
const LECTURER_LABEL: &str = "Lecturer:";

/// Column widths of `subjects.name` and `subjects.lecturer`.
pub(crate) const MAX_SUBJECT_NAME_CHARS: usize = 100;
pub(crate) const MAX_LECTURER_CHARS: usize = 255;

/// Header fields of an exam template.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamMetadata {
    pub subject_name: String,
    pub num_questions: i32,
    pub lecturer: String,
}

/// Scans paragraphs for the `Subject:`, `Number of Quiz:` and `Lecturer:` lines.
///
/// Labels may appear in any order; the first occurrence of each wins.
/// Fails with `MissingMetadata` naming every field that is still empty (or zero) after the scan,
/// and with `InvalidField` when a value does not fit its column.
pub fn extract_metadata<S: AsRef<str>>(paragraphs: &[S]) -> Result<ExamMetadata, ImportError> {
    let mut subject_name: Option<String> = None;
    let mut num_questions: Option<String> = None;
    let mut lecturer: Option<String> = None;

    for paragraph in paragraphs {
        let line = paragraph.as_ref().trim();
        let slot = if line.starts_with(SUBJECT_LABEL) {
            &mut subject_name
        } else if line.starts_with(QUESTION_COUNT_LABEL) {
            &mut num_questions
        } else if line.starts_with(LECTURER_LABEL) {
            &mut lecturer
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(value_after_colon(line)?);
        }
    }

    let num_questions = match num_questions.as_deref() {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| ImportError::InvalidQuestionCount(raw.to_string()))?,
    };
    let subject_name = subject_name.unwrap_or_default();
    let lecturer = lecturer.unwrap_or_default();

    let mut missing = Vec::new();
    if subject_name.is_empty() {
        missing.push("Subject");
    }
    if num_questions == 0 {
        missing.push("Number of Quiz");
    }
    if lecturer.is_empty() {
        missing.push("Lecturer");
    }
    if !missing.is_empty() {
        return Err(ImportError::MissingMetadata(missing));
    }
    check_length("Subject", &subject_name, MAX_SUBJECT_NAME_CHARS)?;
    check_length("Lecturer", &lecturer, MAX_LECTURER_CHARS)?;

    Ok(ExamMetadata {
        subject_name,
        num_questions,
        lecturer,
    })
}

/// Everything after the first colon, trimmed.
pub(crate) fn value_after_colon(line: &str) -> Result<String, ImportError> {
    line.split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| ImportError::MalformedLine(line.to_string()))
}

pub(crate) fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ImportError> {
    let chars = value.chars().count();
    if chars > max {
        return Err(ImportError::InvalidField {
            field,
            reason: format!("must be at most {max} characters, got {chars}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fields_in_any_order() {
        let paragraphs = ["Subject: Math", "Lecturer: Dr. X", "Number of Quiz: 5"];
        let expected = ExamMetadata {
            subject_name: "Math".to_string(),
            num_questions: 5,
            lecturer: "Dr. X".to_string(),
        };

        assert_eq!(extract_metadata(&paragraphs).unwrap(), expected);

        let shuffled = ["Number of Quiz: 5", "some heading", "Subject: Math", "Lecturer: Dr. X"];
        assert_eq!(extract_metadata(&shuffled).unwrap(), expected);
    }

    #[test]
    fn first_occurrence_wins() {
        let paragraphs = [
            "Subject: Physics",
            "Subject: Chemistry",
            "Number of Quiz: 3",
            "Lecturer: A",
        ];
        let meta = extract_metadata(&paragraphs).unwrap();
        assert_eq!(meta.subject_name, "Physics");
    }

    #[test]
    fn value_keeps_text_after_later_colons() {
        let paragraphs = ["Subject: Networks: Part 2", "Number of Quiz: 1", "Lecturer: B"];
        let meta = extract_metadata(&paragraphs).unwrap();
        assert_eq!(meta.subject_name, "Networks: Part 2");
    }

    #[test]
    fn reports_every_missing_field() {
        let err = extract_metadata(&["Subject: Math"]).unwrap_err();
        match err {
            ImportError::MissingMetadata(fields) => {
                assert_eq!(fields, vec!["Number of Quiz", "Lecturer"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_questions_counts_as_missing() {
        let err = extract_metadata(&["Subject: M", "Number of Quiz: 0", "Lecturer: L"]).unwrap_err();
        assert!(matches!(err, ImportError::MissingMetadata(f) if f == vec!["Number of Quiz"]));
    }

    #[test]
    fn non_numeric_question_count_is_rejected() {
        let err = extract_metadata(&["Subject: M", "Number of Quiz: five", "Lecturer: L"]).unwrap_err();
        assert!(matches!(err, ImportError::InvalidQuestionCount(v) if v == "five"));
    }

    #[test]
    fn values_longer_than_their_columns_are_rejected() {
        let long_subject = "S".repeat(MAX_SUBJECT_NAME_CHARS + 1);
        let subject_line = format!("Subject: {long_subject}");
        let err = extract_metadata(&[subject_line.as_str(), "Number of Quiz: 1", "Lecturer: L"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid field 'Subject': must be at most 100 characters, got 101"
        );

        let lecturer_line = format!("Lecturer: {}", "L".repeat(MAX_LECTURER_CHARS + 1));
        let err = extract_metadata(&["Subject: M", "Number of Quiz: 1", lecturer_line.as_str()])
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidField { field: "Lecturer", .. }));

        // Limits count characters, not bytes.
        let accented = format!("Subject: {}", "é".repeat(MAX_SUBJECT_NAME_CHARS));
        let meta = extract_metadata(&[accented.as_str(), "Number of Quiz: 1", "Lecturer: L"]).unwrap();
        assert_eq!(meta.subject_name.chars().count(), MAX_SUBJECT_NAME_CHARS);
    }
}
