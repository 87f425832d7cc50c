// src/importer/persist.rs

//! Writes parsed questions to the database. Every function that writes takes a
//! `PgConnection` so the caller can run the whole import inside one transaction.

use std::{collections::HashSet, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::{PgConnection, PgPool};

use crate::{
    importer::{ParsedQuestion, error::ImportError, metadata::check_length},
    models::{
        exam::{EXAM_COLUMNS, Exam},
        subject::{SUBJECT_COLUMNS, Subject},
    },
};

static NON_CODE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static pattern is valid"));

/// Width of `questions.unit`.
const MAX_UNIT_CHARS: usize = 255;

/// Leaves room for `_YYYYmmddHHMMSS` inside the 100-character `exam_code` column.
const MAX_CODE_PREFIX_CHARS: usize = 80;

/// How the import should pick its exam.
#[derive(Debug, Clone, Default)]
pub struct ExamTarget<'a> {
    /// Update this exam in place instead of creating one.
    pub exam_id: Option<i64>,
    pub exam_code: Option<&'a str>,
    pub duration: Option<i32>,
}

/// Choices are stored with lowercase option codes.
pub fn option_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn wanted_option(question: &ParsedQuestion) -> Option<String> {
    question
        .correct_choice
        .as_deref()
        .map(option_code)
        .filter(|code| !code.is_empty())
}

/// Builds an exam code such as `DATA_STRUCTURES_20250201093000` from the subject name.
pub fn synthesize_exam_code(subject_name: &str, now: DateTime<Utc>) -> String {
    let slug = NON_CODE_CHARS.replace_all(subject_name.trim(), "_");
    let prefix: String = slug
        .trim_matches('_')
        .chars()
        .take(MAX_CODE_PREFIX_CHARS)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() { "EXAM".to_string() } else { prefix };

    format!("{}_{}", prefix, now.format("%Y%m%d%H%M%S"))
}

/// Checks every question before anything is written: option letters must be unique
/// per question, a correct answer must name one of them and the unit must fit its column.
pub fn validate_questions(questions: &[ParsedQuestion]) -> Result<(), ImportError> {
    for question in questions {
        if let Some(unit) = &question.unit {
            check_length("UNIT", unit, MAX_UNIT_CHARS)?;
        }

        let mut seen = HashSet::with_capacity(question.choices.len());
        for choice in &question.choices {
            let code = option_code(&choice.option);
            if !seen.insert(code.clone()) {
                return Err(ImportError::DuplicateChoice {
                    question: question.text.clone(),
                    option: code,
                });
            }
        }

        if let Some(wanted) = wanted_option(question) {
            if !seen.contains(&wanted) {
                return Err(ImportError::CorrectChoiceNotFound {
                    question: question.text.clone(),
                    option: wanted,
                });
            }
        }
    }
    Ok(())
}

/// Finds the id of the inserted choice whose option code is `wanted`.
pub fn resolve_correct_choice(
    question_text: &str,
    inserted: &[(String, i64)],
    wanted: &str,
) -> Result<i64, ImportError> {
    inserted
        .iter()
        .find(|(code, _)| code == wanted)
        .map(|(_, id)| *id)
        .ok_or_else(|| ImportError::CorrectChoiceNotFound {
            question: question_text.to_string(),
            option: wanted.to_string(),
        })
}

pub async fn exam_exists(pool: &PgPool, exam_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exams WHERE id = $1)")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub async fn find_subject(conn: &mut PgConnection, id: i64) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_exam(conn: &mut PgConnection, id: i64) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Looks a subject up by exact name, creating it with `lecturer` if absent.
/// An existing subject keeps its lecturer.
pub async fn resolve_subject(
    conn: &mut PgConnection,
    name: &str,
    lecturer: &str,
) -> Result<Subject, sqlx::Error> {
    let existing =
        sqlx::query_as::<_, Subject>(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE name = $1"))
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(subject) = existing {
        return Ok(subject);
    }

    tracing::info!(subject = name, "Creating subject");
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (name, lecturer) VALUES ($1, $2) RETURNING {SUBJECT_COLUMNS}"
    ))
    .bind(name)
    .bind(lecturer)
    .fetch_one(&mut *conn)
    .await
}

/// Updates the target exam in place, or creates one.
///
/// On update, subject and question count are overwritten; code and duration only when given.
/// On create, a missing code is synthesized from the subject name and `now`.
pub async fn upsert_exam(
    conn: &mut PgConnection,
    target: &ExamTarget<'_>,
    subject: &Subject,
    num_questions: i32,
    default_duration: i32,
    now: DateTime<Utc>,
) -> Result<Exam, ImportError> {
    match target.exam_id {
        Some(exam_id) => sqlx::query_as::<_, Exam>(&format!(
            r#"
            UPDATE exams
            SET subject_id = $1,
                num_questions = $2,
                exam_code = COALESCE($3, exam_code),
                duration = COALESCE($4, duration),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {EXAM_COLUMNS}
            "#
        ))
        .bind(subject.id)
        .bind(num_questions)
        .bind(target.exam_code)
        .bind(target.duration)
        .bind(exam_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ImportError::ExamNotFound(exam_id)),
        None => {
            let exam_code = target
                .exam_code
                .map(str::to_string)
                .unwrap_or_else(|| synthesize_exam_code(&subject.name, now));

            let exam = sqlx::query_as::<_, Exam>(&format!(
                r#"
                INSERT INTO exams (exam_code, duration, num_questions, subject_id)
                VALUES ($1, $2, $3, $4)
                RETURNING {EXAM_COLUMNS}
                "#
            ))
            .bind(&exam_code)
            .bind(target.duration.unwrap_or(default_duration))
            .bind(num_questions)
            .bind(subject.id)
            .fetch_one(&mut *conn)
            .await?;

            Ok(exam)
        }
    }
}

/// Creates questions, choices, correct answers and exam links for `questions`,
/// returning how many questions were written.
///
/// Re-importing the same document creates new rows each time; nothing is deduplicated.
pub async fn save_questions(
    conn: &mut PgConnection,
    questions: &[ParsedQuestion],
    exam_id: i64,
    subject_id: i64,
) -> Result<usize, ImportError> {
    for parsed in questions {
        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (question_text, image_url, unit, mark, mix_choices, subject_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&parsed.text)
        .bind(parsed.image_url.as_deref())
        .bind(parsed.unit.as_deref())
        .bind(parsed.mark)
        .bind(parsed.mix_choices)
        .bind(subject_id)
        .fetch_one(&mut *conn)
        .await?;

        let mut inserted = Vec::with_capacity(parsed.choices.len());
        for choice in &parsed.choices {
            let code = option_code(&choice.option);
            let choice_id: i64 = sqlx::query_scalar(
                "INSERT INTO choices (question_id, choice_text, option_code) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(question_id)
            .bind(&choice.text)
            .bind(&code)
            .fetch_one(&mut *conn)
            .await?;
            inserted.push((code, choice_id));
        }

        if let Some(wanted) = wanted_option(parsed) {
            let choice_id = resolve_correct_choice(&parsed.text, &inserted, &wanted)?;
            sqlx::query("INSERT INTO correct_answers (question_id, choice_id) VALUES ($1, $2)")
                .bind(question_id)
                .bind(choice_id)
                .execute(&mut *conn)
                .await?;
        }

        sqlx::query("INSERT INTO exam_questions (exam_id, question_id) VALUES ($1, $2)")
            .bind(exam_id)
            .bind(question_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(questions.len())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::importer::ParsedChoice;

    fn question(options: &[&str], correct: Option<&str>) -> ParsedQuestion {
        let choices = options
            .iter()
            .map(|o| ParsedChoice {
                option: o.to_string(),
                text: format!("choice {o}"),
            })
            .collect();
        ParsedQuestion::plain("Q1".to_string(), choices, correct.map(str::to_string))
    }

    #[test]
    fn unknown_correct_letter_is_a_named_error() {
        let err = validate_questions(&[question(&["a", "b", "c", "d"], Some("E"))]).unwrap_err();
        match err {
            ImportError::CorrectChoiceNotFound { question, option } => {
                assert_eq!(question, "Q1");
                assert_eq!(option, "e");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let inserted = vec![("a".to_string(), 10), ("b".to_string(), 11)];
        let err = resolve_correct_choice("Q1", &inserted, "e").unwrap_err();
        assert!(matches!(err, ImportError::CorrectChoiceNotFound { .. }));
    }

    #[test]
    fn correct_letter_matches_case_insensitively() {
        assert!(validate_questions(&[question(&["A", "B"], Some("b"))]).is_ok());
        assert!(validate_questions(&[question(&["a", "b"], Some(" B "))]).is_ok());

        let inserted = vec![("a".to_string(), 10), ("b".to_string(), 11)];
        assert_eq!(resolve_correct_choice("Q1", &inserted, "b").unwrap(), 11);
    }

    #[test]
    fn missing_or_blank_answer_is_not_an_error() {
        assert!(validate_questions(&[question(&["a"], None)]).is_ok());
        assert!(validate_questions(&[question(&["a"], Some(""))]).is_ok());
        assert!(validate_questions(&[question(&[], None)]).is_ok());
    }

    #[test]
    fn duplicate_option_letters_are_rejected() {
        let err = validate_questions(&[question(&["a", "b", "A"], None)]).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateChoice { option, .. } if option == "a"));
    }

    #[test]
    fn overlong_unit_is_rejected_before_saving() {
        let mut long_unit = question(&["a", "b"], Some("a"));
        long_unit.unit = Some("u".repeat(MAX_UNIT_CHARS + 1));
        let err = validate_questions(&[question(&["a"], None), long_unit]).unwrap_err();
        assert!(matches!(err, ImportError::InvalidField { field: "UNIT", .. }));

        let mut fits = question(&["a"], None);
        fits.unit = Some("u".repeat(MAX_UNIT_CHARS));
        assert!(validate_questions(&[fits]).is_ok());
    }

    #[test]
    fn exam_code_is_built_from_subject_and_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap();

        assert_eq!(synthesize_exam_code("Data Structures", now), "DATA_STRUCTURES_20250201093000");
        assert_eq!(synthesize_exam_code("  Toán (Cao cấp) ", now), "TOÁN_CAO_CẤP_20250201093000");
        assert_eq!(synthesize_exam_code("!!!", now), "EXAM_20250201093000");
    }

    #[test]
    fn long_subject_names_are_truncated() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap();
        let code = synthesize_exam_code(&"x".repeat(300), now);
        assert!(code.chars().count() <= 100);
    }
}
