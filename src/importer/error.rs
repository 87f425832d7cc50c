// src/importer/error.rs

use thiserror::Error;

use crate::{error::AppError, importer::docx::DocxError};

/// Every way a document import can fail.
///
/// Metadata and document problems are detected before anything is written;
/// choice inconsistencies are detected before the save transaction begins.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No file provided")]
    MissingFile,

    #[error("Unsupported file '{0}': expected a .docx document")]
    UnsupportedFileType(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] DocxError),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingMetadata(Vec<&'static str>),

    #[error("Number of Quiz must be a positive integer, got '{0}'")]
    InvalidQuestionCount(String),

    #[error("Document contains no question table")]
    NoQuestionTable,

    #[error("Malformed line '{0}': expected 'label: value'")]
    MalformedLine(String),

    #[error("Invalid MARK value '{0}'")]
    InvalidMark(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Exam {0} not found")]
    ExamNotFound(i64),

    #[error("Subject {0} not found")]
    SubjectNotFound(i64),

    #[error("Question '{question}' lists option '{option}' more than once")]
    DuplicateChoice { question: String, option: String },

    #[error("Correct answer '{option}' does not match any choice of question '{question}'")]
    CorrectChoiceNotFound { question: String, option: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::ExamNotFound(_) | ImportError::SubjectNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ImportError::DuplicateChoice { .. } | ImportError::CorrectChoiceNotFound { .. } => {
                AppError::Unprocessable(err.to_string())
            }
            ImportError::InvalidDocument(DocxError::PartTooLarge { .. }) => {
                AppError::PayloadTooLarge(err.to_string())
            }
            ImportError::Database(e) => AppError::from(e),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_parts_map_to_payload_too_large() {
        let err = ImportError::InvalidDocument(DocxError::PartTooLarge {
            part: "word/document.xml".to_string(),
            limit: 1024,
        });

        match AppError::from(err) {
            AppError::PayloadTooLarge(message) => assert_eq!(
                message,
                "Invalid document: part 'word/document.xml' expands beyond 1024 bytes"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overlong_fields_are_bad_requests() {
        let err = ImportError::InvalidField {
            field: "UNIT",
            reason: "must be at most 255 characters, got 300".to_string(),
        };

        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }
}
