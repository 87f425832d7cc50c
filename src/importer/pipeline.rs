// src/importer/pipeline.rs

//! The two import flows, from uploaded bytes to committed rows.
//!
//! Both validate the upload and the parsed content before opening a transaction,
//! so a rejected document never leaves partial data behind.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use crate::importer::{
    docx::DocxDocument,
    error::ImportError,
    exam_table::parse_question_table,
    images::{ImageStore, attach_images},
    legacy::parse_legacy_paragraphs,
    metadata::extract_metadata,
    persist::{self, ExamTarget},
};

const MAX_EXAM_CODE_CHARS: usize = 100;

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ExamImportRequest {
    pub file: Option<UploadedFile>,
    pub exam_id: Option<i64>,
    pub exam_code: Option<String>,
    pub duration: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ExamImportSummary {
    pub exam_id: i64,
    pub exam_code: String,
    pub subject_id: i64,
    pub questions_imported: usize,
    pub images_uploaded: usize,
}

#[derive(Debug, Default)]
pub struct LegacyImportRequest {
    pub file: Option<UploadedFile>,
    pub exam_id: Option<i64>,
    pub subject_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LegacyImportSummary {
    pub exam_id: i64,
    pub subject_id: i64,
    pub questions_imported: usize,
}

/// Accepts only files named `*.docx` (any case) and opens them.
fn open_upload(file: Option<UploadedFile>) -> Result<DocxDocument, ImportError> {
    let file = file.ok_or(ImportError::MissingFile)?;

    let is_docx = file
        .file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("docx"));
    if !is_docx {
        return Err(ImportError::UnsupportedFileType(file.file_name));
    }

    let document = DocxDocument::open(&file.bytes)?;
    tracing::debug!(
        file = %file.file_name,
        paragraphs = document.paragraphs.len(),
        tables = document.tables.len(),
        images = document.images.len(),
        "Opened document"
    );
    Ok(document)
}

fn check_exam_overrides(req: &ExamImportRequest) -> Result<(Option<String>, Option<i32>), ImportError> {
    let exam_code = req
        .exam_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    if let Some(code) = &exam_code {
        if code.chars().count() > MAX_EXAM_CODE_CHARS {
            return Err(ImportError::InvalidField {
                field: "exam_code",
                reason: format!("must be at most {MAX_EXAM_CODE_CHARS} characters"),
            });
        }
    }

    if let Some(duration) = req.duration {
        if duration <= 0 {
            return Err(ImportError::InvalidField {
                field: "duration",
                reason: "must be a positive number of minutes".to_string(),
            });
        }
    }

    Ok((exam_code, req.duration))
}

/// Imports an exam template: header metadata plus a question table.
///
/// With `exam_id`, the existing exam is updated in place and the new questions are
/// linked to it; otherwise a new exam is created.
pub async fn import_exam(
    pool: &PgPool,
    images: &dyn ImageStore,
    default_duration: i32,
    req: ExamImportRequest,
) -> Result<ExamImportSummary, ImportError> {
    let (exam_code, duration) = check_exam_overrides(&req)?;
    let document = open_upload(req.file)?;

    let metadata = extract_metadata(&document.paragraphs)?;
    let table = document.tables.first().ok_or(ImportError::NoQuestionTable)?;
    let mut questions = parse_question_table(table)?;
    persist::validate_questions(&questions)?;

    tracing::info!(
        subject = %metadata.subject_name,
        announced = metadata.num_questions,
        parsed = questions.len(),
        "Parsed exam template"
    );
    if questions.len() != metadata.num_questions as usize {
        tracing::warn!(
            announced = metadata.num_questions,
            parsed = questions.len(),
            "Question count differs from 'Number of Quiz'"
        );
    }

    if let Some(exam_id) = req.exam_id {
        if !persist::exam_exists(pool, exam_id).await? {
            return Err(ImportError::ExamNotFound(exam_id));
        }
    }

    let images_uploaded = attach_images(&mut questions, &document, images).await;

    let mut tx = pool.begin().await?;

    let subject =
        persist::resolve_subject(&mut *tx, &metadata.subject_name, &metadata.lecturer).await?;
    let target = ExamTarget {
        exam_id: req.exam_id,
        exam_code: exam_code.as_deref(),
        duration,
    };
    let exam = persist::upsert_exam(
        &mut *tx,
        &target,
        &subject,
        metadata.num_questions,
        default_duration,
        Utc::now(),
    )
    .await?;
    let saved_count = persist::save_questions(&mut *tx, &questions, exam.id, subject.id).await?;

    tx.commit().await?;

    tracing::info!(
        exam_id = exam.id,
        exam_code = %exam.exam_code,
        subject_id = subject.id,
        questions = saved_count,
        images = images_uploaded,
        "Exam import committed"
    );

    Ok(ExamImportSummary {
        exam_id: exam.id,
        exam_code: exam.exam_code,
        subject_id: subject.id,
        questions_imported: saved_count,
        images_uploaded,
    })
}

/// Imports the paragraph-only template into an existing exam and subject.
pub async fn import_legacy(
    pool: &PgPool,
    req: LegacyImportRequest,
) -> Result<LegacyImportSummary, ImportError> {
    let exam_id = req.exam_id.ok_or_else(|| ImportError::InvalidField {
        field: "exam_id",
        reason: "is required".to_string(),
    })?;
    let subject_id = req.subject_id.ok_or_else(|| ImportError::InvalidField {
        field: "subject_id",
        reason: "is required".to_string(),
    })?;

    let document = open_upload(req.file)?;
    let questions = parse_legacy_paragraphs(&document.paragraphs)?;
    persist::validate_questions(&questions)?;
    tracing::info!(parsed = questions.len(), "Parsed legacy document");

    let mut tx = pool.begin().await?;

    let subject = persist::find_subject(&mut *tx, subject_id)
        .await?
        .ok_or(ImportError::SubjectNotFound(subject_id))?;
    let exam = persist::find_exam(&mut *tx, exam_id)
        .await?
        .ok_or(ImportError::ExamNotFound(exam_id))?;

    let saved_count = persist::save_questions(&mut *tx, &questions, exam.id, subject.id).await?;

    tx.commit().await?;

    tracing::info!(
        exam_id = exam.id,
        subject_id = subject.id,
        questions = saved_count,
        "Legacy import committed"
    );

    Ok(LegacyImportSummary {
        exam_id: exam.id,
        subject_id: subject.id,
        questions_imported: saved_count,
    })
}
