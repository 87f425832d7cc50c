// src/handlers/import.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    importer::{self, ExamImportRequest, LegacyImportRequest, UploadedFile},
    state::AppState,
};

/// The parts of an import form: the uploaded document plus plain text fields.
#[derive(Debug, Default)]
struct ImportForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl ImportForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ImportForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was picked.
                if !(file_name.is_empty() && bytes.is_empty()) {
                    form.file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else if !name.is_empty() {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Blank means absent; anything else must parse.
    fn integer<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| AppError::BadRequest(format!("{name} must be an integer, got '{raw}'")))
            })
            .transpose()
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart data: {}", err.body_text()))
    }
}

/// `POST /api/exam-import-docx`
///
/// Imports an exam template (metadata paragraphs plus a question table).
pub async fn import_exam_docx(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = ImportForm::read(multipart).await?;
    let request = ExamImportRequest {
        exam_id: form.integer("exam_id")?,
        exam_code: form.text("exam_code"),
        duration: form.integer("duration")?,
        file: form.file,
    };

    let summary = importer::import_exam(
        &state.pool,
        state.images.as_ref(),
        state.config.default_exam_duration,
        request,
    )
    .await
    .map_err(|e| {
        tracing::warn!("Exam import failed: {}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": format!(
                "Imported {} questions into exam '{}'",
                summary.questions_imported, summary.exam_code
            ),
            "exam_id": summary.exam_id,
            "exam_code": summary.exam_code,
            "subject_id": summary.subject_id,
            "questions_imported": summary.questions_imported,
            "images_uploaded": summary.images_uploaded,
        })),
    ))
}

/// `POST /api/import-docx`
///
/// Imports the paragraph-only template into an existing exam and subject.
pub async fn import_legacy_docx(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = ImportForm::read(multipart).await?;
    let request = LegacyImportRequest {
        exam_id: form.integer("exam_id")?,
        subject_id: form.integer("subject_id")?,
        file: form.file,
    };

    let summary = importer::import_legacy(&state.pool, request)
        .await
        .map_err(|e| {
            tracing::warn!("Legacy import failed: {}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Imported {} questions", summary.questions_imported),
        "exam_id": summary.exam_id,
        "questions_imported": summary.questions_imported,
    })))
}
