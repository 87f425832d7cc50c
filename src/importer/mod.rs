// src/importer/mod.rs

//! Word-document importer: turns exam templates into questions, choices and
//! correct answers attached to an exam.

pub mod docx;
pub mod error;
pub mod exam_table;
pub mod images;
pub mod legacy;
pub mod metadata;
pub mod persist;
pub mod pipeline;

pub use error::ImportError;
pub use pipeline::{
    ExamImportRequest, ExamImportSummary, LegacyImportRequest, LegacyImportSummary, UploadedFile,
    import_exam, import_legacy,
};

/// One choice as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedChoice {
    /// Option letter exactly as found ("a" in the table template, "A" in the legacy one).
    pub option: String,
    pub text: String,
}

/// One question as reconstructed by a parser, before anything is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuestion {
    pub text: String,
    /// Token from an inline `[file:...]` marker, if the question had one.
    pub image_ref: Option<String>,
    /// Public URL once the image has been uploaded.
    pub image_url: Option<String>,
    pub choices: Vec<ParsedChoice>,
    pub correct_choice: Option<String>,
    pub mark: Option<f64>,
    pub unit: Option<String>,
    pub mix_choices: bool,
}

impl ParsedQuestion {
    /// A question with no image, mark, unit or shuffle flag.
    pub fn plain(text: String, choices: Vec<ParsedChoice>, correct_choice: Option<String>) -> Self {
        Self {
            text,
            image_ref: None,
            image_url: None,
            choices,
            correct_choice,
            mark: None,
            unit: None,
            mix_choices: false,
        }
    }
}
