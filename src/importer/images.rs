// src/importer/images.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{
    config::CloudinaryConfig,
    importer::{ParsedQuestion, docx::DocxDocument},
};

#[derive(Debug, Error)]
pub enum ImageUploadError {
    #[error("image upload is not configured")]
    Disabled,

    #[error("request to image host failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host rejected the upload (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("image host returned an invalid URL '{0}'")]
    InvalidUrl(String),
}

/// Remote asset store that turns raw image bytes into a public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageUploadError>;
}

/// Used when no image host is configured. Every upload fails, so images are omitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn upload(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<String, ImageUploadError> {
        Err(ImageUploadError::Disabled)
    }
}

/// Unsigned uploads to a Cloudinary-compatible endpoint using a fixed upload preset.
#[derive(Debug, Clone)]
pub struct CloudinaryImageStore {
    client: Client,
    endpoint: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryImageStore {
    pub fn new(
        api_base: &str,
        cloud_name: &str,
        upload_preset: &str,
        timeout: Duration,
    ) -> Result<Self, ImageUploadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}/image/upload", api_base.trim_end_matches('/'), cloud_name),
            upload_preset: upload_preset.to_string(),
        })
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageUploadError> {
        let part = Part::bytes(bytes)
            .file_name("question-image")
            .mime_str(content_type)?;
        let form = Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageUploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let payload: UploadResponse = response.json().await?;
        if Url::parse(&payload.secure_url).is_err() {
            return Err(ImageUploadError::InvalidUrl(payload.secure_url));
        }
        Ok(payload.secure_url)
    }
}

/// Builds the configured store, falling back to `DisabledImageStore`.
pub fn image_store_from_config(config: &CloudinaryConfig) -> Arc<dyn ImageStore> {
    let (Some(cloud_name), Some(preset)) = (&config.cloud_name, &config.upload_preset) else {
        tracing::warn!("Image host not configured; imported questions will have no images");
        return Arc::new(DisabledImageStore);
    };

    match CloudinaryImageStore::new(
        &config.api_base,
        cloud_name,
        preset,
        Duration::from_secs(config.timeout_secs),
    ) {
        Ok(store) => {
            tracing::info!("Image upload enabled for cloud '{}'", cloud_name);
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!("Failed to build image upload client: {}", e);
            Arc::new(DisabledImageStore)
        }
    }
}

/// Uploads the image for a question's `[file:reference]` marker.
///
/// Any failure is logged and yields `None`; the question is imported without an image.
pub async fn resolve_image(
    document: &DocxDocument,
    store: &dyn ImageStore,
    reference: &str,
) -> Option<String> {
    // The first embedded image is used whatever `reference` names, so this is only
    // correct for tables with at most one image.
    // TODO: match `reference` against the relationship id once templates name images consistently.
    let Some(image) = document.images.first() else {
        tracing::warn!(reference, "Question references an image but the document embeds none");
        return None;
    };

    match store.upload(image.bytes.clone(), image.content_type).await {
        Ok(url) => {
            tracing::debug!(reference, part = %image.part_name, url = %url, "Uploaded question image");
            Some(url)
        }
        Err(e) => {
            tracing::warn!(
                reference,
                part = %image.part_name,
                error = %e,
                "Image upload failed; importing question without image"
            );
            None
        }
    }
}

/// Resolves images for every question carrying a reference. Returns how many were uploaded.
pub async fn attach_images(
    questions: &mut [ParsedQuestion],
    document: &DocxDocument,
    store: &dyn ImageStore,
) -> usize {
    let mut uploaded = 0;
    for question in questions.iter_mut() {
        if let Some(reference) = question.image_ref.as_deref() {
            question.image_url = resolve_image(document, store, reference).await;
            if question.image_url.is_some() {
                uploaded += 1;
            }
        }
    }
    uploaded
}
