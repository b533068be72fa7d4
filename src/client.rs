//! HTTP client for a remote notes API.
//!
//! Every call validates the batch locally first, so rejected files never
//! leave the machine. The API takes one image per request; the first
//! accepted image of a batch is the one submitted.
//!
//! There is no retry. Without `request_timeout_secs` a call waits as long as
//! the server does.

use crate::config::NotesConfig;
use crate::delivery::{pdf_file_name, write_pdf_atomic};
use crate::error::NotesError;
use crate::pipeline::input::{require_submission, validate_batch, ImageUpload};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct NotesResponse {
    notes: String,
}

/// Error body; `detail` covers servers that answer in FastAPI's shape.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// Client for `/generate-notes` and `/generate-notes-pdf`.
#[derive(Debug, Clone)]
pub struct NotesClient {
    http: reqwest::Client,
    base_url: String,
    max_upload_bytes: usize,
}

impl NotesClient {
    pub fn new(config: &NotesConfig) -> Result<Self, NotesError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| NotesError::Transport {
            url: config.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate a batch and pick the image to submit.
    pub fn select_upload(
        &self,
        uploads: &[ImageUpload],
        topic: &str,
    ) -> Result<ImageUpload, NotesError> {
        if uploads.is_empty() {
            require_submission(&[], topic)?;
        }
        let batch = validate_batch(uploads.iter().cloned(), self.max_upload_bytes);
        for rejected in &batch.rejected {
            warn!("Skipping upload: {}", rejected);
        }
        if batch.accepted.is_empty() {
            if let Some(first) = batch.rejected.into_iter().next() {
                return Err(first.into());
            }
        }
        require_submission(&batch.accepted, topic)?;

        let count = batch.accepted.len();
        let mut accepted = batch.accepted.into_iter();
        let first = accepted
            .next()
            .ok_or_else(|| NotesError::MissingInput("Please upload at least one image.".into()))?;
        if count > 1 {
            info!("{} images accepted; submitting the first ({})", count, first.name);
        }
        Ok(first)
    }

    /// POST the image and topic to `/generate-notes`; returns the HTML notes.
    pub async fn generate_notes(
        &self,
        uploads: &[ImageUpload],
        topic: &str,
    ) -> Result<String, NotesError> {
        let upload = self.select_upload(uploads, topic)?;
        let url = format!("{}/generate-notes", self.base_url);
        let response = self.submit(&url, &upload, topic).await?;

        let body: NotesResponse = response.json().await.map_err(|e| NotesError::Transport {
            url: url.clone(),
            reason: format!("invalid response body: {e}"),
        })?;
        debug!("Received {} bytes of notes", body.notes.len());
        Ok(body.notes)
    }

    /// POST the image and topic to `/generate-notes-pdf`; returns the PDF.
    pub async fn fetch_pdf(
        &self,
        uploads: &[ImageUpload],
        topic: &str,
    ) -> Result<Vec<u8>, NotesError> {
        let upload = self.select_upload(uploads, topic)?;
        let url = format!("{}/generate-notes-pdf", self.base_url);
        let response = self.submit(&url, &upload, topic).await?;
        let status = response.status().as_u16();

        let bytes = response.bytes().await.map_err(|e| NotesError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !bytes.starts_with(b"%PDF") {
            return Err(NotesError::Upstream {
                status,
                message: Some("response is not a PDF".into()),
            });
        }
        Ok(bytes.to_vec())
    }

    /// Fetch the server-rendered PDF and save it as `<topic-slug>-notes.pdf`
    /// in `out_dir`. Returns the saved path.
    pub async fn download_pdf(
        &self,
        uploads: &[ImageUpload],
        topic: &str,
        out_dir: impl AsRef<Path>,
    ) -> Result<PathBuf, NotesError> {
        let bytes = self.fetch_pdf(uploads, topic).await?;
        let path = out_dir.as_ref().join(pdf_file_name(topic));
        write_pdf_atomic(&path, &bytes).await?;
        info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    async fn submit(
        &self,
        url: &str,
        upload: &ImageUpload,
        topic: &str,
    ) -> Result<reqwest::Response, NotesError> {
        let transport = |e: reqwest::Error| NotesError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.name.clone())
            .mime_str(&upload.mime_type)
            .map_err(transport)?;
        let form = Form::new().text("topic", topic.trim().to_string()).part("file", part);

        debug!("POST {} ({}, {} bytes)", url, upload.name, upload.len());
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error.or(b.detail))
            .filter(|m| !m.trim().is_empty());
        warn!("{} answered HTTP {}", url, status);
        Err(NotesError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;

    fn client() -> NotesClient {
        NotesClient::new(&NotesConfig::default()).unwrap()
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload::new(name, "image/png", vec![7; 16])
    }

    #[test]
    fn first_accepted_image_is_selected() {
        let uploads = vec![
            ImageUpload::new("a.gif", "image/gif", vec![1]),
            png("b.png"),
            png("c.png"),
        ];
        let chosen = client().select_upload(&uploads, "Topic").unwrap();
        assert_eq!(chosen.name, "b.png");
    }

    #[test]
    fn all_rejected_reports_first_rejection() {
        let uploads = vec![ImageUpload::new("a.gif", "image/gif", vec![1])];
        let err = client().select_upload(&uploads, "Topic").unwrap_err();
        assert!(matches!(
            err,
            NotesError::Validation(UploadError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn missing_files_or_topic_blocks_submission() {
        let c = client();
        assert!(matches!(
            c.select_upload(&[], "Topic").unwrap_err(),
            NotesError::MissingInput(_)
        ));
        assert!(matches!(
            c.select_upload(&[png("a.png")], " ").unwrap_err(),
            NotesError::MissingInput(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let config = NotesConfig::builder()
            .api_base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let c = NotesClient::new(&config).unwrap();
        let err = c.generate_notes(&[png("a.png")], "Topic").await.unwrap_err();
        assert!(matches!(err, NotesError::Transport { .. }));
    }

    #[tokio::test]
    async fn rejected_batch_never_hits_the_network() {
        // Nothing listens on port 9; a validation error proves no request was sent.
        let config = NotesConfig::builder()
            .api_base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let c = NotesClient::new(&config).unwrap();
        let big = ImageUpload::new("big.png", "image/png", vec![0; 6 * 1024 * 1024]);
        let err = c.fetch_pdf(&[big], "Topic").await.unwrap_err();
        assert!(matches!(err, NotesError::Validation(UploadError::TooLarge { .. })));
    }
}
