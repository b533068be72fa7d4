//! Input validation: decide which uploaded images may be submitted.
//!
//! Validation runs before any network call, both in the client (so rejected
//! files never leave the machine) and in the server (so the OCR collaborator
//! never sees them). A batch is validated file by file: a rejected file is
//! reported on its own and never blocks the valid files next to it.

use crate::error::{NotesError, UploadError};
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// MIME types the notes API accepts.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// One image as submitted by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, deriving its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, NotesError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| NotesError::ImageRead {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime_type = mime_for_path(path);
        debug!("Read {} ({}, {} bytes)", name, mime_type, bytes.len());
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A pasted clipboard entry.
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Outcome of validating several files at once.
#[derive(Debug, Default)]
pub struct BatchValidation {
    pub accepted: Vec<ImageUpload>,
    pub rejected: Vec<UploadError>,
}

/// MIME type for a file name, from its extension.
///
/// Unknown extensions map to `application/octet-stream` so they fail the
/// type check with a readable error instead of being guessed at.
pub fn mime_for_path(path: impl AsRef<Path>) -> String {
    ImageFormat::from_path(path.as_ref())
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
        .to_string()
}

pub fn is_accepted_type(mime_type: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    ACCEPTED_MIME_TYPES.contains(&mime.as_str())
}

/// Validate one upload: type first, then size.
pub fn validate(upload: &ImageUpload, max_bytes: usize) -> Result<(), UploadError> {
    if !is_accepted_type(&upload.mime_type) {
        return Err(UploadError::UnsupportedType {
            name: upload.name.clone(),
            mime_type: upload.mime_type.clone(),
        });
    }
    check_size(upload, max_bytes)
}

fn check_size(upload: &ImageUpload, max_bytes: usize) -> Result<(), UploadError> {
    if upload.len() > max_bytes {
        return Err(UploadError::TooLarge {
            name: upload.name.clone(),
            size: upload.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

/// Validate every file, keeping the valid ones and collecting the rest.
pub fn validate_batch(
    uploads: impl IntoIterator<Item = ImageUpload>,
    max_bytes: usize,
) -> BatchValidation {
    let mut out = BatchValidation::default();
    for upload in uploads {
        match validate(&upload, max_bytes) {
            Ok(()) => out.accepted.push(upload),
            Err(e) => {
                info!("Rejected upload: {}", e);
                out.rejected.push(e);
            }
        }
    }
    out
}

/// Turn pasted clipboard entries into uploads.
///
/// Entries whose MIME type mentions `image` are accepted subject to the same
/// size ceiling as regular uploads; everything else is ignored silently.
pub fn accept_clipboard_items(
    items: impl IntoIterator<Item = ClipboardItem>,
    max_bytes: usize,
) -> BatchValidation {
    let mut out = BatchValidation::default();
    let images = items
        .into_iter()
        .filter(|item| item.mime_type.to_ascii_lowercase().contains("image"));
    for (i, item) in images.enumerate() {
        let ext = ImageFormat::from_mime_type(&item.mime_type)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("img");
        let upload = ImageUpload::new(
            format!("pasted-image-{}.{}", i + 1, ext),
            item.mime_type,
            item.bytes,
        );
        match check_size(&upload, max_bytes) {
            Ok(()) => out.accepted.push(upload),
            Err(e) => out.rejected.push(e),
        }
    }
    out
}

/// Block a submission with no files or no topic.
pub fn require_submission(accepted: &[ImageUpload], topic: &str) -> Result<(), NotesError> {
    if accepted.is_empty() {
        return Err(NotesError::MissingInput(
            "Please upload at least one image.".into(),
        ));
    }
    if topic.trim().is_empty() {
        return Err(NotesError::MissingInput("Please enter a topic.".into()));
    }
    Ok(())
}
