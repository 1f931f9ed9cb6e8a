//! Media attachments: a local file or a remote URL, never both.

use crate::error::ValidationError;
use bridge_client::FormPart;
use reqwest::Url;
use std::path::Path;

pub const IMAGE_MIMES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];
pub const STICKER_MIMES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

/// Local uploads above this size are refused before upload.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// File read from disk, ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Read a file and sniff its MIME type from its content.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into());
        Ok(Self::from_bytes(filename, bytes))
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        Self {
            filename: filename.into(),
            mime,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Where the media of a send action comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    LocalFile(LocalFile),
    RemoteUrl(String),
}

/// Rules one action applies to its attachment.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentRules {
    /// Multipart field carrying the file; the URL goes in `{field}_url`.
    pub field: &'static str,
    pub url_field: &'static str,
    pub allowed_mimes: Option<&'static [&'static str]>,
    pub max_size: Option<u64>,
}

impl AttachmentRules {
    pub const IMAGE: Self = Self {
        field: "image",
        url_field: "image_url",
        allowed_mimes: Some(IMAGE_MIMES),
        max_size: None,
    };
    pub const VIDEO: Self = Self {
        field: "video",
        url_field: "video_url",
        allowed_mimes: None,
        max_size: None,
    };
    pub const AUDIO: Self = Self {
        field: "audio",
        url_field: "audio_url",
        allowed_mimes: None,
        max_size: None,
    };
    pub const FILE: Self = Self {
        field: "file",
        url_field: "file_url",
        allowed_mimes: None,
        max_size: Some(MAX_FILE_SIZE),
    };
    pub const STICKER: Self = Self {
        field: "sticker",
        url_field: "sticker_url",
        allowed_mimes: Some(STICKER_MIMES),
        max_size: None,
    };
}

/// The attachment input of a form. Selecting one source replaces the other.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSlot {
    source: Option<MediaSource>,
}

impl AttachmentSlot {
    pub fn attach_file(&mut self, file: LocalFile) {
        self.source = Some(MediaSource::LocalFile(file));
    }

    pub fn attach_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.source = if url.trim().is_empty() {
            None
        } else {
            Some(MediaSource::RemoteUrl(url.trim().to_string()))
        };
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    /// Drop the selected file or URL, releasing any loaded bytes.
    pub fn clear(&mut self) {
        self.source = None;
    }

    pub fn validate(&self, rules: &AttachmentRules) -> Result<(), ValidationError> {
        match &self.source {
            None => Err(ValidationError::MissingAttachment),
            Some(MediaSource::RemoteUrl(url)) => validate_url(rules.url_field, url),
            Some(MediaSource::LocalFile(file)) => {
                if let Some(allowed) = rules.allowed_mimes {
                    if !allowed.contains(&file.mime.as_str()) {
                        return Err(ValidationError::UnsupportedMedia {
                            kind: rules.field,
                            mime: file.mime.clone(),
                            allowed: allowed.join("/"),
                        });
                    }
                }
                if let Some(max) = rules.max_size {
                    if file.size() > max {
                        return Err(ValidationError::FileTooLarge {
                            size: file.size(),
                            max,
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Multipart part for the selected source.
    pub fn to_part(&self, rules: &AttachmentRules) -> Option<FormPart> {
        match self.source.as_ref()? {
            MediaSource::LocalFile(file) => Some(FormPart::file(
                rules.field,
                file.filename.clone(),
                file.mime.clone(),
                file.bytes.clone(),
            )),
            MediaSource::RemoteUrl(url) => Some(FormPart::text(rules.url_field, url.clone())),
        }
    }
}

/// Accept absolute http(s) URLs only.
pub fn validate_url(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ValidationError::InvalidUrl { field }),
    }
}
