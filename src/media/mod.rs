//! Client for the external image storage service.
//!
//! The service is a black box reached over HTTP: uploads return a public URL
//! plus an opaque id, and deletes take that id back. Nothing about stored
//! images is kept locally beyond those two strings.

use log::debug;
use reqwest::{Client, StatusCode, multipart};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const UPLOAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid file type '{0}'; only jpeg, png, webp and gif images are allowed")]
    UnsupportedContentType(String),
    #[error("image service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Which folder an image lands in on the storage side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    BookCover,
    UserImage,
}

impl ImageKind {
    fn folder(self) -> &'static str {
        match self {
            ImageKind::BookCover => "BookCovers",
            ImageKind::UserImage => "UserImages",
        }
    }
}

/// Raw upload payload as read from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub base_url: String,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("BOOKSTORE_MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9200/media".into());
        Self { base_url }
    }
}

#[derive(Debug, Clone)]
pub struct MediaClient {
    base_url: String,
    http: Client,
}

impl MediaClient {
    pub fn new(config: MediaConfig) -> Result<Self, MediaError> {
        let http = Client::builder().timeout(UPLOAD_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Upload an image, returning its public URL and opaque id.
    ///
    /// The public id is minted here (`{folder}/{uuid}`) so a failed request
    /// leaves nothing to clean up on the remote side.
    pub async fn upload(
        &self,
        upload: ImageUpload,
        kind: ImageKind,
    ) -> Result<UploadedImage, MediaError> {
        if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
            return Err(MediaError::UnsupportedContentType(upload.content_type));
        }

        let public_id = format!("{}/{}", kind.folder(), Uuid::new_v4());
        debug!("media: uploading {} bytes as {}", upload.bytes.len(), public_id);

        let part = multipart::Part::bytes(upload.bytes)
            .file_name("upload")
            .mime_str(&upload.content_type)?;
        let form = multipart::Form::new()
            .text("folder", kind.folder())
            .text("public_id", public_id.clone())
            .text("overwrite", "true")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(MediaError::Status { status, body });
        }

        #[derive(serde::Deserialize)]
        struct UploadResponse {
            url: String,
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(UploadedImage {
            url: parsed.url,
            public_id,
        })
    }

    /// Remove a stored image by its opaque id.
    pub async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let response = self
            .http
            .delete(format!("{}/images", self.base_url))
            .query(&[("public_id", public_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(MediaError::Status { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_image_content_types() {
        let client = MediaClient::new(MediaConfig {
            base_url: "http://localhost:1".into(),
        })
        .expect("media client");

        let upload = ImageUpload {
            bytes: b"%PDF-1.4".to_vec(),
            content_type: "application/pdf".into(),
        };

        // Rejected before any network traffic.
        let err = client.upload(upload, ImageKind::BookCover).await.unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedContentType(_)));
    }

    #[test]
    fn folders_by_image_kind() {
        assert_eq!(ImageKind::BookCover.folder(), "BookCovers");
        assert_eq!(ImageKind::UserImage.folder(), "UserImages");
    }
}
