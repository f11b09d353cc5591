use std::io;
use std::sync::OnceLock;

use derive_more::Display;

/// Packaged fallback profile picture, attached to every created account that
/// did not upload one.
pub const DEFAULT_IMAGE_PATH: &str = "static/images/default-profile.jpg";

static DEFAULT_IMAGE: OnceLock<Box<[u8]>> = OnceLock::new();

#[derive(Debug, Display)]
pub enum ImageError {
    #[display(fmt = "could not read uploaded image: {_0}")]
    UnreadableUpload(io::Error),
    #[display(fmt = "could not read the default profile image: {_0}")]
    MissingDefault(io::Error),
}

impl std::error::Error for ImageError {}

/// Reads the default profile image once and shares the buffer across all
/// create calls. A read failure means the deployment is missing its static
/// assets, not that the request was bad.
pub async fn default_image() -> Result<&'static [u8], ImageError> {
    if let Some(bytes) = DEFAULT_IMAGE.get() {
        return Ok(bytes);
    }
    let bytes = tokio::fs::read(DEFAULT_IMAGE_PATH)
        .await
        .map_err(ImageError::MissingDefault)?;
    Ok(DEFAULT_IMAGE.get_or_init(|| bytes.into_boxed_slice()))
}

/// Create-time image resolution: a non-empty upload is used verbatim, an
/// absent or empty upload falls back to [`default_image`].
pub async fn resolve_upload(upload: Option<Vec<u8>>) -> Result<Vec<u8>, ImageError> {
    match upload {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Ok(default_image().await?.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn default_image_is_never_empty() {
        let bytes = default_image().await.expect("packaged default image readable");
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn default_image_is_read_once_and_shared() {
        let first = default_image().await.unwrap();
        let second = default_image().await.unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn non_empty_upload_is_used_byte_for_byte() {
        let upload = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01];
        let resolved = resolve_upload(Some(upload.clone())).await.unwrap();
        assert_eq!(resolved, upload);
    }

    #[tokio::test]
    async fn absent_or_empty_upload_falls_back_to_default() {
        let fallback = resolve_upload(None).await.unwrap();
        assert_eq!(fallback, default_image().await.unwrap());

        let fallback = resolve_upload(Some(Vec::new())).await.unwrap();
        assert_eq!(fallback, default_image().await.unwrap());
    }
}
