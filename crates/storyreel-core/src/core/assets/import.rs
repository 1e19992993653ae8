//! Image upload from the local filesystem.

use std::path::Path;

use tracing::info;

use super::{data_uri, MediaAsset};
use crate::core::{CoreError, CoreResult};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Reads an image file into an uploaded asset with an embedded data URI.
///
/// Keywords default to words from the file name when `keywords` is empty.
pub async fn import_image(path: &Path, keywords: Vec<String>) -> CoreResult<MediaAsset> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::ValidationError(format!("Invalid image path: {:?}", path)))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CoreError::UnsupportedSource(format!(
            "{} is not a supported image file",
            file_name
        )));
    }

    let bytes = tokio::fs::read(path).await?;
    let source = data_uri::encode(data_uri::image_mime_for_path(file_name), &bytes);
    info!("Imported {} ({} bytes)", file_name, bytes.len());
    Ok(MediaAsset::uploaded(source, file_name, keywords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::AssetOrigin;

    #[tokio::test]
    async fn test_import_image_embeds_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sunset_Beach.JPG");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let asset = import_image(&path, vec![]).await.unwrap();
        assert_eq!(asset.origin, AssetOrigin::Uploaded);
        assert_eq!(asset.file_name.as_deref(), Some("Sunset_Beach.JPG"));
        let decoded = data_uri::decode(&asset.base_source).unwrap();
        assert_eq!(decoded.mime_type, "image/jpeg");
        assert_eq!(decoded.bytes, vec![0xFF, 0xD8, 0xFF]);
        assert!(!asset.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(
            import_image(&path, vec![]).await,
            Err(CoreError::UnsupportedSource(_))
        ));
        assert!(import_image(&dir.path().join("missing.png"), vec![]).await.is_err());
    }
}
