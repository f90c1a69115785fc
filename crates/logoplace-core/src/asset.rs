//! Logo image assets and their storage.
//!
//! Every placement owns one asset reference. The bytes live in an
//! [`AssetStore`]; the session releases an asset once no configuration
//! snapshot (active or in history) refers to it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a stored asset.
pub type AssetId = Uuid;

/// Image format of a logo asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Svg,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        let head = &data[..data.len().min(256)];
        let text = String::from_utf8_lossy(head);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
            return Some(ImageFormat::Svg);
        }

        None
    }
}

/// Asset registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("image data is empty")]
    Empty,
    #[error("unsupported image format")]
    UnsupportedFormat,
}

/// Reference from a placement to its image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    id: AssetId,
    format: ImageFormat,
}

impl AssetRef {
    pub(crate) fn new(format: ImageFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            format,
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Stored image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl Asset {
    /// Encode the bytes as a `data:` URL for renderers.
    pub fn data_url(&self) -> String {
        use base64::{Engine, engine::general_purpose::STANDARD};
        format!("data:{};base64,{}", self.format.mime_type(), STANDARD.encode(&self.bytes))
    }

    /// Size of the image data in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Trait for asset storage backends.
pub trait AssetStore {
    /// Store image bytes and return a reference to them.
    fn insert(&mut self, bytes: Vec<u8>) -> Result<AssetRef, AssetError>;

    /// Look up stored bytes.
    fn get(&self, id: AssetId) -> Option<&Asset>;

    /// Release stored bytes. Returns false if the asset was unknown.
    fn release(&mut self, id: AssetId) -> bool;

    /// IDs of all stored assets.
    fn ids(&self) -> Vec<AssetId>;

    fn len(&self) -> usize {
        self.ids().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory asset storage.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    assets: HashMap<AssetId, Asset>,
}

impl MemoryAssets {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetStore for MemoryAssets {
    fn insert(&mut self, bytes: Vec<u8>) -> Result<AssetRef, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::Empty);
        }
        let format = ImageFormat::from_magic_bytes(&bytes).ok_or(AssetError::UnsupportedFormat)?;
        let asset_ref = AssetRef::new(format);
        self.assets.insert(asset_ref.id(), Asset { format, bytes });
        Ok(asset_ref)
    }

    fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    fn release(&mut self, id: AssetId) -> bool {
        self.assets.remove(&id).is_some()
    }

    fn ids(&self) -> Vec<AssetId> {
        self.assets.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.assets.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// PNG signature followed by padding; enough for format detection.
    pub(crate) fn png_bytes() -> Vec<u8> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&[0u8; 8]);
        data
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_magic_bytes(&png_bytes()), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(
            ImageFormat::from_magic_bytes(b"<?xml version=\"1.0\"?><svg xmlns=\"\"></svg>"),
            Some(ImageFormat::Svg)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
    }

    #[test]
    fn test_insert_and_release() {
        let mut store = MemoryAssets::new();
        let asset_ref = store.insert(png_bytes()).unwrap();
        assert_eq!(asset_ref.format(), ImageFormat::Png);
        assert_eq!(store.len(), 1);
        assert!(store.get(asset_ref.id()).is_some());

        assert!(store.release(asset_ref.id()));
        assert!(!store.release(asset_ref.id()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_rejects_bad_data() {
        let mut store = MemoryAssets::new();
        assert_eq!(store.insert(Vec::new()), Err(AssetError::Empty));
        assert_eq!(store.insert(b"plain text".to_vec()), Err(AssetError::UnsupportedFormat));
        assert!(store.is_empty());
    }

    #[test]
    fn test_data_url() {
        let asset = Asset {
            format: ImageFormat::Png,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(asset.data_url(), "data:image/png;base64,AQID");
    }
}
