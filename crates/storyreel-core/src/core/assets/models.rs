//! Asset Model Definitions
//!
//! A `MediaAsset` is an image in the media bin. Its base source never
//! changes after creation; AI-derived variants are added to a cache that is
//! never invalidated automatically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::keywords::{filename_keywords, generated_file_name, prompt_keywords};
use crate::core::{new_id, AssetId};

/// Asset type enumeration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    #[default]
    Image,
}

/// Where an asset came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetOrigin {
    Uploaded,
    Generated,
}

/// AI-derived image variants cached on an asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariantKind {
    BackgroundRemoved,
    Relit,
    EnhancedQuality,
}

impl VariantKind {
    pub const ALL: [VariantKind; 3] = [
        VariantKind::BackgroundRemoved,
        VariantKind::Relit,
        VariantKind::EnhancedQuality,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VariantKind::BackgroundRemoved => "background removal",
            VariantKind::Relit => "relighting",
            VariantKind::EnhancedQuality => "quality enhancement",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Media asset in the bin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Unique identifier (ULID)
    pub id: AssetId,
    pub kind: AssetKind,
    /// Canonical image reference (data URI, URL or local path)
    pub base_source: String,
    /// Derived images keyed by variant
    #[serde(default)]
    pub variant_sources: BTreeMap<VariantKind, String>,
    pub origin: AssetOrigin,
    /// Lowercase keywords, duplicates allowed
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Generation prompt, or the file name for uploads
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Creation time (RFC 3339)
    pub created_at: String,
}

impl MediaAsset {
    /// Creates an asset from a user upload.
    ///
    /// Keywords default to the file stem when none are supplied.
    pub fn uploaded(base_source: impl Into<String>, file_name: &str, keywords: Vec<String>) -> Self {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        let keywords = if keywords.is_empty() {
            filename_keywords(file_name)
        } else {
            keywords
        };

        Self {
            id: new_id(),
            kind: AssetKind::Image,
            base_source: base_source.into(),
            variant_sources: BTreeMap::new(),
            origin: AssetOrigin::Uploaded,
            keywords,
            prompt: file_name.to_string(),
            file_name: Some(file_name.to_string()),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an asset from an AI-generated image.
    ///
    /// `part` is the zero-based scene index and `parts` the number of scenes
    /// produced from the same request.
    pub fn generated(base_source: impl Into<String>, prompt: &str, part: usize, parts: usize) -> Self {
        Self {
            id: new_id(),
            kind: AssetKind::Image,
            base_source: base_source.into(),
            variant_sources: BTreeMap::new(),
            origin: AssetOrigin::Generated,
            keywords: prompt_keywords(prompt),
            prompt: prompt.to_string(),
            file_name: Some(generated_file_name(prompt, part, parts)),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn variant(&self, kind: VariantKind) -> Option<&str> {
        self.variant_sources.get(&kind).map(String::as_str)
    }

    pub fn has_variant(&self, kind: VariantKind) -> bool {
        self.variant_sources.contains_key(&kind)
    }

    /// Stores a computed variant. An existing entry is kept (cache entries
    /// are stable once written); returns whether the value was inserted.
    pub fn cache_variant(&mut self, kind: VariantKind, source: String) -> bool {
        if self.variant_sources.contains_key(&kind) {
            return false;
        }
        self.variant_sources.insert(kind, source);
        true
    }

    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.id)
    }
}
