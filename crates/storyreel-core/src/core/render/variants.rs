//! Variant Resolver
//!
//! Picks the image a scene displays and exports. Precedence is fixed:
//! relit, then background removed, then enhanced quality, then the base
//! source. A variant only wins when its flag is on AND it has been computed.

use crate::core::assets::{MediaAsset, VariantKind};
use crate::core::storyboard::StoryboardItem;

/// Variant lookup order, highest priority first
pub const VARIANT_PRECEDENCE: [VariantKind; 3] = [
    VariantKind::Relit,
    VariantKind::BackgroundRemoved,
    VariantKind::EnhancedQuality,
];

/// Returns the variant that currently wins for `item`, if any.
pub fn resolved_variant(item: &StoryboardItem, asset: &MediaAsset) -> Option<VariantKind> {
    VARIANT_PRECEDENCE
        .into_iter()
        .find(|kind| item.ai_features.flag(*kind) && asset.has_variant(*kind))
}

/// Returns the image reference to display and export for `item`.
pub fn resolve_image_source<'a>(item: &StoryboardItem, asset: &'a MediaAsset) -> &'a str {
    resolved_variant(item, asset)
        .and_then(|kind| asset.variant(kind))
        .unwrap_or(&asset.base_source)
}
