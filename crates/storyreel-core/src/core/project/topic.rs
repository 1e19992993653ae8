//! Topic summarization from storyboard keywords.

use std::collections::HashMap;

use crate::core::assets::{AssetOrigin, MediaAsset};
use crate::core::storyboard::StoryboardItem;

pub const TOPIC_GENERAL: &str = "General";
pub const TOPIC_AI_GENERATED: &str = "AI Generated Theme";
pub const TOPIC_MIXED_MEDIA: &str = "Mixed Media";

/// Summarizes the storyboard as a short topic line.
///
/// Keywords of every referenced asset are counted (once per scene); the two
/// most frequent are joined with ", ". Ties keep first-seen order.
pub fn summarize_topic(storyboard: &[StoryboardItem], assets: &[MediaAsset]) -> String {
    if storyboard.is_empty() {
        return TOPIC_GENERAL.to_string();
    }

    let referenced: Vec<&MediaAsset> = storyboard
        .iter()
        .filter_map(|item| assets.iter().find(|a| a.id == item.asset_id))
        .collect();

    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for keyword in referenced.iter().flat_map(|a| a.keywords.iter()) {
        let count = counts.entry(keyword.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(keyword.as_str());
        }
        *count += 1;
    }

    if first_seen.is_empty() {
        let any_generated = referenced.iter().any(|a| a.origin == AssetOrigin::Generated);
        return if any_generated {
            TOPIC_AI_GENERATED.to_string()
        } else {
            TOPIC_MIXED_MEDIA.to_string()
        };
    }

    // stable sort keeps first-seen order among equal counts
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
    first_seen.into_iter().take(2).collect::<Vec<_>>().join(", ")
}
