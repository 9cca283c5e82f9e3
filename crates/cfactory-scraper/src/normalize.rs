//! Maps raw Apify dataset rows into [`DiscoveredProfile`] and [`HarvestedPost`].
//!
//! Actor output varies between actor versions, so rows are read as loose JSON
//! and every field is optional. Post metadata is reduced to the keys the
//! scoring prompt reads (`likes`, `views`, `comments`, `author`, `type`) plus
//! the media links (`video_url`, `thumbnail_url`), with the untouched row kept
//! under `raw`.

use serde_json::{json, Value};

use crate::types::{DiscoveredProfile, HarvestedPost};

pub const PLATFORM_INSTAGRAM: &str = "instagram";

#[must_use]
pub fn normalize_profile(row: &Value) -> DiscoveredProfile {
    DiscoveredProfile {
        username: non_empty_str(row, "username"),
        followers: first_int(row, &["followersCount", "followers"]),
    }
}

#[must_use]
pub fn normalize_post(row: Value) -> HarvestedPost {
    let url = non_empty_str(&row, "url");
    let caption = row
        .get("caption")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let metadata = json!({
        "likes": first_int(&row, &["likesCount", "likes"]).unwrap_or(0),
        "views": first_int(&row, &["videoViewCount", "videoPlayCount", "views"]).unwrap_or(0),
        "comments": first_int(&row, &["commentsCount", "comments"]).unwrap_or(0),
        "author": non_empty_str(&row, "ownerUsername"),
        "type": non_empty_str(&row, "type"),
        "video_url": first_str(&row, &["videoUrl", "video_url"]),
        "thumbnail_url": first_str(&row, &["displayUrl", "thumbnailUrl", "thumbnail_url"]),
        "raw": row,
    });

    HarvestedPost {
        url,
        platform: PLATFORM_INSTAGRAM.to_string(),
        caption,
        metadata,
    }
}

fn non_empty_str(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn first_str(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| non_empty_str(row, key))
}

/// Returns the first key that holds an integer (or a float, truncated).
#[allow(clippy::cast_possible_truncation)]
fn first_int(row: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| {
        let value = row.get(*key)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
