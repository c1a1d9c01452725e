use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Metrics, Platform, TrackedPost, TIMESTAMP_FORMAT};

pub const HEADER: [&str; 6] = ["URL", "Platform", "Views", "Likes", "Shares", "Last Updated"];

/// One CSV row as it sits on disk. Missing counts are empty fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Views")]
    pub views: Option<String>,
    #[serde(rename = "Likes")]
    pub likes: Option<String>,
    #[serde(rename = "Shares")]
    pub shares: Option<String>,
    #[serde(rename = "Last Updated")]
    pub last_updated: String,
}

impl From<&TrackedPost> for PostRecord {
    fn from(post: &TrackedPost) -> Self {
        Self {
            url: post.url.clone(),
            platform: post.platform.label().to_string(),
            views: post.metrics.views.map(|v| v.to_string()),
            likes: post.metrics.likes.map(|v| v.to_string()),
            shares: post.metrics.shares.map(|v| v.to_string()),
            last_updated: post.last_updated_label(),
        }
    }
}

impl TryFrom<PostRecord> for TrackedPost {
    type Error = AppError;

    fn try_from(record: PostRecord) -> Result<Self> {
        let platform = platform_from_label(&record.platform);
        let last_updated = NaiveDateTime::parse_from_str(&record.last_updated, TIMESTAMP_FORMAT)
            .map_err(|e| {
                AppError::MalformedRow(format!(
                    "{}: bad timestamp {:?}: {}",
                    record.url, record.last_updated, e
                ))
            })?;

        Ok(TrackedPost {
            metrics: Metrics {
                views: parse_stored_count(&record.url, record.views.as_deref())?,
                likes: parse_stored_count(&record.url, record.likes.as_deref())?,
                shares: parse_stored_count(&record.url, record.shares.as_deref())?,
            },
            url: record.url,
            platform,
            last_updated,
        })
    }
}

fn platform_from_label(label: &str) -> Platform {
    match label {
        "X" => Platform::X,
        "YouTube" => Platform::YouTube,
        "Facebook" => Platform::Facebook,
        "Instagram" => Platform::Instagram,
        "TikTok" => Platform::TikTok,
        "Reddit" => Platform::Reddit,
        "Unknown" => Platform::Unknown,
        other => {
            tracing::warn!("Unrecognized platform {:?} in store, treating as Unknown", other);
            Platform::Unknown
        }
    }
}

/// Counts may have been written as floats (`1234.0`) by spreadsheet tooling.
fn parse_stored_count(url: &str, cell: Option<&str>) -> Result<Option<u64>> {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    let integral = cell.strip_suffix(".0").unwrap_or(cell);
    integral
        .parse()
        .map(Some)
        .map_err(|_| AppError::MalformedRow(format!("{url}: bad count {cell:?}")))
}
