use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};

/// Timestamp layout used in the store and the UI.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    X,
    YouTube,
    Facebook,
    Instagram,
    TikTok,
    Reddit,
    Unknown,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::X => "X",
            Platform::YouTube => "YouTube",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::Reddit => "Reddit",
            Platform::Unknown => "Unknown",
        }
    }

    /// Instagram and TikTok only render their counters client-side.
    pub fn has_recipe(&self) -> bool {
        matches!(
            self,
            Platform::X | Platform::YouTube | Platform::Facebook | Platform::Reddit
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Engagement counters scraped from a post page.
///
/// For Reddit posts `shares` holds the vote score and `likes` the comment
/// count; the columns are kept so the store layout stays platform-agnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub shares: Option<u64>,
}

impl Metrics {
    pub fn is_empty(&self) -> bool {
        self.views.is_none() && self.likes.is_none() && self.shares.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPost {
    pub url: String,
    pub platform: Platform,
    pub metrics: Metrics,
    pub last_updated: NaiveDateTime,
}

impl TrackedPost {
    pub fn new(url: String, platform: Platform, metrics: Metrics) -> Self {
        Self {
            url,
            platform,
            metrics,
            last_updated: now(),
        }
    }

    pub fn last_updated_label(&self) -> String {
        self.last_updated.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Local wall-clock time truncated to whole seconds, matching what the store can hold.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
