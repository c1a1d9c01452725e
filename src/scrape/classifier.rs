use crate::models::Platform;

// Checked in order; the first matching substring wins.
const DOMAINS: &[(&str, Platform)] = &[
    ("x.com", Platform::X),
    ("twitter.com", Platform::X),
    ("youtube.com", Platform::YouTube),
    ("youtu.be", Platform::YouTube),
    ("facebook.com", Platform::Facebook),
    ("instagram.com", Platform::Instagram),
    ("tiktok.com", Platform::TikTok),
    ("reddit.com", Platform::Reddit),
];

/// Identify the platform of a post URL by plain substring match on the raw string.
pub fn classify(url: &str) -> Platform {
    DOMAINS
        .iter()
        .find(|(domain, _)| url.contains(domain))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unknown)
}
