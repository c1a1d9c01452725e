use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Metrics, Platform};

static COUNT_RE: OnceLock<Regex> = OnceLock::new();
static LIKE_RE: OnceLock<Regex> = OnceLock::new();
static SHARE_RE: OnceLock<Regex> = OnceLock::new();
static COMMENTS_RE: OnceLock<Regex> = OnceLock::new();

fn cached_re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern is valid"))
}

fn count_re() -> &'static Regex {
    cached_re(&COUNT_RE, r"\d[\d,]*")
}

/// Parse the first run of digits (with thousands separators) in `text`.
pub fn parse_count(text: &str) -> Option<u64> {
    let digits = count_re().find(text)?.as_str().replace(',', "");
    digits.parse().ok()
}

/// Pull engagement counters out of a post page.
///
/// Each metric is looked up on its own: a missing marker only nulls that
/// metric. Platforms without a recipe return an error so callers can tell
/// "not attempted" apart from "nothing found".
pub fn extract(html: &str, platform: Platform) -> Result<Metrics> {
    let document = Html::parse_document(html);

    match platform {
        Platform::X => Ok(extract_x(&document)),
        Platform::YouTube => Ok(extract_youtube(&document)),
        Platform::Facebook => Ok(extract_facebook(&document)),
        Platform::Reddit => Ok(extract_reddit(&document)),
        Platform::Instagram | Platform::TikTok => Err(AppError::ExtractionGap(platform)),
        Platform::Unknown => Err(AppError::UnsupportedPlatform(platform.to_string())),
    }
}

fn extract_x(document: &Html) -> Metrics {
    let count = |css: &str| {
        select_first(document, css).and_then(|el| {
            parse_count(&element_text(el))
                .or_else(|| el.value().attr("aria-label").and_then(parse_count))
        })
    };

    Metrics {
        views: count(r#"span[data-testid="view-count"]"#),
        likes: count(r#"span[data-testid="like"]"#),
        shares: count(r#"span[data-testid="retweet"]"#),
    }
}

fn extract_youtube(document: &Html) -> Metrics {
    let views = select_first(document, "span.view-count")
        .and_then(|el| parse_count(&element_text(el)));

    // The visible like counter is abbreviated ("1.2K"); the label carries the full number.
    let likes = Selector::parse("button[aria-label]").ok().and_then(|selector| {
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("aria-label"))
            .find(|label| label.to_lowercase().contains("like this video"))
            .and_then(parse_count)
    });

    Metrics {
        views,
        likes,
        shares: None,
    }
}

fn extract_facebook(document: &Html) -> Metrics {
    let views = select_first(document, "span.video_view_count")
        .and_then(|el| parse_count(&element_text(el)));

    Metrics {
        views,
        likes: labelled_count(document, "span", cached_re(&LIKE_RE, "(?i)like")),
        shares: labelled_count(document, "span", cached_re(&SHARE_RE, "(?i)share")),
    }
}

fn extract_reddit(document: &Html) -> Metrics {
    let score = select_first(document, r#"div[data-testid="post_score"]"#)
        .and_then(|el| parse_count(&element_text(el)));

    Metrics {
        views: None,
        likes: labelled_count(document, "span", cached_re(&COMMENTS_RE, "(?i)comments")),
        shares: score,
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// Find the first text-only `tag` whose text matches `label_re`, then read the
/// count from its parent element, where the number sits next to the label.
fn labelled_count(document: &Html, tag: &str, label_re: &Regex) -> Option<u64> {
    let selector = Selector::parse(tag).ok()?;

    let marker = document.select(&selector).find(|el| {
        let text_only = !el.children().any(|child| child.value().is_element());
        text_only && label_re.is_match(&element_text(*el))
    })?;

    let parent = marker.parent().and_then(ElementRef::wrap)?;
    parse_count(&element_text(parent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_strips_separators() {
        assert_eq!(parse_count("1,234,567 views"), Some(1_234_567));
        assert_eq!(parse_count("Views: 42"), Some(42));
        assert_eq!(parse_count("no digits here"), None);
        assert_eq!(parse_count(", 7"), Some(7));
        assert_eq!(parse_count("99999999999999999999999"), None);
    }

    #[test]
    fn x_reads_all_three_markers() {
        let html = r#"<html><body>
            <span data-testid="view-count">1,000 views</span>
            <span data-testid="like">50 likes</span>
            <span data-testid="retweet">10 retweets</span>
        </body></html>"#;

        let metrics = extract(html, Platform::X).unwrap();
        assert_eq!(
            metrics,
            Metrics {
                views: Some(1000),
                likes: Some(50),
                shares: Some(10),
            }
        );
    }

    #[test]
    fn x_falls_back_to_aria_label_and_nulls_missing_markers() {
        let html = r#"<span data-testid="like" aria-label="1,234,567 Likes. Like"></span>"#;

        let metrics = extract(html, Platform::X).unwrap();
        assert_eq!(metrics.likes, Some(1_234_567));
        assert_eq!(metrics.views, None);
        assert_eq!(metrics.shares, None);
    }

    #[test]
    fn youtube_reads_likes_from_aria_label() {
        let html = r#"<div>
            <span class="view-count">1,234,567 views</span>
            <button aria-label="Share"></button>
            <button aria-label="like this video along with 8,901 other people">8.9K</button>
        </div>"#;

        let metrics = extract(html, Platform::YouTube).unwrap();
        assert_eq!(metrics.views, Some(1_234_567));
        assert_eq!(metrics.likes, Some(8_901));
        assert_eq!(metrics.shares, None);
    }

    #[test]
    fn facebook_reads_counts_from_marker_parent() {
        let html = r#"<div>
            <span class="video_view_count">1,234,567 views</span>
            <div><span>Like</span> 3,210</div>
            <div><span>Share</span> 45</div>
        </div>"#;

        let metrics = extract(html, Platform::Facebook).unwrap();
        assert_eq!(metrics.views, Some(1_234_567));
        assert_eq!(metrics.likes, Some(3_210));
        assert_eq!(metrics.shares, Some(45));
    }

    #[test]
    fn facebook_without_markers_is_all_null() {
        let metrics = extract("<p>nothing here</p>", Platform::Facebook).unwrap();
        assert!(metrics.is_empty());
    }

    #[test]
    fn label_patterns_are_compiled_once() {
        let html = r#"<div><span>Like</span> 5</div>"#;
        assert_eq!(extract(html, Platform::Facebook).unwrap().likes, Some(5));
        let first = cached_re(&LIKE_RE, "(?i)like") as *const Regex;

        assert_eq!(extract(html, Platform::Facebook).unwrap().likes, Some(5));
        let second = cached_re(&LIKE_RE, "(?i)like") as *const Regex;

        assert!(std::ptr::eq(first, second));
        assert!(LIKE_RE.get().is_some());
    }

    #[test]
    fn reddit_maps_score_to_shares_and_comments_to_likes() {
        let html = r#"<div>
            <div data-testid="post_score">1,234,567</div>
            <a><span>Comments</span> 88</a>
        </div>"#;

        let metrics = extract(html, Platform::Reddit).unwrap();
        assert_eq!(metrics.shares, Some(1_234_567));
        assert_eq!(metrics.likes, Some(88));
        assert_eq!(metrics.views, None);
    }

    #[test]
    fn rendered_platforms_report_a_gap() {
        for platform in [Platform::Instagram, Platform::TikTok] {
            let err = extract("<html></html>", platform).unwrap_err();
            assert!(matches!(err, AppError::ExtractionGap(p) if p == platform));
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = extract("<html></html>", Platform::Unknown).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedPlatform(_)));
    }
}
