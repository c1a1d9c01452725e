use std::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::error::{AppError, Result};
use crate::models::{now, Metrics, Platform, TrackedPost};
use crate::scrape::{classify, extract, DocumentSource, PageFetcher};
use crate::store::PostStore;

/// Per-row problem hit while scraping. Never aborts a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowIssue {
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    #[error("no extraction recipe for {0}")]
    ExtractionGap(Platform),
}

#[derive(Debug, Clone)]
pub struct AddReport {
    pub post: TrackedPost,
    pub issue: Option<RowIssue>,
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub issues: Vec<(String, RowIssue)>,
    pub finished_at: NaiveDateTime,
}

pub struct Tracker<S = PageFetcher> {
    store: PostStore,
    source: S,
}

impl<S: DocumentSource> Tracker<S> {
    pub fn new(store: PostStore, source: S) -> Self {
        Self { store, source }
    }

    /// Track `url` exactly as given; callers trim operator input.
    pub async fn add(&self, url: &str) -> Result<AddReport> {
        let platform = classify(url);
        if platform == Platform::Unknown {
            return Err(AppError::UnsupportedPlatform(url.to_string()));
        }

        let (metrics, issue) = match self.scrape(url, platform).await {
            Ok(metrics) => (metrics, None),
            Err(issue) => (Metrics::default(), Some(issue)),
        };

        let post = TrackedPost::new(url.to_string(), platform, metrics);
        self.store.append(post.clone()).await?;
        tracing::info!("Tracking {} post {}", platform, url);

        Ok(AddReport { post, issue })
    }

    pub async fn list(&self) -> Result<Vec<TrackedPost>> {
        self.store.load().await
    }

    /// Re-scrape every stored post, one at a time, and write the results back.
    pub async fn refresh_all(&self) -> Result<RefreshReport> {
        let snapshot = self.store.load().await?;

        let mut updates = Vec::with_capacity(snapshot.len());
        let mut issues = Vec::new();

        for post in &snapshot {
            let update = match self.scrape(&post.url, post.platform).await {
                Ok(metrics) => Some(metrics),
                Err(issue) => {
                    let update = match issue {
                        RowIssue::FetchFailure(_) => Some(Metrics::default()),
                        RowIssue::ExtractionGap(_) => None,
                    };
                    issues.push((post.url.clone(), issue));
                    update
                }
            };
            updates.push((update, now()));
        }

        // Rows are only ever appended, so the snapshot is a prefix of the
        // current store; anything added mid-pass is left alone.
        let refreshed = self
            .store
            .modify(move |posts| {
                for (post, (metrics, stamp)) in posts.iter_mut().zip(updates) {
                    if let Some(metrics) = metrics {
                        post.metrics = metrics;
                    }
                    post.last_updated = stamp;
                }
                snapshot.len().min(posts.len())
            })
            .await?;

        tracing::info!(
            "Refreshed {} posts ({} with issues)",
            refreshed,
            issues.len()
        );

        Ok(RefreshReport {
            refreshed,
            issues,
            finished_at: now(),
        })
    }

    /// Refresh, report, sleep, forever. Only a store failure ends the loop.
    pub async fn run_forever<F>(&self, interval: Duration, mut on_pass: F) -> Result<()>
    where
        F: FnMut(RefreshReport) + Send,
    {
        loop {
            let report = self.refresh_all().await?;
            on_pass(report);
            tokio::time::sleep(interval).await;
        }
    }

    async fn scrape(&self, url: &str, platform: Platform) -> std::result::Result<Metrics, RowIssue> {
        if !platform.has_recipe() {
            tracing::warn!("Skipping {}: no extraction recipe for {}", url, platform);
            return Err(RowIssue::ExtractionGap(platform));
        }

        let html = match self.source.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Error scraping {}: {}", url, e);
                let reason = match e {
                    AppError::FetchFailure { reason, .. } => reason,
                    other => other.to_string(),
                };
                return Err(RowIssue::FetchFailure(reason));
            }
        };

        let metrics = extract(&html, platform).map_err(|_| RowIssue::ExtractionGap(platform))?;
        if metrics.is_empty() {
            tracing::debug!("No counters found on {}", url);
        } else {
            tracing::debug!("Scraped {}: {:?}", url, metrics);
        }
        Ok(metrics)
    }
}
