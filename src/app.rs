use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::Result;
use crate::models::TrackedPost;
use crate::scrape::PageFetcher;
use crate::store::PostStore;
use crate::tracker::{AddReport, RefreshReport, Tracker};
use crate::tui::AppAction;

// Results from background tracker work, drained by `poll_events`.
pub enum TrackerEvent {
    Added(std::result::Result<AddReport, String>),
    // Manual `r` pass
    Refreshed(std::result::Result<RefreshReport, String>),
    // Background loop
    LivePass(RefreshReport),
    LiveStopped(String),
}

pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    // Data
    pub posts: Vec<TrackedPost>,

    // UI State
    pub selected_index: usize,
    pub show_help: bool,
    pub url_input_active: bool,
    pub url_input: String,
    pub status: Option<StatusMessage>,

    // Async state
    pub is_adding: bool,
    pub is_refreshing: bool,
    pub live_updates: bool,
    refresh_interval: Duration,
    event_rx: mpsc::UnboundedReceiver<TrackerEvent>,
    event_tx: mpsc::UnboundedSender<TrackerEvent>,

    // Services
    tracker: Arc<Tracker>,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let tracker = Arc::new(build_tracker(config).await?);
        let posts = tracker.list().await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Self {
            posts,
            selected_index: 0,
            show_help: false,
            url_input_active: false,
            url_input: String::new(),
            status: None,
            is_adding: false,
            is_refreshing: false,
            live_updates: false,
            refresh_interval: config.refresh_interval(),
            event_rx,
            event_tx,
            tracker,
        })
    }

    pub fn selected_post(&self) -> Option<&TrackedPost> {
        self.posts.get(self.selected_index)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                if self.selected_index + 1 < self.posts.len() {
                    self.selected_index += 1;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.posts.len().saturating_sub(1);
            }

            AppAction::AddPost => {
                self.url_input_active = true;
                self.url_input.clear();
            }

            AppAction::RefreshNow => {
                self.refresh_now();
            }

            AppAction::StartLiveUpdates => {
                self.start_live_updates();
            }

            AppAction::OpenInBrowser => {
                if let Some(post) = self.selected_post() {
                    let url = post.url.clone();
                    let _ = open::that(&url);
                }
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::UrlInputChar(c) => {
                self.url_input.push(c);
            }

            AppAction::UrlInputBackspace => {
                self.url_input.pop();
            }

            AppAction::UrlInputConfirm => {
                let url = std::mem::take(&mut self.url_input);
                self.url_input_active = false;
                self.add_post(url);
            }

            AppAction::UrlInputCancel => {
                self.url_input_active = false;
                self.url_input.clear();
            }
        }

        Ok(false)
    }

    fn add_post(&mut self, url: String) {
        let url = url.trim().to_string();
        if url.is_empty() {
            return;
        }

        self.is_adding = true;
        let tracker = Arc::clone(&self.tracker);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = tracker.add(&url).await.map_err(|e| e.to_string());
            let _ = tx.send(TrackerEvent::Added(result));
        });
    }

    fn refresh_now(&mut self) {
        if self.is_refreshing {
            return;
        }

        self.is_refreshing = true;
        let tracker = Arc::clone(&self.tracker);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = tracker.refresh_all().await.map_err(|e| e.to_string());
            let _ = tx.send(TrackerEvent::Refreshed(result));
        });
    }

    /// Start the background refresh loop. Once running it stays up for the
    /// rest of the session.
    pub fn start_live_updates(&mut self) {
        if self.live_updates {
            return;
        }

        self.live_updates = true;
        self.set_status(
            format!(
                "Updating every {} minutes...",
                self.refresh_interval.as_secs() / 60
            ),
            false,
        );

        let tracker = Arc::clone(&self.tracker);
        let tx = self.event_tx.clone();
        let interval = self.refresh_interval;

        tokio::spawn(async move {
            let pass_tx = tx.clone();
            let result = tracker
                .run_forever(interval, move |report| {
                    let _ = pass_tx.send(TrackerEvent::LivePass(report));
                })
                .await;

            if let Err(e) = result {
                tracing::error!("Live updates stopped: {}", e);
                let _ = tx.send(TrackerEvent::LiveStopped(e.to_string()));
            }
        });
    }

    /// Drain finished background work (non-blocking)
    pub async fn poll_events(&mut self) -> Result<()> {
        let mut changed = false;

        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                TrackerEvent::Added(result) => {
                    self.is_adding = false;
                    match result {
                        Ok(report) => {
                            changed = true;
                            match report.issue {
                                None => self.set_status("Post added!".to_string(), false),
                                Some(issue) => self.set_status(
                                    format!("Post added, but {}", issue),
                                    true,
                                ),
                            }
                        }
                        Err(e) => self.set_status(e, true),
                    }
                }
                TrackerEvent::Refreshed(result) => {
                    self.is_refreshing = false;
                    match result {
                        Ok(report) => {
                            changed = true;
                            let (text, is_error) = describe_refresh(&report);
                            self.set_status(text, is_error);
                        }
                        Err(e) => {
                            self.set_status(format!("Refresh failed: {}", e), true);
                        }
                    }
                }
                TrackerEvent::LivePass(report) => {
                    changed = true;
                    let (text, is_error) = describe_refresh(&report);
                    self.set_status(text, is_error);
                }
                TrackerEvent::LiveStopped(e) => {
                    self.live_updates = false;
                    self.set_status(format!("Live updates stopped: {}", e), true);
                }
            }
        }

        if changed {
            self.reload_posts().await?;
        }

        Ok(())
    }

    async fn reload_posts(&mut self) -> Result<()> {
        self.posts = self.tracker.list().await?;
        if self.selected_index >= self.posts.len() {
            self.selected_index = self.posts.len().saturating_sub(1);
        }
        Ok(())
    }

    fn set_status(&mut self, text: String, is_error: bool) {
        self.status = Some(StatusMessage { text, is_error });
    }
}

pub async fn build_tracker(config: &Config) -> Result<Tracker> {
    let store = PostStore::open(&config.store_path).await?;
    tracing::debug!("Using post store {}", store.path().display());
    let fetcher = PageFetcher::new(config)?;
    Ok(Tracker::new(store, fetcher))
}

fn describe_refresh(report: &RefreshReport) -> (String, bool) {
    let stamp = report.finished_at.format("%H:%M:%S");
    match report.issues.first() {
        None => (format!("Refreshed {} posts at {}", report.refreshed, stamp), false),
        Some((url, issue)) => (
            format!(
                "Refreshed {} posts at {} with {} issue(s); first: {}: {}",
                report.refreshed,
                stamp,
                report.issues.len(),
                url,
                issue
            ),
            true,
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    use super::*;
    use crate::models::Platform;
    use crate::tracker::RowIssue;

    fn report(issues: Vec<(String, RowIssue)>) -> RefreshReport {
        RefreshReport {
            refreshed: 3,
            issues,
            finished_at: NaiveDateTime::parse_from_str("2024-06-01 12:00:05", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn clean_refresh_is_not_an_error() {
        let (text, is_error) = describe_refresh(&report(vec![]));
        assert_eq!(text, "Refreshed 3 posts at 12:00:05");
        assert!(!is_error);
    }

    #[test]
    fn refresh_issues_are_surfaced() {
        let (text, is_error) = describe_refresh(&report(vec![(
            "https://tiktok.com/@a/video/1".to_string(),
            RowIssue::ExtractionGap(Platform::TikTok),
        )]));
        assert!(is_error);
        assert!(text.contains("1 issue(s)"));
        assert!(text.contains("no extraction recipe for TikTok"));
    }

    async fn test_app(dir: &TempDir) -> App {
        let config = Config {
            store_path: dir.path().join("posts.csv").to_string_lossy().to_string(),
            refresh_interval_minutes: 10,
            request_timeout_secs: 10,
            user_agent: "post-tracker-test".to_string(),
        };
        App::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn manual_refresh_failure_keeps_live_updates_running() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        app.start_live_updates();
        app.event_tx
            .send(TrackerEvent::Refreshed(Err("disk full".to_string())))
            .unwrap();
        app.poll_events().await.unwrap();

        assert!(app.live_updates);
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[tokio::test]
    async fn live_pass_does_not_end_manual_refresh() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        app.is_refreshing = true;
        app.event_tx
            .send(TrackerEvent::LivePass(report(vec![])))
            .unwrap();
        app.poll_events().await.unwrap();

        assert!(app.is_refreshing);
    }

    #[tokio::test]
    async fn live_stopped_allows_restart() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        app.live_updates = true;
        app.event_tx
            .send(TrackerEvent::LiveStopped("store unreadable".to_string()))
            .unwrap();
        app.poll_events().await.unwrap();

        assert!(!app.live_updates);
        assert!(!app.is_refreshing);
    }
}
