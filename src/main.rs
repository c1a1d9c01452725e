use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crossterm::event::KeyEventKind;
use ratatui::prelude::*;

mod app;
mod config;
mod error;
mod models;
mod scrape;
mod store;
mod tracker;
mod tui;

use app::{build_tracker, App};
use config::Config;
use error::Result;
use models::TrackedPost;
use tracker::RefreshReport;
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Headless modes: --add <url>, --list, --refresh, --watch
    match args.get(1).map(String::as_str) {
        Some("--add") => {
            let Some(url) = args.get(2) else {
                return Err(anyhow::anyhow!("Usage: post-tracker --add <url>").into());
            };
            let tracker = build_tracker(&config).await?;
            let report = tracker.add(url.trim()).await?;
            match report.issue {
                None => println!("Post added!"),
                Some(issue) => println!("Post added, but {}", issue),
            }
            print_posts(&[report.post]);
            return Ok(());
        }
        Some("--list") => {
            let tracker = build_tracker(&config).await?;
            print_posts(&tracker.list().await?);
            return Ok(());
        }
        Some("--refresh") => {
            let tracker = build_tracker(&config).await?;
            let report = tracker.refresh_all().await?;
            print_report(&report);
            return Ok(());
        }
        Some("--watch") => {
            let tracker = build_tracker(&config).await?;
            println!(
                "Updating every {} minutes...",
                config.refresh_interval_minutes
            );
            tracker
                .run_forever(config.refresh_interval(), |report| print_report(&report))
                .await?;
            return Ok(());
        }
        _ => {}
    }

    // Initialize app
    let mut app = App::new(&config).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Pick up finished adds and refresh passes
        app.poll_events().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) =
                        handle_key_event(key, app.url_input_active, app.show_help)
                    {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

fn print_posts(posts: &[TrackedPost]) {
    let cell = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

    println!("URL\tPlatform\tViews\tLikes\tShares\tLast Updated");
    for post in posts {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            post.url,
            post.platform,
            cell(post.metrics.views),
            cell(post.metrics.likes),
            cell(post.metrics.shares),
            post.last_updated_label()
        );
    }
}

fn print_report(report: &RefreshReport) {
    println!(
        "Refreshed {} posts at {}",
        report.refreshed,
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
    for (url, issue) in &report.issues {
        eprintln!("Error scraping {}: {}", url, issue);
    }
}
