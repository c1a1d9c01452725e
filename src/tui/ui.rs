use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::models::Platform;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Post table
            Constraint::Length(1), // Status message
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_post_table(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_hints(frame, app, chunks[3]);

    if app.url_input_active {
        render_url_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let live = if app.live_updates {
        format!(
            "live: every {} min",
            app.refresh_interval().as_secs() / 60
        )
    } else {
        "live: off".to_string()
    };
    let stats = format!(" {} Posts | {}", app.posts.len(), live);

    let block = Block::default()
        .title(" Social Media Post Tracker ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_post_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(["URL", "Platform", "Views", "Likes", "Shares", "Last Updated"])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let rows: Vec<Row> = app
        .posts
        .iter()
        .map(|post| {
            Row::new(vec![
                Cell::from(post.url.as_str()),
                Cell::from(post.platform.label())
                    .style(Style::default().fg(platform_color(post.platform))),
                Cell::from(format_count(post.metrics.views)),
                Cell::from(format_count(post.metrics.likes)),
                Cell::from(format_count(post.metrics.shares)),
                Cell::from(post.last_updated_label())
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(30),
        Constraint::Length(10),
        Constraint::Length(13),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(19),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if !app.posts.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = if app.is_adding {
        ("Adding post...".to_string(), Color::Yellow)
    } else if app.is_refreshing {
        ("Refreshing posts...".to_string(), Color::Yellow)
    } else {
        match &app.status {
            Some(status) if status.is_error => (status.text.clone(), Color::Red),
            Some(status) => (status.text.clone(), Color::Green),
            None => (String::new(), Color::DarkGray),
        }
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

fn render_hints(frame: &mut Frame, app: &App, area: Rect) {
    let hints = if app.live_updates {
        "j/k:nav  a:add  r:refresh  o:open  ?:help  q:quit"
    } else {
        "j/k:nav  a:add  r:refresh  l:live updates  o:open  ?:help  q:quit"
    };

    let paragraph = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_url_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(" Paste Post URL ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    // Clear the area first
    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.url_input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    First / last post",
        "",
        " Actions:",
        "   a        Add a post URL",
        "   r        Refresh all posts now",
        "   l        Start live updates",
        "   o        Open in browser",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn platform_color(platform: Platform) -> Color {
    match platform {
        Platform::X => Color::White,
        Platform::YouTube => Color::Red,
        Platform::Facebook => Color::Blue,
        Platform::Instagram => Color::Magenta,
        Platform::TikTok => Color::Cyan,
        Platform::Reddit => Color::LightRed,
        Platform::Unknown => Color::DarkGray,
    }
}

fn format_count(count: Option<u64>) -> String {
    let Some(count) = count else {
        return "-".to_string();
    };

    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(format_count(None), "-");
        assert_eq!(format_count(Some(0)), "0");
        assert_eq!(format_count(Some(999)), "999");
        assert_eq!(format_count(Some(1000)), "1,000");
        assert_eq!(format_count(Some(1_234_567)), "1,234,567");
    }
}
