use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, BackendHealth, Focus, GENERATION_ERROR_MESSAGE};
use crate::theme::Theme;

pub const HEADING: &str = "Shakespeare Sentence Simulator";
pub const SUBTITLE: &str = "Pick a word and let the Bard finish the sentence";
pub const IDLE_CAPTION: &str = "Generate";
pub const BUSY_CAPTION: &str = "Generating...";
pub const RESULT_TITLE: &str = " Generated ";

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the palette; only the first call has any effect
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let mut constraints = vec![
        Constraint::Length(1), // Info line
        Constraint::Length(3), // Heading + subtitle
        Constraint::Length(3), // Seed word input
        Constraint::Length(3), // Button
    ];
    let show_result = !app.generated_text.is_empty();
    if show_result {
        constraints.push(Constraint::Min(3)); // Result block
    } else {
        constraints.push(Constraint::Min(0));
    }
    constraints.push(Constraint::Length(1)); // Footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_heading(f, chunks[1]);
    draw_input(f, app, chunks[2]);
    draw_button(f, app, chunks[3]);
    if show_result {
        draw_result(f, app, chunks[4]);
    }
    draw_footer(f, app, chunks[5]);
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > backend health > ready
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(accent())))
    } else {
        match app.backend_health {
            BackendHealth::Online(ref message) => Line::from(vec![
                Span::styled("● ", Style::default().fg(success())),
                Span::styled(app.backend_url(), Style::default().fg(text_dim())),
                Span::styled(" │ ", Style::default().fg(inactive())),
                Span::styled(message.as_str(), Style::default().fg(text_dim())),
            ]),
            BackendHealth::Offline => Line::from(vec![
                Span::styled("● ", Style::default().fg(danger())),
                Span::styled(app.backend_url(), Style::default().fg(text_dim())),
                Span::styled(" │ ", Style::default().fg(inactive())),
                Span::styled("backend unreachable", Style::default().fg(danger())),
            ]),
            BackendHealth::Unknown => {
                Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
            }
        }
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_heading(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            HEADING,
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(text_dim()))),
    ];

    let heading = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(heading, area);
}

fn focus_styles(focused: bool) -> (Style, Style) {
    if focused {
        (
            Style::default().fg(accent()),
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        )
    } else {
        (Style::default().fg(inactive()), Style::default().fg(inactive()))
    }
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input;
    let (border_style, title_style) = focus_styles(focused);

    let block = Block::default()
        .title(Span::styled(" Seed word ", title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let input = Paragraph::new(Span::styled(app.seed_word.as_str(), Style::default().fg(text())))
        .block(block);
    f.render_widget(input, area);

    if focused && area.width > 2 && area.height > 2 {
        let typed = u16::try_from(Span::raw(app.seed_word.as_str()).width()).unwrap_or(u16::MAX);
        let x = area.x.saturating_add(1).saturating_add(typed).min(area.x + area.width - 2);
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_button(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Button;
    let (mut border_style, _) = focus_styles(focused);

    // Disabled while a request is in flight
    let (caption, caption_style) = if app.loading {
        border_style = Style::default().fg(inactive());
        (BUSY_CAPTION, Style::default().fg(text_dim()).add_modifier(Modifier::ITALIC))
    } else if focused {
        (IDLE_CAPTION, Style::default().fg(accent()).add_modifier(Modifier::BOLD | Modifier::REVERSED))
    } else {
        (IDLE_CAPTION, Style::default().fg(accent()).add_modifier(Modifier::BOLD))
    };

    let button = Paragraph::new(Line::from(Span::styled(format!(" {} ", caption), caption_style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border_style));

    f.render_widget(button, area);
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let color = if app.generated_text == GENERATION_ERROR_MESSAGE { danger() } else { success() };

    let block = Block::default()
        .title(Span::styled(RESULT_TITLE, Style::default().fg(color).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let result = Paragraph::new(app.generated_text.as_str())
        .style(Style::default().fg(text()))
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(result, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.focus {
        Focus::Input => vec![
            ("Enter", "Generate"),
            ("^U", "Clear"),
            ("Tab", "Button"),
            ("Esc", "Quit"),
        ],
        Focus::Button => vec![
            ("Space", "Generate"),
            ("Tab", "Input"),
            ("Esc", "Quit"),
        ],
    };

    let hint_spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}
