use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, FormField, Tab};

use super::styles;
use super::tabs::{students, teachers};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::SigningIn => render_sign_in_overlay(frame, app),
        AppState::AddingTeacher => render_add_teacher_overlay(frame, app),
        AppState::AddingStudent => render_add_student_overlay(frame, app),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Caseload";
    let user = match app.current_user() {
        Some(user) => format!("{}  ", user),
        None => "not signed in  ".to_string(),
    };
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.len() + user.chars().count() + help_hint.len() + 4),
        )),
        Span::styled(user, styles::highlight_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let main_tabs = [Tab::Students, Tab::Teachers];

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in main_tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    // Filter summary on the right when on the Students tab
    if app.current_tab == Tab::Students {
        let searching = app.state == AppState::Searching;
        let cursor = if searching { "▌" } else { "" };
        let search = format!("Search: {}{}", app.filter.search, cursor);
        let level = format!("Level: {}", app.filter.level.label());

        let main_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let filter_width = search.chars().count() + level.chars().count() + 3;
        let padding = (area.width as usize).saturating_sub(main_width + filter_width + 2);

        spans.push(Span::raw(" ".repeat(padding)));
        let search_style = if searching || !app.filter.search.is_empty() {
            styles::search_style()
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(search, search_style));
        spans.push(Span::styled(" | ", styles::muted_style()));
        spans.push(Span::styled(level, styles::muted_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Students => students::render(frame, app, area),
        Tab::Teachers => teachers::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[s]witch user | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.is_signed_in() {
        format!(
            " {} students, {} teachers ",
            app.repo.students().len(),
            app.repo.teachers().len()
        )
    } else {
        " Not signed in ".to_string()
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(key, styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Caseload", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("  1/2       ", "Students / Teachers"),
        help_line("  ←/→       ", "Prev/next tab"),
        help_line("  ↑/↓ j/k   ", "Navigate list"),
        help_line("  Home/End  ", "First/last entry"),
        Line::from(""),
        Line::from(Span::styled(" Students", styles::highlight_style())),
        help_line("  /         ", "Search by name"),
        help_line("  l         ", "Cycle level filter"),
        help_line("  Esc       ", "Clear search and filter"),
        help_line("  t         ", "Cycle assigned teacher"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("  a         ", "Add student / teacher"),
        help_line("  d         ", "Delete selected"),
        help_line("  s         ", "Switch user"),
        help_line("  q         ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    frame.render_widget(overlay(help_text), area);
}

fn render_sign_in_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 9, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled("  Caseload", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("  Sign in with your user id", styles::muted_style())),
        Line::from(vec![
            Span::styled("  User: [", styles::muted_style()),
            Span::styled(format!("{:<24}▌", app.user_input), styles::selected_style()),
            Span::styled("]", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Enter]", styles::help_key_style()),
            Span::styled(" sign in  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    frame.render_widget(overlay(lines), area);
}

fn render_add_teacher_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled("  Add Teacher", styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Name: [", styles::muted_style()),
            Span::styled(format!("{:<24}▌", app.teacher_input), styles::selected_style()),
            Span::styled("]", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Enter]", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    frame.render_widget(overlay(lines), area);
}

fn render_add_student_overlay(frame: &mut Frame, app: &App) {
    let form = &app.student_form;
    let height = if form.error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("  Add Student", styles::title_style())),
        Line::from(""),
    ];

    for field in FormField::ALL {
        let focused = form.focus == field;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused && field != FormField::Level { "▌" } else { "" };
        let value = if field == FormField::Level {
            format!("◀ {:<8} ▶", form.value(field))
        } else {
            format!("{}{}", form.value(field), cursor)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}[", field.label()), styles::muted_style()),
            Span::styled(format!("{:<28}", value), style),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Tab]", styles::help_key_style()),
        Span::styled(" next  ", styles::muted_style()),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    frame.render_widget(overlay(lines), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 7, frame.area());
    frame.render_widget(Clear, area);

    let prompt = app
        .pending_delete
        .as_ref()
        .map(|p| p.prompt())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", prompt), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    frame.render_widget(overlay(lines), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    frame.render_widget(overlay(lines), area);
}

/// Bordered dialog body shared by all overlays
fn overlay(lines: Vec<Line<'_>>) -> Paragraph<'_> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    Paragraph::new(lines).block(block)
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
