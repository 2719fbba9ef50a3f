use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use caseload_core::utils::{format_optional, truncate_string};
use caseload_core::Student;

use crate::app::App;
use crate::ui::styles;

/// Render the Students tab - filtered table plus a card for the selection
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_student_table(frame, app, chunks[0]);
    render_student_card(frame, app, chunks[1]);
}

fn render_student_table(frame: &mut Frame, app: &App, area: Rect) {
    let students = app.visible_students();

    if students.is_empty() {
        let message = if app.is_signed_in() {
            "No students found matching your criteria."
        } else {
            "Sign in to see your students. Press [s]."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style())))
            .block(
                Block::default()
                    .title(" Students ")
                    .title_style(styles::muted_style())
                    .borders(Borders::ALL)
                    .border_style(styles::border_style(true)),
            );
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Age"),
        Cell::from("Grade"),
        Cell::from("Level"),
        Cell::from("Teacher"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let style = if i == app.student_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(student.name.clone()),
                Cell::from(format!("{:>3}", student.age)),
                Cell::from(student.grade.clone()),
                Cell::from(Span::styled(
                    student.disability_level.as_str(),
                    styles::level_style(student.disability_level),
                )),
                Cell::from(truncate_string(&app.teacher_label(student), 18)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(34),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Fill(1),
    ];

    let title = format!(
        " Students ({}/{}) - [/]search [l]evel [a]dd [t]eacher [d]elete ",
        students.len(),
        app.repo.students().len()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.student_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_student_card(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_student() {
        Some(student) => card_lines(app, student),
        None => vec![Line::from(Span::styled("No student selected", styles::muted_style()))],
    };

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Student ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        );
    frame.render_widget(paragraph, area);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![Span::styled(label, styles::muted_style()), Span::raw(value)])
}

fn card_lines<'a>(app: &App, student: &'a Student) -> Vec<Line<'a>> {
    let placeholder = "-";
    let details = &student.details;
    let mut lines = vec![];

    lines.push(Line::from(Span::styled(student.name.as_str(), styles::title_style())));
    lines.push(Line::from(vec![
        Span::styled(
            student.disability_level.as_str(),
            styles::level_style(student.disability_level),
        ),
        Span::raw(" · "),
        Span::raw(student.disability_type.as_str()),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Basic Info", styles::highlight_style())));
    lines.push(field("Age:        ", student.age.to_string()));
    lines.push(field("Grade:      ", student.grade.clone()));
    lines.push(field("Teacher:    ", app.teacher_label(student)));
    let gender = details
        .gender
        .map(|g| g.to_string())
        .unwrap_or_else(|| placeholder.to_string());
    lines.push(field("Gender:     ", gender));
    if let Some(percentage) = details.disability_percentage {
        lines.push(field("Disability: ", format!("{}%", percentage)));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Profile", styles::highlight_style())));
    lines.push(field(
        "Admitted:   ",
        format_optional(details.admission_date.as_deref(), placeholder),
    ));
    lines.push(field(
        "Address:    ",
        format_optional(details.address.as_deref(), placeholder),
    ));
    lines.push(field(
        "Emergency:  ",
        format_optional(details.emergency_contact.as_deref(), placeholder),
    ));
    let guardian = details
        .parent_guardian_status
        .map(|g| g.to_string())
        .unwrap_or_else(|| placeholder.to_string());
    lines.push(field("Guardian:   ", guardian));
    lines.push(field(
        "Hospital:   ",
        format_optional(details.referred_hospital.as_deref(), placeholder),
    ));
    if let Some(ref history) = details.medical_history {
        lines.push(field("Medical:    ", truncate_string(history, 60)));
    }
    if let Some(ref notes) = details.other_notes {
        lines.push(field("Notes:      ", truncate_string(notes, 60)));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Documents", styles::highlight_style())));
    lines.push(field("Certificates: ", details.certificates.len().to_string()));
    let id_card = match (&details.disability_id_card, details.has_disability_id_card) {
        (Some(card), _) => card.name.clone(),
        (None, Some(true)) => "Yes".to_string(),
        _ => "No".to_string(),
    };
    lines.push(field("ID card:      ", id_card));

    if details.safety.any_raised() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "! Safety concerns recorded",
            styles::error_style(),
        )));
    }

    lines
}
