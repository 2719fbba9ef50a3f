use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// Render the Teachers tab - teacher list and the students assigned to the selection
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_teacher_table(frame, app, chunks[0]);
    render_assigned_students(frame, app, chunks[1]);
}

fn render_teacher_table(frame: &mut Frame, app: &App, area: Rect) {
    let teachers = app.repo.teachers();
    let title = format!(" Teachers ({}) - [a]dd [d]elete ", teachers.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if teachers.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "No teachers yet. Press [a] to add one.",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([Cell::from("Name"), Cell::from("Students")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = teachers
        .iter()
        .enumerate()
        .map(|(i, teacher)| {
            let style = if i == app.teacher_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let count = app.repo.students_assigned_to(&teacher.id).len();
            Row::new(vec![
                Cell::from(teacher.name.clone()),
                Cell::from(format!("{:>4}", count)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(9)])
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.teacher_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_assigned_students(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match app.selected_teacher() {
        Some(teacher) => {
            lines.push(Line::from(Span::styled(teacher.name.as_str(), styles::title_style())));
            lines.push(Line::from(""));

            let assigned = app.repo.students_assigned_to(&teacher.id);
            if assigned.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No students assigned",
                    styles::muted_style(),
                )));
            }
            for student in assigned {
                lines.push(Line::from(vec![
                    Span::raw(student.name.as_str()),
                    Span::styled(format!("  {}", student.grade), styles::muted_style()),
                    Span::raw("  "),
                    Span::styled(
                        student.disability_level.as_str(),
                        styles::level_style(student.disability_level),
                    ),
                ]));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "No teacher selected",
            styles::muted_style(),
        ))),
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Assigned Students ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(paragraph, area);
}
