//! Per-phase rendering

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use super::app::Ui;
use super::input::TextInput;
use crate::workflow::{Phase, Session, Step, TextField};

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn title() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

pub fn render(frame: &mut Frame, session: &Session, ui: &mut Ui) {
    let area = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(1)])
        .split(frame.size())[0];

    match session.phase() {
        Phase::Init => render_waiting(frame, area, ui, "Initializing clients..."),
        Phase::LoadingWorkspaces => {
            render_waiting(frame, area, ui, "Loading workspaces from Fabric...")
        }
        Phase::LoadingGitLink => render_waiting(frame, area, ui, "Checking Git configuration..."),
        Phase::SelectWorkspace => render_workspaces(frame, area, session, ui),
        Phase::EnterBranchName => render_input(
            frame,
            area,
            "Enter new feature branch name:",
            ui.input(TextField::BranchName),
        ),
        Phase::EnterWorkspaceName => render_input(
            frame,
            area,
            "Enter new workspace name:",
            ui.input(TextField::WorkspaceName),
        ),
        Phase::Executing => render_progress(frame, area, session, ui),
        Phase::Done => render_done(frame, area, session),
        Phase::Error => render_error(frame, area, session),
    }
}

fn render_waiting(frame: &mut Frame, area: Rect, ui: &Ui, text: &str) {
    let line = Line::from(vec![
        Span::styled(format!("{} ", ui.spinner()), Style::default().fg(Color::Magenta)),
        Span::raw(text.to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_workspaces(frame: &mut Frame, area: Rect, session: &Session, ui: &mut Ui) {
    let workspaces = session.workspaces();
    ui.clamp_selection(workspaces.len());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let items: Vec<ListItem> = workspaces
        .iter()
        .map(|ws| {
            ListItem::new(vec![
                Line::from(Span::raw(ws.display_name.clone())),
                Line::from(Span::styled(format!("  {}", ws.id), dim())),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Select Parent Dev Workspace", title()));

    if items.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled("No workspaces found.", dim())))
            .block(block);
        frame.render_widget(empty, chunks[0]);
    } else {
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[0], &mut ui.list);
    }

    let help = Paragraph::new(Line::from(Span::styled(
        "↑/↓ to move, enter to select, ctrl+c to quit",
        dim(),
    )));
    frame.render_widget(help, chunks[1]);
}

fn render_input(frame: &mut Frame, area: Rect, prompt: &str, input: &TextInput) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(Span::styled(prompt.to_string(), title())), chunks[0]);

    let text = if input.is_empty() {
        Span::styled(input.placeholder(), dim())
    } else {
        Span::raw(input.value().to_string())
    };
    let field = Paragraph::new(Line::from(text)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(field, chunks[1]);

    // Inside the border
    let max_x = chunks[1].x + chunks[1].width.saturating_sub(2);
    let x = (chunks[1].x + 1 + input.cursor() as u16).min(max_x);
    frame.set_cursor(x, chunks[1].y + 1);

    frame.render_widget(
        Paragraph::new(Span::styled("(Press Enter to continue, ctrl+c to quit)", dim())),
        chunks[2],
    );
}

fn render_progress(frame: &mut Frame, area: Rect, session: &Session, ui: &Ui) {
    let progress = session.progress();
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", ui.spinner()), Style::default().fg(Color::Magenta)),
            Span::styled("Executing Workflow...", title()),
        ]),
        Line::raw(""),
    ];
    lines.extend(progress.iter().map(|entry| {
        Line::from(vec![
            Span::styled("✓ ", Style::default().fg(Color::Green)),
            Span::raw(entry.message.clone()),
        ])
    }));
    if let Some(step) = Step::ALL.get(progress.len()) {
        lines.push(Line::from(Span::styled(
            format!("… {} ({}/{})", step.label(), step.position(), Step::ALL.len()),
            dim(),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_done(frame: &mut Frame, area: Rect, session: &Session) {
    let mut lines = vec![Line::from(Span::styled(
        "Success!",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    if let Some(summary) = session.summary() {
        lines.push(Line::raw(summary.to_string()));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_error(frame: &mut Frame, area: Rect, session: &Session) {
    let message = session
        .error()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string());
    let mut lines = vec![Line::from(Span::styled(
        format!("Error: {}", message),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))];
    if !session.progress().is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Completed before the failure:", dim())));
        lines.extend(
            session
                .progress()
                .iter()
                .map(|entry| Line::raw(format!("  ✓ {}", entry.message))),
        );
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Press ctrl+c to exit.", dim())));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}
