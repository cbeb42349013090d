//! Drawing for the three tabs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::domain::BoundKind;
use crate::report::{cell_text, fmt_bound, truncate, StatusMessage};

use super::app::{App, EditTarget, FittingField, Tab};

const MAX_CELL: usize = 24;

pub fn draw(app: &App, frame: &mut Frame<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(frame.area());

    draw_tabs(app, frame, chunks[0]);
    match app.tab {
        Tab::Models => draw_models(app, frame, chunks[1]),
        Tab::Fitting => draw_fitting(app, frame, chunks[1]),
        Tab::Browser => draw_browser(app, frame, chunks[1]),
    }
    draw_footer(app, frame, chunks[2]);
}

fn draw_tabs(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.title())))
        .collect();
    let title = format!("ADSORFIT  {}", app.api_base_url);
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn draw_models(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)])
        .split(area);

    let items: Vec<ListItem> = app
        .session
        .models()
        .iter()
        .map(|state| {
            let mark = if state.enabled { "[x]" } else { "[ ]" };
            let style = if state.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(format!("{mark} {}", state.spec.name)).style(style)
        })
        .collect();
    let title = format!(
        "Models ({}/{} enabled)",
        app.session.models().enabled_count(),
        app.session.models().len()
    );
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .highlight_symbol("» ");
    let mut state = ListState::default();
    state.select(Some(app.model_cursor));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    draw_model_card(app, frame, chunks[1]);
}

fn draw_model_card(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let Some(state) = app.session.models().at(app.model_cursor) else {
        return;
    };
    let spec = state.spec;
    let expanded = app.session.selection().is_expanded(spec.name);

    let mut lines = vec![
        Line::from(Span::styled(spec.equation, Style::default().fg(Color::Cyan))),
        Line::from(Span::styled(spec.description, Style::default().fg(Color::Gray))),
        Line::from(""),
    ];

    let fields = if expanded { app.bound_fields() } else { Vec::new() };
    for (name, bound) in state.config.iter() {
        let mut spans = vec![Span::raw(format!("{name:<10}"))];
        for which in [BoundKind::Min, BoundKind::Max] {
            let selected = fields
                .get(app.bound_cursor)
                .is_some_and(|&(p, w)| p == name && w == which);
            let editing = app.edit.as_ref().filter(|e| {
                e.target
                    == EditTarget::Bound {
                        model: spec.name,
                        parameter: name,
                        which,
                    }
            });
            let value = match editing {
                Some(edit) => format!("{}_", edit.text),
                None => fmt_bound(bound.get(which)),
            };
            let style = if editing.is_some() {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if selected {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default()
            };
            spans.push(Span::raw(format!("  {}: ", which.label())));
            spans.push(Span::styled(format!("{value:<12}"), style));
        }
        lines.push(Line::from(spans));
    }

    if !state.enabled {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Disabled: left out of fitting requests. Bounds are kept.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let title = if expanded {
        format!("{} (editing)", spec.name)
    } else {
        spec.name.to_string()
    };
    let p = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_fitting(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let settings = app.session.settings();
    let editing = |target: EditTarget| app.edit.as_ref().filter(|e| e.target == target).map(|e| format!("{}_", e.text));

    let items: Vec<ListItem> = FittingField::ALL
        .iter()
        .map(|field| {
            let text = match field {
                FittingField::MaxIterations => format!(
                    "Max iterations: {}",
                    editing(EditTarget::MaxIterations).unwrap_or_else(|| settings.max_iterations.to_string())
                ),
                FittingField::Method => format!("Method: ‹ {} ›", settings.optimization_method.label()),
                FittingField::SaveBest => format!(
                    "Save best fit: {}",
                    if settings.save_best { "[x]" } else { "[ ]" }
                ),
                FittingField::DatasetPath => {
                    let path = editing(EditTarget::DatasetPath).unwrap_or_else(|| {
                        if app.dataset_path.is_empty() {
                            "(Enter to choose a file)".to_string()
                        } else {
                            app.dataset_path.clone()
                        }
                    });
                    format!("Dataset: {path}")
                }
                FittingField::Start => {
                    if app.session.is_fitting() {
                        "Fitting in progress...".to_string()
                    } else {
                        "Start fitting".to_string()
                    }
                }
            };
            ListItem::new(text)
        })
        .collect();

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(chunks[0]);

    let list = List::new(items)
        .block(Block::default().title("Settings").borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .highlight_symbol("» ");
    let mut state = ListState::default();
    state.select(Some(app.fitting_cursor));
    frame.render_stateful_widget(list, left[0], &mut state);

    let activity: Vec<ListItem> = app
        .activity
        .iter()
        .rev()
        .map(|(at, status)| {
            ListItem::new(format!("{} {}", at.format("%H:%M:%S"), status.to_string().replace('\n', " ")))
                .style(status_style(status))
        })
        .collect();
    frame.render_widget(
        List::new(activity).block(Block::default().title("Activity").borders(Borders::ALL)),
        left[1],
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    let mut dataset_lines = Vec::new();
    if let Some(name) = app.session.dataset_name() {
        let rows = app.session.dataset().map(|d| d.sample_count()).unwrap_or(0);
        dataset_lines.push(Line::from(format!("{name} ({rows} rows)")));
    }
    dataset_lines.push(Line::from(Span::styled(
        app.session.dataset_preview(),
        Style::default().fg(Color::Gray),
    )));
    if let Some(status) = app.session.dataset_status() {
        dataset_lines.push(Line::from(""));
        dataset_lines.extend(status_lines(status));
    }
    frame.render_widget(
        Paragraph::new(Text::from(dataset_lines))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Dataset").borders(Borders::ALL)),
        right[0],
    );

    let fitting_lines = match app.session.fitting_status() {
        Some(status) => status_lines(status),
        None => vec![Line::from(Span::styled(
            "No fitting run yet.",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(
        Paragraph::new(Text::from(fitting_lines))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Fitting status").borders(Borders::ALL)),
        right[1],
    );
}

fn draw_browser(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let browser = app.session.browser();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(area);

    let items: Vec<ListItem> = browser
        .tables()
        .iter()
        .map(|t| ListItem::new(t.display_name.clone()))
        .collect();
    let list = List::new(items)
        .block(Block::default().title("Tables").borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .highlight_symbol("» ");
    let mut state = ListState::default();
    state.select(browser.selected_index());
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let title = if browser.selected_table().is_some() {
        format!(
            "{} ({} rows, {} columns)",
            browser.display_name(),
            browser.row_count(),
            browser.column_count()
        )
    } else {
        "Data".to_string()
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    if browser.is_loading() {
        let p = Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow)).block(block);
        frame.render_widget(p, chunks[1]);
        return;
    }
    if let Some(error) = browser.error() {
        let p = Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(p, chunks[1]);
        return;
    }
    if browser.columns().is_empty() {
        let text = if browser.tables_loaded() {
            "No data."
        } else {
            "Waiting for table list..."
        };
        frame.render_widget(Paragraph::new(text).block(block), chunks[1]);
        return;
    }

    let header = Row::new(browser.columns().iter().map(|c| Cell::from(truncate(c, MAX_CELL))))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = browser.rows().iter().skip(app.table_scroll).map(|row| {
        Row::new(
            browser
                .columns()
                .iter()
                .map(|c| Cell::from(truncate(&cell_text(row.get(c)), MAX_CELL))),
        )
    });
    let widths: Vec<Constraint> = browser
        .columns()
        .iter()
        .map(|c| {
            let widest = browser
                .rows()
                .iter()
                .map(|row| cell_text(row.get(c)).chars().count())
                .max()
                .unwrap_or(0)
                .max(c.chars().count())
                .min(MAX_CELL);
            Constraint::Length(widest as u16)
        })
        .collect();
    let table = Table::new(rows, widths).header(header).column_spacing(2).block(block);
    frame.render_widget(table, chunks[1]);
}

fn draw_footer(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let help = if app.edit.is_some() {
        "Enter apply  Esc cancel"
    } else {
        match app.tab {
            Tab::Models if app.session.selection().expanded().is_some() => {
                "↑/↓ field  Enter edit  Space toggle  d reset  Esc close  f fit  q quit"
            }
            Tab::Models => "↑/↓ model  Enter open  Space toggle  d reset  Tab switch  f fit  q quit",
            Tab::Fitting => "↑/↓ field  Enter edit  ←/→ method  Space save-best  f fit  q quit",
            Tab::Browser => "↑/↓ table  r refresh  R reload list  PgUp/PgDn scroll  q quit",
        }
    };
    let mut spans = vec![Span::styled(help, Style::default().fg(Color::Gray))];
    if let Some(status) = &app.status {
        let first = status.to_string();
        let first = first.lines().next().unwrap_or_default().to_string();
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(first, status_style(status)));
    }
    let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn status_style(status: &StatusMessage) -> Style {
    if status.is_error() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    }
}

fn status_lines(status: &StatusMessage) -> Vec<Line<'static>> {
    let style = status_style(status);
    status
        .to_string()
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), style)))
        .collect()
}
