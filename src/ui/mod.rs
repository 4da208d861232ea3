mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, InputTarget, Popup, Section};
use crate::theme::Theme;
use components::{centered_line_rect, centered_rect, key_hint};

// Theme is fixed once at startup from the config
static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme; later calls are ignored
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let (fields_height, labels_height) = if area.height < 20 {
        (Constraint::Min(4), Constraint::Min(3))
    } else {
        (Constraint::Ratio(3, 5), Constraint::Ratio(2, 5))
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            fields_height,         // Fields box
            Constraint::Length(3), // Separator box
            labels_height,         // Labels box
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_fields_box(f, app, chunks[1]);
    draw_separator_box(f, app, chunks[2]);
    draw_labels_box(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    match app.popup {
        Popup::None => {}
        Popup::Input => draw_input_popup(f, app),
        Popup::FileBrowser => draw_file_browser(f, app),
        Popup::Help => draw_help_popup(f, app),
        Popup::Confirm => draw_confirm_popup(f, app),
    }
}

fn section_block<'a>(title: &'a str, is_active: bool) -> Block<'a> {
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    Block::default()
        .title(Span::styled(format!(" {} ", title), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: pending import > status message > field summary
    let line = if let Some(ref path) = app.import_pending {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Line::from(vec![
            Span::styled("󰔟 ", Style::default().fg(accent())),
            Span::styled(app.tr("Loading fields…"), Style::default().fg(text())),
            Span::styled(format!(" {}", name), Style::default().fg(text_dim())),
        ])
    } else if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(warning())))
    } else {
        Line::from(vec![
            Span::styled(
                format!("{} {}", app.fields.len(), app.tr("fields")),
                Style::default().fg(text_dim()),
            ),
            Span::styled(" │ ", Style::default().fg(inactive())),
            Span::styled(
                format!("{} {}", app.contributing_fields(), app.tr("selected")),
                Style::default().fg(text_dim()),
            ),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_fields_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Fields;
    let block = section_block(app.tr("Fields"), is_active);

    let header = Row::new(vec![
        Span::styled(app.tr("Field Name"), Style::default().fg(accent())),
        Span::styled(app.tr("Field Values"), Style::default().fg(accent())),
    ]);

    let rows: Vec<Row> = if app.fields.is_empty() {
        vec![Row::new(vec![Span::styled(
            format!("  {}", app.tr("No fields yet. Press 'a' to add one or 'i' to import.")),
            Style::default().fg(text_dim()),
        )])]
    } else {
        app.fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let name = if field.name.is_empty() {
                    Span::styled(app.tr("(unnamed)"), Style::default().fg(text_dim()))
                } else {
                    Span::styled(field.name.as_str(), Style::default().fg(text()))
                };

                // Candidate values, the selected one highlighted
                let mut values: Vec<Span> = Vec::new();
                if field.values.is_empty() {
                    values.push(Span::styled(app.tr("Select a value"), Style::default().fg(text_dim())));
                }
                for (vi, value) in field.values.iter().enumerate() {
                    if vi > 0 {
                        values.push(Span::styled(" · ", Style::default().fg(inactive())));
                    }
                    if field.selected == Some(vi) {
                        values.push(Span::styled(
                            format!("[{}]", value),
                            Style::default().fg(success()).add_modifier(Modifier::BOLD),
                        ));
                    } else {
                        values.push(Span::styled(value.as_str(), Style::default().fg(text_dim())));
                    }
                }

                let row_style = if i == app.selected_field && is_active {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };

                Row::new(vec![Line::from(name), Line::from(values)]).style(row_style)
            })
            .collect()
    };

    let table = Table::new(rows, [Constraint::Percentage(30), Constraint::Percentage(70)])
        .header(header)
        .block(block);

    f.render_widget(table, area);
}

fn draw_separator_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Separator;
    let block = section_block(app.tr("Separator"), is_active);

    let mut spans = vec![
        Span::styled("  \"", Style::default().fg(text_dim())),
        Span::styled(app.separator.as_str(), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
        Span::styled("\"", Style::default().fg(text_dim())),
    ];
    if is_active {
        spans.push(Span::styled("  │ ", Style::default().fg(inactive())));
        spans.extend(key_hint("Enter", app.tr("edit"), accent(), text_dim()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_labels_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Labels;
    let block = section_block(app.tr("Nomenclatures"), is_active);

    let rows: Vec<Row> = if app.labels.is_empty() {
        vec![Row::new(vec![Span::styled(
            format!("  {}", app.tr("Press 'g' to generate")),
            Style::default().fg(text_dim()),
        )])]
    } else {
        app.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let button = if label.is_copied() {
                    Span::styled(format!("[{}]", app.tr("Copied!")), Style::default().fg(success()))
                } else {
                    Span::styled(format!("[{}]", app.tr("Copy")), Style::default().fg(accent()))
                };

                let row_style = if i == app.selected_label && is_active {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };

                Row::new(vec![
                    Span::styled(label.text.as_str(), Style::default().fg(text())),
                    button,
                ])
                .style(row_style)
            })
            .collect()
    };

    let table = Table::new(rows, [Constraint::Min(10), Constraint::Length(12)]).block(block);
    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();

    match app.section {
        Section::Fields => {
            spans.extend(key_hint("a", app.tr("add"), accent(), text_dim()));
            spans.extend(key_hint("v", app.tr("value"), accent(), text_dim()));
            spans.extend(key_hint("←/→", app.tr("select"), accent(), text_dim()));
            spans.extend(key_hint("d", app.tr("remove"), accent(), text_dim()));
        }
        Section::Separator => {
            spans.extend(key_hint("Enter", app.tr("edit"), accent(), text_dim()));
        }
        Section::Labels => {
            spans.extend(key_hint("y", app.tr("copy"), accent(), text_dim()));
        }
    }
    spans.extend(key_hint("g", app.tr("generate"), accent(), text_dim()));
    spans.extend(key_hint("i", app.tr("import"), accent(), text_dim()));
    spans.extend(key_hint("?", app.tr("help"), accent(), text_dim()));
    spans.extend(key_hint("q", app.tr("quit"), accent(), text_dim()));

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_input_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_line_rect(
        if f.area().width < 80 { 90 } else { 60 },
        3,
        f.area(),
    );

    f.render_widget(Clear, popup_area);

    let title = match app.input_target {
        Some(InputTarget::NewField) | Some(InputTarget::RenameField(_)) => app.tr("Field Name"),
        Some(InputTarget::NewValue(_)) => app.tr("Enter a new value:"),
        Some(InputTarget::Separator) => app.tr("Separator"),
        None => "",
    };

    let input = Paragraph::new(format!("{}_", app.input_buffer))
        .style(Style::default().fg(text()))
        .block(
            Block::default()
                .title(Span::styled(format!(" {} ", title), Style::default().fg(accent())))
                .title_bottom(Line::from(Span::styled(
                    " Enter ✓  Esc ✗ ",
                    Style::default().fg(text_dim()),
                )))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        );

    f.render_widget(input, popup_area);
}

fn draw_file_browser(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 100 { 90 } else { 70 },
        if area.height < 30 { 90 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(
            format!(" 󰈔 {} (.csv / .json) ", app.tr("Load Fields")),
            Style::default().fg(accent()),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(popup_area);

    let path = Paragraph::new(app.browser_path.display().to_string())
        .style(Style::default().fg(text_dim()));
    f.render_widget(path, inner[0]);

    let visible = inner[1].height as usize;
    let offset = app.browser_selected.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = app
        .browser_entries
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, entry)| {
            let (icon, color) = if entry.is_dir { ("󰉋 ", accent()) } else { ("󰈙 ", text()) };
            let style = if i == app.browser_selected {
                Style::default().bg(bg_selected())
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(icon, Style::default().fg(color)),
                Span::styled(entry.name.as_str(), Style::default().fg(color)),
            ])
            .style(style)
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner[1]);

    let mut hint = Vec::new();
    hint.extend(key_hint("j/k", app.tr("nav"), accent(), text_dim()));
    hint.extend(key_hint("Enter", app.tr("select"), accent(), text_dim()));
    hint.extend(key_hint("Backspace", app.tr("up"), accent(), text_dim()));
    hint.extend(key_hint("~", app.tr("home"), accent(), text_dim()));
    hint.extend(key_hint("Esc", app.tr("cancel"), accent(), text_dim()));
    f.render_widget(Paragraph::new(Line::from(hint)).alignment(Alignment::Center), inner[2]);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 30 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let heading = |s: &'static str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", app.tr(s)),
            Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), Style::default().fg(accent())),
            Span::raw(app.tr(what).to_string()),
        ])
    };

    let help_text = vec![
        heading("Navigation"),
        entry("Tab", "Switch sections (Fields → Separator → Nomenclatures)"),
        entry("↑/↓ j/k", "Move up/down in lists"),
        Line::from(""),
        heading("Fields"),
        entry("a", "Add Field"),
        entry("Enter/e", "Rename field"),
        entry("v", "Add Value"),
        entry("←/→ [/]", "Change the selected value"),
        entry("x", "Clear the selected value"),
        entry("d", "Remove Field"),
        entry("i", "Load fields from a .csv or .json file"),
        Line::from(""),
        heading("Nomenclatures"),
        entry("g", "Generate Nomenclature"),
        entry("y/Enter", "Copy the selected nomenclature"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  ?/Esc ", Style::default().fg(accent())),
            Span::styled(app.tr("to close"), Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 nomenclator ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app.confirm_message.as_deref().unwrap_or("?");

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(format!(" {}   ", app.tr("Yes"))),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(format!(" {}", app.tr("No"))),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(format!(" {} ", app.tr("Confirm")), Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(confirm, popup_area);
}
