//! Rendering of the demo screen and the DevTools panel

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, DemoButton};
use crate::config::PanelPosition;
use crate::logger::{session_id, LogEntry, LogLevel};
use crate::tui::devtools::DevTools;
use crate::tui::theme::theme;

/// Height of the panel when collapsed: the title sits on the border row
const COLLAPSED_HEIGHT: u16 = 1;

/// Rows the panel occupies inside an area of height `available`
pub fn panel_height(devtools: &DevTools, available: u16) -> u16 {
    if devtools.is_collapsed() {
        COLLAPSED_HEIGHT
    } else {
        devtools
            .config()
            .max_height
            .min(available.saturating_sub(3))
            .max(COLLAPSED_HEIGHT)
    }
}

/// Split `area` into (content, panel) according to the configured dock position
pub fn split_for_panel(area: Rect, devtools: &DevTools) -> (Rect, Rect) {
    let height = panel_height(devtools, area.height);
    match devtools.config().position {
        PanelPosition::Bottom => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(height)])
                .split(area);
            (chunks[0], chunks[1])
        }
        PanelPosition::Top => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(height), Constraint::Min(0)])
                .split(area);
            (chunks[1], chunks[0])
        }
    }
}

/// Render the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let (content, panel) = split_for_panel(frame.size(), app.devtools());
    render_demo(frame, content, app);
    render_devtools(frame, panel, app.devtools());
}

fn panel_title(devtools: &DevTools) -> Line<'static> {
    let t = theme();
    let marker = if devtools.is_collapsed() { "▸" } else { "▾" };
    let mut spans = vec![
        Span::styled(format!(" {} LogDumper ", marker), t.header_style()),
        Span::styled(format!("{} logs ", devtools.logs().len()), t.muted_style()),
    ];
    let errors = devtools.error_count();
    if errors > 0 {
        spans.push(Span::styled(
            format!("{} errors ", errors),
            t.level_style(LogLevel::Error),
        ));
    }
    let warnings = devtools.warn_count();
    if warnings > 0 {
        spans.push(Span::styled(
            format!("{} warnings ", warnings),
            t.level_style(LogLevel::Warn),
        ));
    }
    spans.push(Span::styled(
        format!("[filter: {}] ", devtools.level_filter().label()),
        t.muted_style(),
    ));
    Line::from(spans)
}

fn detail_lines(entry: &LogEntry) -> Vec<Line<'static>> {
    let t = theme();
    let mut lines = Vec::new();

    let mut block = |title: &str, body: String| {
        lines.push(Line::from(Span::styled(format!("    {}:", title), t.header_style())));
        for line in body.lines() {
            lines.push(Line::from(Span::styled(format!("      {}", line), t.muted_style())));
        }
    };

    if let Some(context) = &entry.context {
        block("Context", serde_json::to_string_pretty(context).unwrap_or_default());
    }
    if let Some(metadata) = &entry.metadata {
        block("Metadata", serde_json::to_string_pretty(metadata).unwrap_or_default());
    }
    if let Some(stack) = &entry.error_stack {
        block("Stack Trace", stack.clone());
    }
    lines
}

fn entry_item(entry: &LogEntry, expanded: bool) -> ListItem<'static> {
    let t = theme();
    let marker = match (entry.has_details(), expanded) {
        (false, _) => "  ",
        (true, false) => "▸ ",
        (true, true) => "▾ ",
    };

    let mut spans = vec![
        Span::raw(marker),
        Span::styled(
            format!("{} ", entry.timestamp.format("%H:%M:%S%.3f")),
            t.muted_style(),
        ),
        Span::styled(format!("{:5} ", entry.level.as_str()), t.level_style(entry.level)),
    ];
    if let Some(name) = &entry.logger_name {
        spans.push(Span::styled(
            format!("[{}] ", name),
            Style::default().fg(t.logger_name),
        ));
    }
    let mut message_style = t.message_style(entry.level);
    if entry.level.is_alert() {
        message_style = message_style.add_modifier(Modifier::BOLD);
    }
    spans.push(Span::styled(entry.message.clone(), message_style));

    let mut lines = vec![Line::from(spans)];
    if expanded {
        lines.extend(detail_lines(entry));
    }
    ListItem::new(Text::from(lines))
}

fn footer_line(devtools: &DevTools) -> Line<'static> {
    let t = theme();
    if devtools.is_searching() {
        return Line::from(vec![
            Span::styled("/", t.input_style()),
            Span::raw(devtools.search().to_string()),
            Span::styled("█", t.input_style()),
        ]);
    }
    if let Some(status) = devtools.status() {
        return Line::from(Span::styled(status.to_string(), t.muted_style()));
    }

    let search = if devtools.search().is_empty() {
        String::new()
    } else {
        format!("search: \"{}\" | ", devtools.search())
    };
    Line::from(Span::styled(
        format!(
            "{}j/k: move | Enter: details | f: filter | /: search | c: clear | s: save | Tab: hide",
            search
        ),
        t.muted_style(),
    ))
}

/// Render the DevTools panel into `area`
pub fn render_devtools(frame: &mut Frame, area: Rect, devtools: &DevTools) {
    let t = theme();
    let borders = match devtools.config().position {
        PanelPosition::Bottom => Borders::TOP,
        PanelPosition::Top => Borders::BOTTOM,
    };
    let block = Block::default()
        .borders(borders)
        .border_style(t.border_style(!devtools.is_collapsed()))
        .title(panel_title(devtools));

    if devtools.is_collapsed() {
        frame.render_widget(block, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let visible = devtools.visible();
    if visible.is_empty() {
        let text = if devtools.logs().is_empty() {
            "No logs yet"
        } else {
            "No logs match the current filter"
        };
        frame.render_widget(Paragraph::new(text).style(t.muted_style()), chunks[0]);
    } else {
        let items: Vec<ListItem> = visible
            .iter()
            .map(|entry| entry_item(entry, devtools.is_expanded(&entry.id)))
            .collect();
        let list = List::new(items).highlight_style(Style::default().bg(t.selected_bg));
        let mut state = ListState::default().with_selected(Some(devtools.selected()));
        frame.render_stateful_widget(list, chunks[0], &mut state);
    }

    frame.render_widget(Paragraph::new(footer_line(devtools)), chunks[1]);
}

fn button_line(button: DemoButton) -> Line<'static> {
    let t = theme();
    Line::from(vec![
        Span::styled(format!(" [{}] ", button.key()), t.input_style()),
        Span::raw(button.label()),
    ])
}

/// Render the demo application content
pub fn render_demo(frame: &mut Frame, area: Rect, app: &App) {
    let t = theme();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(t.border_style(false))
        .title(Span::styled(" LogDumper demo ", t.header_style()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Counter: ", t.header_style()),
            Span::raw(app.counter().to_string()),
        ]),
        Line::from(""),
    ];
    lines.extend(DemoButton::ALL.iter().map(|b| button_line(*b)));
    lines.push(Line::from(""));
    if let Some(notice) = app.notice() {
        lines.push(Line::from(Span::styled(format!(" {}", notice), t.input_style())));
    }
    lines.push(Line::from(Span::styled(
        format!(" session {}", session_id()),
        t.muted_style(),
    )));
    frame.render_widget(Paragraph::new(lines), chunks[0]);

    let crash_block = Block::default()
        .borders(Borders::ALL)
        .border_style(t.border_style(app.boundary().has_error()))
        .title(format!(" {} ", app.boundary().name()));
    match app.boundary().fallback_text() {
        Some(text) => {
            let paragraph = Paragraph::new(text)
                .style(t.error_banner_style())
                .wrap(Wrap { trim: false })
                .block(crash_block);
            frame.render_widget(paragraph, chunks[1]);
        }
        None => {
            let text = vec![
                Line::from("This component renders fine until it crashes."),
                Line::from(Span::styled(
                    format!("rendered {} times", app.crash_renders()),
                    t.muted_style(),
                )),
            ];
            frame.render_widget(Paragraph::new(text).block(crash_block), chunks[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DevToolsConfig;
    use crate::logger::Logger;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Cell;
    use serde_json::json;
    use std::sync::Arc;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn open_devtools(logger: &Arc<Logger>) -> DevTools {
        let config = DevToolsConfig {
            default_collapsed: false,
            ..Default::default()
        };
        DevTools::new(Arc::clone(logger), config)
    }

    #[test]
    fn test_panel_height() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        let mut devtools = DevTools::new(Arc::clone(&logger), DevToolsConfig::default());
        assert_eq!(panel_height(&devtools, 40), COLLAPSED_HEIGHT);

        devtools.toggle_collapsed();
        assert_eq!(panel_height(&devtools, 40), 16);
        assert_eq!(panel_height(&devtools, 10), 7);
    }

    #[test]
    fn test_split_respects_position() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        let config = DevToolsConfig {
            position: PanelPosition::Top,
            default_collapsed: false,
            max_height: 5,
        };
        let devtools = DevTools::new(logger, config);
        let (content, panel) = split_for_panel(Rect::new(0, 0, 80, 30), &devtools);
        assert_eq!(panel.y, 0);
        assert_eq!(panel.height, 5);
        assert_eq!(content.y, 5);
    }

    #[test]
    fn test_render_rows_and_counts() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        logger.log_info("User logged in", None, None);
        logger.log_warn("Session expiring", None, None);
        let devtools = open_devtools(&logger);

        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal
            .draw(|frame| render_devtools(frame, frame.size(), &devtools))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("2 logs"));
        assert!(text.contains("1 warnings"));
        assert!(text.contains("User logged in"));
        assert!(text.contains("Session expiring"));
    }

    /// Cell where `needle` starts on screen
    fn find_cell<'a>(terminal: &'a Terminal<TestBackend>, needle: &str) -> &'a Cell {
        let cells = &terminal.backend().buffer().content;
        let chars: Vec<String> = needle.chars().map(String::from).collect();
        let start = (0..cells.len().saturating_sub(chars.len()))
            .find(|&i| chars.iter().enumerate().all(|(j, c)| cells[i + j].symbol() == c))
            .unwrap();
        &cells[start]
    }

    #[test]
    fn test_alert_rows_are_highlighted() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        logger.log_info("Routine message", None, None);
        logger.log_warn("Session expiring", None, None);
        let devtools = open_devtools(&logger);

        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal
            .draw(|frame| render_devtools(frame, frame.size(), &devtools))
            .unwrap();

        let warn = find_cell(&terminal, "Session expiring");
        assert_eq!(warn.fg, Color::Yellow);
        assert!(warn.modifier.contains(Modifier::BOLD));
        let info = find_cell(&terminal, "Routine message");
        assert_eq!(info.fg, Color::White);
        assert!(!info.modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_render_expanded_details() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        logger.log_info("Payment", Some(json!({ "amount": 42 })), None);
        let mut devtools = open_devtools(&logger);
        devtools.toggle_selected();

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| render_devtools(frame, frame.size(), &devtools))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Context:"));
        assert!(text.contains("\"amount\": 42"));
        assert!(text.contains("Metadata:"));
    }

    #[test]
    fn test_render_empty_filter_message() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        logger.log_info("only info", None, None);
        let mut devtools = open_devtools(&logger);
        devtools.set_search("nothing like this");

        let mut terminal = Terminal::new(TestBackend::new(80, 8)).unwrap();
        terminal
            .draw(|frame| render_devtools(frame, frame.size(), &devtools))
            .unwrap();

        assert!(buffer_text(&terminal).contains("No logs match the current filter"));
    }
}
