use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::message::{Message, Sender};

use super::{ChatUi, Mode};

pub(super) fn draw(f: &mut Frame, ui: &mut ChatUi) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_feed(f, ui, chunks[0]);
    draw_chips(f, ui, chunks[1]);
    draw_input(f, ui, chunks[2]);
}

fn message_lines(message: &Message, selected: bool) -> Vec<Line<'static>> {
    let (prefix, mut prefix_style, text_style) = match message.sender {
        Sender::User => (
            "You: ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Cyan),
        ),
        Sender::Bot => (
            "Guide: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            Style::default(),
        ),
    };
    if selected {
        prefix_style = prefix_style.add_modifier(Modifier::REVERSED);
    }

    let content: Vec<&str> = if message.text.is_empty() {
        vec![""]
    } else {
        message.text.lines().collect()
    };
    let last = content.len() - 1;

    content
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let mut spans = vec![if index == 0 {
                Span::styled(prefix.to_string(), prefix_style)
            } else {
                Span::raw("  ".to_string())
            }];
            spans.push(Span::styled((*text).to_string(), text_style));
            if index == last && message.is_bot() {
                spans.push(Span::styled(
                    format!("  [+{} -{}]", message.likes, message.dislikes),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        })
        .collect()
}

/// Feed lines plus, per message, its (start, length) range within them.
fn build_feed_lines(ui: &ChatUi) -> (Vec<Line<'static>>, Vec<(usize, usize)>) {
    let mut lines = Vec::new();
    let mut ranges = Vec::new();

    for (index, message) in ui.session.feed().messages().iter().enumerate() {
        let selected = ui.mode == Mode::Select && ui.selected == Some(index);
        let start = lines.len();
        lines.extend(message_lines(message, selected));
        ranges.push((start, lines.len() - start));
        lines.push(Line::from(""));
    }

    (lines, ranges)
}

fn draw_feed(f: &mut Frame, ui: &mut ChatUi, area: Rect) {
    let (lines, ranges) = build_feed_lines(ui);

    let available = area.height.saturating_sub(1);
    let total = lines.len() as u16;
    let max_offset = total.saturating_sub(available);

    if ui.mode == Mode::Select {
        // Keep the selected message in view.
        if let Some(&(start, len)) = ui.selected.and_then(|index| ranges.get(index)) {
            let start = start as u16;
            let end = (start + len as u16).min(total);
            if start < ui.scroll_offset {
                ui.scroll_offset = start;
            } else if end > ui.scroll_offset + available {
                ui.scroll_offset = end.saturating_sub(available);
            }
        }
    } else if ui.auto_scroll {
        ui.scroll_offset = max_offset;
    }
    ui.scroll_offset = ui.scroll_offset.min(max_offset);
    if ui.scroll_offset >= max_offset {
        ui.auto_scroll = true;
    }

    let feed = Paragraph::new(lines)
        .block(Block::default().title("Space Travel Assistant"))
        .wrap(Wrap { trim: false })
        .scroll((ui.scroll_offset, 0));
    f.render_widget(feed, area);
}

fn draw_chips(f: &mut Frame, ui: &ChatUi, area: Rect) {
    let mut spans = Vec::new();
    for (index, chip) in ui.session.quick_replies().iter().enumerate().take(9) {
        spans.push(Span::styled(
            format!(" {}", index + 1),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {} ", chip),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_input(f: &mut Frame, ui: &mut ChatUi, area: Rect) {
    let mut title = match (&ui.status, ui.mode) {
        (Some(status), _) => status.clone(),
        (None, Mode::Compose) => {
            "Enter send | F2 voice | Alt+1-9 chips | Esc select".to_string()
        }
        (None, Mode::Select) => {
            "Up/Down move | c copy | x delete | r regenerate | s speak | l like | d dislike"
                .to_string()
        }
    };
    if ui.session.is_listening() {
        title.push_str(" | listening");
    }
    if ui.session.is_speaking() {
        title.push_str(" | speaking");
    }

    ui.textarea
        .set_block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(&ui.textarea, area);
}
