#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::ThemeName;

#[derive(PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

// Border plus one space of inner padding on each side of the text.
const FRAME_WIDTH: usize = 4;
const OUTER_PADDING_PERCENTAGE: f32 = 0.04;

pub struct Bubble<'a> {
    message: &'a Message,
    alignment: BubbleAlignment,
    theme: ThemeName,
    window_max_width: usize,
}

impl<'a> Bubble<'a> {
    pub fn new(message: &'a Message, theme: ThemeName, window_max_width: usize) -> Bubble<'a> {
        let mut alignment = BubbleAlignment::Left;
        if message.role == Role::User {
            alignment = BubbleAlignment::Right;
        }

        return Bubble {
            message,
            alignment,
            theme,
            window_max_width,
        };
    }

    fn accent_color(&self) -> Color {
        match self.message.message_type() {
            MessageType::Error => return Color::Red,
            MessageType::Notice => return Color::Yellow,
            MessageType::Normal => match self.message.role {
                Role::User => return Color::Cyan,
                Role::Assistant => return Color::Green,
                Role::System => return Color::Magenta,
            },
        }
    }

    fn text_color(&self) -> Color {
        match self.theme {
            ThemeName::Light => return Color::Black,
            ThemeName::Dark => return Color::White,
        }
    }

    fn max_text_width(&self) -> usize {
        let outer = (self.window_max_width as f32 * OUTER_PADDING_PERCENTAGE) as usize;
        return self
            .window_max_width
            .saturating_sub(outer + FRAME_WIDTH + 1)
            .max(1);
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let accent = Style {
            fg: Some(self.accent_color()),
            ..Style::default()
        };
        let text_style = Style {
            fg: Some(self.text_color()),
            ..Style::default()
        };

        let wrapped = self.message.wrapped_lines(self.max_text_width());
        let title = format!(" {} ", self.message.role.to_string());
        let inner_width = wrapped
            .iter()
            .map(|line| return line.chars().count())
            .max()
            .unwrap_or(0)
            .max(title.chars().count());

        let mut lines = vec![];

        let top_fill = "─".repeat(inner_width - title.chars().count() + 1);
        lines.push(self.aligned(vec![Span::styled(format!("╭─{title}{top_fill}╮"), accent)]));

        for text_line in wrapped {
            let fill = " ".repeat(inner_width - text_line.chars().count());
            lines.push(self.aligned(vec![
                Span::styled("│ ".to_string(), accent),
                Span::styled(text_line, text_style),
                Span::styled(format!("{fill} │"), accent),
            ]));
        }

        let bottom_fill = "─".repeat(inner_width + 2);
        lines.push(self.aligned(vec![Span::styled(format!("╰{bottom_fill}╯"), accent)]));

        return lines;
    }

    fn aligned(&self, mut spans: Vec<Span<'static>>) -> Line<'static> {
        let used: usize = spans
            .iter()
            .map(|span| return span.content.chars().count())
            .sum();
        let padding = " ".repeat(self.window_max_width.saturating_sub(used));

        if self.alignment == BubbleAlignment::Right {
            let mut padded = vec![Span::from(padding)];
            padded.append(&mut spans);
            return Line::from(padded);
        }

        spans.push(Span::from(padding));
        return Line::from(spans);
    }
}
