use std::collections::HashMap;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::Bubble;
use crate::domain::models::Message;
use crate::domain::models::ThemeName;

struct BubbleCacheEntry {
    content_len: usize,
    lines: Vec<Line<'static>>,
}

/// Renders the transcript as a stack of bubbles. Rendered lines are cached
/// per message; only the tail message is re-rendered while a stream is
/// appending to it.
pub struct BubbleList {
    cache: HashMap<usize, BubbleCacheEntry>,
    line_width: usize,
    lines_len: usize,
    theme: ThemeName,
}

impl BubbleList {
    pub fn new(theme: ThemeName) -> BubbleList {
        return BubbleList {
            cache: HashMap::new(),
            line_width: 0,
            lines_len: 0,
            theme,
        };
    }

    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }
        // The conversation can shrink on reset, load, or a discarded reply.
        self.cache.retain(|idx, _| return *idx < messages.len());

        self.lines_len = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                if let Some(cache_entry) = self.cache.get(&idx) {
                    if idx < (messages.len() - 1)
                        || message.content.len() == cache_entry.content_len
                    {
                        return cache_entry.lines.len();
                    }
                }

                let bubble_lines = Bubble::new(message, self.theme, line_width).as_lines();
                let bubble_lines_len = bubble_lines.len();

                self.cache.insert(
                    idx,
                    BubbleCacheEntry {
                        content_len: message.content.len(),
                        lines: bubble_lines,
                    },
                );

                return bubble_lines_len;
            })
            .sum();
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, scroll: u16) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line<'static>> = indexes
            .iter()
            .filter_map(|idx| {
                return self
                    .cache
                    .get(idx)
                    .map(|entry| return entry.lines.to_owned());
            })
            .flatten()
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}
