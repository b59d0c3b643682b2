#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;

use ratatui::widgets::ScrollbarState;

#[derive(Default)]
pub struct Scroll {
    content_height: u16,
    viewport_height: u16,
    pub position: u16,
    pub scrollbar_state: ScrollbarState,
}

impl Scroll {
    fn max_position(&self) -> u16 {
        return self.content_height.saturating_sub(self.viewport_height);
    }

    fn page_step(&self) -> u16 {
        return (self.viewport_height / 2).max(1);
    }

    pub fn up(&mut self) {
        self.position = self.position.saturating_sub(1);
        self.scrollbar_state.prev();
    }

    pub fn down(&mut self) {
        self.position = self.position.saturating_add(1).min(self.max_position());
        self.scrollbar_state.next();
    }

    pub fn up_page(&mut self) {
        self.position = self.position.saturating_sub(self.page_step());
        self.scrollbar_state = self.scrollbar_state.position(self.position);
    }

    pub fn down_page(&mut self) {
        self.position = self
            .position
            .saturating_add(self.page_step())
            .min(self.max_position());
        self.scrollbar_state = self.scrollbar_state.position(self.position);
    }

    pub fn jump_to_end(&mut self) {
        self.position = self.max_position();
        self.scrollbar_state.last();
    }

    pub fn resize(&mut self, content_height: u16, viewport_height: u16) {
        self.content_height = content_height;
        self.viewport_height = viewport_height;
        self.position = self.position.min(self.max_position());
        self.scrollbar_state = self
            .scrollbar_state
            .content_length(content_height)
            .viewport_content_length(viewport_height)
            .position(self.position);
    }
}
