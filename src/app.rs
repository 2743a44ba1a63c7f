use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::controller::Controller;
use crate::error::ChatError;
use crate::tui::AppEvent;
use crate::ui;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub controller: Controller,
    pub model: String,

    // Prompt editing
    pub cursor: usize, // char index into the prompt

    // Response view
    pub response_scroll: u16,
    pub body_height: u16, // inner size of the body panel, updated during render
    pub body_width: u16,
    pub body_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8,

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(controller: Controller, model: String, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            controller,
            model,
            cursor: 0,
            response_scroll: 0,
            body_height: 0,
            body_width: 0,
            body_area: None,
            animation_frame: 0,
            events,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.controller.state().prompt
    }

    /// The input box is read-only while a request is in flight.
    pub fn input_enabled(&self) -> bool {
        !self.controller.is_busy()
    }

    pub fn can_submit(&self) -> bool {
        self.controller.state().can_submit()
    }

    fn edit_prompt(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        if !self.input_enabled() {
            return;
        }
        let mut prompt = self.prompt().to_string();
        let mut cursor = self.cursor;
        edit(&mut prompt, &mut cursor);
        self.cursor = cursor;
        self.controller.update_prompt(prompt);
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit_prompt(|prompt, cursor| {
            let byte_pos = char_to_byte_index(prompt, *cursor);
            prompt.insert(byte_pos, c);
            *cursor += 1;
        });
    }

    /// Insert pasted text at the cursor, with CRLF and CR turned into line breaks.
    pub fn insert_text(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.edit_prompt(|prompt, cursor| {
            let byte_pos = char_to_byte_index(prompt, *cursor);
            prompt.insert_str(byte_pos, &text);
            *cursor += text.chars().count();
        });
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        self.edit_prompt(|prompt, cursor| {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(prompt, *cursor);
                prompt.remove(byte_pos);
            }
        });
    }

    pub fn delete(&mut self) {
        self.edit_prompt(|prompt, cursor| {
            if *cursor < prompt.chars().count() {
                let byte_pos = char_to_byte_index(prompt, *cursor);
                prompt.remove(byte_pos);
            }
        });
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.prompt().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.prompt().chars().count();
    }

    /// Row and column of the cursor inside the (possibly multi-line) prompt.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.prompt().chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (row, col)
    }

    /// Start a submission; the request runs on its own task and reports back
    /// through the event channel.
    pub fn submit(&mut self) {
        let Some(pending) = self.controller.begin_submit() else {
            return;
        };
        self.response_scroll = 0;
        self.animation_frame = 0;

        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = pending.run().await;
            if tx.send(AppEvent::Generated(result)).is_err() {
                debug!("event loop closed before the response arrived");
            }
        });
    }

    pub fn on_generated(&mut self, result: Result<String, ChatError>) {
        self.controller.finish(result);
        self.response_scroll = 0;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 12;
        }
    }

    /// Number of terminal rows the response occupies once wrapped.
    fn response_lines(&self) -> u16 {
        let Some(text) = self.controller.state().response.as_deref() else {
            return 0;
        };
        let wrap_width = if self.body_width > 0 { self.body_width } else { 80 };

        let rows = ui::response_paragraph(text).line_count(wrap_width);
        rows.min(u16::MAX as usize) as u16
    }

    fn max_scroll(&self) -> u16 {
        self.response_lines().saturating_sub(self.body_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.response_scroll = self.response_scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.response_scroll = self.response_scroll.saturating_sub(lines);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.body_height.max(1));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.body_height.max(1));
    }
}
