//! Session state for one run of the front-end.
//!
//! `SessionState` is a plain value. Every transition consumes the old value and
//! returns a new one, so the controller only ever swaps the whole thing.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub prompt: String,
    pub busy: bool,
    pub error: Option<String>,
    pub response: Option<String>,
}

/// Which body panel is shown. Exactly one applies to any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display<'a> {
    Welcome,
    Loading,
    Error(&'a str),
    Response(&'a str),
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(self, prompt: String) -> Self {
        Self { prompt, ..self }
    }

    /// True when a submission would actually do something.
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.prompt.trim().is_empty()
    }

    /// Enter the loading state, dropping any previous outcome.
    pub fn loading(self) -> Self {
        Self {
            busy: true,
            error: None,
            response: None,
            ..self
        }
    }

    pub fn failed(self, message: String) -> Self {
        Self {
            busy: false,
            error: Some(message),
            response: None,
            ..self
        }
    }

    pub fn succeeded(self, text: String) -> Self {
        Self {
            busy: false,
            error: None,
            response: Some(text),
            ..self
        }
    }

    pub fn display(&self) -> Display<'_> {
        if self.busy {
            Display::Loading
        } else if let Some(message) = &self.error {
            Display::Error(message)
        } else if let Some(text) = &self.response {
            Display::Response(text)
        } else {
            Display::Welcome
        }
    }
}
