use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::ChatError;
use crate::gemini::{GenerateContentRequest, TextGenerator};
use crate::session::SessionState;

/// A request that has passed validation and is ready to go out.
///
/// Produced by [`Controller::begin_submit`]; the result of [`Pending::run`]
/// goes back through [`Controller::finish`].
pub struct Pending {
    pub request: GenerateContentRequest,
    generator: Arc<dyn TextGenerator>,
}

impl Pending {
    pub async fn run(self) -> Result<String, ChatError> {
        self.generator.generate(&self.request).await
    }
}

/// Owns the session state and the one outbound call per submission.
pub struct Controller {
    state: SessionState,
    // None when no API key was configured at startup
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Controller {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            state: SessionState::new(),
            generator,
        }
    }

    #[cfg(test)]
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state,
            generator: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    fn transition(&mut self, f: impl FnOnce(SessionState) -> SessionState) {
        let current = std::mem::take(&mut self.state);
        self.state = f(current);
    }

    pub fn update_prompt(&mut self, text: String) {
        self.transition(|s| s.with_prompt(text));
    }

    /// Validate and enter the loading state.
    ///
    /// Returns `None` when nothing should be sent: blank prompt, a call
    /// already in flight, or no API key (the last one also records the
    /// configuration error).
    pub fn begin_submit(&mut self) -> Option<Pending> {
        if !self.state.can_submit() {
            debug!(busy = self.state.busy, "submit ignored");
            return None;
        }

        let Some(generator) = self.generator.clone() else {
            warn!("submit rejected: no API key configured");
            self.transition(|s| s.loading().failed(ChatError::MissingApiKey.to_string()));
            return None;
        };

        self.transition(SessionState::loading);
        let request = GenerateContentRequest::user_prompt(&self.state.prompt);
        info!(prompt_chars = self.state.prompt.chars().count(), "submitting prompt");

        Some(Pending { request, generator })
    }

    /// Settle the in-flight submission. Always leaves the controller idle.
    pub fn finish(&mut self, result: Result<String, ChatError>) {
        if !self.state.busy {
            debug!("result arrived with no submission in flight; dropped");
            return;
        }

        match result {
            Ok(text) => {
                info!(response_chars = text.chars().count(), "response received");
                self.transition(|s| s.succeeded(text));
            }
            Err(err) => {
                match &err {
                    ChatError::Unexpected(message) => error!("request failed: {}", message),
                    ChatError::Api { status, message } => {
                        warn!(status = *status, "request failed: {}", message)
                    }
                    other => warn!("request failed: {}", other),
                }
                self.transition(|s| s.failed(err.to_string()));
            }
        }
    }

    /// Run a whole submission to completion.
    pub async fn submit(&mut self) {
        if let Some(pending) = self.begin_submit() {
            let result = pending.run().await;
            self.finish(result);
        }
    }
}
