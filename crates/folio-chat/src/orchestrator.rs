//! Chat orchestrator: central coordinator wiring session, limiter and provider.
//!
//! The session lives behind a mutex that is never held across an await, so
//! several sends may be in flight at once; only the latest one is applied.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use folio_core::config::ChatConfig;
use folio_core::types::{ChatMessage, Mode};

use crate::chains::ChainSet;
use crate::completion::CompletionService;
use crate::error::ChatError;
use crate::prompt::PromptBuilder;
use crate::rate_limit::RateLimiter;
use crate::session::{ChatSession, CompletionOutcome, LastAction, SendOutcome};

/// Central chat coordinator for one open chat widget.
pub struct ChatOrchestrator {
    chains: Arc<ChainSet>,
    completion: Arc<dyn CompletionService>,
    limiter: RateLimiter,
    prompts: PromptBuilder,
    session: Mutex<ChatSession>,
    max_message_chars: usize,
}

impl ChatOrchestrator {
    pub fn new(
        config: &ChatConfig,
        chains: Arc<ChainSet>,
        completion: Arc<dyn CompletionService>,
        limiter: RateLimiter,
        prompts: PromptBuilder,
    ) -> Self {
        let session = match config.default_mode {
            Some(mode) => ChatSession::with_mode(mode),
            None => ChatSession::new(),
        };
        info!(session = %session.id(), mode = ?session.mode(), "Chat session opened");
        Self {
            chains,
            completion,
            limiter,
            prompts,
            session: Mutex::new(session),
            max_message_chars: config.max_message_chars,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ChatSession>, ChatError> {
        self.session
            .lock()
            .map_err(|e| ChatError::SessionPoisoned(e.to_string()))
    }

    pub fn select_mode(&self, mode: Mode) -> Result<(), ChatError> {
        self.lock()?.select_mode(mode)
    }

    pub fn mode(&self) -> Result<Option<Mode>, ChatError> {
        Ok(self.lock()?.mode())
    }

    /// Chips to display for the current state.
    pub fn suggestions(&self) -> Result<Vec<String>, ChatError> {
        Ok(self.lock()?.suggestions(&self.chains).to_vec())
    }

    pub fn messages(&self) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.lock()?.messages().to_vec())
    }

    pub fn notice(&self) -> Result<Option<&'static str>, ChatError> {
        Ok(self.lock()?.notice())
    }

    /// Send a freely typed message.
    pub async fn send_text(&self, text: &str) -> Result<SendOutcome, ChatError> {
        self.dispatch(LastAction::Typed(text.to_string())).await
    }

    /// Send the question on a clicked suggestion chip.
    pub async fn click_chip(&self, chip: &str) -> Result<SendOutcome, ChatError> {
        self.dispatch(LastAction::Chip(chip.to_string())).await
    }

    /// Abort the in-flight request; its result will be discarded.
    pub fn cancel(&self) -> Result<(), ChatError> {
        self.lock()?.cancel_in_flight();
        Ok(())
    }

    async fn dispatch(&self, action: LastAction) -> Result<SendOutcome, ChatError> {
        let (pending, request) = {
            let mut session = self.lock()?;

            if let Err(e) = session.validate(action.text(), self.max_message_chars) {
                session.set_notice(e.user_notice());
                return Err(e);
            }
            if !self.limiter.try_acquire()? {
                session.set_notice(ChatError::RateLimited.user_notice());
                return Err(ChatError::RateLimited);
            }

            let pending = session.begin_send(action)?;
            let request = self
                .prompts
                .build(pending.mode, &pending.prior, &pending.message);
            (pending, request)
        };

        debug!(generation = pending.generation, "Awaiting completion");
        let outcome = tokio::select! {
            _ = pending.token.cancelled() => CompletionOutcome::Cancelled,
            result = self.completion.complete(request) => match result {
                Ok(text) => CompletionOutcome::Reply(text),
                Err(e) => CompletionOutcome::Failed(e),
            },
        };

        self.lock()?.finish_send(pending.generation, outcome)
    }
}
