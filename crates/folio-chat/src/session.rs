//! Chat session state.
//!
//! A send is a two-phase transition: [`ChatSession::begin_send`] appends the
//! visitor's message tentatively, then [`ChatSession::finish_send`] either
//! commits the reply, reverts to the pre-send snapshot on failure, or (for a
//! cancelled request) leaves everything as it is. Only the latest send may
//! finish; completions from superseded sends are discarded.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use folio_core::types::{ChatMessage, Mode};

use crate::chains::ChainSet;
use crate::error::{ChatError, CompletionError};
use crate::resolver::{resolve, ResolveInput, UserAction};

/// Owned form of the visitor's last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastAction {
    Chip(String),
    Typed(String),
}

impl LastAction {
    pub fn text(&self) -> &str {
        match self {
            LastAction::Chip(text) | LastAction::Typed(text) => text,
        }
    }

    pub fn as_user_action(&self) -> UserAction<'_> {
        match self {
            LastAction::Chip(text) => UserAction::Chip(text),
            LastAction::Typed(text) => UserAction::Typed(text),
        }
    }
}

/// Result of awaiting the completion provider.
#[derive(Debug)]
pub enum CompletionOutcome {
    Reply(String),
    Failed(CompletionError),
    Cancelled,
}

/// What a finished send did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The reply was committed.
    Replied(ChatMessage),
    /// The request was cancelled by a newer send.
    Cancelled,
    /// A newer send had already started; this result was discarded.
    Superseded,
}

/// Handle for an in-flight send.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub generation: u64,
    pub mode: Mode,
    pub token: CancellationToken,
    /// Messages before the tentative append.
    pub prior: Vec<ChatMessage>,
    pub message: String,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
    snapshot_len: usize,
    snapshot_action: Option<LastAction>,
}

/// State of one open chat widget.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    mode: Option<Mode>,
    messages: Vec<ChatMessage>,
    last_action: Option<LastAction>,
    generation: u64,
    in_flight: Option<InFlight>,
    notice: Option<&'static str>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: None,
            messages: Vec::new(),
            last_action: None,
            generation: 0,
            in_flight: None,
            notice: None,
        }
    }

    pub fn with_mode(mode: Mode) -> Self {
        let mut session = Self::new();
        session.mode = Some(mode);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Choose the conversation mode. It cannot change afterwards.
    pub fn select_mode(&mut self, mode: Mode) -> Result<(), ChatError> {
        if let Some(current) = self.mode {
            return Err(ChatError::ModeAlreadySelected(current));
        }
        info!(session = %self.id, %mode, "Conversation mode selected");
        self.mode = Some(mode);
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_action(&self) -> Option<&LastAction> {
        self.last_action.as_ref()
    }

    /// Inline notice from the latest rejected or failed send.
    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    pub fn set_notice(&mut self, notice: &'static str) {
        self.notice = Some(notice);
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.messages.last().is_some_and(ChatMessage::is_from_user)
    }

    /// Resolver input derived from the current state.
    pub fn resolve_input(&self) -> ResolveInput<'_> {
        ResolveInput {
            has_messages: !self.messages.is_empty(),
            awaiting_reply: self.is_awaiting_reply(),
            last_action: self.last_action.as_ref().map(LastAction::as_user_action),
        }
    }

    /// Suggestions for the current state; none until a mode is chosen.
    pub fn suggestions<'c>(&self, chains: &'c ChainSet) -> &'c [String] {
        match self.mode {
            Some(mode) => resolve(chains.for_mode(mode), &self.resolve_input()),
            None => &[],
        }
    }

    /// Reject sends that must never reach the network.
    pub fn validate(&self, text: &str, max_chars: usize) -> Result<Mode, ChatError> {
        let mode = self.mode.ok_or(ChatError::ModeNotSelected)?;
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > max_chars {
            return Err(ChatError::MessageTooLong(max_chars));
        }
        Ok(mode)
    }

    /// Phase one: cancel any in-flight send and append the message tentatively.
    pub fn begin_send(&mut self, action: LastAction) -> Result<PendingSend, ChatError> {
        let mode = self.mode.ok_or(ChatError::ModeNotSelected)?;

        if let Some(previous) = self.in_flight.take() {
            debug!(session = %self.id, generation = previous.generation, "Cancelling superseded send");
            previous.token.cancel();
        }

        self.generation += 1;
        let token = CancellationToken::new();
        let prior = self.messages.clone();
        let message = action.text().trim().to_string();

        self.in_flight = Some(InFlight {
            generation: self.generation,
            token: token.clone(),
            snapshot_len: self.messages.len(),
            snapshot_action: self.last_action.clone(),
        });
        self.messages.push(ChatMessage::user(message.clone()));
        self.last_action = Some(action);
        self.notice = None;

        Ok(PendingSend {
            generation: self.generation,
            mode,
            token,
            prior,
            message,
        })
    }

    /// Phase two: apply the provider outcome for `generation`.
    pub fn finish_send(
        &mut self,
        generation: u64,
        outcome: CompletionOutcome,
    ) -> Result<SendOutcome, ChatError> {
        let current = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation);
        if !current {
            debug!(session = %self.id, generation, "Discarding stale completion");
            return Ok(match outcome {
                CompletionOutcome::Cancelled => SendOutcome::Cancelled,
                _ => SendOutcome::Superseded,
            });
        }

        match outcome {
            CompletionOutcome::Reply(text) => {
                self.in_flight = None;
                let reply = ChatMessage::assistant(text);
                self.messages.push(reply.clone());
                Ok(SendOutcome::Replied(reply))
            }
            CompletionOutcome::Failed(err) => {
                if let Some(flight) = self.in_flight.take() {
                    self.messages.truncate(flight.snapshot_len);
                    self.last_action = flight.snapshot_action;
                }
                warn!(session = %self.id, error = %err, "Completion failed, send rolled back");
                self.notice = Some(err.user_notice());
                Err(ChatError::Completion(err))
            }
            CompletionOutcome::Cancelled => {
                self.in_flight = None;
                Ok(SendOutcome::Cancelled)
            }
        }
    }

    /// Cancel the in-flight send, if any, without touching messages.
    pub fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            flight.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::TERMINAL_QUESTION;

    fn chains() -> ChainSet {
        ChainSet::builtin()
    }

    // ---- Mode ----

    #[test]
    fn test_mode_is_chosen_once() {
        let mut session = ChatSession::new();
        assert!(session.suggestions(&chains()).is_empty());
        session.select_mode(Mode::Technical).unwrap();
        let err = session.select_mode(Mode::Basic).unwrap_err();
        assert!(matches!(err, ChatError::ModeAlreadySelected(Mode::Technical)));
        assert_eq!(session.mode(), Some(Mode::Technical));
    }

    #[test]
    fn test_send_requires_mode() {
        let mut session = ChatSession::new();
        assert!(matches!(
            session.begin_send(LastAction::Typed("hi".into())),
            Err(ChatError::ModeNotSelected)
        ));
        assert!(session.messages().is_empty());
    }

    // ---- Validation ----

    #[test]
    fn test_validate_rejects_blank_and_long() {
        let session = ChatSession::with_mode(Mode::Basic);
        assert!(matches!(session.validate("   \n", 10), Err(ChatError::EmptyMessage)));
        assert!(matches!(
            session.validate("abcdefghijk", 10),
            Err(ChatError::MessageTooLong(10))
        ));
        assert_eq!(session.validate("hello", 10).unwrap(), Mode::Basic);
    }

    // ---- Two-phase send ----

    #[test]
    fn test_fresh_session_shows_entries() {
        let set = chains();
        let session = ChatSession::with_mode(Mode::Basic);
        assert_eq!(
            session.suggestions(&set),
            set.for_mode(Mode::Basic).graph().entries()
        );
    }

    #[test]
    fn test_pending_send_hides_suggestions() {
        let set = chains();
        let mut session = ChatSession::with_mode(Mode::Basic);
        let pending = session.begin_send(LastAction::Chip("What has he built?".into())).unwrap();

        assert_eq!(pending.generation, 1);
        assert!(pending.prior.is_empty());
        assert!(session.is_awaiting_reply());
        assert!(session.suggestions(&set).is_empty());
    }

    #[test]
    fn test_commit_then_chip_edges() {
        let set = chains();
        let mut session = ChatSession::with_mode(Mode::Basic);
        let pending = session.begin_send(LastAction::Chip("What has he built?".into())).unwrap();
        let outcome = session
            .finish_send(pending.generation, CompletionOutcome::Reply("Three things.".into()))
            .unwrap();

        assert!(matches!(outcome, SendOutcome::Replied(ref m) if m.content == "Three things."));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(
            session.suggestions(&set),
            set.for_mode(Mode::Basic).graph().edges("What has he built?").unwrap()
        );
    }

    #[test]
    fn test_terminal_chip_leaves_no_suggestions() {
        let set = chains();
        let mut session = ChatSession::with_mode(Mode::Technical);
        let pending = session.begin_send(LastAction::Chip(TERMINAL_QUESTION.into())).unwrap();
        session
            .finish_send(pending.generation, CompletionOutcome::Reply("Use the contact window.".into()))
            .unwrap();
        assert!(session.suggestions(&set).is_empty());
    }

    #[test]
    fn test_failure_rolls_back_to_snapshot() {
        let set = chains();
        let mut session = ChatSession::with_mode(Mode::Basic);
        let first = session.begin_send(LastAction::Chip("What does he do?".into())).unwrap();
        session
            .finish_send(first.generation, CompletionOutcome::Reply("Backend work.".into()))
            .unwrap();
        let before = session.suggestions(&set).to_vec();

        let second = session.begin_send(LastAction::Typed("pulseops?".into())).unwrap();
        assert_eq!(second.prior.len(), 2);
        let err = session
            .finish_send(
                second.generation,
                CompletionOutcome::Failed(CompletionError::Status {
                    status: 500,
                    body: String::new(),
                }),
            )
            .unwrap_err();

        assert_eq!(err.user_notice(), crate::error::NOTICE_GENERIC_FAILURE);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.notice(), Some(crate::error::NOTICE_GENERIC_FAILURE));
        assert_eq!(
            session.last_action(),
            Some(&LastAction::Chip("What does he do?".into()))
        );
        assert_eq!(session.suggestions(&set), before.as_slice());
    }

    #[test]
    fn test_superseded_send_is_cancelled_and_discarded() {
        let mut session = ChatSession::with_mode(Mode::Basic);
        let first = session.begin_send(LastAction::Typed("first".into())).unwrap();
        let second = session.begin_send(LastAction::Typed("second".into())).unwrap();

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert_eq!(second.prior.len(), 1);

        // A late reply for the first send must not land.
        let late = session
            .finish_send(first.generation, CompletionOutcome::Reply("stale".into()))
            .unwrap();
        assert_eq!(late, SendOutcome::Superseded);
        let late_err = session
            .finish_send(
                first.generation,
                CompletionOutcome::Failed(CompletionError::Transport("x".into())),
            )
            .unwrap();
        assert_eq!(late_err, SendOutcome::Superseded);
        assert_eq!(session.messages().len(), 2);

        session
            .finish_send(second.generation, CompletionOutcome::Reply("fresh".into()))
            .unwrap();
        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "fresh"]);
    }

    #[test]
    fn test_cancelled_outcome_keeps_state() {
        let mut session = ChatSession::with_mode(Mode::Basic);
        let pending = session.begin_send(LastAction::Typed("hello".into())).unwrap();
        let outcome = session
            .finish_send(pending.generation, CompletionOutcome::Cancelled)
            .unwrap();
        assert_eq!(outcome, SendOutcome::Cancelled);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.notice(), None);
    }

    #[test]
    fn test_cancel_in_flight() {
        let mut session = ChatSession::with_mode(Mode::Basic);
        let pending = session.begin_send(LastAction::Typed("hello".into())).unwrap();
        session.cancel_in_flight();
        assert!(pending.token.is_cancelled());
        let outcome = session
            .finish_send(pending.generation, CompletionOutcome::Reply("late".into()))
            .unwrap();
        assert_eq!(outcome, SendOutcome::Superseded);
    }

    #[test]
    fn test_message_is_trimmed() {
        let mut session = ChatSession::with_mode(Mode::Basic);
        let pending = session.begin_send(LastAction::Typed("  hi there \n".into())).unwrap();
        assert_eq!(pending.message, "hi there");
        assert_eq!(session.messages()[0].content, "hi there");
    }
}
