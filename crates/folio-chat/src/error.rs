//! Error types for the chat engine.
//!
//! Raw errors are logged; visitors only ever see the fixed notices below.

use folio_core::error::FolioError;
use folio_core::types::Mode;

pub const NOTICE_EMPTY_MESSAGE: &str = "Type a question first.";
pub const NOTICE_MESSAGE_TOO_LONG: &str = "That message is too long. Try something shorter.";
pub const NOTICE_LOCAL_RATE_LIMIT: &str =
    "You're sending messages quickly. Please wait a couple of minutes before asking again.";
pub const NOTICE_PROVIDER_RATE_LIMIT: &str =
    "Lots of people are chatting right now. Please try again in a moment.";
pub const NOTICE_UNAVAILABLE: &str = "The chat assistant is unavailable right now.";
pub const NOTICE_GENERIC_FAILURE: &str = "Sorry, something went wrong. Please try again.";
pub const NOTICE_PICK_MODE: &str = "Pick a conversation style to get started.";

/// Failures reported by a completion provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("completion provider rate limited the request")]
    RateLimited,
    #[error("completion provider rejected the credentials")]
    Unauthorized,
    #[error("no API key configured (set {0})")]
    MissingApiKey(String),
    #[error("completion provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed completion response: {0}")]
    Decode(String),
}

impl CompletionError {
    /// Map an HTTP status to the provider error taxonomy.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => CompletionError::RateLimited,
            401 => CompletionError::Unauthorized,
            _ => CompletionError::Status { status, body },
        }
    }

    /// Fixed, non-technical text shown to the visitor.
    pub fn user_notice(&self) -> &'static str {
        match self {
            CompletionError::RateLimited => NOTICE_PROVIDER_RATE_LIMIT,
            CompletionError::Unauthorized | CompletionError::MissingApiKey(_) => {
                NOTICE_UNAVAILABLE
            }
            CompletionError::Status { .. }
            | CompletionError::Transport(_)
            | CompletionError::Decode(_) => NOTICE_GENERIC_FAILURE,
        }
    }
}

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no conversation mode selected")]
    ModeNotSelected,
    #[error("conversation mode already selected: {0}")]
    ModeAlreadySelected(Mode),
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("send rate limit exceeded")]
    RateLimited,
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("invalid conversation chains: {0}")]
    InvalidChains(String),
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("chat session state is unavailable: {0}")]
    SessionPoisoned(String),
}

impl ChatError {
    /// Fixed text shown inline in the chat widget.
    pub fn user_notice(&self) -> &'static str {
        match self {
            ChatError::ModeNotSelected => NOTICE_PICK_MODE,
            ChatError::EmptyMessage => NOTICE_EMPTY_MESSAGE,
            ChatError::MessageTooLong(_) => NOTICE_MESSAGE_TOO_LONG,
            ChatError::RateLimited => NOTICE_LOCAL_RATE_LIMIT,
            ChatError::Completion(e) => e.user_notice(),
            ChatError::ModeAlreadySelected(_)
            | ChatError::InvalidChains(_)
            | ChatError::StorageError(_)
            | ChatError::SessionPoisoned(_) => NOTICE_GENERIC_FAILURE,
        }
    }
}

impl From<FolioError> for ChatError {
    fn from(err: FolioError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
