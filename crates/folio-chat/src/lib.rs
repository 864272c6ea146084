//! Conversation engine for the Folio chat widget.
//!
//! Holds the per-mode conversation chains, resolves which suggestion chips to
//! show next, throttles sends, talks to the completion provider, and keeps
//! session state with optimistic append and rollback.

pub mod chains;
pub mod classifier;
pub mod completion;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod prompt;
pub mod rate_limit;
pub mod resolver;
pub mod session;

pub use chains::{ChainSet, ConversationChains};
pub use classifier::{TopicClassifier, TopicRule};
pub use completion::{
    CompletionRequest, CompletionService, HttpCompletionClient, PromptMessage, PromptRole,
};
pub use error::{ChatError, CompletionError};
pub use graph::{ChainGraph, GraphDefect, MAX_CHAIN_DEPTH};
pub use orchestrator::ChatOrchestrator;
pub use prompt::PromptBuilder;
pub use rate_limit::RateLimiter;
pub use resolver::{resolve, ResolveInput, UserAction};
pub use session::{ChatSession, CompletionOutcome, LastAction, PendingSend, SendOutcome};
