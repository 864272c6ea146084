//! System prompt and request assembly.

use std::path::Path;

use tracing::{info, warn};

use folio_core::config::ChatConfig;
use folio_core::types::{ChatMessage, Mode, Role};

use crate::completion::{CompletionRequest, PromptMessage, PromptRole};
use crate::error::ChatError;

const BASIC_PERSONA: &str = "You are the friendly guide on a software engineer's portfolio site. \
Answer visitors in plain language, two to four short sentences, no jargon. \
Only use facts from the knowledge base below; if something is not covered, say so and \
suggest getting in touch. Refer to the engineer as \"he\".";

const TECHNICAL_PERSONA: &str = "You are the technical guide on a software engineer's portfolio site. \
The visitor is an engineer or hiring manager. Be precise and concrete about architecture, \
trade-offs and tooling, in at most two short paragraphs. Only use facts from the knowledge \
base below; never invent projects, employers or numbers. Refer to the engineer as \"he\".";

const BUILTIN_KNOWLEDGE: &str = "\
Role: backend and infrastructure engineer, eight years of experience, currently freelancing.
Strengths: distributed systems, observability, developer tooling, Rust and TypeScript.
Background: computer science degree; previously platform team lead at a logistics company.
Projects:
- PulseOps: incident and alerting platform. Rust services on tokio, event pipeline with \
deduplication and alert grouping, Postgres storage, React dashboard.
- Ledgerline: double-entry bookkeeping API for small businesses. Strongly typed domain model, \
idempotent writes, audit log, reconciliation jobs.
- Driftwood: offline-first note taking app. TypeScript and React front end, CRDT sync, \
small Rust sync server.
Practices: property tests and integration tests in CI, code review on every change, \
tracing-based observability from day one.
Availability: open to senior backend or platform roles and to freelance contracts.
Contact: through the contact window on this site or the email listed on the resume page.";

/// Most prior turns ever sent with a new message.
pub const MAX_HISTORY_TURNS: usize = 6;

/// Builds completion requests for a session.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    knowledge: String,
    history_turns: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(BUILTIN_KNOWLEDGE, MAX_HISTORY_TURNS)
    }
}

impl PromptBuilder {
    /// `history_turns` above [`MAX_HISTORY_TURNS`] is clamped.
    pub fn new(knowledge: impl Into<String>, history_turns: usize) -> Self {
        if history_turns > MAX_HISTORY_TURNS {
            warn!(
                requested = history_turns,
                max = MAX_HISTORY_TURNS,
                "History window too large, clamping"
            );
        }
        let history_turns = history_turns.min(MAX_HISTORY_TURNS);
        Self {
            knowledge: knowledge.into(),
            history_turns,
        }
    }

    /// Use `chat.knowledge_path` when set, otherwise the built-in knowledge base.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let knowledge = match config.knowledge_path.as_deref() {
            Some(path) => {
                let text = std::fs::read_to_string(Path::new(path))
                    .map_err(|e| ChatError::StorageError(format!("{}: {}", path, e)))?;
                info!(path, bytes = text.len(), "Knowledge base loaded");
                text
            }
            None => BUILTIN_KNOWLEDGE.to_string(),
        };
        Ok(Self::new(knowledge, config.history_turns))
    }

    pub fn system_prompt(&self, mode: Mode) -> String {
        let persona = match mode {
            Mode::Basic => BASIC_PERSONA,
            Mode::Technical => TECHNICAL_PERSONA,
        };
        format!("{}\n\nKnowledge base:\n{}", persona, self.knowledge.trim())
    }

    /// System prompt, the trailing `history_turns` of `prior`, then `message`.
    pub fn build(&self, mode: Mode, prior: &[ChatMessage], message: &str) -> CompletionRequest {
        let start = prior.len().saturating_sub(self.history_turns);
        let mut messages = Vec::with_capacity(prior.len() - start + 2);

        messages.push(PromptMessage::new(PromptRole::System, self.system_prompt(mode)));
        messages.extend(prior[start..].iter().map(|m| {
            let role = match m.role {
                Role::User => PromptRole::User,
                Role::Assistant => PromptRole::Assistant,
            };
            PromptMessage::new(role, m.content.clone())
        }));
        messages.push(PromptMessage::new(PromptRole::User, message));

        CompletionRequest { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{}", i))
                } else {
                    ChatMessage::assistant(format!("a{}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_system_prompt_differs_by_mode_and_embeds_knowledge() {
        let builder = PromptBuilder::default();
        let basic = builder.system_prompt(Mode::Basic);
        let tech = builder.system_prompt(Mode::Technical);
        assert_ne!(basic, tech);
        assert!(basic.contains("PulseOps"));
        assert!(tech.contains("Knowledge base:"));
    }

    #[test]
    fn test_build_with_empty_history() {
        let request = PromptBuilder::default().build(Mode::Basic, &[], "hello");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, PromptRole::System);
        assert_eq!(request.messages[1], PromptMessage::new(PromptRole::User, "hello"));
    }

    #[test]
    fn test_build_keeps_only_last_six_turns() {
        let prior = history(10);
        let request = PromptBuilder::default().build(Mode::Technical, &prior, "next");

        assert_eq!(request.messages.len(), 1 + 6 + 1);
        assert_eq!(request.messages[1].content, "q4");
        assert_eq!(request.messages[1].role, PromptRole::User);
        assert_eq!(request.messages[6].content, "a9");
        assert_eq!(request.messages[6].role, PromptRole::Assistant);
        assert_eq!(request.messages[7].content, "next");
    }

    #[test]
    fn test_history_window_is_clamped() {
        let config = ChatConfig {
            history_turns: 10,
            ..ChatConfig::default()
        };
        let builder = PromptBuilder::from_config(&config).unwrap();
        let request = builder.build(Mode::Basic, &history(10), "next");
        assert_eq!(request.messages.len(), 1 + MAX_HISTORY_TURNS + 1);
        assert_eq!(request.messages[1].content, "q4");
    }

    #[test]
    fn test_build_short_history_is_kept_whole() {
        let prior = history(3);
        let request = PromptBuilder::new("kb", 6).build(Mode::Basic, &prior, "next");
        assert_eq!(request.messages.len(), 5);
        assert!(request.messages[0].content.ends_with("kb"));
    }

    #[test]
    fn test_from_config_reads_knowledge_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kb.txt");
        std::fs::write(&path, "Only fact: likes tea.\n").unwrap();

        let config = ChatConfig {
            knowledge_path: Some(path.to_string_lossy().to_string()),
            history_turns: 2,
            ..ChatConfig::default()
        };
        let builder = PromptBuilder::from_config(&config).unwrap();
        assert!(builder.system_prompt(Mode::Basic).ends_with("Only fact: likes tea."));

        let request = builder.build(Mode::Basic, &history(5), "x");
        assert_eq!(request.messages.len(), 4);
    }

    #[test]
    fn test_from_config_missing_knowledge_file() {
        let config = ChatConfig {
            knowledge_path: Some("/does/not/exist.txt".to_string()),
            ..ChatConfig::default()
        };
        assert!(PromptBuilder::from_config(&config).is_err());
    }
}
