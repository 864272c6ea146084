//! Suggestion resolver.
//!
//! Pure function from session facts to the chips to display next. Every
//! branch has an explicit fallback, so there is no error path.

use tracing::trace;

use crate::chains::ConversationChains;

/// The visitor's most recent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction<'a> {
    /// A suggestion chip was clicked; carries the chip text.
    Chip(&'a str),
    /// A message was typed freely.
    Typed(&'a str),
}

/// Everything the resolver looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveInput<'a> {
    /// At least one message has been exchanged.
    pub has_messages: bool,
    /// The most recent message is the visitor's, so a reply is pending.
    pub awaiting_reply: bool,
    pub last_action: Option<UserAction<'a>>,
}

/// Suggestions to show for `input`, borrowed from `chains`.
///
/// 1. Nothing exchanged yet: the entry questions.
/// 2. Reply pending: nothing.
/// 3. Chip `Q` clicked: `Q`'s edges (empty for the terminal), or the entries
///    if `Q` is not a node.
/// 4. Free text: edges of the first matching topic node, else the entries.
pub fn resolve<'c>(chains: &'c ConversationChains, input: &ResolveInput<'_>) -> &'c [String] {
    let graph = chains.graph();

    if !input.has_messages {
        return graph.entries();
    }
    if input.awaiting_reply {
        return &[];
    }

    let suggestions = match input.last_action {
        Some(UserAction::Chip(question)) => graph.edges(question).unwrap_or(graph.entries()),
        Some(UserAction::Typed(text)) => chains
            .classifier()
            .classify(text)
            .and_then(|node| graph.edges(node))
            .unwrap_or(graph.entries()),
        None => graph.entries(),
    };

    trace!(mode = %chains.mode(), count = suggestions.len(), "Suggestions resolved");
    suggestions
}
