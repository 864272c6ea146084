//! Topic classifier for free-text messages.
//!
//! An ordered list of regex rules matched against the lower-cased message.
//! The first rule that matches names the chain node whose follow-ups are
//! offered; when nothing matches the caller falls back to the entries.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A single topic rule as authored in chain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    /// Regex over the message text, matched case-insensitively.
    pub pattern: String,
    /// Chain node selected when the pattern matches.
    pub node: String,
}

impl TopicRule {
    pub fn new(pattern: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            node: node.into(),
        }
    }
}

struct CompiledRule {
    regex: Regex,
    node: String,
}

/// Compiled, ordered topic rules. First match wins.
pub struct TopicClassifier {
    rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for TopicClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicClassifier")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl TopicClassifier {
    /// Compile `rules`, keeping their order. Patterns ignore case, so
    /// authored capitals still match the lower-cased message.
    pub fn new(rules: &[TopicRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledRule {
                        regex,
                        node: rule.node.clone(),
                    })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Node selected for `text`, or `None` if no rule matches.
    pub fn classify(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(&lower))
            .map(|rule| rule.node.as_str())
    }

    /// `(pattern, node)` pairs in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules
            .iter()
            .map(|rule| (rule.regex.as_str(), rule.node.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TopicClassifier {
        TopicClassifier::new(&[
            TopicRule::new(r"pulse\s*ops", "Tell me about PulseOps"),
            TopicRule::new(r"\bprojects?\b", "What has he built?"),
            TopicRule::new(r"\bhire\b", "Is he available for hire?"),
        ])
        .unwrap()
    }

    #[test]
    fn test_classify_is_case_insensitive_via_lowercasing() {
        let c = classifier();
        assert_eq!(c.classify("Tell me about PULSEOPS"), Some("Tell me about PulseOps"));
        assert_eq!(c.classify("pulse ops?"), Some("Tell me about PulseOps"));
    }

    #[test]
    fn test_mixed_case_pattern_matches() {
        let c = TopicClassifier::new(&[TopicRule::new(
            r"\bPulseOps\b",
            "Tell me about PulseOps",
        )])
        .unwrap();
        assert_eq!(c.classify("Tell me about PulseOps"), Some("Tell me about PulseOps"));
        assert_eq!(c.classify("what is pulseops"), Some("Tell me about PulseOps"));
    }

    #[test]
    fn test_first_match_wins() {
        let c = classifier();
        assert_eq!(
            c.classify("is the pulseops project why I should hire him"),
            Some("Tell me about PulseOps")
        );
        assert_eq!(c.classify("any projects? I want to hire"), Some("What has he built?"));
    }

    #[test]
    fn test_no_match_is_none() {
        let c = classifier();
        assert_eq!(c.classify("what do you think of the weather"), None);
        assert_eq!(c.classify(""), None);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = TopicClassifier::new(&[TopicRule::new("(unclosed", "X")]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rules_keep_order() {
        let c = classifier();
        let nodes: Vec<&str> = c.rules().map(|(_, node)| node).collect();
        assert_eq!(
            nodes,
            vec!["Tell me about PulseOps", "What has he built?", "Is he available for hire?"]
        );
        assert_eq!(c.len(), 3);
    }
}
