//! Conversation chains: one graph plus topic classifier per mode.
//!
//! The built-in chains below are plain data. A replacement set can be loaded
//! from TOML; it is validated on load and rejected if any structural
//! invariant fails.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use folio_core::types::Mode;

use crate::classifier::{TopicClassifier, TopicRule};
use crate::error::ChatError;
use crate::graph::{ChainGraph, GraphDefect};

/// The one node with no continuation, shared by both modes.
pub const TERMINAL_QUESTION: &str = "How do I reach him?";

// =============================================================================
// Built-in data: basic (casual visitor)
// =============================================================================

const BASIC_ENTRIES: &[&str] = &[
    "What does he do?",
    "What has he built?",
    "Is he available for hire?",
];

const BASIC_NODES: &[(&str, &[&str])] = &[
    (
        "What does he do?",
        &["What's his background?", "What is he best at?", "What has he built?"],
    ),
    (
        "What's his background?",
        &["What is he best at?", "What has he built?", "Is he available for hire?"],
    ),
    (
        "What is he best at?",
        &["What has he built?", "Is he available for hire?"],
    ),
    (
        "What has he built?",
        &["Tell me about PulseOps", "Tell me about Ledgerline", "Tell me about Driftwood"],
    ),
    (
        "Tell me about PulseOps",
        &["Tell me about Ledgerline", "What has he built?", "Is he available for hire?"],
    ),
    (
        "Tell me about Ledgerline",
        &["Tell me about Driftwood", "What has he built?", "Is he available for hire?"],
    ),
    (
        "Tell me about Driftwood",
        &["Tell me about PulseOps", "What has he built?", "Is he available for hire?"],
    ),
    (
        "Is he available for hire?",
        &["What kind of roles?", "Does he take freelance work?", TERMINAL_QUESTION],
    ),
    (
        "What kind of roles?",
        &[TERMINAL_QUESTION, "What does he do?"],
    ),
    (TERMINAL_QUESTION, &[]),
];

const BASIC_TOPICS: &[(&str, &str)] = &[
    (r"pulse\s*ops", "Tell me about PulseOps"),
    (r"ledger\s*line", "Tell me about Ledgerline"),
    (r"driftwood", "Tell me about Driftwood"),
    (
        r"\b(contact|email|reach|linkedin|get in touch)\b",
        "Is he available for hire?",
    ),
    (
        r"\b(hire|hiring|available|availability|open to work|freelance|contract|roles?)\b",
        "Is he available for hire?",
    ),
    (
        r"\b(projects?|built|build|portfolio|apps?)\b",
        "What has he built?",
    ),
    (
        r"\b(background|experience|career|resume|cv|education|studied)\b",
        "What's his background?",
    ),
    (
        r"\b(skills?|strengths?|good at|best at|specialt(y|ies))\b",
        "What is he best at?",
    ),
    (
        r"\b(who is he|what does he do|job|work|about him)\b",
        "What does he do?",
    ),
];

// =============================================================================
// Built-in data: technical visitor
// =============================================================================

const TECHNICAL_ENTRIES: &[&str] = &[
    "What's his tech stack?",
    "Walk me through a system he designed",
    "How does he approach code quality?",
];

const TECHNICAL_NODES: &[(&str, &[&str])] = &[
    (
        "What's his tech stack?",
        &["Why Rust?", "What about the frontend?", "Walk me through a system he designed"],
    ),
    (
        "Why Rust?",
        &["Tell me about PulseOps", "How does he approach code quality?"],
    ),
    (
        "What about the frontend?",
        &["Tell me about Driftwood", "What's his tech stack?"],
    ),
    (
        "Walk me through a system he designed",
        &["Tell me about PulseOps", "Tell me about Ledgerline", "How does he handle scale?"],
    ),
    (
        "How does he handle scale?",
        &["Tell me about PulseOps", "How does he approach code quality?", TERMINAL_QUESTION],
    ),
    (
        "Tell me about PulseOps",
        &["How does PulseOps handle alert storms?", "Tell me about Ledgerline", "What's his tech stack?"],
    ),
    (
        "Tell me about Ledgerline",
        &["Tell me about Driftwood", "Walk me through a system he designed", TERMINAL_QUESTION],
    ),
    (
        "Tell me about Driftwood",
        &["Tell me about PulseOps", "What's his tech stack?"],
    ),
    (
        "How does he approach code quality?",
        &["How does he test?", "Walk me through a system he designed", TERMINAL_QUESTION],
    ),
    (
        "How does he test?",
        &["How does he approach code quality?", TERMINAL_QUESTION],
    ),
    (TERMINAL_QUESTION, &[]),
];

const TECHNICAL_TOPICS: &[(&str, &str)] = &[
    (r"pulse\s*ops", "Tell me about PulseOps"),
    (r"ledger\s*line", "Tell me about Ledgerline"),
    (r"driftwood", "Tell me about Driftwood"),
    (r"\b(rust|cargo|tokio|borrow checker)\b", "Why Rust?"),
    (
        r"\b(frontend|front-end|react|typescript|css|ui)\b",
        "What about the frontend?",
    ),
    (
        r"\b(scale|scaling|performance|throughput|latency|load)\b",
        "How does he handle scale?",
    ),
    (r"\b(tests?|testing|ci|coverage)\b", "How does he test?"),
    (
        r"\b(code quality|code review|reviews?|refactor\w*|clean code|lint\w*)\b",
        "How does he approach code quality?",
    ),
    (
        r"\b(architecture|system design|designed|distributed|microservices?)\b",
        "Walk me through a system he designed",
    ),
    (
        r"\b(stack|languages?|frameworks?|tools?|tech)\b",
        "What's his tech stack?",
    ),
];

// =============================================================================
// ConversationChains
// =============================================================================

/// Authored form of one mode's chains, as stored in a chains file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSpec {
    #[serde(flatten)]
    pub graph: ChainGraph,
    #[serde(default)]
    pub topics: Vec<TopicRule>,
}

/// Graph and classifier for a single conversation mode.
#[derive(Debug)]
pub struct ConversationChains {
    mode: Mode,
    graph: ChainGraph,
    classifier: TopicClassifier,
}

impl ConversationChains {
    /// Compile a `ChainSpec` without validating its structure.
    pub fn from_spec(mode: Mode, spec: ChainSpec) -> Result<Self, ChatError> {
        let classifier = TopicClassifier::new(&spec.topics)
            .map_err(|e| ChatError::InvalidChains(format!("{} topic rule: {}", mode, e)))?;
        Ok(Self {
            mode,
            graph: spec.graph,
            classifier,
        })
    }

    /// Built-in chains for `mode`.
    pub fn builtin(mode: Mode) -> Self {
        let (entries, nodes, topics) = match mode {
            Mode::Basic => (BASIC_ENTRIES, BASIC_NODES, BASIC_TOPICS),
            Mode::Technical => (TECHNICAL_ENTRIES, TECHNICAL_NODES, TECHNICAL_TOPICS),
        };
        let rules: Vec<TopicRule> = topics
            .iter()
            .map(|(pattern, node)| TopicRule::new(*pattern, *node))
            .collect();
        Self {
            mode,
            graph: ChainGraph::from_static(entries, TERMINAL_QUESTION, nodes),
            classifier: TopicClassifier::new(&rules).expect("Invalid built-in topic regex"),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn graph(&self) -> &ChainGraph {
        &self.graph
    }

    pub fn classifier(&self) -> &TopicClassifier {
        &self.classifier
    }

    /// Graph defects plus classifier rules pointing outside the graph.
    pub fn validate(&self) -> Vec<GraphDefect> {
        let mut defects = self.graph.validate();
        for (pattern, node) in self.classifier.rules() {
            if !self.graph.contains(node) {
                defects.push(GraphDefect::UnknownTopicTarget {
                    pattern: pattern.to_string(),
                    node: node.to_string(),
                });
            }
        }
        defects
    }
}

// =============================================================================
// ChainSet
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChainSetFile {
    basic: ChainSpec,
    technical: ChainSpec,
}

/// Chains for every mode.
#[derive(Debug)]
pub struct ChainSet {
    basic: ConversationChains,
    technical: ConversationChains,
}

impl Default for ChainSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChainSet {
    pub fn builtin() -> Self {
        Self {
            basic: ConversationChains::builtin(Mode::Basic),
            technical: ConversationChains::builtin(Mode::Technical),
        }
    }

    /// Parse and validate a chains file.
    pub fn from_toml(content: &str) -> Result<Self, ChatError> {
        let file: ChainSetFile =
            toml::from_str(content).map_err(|e| ChatError::InvalidChains(e.to_string()))?;
        let set = Self {
            basic: ConversationChains::from_spec(Mode::Basic, file.basic)?,
            technical: ConversationChains::from_spec(Mode::Technical, file.technical)?,
        };

        let defects = set.validate();
        if !defects.is_empty() {
            for (mode, defect) in &defects {
                warn!(%mode, %defect, "Chain defect");
            }
            let summary: Vec<String> = defects
                .iter()
                .map(|(mode, defect)| format!("{}: {}", mode, defect))
                .collect();
            return Err(ChatError::InvalidChains(summary.join("; ")));
        }
        Ok(set)
    }

    /// Load a chains file from disk.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::InvalidChains(format!("{}: {}", path.display(), e)))?;
        let set = Self::from_toml(&content)?;
        info!(path = %path.display(), "Conversation chains loaded");
        Ok(set)
    }

    /// Load from `path` when given, otherwise use the built-in chains.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ChatError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn for_mode(&self, mode: Mode) -> &ConversationChains {
        match mode {
            Mode::Basic => &self.basic,
            Mode::Technical => &self.technical,
        }
    }

    /// Defects across all modes, tagged with their mode.
    pub fn validate(&self) -> Vec<(Mode, GraphDefect)> {
        Mode::ALL
            .iter()
            .flat_map(|&mode| {
                self.for_mode(mode)
                    .validate()
                    .into_iter()
                    .map(move |defect| (mode, defect))
            })
            .collect()
    }
}
