//! Conversation chain graph.
//!
//! Nodes are canonical question strings; edges are the follow-up questions
//! offered as chips once a node's answer arrives. Structural invariants are
//! checked by [`ChainGraph::validate`], never while resolving.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Deepest level (entries are level 1) any node may sit at.
pub const MAX_CHAIN_DEPTH: usize = 3;

/// Prefix of project-detail questions. Every edge using it must be a node.
pub const DETAIL_PREFIX: &str = "Tell me about ";

const MIN_EDGES: usize = 2;
const MAX_EDGES: usize = 3;

/// Whether `question` follows the project-detail naming convention.
pub fn is_detail_question(question: &str) -> bool {
    question.starts_with(DETAIL_PREFIX)
}

/// A structural defect in a chain graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphDefect {
    #[error("entry '{0}' is not a node")]
    MissingEntry(String),
    #[error("terminal '{0}' is not a node")]
    MissingTerminal(String),
    #[error("terminal '{node}' has {count} edges, expected none")]
    TerminalHasEdges { node: String, count: usize },
    #[error("node '{node}' has {count} edges, expected 2 to 3")]
    EdgeCount { node: String, count: usize },
    #[error("'{from}' links to detail question '{to}' which is not a node")]
    DanglingDetail { from: String, to: String },
    #[error("node '{0}' is unreachable from the entries")]
    Unreachable(String),
    #[error("node '{node}' sits at level {depth}, deeper than {max}")]
    TooDeep {
        node: String,
        depth: usize,
        max: usize,
    },
    #[error("node '{0}' has no bridge edge back to an entry")]
    MissingBridge(String),
    #[error("topic rule '{pattern}' targets '{node}' which is not a node")]
    UnknownTopicTarget { pattern: String, node: String },
}

/// Directed graph of conversation topics for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainGraph {
    entries: Vec<String>,
    terminal: String,
    nodes: BTreeMap<String, Vec<String>>,
}

impl ChainGraph {
    pub fn new(
        entries: Vec<String>,
        terminal: impl Into<String>,
        nodes: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            entries,
            terminal: terminal.into(),
            nodes,
        }
    }

    /// Build a graph from static string tables.
    pub fn from_static(
        entries: &[&str],
        terminal: &str,
        nodes: &[(&str, &[&str])],
    ) -> Self {
        let nodes = nodes
            .iter()
            .map(|(node, edges)| {
                (
                    node.to_string(),
                    edges.iter().map(|e| e.to_string()).collect(),
                )
            })
            .collect();
        Self::new(
            entries.iter().map(|e| e.to_string()).collect(),
            terminal,
            nodes,
        )
    }

    /// Level-1 entry questions, in display order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The single node with no continuation.
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// Outgoing edges of `node`, or `None` if it is not a node.
    pub fn edges(&self, node: &str) -> Option<&[String]> {
        self.nodes.get(node).map(Vec::as_slice)
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn is_entry(&self, node: &str) -> bool {
        self.entries.iter().any(|e| e == node)
    }

    /// All nodes with their edges, in key order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Level of every node reachable from the entries (entries are level 1).
    pub fn levels(&self) -> HashMap<&str, usize> {
        let mut levels: HashMap<&str, usize> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        for entry in &self.entries {
            if self.contains(entry) && !levels.contains_key(entry.as_str()) {
                levels.insert(entry.as_str(), 1);
                queue.push_back(entry.as_str());
            }
        }

        while let Some(node) = queue.pop_front() {
            let level = levels[node];
            for edge in self.edges(node).unwrap_or_default() {
                if self.contains(edge) && !levels.contains_key(edge.as_str()) {
                    levels.insert(edge.as_str(), level + 1);
                    queue.push_back(edge.as_str());
                }
            }
        }

        levels
    }

    /// Check every structural invariant; an empty list means the graph is sound.
    pub fn validate(&self) -> Vec<GraphDefect> {
        let mut defects = Vec::new();

        for entry in &self.entries {
            if !self.contains(entry) {
                defects.push(GraphDefect::MissingEntry(entry.clone()));
            }
        }

        match self.edges(&self.terminal) {
            None => defects.push(GraphDefect::MissingTerminal(self.terminal.clone())),
            Some(edges) if !edges.is_empty() => defects.push(GraphDefect::TerminalHasEdges {
                node: self.terminal.clone(),
                count: edges.len(),
            }),
            Some(_) => {}
        }

        let levels = self.levels();

        for (node, edges) in self.nodes() {
            let is_terminal = node == self.terminal;

            if !is_terminal && !(MIN_EDGES..=MAX_EDGES).contains(&edges.len()) {
                defects.push(GraphDefect::EdgeCount {
                    node: node.to_string(),
                    count: edges.len(),
                });
            }

            for edge in edges {
                if is_detail_question(edge) && !self.contains(edge) {
                    defects.push(GraphDefect::DanglingDetail {
                        from: node.to_string(),
                        to: edge.clone(),
                    });
                }
            }

            match levels.get(node) {
                None => defects.push(GraphDefect::Unreachable(node.to_string())),
                Some(&depth) if depth > MAX_CHAIN_DEPTH => defects.push(GraphDefect::TooDeep {
                    node: node.to_string(),
                    depth,
                    max: MAX_CHAIN_DEPTH,
                }),
                Some(_) => {}
            }

            if !is_terminal && !self.is_entry(node) && !edges.iter().any(|e| self.is_entry(e)) {
                defects.push(GraphDefect::MissingBridge(node.to_string()));
            }
        }

        defects
    }
}
