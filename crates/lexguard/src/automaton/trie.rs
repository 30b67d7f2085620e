//! Trie construction and failure-link compilation.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Child
//! edges are the owning tree; failure links and output links are plain
//! indices layered on top once [`Automaton::compile`] runs, so the cyclic
//! back-edges never need shared ownership.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::error::{Error, Result};

/// Dense index of an inserted pattern, assigned in insertion order.
pub type PatternId = usize;

/// Index of a node in the automaton's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct NodeId(usize);

impl NodeId {
    pub(super) const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(super) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub(super) struct Node {
    /// Outgoing edges, one per code point.
    pub(super) children: HashMap<char, NodeId>,
    /// Longest proper suffix of this node's path that is also a trie path.
    /// `None` only for the root, or before compilation.
    pub(super) fail: Option<NodeId>,
    /// Nearest terminal node reachable through failure links.
    pub(super) output: Option<NodeId>,
    /// Pattern ending exactly at this node.
    pub(super) pattern: Option<PatternId>,
    /// Code point on the incoming edge (`'\0'` for the root).
    pub(super) label: char,
}

impl Node {
    fn new(label: char) -> Self {
        Self {
            children: HashMap::new(),
            fail: None,
            output: None,
            pattern: None,
            label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Building,
    Compiled,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Compiled => "compiled",
        }
    }
}

/// A multi-pattern Aho-Corasick automaton over Unicode code points.
///
/// The automaton starts in the building phase, where [`insert`](Self::insert)
/// adds patterns. [`compile`](Self::compile) computes failure links and moves
/// it, irreversibly, to the compiled phase where it is read-only and may be
/// scanned from any number of threads.
///
/// Each pattern carries an opaque value `V`, retrievable by pattern index.
#[derive(Debug)]
pub struct Automaton<V = ()> {
    pub(super) nodes: Vec<Node>,
    patterns: Vec<Vec<char>>,
    values: Vec<V>,
    phase: Phase,
}

impl<V> Default for Automaton<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Automaton<V> {
    /// Create an empty automaton in the building phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new('\0')],
            patterns: Vec::new(),
            values: Vec::new(),
            phase: Phase::Building,
        }
    }

    /// Insert a pattern and its value.
    ///
    /// Returns the pattern's index, or `None` for an empty pattern (a no-op).
    /// Inserting a sequence that is already present rebinds its terminal to the
    /// new index and value; the earlier entry stays in the pattern list but is
    /// no longer reported by scans.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalState`] once the automaton has been compiled.
    pub fn insert<I>(&mut self, pattern: I, value: V) -> Result<Option<PatternId>>
    where
        I: IntoIterator<Item = char>,
    {
        if self.phase == Phase::Compiled {
            return Err(Error::illegal_state("insert", self.phase.as_str()));
        }

        let symbols: Vec<char> = pattern.into_iter().collect();
        if symbols.is_empty() {
            return Ok(None);
        }

        let mut current = NodeId::ROOT;
        for &symbol in &symbols {
            current = match self.nodes[current.index()].children.get(&symbol) {
                Some(&child) => child,
                None => {
                    let child = NodeId(self.nodes.len());
                    self.nodes.push(Node::new(symbol));
                    self.nodes[current.index()].children.insert(symbol, child);
                    child
                }
            };
        }

        let id = self.patterns.len();
        self.patterns.push(symbols);
        self.values.push(value);
        self.nodes[current.index()].pattern = Some(id);
        Ok(Some(id))
    }

    /// Compute failure links and freeze the automaton.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalState`] if the automaton is already compiled.
    pub fn compile(&mut self) -> Result<()> {
        if self.phase == Phase::Compiled {
            return Err(Error::illegal_state("compile", self.phase.as_str()));
        }

        // Breadth-first, so every failure target is shallower than the node
        // being linked and already has its own links in place.
        let mut queue = VecDeque::from([NodeId::ROOT]);
        while let Some(parent) = queue.pop_front() {
            let children: Vec<NodeId> = self.nodes[parent.index()]
                .children
                .values()
                .copied()
                .collect();

            for child in children {
                let label = self.nodes[child.index()].label;
                let fail = self.fail_target(parent, label);
                let target = &self.nodes[fail.index()];
                let output = if target.pattern.is_some() {
                    Some(fail)
                } else {
                    target.output
                };

                let node = &mut self.nodes[child.index()];
                node.fail = Some(fail);
                node.output = output;
                queue.push_back(child);
            }
        }

        self.phase = Phase::Compiled;
        debug!(
            patterns = self.patterns.len(),
            nodes = self.nodes.len(),
            "Automaton compiled"
        );
        Ok(())
    }

    /// Climb the parent's failure chain until some node has an edge on `label`.
    fn fail_target(&self, parent: NodeId, label: char) -> NodeId {
        let mut candidate = self.nodes[parent.index()].fail;
        while let Some(node) = candidate {
            if let Some(&next) = self.nodes[node.index()].children.get(&label) {
                return next;
            }
            candidate = self.nodes[node.index()].fail;
        }
        NodeId::ROOT
    }

    /// Look up an inserted pattern and its value by index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `id` was never assigned.
    pub fn pattern(&self, id: PatternId) -> Result<(&[char], &V)> {
        match (self.patterns.get(id), self.values.get(id)) {
            (Some(symbols), Some(value)) => Ok((symbols.as_slice(), value)),
            _ => Err(Error::IndexOutOfRange {
                index: id,
                len: self.patterns.len(),
            }),
        }
    }

    /// Whether [`compile`](Self::compile) has run.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.phase == Phase::Compiled
    }

    /// Number of insertions recorded, including rebound duplicates.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Number of trie nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
