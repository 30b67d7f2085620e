//! Streaming scan over a compiled automaton.

use tracing::{debug, trace};

use super::buffer::{BufferPool, MatchBuffer, PooledBuffer};
use super::trie::{Automaton, NodeId};
use crate::error::{Error, Result};

impl<V> Automaton<V> {
    /// Scan `text` once and report every pattern ending at every position.
    ///
    /// Hits are written to a buffer borrowed from `pool` in scan order; at a
    /// given position the longest pattern comes first, followed by each
    /// shorter pattern that is a suffix of it. If the buffer fills up, the
    /// scan stops and the buffer is marked truncated.
    ///
    /// The buffer goes back to the pool when the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalState`] if the automaton is not compiled.
    pub fn find<'p, I>(&self, pool: &'p BufferPool, text: I) -> Result<PooledBuffer<'p>>
    where
        I: IntoIterator<Item = char>,
    {
        if !self.is_compiled() {
            return Err(Error::illegal_state("match", "building"));
        }

        let mut buffer = pool.acquire();
        self.scan(text, &mut buffer);
        if buffer.is_truncated() {
            debug!(
                capacity = buffer.capacity(),
                "Match buffer full, scan truncated"
            );
        }
        Ok(buffer)
    }

    fn scan<I>(&self, text: I, buffer: &mut MatchBuffer)
    where
        I: IntoIterator<Item = char>,
    {
        let mut current = NodeId::ROOT;
        for (position, symbol) in text.into_iter().enumerate() {
            current = self.step(current, symbol);
            if !self.emit(current, position, buffer) {
                return;
            }
        }
    }

    /// Goto-failure transition: follow failure links until an edge on
    /// `symbol` exists, bottoming out at the root.
    #[inline]
    fn step(&self, mut node: NodeId, symbol: char) -> NodeId {
        loop {
            let state = &self.nodes[node.index()];
            if let Some(&next) = state.children.get(&symbol) {
                return next;
            }
            match state.fail {
                Some(fail) => node = fail,
                None => return NodeId::ROOT,
            }
        }
    }

    /// Record the node's own pattern and every terminal on its output chain.
    /// Returns `false` once the buffer has rejected a hit.
    fn emit(&self, node: NodeId, end: usize, buffer: &mut MatchBuffer) -> bool {
        let state = &self.nodes[node.index()];
        let mut cursor = if state.pattern.is_some() {
            Some(node)
        } else {
            state.output
        };

        while let Some(id) = cursor {
            let terminal = &self.nodes[id.index()];
            if let Some(pattern) = terminal.pattern {
                trace!(pattern, end, "Pattern matched");
                if !buffer.push(pattern, end) {
                    return false;
                }
            }
            cursor = terminal.output;
        }
        true
    }
}
