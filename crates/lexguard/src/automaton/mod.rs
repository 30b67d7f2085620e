//! Aho-Corasick multi-pattern matching over Unicode code points.
//!
//! - **Trie**: patterns are inserted as code-point sequences into an
//!   arena-backed prefix tree, each terminal tagged with its pattern index.
//!
//! - **Failure links**: [`Automaton::compile`] runs a breadth-first pass that
//!   links every node to its longest proper suffix present in the trie.
//!
//! - **Matching**: [`Automaton::find`] scans the input once and reports every
//!   pattern ending at every position, into a bounded buffer borrowed from a
//!   [`BufferPool`].
//!
//! # Example
//!
//! ```
//! use lexguard::automaton::{Automaton, BufferPool};
//!
//! let mut automaton = Automaton::new();
//! automaton.insert("he".chars(), ()).unwrap();
//! automaton.insert("she".chars(), ()).unwrap();
//! automaton.compile().unwrap();
//!
//! let pool = BufferPool::default();
//! let matches = automaton.find(&pool, "ushers".chars()).unwrap();
//! assert_eq!(matches.len(), 2);
//! assert!(matches.iter().all(|m| m.end == 3));
//! ```

mod buffer;
mod matcher;
mod trie;

pub use buffer::{
    BufferPool, MatchBuffer, PooledBuffer, RawMatch, DEFAULT_BUFFER_CAPACITY,
    DEFAULT_MAX_IDLE_BUFFERS, MAX_BUFFER_CAPACITY,
};
pub use trie::{Automaton, PatternId};
