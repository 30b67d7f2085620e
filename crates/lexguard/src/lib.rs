//! `lexguard` - Sensitive-word classification on an Aho-Corasick automaton
//!
//! This library matches free text against a dictionary of sensitive terms.
//! Entries may require an exact full-text match, a single substring hit, or
//! the co-occurrence of several substrings.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod automaton;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod policy;

pub use automaton::{Automaton, BufferPool, PooledBuffer, RawMatch};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use policy::{build_filter, Filter, Hit, PolicyRecord, Severity, Verdict};
