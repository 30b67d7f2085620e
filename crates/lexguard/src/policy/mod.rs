//! Policy evaluation on top of the automaton.
//!
//! - **Dictionary**: parses the line-oriented policy table, splitting exact
//!   full-text keys from sub-token keys and indexing compound entries.
//!
//! - **Conjunctions**: turns one scan's raw hits into satisfied entries,
//!   counting each distinct sub-token once.
//!
//! - **Filter**: the classification entry point, returning a [`Verdict`].
//!
//! # Example
//!
//! ```
//! use lexguard::policy::build_filter;
//!
//! let filter = build_filter("胖子|肥猪\tsuspic-level\tfuzzy\n死狗\tdelete\taccurate").unwrap();
//!
//! let verdict = filter.classify("这个胖子和那只肥猪").unwrap();
//! assert!(verdict.suspicious);
//! assert!(!verdict.forbidding);
//!
//! assert!(filter.classify("死狗").unwrap().forbidding);
//! assert!(!filter.classify("那只死狗").unwrap().suspicious);
//! ```

mod conjunction;
mod dictionary;
mod filter;

pub use conjunction::{evaluate, Hit};
pub use dictionary::{
    CompoundIndex, CompoundLine, Dictionary, LineSlot, MatchMode, ParseMode, ParseReport,
    PolicyRecord, Severity, Syntax, TokenEntry, TokenId, DEFAULT_FIELD_SEPARATOR,
    DEFAULT_RECORD_SEPARATOR, DEFAULT_WORD_SEPARATOR,
};
pub use filter::{build_filter, Filter, FilterOptions, ReportMode, Verdict};
