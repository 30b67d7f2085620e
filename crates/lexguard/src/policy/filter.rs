//! Classification of text against a policy dictionary.
//!
//! The [`Filter`] composes the dictionary's exact-match table, the sub-token
//! automaton and the conjunction evaluator into a single [`Verdict`].

use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::conjunction::{evaluate, Hit};
use super::dictionary::{Dictionary, ParseMode, PolicyRecord, Syntax};
use crate::automaton::{BufferPool, DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE_BUFFERS};
use crate::config::Config;
use crate::error::Result;

/// How much of the hit list a verdict carries once a forbidding hit is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Stop at the first forbidding hit; later hits are not reported.
    #[default]
    FailFast,
    /// Always report every hit.
    Exhaustive,
}

/// Tuning for a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Maximum raw automaton hits kept per scan.
    pub buffer_capacity: usize,
    /// Maximum idle scan buffers kept for reuse.
    pub max_idle_buffers: usize,
    /// Hit-list reporting mode.
    pub report: ReportMode,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_idle_buffers: DEFAULT_MAX_IDLE_BUFFERS,
            report: ReportMode::FailFast,
        }
    }
}

/// Outcome of classifying one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Satisfied entries, in discovery order.
    pub hits: Vec<Hit>,
    /// Whether any reported hit forbids the text.
    pub forbidding: bool,
    /// Whether any entry was hit at all.
    pub suspicious: bool,
}

impl Verdict {
    fn exact(text: &str, record: &PolicyRecord) -> Self {
        Self {
            hits: vec![Hit {
                word: text.to_string(),
                policy: record.clone(),
            }],
            forbidding: record.is_forbidding(),
            suspicious: true,
        }
    }

    /// Whether the text hit any entry.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.suspicious
    }
}

/// A compiled dictionary ready to classify text from any number of threads.
#[derive(Debug)]
pub struct Filter {
    dictionary: Dictionary,
    pool: BufferPool,
    report: ReportMode,
}

/// Build a filter from dictionary text with the default syntax and options.
///
/// # Errors
///
/// Returns an error only if the dictionary cannot be compiled.
pub fn build_filter(dictionary_text: &str) -> Result<Filter> {
    let dictionary = Dictionary::parse(dictionary_text, &Syntax::default(), ParseMode::Lenient)?;
    Ok(Filter::new(dictionary, &FilterOptions::default()))
}

impl Filter {
    /// Wrap a parsed dictionary.
    #[must_use]
    pub fn new(dictionary: Dictionary, options: &FilterOptions) -> Self {
        Self {
            dictionary,
            pool: BufferPool::new(options.buffer_capacity, options.max_idle_buffers),
            report: options.report,
        }
    }

    /// Build a filter from dictionary text using the separators and tuning
    /// in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dictionary is rejected (see [`Dictionary::parse`]).
    pub fn from_text(config: &Config, dictionary_text: &str) -> Result<Self> {
        let dictionary = Dictionary::parse(
            dictionary_text,
            &config.dictionary.syntax(),
            config.dictionary.parse_mode(),
        )?;
        Ok(Self::new(dictionary, &config.filter_options()))
    }

    /// Build a filter from a dictionary file using the settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the dictionary is rejected.
    pub fn open(config: &Config, path: impl AsRef<Path>) -> Result<Self> {
        let dictionary = Dictionary::load(
            path,
            &config.dictionary.syntax(),
            config.dictionary.parse_mode(),
        )?;
        Ok(Self::new(dictionary, &config.filter_options()))
    }

    /// Classify `text`.
    ///
    /// A text equal to an exact-match key yields that single hit without a
    /// substring scan. Otherwise every satisfied compound entry is collected;
    /// in [`ReportMode::FailFast`] the list ends at the first forbidding hit.
    ///
    /// # Errors
    ///
    /// Only fails if the dictionary's internal tables are inconsistent.
    pub fn classify(&self, text: &str) -> Result<Verdict> {
        if let Some(record) = self.dictionary.exact(text) {
            debug!(key = %record.key, severity = %record.severity, "Exact match");
            return Ok(Verdict::exact(text, record));
        }

        let matches = self.dictionary.automaton().find(&self.pool, text.chars())?;
        let hits = evaluate(&self.dictionary, &matches)?;
        matches.release();

        Ok(self.verdict(hits))
    }

    /// Classify each line of `reader` in turn, handing every verdict to `each`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if a line cannot be read, or the first
    /// error returned by `each`.
    pub fn classify_lines<R, F>(&self, reader: R, mut each: F) -> Result<()>
    where
        R: BufRead,
        F: FnMut(&str, &Verdict) -> Result<()>,
    {
        for line in reader.lines() {
            let text = line?;
            let verdict = self.classify(&text)?;
            each(&text, &verdict)?;
        }
        Ok(())
    }

    fn verdict(&self, mut hits: Vec<Hit>) -> Verdict {
        if hits.is_empty() {
            return Verdict::default();
        }

        let forbidding = match self.report {
            ReportMode::FailFast => match hits.iter().position(Hit::is_forbidding) {
                Some(first) => {
                    hits.truncate(first + 1);
                    true
                }
                None => false,
            },
            ReportMode::Exhaustive => hits.iter().any(Hit::is_forbidding),
        };

        debug!(hits = hits.len(), forbidding, "Text classified");
        Verdict {
            hits,
            forbidding,
            suspicious: true,
        }
    }

    /// The underlying dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// The scan buffer pool.
    #[must_use]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }
}
