//! Policy dictionary parsing and the compound-token index.
//!
//! A dictionary is a line-oriented table. Each record holds a key, a
//! severity and a match mode, separated by the field separator. Keys made of
//! several sub-tokens joined by the word separator only hit when every
//! sub-token occurs in the scanned text.
//!
//! ```text
//! 胖子|肥猪<TAB>suspic-level<TAB>fuzzy
//! 死狗<TAB>delete<TAB>accurate
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::automaton::Automaton;
use crate::error::{Error, Result};

/// Separator between the sub-tokens of a compound key.
pub const DEFAULT_WORD_SEPARATOR: &str = "|";

/// Separator between the fields of a record.
pub const DEFAULT_FIELD_SEPARATOR: &str = "\t";

/// Separator between records.
pub const DEFAULT_RECORD_SEPARATOR: &str = "\n";

/// Label that neutralises a key, in either the severity or the mode field.
const DECONTROL: &str = "decontrol";

/// Match-mode label for exact full-text equality.
const ACCURATE: &str = "accurate";

const FORBID_LABELS: &[&str] = &["delete", "forbid"];

/// Index of a compound line within the [`CompoundIndex`].
pub type LineSlot = usize;

/// Index of a distinct sub-token within the [`CompoundIndex`].
pub type TokenId = usize;

/// Reserved separators of the dictionary format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syntax {
    /// Joins the sub-tokens of a compound key.
    pub word_separator: String,
    /// Separates the fields of a record.
    pub field_separator: String,
    /// Separates records.
    pub record_separator: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            word_separator: DEFAULT_WORD_SEPARATOR.to_string(),
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            record_separator: DEFAULT_RECORD_SEPARATOR.to_string(),
        }
    }
}

/// How to treat records with fewer than three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip the record and note it in the [`ParseReport`].
    #[default]
    Lenient,
    /// Fail with [`Error::MalformedRecord`].
    Strict,
}

/// Enforcement level of a dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Neutralised; never reported.
    Decontrol,
    /// Reported, but does not forbid the text.
    Suspicious,
    /// Reported and forbids the text.
    Forbid,
}

impl Severity {
    /// Interpret a severity label. Unknown labels are treated as suspicious.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == DECONTROL {
            Self::Decontrol
        } else if FORBID_LABELS.contains(&label) {
            Self::Forbid
        } else {
            Self::Suspicious
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decontrol => write!(f, "decontrol"),
            Self::Suspicious => write!(f, "suspicious"),
            Self::Forbid => write!(f, "forbid"),
        }
    }
}

/// How a dictionary key is compared against text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The whole text must equal the key.
    Exact,
    /// Every sub-token must occur somewhere in the text.
    Fuzzy,
    /// Neutralised; never matched.
    Decontrol,
}

impl MatchMode {
    /// Interpret a match-mode label. Unknown labels are treated as fuzzy.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            ACCURATE => Self::Exact,
            DECONTROL => Self::Decontrol,
            _ => Self::Fuzzy,
        }
    }
}

/// A dictionary entry as written in the source, with its parsed levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRecord {
    /// The key, sub-tokens still joined by the word separator.
    pub key: String,
    /// Severity label as written.
    pub policy: String,
    /// Match-mode label as written.
    pub match_policy: String,
    /// Parsed severity.
    pub severity: Severity,
    /// Parsed match mode.
    pub mode: MatchMode,
}

impl PolicyRecord {
    fn new(key: &str, policy: &str, match_policy: &str) -> Self {
        Self {
            key: key.to_string(),
            policy: policy.to_string(),
            match_policy: match_policy.to_string(),
            severity: Severity::from_label(policy),
            mode: MatchMode::from_label(match_policy),
        }
    }

    /// Whether a hit on this entry forbids the text.
    #[must_use]
    pub fn is_forbidding(&self) -> bool {
        self.severity == Severity::Forbid
    }

    fn is_neutralised(&self) -> bool {
        self.severity == Severity::Decontrol || self.mode == MatchMode::Decontrol
    }
}

/// A fuzzy dictionary line indexed by its sub-tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundLine {
    /// 1-based line number in the dictionary source.
    pub line: usize,
    /// The line's full key.
    pub key: String,
    /// Number of distinct non-empty sub-tokens that must all be seen.
    pub required: usize,
}

/// A distinct sub-token and the lines that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    /// The sub-token text.
    pub text: String,
    /// Lines requiring this sub-token, in ascending line order.
    pub lines: Vec<LineSlot>,
}

/// Maps sub-tokens to the compound lines that require them.
#[derive(Debug, Default)]
pub struct CompoundIndex {
    tokens: Vec<TokenEntry>,
    token_ids: HashMap<String, TokenId>,
    lines: Vec<CompoundLine>,
}

impl CompoundIndex {
    /// Look up a sub-token entry.
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<&TokenEntry> {
        self.tokens.get(id)
    }

    /// Look up a compound line.
    #[must_use]
    pub fn line(&self, slot: LineSlot) -> Option<&CompoundLine> {
        self.lines.get(slot)
    }

    /// Number of distinct sub-tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Number of indexed lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Register a line's sub-tokens. Returns the tokens seen for the first
    /// time, which the caller must add to the automaton, or `None` if the key
    /// has no non-empty sub-token.
    fn add_line(
        &mut self,
        line: usize,
        key: &str,
        separator: &str,
    ) -> Option<Vec<(TokenId, String)>> {
        let mut distinct: Vec<&str> = Vec::new();
        for token in key.split(separator) {
            if !token.is_empty() && !distinct.contains(&token) {
                distinct.push(token);
            }
        }
        if distinct.is_empty() {
            return None;
        }

        let slot = self.lines.len();
        self.lines.push(CompoundLine {
            line,
            key: key.to_string(),
            required: distinct.len(),
        });

        let mut fresh = Vec::new();
        for token in distinct {
            let id = match self.token_ids.get(token) {
                Some(&id) => id,
                None => {
                    let id = self.tokens.len();
                    self.tokens.push(TokenEntry {
                        text: token.to_string(),
                        lines: Vec::new(),
                    });
                    self.token_ids.insert(token.to_string(), id);
                    fresh.push((id, token.to_string()));
                    id
                }
            };
            self.tokens[id].lines.push(slot);
        }
        Some(fresh)
    }
}

/// Summary of a dictionary build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    /// Well-formed records read.
    pub records: usize,
    /// 1-based line numbers of records skipped for having too few fields.
    pub skipped: Vec<usize>,
    /// Keys whose last entry is a decontrol entry.
    pub neutralised: usize,
    /// Keys registered for exact matching.
    pub exact: usize,
    /// Keys registered for sub-token matching.
    pub compound: usize,
    /// Distinct sub-tokens inserted into the automaton.
    pub tokens: usize,
}

/// A parsed, compiled policy dictionary.
#[derive(Debug)]
pub struct Dictionary {
    records: HashMap<String, PolicyRecord>,
    index: CompoundIndex,
    automaton: Automaton<TokenId>,
    syntax: Syntax,
    report: ParseReport,
    digest: String,
}

impl Dictionary {
    /// Parse dictionary text and compile its automaton.
    ///
    /// When a key appears on several lines, the last line wins. A key whose
    /// last line is a decontrol entry is never registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] for a short record in
    /// [`ParseMode::Strict`].
    pub fn parse(text: &str, syntax: &Syntax, mode: ParseMode) -> Result<Self> {
        let mut report = ParseReport::default();
        let mut entries: Vec<(usize, PolicyRecord)> = Vec::new();

        for (index, raw) in text.split(syntax.record_separator.as_str()).enumerate() {
            let line = index + 1;
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            if raw.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = raw.split(syntax.field_separator.as_str()).collect();
            if fields.len() < 3 {
                if mode == ParseMode::Strict {
                    return Err(Error::MalformedRecord {
                        line,
                        fields: fields.len(),
                    });
                }
                warn!(
                    line,
                    fields = fields.len(),
                    "Skipping malformed dictionary record"
                );
                report.skipped.push(line);
                continue;
            }

            report.records += 1;
            if fields[0].is_empty() {
                debug!(line, "Ignoring record with empty key");
                continue;
            }
            entries.push((line, PolicyRecord::new(fields[0], fields[1], fields[2])));
        }

        let mut latest: HashMap<&str, usize> = HashMap::new();
        for (position, (_, record)) in entries.iter().enumerate() {
            latest.insert(record.key.as_str(), position);
        }

        let mut records = HashMap::new();
        let mut index = CompoundIndex::default();
        let mut automaton = Automaton::new();

        for (position, (line, record)) in entries.iter().enumerate() {
            if latest.get(record.key.as_str()) != Some(&position) {
                continue;
            }
            if record.is_neutralised() {
                debug!(line = *line, key = %record.key, "Key neutralised by decontrol entry");
                report.neutralised += 1;
                continue;
            }

            if record.mode == MatchMode::Exact {
                report.exact += 1;
            } else {
                let Some(fresh) = index.add_line(*line, &record.key, &syntax.word_separator) else {
                    debug!(line = *line, "Ignoring key with no sub-tokens");
                    continue;
                };
                for (id, token) in fresh {
                    automaton.insert(token.chars(), id)?;
                }
                report.compound += 1;
            }
            records.insert(record.key.clone(), record.clone());
        }

        automaton.compile()?;
        report.tokens = index.token_count();

        let digest = blake3::hash(text.as_bytes()).to_hex().to_string();
        info!(
            records = report.records,
            skipped = report.skipped.len(),
            exact = report.exact,
            compound = report.compound,
            tokens = report.tokens,
            "Dictionary built"
        );

        Ok(Self {
            records,
            index,
            automaton,
            syntax: syntax.clone(),
            report,
            digest,
        })
    }

    /// Read and parse a dictionary file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DictionaryRead`] if the file cannot be read, or any
    /// error from [`Dictionary::parse`].
    pub fn load(path: impl AsRef<Path>, syntax: &Syntax, mode: ParseMode) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading dictionary from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| Error::DictionaryRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, syntax, mode)
    }

    /// The policy registered under `key`, if any.
    #[must_use]
    pub fn policy(&self, key: &str) -> Option<&PolicyRecord> {
        self.records.get(key)
    }

    /// The exact-match policy equal to the whole of `text`, if any.
    #[must_use]
    pub fn exact(&self, text: &str) -> Option<&PolicyRecord> {
        self.records
            .get(text)
            .filter(|record| record.mode == MatchMode::Exact)
    }

    /// The compiled sub-token automaton; each pattern's value is its [`TokenId`].
    #[must_use]
    pub fn automaton(&self) -> &Automaton<TokenId> {
        &self.automaton
    }

    /// The sub-token index.
    #[must_use]
    pub fn index(&self) -> &CompoundIndex {
        &self.index
    }

    /// The separators this dictionary was parsed with.
    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Build statistics.
    #[must_use]
    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    /// BLAKE3 hex digest of the source text.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Dictionary {
        Dictionary::parse(text, &Syntax::default(), ParseMode::Lenient).unwrap()
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label("decontrol"), Severity::Decontrol);
        assert_eq!(Severity::from_label("delete"), Severity::Forbid);
        assert_eq!(Severity::from_label("forbid"), Severity::Forbid);
        assert_eq!(Severity::from_label("suspic-level"), Severity::Suspicious);
        assert_eq!(Severity::from_label("review"), Severity::Suspicious);
    }

    #[test]
    fn test_match_mode_labels() {
        assert_eq!(MatchMode::from_label("accurate"), MatchMode::Exact);
        assert_eq!(MatchMode::from_label("fuzzy"), MatchMode::Fuzzy);
        assert_eq!(MatchMode::from_label("decontrol"), MatchMode::Decontrol);
        assert_eq!(MatchMode::from_label("anything"), MatchMode::Fuzzy);
    }

    #[test]
    fn test_parse_splits_exact_and_compound() {
        let dict = parse("胖子|肥猪\tsuspic-level\tfuzzy\n死狗\tdelete\taccurate\n");

        assert_eq!(dict.report().records, 2);
        assert_eq!(dict.report().exact, 1);
        assert_eq!(dict.report().compound, 1);
        assert_eq!(dict.report().tokens, 2);
        assert!(dict.report().skipped.is_empty());

        assert!(dict.exact("死狗").is_some_and(PolicyRecord::is_forbidding));
        assert!(dict.exact("胖子|肥猪").is_none());
        assert_eq!(
            dict.policy("胖子|肥猪").map(|r| r.mode),
            Some(MatchMode::Fuzzy)
        );

        // Exact keys never reach the automaton.
        assert_eq!(dict.automaton().pattern_count(), 2);
        assert!(dict.automaton().is_compiled());
    }

    #[test]
    fn test_compound_index_counts_distinct_tokens() {
        let dict = parse("a|b||a|c\tsuspic-level\tfuzzy");
        let line = dict.index().line(0).unwrap();
        assert_eq!(line.required, 3);
        assert_eq!(line.line, 1);
        assert_eq!(line.key, "a|b||a|c");
        assert_eq!(dict.index().token_count(), 3);
    }

    #[test]
    fn test_shared_tokens_are_inserted_once() {
        let text = "a|b\tsuspic-level\tfuzzy\nb|c\tdelete\tfuzzy\nb\tsuspic-level\tfuzzy";
        let dict = parse(text);
        assert_eq!(dict.automaton().pattern_count(), 3);

        let (_, &b) = dict.automaton().pattern(1).unwrap();
        let entry = dict.index().token(b).unwrap();
        assert_eq!(entry.text, "b");
        assert_eq!(entry.lines, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_records_skipped_in_lenient_mode() {
        let dict = parse("only-key\nkey\tdelete\n\nok\tdelete\tfuzzy\n");
        assert_eq!(dict.report().skipped, vec![1, 2]);
        assert_eq!(dict.report().records, 1);
        assert!(dict.policy("ok").is_some());
    }

    #[test]
    fn test_short_record_fails_in_strict_mode() {
        let err = Dictionary::parse(
            "ok\tdelete\tfuzzy\nbroken\tdelete",
            &Syntax::default(),
            ParseMode::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, fields: 2 }));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let dict = parse("word\tdelete\tfuzzy\textra\tmore");
        let record = dict.policy("word").unwrap();
        assert_eq!(record.match_policy, "fuzzy");
        assert!(record.is_forbidding());
    }

    #[test]
    fn test_decontrol_neutralises_key() {
        let dict = parse(
            "胖子\tsuspic-level\tfuzzy\n胖子\tdecontrol\tfuzzy\n肥猪\tsuspic-level\tdecontrol\n",
        );
        assert!(dict.policy("胖子").is_none());
        assert!(dict.policy("肥猪").is_none());
        assert_eq!(dict.report().neutralised, 2);
        assert_eq!(dict.automaton().pattern_count(), 0);
    }

    #[test]
    fn test_later_entry_reactivates_decontrolled_key() {
        let dict = parse("胖子\tdecontrol\tfuzzy\n胖子\tdelete\tfuzzy");
        assert!(dict.policy("胖子").unwrap().is_forbidding());
        assert_eq!(dict.report().neutralised, 0);
        assert_eq!(dict.automaton().pattern_count(), 1);
    }

    #[test]
    fn test_later_decontrol_neutralises_earlier_entry() {
        let dict = parse("胖子\tdelete\tfuzzy\n胖子\tdecontrol\tfuzzy");
        assert!(dict.policy("胖子").is_none());
        assert_eq!(dict.report().neutralised, 1);
        assert_eq!(dict.automaton().pattern_count(), 0);
    }

    #[test]
    fn test_last_record_wins_for_duplicate_keys() {
        let dict = parse("word\tsuspic-level\tfuzzy\nword\tdelete\tfuzzy");
        assert!(dict.policy("word").unwrap().is_forbidding());
        assert_eq!(dict.index().line_count(), 1);
        assert_eq!(dict.index().line(0).unwrap().line, 2);
    }

    #[test]
    fn test_separator_only_key_is_ignored() {
        let dict = parse("||\tsuspic-level\tfuzzy");
        assert!(dict.policy("||").is_none());
        assert_eq!(dict.report().compound, 0);
    }

    #[test]
    fn test_crlf_records() {
        let dict = parse("word\tdelete\tfuzzy\r\nother\tsuspic-level\taccurate\r\n");
        assert_eq!(dict.policy("word").unwrap().match_policy, "fuzzy");
        assert!(dict.exact("other").is_some());
    }

    #[test]
    fn test_custom_syntax() {
        let syntax = Syntax {
            word_separator: "+".to_string(),
            field_separator: ",".to_string(),
            record_separator: ";".to_string(),
        };
        let dict = Dictionary::parse(
            "a+b,delete,fuzzy;c,suspic-level,accurate",
            &syntax,
            ParseMode::Lenient,
        )
        .unwrap();
        assert_eq!(dict.index().line(0).unwrap().required, 2);
        assert!(dict.exact("c").is_some());
        assert_eq!(dict.syntax(), &syntax);
    }

    #[test]
    fn test_digest_identifies_source() {
        let a = parse("word\tdelete\tfuzzy");
        let b = parse("word\tdelete\tfuzzy");
        let c = parse("word\tsuspic-level\tfuzzy");
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.tsv");
        std::fs::write(&path, "死狗\tdelete\taccurate\n").unwrap();

        let dict = Dictionary::load(&path, &Syntax::default(), ParseMode::Lenient).unwrap();
        assert!(dict.exact("死狗").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Dictionary::load(
            "/nonexistent/words.tsv",
            &Syntax::default(),
            ParseMode::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DictionaryRead { .. }));
    }
}
