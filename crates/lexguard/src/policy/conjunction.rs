//! Conjunction evaluation over the raw hits of one scan.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::trace;

use super::dictionary::{Dictionary, LineSlot, PolicyRecord, TokenId};
use crate::automaton::RawMatch;
use crate::error::Result;

/// A satisfied dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    /// The sub-token (or, for exact entries, the whole text) that completed the entry.
    pub word: String,
    /// The satisfied entry.
    pub policy: PolicyRecord,
}

impl Hit {
    /// Whether this hit forbids the text.
    #[must_use]
    pub fn is_forbidding(&self) -> bool {
        self.policy.is_forbidding()
    }
}

/// Determine which compound entries are fully satisfied by `matches`.
///
/// Each distinct sub-token counts once toward every line that requires it,
/// however often it occurs. A line is reported when its last missing
/// sub-token is seen, tagged with that sub-token. Hits follow the order in
/// which completing sub-tokens first appear in `matches`; lines completed by
/// the same sub-token are reported in dictionary line order.
///
/// # Errors
///
/// Returns [`crate::Error::IndexOutOfRange`] if `matches` refers to a pattern
/// the dictionary's automaton does not know.
pub fn evaluate(dictionary: &Dictionary, matches: &[RawMatch]) -> Result<Vec<Hit>> {
    let automaton = dictionary.automaton();
    let index = dictionary.index();

    let mut seen: HashSet<TokenId> = HashSet::new();
    let mut counters: HashMap<LineSlot, usize> = HashMap::new();
    let mut hits = Vec::new();

    for raw in matches {
        let (_, &token) = automaton.pattern(raw.pattern)?;
        if !seen.insert(token) {
            continue;
        }
        let Some(entry) = index.token(token) else {
            continue;
        };

        for &slot in &entry.lines {
            let Some(line) = index.line(slot) else {
                continue;
            };
            let count = counters.entry(slot).or_insert(0);
            *count += 1;
            if *count != line.required {
                continue;
            }
            if let Some(policy) = dictionary.policy(&line.key) {
                trace!(line = line.line, word = %entry.text, "Compound entry satisfied");
                hits.push(Hit {
                    word: entry.text.clone(),
                    policy: policy.clone(),
                });
            }
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::BufferPool;
    use crate::policy::dictionary::{ParseMode, Syntax};

    fn dictionary(text: &str) -> Dictionary {
        Dictionary::parse(text, &Syntax::default(), ParseMode::Lenient).unwrap()
    }

    fn run(dictionary: &Dictionary, text: &str) -> Vec<(String, String)> {
        let pool = BufferPool::default();
        let matches = dictionary.automaton().find(&pool, text.chars()).unwrap();
        evaluate(dictionary, &matches)
            .unwrap()
            .into_iter()
            .map(|hit| (hit.word, hit.policy.key))
            .collect()
    }

    #[test]
    fn test_single_token_entry() {
        let dict = dictionary("大胖子\tsuspic-level\tfuzzy");
        assert_eq!(
            run(&dict, "他是个大胖子"),
            vec![("大胖子".to_string(), "大胖子".to_string())]
        );
    }

    #[test]
    fn test_conjunction_requires_every_token() {
        let dict = dictionary("死肥猪|八婆\tsuspic-level\tfuzzy");

        assert!(run(&dict, "你就是个八婆？").is_empty());
        assert_eq!(
            run(&dict, "八婆今天买了一头死肥猪，特别肥"),
            vec![("死肥猪".to_string(), "死肥猪|八婆".to_string())]
        );
    }

    #[test]
    fn test_repeated_token_counts_once() {
        let dict = dictionary("a|b\tsuspic-level\tfuzzy");
        assert!(run(&dict, "a a a a").is_empty());
        assert_eq!(run(&dict, "b then a").len(), 1);
    }

    #[test]
    fn test_token_order_in_text_does_not_matter() {
        let dict = dictionary("长胖了|八百斤|千金小姐\tsuspic-level\tfuzzy");
        assert_eq!(run(&dict, "千金小姐长胖了，八百斤").len(), 1);
        assert_eq!(run(&dict, "八百斤的千金小姐长胖了").len(), 1);
        assert!(run(&dict, "小学1年级的时候八百斤，初中2年级").is_empty());
    }

    #[test]
    fn test_lines_completed_by_same_token_in_line_order() {
        let text = "x|z\tsuspic-level\tfuzzy\ny|z\tdelete\tfuzzy\nz\tsuspic-level\tfuzzy";
        let dict = dictionary(text);
        let hits = run(&dict, "x y z");
        assert_eq!(
            hits,
            vec![
                ("z".to_string(), "x|z".to_string()),
                ("z".to_string(), "y|z".to_string()),
                ("z".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_tokens_both_count() {
        // "肥猪" is a suffix of "死肥猪"; both must be reported by the scan.
        let dict = dictionary("死肥猪|肥猪\tdelete\tfuzzy");
        let hits = run(&dict, "死肥猪");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "肥猪");
    }

    #[test]
    fn test_empty_matches() {
        let dict = dictionary("a\tsuspic-level\tfuzzy");
        assert!(evaluate(&dict, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_pattern_index() {
        let dict = dictionary("a\tsuspic-level\tfuzzy");
        let bogus = [RawMatch {
            pattern: 99,
            end: 0,
        }];
        assert!(evaluate(&dict, &bogus).is_err());
    }
}
