//! Case-insensitive substring search over question records.
//!
//! Filtering and highlighting both go through [`QueryMatcher`], which folds
//! text one character at a time and looks for the folded query as a literal.
//! Both sides therefore agree on what counts as a match.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::QuestionRecord;

/// Size cap for the compiled query pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A normalized search query.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    needle: String,
    pattern: Option<Regex>,
}

impl QueryMatcher {
    /// Trims and lowercases `query`. A blank query matches nothing and marks
    /// nothing; callers treat it as the cleared state.
    pub fn new(query: &str) -> Self {
        let needle = fold_case(query.trim());
        let pattern = if needle.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(&needle))
                .size_limit(PATTERN_SIZE_LIMIT)
                .build()
                .map_err(|err| warn!(%err, "query pattern rejected, using plain substring search"))
                .ok()
        };
        Self { needle, pattern }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// The trimmed, lowercased query.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Whether the query occurs in an already folded haystack.
    pub fn is_match_folded(&self, folded: &str) -> bool {
        if self.needle.is_empty() {
            return false;
        }
        match &self.pattern {
            Some(pattern) => pattern.is_match(folded),
            None => folded.contains(&self.needle),
        }
    }

    /// Whether the query occurs anywhere in `text`, ignoring case.
    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_folded(&fold_case(text))
    }

    /// Byte ranges of `text` covering each non-overlapping occurrence of the
    /// query, in order.
    pub fn find_ranges(&self, text: &str) -> Vec<Range<usize>> {
        if self.needle.is_empty() || text.is_empty() {
            return Vec::new();
        }
        let folded = FoldedText::new(text);
        let hits: Vec<Range<usize>> = match &self.pattern {
            Some(pattern) => pattern
                .find_iter(&folded.text)
                .map(|hit| hit.range())
                .collect(),
            None => folded
                .text
                .match_indices(self.needle.as_str())
                .map(|(start, matched)| start..start + matched.len())
                .collect(),
        };

        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(hits.len());
        for hit in hits {
            let mut range = folded.source_range(hit);
            // One source character can fold into several; two hits inside the
            // same expansion collapse onto the same source span.
            if let Some(last) = ranges.last() {
                range.start = range.start.max(last.end);
            }
            if range.start < range.end {
                ranges.push(range);
            }
        }
        ranges
    }
}

/// Lowercases `text` the way [`QueryMatcher`] sees it.
pub fn fold_case(text: &str) -> String {
    FoldedText::new(text).text
}

/// Lowercased text plus, for every byte of it, the source span of the
/// character it came from.
struct FoldedText {
    text: String,
    origin: Vec<Range<usize>>,
}

impl FoldedText {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len());
        let mut prev_alphabetic = false;
        let mut chars = source.char_indices().peekable();
        while let Some((offset, ch)) = chars.next() {
            let span = offset..offset + ch.len_utf8();
            let before = text.len();
            if ch == 'Σ' {
                // Word-final capital sigma lowercases to 'ς', as in `str::to_lowercase`.
                let next_alphabetic = chars.peek().is_some_and(|&(_, next)| next.is_alphabetic());
                text.push(if prev_alphabetic && !next_alphabetic {
                    'ς'
                } else {
                    'σ'
                });
            } else {
                text.extend(ch.to_lowercase());
            }
            prev_alphabetic = ch.is_alphabetic();
            origin.extend(std::iter::repeat_n(span, text.len() - before));
        }
        Self { text, origin }
    }

    fn source_range(&self, folded: Range<usize>) -> Range<usize> {
        let start = self.origin[folded.start].start;
        let end = self.origin[folded.end - 1].end;
        start..end
    }
}

/// Lowercased text of the five searchable fields of a record.
pub fn haystacks(record: &QuestionRecord) -> [String; 5] {
    [
        fold_case(record.text()),
        fold_case(record.number()),
        fold_case(&record.options().join(" ")),
        fold_case(&record.correct_answers().join(" ")),
        fold_case(record.explanation_text()),
    ]
}

/// Whether `record` contains the query in any searchable field.
pub fn record_matches(record: &QuestionRecord, matcher: &QueryMatcher) -> bool {
    haystacks(record)
        .iter()
        .any(|haystack| matcher.is_match_folded(haystack))
}

/// Positions of the records matching `query`, in their original order. A blank
/// query selects every record.
pub fn filter_indices(records: &[QuestionRecord], query: &str) -> Vec<usize> {
    let matcher = QueryMatcher::new(query);
    if matcher.is_empty() {
        return (0..records.len()).collect();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record_matches(record, &matcher))
        .map(|(idx, _)| idx)
        .collect()
}

/// Records matching `query`, in their original order. A blank query returns the
/// input unchanged.
pub fn filter(records: &[QuestionRecord], query: &str) -> Vec<QuestionRecord> {
    filter_indices(records, query)
        .into_iter()
        .map(|idx| records[idx].clone())
        .collect()
}
