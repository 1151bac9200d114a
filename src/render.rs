//! View model for a list of question records.
//!
//! Rendering produces typed blocks whose text is split into plain and
//! highlighted segments. Output layers (HTML page, terminal) decide how a
//! highlight looks and are responsible for escaping each segment.

use serde::Serialize;

use crate::QuestionRecord;
use crate::search::QueryMatcher;

/// Records shown on first load and after the search is cleared.
pub const INITIAL_DISPLAY_LIMIT: usize = 10;
/// Records shown while a search is active.
pub const SEARCH_DISPLAY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

/// A display field split around query matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightedText {
    pub segments: Vec<Segment>,
}

impl HighlightedText {
    pub fn plain(text: &str) -> Self {
        let mut out = Self::default();
        out.push(text, false);
        out
    }

    fn push(&mut self, text: &str, highlighted: bool) {
        if text.is_empty() {
            return;
        }
        self.segments.push(Segment {
            text: text.to_string(),
            highlighted,
        });
    }

    /// The field text with highlighting removed.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn highlights(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| s.highlighted)
            .map(|s| s.text.as_str())
    }

    pub fn has_highlight(&self) -> bool {
        self.segments.iter().any(|s| s.highlighted)
    }
}

/// Splits `text` into segments around every occurrence of the query.
pub fn highlight(text: &str, matcher: &QueryMatcher) -> HighlightedText {
    let mut out = HighlightedText::default();
    let mut cursor = 0;
    for range in matcher.find_ranges(text) {
        out.push(&text[cursor..range.start], false);
        out.push(&text[range.clone()], true);
        cursor = range.end;
    }
    out.push(&text[cursor..], false);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBlock {
    pub number: HighlightedText,
    pub kind: String,
    pub question: HighlightedText,
    pub options: Vec<HighlightedText>,
    pub correct_answers: Vec<HighlightedText>,
    pub explanation: Option<HighlightedText>,
}

impl QuestionBlock {
    pub fn from_record(record: &QuestionRecord, matcher: &QueryMatcher) -> Self {
        let number = if record.number().is_empty() {
            HighlightedText::plain(record.display_number())
        } else {
            highlight(record.number(), matcher)
        };
        Self {
            number,
            kind: record.kind().to_string(),
            question: highlight(record.text(), matcher),
            options: record
                .options()
                .iter()
                .map(|option| highlight(option, matcher))
                .collect(),
            correct_answers: record
                .correct_answers()
                .iter()
                .map(|answer| highlight(answer, matcher))
                .collect(),
            explanation: record
                .explanation()
                .map(|explanation| highlight(explanation, matcher)),
        }
    }

    pub fn number_label(&self) -> String {
        format!("Question {}", self.number.text())
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn has_correct_answers(&self) -> bool {
        !self.correct_answers.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedList {
    pub query: String,
    pub blocks: Vec<QuestionBlock>,
}

impl RenderedList {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Builds display blocks for `records`, highlighting the trimmed `query`.
///
/// Callers slice the records to the display limit first.
pub fn render<'a, I>(records: I, query: &str) -> RenderedList
where
    I: IntoIterator<Item = &'a QuestionRecord>,
{
    let matcher = QueryMatcher::new(query);
    RenderedList {
        query: query.trim().to_string(),
        blocks: records
            .into_iter()
            .map(|record| QuestionBlock::from_record(record, &matcher))
            .collect(),
    }
}

/// Text of the results counter above the list.
pub fn count_label(total: usize, matched: usize, query: &str) -> String {
    if query.trim().is_empty() {
        format!("{total} questions loaded")
    } else {
        format!("{matched} of {total} questions found")
    }
}
