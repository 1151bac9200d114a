use std::sync::Arc;

use crate::QuestionRecord;
use crate::search::{QueryMatcher, haystacks};

/// The loaded question set and the subset selected by the current query.
///
/// Records are shared read-only; filtering only rebuilds the list of selected
/// positions. Lowercased haystacks are computed once when the store is built.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    records: Arc<[QuestionRecord]>,
    haystacks: Arc<[[String; 5]]>,
    filtered: Vec<usize>,
}

impl QuestionStore {
    pub fn new(records: impl Into<Arc<[QuestionRecord]>>) -> Self {
        let records = records.into();
        let haystacks = records.iter().map(haystacks).collect();
        let filtered = (0..records.len()).collect();
        Self {
            records,
            haystacks,
            filtered,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<QuestionRecord>::new())
    }

    pub fn records(&self) -> &Arc<[QuestionRecord]> {
        &self.records
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn matched(&self) -> usize {
        self.filtered.len()
    }

    /// Re-selects records for `query`. A blank query selects everything.
    pub fn apply(&mut self, query: &str) {
        let matcher = QueryMatcher::new(query);
        self.filtered = if matcher.is_empty() {
            (0..self.records.len()).collect()
        } else {
            self.haystacks
                .iter()
                .enumerate()
                .filter(|(_, fields)| fields.iter().any(|f| matcher.is_match_folded(f)))
                .map(|(idx, _)| idx)
                .collect()
        };
    }

    pub fn reset(&mut self) {
        self.filtered = (0..self.records.len()).collect();
    }

    pub fn filtered(&self) -> impl Iterator<Item = &QuestionRecord> + '_ {
        self.filtered.iter().map(|&idx| &self.records[idx])
    }

    /// The first `limit` selected records.
    pub fn visible(&self, limit: usize) -> impl Iterator<Item = &QuestionRecord> + '_ {
        self.filtered().take(limit)
    }
}

impl Default for QuestionStore {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filter;

    fn records(n: usize) -> Vec<QuestionRecord> {
        (1..=n)
            .map(|i| {
                let text = if i % 5 == 0 {
                    format!("Routing question {i}")
                } else {
                    format!("Switching question {i}")
                };
                QuestionRecord::new(i.to_string(), text)
            })
            .collect()
    }

    #[test]
    fn starts_with_everything_selected() {
        let store = QuestionStore::new(records(25));
        assert_eq!(store.total(), 25);
        assert_eq!(store.matched(), 25);
        let shown: Vec<_> = store.visible(10).map(QuestionRecord::number).collect();
        assert_eq!(shown, ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
    }

    #[test]
    fn apply_agrees_with_filter() {
        let all = records(25);
        let mut store = QuestionStore::new(all.clone());
        for query in ["routing", "SWITCH", "2", "question 1", "nothing", ""] {
            store.apply(query);
            let expected = filter(&all, query);
            let got: Vec<_> = store.filtered().cloned().collect();
            assert_eq!(got, expected, "query {query:?}");
        }
    }

    #[test]
    fn reset_restores_full_selection() {
        let mut store = QuestionStore::new(records(25));
        store.apply("routing");
        assert_eq!(store.matched(), 5);
        store.reset();
        assert_eq!(store.matched(), 25);
    }

    #[test]
    fn records_are_shared_not_copied() {
        let store = QuestionStore::new(records(3));
        let copy = store.clone();
        assert!(Arc::ptr_eq(store.records(), copy.records()));
    }
}
