use std::fs;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, warn};

use crate::QuestionRecord;
use crate::config::AssetSource;
use crate::error::LoadError;

static BUNDLED_QUESTIONS: &[u8] = include_bytes!("../data/extracted_questions.json");

static BUNDLED_RECORDS: Lazy<Result<Arc<[QuestionRecord]>, String>> =
    Lazy::new(|| parse_questions(BUNDLED_QUESTIONS).map_err(|err| err.to_string()));

impl AssetSource {
    /// Raw bytes of the asset.
    pub fn read(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            AssetSource::Bundled => Ok(BUNDLED_QUESTIONS.to_vec()),
            AssetSource::File(path) => fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            }),
        }
    }
}

/// Parses the question asset.
///
/// Bytes that are not JSON at all are an error. A top-level value that is not
/// an array yields no questions, and array elements that do not describe a
/// question are skipped.
pub fn parse_questions(bytes: &[u8]) -> Result<Arc<[QuestionRecord]>, LoadError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Array(items) = value else {
        warn!("question asset is not a JSON array, treating it as empty");
        return Ok(Arc::from(Vec::<QuestionRecord>::new()));
    };

    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!(index = idx, "skipping question entry that is not an object");
            continue;
        }
        match serde_json::from_value::<QuestionRecord>(item) {
            Ok(record) => records.push(record),
            Err(err) => warn!(index = idx, %err, "skipping malformed question entry"),
        }
    }
    Ok(records.into())
}

/// Reads and parses the question list from `source`.
pub fn load_questions(source: &AssetSource) -> Result<Arc<[QuestionRecord]>, LoadError> {
    let records = match source {
        AssetSource::Bundled => BUNDLED_RECORDS.clone().map_err(LoadError::Bundled)?,
        AssetSource::File(_) => parse_questions(&source.read()?)?,
    };
    debug!(%source, count = records.len(), "loaded questions");
    Ok(records)
}

/// [`load_questions`] on the blocking pool, for use from async hosts.
pub async fn load_questions_async(source: AssetSource) -> Result<Arc<[QuestionRecord]>, LoadError> {
    tokio::task::spawn_blocking(move || load_questions(&source))
        .await
        .map_err(|err| LoadError::Task(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn bundled_asset_parses() {
        let records = load_questions(&AssetSource::Bundled).unwrap();
        assert!(records.len() >= 10);
        assert_eq!(records[0].number(), "1");
        assert!(records.iter().all(|r| !r.text().is_empty()));
    }

    #[test]
    fn non_array_is_empty() {
        let records = parse_questions(br#"{"questions": []}"#).unwrap();
        assert!(records.is_empty());
        let records = parse_questions(b"42").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = parse_questions(b"[{\"question_text\": ").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn only_non_object_entries_are_skipped() {
        let records = parse_questions(
            br#"[
                {"question_number": "1", "question_text": "Kept"},
                7,
                null,
                {"question_number": "2", "question_text": "Which ports?", "options": [22, 443], "correct_answers": [22]},
                {"question_number": true, "question_text": "Odd number"},
                {"question_number": 3, "question_text": "Also kept"}
            ]"#,
        )
        .unwrap();
        let numbers: Vec<_> = records.iter().map(QuestionRecord::number).collect();
        assert_eq!(numbers, ["1", "2", "true", "3"]);
        assert_eq!(records[1].options(), ["22", "443"]);
        assert_eq!(records[1].correct_answers(), ["22"]);
        assert_eq!(crate::filter(&records, "443").len(), 1);
        assert_eq!(crate::filter(&records, "ports").len(), 1);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"question_number": "9", "question_text": "From disk", "explanation": "N/A"}}]"#
        )
        .unwrap();
        let records = load_questions(&AssetSource::File(file.path().to_path_buf())).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(), "From disk");
        assert_eq!(records[0].explanation(), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = AssetSource::File(PathBuf::from("/definitely/not/here/questions.json"));
        let err = load_questions(&source).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn async_load_uses_same_rules() {
        let records = load_questions_async(AssetSource::Bundled).await.unwrap();
        assert_eq!(records.len(), load_questions(&AssetSource::Bundled).unwrap().len());
    }
}
