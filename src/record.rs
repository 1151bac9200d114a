use serde::{Deserialize, Serialize};

/// Sentinel the extraction step writes when a question has no explanation.
pub const MISSING_EXPLANATION: &str = "N/A";

const UNKNOWN_NUMBER: &str = "N/A";
const UNKNOWN_TYPE: &str = "unknown";

/// One quiz question as loaded from the question asset.
///
/// Absent fields are resolved once, when the record is built: lists default to
/// empty, text defaults to the empty string, and the explanation is flagged as
/// displayable only when it carries real content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQuestion", into = "RawQuestion")]
pub struct QuestionRecord {
    number: Option<String>,
    text: String,
    kind: Option<String>,
    options: Vec<String>,
    correct_answers: Vec<String>,
    explanation: Option<String>,
    explanation_visible: bool,
}

impl QuestionRecord {
    pub fn new(number: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            number: Some(number.into()),
            text: text.into(),
            kind: None,
            options: Vec::new(),
            correct_answers: Vec::new(),
            explanation: None,
            explanation_visible: false,
        }
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_correct_answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.correct_answers = answers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        self.explanation_visible = explanation_is_present(&explanation);
        self.explanation = Some(explanation);
        self
    }

    /// Question number exactly as stored, or the empty string when absent.
    pub fn number(&self) -> &str {
        self.number.as_deref().unwrap_or_default()
    }

    /// Question number for display; falls back to `N/A`.
    pub fn display_number(&self) -> &str {
        self.number
            .as_deref()
            .filter(|number| !number.is_empty())
            .unwrap_or(UNKNOWN_NUMBER)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Type label for display; falls back to `unknown`.
    pub fn kind(&self) -> &str {
        self.kind
            .as_deref()
            .filter(|kind| !kind.is_empty())
            .unwrap_or(UNKNOWN_TYPE)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answers(&self) -> &[String] {
        &self.correct_answers
    }

    /// Explanation to display, `None` when it is empty, blank or `N/A`.
    pub fn explanation(&self) -> Option<&str> {
        if self.explanation_visible {
            self.explanation.as_deref()
        } else {
            None
        }
    }

    /// Raw explanation text used for matching, including the `N/A` sentinel.
    pub fn explanation_text(&self) -> &str {
        self.explanation.as_deref().unwrap_or_default()
    }
}

fn explanation_is_present(explanation: &str) -> bool {
    let trimmed = explanation.trim();
    !trimmed.is_empty() && explanation != MISSING_EXPLANATION
}

/// Wire shape of a record in `extracted_questions.json`.
///
/// Fields of the wrong JSON type never reject the record: scalars are kept as
/// their text and anything else counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawQuestion {
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    question_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    question_text: Option<String>,
    #[serde(
        default,
        rename = "type",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    options: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    correct_answers: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    explanation: Option<String>,
}

impl From<RawQuestion> for QuestionRecord {
    fn from(raw: RawQuestion) -> Self {
        let explanation_visible = raw
            .explanation
            .as_deref()
            .is_some_and(explanation_is_present);
        Self {
            number: raw.question_number,
            text: raw.question_text.unwrap_or_default(),
            kind: raw.kind,
            options: raw.options.unwrap_or_default(),
            correct_answers: raw.correct_answers.unwrap_or_default(),
            explanation: raw.explanation,
            explanation_visible,
        }
    }
}

impl From<QuestionRecord> for RawQuestion {
    fn from(record: QuestionRecord) -> Self {
        Self {
            question_number: record.number,
            question_text: Some(record.text),
            kind: record.kind,
            options: Some(record.options),
            correct_answers: Some(record.correct_answers),
            explanation: record.explanation,
        }
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub(super) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(Value::deserialize(deserializer)?))
    }

    /// Array elements that are not scalars are dropped.
    pub(super) fn text_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(items.into_iter().filter_map(scalar_text).collect()),
            _ => None,
        })
    }
}
