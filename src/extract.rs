//! Builds the question asset from a saved exam HTML page.
//!
//! A paragraph whose text starts with `<digits>.` opens a question. Its
//! following siblings, up to the next such paragraph, supply the rest: list
//! items are options (`li.correct_answer` marks the correct ones), table rows
//! make a matching question, and `div.message_box.success` is the explanation.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::QuestionRecord;
use crate::config::AssetSource;
use crate::error::LoadError;
use crate::record::MISSING_EXPLANATION;

pub const DEFAULT_TYPE: &str = "multiple_choice";
pub const MATCHING_TYPE: &str = "matching";

const CORRECT_ANSWER_CLASS: &str = "correct_answer";
const EXPLANATION_CLASSES: [&str; 2] = ["message_box", "success"];
const CELL_SEPARATOR: &str = " : ";

static QUESTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.").expect("valid question pattern"));
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| selector("p"));
static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| selector("li"));
static ROWS: Lazy<Selector> = Lazy::new(|| selector("tr"));
static CELLS: Lazy<Selector> = Lazy::new(|| selector("td"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Every question found in `html`, in document order.
pub fn extract_questions(html: &str) -> Vec<QuestionRecord> {
    let document = Html::parse_document(html);
    let records: Vec<QuestionRecord> = document
        .select(&PARAGRAPHS)
        .filter_map(|paragraph| {
            let text = element_text(paragraph, " ");
            QUESTION_START
                .is_match(&text)
                .then(|| scan_question(paragraph, text))
        })
        .collect();
    debug!(count = records.len(), "extracted questions from html");
    records
}

/// Reads `path` and extracts its questions. Invalid UTF-8 is replaced.
pub fn extract_file(path: &Path) -> Result<Vec<QuestionRecord>, LoadError> {
    let bytes = AssetSource::File(path.to_path_buf()).read()?;
    let records = extract_questions(&String::from_utf8_lossy(&bytes));
    info!(path = %path.display(), count = records.len(), "extracted questions");
    Ok(records)
}

fn scan_question(paragraph: ElementRef<'_>, text: String) -> QuestionRecord {
    let number = text.split('.').next().unwrap_or_default().to_string();
    let mut kind = DEFAULT_TYPE;
    let mut options = Vec::new();
    let mut answers = Vec::new();
    let mut explanation = MISSING_EXPLANATION.to_string();

    for sibling in paragraph.next_siblings().filter_map(ElementRef::wrap) {
        match sibling.value().name() {
            "p" if QUESTION_START.is_match(&element_text(sibling, "")) => break,
            "ul" => {
                for item in sibling.select(&LIST_ITEMS) {
                    let option = element_text(item, "");
                    if item.value().classes().any(|c| c == CORRECT_ANSWER_CLASS) {
                        answers.push(option.clone());
                    }
                    options.push(option);
                }
            }
            "table" => {
                kind = MATCHING_TYPE;
                for row in sibling.select(&ROWS) {
                    let row_text = row
                        .select(&CELLS)
                        .map(|cell| element_text(cell, ""))
                        .collect::<Vec<_>>()
                        .join(CELL_SEPARATOR);
                    // A matching table lists the pairs in their correct state.
                    if !row_text.is_empty() {
                        options.push(row_text.clone());
                        answers.push(row_text);
                    }
                }
            }
            "div" if has_classes(sibling, &EXPLANATION_CLASSES) => {
                explanation = element_text(sibling, " ");
            }
            _ => {}
        }
    }

    QuestionRecord::new(number, text)
        .with_type(kind)
        .with_options(options)
        .with_correct_answers(answers)
        .with_explanation(explanation)
}

/// Text nodes of `element`, trimmed, with empty ones dropped, joined by
/// `separator`.
fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn has_classes(element: ElementRef<'_>, wanted: &[&str]) -> bool {
    wanted
        .iter()
        .all(|class| element.value().classes().any(|c| c == *class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_questions;
    use std::io::Write;

    const EXAM: &str = r#"<html><body>
        <h1>Final exam</h1>
        <p>Answer every question.</p>
        <p><strong>1.</strong> Which routing protocol uses cost as its metric?</p>
        <ul>
          <li>RIP</li>
          <li class="correct_answer">OSPF</li>
          <li> EIGRP </li>
        </ul>
        <div class="message_box success"><p>Explanation:</p> OSPF uses cost.</div>
        <p>2. Match the protocol to its port.</p>
        <table>
          <tr><td>SSH</td><td>22</td></tr>
          <tr><td></td></tr>
          <tr><td>HTTPS</td><td>443</td></tr>
        </table>
        <p>3. What is a VLAN?</p>
        <ul><li>A broadcast domain</li><li>A cable type</li></ul>
        <div class="message_box">Not an explanation.</div>
    </body></html>"#;

    #[test]
    fn list_items_become_options_and_answers() {
        let records = extract_questions(EXAM);
        assert_eq!(records.len(), 3);
        let first = &records[0];
        assert_eq!(first.number(), "1");
        assert_eq!(
            first.text(),
            "1. Which routing protocol uses cost as its metric?"
        );
        assert_eq!(first.kind(), DEFAULT_TYPE);
        assert_eq!(first.options(), ["RIP", "OSPF", "EIGRP"]);
        assert_eq!(first.correct_answers(), ["OSPF"]);
    }

    #[test]
    fn tables_become_matching_pairs() {
        let records = extract_questions(EXAM);
        let second = &records[1];
        assert_eq!(second.number(), "2");
        assert_eq!(second.kind(), MATCHING_TYPE);
        assert_eq!(second.options(), ["SSH : 22", "HTTPS : 443"]);
        assert_eq!(second.correct_answers(), second.options());
    }

    #[test]
    fn success_box_is_the_explanation() {
        let records = extract_questions(EXAM);
        assert_eq!(records[0].explanation(), Some("Explanation: OSPF uses cost."));
        assert_eq!(records[1].explanation(), None);
        assert_eq!(records[1].explanation_text(), MISSING_EXPLANATION);
        // Only the div with both classes counts.
        assert_eq!(records[2].explanation_text(), MISSING_EXPLANATION);
        assert!(records[2].correct_answers().is_empty());
    }

    #[test]
    fn page_without_questions_is_empty() {
        assert!(extract_questions("<p>Intro</p><ul><li>stray</li></ul>").is_empty());
    }

    #[test]
    fn extracted_file_round_trips_through_the_loader() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAM.as_bytes()).unwrap();
        let records = extract_file(file.path()).unwrap();
        let json = serde_json::to_vec(&records).unwrap();
        let loaded = parse_questions(&json).unwrap();
        assert_eq!(&loaded[..], &records[..]);
        assert_eq!(crate::filter(&loaded, "443").len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = extract_file(Path::new("/no/such/exam.html")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
