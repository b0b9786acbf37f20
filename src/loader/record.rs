//! Transcript record parsing.
//!
//! A transcript file holds a single JSON object, a JSON array of objects, or JSON Lines.

use super::{Document, EpisodeMetadata};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Why a record was not turned into a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("file could not be read: {0}")]
    Unreadable(String),

    #[error("file is empty")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no 'text' field")]
    MissingText,
}

/// Outcome of parsing one record.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Loaded(Document),
    Skipped {
        /// 1-based line for JSON Lines records.
        line: Option<usize>,
        reason: SkipReason,
    },
}

/// Wire shape of a transcript record.
#[derive(Debug, Deserialize)]
struct TranscriptRecord {
    text: Option<String>,
    #[serde(rename = "Episode Name")]
    episode_name: Option<String>,
    #[serde(rename = "Podcast Name")]
    podcast_name: Option<String>,
    #[serde(rename = "Episode Link")]
    episode_link: Option<String>,
    duration: Option<Value>,
}

/// Parse the content of one transcript file.
pub fn parse_records(content: &str, source: &str) -> Vec<RecordOutcome> {
    if content.trim().is_empty() {
        return vec![RecordOutcome::Skipped {
            line: None,
            reason: SkipReason::Empty,
        }];
    }

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| outcome(record_from_value(item, source), None))
            .collect(),
        Ok(value) => vec![outcome(record_from_value(value, source), None)],
        Err(_) => content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                let parsed = serde_json::from_str::<Value>(line)
                    .map_err(|e| SkipReason::InvalidJson(e.to_string()))
                    .and_then(|value| record_from_value(value, source));
                outcome(parsed, Some(idx + 1))
            })
            .collect(),
    }
}

fn outcome(result: Result<Document, SkipReason>, line: Option<usize>) -> RecordOutcome {
    match result {
        Ok(doc) => RecordOutcome::Loaded(doc),
        Err(reason) => RecordOutcome::Skipped { line, reason },
    }
}

fn record_from_value(value: Value, source: &str) -> Result<Document, SkipReason> {
    if !value.is_object() {
        return Err(SkipReason::NotAnObject);
    }

    let record: TranscriptRecord =
        serde_json::from_value(value).map_err(|e| SkipReason::InvalidJson(e.to_string()))?;

    let text = record
        .text
        .filter(|t| !t.is_empty())
        .ok_or(SkipReason::MissingText)?;

    let duration = record.duration.and_then(|d| match d {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Ok(Document {
        text,
        metadata: EpisodeMetadata {
            episode_name: record.episode_name.unwrap_or_default(),
            podcast_name: record.podcast_name.unwrap_or_default(),
            episode_link: record.episode_link.unwrap_or_default(),
            duration,
            source: source.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(outcomes: &[RecordOutcome]) -> Vec<&Document> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                RecordOutcome::Loaded(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_object() {
        let content = r#"{"text": "hello there", "Episode Name": "E1", "Podcast Name": "P1", "Episode Link": "http://x", "duration": 3600}"#;
        let outcomes = parse_records(content, "e1.txt");
        let docs = loaded(&outcomes);

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hello there");
        assert_eq!(docs[0].metadata.episode_name, "E1");
        assert_eq!(docs[0].metadata.podcast_name, "P1");
        assert_eq!(docs[0].metadata.episode_link, "http://x");
        assert_eq!(docs[0].metadata.duration.as_deref(), Some("3600"));
        assert_eq!(docs[0].metadata.source, "e1.txt");
    }

    #[test]
    fn test_array_of_objects() {
        let content = r#"[{"text": "a", "Episode Name": "E1"}, {"Episode Name": "E2"}, 7]"#;
        let outcomes = parse_records(content, "list.txt");

        assert_eq!(loaded(&outcomes).len(), 1);
        assert!(matches!(
            outcomes[1],
            RecordOutcome::Skipped { reason: SkipReason::MissingText, .. }
        ));
        assert!(matches!(
            outcomes[2],
            RecordOutcome::Skipped { reason: SkipReason::NotAnObject, .. }
        ));
    }

    #[test]
    fn test_json_lines_skip_bad_line() {
        let content = "{\"text\": \"first\", \"Episode Name\": \"E1\"}\n\nnot json\n{\"text\": \"third\", \"duration\": \"1:02:03\"}\n";
        let outcomes = parse_records(content, "lines.txt");
        let docs = loaded(&outcomes);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].metadata.duration.as_deref(), Some("1:02:03"));
        assert_eq!(docs[1].metadata.episode_name, "");
        match &outcomes[1] {
            RecordOutcome::Skipped { line, reason } => {
                assert_eq!(*line, Some(3));
                assert!(matches!(reason, SkipReason::InvalidJson(_)));
            }
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_text_is_missing() {
        let outcomes = parse_records(r#"{"text": ""}"#, "x.txt");
        assert!(matches!(
            outcomes[0],
            RecordOutcome::Skipped { reason: SkipReason::MissingText, .. }
        ));
    }

    #[test]
    fn test_wrong_field_type() {
        let outcomes = parse_records(r#"{"text": 12}"#, "x.txt");
        assert!(matches!(
            outcomes[0],
            RecordOutcome::Skipped { reason: SkipReason::InvalidJson(_), .. }
        ));
    }

    #[test]
    fn test_empty_file() {
        let outcomes = parse_records("  \n", "x.txt");
        assert!(matches!(
            outcomes[0],
            RecordOutcome::Skipped { reason: SkipReason::Empty, .. }
        ));
    }
}
