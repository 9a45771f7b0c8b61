/// A raw batch element: any JSON object, not yet checked.
pub type RawRecord = Map<String, Value>;

/// Option labels mapped to their text, in input order.
///
/// Labels keep their input spelling, trimmed; they are never blank and never repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(String, String)>,
}

impl OptionSet {
    /// Accepts only a JSON object of at least two label/text pairs.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let map = value.as_object().ok_or(ValidationError::InvalidOptions)?;
        if map.len() < 2 {
            return Err(ValidationError::InvalidOptions);
        }

        let mut entries: Vec<(String, String)> = Vec::with_capacity(map.len());
        for (key, text) in map {
            let label = key.trim().to_string();
            if label.is_empty() || entries.iter().any(|(l, _)| *l == label) {
                return Err(ValidationError::InvalidOptions);
            }
            let text = match text {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(ValidationError::InvalidOptions);
                }
            };
            entries.push((label, text));
        }

        Ok(OptionSet { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l == label)
    }

    /// The stored label an answer refers to. An exact match wins; otherwise
    /// a case-insensitive match counts only when exactly one label fits.
    pub fn resolve<'a>(&'a self, answer: &'a str) -> Option<&'a str> {
        let answer = answer.trim();
        if self.contains(answer) {
            return Some(answer);
        }
        let mut matches = self
            .entries
            .iter()
            .filter(|(l, _)| l.to_lowercase() == answer.to_lowercase());
        match (matches.next(), matches.next()) {
            (Some((label, _)), None) => Some(label.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }
}

/// A record that passed every check and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question_text: String,
    pub options: OptionSet,
    /// Always one of the labels in `options`.
    pub correct_answer: String,
    pub explanation: String,
    /// Per-record routing hint. Callers with a fixed subject ignore it.
    pub subject: Option<String>,
}

impl QuestionRecord {
    /// Runs the checks in order and stops at the first one that fails.
    pub fn validate(raw: &RawRecord) -> Result<Self, ValidationError> {
        let question_text = raw
            .get("question_text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingQuestionText)?
            .to_string();

        let options = raw
            .get("options")
            .ok_or(ValidationError::InvalidOptions)
            .and_then(OptionSet::from_value)?;

        let correct_answer = raw
            .get("correct_answer")
            .and_then(Value::as_str)
            .and_then(|answer| options.resolve(answer))
            .map(str::to_string)
            .ok_or(ValidationError::CorrectAnswerNotInOptions)?;

        let explanation = raw
            .get("explanation")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingExplanation)?
            .trim()
            .to_string();

        let subject = raw
            .get("subject")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(QuestionRecord {
            question_text,
            options,
            correct_answer,
            explanation,
            subject,
        })
    }
}

/// Parses a JSON text blob into batch records.
///
/// Fails as a whole when the text is not JSON, is not an array, or holds an
/// element that is not an object.
pub fn parse_batch(text: &str) -> Result<Vec<RawRecord>, ImportError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ImportError::MalformedInput(format!("invalid JSON: {}", e)))?;
    records_from_value(value)
}

pub fn records_from_value(value: Value) -> Result<Vec<RawRecord>, ImportError> {
    let Value::Array(items) = value else {
        return Err(ImportError::MalformedInput(
            "JSON data must be an array of questions".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(ImportError::MalformedInput(format!(
                "element {} is not a question object",
                i + 1
            ))),
        })
        .collect()
}

/// Reads a payload from a file path, or from stdin when the path is `-`.
pub fn read_payload(source: &str) -> anyhow::Result<String> {
    let mut text = String::new();
    if source == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin.")?;
    } else {
        let file = File::open(Path::new(source))
            .with_context(|| format!("Failed to open payload file '{}'", source))?;
        BufReader::new(file)
            .read_to_string(&mut text)
            .with_context(|| format!("Failed to read payload file '{}'", source))?;
    }
    Ok(text)
}


use crate::error::{ImportError, ValidationError};
use anyhow::Context;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
