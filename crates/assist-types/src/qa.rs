//! Question/answer entries and the knowledge-base file format.
//!
//! The knowledge base is a JSON document holding an ordered list of entries,
//! either wrapped as `{"qa_pairs": [...]}` or as a bare array. Each entry has
//! a stable identifier, one primary question, paraphrase variations, one
//! answer, a category label and related entry identifiers.
//!
//! Loading is forgiving: an entry that does not deserialize is logged and
//! skipped, it never aborts the load.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AssistError;

/// Opaque identifier of a knowledge-base entry.
///
/// Accepts both strings and integers on input; always serialized as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct QaId(String);

impl QaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for QaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<QaId> for String {
    fn from(id: QaId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

impl From<RawId> for QaId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => QaId(s),
            RawId::Integer(n) => QaId(n.to_string()),
        }
    }
}

fn default_category() -> String {
    "general".to_string()
}

/// A curated question/answer pair.
///
/// Immutable once the index is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEntry {
    pub id: QaId,

    /// Primary phrasing of the question
    #[serde(alias = "question_principale")]
    pub question: String,

    /// Paraphrases of the primary question, in authoring order
    #[serde(default)]
    pub variations: Vec<String>,

    #[serde(alias = "reponse")]
    pub answer: String,

    #[serde(default = "default_category", alias = "categorie")]
    pub category: String,

    /// Identifiers of related entries, used for follow-up suggestions
    #[serde(default, alias = "questions_connexes")]
    pub related_ids: Vec<QaId>,
}

impl QaEntry {
    /// Create an entry with no variations or related entries.
    pub fn new(
        id: impl Into<QaId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            variations: Vec::new(),
            answer: answer.into(),
            category: default_category(),
            related_ids: Vec::new(),
        }
    }

    pub fn with_variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variations = variations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_related<I, S>(mut self, related: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<QaId>,
    {
        self.related_ids = related.into_iter().map(Into::into).collect();
        self
    }
}

/// An entry that was dropped while loading.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    /// Zero-based position in the source document
    pub position: usize,
    pub reason: String,
}

#[derive(Serialize)]
struct KnowledgeBaseDocument<'a> {
    qa_pairs: &'a [QaEntry],
}

/// Ordered collection of entries loaded from a knowledge-base document.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<QaEntry>,
    skipped: Vec<SkippedEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<QaEntry>) -> Self {
        Self {
            entries,
            skipped: Vec::new(),
        }
    }

    /// Load a knowledge base from a JSON file.
    ///
    /// Fails only when the file cannot be read or is not a usable document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssistError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let kb = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            entries = kb.entries.len(),
            skipped = kb.skipped.len(),
            "Loaded knowledge base"
        );
        Ok(kb)
    }

    /// Parse a knowledge base from JSON text.
    pub fn from_json(text: &str) -> Result<Self, AssistError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a knowledge base from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, AssistError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("qa_pairs") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(AssistError::KnowledgeBase(
                        "\"qa_pairs\" must be an array".to_string(),
                    ))
                }
                None => {
                    return Err(AssistError::KnowledgeBase(
                        "missing \"qa_pairs\" array".to_string(),
                    ))
                }
            },
            other => {
                return Err(AssistError::KnowledgeBase(format!(
                    "expected an object or an array, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut entries = Vec::with_capacity(items.len());
        let mut skipped = Vec::new();

        for (position, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<QaEntry>(item) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(position, error = %e, "Skipping malformed knowledge-base entry");
                    skipped.push(SkippedEntry {
                        position,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(entries = entries.len(), skipped = skipped.len(), "Parsed knowledge base");

        Ok(Self { entries, skipped })
    }

    /// Write the canonical `{"qa_pairs": [...]}` form.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, AssistError> {
        let doc = KnowledgeBaseDocument {
            qa_pairs: &self.entries,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn entries(&self) -> &[QaEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<QaEntry> {
        self.entries
    }

    /// Entries dropped during load, with the reason.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
