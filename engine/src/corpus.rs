use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 2000;

const TITLE_KEYS: &[&str] = &["headline", "title", "heading"];
const CONTENT_KEYS: &[&str] = &["short_description", "description", "content", "text", "body", "summary"];
const CATEGORY_KEYS: &[&str] = &["category", "topic", "section"];
const CONTAINER_KEYS: &[&str] = &["documents", "articles", "news", "data"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// How raw news records are mapped onto [`Document`].
#[derive(Debug, Clone)]
pub struct RecordMapping {
    pub default_category: String,
    /// Store `"{title}. {content}"` as the document content.
    pub prefix_title: bool,
}

impl Default for RecordMapping {
    fn default() -> Self {
        Self { default_category: "General".into(), prefix_title: false }
    }
}

impl RecordMapping {
    /// Map the record at 0-based `position`; `None` when it carries no content.
    pub fn map_record(&self, record: &Map<String, Value>, position: usize) -> Option<Document> {
        let content = first_text(record, CONTENT_KEYS)?;
        let title = first_text(record, TITLE_KEYS).unwrap_or_else(|| format!("Article {}", position + 1));
        let content = if self.prefix_title { format!("{title}. {content}") } else { content };
        let category = first_text(record, CATEGORY_KEYS).unwrap_or_else(|| self.default_category.clone());
        let id = match record.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => (position + 1).to_string(),
        };
        Some(Document {
            id,
            title: truncate_chars(&title, MAX_TITLE_CHARS),
            content: truncate_chars(&content, MAX_CONTENT_CHARS),
            category: Some(category),
        })
    }

    /// Map every record, dropping the ones without content. Returns the kept
    /// documents and the number skipped.
    pub fn map_records(&self, records: &[Value]) -> (Vec<Document>, usize) {
        self.map_records_with_progress(records, |_| {})
    }

    /// Like [`RecordMapping::map_records`], calling `progress` with the number
    /// of records processed so far after each record.
    pub fn map_records_with_progress<F>(&self, records: &[Value], mut progress: F) -> (Vec<Document>, usize)
    where
        F: FnMut(usize),
    {
        let mut docs = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for (pos, value) in records.iter().enumerate() {
            match value.as_object().and_then(|obj| self.map_record(obj, pos)) {
                Some(doc) => docs.push(doc),
                None => skipped += 1,
            }
            progress(pos + 1);
        }
        (docs, skipped)
    }
}

fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Parse raw records from a JSON array, a JSON object holding one of the
/// container keys, or JSON Lines.
pub fn parse_records(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(Value::Object(mut obj)) => {
            for key in CONTAINER_KEYS {
                if let Some(Value::Array(items)) = obj.remove(*key) {
                    return Ok(items);
                }
            }
            // A one-line JSONL file holding a single record
            Ok(vec![Value::Object(obj)])
        }
        Ok(other) => Err(EngineError::CorpusFormat(format!("top-level JSON {}", type_name(&other)))),
        Err(_) => {
            let mut items = Vec::new();
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() { continue; }
                items.push(serde_json::from_str(line)?);
            }
            Ok(items)
        }
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn load_documents<P: AsRef<Path>>(path: P, mapping: &RecordMapping) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let records = parse_records(&text)?;
    let (docs, skipped) = mapping.map_records(&records);
    tracing::info!(path = %path.display(), loaded = docs.len(), skipped, "corpus loaded");
    Ok(docs)
}

/// Load the corpus at `path`, or fall back to [`sample_documents`] when the
/// file is missing, unreadable, malformed, or yields no documents.
pub fn load_or_sample<P: AsRef<Path>>(path: P) -> Vec<Document> {
    let path = path.as_ref();
    match load_documents(path, &RecordMapping::default()) {
        Ok(docs) if !docs.is_empty() => docs,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "corpus has no usable documents, using sample corpus");
            sample_documents()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "corpus unavailable, using sample corpus");
            sample_documents()
        }
    }
}

pub fn sample_documents() -> Vec<Document> {
    let doc = |id: &str, title: &str, content: &str| Document {
        id: id.into(),
        title: title.into(),
        content: content.into(),
        category: Some("Technology".into()),
    };
    vec![
        doc(
            "1",
            "Introduction to Machine Learning",
            "Machine learning is a subset of artificial intelligence that enables systems to learn and improve from experience without being explicitly programmed.",
        ),
        doc(
            "2",
            "Natural Language Processing Basics",
            "Natural language processing (NLP) is a branch of AI that helps computers understand, interpret and manipulate human language.",
        ),
        doc(
            "3",
            "Deep Learning Neural Networks",
            "Deep learning uses neural networks with multiple layers to progressively extract higher-level features from raw input data.",
        ),
    ]
}
