//! Canonical JSON rendering of answers.
//!
//! The document shape is `{"certainity": ..., "kind": ..., "data": ...}`.
//! The `certainity` key is misspelled on purpose: it is part of the stable
//! output contract and consumers already depend on it.
//!
//! Key order is document order (serde_json's `preserve_order` feature), so
//! parsing a rendered answer and re-emitting it is byte-identical.

use anyhow::Result;
use serde_json::{Map, Value, json};

use super::{Answer, Repo};

/// Render one answer as canonical JSON.
pub fn to_json(answer: &Answer) -> Result<String> {
    let (kind, data) = match answer {
        Answer::Exists(repo) | Answer::MaybeExists(repo) => {
            (repo.kind().name(), repo_data(repo)?)
        }
        Answer::DoesNotExist { kind, message } => (
            kind.name(),
            json!({
                "kind": kind.name(),
                "message": message,
            }),
        ),
    };

    let mut doc = Map::new();
    doc.insert("certainity".to_string(), Value::String(answer.certainty().to_string()));
    doc.insert("kind".to_string(), Value::String(kind.to_string()));
    doc.insert("data".to_string(), data);
    Ok(serde_json::to_string(&Value::Object(doc))?)
}

fn repo_data(repo: &Repo) -> Result<Value> {
    Ok(serde_json::to_value(repo)?)
}
