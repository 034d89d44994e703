//! Reading chat logs and writing annotated logs.
//!
//! Input is read wholesale. Output is written to a sibling temporary file
//! and renamed into place, so a failed run never leaves a half-written log
//! and an earlier good log survives.

use crate::message::{ChatMessage, MessageError, OutputRecord, RawMessage};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Message(#[from] MessageError),
}

impl PersistError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Decode a JSON array of chat messages, checking required fields.
pub fn parse_messages(json: &str) -> Result<Vec<ChatMessage>, PersistError> {
    let raw: Vec<RawMessage> = serde_json::from_str(json)?;
    let messages = raw
        .into_iter()
        .enumerate()
        .map(|(index, m)| m.validate(index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// Load a chat log from disk.
pub async fn load_messages(path: impl AsRef<Path>) -> Result<Vec<ChatMessage>, PersistError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| PersistError::io(path, e))?;
    parse_messages(&content)
}

/// Pretty-print records as a JSON array with four-space indentation.
///
/// Non-ASCII characters are written as `\uXXXX` escapes, so the file is
/// plain ASCII.
pub fn render_records(records: &[OutputRecord]) -> Result<String, PersistError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8
    Ok(escape_non_ascii(&String::from_utf8_lossy(&buf)))
}

/// Replace every non-ASCII character with its UTF-16 `\u` escape(s).
///
/// Only valid on serialized JSON: outside string literals everything is
/// ASCII already.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Write records to `path`, replacing it only once the write has succeeded.
pub async fn save_records(
    path: impl AsRef<Path>,
    records: &[OutputRecord],
) -> Result<(), PersistError> {
    let path = path.as_ref();
    let content = render_records(records)?;
    let tmp = temp_path(path);

    if let Err(e) = fs::write(&tmp, content).await {
        return Err(PersistError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(PersistError::io(path, e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("npc_logs.json"));
    name.push(".tmp");
    path.with_file_name(name)
}
