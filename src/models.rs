use mailparse::{MailHeader, MailHeaderMap};
use serde::Serialize;
use std::path::PathBuf;

use crate::database::document::Document;
use crate::database::engine::{DocId, StoredDocument};
use crate::database::prefix::{ValueSlot, find_prefix};
use crate::error::{DatabaseError, DatabaseResult};
use crate::sync::parser::parse_addresses;

// ===== Messages =====

/// A committed message as seen by query callers.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub doc_id: DocId,
    pub filename: PathBuf,
    pub message_id: Option<String>,
    pub thread_ids: Vec<String>,
    pub timestamp: i64,
    pub labels: Vec<String>,
}

impl Message {
    pub fn from_document(doc_id: DocId, document: &Document) -> Self {
        Self {
            doc_id,
            filename: PathBuf::from(document.data()),
            message_id: document.value(ValueSlot::MessageId).map(str::to_string),
            thread_ids: document.thread_ids().into_vec(),
            timestamp: document.timestamp(),
            labels: document
                .terms_with_prefix(find_prefix("label"))
                .map(str::to_string)
                .collect(),
        }
    }

    /// First thread id, used for grouping.
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_ids.first().map(String::as_str)
    }

    fn with_headers<T>(&self, f: impl FnOnce(&[MailHeader<'_>]) -> T) -> DatabaseResult<T> {
        let raw = std::fs::read(&self.filename).map_err(|e| DatabaseError::io(&self.filename, e))?;
        let (headers, _) = mailparse::parse_headers(&raw).map_err(|e| DatabaseError::Parse {
            path: self.filename.clone(),
            source: e.into(),
        })?;
        Ok(f(&headers))
    }

    /// Look up a header by name, re-reading the message file.
    pub fn header(&self, name: &str) -> DatabaseResult<Option<String>> {
        self.with_headers(|headers| headers.get_first_value(name))
    }

    /// Sender addresses in From header order, re-reading the message file.
    pub fn senders(&self) -> DatabaseResult<Vec<String>> {
        self.with_headers(|headers| {
            headers
                .get_first_value("From")
                .map(|from| parse_addresses(&from))
                .unwrap_or_default()
                .into_iter()
                .map(|(_, email)| email)
                .collect()
        })
    }
}

impl From<StoredDocument> for Message {
    fn from(stored: StoredDocument) -> Self {
        Message::from_document(stored.id, &stored.document)
    }
}

// ===== Threads =====

/// Messages sharing a thread id within one search result.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub oldest: i64,
    pub newest: i64,
    /// Messages of the thread that matched the query.
    pub matched: usize,
    pub authors: Vec<String>,
    pub subject: String,
    pub messages: Vec<Message>,
}
