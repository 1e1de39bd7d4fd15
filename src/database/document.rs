//! Index documents and their assembly from parsed mail.

use chrono::DateTime;
use std::collections::BTreeSet;

use super::prefix::{ValueSlot, make_term, words};
use crate::error::{DatabaseError, DatabaseResult};
use crate::sync::parser::ParsedMessage;
use crate::threading::{THREAD_ID_SEPARATOR, ThreadIdSet};

/// One persisted unit in the index: prefixed terms, three value slots and an
/// opaque payload (the source file path).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    terms: BTreeSet<String>,
    values: [Option<String>; 3],
    data: String,
    timestamp: i64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        terms: impl IntoIterator<Item = String>,
        values: [Option<String>; 3],
        data: String,
        timestamp: i64,
    ) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            values,
            data,
            timestamp,
        }
    }

    /// Add a prefixed term for `value` under field `name`.
    ///
    /// Terms over the length limit are silently dropped; returns whether the
    /// term was kept.
    pub fn add_term(&mut self, name: &str, value: &str) -> bool {
        match make_term(name, value) {
            Some(term) => {
                self.terms.insert(term);
                true
            }
            None => false,
        }
    }

    /// Add one term per word of a free-text field.
    pub fn add_words(&mut self, name: &str, text: &str) {
        for word in words(text) {
            self.add_term(name, &word);
        }
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Terms carrying `prefix`, with the prefix stripped.
    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.terms
            .range(prefix.to_string()..)
            .take_while(move |term| term.starts_with(prefix))
            .map(move |term| &term[prefix.len()..])
    }

    pub fn set_value(&mut self, slot: ValueSlot, value: impl Into<String>) {
        self.values[slot.index()] = Some(value.into());
    }

    pub fn value(&self, slot: ValueSlot) -> Option<&str> {
        self.values[slot.index()].as_deref()
    }

    pub fn values(&self) -> &[Option<String>; 3] {
        &self.values
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Raw timestamp kept alongside the sortable date value for range queries.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
        self.set_value(ValueSlot::Date, sortable_serialise(timestamp));
    }

    /// Thread ids stored in the thread value slot, in stored order.
    pub fn thread_ids(&self) -> ThreadIdSet {
        let mut ids = ThreadIdSet::new();
        if let Some(value) = self.value(ValueSlot::Thread) {
            ids.extend_from_value(value);
        }
        ids
    }
}

/// Encode a timestamp so that lexicographic order matches numeric order.
pub fn sortable_serialise(timestamp: i64) -> String {
    format!("{:016x}", (timestamp as u64) ^ (1 << 63))
}


/// Assemble the document for one message.
///
/// Pure: the result depends only on `message`, `filename` and the thread ids
/// resolved against the index beforehand.
pub fn build_document(
    filename: &str,
    message: &ParsedMessage,
    thread_ids: &ThreadIdSet,
) -> DatabaseResult<Document> {
    let mut doc = Document::new();
    doc.set_data(filename);
    doc.add_term("type", "mail");

    for parent in &message.parents {
        doc.add_term("ref", parent);
    }

    if let Some(message_id) = &message.message_id {
        doc.add_term("msgid", message_id);
        doc.set_value(ValueSlot::MessageId, message_id.as_str());
    }

    if !thread_ids.is_empty() {
        let mut value = String::new();
        value
            .try_reserve(thread_ids.joined_len())
            .map_err(|_| DatabaseError::OutOfMemory("thread value"))?;
        for (i, id) in thread_ids.iter().enumerate() {
            doc.add_term("thread", id);
            if i > 0 {
                value.push(THREAD_ID_SEPARATOR);
            }
            value.push_str(id);
        }
        doc.set_value(ValueSlot::Thread, value);
    }

    doc.set_timestamp(message.timestamp);
    if let Some(date) = DateTime::from_timestamp(message.timestamp, 0) {
        doc.add_term("date", &date.format("%Y-%m-%d").to_string());
    }

    doc.add_words("subject", &message.subject);
    doc.add_words("body", &message.body);

    for (name, email) in &message.from {
        doc.add_words("from_name", name);
        doc.add_words("name", name);
        doc.add_term("from_email", email);
        doc.add_term("email", email);
    }
    for (name, email) in &message.to {
        doc.add_words("to_name", name);
        doc.add_words("name", name);
        doc.add_term("to_email", email);
        doc.add_term("email", email);
    }

    for attachment in &message.attachments {
        doc.add_words("attachment", attachment);
        if let Some((_, extension)) = attachment.rsplit_once('.') {
            doc.add_term("attachment_extension", &extension.to_lowercase());
        }
    }

    Ok(doc)
}
