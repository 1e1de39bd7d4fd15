//! Query-string search over an open database.
//!
//! Matching messages are returned newest first unless asked otherwise, capped
//! at the configured search limit. Thread results group those messages by
//! their first thread id.

pub mod query;
pub mod types;

pub use query::parse_query;
pub use types::SortOrder;

use std::collections::HashMap;

use crate::database::Database;
use crate::database::engine::IndexEngine;
use crate::error::DatabaseResult;
use crate::models::{Message, ThreadSummary};

impl<E: IndexEngine> Database<E> {
    /// Messages matching `query`, sorted by timestamp.
    pub fn search(&self, query: &str, sort: SortOrder) -> DatabaseResult<Vec<Message>> {
        let parsed = parse_query(query)?;
        log::debug!("search `{}` -> {:?}", query, parsed);

        let mut messages: Vec<Message> = self.query(&parsed)?.into_iter().map(Message::from).collect();
        // Stable on equal timestamps, so insertion order breaks ties.
        match sort {
            SortOrder::NewestFirst => messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::OldestFirst => messages.sort_by_key(|m| m.timestamp),
        }

        let limit = self.config().search_limit;
        if messages.len() > limit {
            log::warn!("search `{}` matched {} messages, keeping {}", query, messages.len(), limit);
            messages.truncate(limit);
        }
        Ok(messages)
    }

    /// Matching messages grouped into threads.
    pub fn search_threads(&self, query: &str, sort: SortOrder) -> DatabaseResult<Vec<ThreadSummary>> {
        Ok(group_threads(self.search(query, sort)?))
    }
}

/// Group messages by first thread id, keeping the order groups are first seen.
///
/// Messages outside every thread are reported on their own with an empty
/// thread id.
pub fn group_threads(messages: Vec<Message>) -> Vec<ThreadSummary> {
    let mut threads: Vec<ThreadSummary> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let key = message.thread_id().map(str::to_string);
        let position = match key.as_ref().and_then(|k| positions.get(k)) {
            Some(&position) => position,
            None => {
                threads.push(ThreadSummary {
                    thread_id: key.clone().unwrap_or_default(),
                    oldest: message.timestamp,
                    newest: message.timestamp,
                    matched: 0,
                    authors: Vec::new(),
                    subject: String::new(),
                    messages: Vec::new(),
                });
                if let Some(key) = key {
                    positions.insert(key, threads.len() - 1);
                }
                threads.len() - 1
            }
        };

        let thread = &mut threads[position];
        thread.oldest = thread.oldest.min(message.timestamp);
        thread.newest = thread.newest.max(message.timestamp);
        thread.matched += 1;
        match message.senders() {
            Ok(senders) => {
                for author in senders {
                    if !thread.authors.contains(&author) {
                        thread.authors.push(author);
                    }
                }
            }
            Err(e) => log::warn!("cannot read senders of {}: {}", message.filename.display(), e),
        }
        thread.messages.push(message);
    }

    for thread in &mut threads {
        let oldest = thread.messages.iter().min_by_key(|m| m.timestamp);
        thread.subject = match oldest.map(|m| m.header("Subject")) {
            Some(Ok(subject)) => subject.unwrap_or_default(),
            Some(Err(e)) => {
                log::warn!("cannot read subject for thread {}: {}", thread.thread_id, e);
                String::new()
            }
            None => String::new(),
        };
    }

    threads
}
