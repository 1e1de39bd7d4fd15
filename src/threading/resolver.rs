//! Thread identity resolution against committed documents.
//!
//! A new message joins every thread reachable through one hop in the index:
//!
//! 1. documents that list this message's id as a `ref` (its children)
//! 2. the document holding each parent's `msgid`
//!
//! The thread ids of all those documents are merged, first-seen order kept.
//! When nothing is found a fresh id is minted, but only if the message has a
//! message-id; a message with neither stays outside every thread.
//!
//! Only committed documents are visible, so the outcome depends on insertion
//! order, and documents already committed are never revisited when a later
//! message bridges two threads.

use super::thread_id::{ThreadIdGenerator, ThreadIdSet};
use crate::database::engine::{DocId, IndexEngine};
use crate::database::prefix::{ValueSlot, make_term};
use crate::error::DatabaseResult;

/// First document whose `msgid` term equals `message_id`, in posting order.
pub fn find_message_by_message_id<E: IndexEngine + ?Sized>(
    engine: &E,
    message_id: &str,
) -> DatabaseResult<Option<DocId>> {
    find_messages_by_term(engine, "msgid", message_id).map(|ids| ids.into_iter().next())
}

/// Documents whose `name` term equals `value`, in posting order.
pub fn find_messages_by_term<E: IndexEngine + ?Sized>(
    engine: &E,
    name: &str,
    value: &str,
) -> DatabaseResult<Vec<DocId>> {
    match make_term(name, value) {
        Some(term) => engine.lookup_by_term(&term),
        // Such a term could never have been stored.
        None => Ok(Vec::new()),
    }
}

fn insert_thread_ids<E: IndexEngine + ?Sized>(
    engine: &E,
    doc_id: DocId,
    thread_ids: &mut ThreadIdSet,
) -> DatabaseResult<()> {
    if let Some(doc) = engine.fetch(doc_id)? {
        if let Some(value) = doc.value(ValueSlot::Thread) {
            thread_ids.extend_from_value(value);
        }
    }
    Ok(())
}

/// Compute the thread ids a message with `message_id` and `parents` joins.
pub fn resolve_thread_ids<E: IndexEngine + ?Sized>(
    engine: &E,
    generator: &mut ThreadIdGenerator,
    message_id: Option<&str>,
    parents: &[String],
) -> DatabaseResult<ThreadIdSet> {
    let mut thread_ids = ThreadIdSet::new();

    if let Some(message_id) = message_id {
        for child in find_messages_by_term(engine, "ref", message_id)? {
            insert_thread_ids(engine, child, &mut thread_ids)?;
        }
    }

    for parent in parents {
        if let Some(doc_id) = find_message_by_message_id(engine, parent)? {
            insert_thread_ids(engine, doc_id, &mut thread_ids)?;
        }
    }

    if thread_ids.is_empty() {
        if let Some(message_id) = message_id {
            let fresh = generator.generate();
            log::debug!("message {} starts new thread {}", message_id, fresh);
            thread_ids.insert(fresh);
        }
    } else if thread_ids.len() > 1 {
        log::debug!(
            "message {} joins {} threads",
            message_id.unwrap_or("(no message-id)"),
            thread_ids.len()
        );
    }

    Ok(thread_ids)
}
