//! Thread identity for indexed messages.
//!
//! Threads have no record of their own. A thread is the set of documents
//! whose thread value mentions its id, so membership is decided once, when a
//! message is added, by looking at what is already in the index.
//!
//! ## Module Structure
//!
//! - `thread_id`: id format, the random source, and the ordered id set
//! - `resolver`: one-hop lookup of related documents and id merging

pub mod resolver;
pub mod thread_id;

pub use resolver::{find_message_by_message_id, find_messages_by_term, resolve_thread_ids};
pub use thread_id::{
    THREAD_ID_DIGITS, THREAD_ID_SEPARATOR, ThreadIdGenerator, ThreadIdSet, is_thread_id,
};
