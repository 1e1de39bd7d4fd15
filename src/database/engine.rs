//! Capability surface of the full-text engine.
//!
//! The database layer only ever needs to store a document, find the documents
//! carrying a term, fetch a document back and run a boolean query. Engine
//! failures are converted into [`DatabaseError::Engine`] by implementations,
//! so callers never see engine-specific error types.
//!
//! [`DatabaseError::Engine`]: crate::error::DatabaseError::Engine

use std::ops::Bound;

use super::document::Document;
use crate::error::DatabaseResult;

/// Engine-assigned document identifier. Increases with insertion order.
pub type DocId = u64;

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: DocId,
    pub document: Document,
}

/// Boolean query over terms and the numeric timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineQuery {
    All,
    Term(String),
    DateRange { from: Bound<i64>, to: Bound<i64> },
    And(Vec<EngineQuery>),
    Or(Vec<EngineQuery>),
    Not(Box<EngineQuery>),
}

pub trait IndexEngine {
    /// Add `document` and make it visible to subsequent reads.
    ///
    /// Either the whole document becomes visible or none of it does.
    fn store(&mut self, document: &Document) -> DatabaseResult<DocId>;

    /// Documents carrying `term`, in posting (insertion) order.
    fn lookup_by_term(&self, term: &str) -> DatabaseResult<Vec<DocId>>;

    fn fetch(&self, doc_id: DocId) -> DatabaseResult<Option<Document>>;

    /// Documents matching `query`, in insertion order.
    fn search(&self, query: &EngineQuery) -> DatabaseResult<Vec<StoredDocument>>;

    fn document_count(&self) -> DatabaseResult<u64>;
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory engine for exercising the database layer without disk I/O.

    use super::*;

    use crate::error::DatabaseError;

    #[derive(Debug, Default)]
    pub struct MemoryEngine {
        documents: Vec<Document>,
        /// Stores beyond this many documents fail like a broken commit.
        capacity: Option<usize>,
    }

    impl MemoryEngine {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_after(stores: usize) -> Self {
            Self {
                documents: Vec::new(),
                capacity: Some(stores),
            }
        }

        fn matches(document: &Document, query: &EngineQuery) -> bool {
            match query {
                EngineQuery::All => true,
                EngineQuery::Term(term) => document.has_term(term),
                EngineQuery::DateRange { from, to } => {
                    let ts = document.timestamp();
                    let above = match from {
                        Bound::Included(v) => ts >= *v,
                        Bound::Excluded(v) => ts > *v,
                        Bound::Unbounded => true,
                    };
                    let below = match to {
                        Bound::Included(v) => ts <= *v,
                        Bound::Excluded(v) => ts < *v,
                        Bound::Unbounded => true,
                    };
                    above && below
                }
                EngineQuery::And(clauses) => clauses.iter().all(|q| Self::matches(document, q)),
                EngineQuery::Or(clauses) => clauses.iter().any(|q| Self::matches(document, q)),
                EngineQuery::Not(inner) => !Self::matches(document, inner),
            }
        }
    }

    impl IndexEngine for MemoryEngine {
        fn store(&mut self, document: &Document) -> DatabaseResult<DocId> {
            if self.capacity.is_some_and(|cap| self.documents.len() >= cap) {
                return Err(DatabaseError::engine(
                    "commit",
                    ::tantivy::TantivyError::SystemError("commit refused".to_string()),
                ));
            }
            self.documents.push(document.clone());
            Ok(self.documents.len() as DocId)
        }

        fn lookup_by_term(&self, term: &str) -> DatabaseResult<Vec<DocId>> {
            Ok(self
                .documents
                .iter()
                .enumerate()
                .filter(|(_, doc)| doc.has_term(term))
                .map(|(i, _)| i as DocId + 1)
                .collect())
        }

        fn fetch(&self, doc_id: DocId) -> DatabaseResult<Option<Document>> {
            let index = (doc_id as usize).checked_sub(1);
            Ok(index.and_then(|i| self.documents.get(i)).cloned())
        }

        fn search(&self, query: &EngineQuery) -> DatabaseResult<Vec<StoredDocument>> {
            Ok(self
                .documents
                .iter()
                .enumerate()
                .filter(|(_, doc)| Self::matches(doc, query))
                .map(|(i, doc)| StoredDocument {
                    id: i as DocId + 1,
                    document: doc.clone(),
                })
                .collect())
        }

        fn document_count(&self) -> DatabaseResult<u64> {
            Ok(self.documents.len() as u64)
        }
    }
}
