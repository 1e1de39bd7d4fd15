use std::collections::HashSet;
use std::ops::Bound;
use std::path::Path;

use tantivy::collector::DocSetCollector;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, RangeQuery, TermQuery};
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, Term, Value,
};
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};

use super::document::Document;
use super::engine::{DocId, EngineQuery, IndexEngine, StoredDocument};
use crate::error::{DatabaseError, DatabaseResult};

const DOCID_FIELD: &str = "docid";

#[derive(Clone, Copy)]
pub struct Fields {
    pub docid: Field,
    pub term: Field,
    pub value_message_id: Field,
    pub value_thread: Field,
    pub value_date: Field,
    pub date: Field,
    pub data: Field,
}

impl Fields {
    fn values(&self) -> [Field; 3] {
        [self.value_message_id, self.value_thread, self.value_date]
    }
}

/// Tantivy-backed index with a single indexing thread.
///
/// Holding a `TantivyEngine` holds the on-disk writer lock; dropping it
/// releases the lock.
pub struct TantivyEngine {
    writer: IndexWriter,
    reader: IndexReader,
    fields: Fields,
    next_docid: DocId,
}

impl TantivyEngine {
    pub fn open_or_create(path: &Path, writer_memory_bytes: usize) -> DatabaseResult<Self> {
        std::fs::create_dir_all(path).map_err(|e| DatabaseError::io(path, e))?;

        let index = if path.join("meta.json").exists() {
            Index::open_in_dir(path).map_err(|e| DatabaseError::engine("open index", e))?
        } else {
            log::info!("creating index at {}", path.display());
            Index::create_in_dir(path, build_schema())
                .map_err(|e| DatabaseError::engine("create index", e))?
        };

        let fields = fields_from_schema(&index.schema())?;

        let writer: IndexWriter = index
            .writer_with_num_threads(1, writer_memory_bytes)
            .map_err(|e| DatabaseError::engine("acquire index writer", e))?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| DatabaseError::engine("open index reader", e))?;

        let next_docid = max_docid(&reader.searcher())? + 1;
        log::debug!(
            "opened index at {} ({} documents, next docid {})",
            path.display(),
            reader.searcher().num_docs(),
            next_docid
        );

        Ok(Self {
            writer,
            reader,
            fields,
            next_docid,
        })
    }

    fn to_tantivy(&self, doc_id: DocId, document: &Document) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_u64(self.fields.docid, doc_id);
        for term in document.terms() {
            doc.add_text(self.fields.term, term);
        }
        for (field, value) in self.fields.values().into_iter().zip(document.values()) {
            if let Some(value) = value {
                doc.add_text(field, value);
            }
        }
        doc.add_i64(self.fields.date, document.timestamp());
        doc.add_text(self.fields.data, document.data());
        doc
    }

    fn from_tantivy(&self, doc: &TantivyDocument) -> Document {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let terms = doc
            .get_all(self.fields.term)
            .filter_map(|v| v.as_str().map(str::to_string));
        let values = self.fields.values().map(text);
        let data = text(self.fields.data).unwrap_or_default();
        let timestamp = doc
            .get_first(self.fields.date)
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Document::from_parts(terms, values, data, timestamp)
    }

    fn to_query(&self, query: &EngineQuery) -> Box<dyn Query> {
        match query {
            EngineQuery::All => Box::new(AllQuery),
            EngineQuery::Term(term) => Box::new(TermQuery::new(
                Term::from_field_text(self.fields.term, term),
                IndexRecordOption::Basic,
            )),
            EngineQuery::DateRange { from, to } => {
                let bound = |b: &Bound<i64>| match b {
                    Bound::Included(v) => Bound::Included(Term::from_field_i64(self.fields.date, *v)),
                    Bound::Excluded(v) => Bound::Excluded(Term::from_field_i64(self.fields.date, *v)),
                    Bound::Unbounded => Bound::Unbounded,
                };
                Box::new(RangeQuery::new(bound(from), bound(to)))
            }
            EngineQuery::And(clauses) => {
                let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
                for clause in clauses {
                    match clause {
                        EngineQuery::Not(inner) => subqueries.push((Occur::MustNot, self.to_query(inner))),
                        other => subqueries.push((Occur::Must, self.to_query(other))),
                    }
                }
                // Tantivy matches nothing for a query made only of exclusions.
                if !subqueries.iter().any(|(occur, _)| *occur == Occur::Must) {
                    subqueries.push((Occur::Must, Box::new(AllQuery)));
                }
                Box::new(BooleanQuery::new(subqueries))
            }
            EngineQuery::Or(clauses) => Box::new(BooleanQuery::new(
                clauses
                    .iter()
                    .map(|clause| (Occur::Should, self.to_query(clause)))
                    .collect(),
            )),
            EngineQuery::Not(inner) => Box::new(BooleanQuery::new(vec![
                (Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
                (Occur::MustNot, self.to_query(inner)),
            ])),
        }
    }

    /// Matching addresses with their docids, sorted by docid.
    fn collect_sorted(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        operation: &'static str,
    ) -> DatabaseResult<Vec<(DocId, DocAddress)>> {
        let addresses: HashSet<DocAddress> = searcher
            .search(query, &DocSetCollector)
            .map_err(|e| DatabaseError::engine(operation, e))?;

        let mut hits = Vec::with_capacity(addresses.len());
        for address in addresses {
            let column = searcher
                .segment_reader(address.segment_ord)
                .fast_fields()
                .u64(DOCID_FIELD)
                .map_err(|e| DatabaseError::engine(operation, e))?;
            if let Some(doc_id) = column.first(address.doc_id) {
                hits.push((doc_id, address));
            }
        }
        hits.sort_unstable_by_key(|(doc_id, _)| *doc_id);
        Ok(hits)
    }

    fn load(&self, searcher: &Searcher, address: DocAddress) -> DatabaseResult<Document> {
        let doc: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| DatabaseError::engine("fetch document", e))?;
        Ok(self.from_tantivy(&doc))
    }
}

impl IndexEngine for TantivyEngine {
    fn store(&mut self, document: &Document) -> DatabaseResult<DocId> {
        let doc_id = self.next_docid;
        let doc = self.to_tantivy(doc_id, document);

        let committed = self
            .writer
            .add_document(doc)
            .and_then(|_| self.writer.commit());
        if let Err(err) = committed {
            log::error!("engine exception while storing document {}: {}", doc_id, err);
            if let Err(rollback) = self.writer.rollback() {
                log::error!("rollback after failed commit also failed: {}", rollback);
            }
            return Err(DatabaseError::engine("commit", err));
        }

        self.next_docid += 1;
        self.reader
            .reload()
            .map_err(|e| DatabaseError::engine("reload reader", e))?;
        Ok(doc_id)
    }

    fn lookup_by_term(&self, term: &str) -> DatabaseResult<Vec<DocId>> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.fields.term, term),
            IndexRecordOption::Basic,
        );
        let hits = self.collect_sorted(&searcher, &query, "term lookup")?;
        Ok(hits.into_iter().map(|(doc_id, _)| doc_id).collect())
    }

    fn fetch(&self, doc_id: DocId) -> DatabaseResult<Option<Document>> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_u64(self.fields.docid, doc_id),
            IndexRecordOption::Basic,
        );
        let hits = self.collect_sorted(&searcher, &query, "fetch document")?;
        match hits.first() {
            Some((_, address)) => Ok(Some(self.load(&searcher, *address)?)),
            None => Ok(None),
        }
    }

    fn search(&self, query: &EngineQuery) -> DatabaseResult<Vec<StoredDocument>> {
        let searcher = self.reader.searcher();
        let query = self.to_query(query);
        let hits = self.collect_sorted(&searcher, query.as_ref(), "search")?;
        hits.into_iter()
            .map(|(id, address)| {
                Ok(StoredDocument {
                    id,
                    document: self.load(&searcher, address)?,
                })
            })
            .collect()
    }

    fn document_count(&self) -> DatabaseResult<u64> {
        Ok(self.reader.searcher().num_docs())
    }
}

fn max_docid(searcher: &Searcher) -> DatabaseResult<DocId> {
    let mut max = 0;
    for segment in searcher.segment_readers() {
        if segment.num_docs() == 0 {
            continue;
        }
        let column = segment
            .fast_fields()
            .u64(DOCID_FIELD)
            .map_err(|e| DatabaseError::engine("read docids", e))?;
        max = max.max(column.max_value());
    }
    Ok(max)
}

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_u64_field(DOCID_FIELD, INDEXED | STORED | FAST);
    schema_builder.add_text_field("term", STRING | STORED);
    schema_builder.add_text_field("value_message_id", STORED);
    schema_builder.add_text_field("value_thread", STORED);
    schema_builder.add_text_field("value_date", STORED);
    schema_builder.add_i64_field("date", INDEXED | STORED | FAST);
    schema_builder.add_text_field("data", STORED);
    schema_builder.build()
}

pub fn fields_from_schema(schema: &Schema) -> DatabaseResult<Fields> {
    let get = |name: &str| {
        schema
            .get_field(name)
            .map_err(|_| DatabaseError::Schema(format!("schema missing {}", name)))
    };
    Ok(Fields {
        docid: get(DOCID_FIELD)?,
        term: get("term")?,
        value_message_id: get("value_message_id")?,
        value_thread: get("value_thread")?,
        value_date: get("value_date")?,
        date: get("date")?,
        data: get("data")?,
    })
}
