//! Mail database lifecycle and message ingestion.
//!
//! A database is a directory of mail with a `.notmuch` metadata directory at
//! its root; the full-text index lives in `.notmuch/xapian`. [`Database`]
//! owns the engine handle, and with it the on-disk writer lock, until it is
//! closed or dropped.
//!
//! ## Module Structure
//!
//! - `prefix`: field names, term prefixes and value slots
//! - `document`: the per-message document and how it is built
//! - `engine`: the capability surface the database needs from an index
//! - `tantivy`: the on-disk engine

pub mod document;
pub mod engine;
pub mod prefix;
pub mod tantivy;

use std::path::{Path, PathBuf};

use crate::config::DatabaseConfig;
use crate::error::{DatabaseError, DatabaseResult};
use crate::models::Message;
use crate::sync::parser::{ParsedMessage, parse_message};
use crate::threading::{ThreadIdGenerator, find_message_by_message_id, resolve_thread_ids};

use self::document::{Document, build_document};
use self::engine::{DocId, EngineQuery, IndexEngine, StoredDocument};
use self::tantivy::TantivyEngine;

/// Metadata directory created at the database root.
pub const METADATA_DIR: &str = ".notmuch";
/// Engine directory inside [`METADATA_DIR`].
pub const ENGINE_DIR: &str = "xapian";

/// An open mail database over engine `E`.
pub struct Database<E: IndexEngine = TantivyEngine> {
    path: PathBuf,
    engine: E,
    thread_ids: ThreadIdGenerator,
    config: DatabaseConfig,
}

impl Database<TantivyEngine> {
    /// Create the metadata directory under `path` and open the new database.
    ///
    /// Fails if `path` is not an existing directory or if the metadata
    /// directory already exists.
    pub fn create(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| DatabaseError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(DatabaseError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        let metadata_dir = path.join(METADATA_DIR);
        std::fs::create_dir(&metadata_dir).map_err(|source| DatabaseError::CreateMetadata {
            path: metadata_dir.clone(),
            source,
        })?;
        log::info!("created database metadata at {}", metadata_dir.display());

        Self::open(path)
    }

    /// Open the database rooted at `path`, creating its index if needed.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::for_path(path.as_ref()))
    }

    pub fn open_with_config(config: DatabaseConfig) -> DatabaseResult<Self> {
        let path = config.database_path.clone();
        let metadata_dir = path.join(METADATA_DIR);
        if !metadata_dir.is_dir() {
            return Err(DatabaseError::NotFound { path });
        }

        let engine = TantivyEngine::open_or_create(
            &metadata_dir.join(ENGINE_DIR),
            config.writer_memory_bytes,
        )
        .inspect_err(|e| log::error!("failed to open index under {}: {}", path.display(), e))?;
        log::info!("opened database at {}", path.display());

        Ok(Database::with_engine(config, engine))
    }
}

impl<E: IndexEngine> Database<E> {
    /// Wrap an already opened engine. No metadata directory is checked or
    /// created.
    pub fn with_engine(config: DatabaseConfig, engine: E) -> Self {
        Self {
            path: config.database_path.clone(),
            engine,
            thread_ids: ThreadIdGenerator::from_entropy(),
            config,
        }
    }

    /// Replace the random source used for new thread ids.
    pub fn with_thread_id_generator(mut self, generator: ThreadIdGenerator) -> Self {
        self.thread_ids = generator;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Index the mail file at `filename` and return its document id.
    ///
    /// The document is committed before this returns, so later messages can
    /// thread against it. The path is stored as the document payload and must
    /// be valid UTF-8.
    pub fn add_message(&mut self, filename: impl AsRef<Path>) -> DatabaseResult<DocId> {
        let filename = filename.as_ref();
        let Some(payload) = filename.to_str() else {
            return Err(DatabaseError::io(
                filename,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
            ));
        };
        let raw = std::fs::read(filename).map_err(|e| DatabaseError::io(filename, e))?;
        let message = parse_message(&raw).map_err(|source| DatabaseError::Parse {
            path: filename.to_path_buf(),
            source,
        })?;
        self.add_parsed_message(payload, &message)
    }

    /// Index an already parsed message stored at `filename`.
    pub fn add_parsed_message(
        &mut self,
        filename: &str,
        message: &ParsedMessage,
    ) -> DatabaseResult<DocId> {
        let thread_ids = resolve_thread_ids(
            &self.engine,
            &mut self.thread_ids,
            message.message_id.as_deref(),
            &message.parents,
        )?;
        let document = build_document(filename, message, &thread_ids)?;

        let doc_id = self
            .engine
            .store(&document)
            .inspect_err(|e| log::error!("failed to store {}: {}", filename, e))?;
        log::debug!(
            "added {} as document {} (message-id {}, {} thread ids)",
            filename,
            doc_id,
            message.message_id.as_deref().unwrap_or("none"),
            thread_ids.len()
        );
        Ok(doc_id)
    }

    pub fn fetch(&self, doc_id: DocId) -> DatabaseResult<Option<Document>> {
        self.engine.fetch(doc_id)
    }

    /// First message carrying `message_id`.
    pub fn find_message(&self, message_id: &str) -> DatabaseResult<Option<Message>> {
        let Some(doc_id) = find_message_by_message_id(&self.engine, message_id)? else {
            return Ok(None);
        };
        Ok(self
            .engine
            .fetch(doc_id)?
            .map(|document| Message::from_document(doc_id, &document)))
    }

    pub fn document_count(&self) -> DatabaseResult<u64> {
        self.engine.document_count()
    }

    pub(crate) fn query(&self, query: &EngineQuery) -> DatabaseResult<Vec<StoredDocument>> {
        self.engine.search(query)
    }

    /// Release the index and its writer lock.
    pub fn close(self) {
        log::info!("closing database at {}", self.path.display());
        drop(self.engine);
    }
}
