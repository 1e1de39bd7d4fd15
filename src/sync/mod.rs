//! Getting mail files into the index.
//!
//! - **`parser`**: raw mail bytes to [`ParsedMessage`]
//! - **`references`**: message-id lists from References and In-Reply-To
//! - **`importer`**: batch indexing that skips bad files and keeps going
//! - **`stats`**: counts reported by a batch

pub mod importer;
pub mod parser;
pub mod references;
pub mod stats;

pub use importer::index_files;
pub use parser::{ParseMessageError, ParsedMessage, parse_message};
pub use references::parse_references;
pub use stats::ImportStats;
