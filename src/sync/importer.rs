use std::path::Path;

use super::stats::ImportStats;
use crate::database::Database;
use crate::database::engine::IndexEngine;
use crate::error::{DatabaseError, DatabaseResult};

/// Index `paths` in order, skipping files that fail on their own.
///
/// Unreadable and unparseable files are logged and counted; engine failures
/// abort the batch since every later message would fail the same way.
pub fn index_files<E: IndexEngine, P: AsRef<Path>>(
    db: &mut Database<E>,
    paths: impl IntoIterator<Item = P>,
) -> DatabaseResult<ImportStats> {
    let mut stats = ImportStats::default();

    for path in paths {
        let path = path.as_ref();
        match db.add_message(path) {
            Ok(doc_id) => {
                log::debug!("indexed {} as {}", path.display(), doc_id);
                stats.added += 1;
            }
            Err(e) if e.is_per_message() => {
                log::warn!("skipping {}: {}", path.display(), e);
                match e {
                    DatabaseError::Parse { .. } => stats.not_email += 1,
                    _ => stats.unreadable += 1,
                }
                stats.skipped.push(path.to_path_buf());
            }
            Err(e) => {
                log::error!("aborting import at {}: {}", path.display(), e);
                return Err(e);
            }
        }
    }

    log::info!(
        "indexed {} messages ({} skipped)",
        stats.added,
        stats.failed()
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::engine::memory::MemoryEngine;
    use crate::error::Status;
    use crate::test_support::TestMaildir;

    #[test]
    fn continues_past_unreadable_files() {
        let maildir = TestMaildir::new();
        let mut db = maildir.create_database();
        let a = maildir.write("a", &TestMaildir::message("a@test", &[], "One"));
        let missing = maildir.root().join("missing");
        let b = maildir.write("b", &TestMaildir::message("b@test", &[], "Two"));

        let stats = index_files(&mut db, [&a, &missing, &b]).unwrap();
        assert_eq!(stats.added, 2);
        assert_eq!(stats.unreadable, 1);
        assert_eq!(stats.skipped, vec![missing]);
        assert_eq!(db.document_count().unwrap(), 2);
    }

    #[test]
    fn engine_failure_aborts_batch() {
        let maildir = TestMaildir::new();
        let mut db = Database::with_engine(
            DatabaseConfig::for_path(maildir.root()),
            MemoryEngine::failing_after(1),
        );
        let files: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| maildir.write(name, &TestMaildir::message(&format!("{name}@test"), &[], name)))
            .collect();

        let err = index_files(&mut db, &files).err().unwrap();
        assert_eq!(err.status(), Status::EngineException);
        assert_eq!(db.document_count().unwrap(), 1);
        assert!(db.find_message("c@test").unwrap().is_none());
    }

    #[test]
    fn merge_sums_counts() {
        let mut total = ImportStats {
            added: 1,
            ..Default::default()
        };
        total.merge(ImportStats {
            added: 2,
            not_email: 1,
            skipped: vec!["x".into()],
            ..Default::default()
        });
        assert_eq!(total.added, 3);
        assert_eq!(total.failed(), 1);
        assert_eq!(total.skipped.len(), 1);
    }
}
