use std::env;
use std::path::PathBuf;

/// Smallest writer arena tantivy accepts for a single indexing thread.
pub const MIN_WRITER_MEMORY_BYTES: usize = 15_000_000;

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Runtime configuration for opening and querying a mail database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Root of the mail store; the index lives beneath it.
    pub database_path: PathBuf,
    pub writer_memory_bytes: usize,
    /// Upper bound on documents returned by a single search.
    pub search_limit: usize,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        let database_path = env_path("MAILINDEX_DATABASE_PATH").unwrap_or_else(|| {
            env_path("HOME")
                .map(|home| home.join("mail"))
                .unwrap_or_else(|| PathBuf::from("mail"))
        });

        Self {
            database_path,
            writer_memory_bytes: env_usize("MAILINDEX_WRITER_MEMORY_BYTES", 50_000_000)
                .max(MIN_WRITER_MEMORY_BYTES),
            search_limit: env_usize("MAILINDEX_SEARCH_LIMIT", 10_000).max(1),
        }
    }

    /// Configuration rooted at `path` with every other setting taken from the
    /// environment.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::from_env()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_path_overrides_database_path() {
        let config = DatabaseConfig::for_path("/srv/mail");
        assert_eq!(config.database_path, PathBuf::from("/srv/mail"));
        assert!(config.writer_memory_bytes >= MIN_WRITER_MEMORY_BYTES);
        assert!(config.search_limit >= 1);
    }
}
