pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod search;
pub mod sync;
pub mod threading;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{DatabaseError, DatabaseResult, Status};
pub use models::{Message, ThreadSummary};
pub use search::SortOrder;

use env_logger::Env;
use std::sync::Once;

static LOGGER: Once = Once::new();

/// Install the stderr logger once per process. `RUST_LOG` overrides the
/// default filter.
pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info,tantivy=warn"))
            .format_timestamp(None)
            .init();
    });
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use crate::database::Database;
    use crate::threading::ThreadIdGenerator;

    /// A temporary mail root that removes itself on drop.
    pub struct TestMaildir {
        dir: TempDir,
    }

    impl TestMaildir {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().expect("failed to create temporary maildir"),
            }
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        /// Create the database with a seeded thread id generator.
        pub fn create_database(&self) -> Database {
            Database::create(self.root())
                .expect("failed to create test database")
                .with_thread_id_generator(ThreadIdGenerator::seeded(7))
        }

        pub fn open_database(&self) -> Database {
            Database::open(self.root()).expect("failed to open test database")
        }

        /// Write `contents` to `cur/<name>` and return its path.
        pub fn write(&self, name: &str, contents: &str) -> PathBuf {
            let dir = self.root().join("cur");
            std::fs::create_dir_all(&dir).expect("failed to create cur/");
            let path = dir.join(name);
            std::fs::write(&path, contents).expect("failed to write test message");
            path
        }

        /// A minimal message whose References lists `parents`.
        pub fn message(message_id: &str, parents: &[&str], subject: &str) -> String {
            TestMessage::new(message_id)
                .references(parents)
                .subject(subject)
                .render()
        }
    }

    impl Default for TestMaildir {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Builder for RFC 5322 test messages.
    #[derive(Debug, Clone)]
    pub struct TestMessage {
        message_id: Option<String>,
        references: Vec<String>,
        in_reply_to: Option<String>,
        from: String,
        to: String,
        date: String,
        subject: String,
        body: String,
    }

    impl TestMessage {
        pub fn new(message_id: &str) -> Self {
            Self {
                message_id: Some(format!("<{}>", message_id)),
                references: Vec::new(),
                in_reply_to: None,
                from: "Ann Example <ann@example.com>".to_string(),
                to: "Bob Example <bob@example.com>".to_string(),
                date: "Tue, 1 Jul 2003 10:52:37 +0200".to_string(),
                subject: "Test".to_string(),
                body: "Hello there.".to_string(),
            }
        }

        /// Use `value` verbatim as the Message-ID header.
        pub fn message_id_header(mut self, value: &str) -> Self {
            self.message_id = Some(value.to_string());
            self
        }

        pub fn without_message_id(mut self) -> Self {
            self.message_id = None;
            self
        }

        pub fn references(mut self, ids: &[&str]) -> Self {
            self.references = ids.iter().map(|id| id.to_string()).collect();
            self
        }

        pub fn in_reply_to(mut self, id: &str) -> Self {
            self.in_reply_to = Some(id.to_string());
            self
        }

        pub fn sender(mut self, from: &str) -> Self {
            self.from = from.to_string();
            self
        }

        pub fn recipient(mut self, to: &str) -> Self {
            self.to = to.to_string();
            self
        }

        pub fn date(mut self, date: &str) -> Self {
            self.date = date.to_string();
            self
        }

        pub fn subject(mut self, subject: &str) -> Self {
            self.subject = subject.to_string();
            self
        }

        pub fn body(mut self, body: &str) -> Self {
            self.body = body.to_string();
            self
        }

        pub fn render(&self) -> String {
            let mut out = String::new();
            out.push_str(&format!("From: {}\r\n", self.from));
            out.push_str(&format!("To: {}\r\n", self.to));
            out.push_str(&format!("Date: {}\r\n", self.date));
            out.push_str(&format!("Subject: {}\r\n", self.subject));
            if let Some(id) = &self.message_id {
                out.push_str(&format!("Message-ID: {}\r\n", id));
            }
            if !self.references.is_empty() {
                let refs: Vec<String> = self.references.iter().map(|r| format!("<{}>", r)).collect();
                out.push_str(&format!("References: {}\r\n", refs.join(" ")));
            }
            if let Some(id) = &self.in_reply_to {
                out.push_str(&format!("In-Reply-To: <{}>\r\n", id));
            }
            out.push_str("\r\n");
            out.push_str(&self.body);
            out.push_str("\r\n");
            out
        }
    }
}
