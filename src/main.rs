use std::io::{self, Write};
use std::path::PathBuf;

use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};

use mailindex::models::{Message, ThreadSummary};
use mailindex::sync::index_files;
use mailindex::{Database, DatabaseConfig, SortOrder, init_logger};

#[derive(Parser, Debug)]
#[command(name = "mailindex", about = "Index and search a directory of mail")]
struct Args {
    /// Mail root; defaults to MAILINDEX_DATABASE_PATH or ~/mail.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new database.
    Setup {
        /// Directory holding the mail; overrides --database.
        path: Option<PathBuf>,
    },
    /// Add mail files to the database.
    New {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Search the database.
    Search {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
        #[arg(long, value_enum, default_value_t = Output::Threads)]
        output: Output,
        /// Search terms; a leading `-` excludes a term.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Output {
    Messages,
    Threads,
}

fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn print_messages(out: &mut impl Write, messages: &[Message]) -> io::Result<()> {
    for message in messages {
        writeln!(
            out,
            "id:{} thread:{} {} {}",
            message.message_id.as_deref().unwrap_or(""),
            message.thread_id().unwrap_or(""),
            format_date(message.timestamp),
            message.filename.display()
        )?;
    }
    Ok(())
}

fn print_threads(out: &mut impl Write, threads: &[ThreadSummary]) -> io::Result<()> {
    for thread in threads {
        writeln!(
            out,
            "thread:{} {} [{}/{}] {}; {}",
            thread.thread_id,
            format_date(thread.newest),
            thread.matched,
            thread.messages.len(),
            thread.authors.join(", "),
            thread.subject
        )?;
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DatabaseConfig::from_env();
    if let Some(path) = args.database {
        config.database_path = path;
    }

    match args.command {
        Command::Setup { path } => {
            let path = path.unwrap_or(config.database_path);
            let db = Database::create(&path)?;
            writeln!(io::stdout(), "created database at {}", db.path().display())?;
            db.close();
        }
        Command::New { files } => {
            let mut db = Database::open_with_config(config)?;
            let stats = index_files(&mut db, &files)?;
            writeln!(
                io::stdout(),
                "added {} messages, skipped {} ({} unreadable, {} not mail)",
                stats.added,
                stats.failed(),
                stats.unreadable,
                stats.not_email
            )?;
            db.close();
        }
        Command::Search {
            format,
            sort,
            output,
            query,
        } => {
            let db = Database::open_with_config(config)?;
            let query = query.join(" ");
            let mut stdout = io::stdout().lock();
            match (output, format) {
                (Output::Messages, Format::Text) => print_messages(&mut stdout, &db.search(&query, sort)?)?,
                (Output::Messages, Format::Json) => {
                    serde_json::to_writer_pretty(&mut stdout, &db.search(&query, sort)?)?;
                    writeln!(stdout)?;
                }
                (Output::Threads, Format::Text) => {
                    print_threads(&mut stdout, &db.search_threads(&query, sort)?)?
                }
                (Output::Threads, Format::Json) => {
                    serde_json::to_writer_pretty(&mut stdout, &db.search_threads(&query, sort)?)?;
                    writeln!(stdout)?;
                }
            }
            db.close();
        }
    }
    Ok(())
}

fn main() {
    init_logger();
    let args = Args::parse();

    if let Err(e) = run(args) {
        let _ = writeln!(io::stderr(), "error: {}", e);
        std::process::exit(1);
    }
}
