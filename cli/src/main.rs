//! Inspect and edit a file-backed preference store from the shell.
//!
//! Runs the same `PreferenceStore` the browser uses, over `FileStorage`, so a
//! record exported from devtools can be checked or seeded by hand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use userpref::{FileStorage, PackageInfo, PreferenceStore, RecordStatus};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid package config: {0}")]
    Config(#[from] userpref::ConfigError),
    #[error(transparent)]
    Store(#[from] userpref::PrefError),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("record is not healthy: {0}")]
    Unhealthy(String),
}

#[derive(Parser, Debug)]
#[command(name = "userpref", about = "Inspect and edit a userpref preference store")]
struct Cli {
    /// Storage namespace (the host package name).
    #[arg(long, env = "USERPREF_NAMESPACE")]
    namespace: String,

    /// Schema version records are stamped with and validated against.
    #[arg(long, env = "USERPREF_SCHEMA_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    schema_version: String,

    /// JSON file holding the key-value storage.
    #[arg(long, env = "USERPREF_STORE", default_value = "userpref-store.json")]
    store: PathBuf,

    /// Log storage operations at debug level.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole stored record.
    Show,
    /// Print one preference value.
    Get {
        code: String,
        /// JSON printed when the preference is unset.
        #[arg(long, default_value = "null")]
        default: String,
    },
    /// Store a preference. VALUE is parsed as JSON, else kept as a string.
    Set { code: String, value: String },
    /// Create an empty record unless one exists.
    Init {
        #[arg(long, default_value_t = userpref::DEFAULT_USER_ID)]
        user_id: u64,
    },
    /// Overwrite the record with an empty one.
    Reset {
        #[arg(long, default_value_t = userpref::DEFAULT_USER_ID)]
        user_id: u64,
    },
    /// Delete the record.
    Remove,
    /// Check record structure and schema version; exits non-zero when unhealthy.
    Validate,
}

fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {e}");
        }
    }
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let package = PackageInfo::new(cli.namespace, &cli.schema_version)?;
    let store = PreferenceStore::new(FileStorage::new(cli.store), package);
    tracing::debug!(?store, "opened preference store");

    run(&store, cli.command)
}

fn run(store: &PreferenceStore<FileStorage>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Show => match store.read_record()? {
            Some(record) => print_json(&serde_json::to_value(record)?),
            None => {
                eprintln!("no record stored for {}", store.package().name());
                Ok(())
            }
        },
        Command::Get { code, default } => {
            let default = serde_json::from_str::<Value>(&default)?;
            print_json(&store.get_preference(&code, default))
        }
        Command::Set { code, value } => {
            store.set_preference(&code, parse_value(&value))?;
            Ok(())
        }
        Command::Init { user_id } => {
            if store.initialize_record(user_id)? {
                eprintln!("initialized record for user {user_id}");
            } else {
                eprintln!("record already exists");
            }
            Ok(())
        }
        Command::Reset { user_id } => {
            store.reset_record(user_id)?;
            eprintln!("reset record for user {user_id}");
            Ok(())
        }
        Command::Remove => {
            store.remove_record()?;
            Ok(())
        }
        Command::Validate => match store.check_record() {
            RecordStatus::Healthy => {
                println!("ok");
                Ok(())
            }
            RecordStatus::Stale { found, current } => Err(CliError::Unhealthy(format!(
                "schema version {found} is older than {current}"
            ))),
            RecordStatus::Malformed(reason) => Err(CliError::Unhealthy(reason)),
            RecordStatus::Missing => Err(CliError::Unhealthy("no record stored".to_owned())),
            RecordStatus::Unavailable => Err(CliError::Unhealthy("storage is unavailable".to_owned())),
        },
    }
}

/// JSON when it parses, otherwise the literal text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
