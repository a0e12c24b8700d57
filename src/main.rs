use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use inbox_triage::adapters::imap;
use inbox_triage::adapters::sqlite::{accounts, emails, pool, schema, DbPool};
use inbox_triage::config::{self, AppConfig};
use inbox_triage::error::TriageError;
use inbox_triage::services::ingest;

#[derive(Parser)]
#[command(name = "inbox-triage", about = "IMAP inbox triage backend", version)]
struct Cli {
    /// Path to a config file; defaults are searched when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify credentials against the IMAP server and store the account
    AddAccount {
        email: String,
        password: String,
        #[arg(long, default_value = "imap.gmail.com")]
        imap_host: String,
        #[arg(long, default_value = "smtp.gmail.com")]
        smtp_host: String,
    },
    /// List stored accounts (passwords are never shown)
    ListAccounts,
    /// Fetch and classify unseen messages for a stored account
    Process {
        account_id: i64,
        /// Batch size; clamped to the configured ceiling
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List processed emails, optionally filtered
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_priority: Option<i64>,
    },
    /// Show aggregate counts over the processed emails
    Stats,
}

fn init_tracing() {
    let default_filter = if cfg!(debug_assertions) {
        "inbox_triage=debug,info"
    } else {
        "inbox_triage=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn open_database(cfg: &AppConfig) -> Result<DbPool, TriageError> {
    let pool = pool::create_pool(&cfg.database_path)?;
    schema::initialize_schema(&*pool.get()?)?;
    Ok(pool)
}

async fn run(cli: Cli) -> Result<(), TriageError> {
    let cfg = match &cli.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    let db = open_database(&cfg)?;

    match cli.command {
        Command::AddAccount {
            email,
            password,
            imap_host,
            smtp_host,
        } => {
            let timeout = Duration::from_secs(cfg.processing.imap_timeout_seconds);
            let session =
                imap::connect(&imap_host, imap::IMAPS_PORT, &email, &password, timeout).await?;
            session.logout().await;

            let id = accounts::add_account(&db, &email, &password, &imap_host, &smtp_host)?;
            println!("Account {} added with id {}", email, id);
        }
        Command::ListAccounts => {
            let listing = accounts::list_accounts(&db)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Process { account_id, limit } => {
            let account = accounts::get_account(&db, account_id)?;
            let outcome = ingest::process_account(&db, &cfg.processing, &account, limit).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::List {
            category,
            min_priority,
        } => {
            let listing = emails::list_emails(&db, category.as_deref(), min_priority)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Stats => {
            let stats = emails::dashboard_stats(&db)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
