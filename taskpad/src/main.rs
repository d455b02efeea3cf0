//! `Taskpad`: offline-first task list on the command line.
//!
//! Every task command loads first, so changes queued while offline are
//! replayed as soon as the server is reachable again. Configuration via CLI
//! flags, environment variables, or config file
//! (`~/.config/taskpad/config.toml`).
//!
//! ```bash
//! # Against a local server
//! cargo run --bin taskpad -- --server http://127.0.0.1:9400/ sign-in \
//!     --email ann@example.com --password secret1
//! cargo run --bin taskpad -- add "Buy milk" --date 2024-01-01
//!
//! # Queue changes without touching the network
//! cargo run --bin taskpad -- --offline complete 1717171717171
//! ```

use std::path::Path;
use std::process::ExitCode;

use chrono::{SecondsFormat, Utc};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskpad::auth::{AuthError, AuthService};
use taskpad::config::{CliArgs, ClientConfig, Command, ConfigError};
use taskpad::connectivity::{AnyConnectivity, ManualConnectivity, ProbeConnectivity, ProbeError};
use taskpad::remote::{HttpBackend, RemoteError};
use taskpad::session::{FileSecureStore, SessionStore};
use taskpad::storage::FileStorage;
use taskpad::tasks::{SyncError, TaskBoard, TaskSync};
use taskpad_proto::{NewTask, PendingOperation, Task, TaskId, TaskPatch, TaskStatus};

type Engine = TaskSync<FileStorage, HttpBackend, AnyConnectivity, FileSecureStore>;
type Auth = AuthService<HttpBackend, FileStorage, FileSecureStore, AnyConnectivity>;

/// Anything that ends a CLI run with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot probe server: {0}")]
    Probe(#[from] ProbeError),
    #[error("cannot reach server: {0}")]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("no task with id {0}")]
    UnknownTask(TaskId),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file so command output stays clean.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let command = cli.command.unwrap_or(Command::List { status: None });
    tracing::info!(offline = config.offline, server = %config.server_url, "taskpad starting");

    match run(&config, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Set up file-based tracing.
///
/// Returns a guard that must be held for the lifetime of the program to
/// ensure buffered log lines are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskpad.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn connectivity(config: &ClientConfig) -> Result<AnyConnectivity, ProbeError> {
    if config.offline {
        return Ok(AnyConnectivity::Manual(ManualConnectivity::offline()));
    }
    let probe = ProbeConnectivity::new(&config.server_url, config.probe_timeout)?;
    Ok(AnyConnectivity::Probe(probe))
}

async fn run(config: &ClientConfig, command: Command) -> Result<(), CliError> {
    let backend = HttpBackend::new(config.server_url.clone(), config.request_timeout)?;
    let storage = FileStorage::new(config.data_dir.clone());
    let net = connectivity(config)?;
    let session = || SessionStore::new(FileSecureStore::new(config.session_path()));

    let auth: Auth = AuthService::new(backend.clone(), storage.clone(), session(), net.clone());
    let sync: Engine =
        TaskSync::new(storage, backend, net, session()).with_policy(config.queue_policy);

    match command {
        Command::SignUp {
            name,
            email,
            password,
        } => {
            let profile = auth.sign_up(&name, &email, &password).await?;
            println!("Account created for {}. Sign in to continue.", profile.email);
        }
        Command::SignIn { email, password } => {
            let profile = auth.sign_in(&email, &password).await?;
            println!("Signed in as {} <{}>", profile.full_name, profile.email);
        }
        Command::SignOut => {
            auth.sign_out().await;
            println!("Signed out.");
        }
        Command::Whoami => match auth.restore_user().await {
            Some(profile) => println!("{} <{}> ({})", profile.full_name, profile.email, profile.uid),
            None => println!("Not signed in."),
        },
        Command::List { status } => {
            let board = open_board(&sync).await?;
            let shown: Vec<&Task> = match status.as_deref() {
                Some(status) => board.with_status(status).collect(),
                None => board.tasks().iter().collect(),
            };
            print_tasks(&shown);
        }
        Command::Add {
            title,
            description,
            date,
            status,
        } => {
            let mut board = open_board(&sync).await?;
            let draft = NewTask {
                title,
                description,
                date: date.unwrap_or_else(now_iso),
                status: status.map(TaskStatus::new),
            };
            let task = board.add(&sync, draft).await?;
            println!("Added {}", task.id);
        }
        Command::Edit {
            id,
            title,
            description,
            date,
            status,
        } => {
            let mut board = open_board(&sync).await?;
            let id = TaskId::new(id);
            let patch = TaskPatch {
                title,
                description,
                date,
                status: status.map(TaskStatus::new),
            };
            board
                .edit(&sync, &id, patch)
                .await?
                .ok_or_else(|| CliError::UnknownTask(id.clone()))?;
            println!("Updated.");
        }
        Command::Complete { id } => {
            let mut board = open_board(&sync).await?;
            let id = TaskId::new(id);
            board
                .complete(&sync, &id)
                .await?
                .ok_or_else(|| CliError::UnknownTask(id.clone()))?;
            println!("Completed.");
        }
        Command::Delete { id } => {
            let mut board = open_board(&sync).await?;
            board.delete(&sync, &TaskId::new(id)).await?;
            println!("Deleted.");
        }
        Command::Sync => {
            let tasks = sync.load().await?;
            println!("{} tasks.", tasks.len());
        }
        Command::Push => {
            let count = sync.push_snapshot().await?;
            println!("Uploaded {count} tasks.");
        }
        Command::Pending => {
            let queue = sync.pending().await?;
            if queue.is_empty() {
                println!("Nothing queued.");
            }
            for op in &queue {
                print_pending(op);
            }
        }
    }
    Ok(())
}

/// Load the board, falling back to the local snapshot if the load fails.
async fn open_board(sync: &Engine) -> Result<TaskBoard, CliError> {
    let (board, synced) = TaskBoard::open(sync).await?;
    if !synced {
        eprintln!("Warning: could not sync, showing local tasks.");
    }
    Ok(board)
}

fn print_tasks(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        println!(
            "{:<14} {:<12} {:<24} {}",
            task.id.as_str(),
            task.status.as_str(),
            task.date,
            task.title
        );
    }
}

fn print_pending(op: &PendingOperation) {
    match op {
        PendingOperation::Add { task } | PendingOperation::Update { task } => {
            println!("{:<7} {:<14} {}", op.kind(), task.id.as_str(), task.title);
        }
        PendingOperation::Delete { id } => println!("{:<7} {}", op.kind(), id.as_str()),
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
