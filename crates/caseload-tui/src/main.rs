//! Caseload - a terminal dashboard for special-education caseloads.
//!
//! Tracks students with disabilities and the teachers they are assigned to.
//! All records are kept per user id under the local data directory.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use caseload_core::{Config, UserId};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Environment variable naming the user to sign in as
const USER_ENV_VAR: &str = "CASELOAD_USER";

const LOG_FILE_NAME: &str = "caseload.log";

const USAGE: &str = "\
Usage: caseload [OPTIONS]

Options:
  -u, --user <ID>        Sign in as this user id
  -d, --data-dir <PATH>  Store records under PATH
  -h, --help             Print this help";

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    user: Option<String>,
    data_dir: Option<PathBuf>,
    help: bool,
}

impl Args {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "-u" | "--user" => match args.next() {
                    Some(user) => parsed.user = Some(user),
                    None => bail!("{} requires a value", arg),
                },
                "-d" | "--data-dir" => match args.next() {
                    Some(dir) => parsed.data_dir = Some(PathBuf::from(dir)),
                    None => bail!("{} requires a value", arg),
                },
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(parsed)
    }
}

/// Pick the user to sign in as: command line, then environment, then last session.
fn resolve_user(args: &Args, env_user: Option<String>, config: &Config) -> Option<UserId> {
    args.user
        .clone()
        .or(env_user)
        .or_else(|| config.last_user_id.clone())
        .map(|user| user.trim().to_string())
        .filter(|user| !user.is_empty())
        .map(UserId::new)
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file since the terminal is owned by the UI. The returned guard
/// must stay alive for buffered lines to be flushed.
fn init_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let (mut config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if let Some(ref dir) = args.data_dir {
        config.data_dir = Some(dir.clone());
    }

    let _guard = init_tracing(&config)?;
    info!("Caseload starting");
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let user = resolve_user(&args, std::env::var(USER_ENV_VAR).ok(), &config);
    let mut app = App::new(config)?;
    match user {
        Some(user) => app.sign_in(user),
        None => app.start_sign_in(),
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        warn!(error = %e, "Main loop failed");
        eprintln!("Error: {}", e);
    }

    info!("Caseload shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
