//! `boardctrl` command line controller
//!
//! Signs in to the signage backend, lists boards and slides, and runs slide
//! rotations on a local display sink.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use anyhow::{Context, bail};
use async_trait::async_trait;
use boardctrl_client::{ApiClient, ClientError, CredentialStore, FileCredentialStore};
use boardctrl_core::utils::format_minutes;
use boardctrl_core::{BoardId, init_logging};
use boardctrl_rotation::{
    BoardCtrlConfig, LoginRedirect, NotificationCenter, NotificationEvent, Presenter,
    RotationError, RotationHandle, SessionEnd, SinkKind, build_sink,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Command line interface for the boardctrl signage controller
#[derive(Parser)]
#[command(
    name = "boardctrl",
    version = env!("CARGO_PKG_VERSION"),
    about = "Digital signage controller",
    long_about = "Signs in to the signage backend, lists boards and slides, and rotates a board's active slides on a display surface."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Password
        #[arg(short, long, env = "BOARDCTRL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session token
    Logout,

    /// List active categories with their boards
    Boards {
        /// Category page
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// List the slides of a board
    Slides {
        /// Board identifier
        #[arg(value_name = "BOARD")]
        board: BoardId,
    },

    /// Rotate a board's active slides until interrupted
    Present {
        /// Board identifier
        #[arg(value_name = "BOARD")]
        board: BoardId,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Open a single URL on the display
    Preview {
        /// URL to show
        #[arg(value_name = "URL")]
        url: String,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Validate configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Display sink overrides
#[derive(clap::Args)]
struct DisplayArgs {
    /// Display sink (log, file)
    #[arg(long, value_parser = parse_sink)]
    sink: Option<SinkKind>,

    /// Output file for the file sink
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn parse_sink(value: &str) -> Result<SinkKind, String> {
    match value {
        "log" => Ok(SinkKind::Log),
        "file" => Ok(SinkKind::File),
        other => Err(format!("unknown sink '{other}', expected 'log' or 'file'")),
    }
}

/// Prints the sign-in instruction once the session expired
struct CliRedirect;

#[async_trait]
impl LoginRedirect for CliRedirect {
    async fn redirect_to_login(&self) {
        println!("Sign in again with `boardctrl login --user <USER>`");
    }
}

/// Main entry point for the boardctrl CLI
///
/// # Errors
///
/// Returns error if configuration, the backend, or the display fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {e}");
    }

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).await?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    init_logging(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "boardctrl starting");

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::new(&config.session.credentials_file));
    let client = Arc::new(ApiClient::new(&config.api, Arc::clone(&credentials))?);

    match cli.command {
        Commands::Login { user, password } => {
            let session = client
                .login(&user, &password)
                .await
                .context("Sign-in failed")?;
            println!("Signed in as {}", session.user_name);
            Ok(())
        }
        Commands::Logout => {
            client.logout().await?;
            println!("Signed out");
            Ok(())
        }
        Commands::Boards { page } => list_boards(&client, page).await,
        Commands::Slides { board } => list_slides(&client, board).await,
        Commands::Present { board, display } => {
            apply_display_args(&mut config, display);
            let presenter = build_presenter(&config, client, credentials)?;
            present(&presenter, board).await
        }
        Commands::Preview { url, display } => {
            apply_display_args(&mut config, display);
            let presenter = build_presenter(&config, client, credentials)?;
            let mut events = presenter.notifications().subscribe();
            let result = presenter.preview(&url).await;
            print_pending(&mut events);
            let surface = result?;
            println!("Showing {}", surface.current());
            Ok(())
        }
        Commands::Config { show } => {
            if show {
                println!("{}", config.to_toml()?);
            } else {
                println!("Configuration is valid");
            }
            Ok(())
        }
    }
}

/// Load configuration from file or environment
async fn load_config(path: Option<&Path>) -> boardctrl_rotation::Result<BoardCtrlConfig> {
    match path {
        Some(path) => BoardCtrlConfig::from_toml_file(path).await,
        None => BoardCtrlConfig::load(),
    }
}

fn apply_display_args(config: &mut BoardCtrlConfig, args: DisplayArgs) {
    if let Some(sink) = args.sink {
        config.display.sink = sink;
    }
    if let Some(output) = args.output {
        config.display.output_file = Some(output);
    }
}

fn build_presenter(
    config: &BoardCtrlConfig,
    client: Arc<ApiClient>,
    credentials: Arc<dyn CredentialStore>,
) -> anyhow::Result<Presenter> {
    let sink = build_sink(&config.display)?;
    Ok(Presenter::new(
        config.rotation.clone(),
        client,
        credentials,
        sink,
        NotificationCenter::new(&config.notifications),
        Arc::new(CliRedirect),
    ))
}

fn not_signed_in(error: ClientError) -> anyhow::Error {
    if error.is_auth() {
        anyhow::anyhow!("Not signed in or session expired, run `boardctrl login` first")
    } else {
        error.into()
    }
}

async fn list_boards(client: &ApiClient, page: u32) -> anyhow::Result<()> {
    let categories = client.list_categories(page).await.map_err(not_signed_in)?;
    println!("Categories page {page} of {}", categories.total_pages);

    for category in categories.items.iter().filter(|c| c.active) {
        println!("{} [{}]", category.title, category.id);

        let boards = client
            .list_boards(category.id, 1)
            .await
            .map_err(not_signed_in)?;
        if boards.items.is_empty() {
            println!("  (no boards)");
        }
        for board in &boards.items {
            let status = if board.active { "active" } else { "inactive" };
            println!("  {:>6}  {:<8}  {}", board.id, status, board.title);
        }
    }
    Ok(())
}

async fn list_slides(client: &ApiClient, board: BoardId) -> anyhow::Result<()> {
    let slides = client.list_slides(board).await.map_err(not_signed_in)?;
    if slides.is_empty() {
        println!("No slides available for this board");
        return Ok(());
    }

    for slide in &slides {
        let status = if slide.active { "active" } else { "inactive" };
        println!(
            "{:>6}  {:<8}  {:>10}  {}  {}",
            slide.id,
            status,
            format_minutes(slide.duration_minutes),
            slide.title,
            slide.target
        );
    }
    Ok(())
}

async fn present(presenter: &Presenter, board: BoardId) -> anyhow::Result<()> {
    let mut events = presenter.notifications().subscribe();

    let outcome = match presenter.present(board).await {
        Ok(outcome) => outcome,
        Err(RotationError::AuthExpired) => {
            print_pending(&mut events);
            presenter.await_redirect().await;
            return Err(RotationError::AuthExpired.into());
        }
        Err(e) => {
            print_pending(&mut events);
            return Err(e.into());
        }
    };

    let Some(handle) = outcome.into_handle() else {
        print_pending(&mut events);
        return Ok(());
    };

    println!("Presenting board {board}, press Ctrl+C to stop");
    run_until_interrupted(handle, &mut events).await
}

/// Print notifications while the rotation runs, stop it on Ctrl+C
async fn run_until_interrupted(
    handle: RotationHandle,
    events: &mut broadcast::Receiver<NotificationEvent>,
) -> anyhow::Result<()> {
    let mut state = handle.subscribe();

    let interrupted = loop {
        tokio::select! {
            _ = signal::ctrl_c() => break true,
            event = events.recv() => {
                if let Ok(NotificationEvent::Shown(notification)) = event {
                    println!("[{}] {}", notification.kind, notification.message);
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break false;
                }
                let current = state.borrow_and_update().clone();
                println!("Showing slide {} ({})", current.slide_id, current.target);
            }
        }
    };

    let summary = if interrupted {
        info!("Received Ctrl+C, stopping rotation");
        handle.stop().await?
    } else {
        handle.wait().await?
    };
    print_pending(events);

    match summary.end {
        SessionEnd::Stopped | SessionEnd::SurfaceClosed => {
            println!(
                "Rotation ended after {} transitions ({} failed)",
                summary.navigations, summary.failures
            );
            Ok(())
        }
        SessionEnd::Aborted { reason } => bail!("Rotation aborted: {reason}"),
    }
}

fn print_pending(events: &mut broadcast::Receiver<NotificationEvent>) {
    while let Ok(event) = events.try_recv() {
        if let NotificationEvent::Shown(notification) = event {
            println!("[{}] {}", notification.kind, notification.message);
        }
    }
}
