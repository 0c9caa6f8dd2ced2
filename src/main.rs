use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use fxwatch::api::CalendarClient;
use fxwatch::app::App;
use fxwatch::config::{AppConfig, LogConfig, RendererKind, DEFAULT_CONFIG_PATH};
use fxwatch::events::spawn_keyboard_reader;
use fxwatch::ui::{PlainRenderer, Renderer, WidgetRenderer};

#[derive(Parser, Debug)]
#[command(name = "fxwatch")]
#[command(about = "Terminal dashboard for the daily economic calendar", long_about = None)]
struct Args {
    /// YAML config file; built-in defaults apply when it does not exist
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Refresh interval in seconds, overrides the config file
    #[arg(long)]
    refresh: Option<u64>,

    /// Drawing backend, overrides the config file
    #[arg(long, value_enum)]
    renderer: Option<RendererKind>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(refresh) = args.refresh {
        config.refresh_interval = refresh;
    }
    if let Some(renderer) = args.renderer {
        config.renderer = renderer;
    }
    config.validate()?;

    if let Err(e) = init_logging(&config.log) {
        eprintln!("Warning: failed to initialize logging: {e:#}");
    }
    info!(
        config = %args.config.display(),
        renderer = ?config.renderer,
        base_url = %config.source.base_url,
        "fxwatch starting"
    );

    let client = CalendarClient::new(config.source.base_url.clone(), config.source.timeout_secs)?;

    // Initialize terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let result = match execute!(io::stdout(), EnterAlternateScreen, cursor::Hide) {
        Ok(()) => run_dashboard(config, client).await,
        Err(e) => Err(e).context("failed to enter alternate screen"),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;

    result
}

async fn run_dashboard(config: AppConfig, client: CalendarClient) -> Result<()> {
    match config.renderer {
        RendererKind::Widget => {
            let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
            drive(App::new(config, client, WidgetRenderer::new(terminal))).await
        }
        RendererKind::Plain => drive(App::new(config, client, PlainRenderer::new(io::stdout()))).await,
    }
}

async fn drive<R: Renderer>(mut app: App<CalendarClient, R>) -> Result<()> {
    // Blocked in a read on exit; the process ends with main.
    let _keyboard = spawn_keyboard_reader(app.sender()).context("failed to start keyboard reader")?;
    app.run().await
}

fn init_logging(log: &LogConfig) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    std::fs::create_dir_all(&log.dir)
        .with_context(|| format!("failed to create log directory {}", log.dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log.file.as_str())
        .build(&log.dir)
        .context("failed to open log file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fxwatch=info")))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
