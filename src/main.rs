mod app;
mod backend;
mod config;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{App, GENERATION_ERROR_MESSAGE};
use backend::BackendClient;
use config::{AppConfig, BACKEND_URL_ENV};
use theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "sentence-sim")]
#[command(version = "0.1.0")]
#[command(about = "Generate Shakespearean sentences from a seed word")]
struct Args {
    /// Base address of the generation backend
    #[arg(short, long, value_name = "URL")]
    backend_url: Option<String>,

    /// Seed word to start with
    #[arg(long, value_name = "WORD")]
    seed: Option<String>,

    /// Generate one sentence, print it and exit
    #[arg(short, long)]
    once: bool,

    /// Output backend health as JSON
    #[arg(short, long)]
    status: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let interactive = !(args.once || args.status);

    init_logging(interactive);

    let config = AppConfig::load().unwrap_or_default();
    let env_url = std::env::var(BACKEND_URL_ENV).ok();
    let backend_url = config.resolve_backend_url(args.backend_url.as_deref(), env_url.as_deref());
    let seed_word = config.resolve_seed_word(args.seed.as_deref());

    tracing::info!(backend = %backend_url, "Using backend");
    let client = BackendClient::new(backend_url);

    if args.status {
        return print_status(&client).await;
    }

    let app = App::new(client, seed_word);

    if args.once {
        return generate_once(app).await;
    }

    ui::init_theme(Theme::load(config.theme_file.as_deref()));
    run_tui(app).await
}

/// Set up tracing. The TUI owns the terminal, so it logs to a file instead.
fn init_logging(interactive: bool) {
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if !interactive {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return;
    }

    match open_log_file() {
        Ok(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
            .init(),
        Err(_) => registry.init(),
    }
}

fn open_log_file() -> Result<fs::File> {
    let dir = dirs::cache_dir()
        .context("Could not find cache directory")?
        .join("sentence-sim");
    fs::create_dir_all(&dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("sentence-sim.log"))?;
    Ok(file)
}

async fn print_status(client: &BackendClient) -> Result<()> {
    let output = match client.health().await {
        Ok(health) => serde_json::json!({
            "backend": client.base_url(),
            "online": true,
            "status": health.status,
            "message": health.message,
        }),
        Err(e) => serde_json::json!({
            "backend": client.base_url(),
            "online": false,
            "error": e.to_string(),
        }),
    };

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn generate_once(mut app: App) -> Result<()> {
    match app.generate_now().await {
        Ok(()) => {
            println!("{}", app.generated_text);
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(GENERATION_ERROR_MESSAGE)),
    }
}

async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => app.handle_key(key),
                    }
                }
            }
        }

        app.tick().await;
    }
}
