use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod controller;
mod error;
mod gemini;
mod handler;
mod session;
mod tui;
mod ui;

use app::App;
use config::{Config, Overrides, API_KEY_ENV};
use controller::Controller;
use gemini::{GeminiClient, TextGenerator};
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "gemini-tui", version)]
#[command(about = "Send single-shot prompts to the Gemini API from your terminal")]
struct Cli {
    /// Model to query (default: gemini-2.0-flash)
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of the Generative Language API
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Path to the configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store --model and --api-base in the configuration file
    #[arg(long)]
    save_config: bool,

    /// Send one prompt, print the response and exit
    #[arg(short, long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Where to write the log (the terminal belongs to the UI)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("gemini-tui")
        .join("gemini-tui.log")
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<WorkerGuard> {
    let path = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(&dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, file_name));

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let config = Config::load_or_default(&config_path);
    let overrides = Overrides {
        model: cli.model.clone(),
        api_base: cli.api_base.clone(),
    };

    if cli.save_config {
        let mut saved = config.clone();
        if overrides.model.is_some() {
            saved.model = overrides.model.clone();
        }
        if overrides.api_base.is_some() {
            saved.api_base = overrides.api_base.clone();
        }
        saved.save_to(&config_path)?;
        info!("Saved configuration to {}", config_path.display());
    }

    // The key is read exactly once, here
    let settings = config.resolve(std::env::var(API_KEY_ENV).ok(), overrides);
    info!(
        model = %settings.model,
        api_base = %settings.api_base,
        api_key_present = settings.api_key.is_some(),
        "Starting gemini-tui"
    );

    let generator = settings.api_key.as_deref().map(|key| {
        Arc::new(GeminiClient::new(&settings.api_base, &settings.model, key)) as Arc<dyn TextGenerator>
    });
    let controller = Controller::new(generator);

    match cli.prompt {
        Some(prompt) => run_once(controller, prompt).await,
        None => run_tui(controller, settings.model).await,
    }
}

/// Headless mode: one submission, response on stdout.
async fn run_once(controller: Controller, prompt: String) -> Result<()> {
    let text = answer_once(controller, prompt).await?;
    println!("{}", text);
    Ok(())
}

/// Submit `prompt` and return the response text, or the message the UI
/// would have shown as an error.
async fn answer_once(mut controller: Controller, prompt: String) -> Result<String> {
    controller.update_prompt(prompt);
    if !controller.state().can_submit() {
        bail!("Prompt is empty");
    }

    controller.submit().await;

    let state = controller.state();
    if let Some(message) = &state.error {
        bail!("{}", message);
    }
    state
        .response
        .clone()
        .ok_or_else(|| anyhow!("No response received"))
}

async fn run_tui(controller: Controller, model: String) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(controller, model, events.sender());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    info!("Exiting");
    Ok(())
}
