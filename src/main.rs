use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfmentor::backend::{Backend, HttpBackend, OfflineBackend};
use pdfmentor::event_source::TerminalEventSource;
use pdfmentor::handoff::HandoffSlot;
use pdfmentor::main_app::{App, run_app_with_event_source};
use pdfmentor::panic_handler::initialize_panic_handler;
use pdfmentor::pdf::default_engine;
use pdfmentor::settings::{Settings, load_settings};
use pdfmentor::theme::set_theme_by_name;

#[derive(Parser, Debug)]
#[command(name = "pdfmentor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PDF to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Base URL of the assistant service
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Answer with canned replies instead of calling the service
    #[arg(long)]
    offline: bool,

    #[arg(long, value_name = "PATH", default_value = "pdfmentor.log")]
    log_file: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the quiz page for the most recently handed-off selection
    Quiz,
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(url) = &cli.backend_url {
        settings.backend_url = url.clone();
    }
    if cli.offline {
        settings.offline = true;
    }
}

fn build_backend(settings: &Settings) -> Box<dyn Backend> {
    if settings.offline {
        info!("Running with the offline assistant");
        Box::new(OfflineBackend)
    } else {
        info!("Assistant service at {}", settings.backend_url);
        Box::new(HttpBackend::new(
            &settings.backend_url,
            settings.request_timeout(),
        ))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?,
    )?;
    info!("Starting pdfmentor");

    let mut settings = load_settings();
    apply_overrides(&mut settings, &cli);
    set_theme_by_name(&settings.theme);

    let mut app = App::new(
        settings.clone(),
        default_engine(),
        build_backend(&settings),
        HandoffSlot::default_location(),
    );

    match (&cli.command, &cli.file) {
        (Some(Command::Quiz), _) => app.open_quiz_from_handoff(),
        (None, Some(path)) => {
            // Reported on the HUD, the reader still starts
            let _ = app.open_file(path);
        }
        (None, None) => {}
    }

    initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = TerminalEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pdfmentor");
    Ok(())
}
