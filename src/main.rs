mod app;
mod clipboard;
mod config;
mod i18n;
mod import;
mod nomenclature;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use clipboard::SystemClipboard;
use config::AppConfig;
use i18n::Translator;
use nomenclature::Field;

#[derive(Parser, Debug)]
#[command(name = "nomenclator")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "Build fields, pick values and copy the generated nomenclature")]
struct Args {
    /// Load fields from a .csv or .json file before starting
    #[arg(short, long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Select a value on a field (repeatable); unknown fields are created
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_selection)]
    select: Vec<(String, String)>,

    /// Separator placed between selected values
    #[arg(short, long)]
    separator: Option<String>,

    /// Upload endpoint for CSV imports
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Parse CSV files locally instead of uploading them
    #[arg(long, conflicts_with = "endpoint")]
    offline: bool,

    /// Translation table to use
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,

    /// Print the generated nomenclature and exit
    #[arg(short, long)]
    print: bool,

    /// With --print, output a JSON array
    #[arg(long, requires = "print")]
    json: bool,
}

fn parse_selection(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to a file while the TUI owns the terminal
    init_logging(!args.print);

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(ref separator) = args.separator {
        config.separator = separator.clone();
    }
    if let Some(ref endpoint) = args.endpoint {
        config.upload_endpoint = Some(endpoint.clone());
    }
    if args.offline {
        config.upload_endpoint = None;
    }
    if args.lang.is_some() {
        config.language = args.lang.clone();
    }

    let fields = preload_fields(&args, &config).await?;

    if args.print {
        return print_labels(&fields, &config.separator, args.json);
    }

    run_tui(config, fields).await
}

fn init_logging(to_file: bool) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env());

    if !to_file {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return;
    }

    let log_file = AppConfig::config_dir()
        .and_then(|dir| Ok(std::fs::File::create(dir.join("nomenclator.log"))?));

    match log_file {
        Ok(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .init(),
        // No log file: stay quiet rather than draw over the TUI
        Err(_) => registry.init(),
    }
}

/// Fields from --import with --select applied
async fn preload_fields(args: &Args, config: &AppConfig) -> Result<Vec<Field>> {
    let mut fields = match args.import {
        Some(ref path) => import::import_file(path, &config.import_source())
            .await
            .with_context(|| format!("Failed to load fields from {}", path.display()))?,
        None => Vec::new(),
    };

    apply_selections(&mut fields, &args.select);
    Ok(fields)
}

fn apply_selections(fields: &mut Vec<Field>, selections: &[(String, String)]) {
    for (name, value) in selections {
        match fields.iter_mut().find(|f| &f.name == name) {
            Some(field) => {
                if !field.select(value) {
                    field.add_value(value);
                }
            }
            None => {
                let mut field = Field::new(name.as_str());
                field.add_value(value);
                fields.push(field);
            }
        }
    }
}

fn print_labels(fields: &[Field], separator: &str, json: bool) -> Result<()> {
    let labels = nomenclature::generate(fields, separator);

    if json {
        println!("{}", serde_json::to_string(&labels)?);
    } else {
        for label in labels {
            println!("{}", label);
        }
    }
    Ok(())
}

async fn run_tui(config: AppConfig, fields: Vec<Field>) -> Result<()> {
    ui::init_theme(theme::Theme::from_config(&config.theme));
    let translator = Translator::for_language(&config.translations, config.language.as_deref());

    let mut app = App::new(&config, translator, Box::new(SystemClipboard::new()));
    app.fields = fields;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Short poll so finished imports show up promptly
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            if let Err(e) = app.handle_key(key) {
                                tracing::warn!("Key handler failed: {:#}", e);
                                app.status_message = Some(format!("Error: {}", e));
                                app.status_message_time = Some(std::time::Instant::now());
                            }
                        }
                    }
                }
            }
        }

        app.tick();

        // Let spawned import tasks make progress between frames
        tokio::task::yield_now().await;
    }
}
