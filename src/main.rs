use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rtv::controller::Controller;
use rtv::domain::{Message, RTVError, TVConfig};
use rtv::model::{Model, RowKeyFn, Status};
use rtv::records::{Record, infer_columns_from, records_from_frame};
use rtv::resource::{Resource, ResourceDef, expand_path};
use rtv::state::TableState;
use rtv::swapi::{Person, Planet, load_people};
use rtv::ui::TableUI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SchemaKind {
    /// Infer columns from the file
    Auto,
    People,
    Planets,
}

/// A tui based, schema driven table viewer.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// CSV, Parquet or Arrow file to show
    path: String,

    #[arg(long, value_enum, default_value_t = SchemaKind::Auto)]
    schema: SchemaKind,

    /// People file used to resolve planet residents
    #[arg(long)]
    people: Option<String>,

    /// Column identifying a row (auto schema only)
    #[arg(long)]
    key: Option<String>,

    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Write logs to this file, filtered by RTV_LOG
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(log_file: Option<&str>) -> Result<(), RTVError> {
    let Some(log_file) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(expand_path(log_file)?)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("RTV_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(file).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<(), RTVError> {
    info!("Starting rtv on {} ({:?})", cli.path, cli.schema);
    let config = TVConfig {
        event_poll_time: cli.poll_ms,
        max_column_width: cli.max_column_width,
    };
    let title = Path::new(&cli.path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.path.clone());

    match cli.schema {
        SchemaKind::People => {
            let model = prepare(
                &config,
                title,
                ResourceDef::new(cli.path, Person::parse),
                TableState::new(Person::columns()),
                Arc::new(Person::row_key),
            );
            run_viewer(&config, model)
        }
        SchemaKind::Planets => {
            let people = cli.people.as_deref().and_then(load_people);
            let model = prepare(
                &config,
                title,
                ResourceDef::new(cli.path, Planet::parse),
                TableState::new(Planet::columns(people)),
                Arc::new(Planet::row_key),
            );
            run_viewer(&config, model)
        }
        SchemaKind::Auto => {
            let columns = infer_columns_from(&cli.path)?;
            let row_key: RowKeyFn<Record> = match cli.key {
                Some(key) => {
                    if !columns.iter().any(|c| c.id == key) {
                        return Err(RTVError::LoadingFailed(format!("Unknown key column {key}")));
                    }
                    Arc::new(move |record: &Record| record.key_by(&key))
                }
                None => Arc::new(Record::fingerprint),
            };
            let model = prepare(
                &config,
                title,
                ResourceDef::new(cli.path, records_from_frame),
                TableState::new(columns),
                row_key,
            );
            run_viewer(&config, model)
        }
    }
}

/// Loads the rows before the terminal is taken over. A file that fails to
/// load still opens the viewer, which shows the error in its status line.
fn prepare<T>(
    config: &TVConfig,
    title: String,
    def: ResourceDef<T>,
    table: TableState<T>,
    row_key: RowKeyFn<T>,
) -> Model<T> {
    Model::init(config, title, Resource::preloaded(def), table, row_key)
}

fn run_viewer<T>(config: &TVConfig, mut model: Model<T>) -> Result<(), RTVError> {
    let ui = TableUI::new(config);
    let controller = Controller::new(config);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &ui, &controller, &mut model);
    ratatui::restore();
    result
}

fn event_loop<T>(
    terminal: &mut DefaultTerminal,
    ui: &TableUI,
    controller: &Controller,
    model: &mut Model<T>,
) -> Result<(), RTVError> {
    let size = terminal.size()?;
    model.update(Some(Message::Resize(size.width.into(), size.height.into())))?;

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // A requested load runs after the loading state was drawn
        if model.poll_resource() {
            continue;
        }

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }

    Ok(())
}
