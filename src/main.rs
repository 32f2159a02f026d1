//! roomplan - floor plan and room occupancy manager
//!
//! Draw rooms over floor plans, track tenants and statuses, print reports

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use roomplan::app::App;
use roomplan::commands::{self, OutputFormat, RoomEdit, StatusOperation};
use roomplan::config::{load_config, RoomplanPaths};
use roomplan::logging;
use roomplan::scene::FileImageProbe;
use roomplan::store::{Seed, Store};
use roomplan::tui;

#[derive(Parser)]
#[command(name = "roomplan")]
#[command(author, version, about = "Floor plan and room occupancy manager")]
struct Cli {
    /// Building data file (overrides config.toml)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize roomplan (first-time setup)
    Init,

    /// Open the interactive floor plan editor (default)
    Tui,

    /// List floors
    Floors,

    /// List rooms on a floor
    Rooms {
        /// Floor key, 0-5 (0 is the basement)
        floor: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the occupancy report
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the status legend
    Legend,

    /// Manage room statuses
    Statuses {
        #[command(subcommand)]
        operation: StatusOperationCli,
    },

    /// Set the plan image of a floor
    Plan {
        /// Floor key, 0-5
        floor: String,

        /// PNG, JPG or BMP image
        path: PathBuf,
    },

    /// Edit a room's details
    Room {
        /// Floor key, 0-5
        floor: String,

        /// Room number
        number: String,

        /// New room number
        #[arg(long)]
        rename: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        /// Legal name of the renter
        #[arg(short, long)]
        renter: Option<String>,

        /// Contact name of the renter
        #[arg(long)]
        client: Option<String>,

        /// Renter tax ID, up to 12 digits
        #[arg(long)]
        inn: Option<String>,

        #[arg(long)]
        payment: Option<String>,

        /// Entry date, YYYY-MM-DD
        #[arg(long)]
        entry: Option<String>,

        /// Exit date, YYYY-MM-DD
        #[arg(long)]
        exit: Option<String>,

        /// Reset tenant fields
        #[arg(long, conflicts_with = "delete")]
        clear: bool,

        /// Remove the room
        #[arg(long)]
        delete: bool,
    },
}

#[derive(Subcommand)]
enum StatusOperationCli {
    /// List statuses and colors
    List,

    /// Add a status
    Add {
        name: String,

        /// Fill color, #AARRGGBB or #RRGGBB
        #[arg(long, default_value = "#B3808080")]
        bg: String,

        /// Label color
        #[arg(long, default_value = "#000000")]
        text: String,
    },

    /// Rename a status, optionally changing its colors
    Rename {
        old: String,
        new: String,

        #[arg(long)]
        bg: Option<String>,

        #[arg(long)]
        text: Option<String>,
    },

    /// Remove a status
    Remove { name: String },
}

impl From<StatusOperationCli> for StatusOperation {
    fn from(op: StatusOperationCli) -> Self {
        match op {
            StatusOperationCli::List => StatusOperation::List,
            StatusOperationCli::Add { name, bg, text } => StatusOperation::Add { name, bg, text },
            StatusOperationCli::Rename { old, new, bg, text } => StatusOperation::Rename { old, new, bg, text },
            StatusOperationCli::Remove { name } => StatusOperation::Remove { name },
        }
    }
}

fn format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Summary
    }
}

fn resolve_paths(data: Option<PathBuf>) -> anyhow::Result<(RoomplanPaths, String)> {
    let paths = RoomplanPaths::new()?;
    let config = load_config(&paths.config)?;
    let mut paths = paths.with_config(&config);
    if let Some(data) = data {
        paths.data_file = data;
    }
    Ok((paths, config.logging.level))
}

fn run_tui(paths: &RoomplanPaths) -> anyhow::Result<()> {
    paths.ensure_dirs()?;
    let (store, seed) = Store::open(&paths.data_file, &paths.templates);
    match seed {
        Seed::Template(template) => info!("Seeded data file from {}", template.display()),
        Seed::Empty => info!("Created empty data file {}", paths.data_file.display()),
        Seed::Existing => {}
    }
    let app = App::new(store, Box::new(FileImageProbe));
    tui::TuiApp::new(app).run()
}

fn run(cli: Cli, paths: &RoomplanPaths) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Init => commands::init(paths)?,
        Commands::Tui => run_tui(paths)?,
        Commands::Floors => commands::floors(paths)?,
        Commands::Rooms { floor, json } => commands::rooms(paths, &floor, format(json))?,
        Commands::Report { json } => commands::report(paths, format(json))?,
        Commands::Legend => commands::legend(paths)?,
        Commands::Statuses { operation } => commands::statuses(paths, operation.into())?,
        Commands::Plan { floor, path } => commands::plan(paths, &floor, &path)?,
        Commands::Room {
            floor,
            number,
            rename,
            status,
            renter,
            client,
            inn,
            payment,
            entry,
            exit,
            clear,
            delete,
        } => {
            let edit = RoomEdit {
                number: rename,
                status,
                renter,
                client,
                inn,
                payment,
                entry_date: entry,
                exit_date: exit,
                clear,
                delete,
            };
            commands::room(paths, &floor, &number, edit)?
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (paths, level) = resolve_paths(cli.data.clone())?;

    let session = logging::init(&paths.log_file, &level)
        .with_context(|| format!("Failed to start logging to {}", paths.log_file.display()))?;
    info!("Data file: {}", paths.data_file.display());

    let result = run(cli, &paths);
    if let Err(e) = &result {
        session.fatal(e);
    }
    result
}
