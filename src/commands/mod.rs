//! CLI commands for roomplan

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::app::App;
use crate::config::{save_config, Config, RoomplanPaths};
use crate::editor::Field;
use crate::models::{floor_name, StatusColors, FLOOR_COUNT};
use crate::palette;
use crate::report::{self, Report};
use crate::scene::{FileImageProbe, RoomId};
use crate::store::{ensure_data_file, Seed, Store};

/// Output format for read-only commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// Status palette operations
#[derive(Debug, Clone)]
pub enum StatusOperation {
    List,
    Add {
        name: String,
        bg: String,
        text: String,
    },
    Rename {
        old: String,
        new: String,
        bg: Option<String>,
        text: Option<String>,
    },
    Remove {
        name: String,
    },
}

/// Field changes for one room; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct RoomEdit {
    pub number: Option<String>,
    pub status: Option<String>,
    pub renter: Option<String>,
    pub client: Option<String>,
    pub inn: Option<String>,
    pub payment: Option<String>,
    pub entry_date: Option<String>,
    pub exit_date: Option<String>,
    pub clear: bool,
    pub delete: bool,
}

/// Initialize roomplan for first-time setup
pub fn init(paths: &RoomplanPaths) -> Result<()> {
    if paths.is_initialized() {
        println!("Roomplan is already initialized at {}", paths.root.display());
        return Ok(());
    }

    println!("Initializing roomplan at {}...", paths.root.display());
    paths.ensure_dirs()?;

    if !paths.config.exists() {
        save_config(&paths.config, &Config::default())?;
        println!("  Created config.toml");
    }

    match ensure_data_file(&paths.data_file, &paths.templates).context("Failed to create data file")? {
        Seed::Existing => println!("  Using existing {}", paths.data_file.display()),
        Seed::Template(template) => println!("  Copied template {}", template.display()),
        Seed::Empty => println!("  Created {} with default statuses", paths.data_file.display()),
    }

    println!();
    println!("Roomplan initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  roomplan                      Open the floor plan editor");
    println!("  roomplan plan 1 plan.png      Set the plan image for floor 1");
    println!("  roomplan report               Print the occupancy report");

    Ok(())
}

/// List floors with room counts and plans
pub fn floors(paths: &RoomplanPaths) -> Result<()> {
    let store = open_store(paths)?;
    let data = store.data();

    println!("{:<5} {:<18} {:<6} {}", "KEY", "NAME", "ROOMS", "PLAN");
    println!("{}", "-".repeat(60));
    for index in 0..FLOOR_COUNT {
        let key = index.to_string();
        let floor = data.floor(&key);
        println!(
            "{:<5} {:<18} {:<6} {}",
            key,
            floor_name(&key),
            floor.map(|f| f.rooms.len()).unwrap_or(0),
            floor.and_then(|f| f.plan_path.as_deref()).unwrap_or("-")
        );
    }
    Ok(())
}

/// List the rooms of one floor
pub fn rooms(paths: &RoomplanPaths, floor: &str, format: OutputFormat) -> Result<()> {
    let index = parse_floor(floor)?;
    let store = open_store(paths)?;
    let rooms = store
        .data()
        .floor(&index.to_string())
        .map(|f| f.rooms.as_slice())
        .unwrap_or(&[]);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(rooms)?);
        return Ok(());
    }

    if rooms.is_empty() {
        println!("No rooms on {}.", floor_name(&index.to_string()));
        println!("Draw one with: roomplan tui");
        return Ok(());
    }

    println!(
        "{:<8} {:<20} {:<22} {:<13} {:<11} {:<11}",
        "NUMBER", "STATUS", "RENTER", "INN", "ENTRY", "EXIT"
    );
    println!("{}", "-".repeat(90));
    for room in rooms {
        println!(
            "{:<8} {:<20} {:<22} {:<13} {:<11} {:<11}",
            truncate(&room.number, 8),
            truncate(&room.status, 20),
            truncate(room.renter(), 22),
            room.inn,
            room.entry_date,
            room.exit_date
        );
    }
    Ok(())
}

/// Print the occupancy report
pub fn report(paths: &RoomplanPaths, format: OutputFormat) -> Result<()> {
    let store = open_store(paths)?;
    let report = Report::build(store.data());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Summary => print!("{}", report.render()),
    }
    Ok(())
}

/// Print the status legend with counts
pub fn legend(paths: &RoomplanPaths) -> Result<()> {
    let store = open_store(paths)?;
    for entry in report::legend(store.data()) {
        println!(
            "{:<20} {:>4}   {} / {}",
            entry.status, entry.count, entry.colors.bg, entry.colors.text
        );
    }
    Ok(())
}

/// Handle status palette operations
pub fn statuses(paths: &RoomplanPaths, op: StatusOperation) -> Result<()> {
    let mut app = open_app(paths)?;
    match op {
        StatusOperation::List => {
            for (name, colors) in app.data().statuses.iter() {
                println!("{:<20} {} / {}", name, colors.bg, colors.text);
            }
        }
        StatusOperation::Add { name, bg, text } => {
            app.add_status(&name, StatusColors::new(bg, text))?;
            println!("✓ Added status {}", name.trim());
        }
        StatusOperation::Rename { old, new, bg, text } => {
            let current = app
                .data()
                .statuses
                .get(&old)
                .cloned()
                .ok_or_else(|| palette::PaletteError::UnknownStatus(old.clone()))?;
            let colors = StatusColors::new(bg.unwrap_or(current.bg), text.unwrap_or(current.text));
            app.rename_status(&old, &new, colors)?;
            println!("✓ Renamed status {} to {}", old, new.trim());
            println!("Note: rooms still marked '{}' keep that status", old);
        }
        StatusOperation::Remove { name } => {
            app.remove_status(&name)?;
            println!("✓ Removed status {}", name);
        }
    }
    Ok(())
}

/// Set the plan image of a floor
pub fn plan(paths: &RoomplanPaths, floor: &str, image: &Path) -> Result<()> {
    let index = parse_floor(floor)?;
    let mut app = open_app(paths)?;
    app.load_floor(index);
    let image = image.to_string_lossy();
    app.upload_plan(&image)?;
    let (width, height) = app.scene().background.size();
    println!("✓ {} now uses {} ({}x{})", floor_name(&index.to_string()), image, width, height);
    Ok(())
}

/// Edit, clear or delete one room identified by floor and number
pub fn room(paths: &RoomplanPaths, floor: &str, number: &str, edit: RoomEdit) -> Result<()> {
    let index = parse_floor(floor)?;
    let mut app = open_app(paths)?;
    app.load_floor(index);

    let key = index.to_string();
    let position = app
        .data()
        .floor(&key)
        .and_then(|f| f.rooms.iter().position(|r| r.number == number))
        .with_context(|| format!("Room {} not found on {}", number, floor_name(&key)))?;
    let id = RoomId(position);

    if edit.delete {
        app.delete_room(id)?;
        println!("✓ Deleted room {}", number);
        return Ok(());
    }
    if edit.clear {
        app.clear_room(id)?;
        println!("✓ Cleared room {}", number);
        return Ok(());
    }

    let mut form = app.stored_room_form(id)?;
    let changes = [
        (Field::Number, edit.number),
        (Field::Status, edit.status),
        (Field::RenterName, edit.renter),
        (Field::ClientName, edit.client),
        (Field::Inn, edit.inn),
        (Field::PaymentType, edit.payment),
        (Field::EntryDate, edit.entry_date),
        (Field::ExitDate, edit.exit_date),
    ];
    for (field, value) in changes {
        if let Some(value) = value {
            *form.field_mut(field) = value;
        }
    }
    if !app.data().statuses.contains(&form.status) {
        println!("Warning: status '{}' is not in the palette", form.status);
    }
    app.save_room(id, &form)?;
    println!("✓ Updated room {} on {}", form.number, form.floor_label);
    Ok(())
}

fn parse_floor(floor: &str) -> Result<usize> {
    match floor.trim().parse::<usize>() {
        Ok(index) if index < FLOOR_COUNT => Ok(index),
        _ => bail!("Invalid floor '{}'. Use 0-{}", floor, FLOOR_COUNT - 1),
    }
}

fn ensure_initialized(paths: &RoomplanPaths) -> Result<()> {
    if !paths.data_file.exists() {
        bail!(
            "No data file at {}. Run `roomplan init` first.",
            paths.data_file.display()
        );
    }
    Ok(())
}

fn open_store(paths: &RoomplanPaths) -> Result<Store> {
    ensure_initialized(paths)?;
    Store::load(&paths.data_file).context("Failed to load building data")
}

fn open_app(paths: &RoomplanPaths) -> Result<App> {
    Ok(App::new(open_store(paths)?, Box::new(FileImageProbe)))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
