//! Command-line front end for `waymark_core`.
//!
//! # Responsibility
//! - Map subcommands onto world store, record service and maintenance calls.
//! - Render waymarks as plain text lines.
//!
//! # Invariants
//! - Business rules live in core; this binary only parses and prints.
//! - Failures print one message to stderr and exit with status 1.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use waymark_core::{
    default_log_level, init_logging, readout, sweep_orphaned_images, Dimension, RecordService,
    StorageConfig, Waymark, WaymarkDraft, WaymarkId, WorldStore,
};

#[derive(Debug, Parser)]
#[command(name = "waymark", version, about = "Track waymarks across worlds")]
struct Cli {
    /// Storage root holding world files and images.
    #[arg(long, global = true, env = "WAYMARK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List worlds (creates the default world on first run).
    Worlds,
    WorldCreate { name: String },
    WorldDelete { name: String },
    /// List every waymark in a world.
    List { world: String },
    Add {
        world: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    Edit {
        world: String,
        id: WaymarkId,
        #[command(flatten)]
        fields: FieldArgs,
    },
    Rm { world: String, id: WaymarkId },
    /// Show the world seed, or set it when a value is given.
    Seed {
        world: String,
        #[arg(allow_negative_numbers = true)]
        value: Option<String>,
    },
    Search { world: String, term: String },
    /// Delete managed images no waymark references.
    SweepImages,
}

#[derive(Debug, Args)]
struct FieldArgs {
    description: String,
    #[arg(allow_negative_numbers = true)]
    x: String,
    #[arg(allow_negative_numbers = true)]
    y: String,
    #[arg(allow_negative_numbers = true)]
    z: String,
    /// Record the coordinates as Nether coordinates.
    #[arg(long)]
    nether: bool,
    /// Screenshot to copy into managed storage.
    #[arg(long)]
    image: Option<PathBuf>,
}

impl FieldArgs {
    fn split(self) -> (WaymarkDraft, Option<PathBuf>) {
        let dimension = if self.nether {
            Dimension::Nether
        } else {
            Dimension::Overworld
        };
        let draft = WaymarkDraft::new(self.description, self.x, self.y, self.z, dimension);
        (draft, self.image)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.clone().unwrap_or_else(default_log_level);
        init_logging(&level, log_dir).map_err(|err| err.to_string())?;
    }

    let config = match cli.data_dir {
        Some(root) => StorageConfig::new(root),
        None => StorageConfig::resolve(),
    };
    let store = WorldStore::open(config);

    match cli.command {
        Command::Worlds => {
            for name in store.list_worlds().map_err(|err| err.to_string())? {
                println!("{name}");
            }
        }
        Command::WorldCreate { name } => {
            match store.create_world(&name).map_err(|err| err.to_string())? {
                Some(created) => println!("created world {created}"),
                None => return Err("world name must not be blank".to_string()),
            }
        }
        Command::WorldDelete { name } => {
            if store.delete_world(&name).map_err(|err| err.to_string())? {
                println!("deleted world {name}");
            } else {
                println!("no world named {name}");
            }
        }
        Command::List { world } => {
            let service = open_existing(&store, &world)?;
            if let Some(seed) = service.seed() {
                println!("seed: {seed}");
            }
            for waymark in service.waymarks() {
                println!("{}", render(waymark));
            }
        }
        Command::Add { world, fields } => {
            let mut service = open_existing(&store, &world)?;
            let (draft, image) = fields.split();
            match service
                .create(draft, image.as_deref())
                .map_err(|err| err.to_string())?
            {
                Some(waymark) => println!("{}", render(&waymark)),
                None => return Err("description must not be empty".to_string()),
            }
        }
        Command::Edit { world, id, fields } => {
            let mut service = open_existing(&store, &world)?;
            let (draft, image) = fields.split();
            let changed = service
                .edit(id, draft, image.as_deref())
                .map_err(|err| err.to_string())?;
            match service.get(id) {
                Some(waymark) if changed => println!("{}", render(waymark)),
                _ => println!("no waymark {id} in {world}"),
            }
        }
        Command::Rm { world, id } => {
            let mut service = open_existing(&store, &world)?;
            if service.delete(id).map_err(|err| err.to_string())? {
                println!("deleted {id}");
            } else {
                println!("no waymark {id} in {world}");
            }
        }
        Command::Seed { world, value } => {
            let mut service = open_existing(&store, &world)?;
            if let Some(value) = value {
                service.set_seed(value).map_err(|err| err.to_string())?;
            }
            println!("{}", service.seed().unwrap_or("(no seed recorded)"));
        }
        Command::Search { world, term } => {
            let service = open_existing(&store, &world)?;
            for waymark in service.search(&term) {
                println!("{}", render(waymark));
            }
        }
        Command::SweepImages => {
            let report = sweep_orphaned_images(&store).map_err(|err| err.to_string())?;
            for path in &report.removed {
                println!("removed {}", path.display());
            }
            println!(
                "kept {} image(s), removed {}",
                report.kept.len(),
                report.removed.len()
            );
        }
    }

    Ok(())
}

fn open_existing(store: &WorldStore, world: &str) -> Result<RecordService, String> {
    if !store.contains(world) {
        return Err(format!("no world named {world}"));
    }
    RecordService::open(store, world).map_err(|err| err.to_string())
}

fn render(waymark: &Waymark) -> String {
    let coords = readout(waymark);
    let position = if coords.flagged {
        "Math Error".to_string()
    } else {
        format!(
            "{} | {}: X {} / Z {} | {}",
            waymark.dimension.as_str(),
            coords.linked.caption(),
            coords.linked.x_label(),
            coords.linked.z_label(),
            coords.teleport_command()
        )
    };
    let image = waymark
        .image
        .as_ref()
        .map(|path| format!(" | image {}", path.display()))
        .unwrap_or_default();
    format!(
        "{} [{}] {} | {}{}",
        waymark.id, waymark.created, waymark.description, position, image
    )
}

#[cfg(test)]
mod tests {
    use super::{render, Cli};
    use clap::{CommandFactory, Parser};
    use waymark_core::{Dimension, Waymark, WaymarkDraft};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_accepts_negative_coordinates_and_nether_flag() {
        let cli = Cli::try_parse_from([
            "waymark", "add", "Base", "Fortress", "-12", "70", "-300", "--nether",
        ])
        .unwrap();
        let debug = format!("{cli:?}");
        assert!(debug.contains("\"-300\""));
        assert!(debug.contains("nether: true"));
    }

    #[test]
    fn seed_accepts_negative_values() {
        let cli = Cli::try_parse_from(["waymark", "seed", "Base", "-4172144997902289642"]).unwrap();
        assert!(format!("{cli:?}").contains("-4172144997902289642"));
    }

    #[test]
    fn render_shows_linked_coordinates_and_teleport_command() {
        let waymark = Waymark::from_draft(
            WaymarkDraft::new("Spawn", "100", "64", "-200", Dimension::Overworld),
            "03/14 09:30",
            None,
        );
        let line = render(&waymark);
        assert!(line.contains("Nether Link (÷8): X 12.50 / Z -25.00"));
        assert!(line.contains("/tp 100.00 64.00 -200.00"));
    }

    #[test]
    fn render_flags_unparsable_coordinates() {
        let waymark = Waymark::from_draft(
            WaymarkDraft::new("Broken", "north", "64", "0", Dimension::Overworld),
            "03/14 09:30",
            None,
        );
        assert!(render(&waymark).contains("Math Error"));
    }
}
