#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays scripted play sessions against the block grid.

mod manifest;
mod script;

use std::{cell::RefCell, fs, io::Read, path::PathBuf, rc::Rc, sync::Arc};

use anyhow::{Context, Result};
use block_grid_core::{Broadcast, Command, Event, GridCoord, Layer, NoPlayer};
use block_grid_system_builder::{Builder, BuilderInput};
use block_grid_world::{query, World};
use clap::Parser;
use log::{debug, info};

use crate::{
    manifest::Manifest,
    script::{ScriptLine, Step},
};

/// Replays a block grid script and prints every event the world publishes.
#[derive(Debug, Parser)]
#[command(name = "block-grid", version)]
struct Cli {
    /// Path to the TOML game manifest with `[world]` settings and `[[blocks]]` types.
    #[arg(long, short)]
    manifest: PathBuf,

    /// Script to replay; reads standard input when omitted.
    script: Option<PathBuf>,

    /// Log filter overriding `RUST_LOG`, for example `debug`.
    #[arg(long)]
    log_level: Option<String>,

    /// Print the occupied cells of every layer after the replay.
    #[arg(long)]
    summary: bool,
}

/// Entry point for the block grid command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let manifest = Manifest::load(&cli.manifest)?;
    let catalog = Arc::new(manifest.catalog()?);
    info!(
        "loaded {} block types, world bounds {}",
        catalog.len(),
        manifest.world.world_bounds
    );

    let source = read_script(cli.script.as_ref())?;
    let lines = script::parse(&source)?;

    let mut world = World::new(manifest.world, catalog);
    let mut session = Session::new();
    for line in lines {
        session.play(&mut world, line);
    }
    info!("replay finished after {} ticks", query::tick_index(&world));

    if cli.summary {
        print_summary(&world);
    }
    Ok(())
}

fn init_logging(filter: Option<&str>) {
    let mut builder = match filter {
        Some(filter) => {
            let mut builder = env_logger::Builder::new();
            let _ = builder.parse_filters(filter);
            builder
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        }
    };
    let _ = builder.format_timestamp(None).try_init();
}

fn read_script(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read script at {}", path.display())),
        None => {
            let mut source = String::new();
            let _ = std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read script from standard input")?;
            Ok(source)
        }
    }
}

/// Replay state shared across script lines.
struct Session {
    bus: Broadcast,
    recent: Rc<RefCell<Vec<Event>>>,
    builder: Builder,
}

impl Session {
    fn new() -> Self {
        let recent = Rc::new(RefCell::new(Vec::new()));
        let mut bus = Broadcast::new();
        let _ = bus.subscribe(|event| println!("{event:?}"));
        let sink = Rc::clone(&recent);
        let _ = bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            bus,
            recent,
            builder: Builder::new(),
        }
    }

    fn play(&mut self, world: &mut World, line: ScriptLine) {
        debug!("script line {}: {:?}", line.number, line.step);
        match line.step {
            Step::Command(command) => self.submit(world, command),
            Step::Player(cell) => place_player(world, cell),
            Step::Hold(cell) => {
                let events: Vec<Event> = self.recent.borrow_mut().drain(..).collect();
                let input = BuilderInput {
                    break_held: cell.is_some(),
                    cursor_cell: cell,
                    player_cell: query::player_presence(world),
                    ..BuilderInput::default()
                };
                let mut commands = Vec::new();
                self.builder.handle(&events, input, None, &mut commands);
                for command in commands {
                    self.submit(world, command);
                }
            }
        }
    }

    fn submit(&mut self, world: &mut World, command: Command) {
        block_grid_world::apply(world, command, &mut self.bus);
    }
}

fn place_player(world: &mut World, cell: Option<GridCoord>) {
    match cell {
        Some(cell) => {
            let body = query::config(world).cell_bounds(cell);
            world.set_player_probe(Box::new(body));
        }
        None => world.set_player_probe(Box::new(NoPlayer)),
    }
}

fn print_summary(world: &World) {
    for layer in [Layer::Block, Layer::Wall, Layer::Platform] {
        let cells = query::positions(world, layer);
        println!("{layer:?}: {} occupied", cells.len());
        for cell in cells {
            match layer {
                Layer::Block => println!(
                    "  ({}, {}) {} health {}",
                    cell.x(),
                    cell.y(),
                    query::block_type(world, cell).map_or("?", |id| id.as_str()),
                    query::health(world, cell).unwrap_or_default()
                ),
                Layer::Wall | Layer::Platform => println!("  ({}, {})", cell.x(), cell.y()),
            }
        }
    }
}
