#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that launches the grid search visualizer.

mod config;
mod grid_transfer;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridpath_core::Algorithm;
use gridpath_rendering::{
    Color, ControlPanelView, GridPresentation, Palette, Presentation, RenderingBackend, Scene,
};
use gridpath_rendering_macroquad::MacroquadBackend;
use gridpath_solver_client::{SolveLauncher, SolvePipeline, Transport, BASE_URL_ENV};
use gridpath_system_grid_generation::{Config as GeneratorConfig, GridGenerator};
use gridpath_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{FileConfig, Overrides, Settings},
    grid_transfer::GridLayout,
    simulation::Simulation,
};

/// Command-line arguments accepted by the visualizer.
#[derive(Debug, Parser)]
#[command(
    name = "gridpath",
    version,
    about = "Animate grid search algorithms computed by an external solver"
)]
struct CliArgs {
    /// Configuration file; defaults to `gridpath.toml` when present.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Raises log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Number of grid rows.
    #[arg(long, global = true)]
    rows: Option<u32>,
    /// Number of grid columns.
    #[arg(long, global = true)]
    columns: Option<u32>,
    /// Algorithm requested from the solver (DFS, BFS, Dijkstra, A*, Bidirectional BFS).
    #[arg(long, global = true)]
    algorithm: Option<Algorithm>,
    /// Seed making wall generation reproducible.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Probability that a generated cell is a wall.
    #[arg(long, value_name = "P", global = true)]
    wall_probability: Option<f64>,
    /// Base address of the solver service.
    #[arg(long, value_name = "URL", global = true)]
    solver_url: Option<String>,
    /// Layout string to load instead of generating walls.
    #[arg(long, value_name = "LAYOUT", global = true)]
    layout: Option<String>,
    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Opens the interactive window (default).
    Run {
        /// Synchronise presentation with the display refresh rate.
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        vsync: bool,
    },
    /// Solves one grid without a window and prints the result.
    Solve,
}

impl CliArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            rows: self.rows,
            columns: self.columns,
            algorithm: self.algorithm,
            seed: self.seed,
            wall_probability: self.wall_probability,
            solver_url: self.solver_url.clone(),
        }
    }
}

/// Entry point for the visualizer command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let file = FileConfig::load(args.config.as_deref())?;
    let environment_url = std::env::var(BASE_URL_ENV).ok();
    let settings = Settings::resolve(file, &args.overrides(), environment_url.as_deref())?;
    info!(solver = %settings.endpoint.solve_url(), "solver endpoint resolved");

    let pipeline = SolvePipeline::http(settings.endpoint.clone(), settings.timeout)
        .context("failed to build the solver client")?;
    let mut simulation = Simulation::new(
        settings.dimensions,
        settings.algorithm,
        GridGenerator::new(GeneratorConfig::new(
            settings.wall_probability,
            settings.seed,
        )),
        settings.playback,
        SolveLauncher::new(pipeline),
    );

    match args.layout.as_deref() {
        Some(layout) => {
            let layout = GridLayout::decode(layout).context("failed to import --layout")?;
            simulation.import_layout(layout);
        }
        None => simulation
            .regenerate()
            .context("failed to generate the initial grid")?,
    }

    match args.command.unwrap_or(Mode::Run { vsync: true }) {
        Mode::Run { vsync } => run_window(simulation, &settings, vsync),
        Mode::Solve => solve_headless(simulation),
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_window<T>(mut simulation: Simulation<T>, settings: &Settings, vsync: bool) -> Result<()>
where
    T: Transport + Send + Sync + 'static,
{
    let dimensions = query::dimensions(simulation.session());
    let mut scene = Scene::new(
        GridPresentation::open(dimensions),
        ControlPanelView::new(settings.algorithm, dimensions),
        Palette::default(),
        settings.sizing,
    );
    simulation.populate_scene(&mut scene);

    let presentation = Presentation::new(
        "Grid Path Visualizer",
        Color::from_rgb_u8(0xf9, 0xfa, 0xfb),
        scene,
    );

    MacroquadBackend::new()
        .with_vsync(vsync)
        .with_window_size(settings.window_width, settings.window_height)
        .run(presentation, move |dt: Duration, input, scene| {
            if let Some(layout) = simulation.handle_input(input) {
                println!("{layout}");
            }
            simulation.advance(dt);
            simulation.populate_scene(scene);
        })
}

fn solve_headless<T>(mut simulation: Simulation<T>) -> Result<()>
where
    T: Transport + Send + Sync + 'static,
{
    let session = simulation.session();
    let algorithm = query::algorithm(session);
    let dimensions = query::dimensions(session);
    let layout = simulation.export_layout()?;

    let stats = simulation
        .solve_to_completion()
        .with_context(|| format!("{algorithm} solve of {dimensions} grid failed"))?;

    print!("{}", simulation.render_ascii());
    println!("Algorithm: {algorithm}");
    println!("Grid: {dimensions}");
    println!("Solved: {}", if stats.solved { "Yes" } else { "No" });
    println!("Time: {:.3} ms", stats.time_ms);
    println!("Nodes expanded: {}", stats.nodes_expanded);
    println!("Path length: {}", stats.path_length);
    println!("Layout: {layout}");
    Ok(())
}
