//! File-backed configuration with command-line and environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use gridpath_core::{Algorithm, Dimensions};
use gridpath_rendering::CellSizing;
use gridpath_solver_client::SolverEndpoint;
use gridpath_system_playback::Config as PlaybackConfig;
use serde::Deserialize;

/// Configuration file consulted when `--config` is not provided.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "gridpath.toml";

/// Raw contents of the configuration file; every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) grid: GridSection,
    pub(crate) solver: SolverSection,
    pub(crate) playback: PlaybackSection,
    pub(crate) layout: LayoutSection,
    pub(crate) window: WindowSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) rows: u32,
    pub(crate) columns: u32,
    pub(crate) wall_probability: f64,
    pub(crate) seed: Option<u64>,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            rows: 50,
            columns: 90,
            wall_probability: 0.3,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SolverSection {
    pub(crate) algorithm: Algorithm,
    pub(crate) base_url: Option<String>,
    pub(crate) timeout_seconds: u64,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::DepthFirst,
            base_url: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlaybackSection {
    pub(crate) visited_delay_ms: u64,
    pub(crate) path_delay_ms: u64,
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            visited_delay_ms: 5,
            path_delay_ms: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LayoutSection {
    pub(crate) sidebar_fraction: f32,
    pub(crate) padding: f32,
    pub(crate) min_cell_size: u32,
    pub(crate) max_cell_size: u32,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            sidebar_fraction: CellSizing::DEFAULT_SIDEBAR_FRACTION,
            padding: CellSizing::DEFAULT_PADDING,
            min_cell_size: CellSizing::DEFAULT_MIN_CELL_SIZE,
            max_cell_size: CellSizing::DEFAULT_MAX_CELL_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowSection {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl FileConfig {
    /// Parses configuration from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse configuration")
    }

    /// Loads configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when it exists.
    ///
    /// An explicitly requested file must exist; the default file is optional.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid configuration {}", path.display()))
    }
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Overrides {
    pub(crate) rows: Option<u32>,
    pub(crate) columns: Option<u32>,
    pub(crate) algorithm: Option<Algorithm>,
    pub(crate) seed: Option<u64>,
    pub(crate) wall_probability: Option<f64>,
    pub(crate) solver_url: Option<String>,
}

/// Fully resolved settings used to build the simulation and the window.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) dimensions: Dimensions,
    pub(crate) wall_probability: f64,
    pub(crate) seed: Option<u64>,
    pub(crate) algorithm: Algorithm,
    pub(crate) endpoint: SolverEndpoint,
    pub(crate) timeout: Duration,
    pub(crate) playback: PlaybackConfig,
    pub(crate) sizing: CellSizing,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
}

impl Settings {
    /// Merges the file, command-line overrides and the environment-provided solver address.
    pub(crate) fn resolve(
        file: FileConfig,
        overrides: &Overrides,
        environment_url: Option<&str>,
    ) -> Result<Self> {
        let rows = overrides.rows.unwrap_or(file.grid.rows);
        let columns = overrides.columns.unwrap_or(file.grid.columns);
        let dimensions = Dimensions::new(rows, columns).context("invalid grid dimensions")?;

        let sizing = CellSizing::new(
            file.layout.sidebar_fraction,
            file.layout.padding,
            file.layout.min_cell_size,
            file.layout.max_cell_size,
        )
        .context("invalid [layout] configuration")?;

        let endpoint = SolverEndpoint::from_sources(
            overrides.solver_url.as_deref(),
            environment_url,
            file.solver.base_url.as_deref(),
        );

        Ok(Self {
            dimensions,
            wall_probability: overrides
                .wall_probability
                .unwrap_or(file.grid.wall_probability),
            seed: overrides.seed.or(file.grid.seed),
            algorithm: overrides.algorithm.unwrap_or(file.solver.algorithm),
            endpoint,
            timeout: Duration::from_secs(file.solver.timeout_seconds.max(1)),
            playback: PlaybackConfig::new(
                Duration::from_millis(file.playback.visited_delay_ms),
                Duration::from_millis(file.playback.path_delay_ms),
            ),
            sizing,
            window_width: file.window.width,
            window_height: file.window.height,
        })
    }
}
