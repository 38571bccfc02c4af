#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for grid search visualizer adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use gridpath_core::{Algorithm, Coordinate, Dimensions, DisplayStats, PlaybackPhase};
use std::time::Duration;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Visual state of a single grid cell after applying endpoints and overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellVisual {
    /// Traversable, unrevealed cell.
    #[default]
    Open,
    /// Impassable cell.
    Wall,
    /// Cell revealed by the exploration sequence.
    Visited,
    /// Cell revealed by the final path.
    Path,
    /// Start endpoint.
    Start,
    /// End endpoint.
    End,
}

/// Colors assigned to each [`CellVisual`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Fill for open cells.
    pub open: Color,
    /// Fill for walls.
    pub wall: Color,
    /// Fill for visited cells.
    pub visited: Color,
    /// Fill for path cells.
    pub path: Color,
    /// Fill for the start endpoint.
    pub start: Color,
    /// Fill for the end endpoint.
    pub end: Color,
    /// Color of the gaps drawn between cells.
    pub grid_line: Color,
}

impl Palette {
    /// Resolves the fill color for the provided visual.
    #[must_use]
    pub const fn fill(&self, visual: CellVisual) -> Color {
        match visual {
            CellVisual::Open => self.open,
            CellVisual::Wall => self.wall,
            CellVisual::Visited => self.visited,
            CellVisual::Path => self.path,
            CellVisual::Start => self.start,
            CellVisual::End => self.end,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            open: Color::from_rgb_u8(0xe5, 0xe7, 0xeb),
            wall: Color::from_rgb_u8(0x37, 0x41, 0x51),
            visited: Color::from_rgb_u8(0x93, 0xc5, 0xfd),
            path: Color::from_rgb_u8(0xfa, 0xcc, 0x15),
            start: Color::from_rgb_u8(0x22, 0xc5, 0x5e),
            end: Color::from_rgb_u8(0xef, 0x44, 0x44),
            grid_line: Color::from_rgb_u8(0xd1, 0xd5, 0xdb),
        }
    }
}

/// Window area available to the adapter, expressed in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width of the drawable area.
    pub width: f32,
    /// Height of the drawable area.
    pub height: f32,
}

impl Viewport {
    /// Creates a new viewport descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Parameters controlling how cells are sized inside the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSizing {
    sidebar_fraction: f32,
    padding: f32,
    min_cell_size: u32,
    max_cell_size: u32,
}

impl CellSizing {
    /// Default fraction of the viewport width reserved for the control panel.
    pub const DEFAULT_SIDEBAR_FRACTION: f32 = 0.25;

    /// Default padding around the grid area, in pixels.
    pub const DEFAULT_PADDING: f32 = 16.0;

    /// Default lower bound for the cell side length.
    pub const DEFAULT_MIN_CELL_SIZE: u32 = 2;

    /// Default upper bound for the cell side length.
    pub const DEFAULT_MAX_CELL_SIZE: u32 = 40;

    /// Creates a sizing descriptor.
    ///
    /// Returns an error when the sidebar fraction lies outside `[0, 1)`, the
    /// padding is negative or the cell bounds are empty.
    pub fn new(
        sidebar_fraction: f32,
        padding: f32,
        min_cell_size: u32,
        max_cell_size: u32,
    ) -> std::result::Result<Self, RenderingError> {
        if !(0.0..1.0).contains(&sidebar_fraction) {
            return Err(RenderingError::InvalidSidebarFraction { sidebar_fraction });
        }
        if !padding.is_finite() || padding < 0.0 {
            return Err(RenderingError::InvalidPadding { padding });
        }
        if min_cell_size == 0 || min_cell_size > max_cell_size {
            return Err(RenderingError::InvalidCellSizeRange {
                min: min_cell_size,
                max: max_cell_size,
            });
        }

        Ok(Self {
            sidebar_fraction,
            padding,
            min_cell_size,
            max_cell_size,
        })
    }

    /// Fraction of the viewport width reserved for the control panel.
    #[must_use]
    pub const fn sidebar_fraction(&self) -> f32 {
        self.sidebar_fraction
    }

    /// Padding applied around the grid area.
    #[must_use]
    pub const fn padding(&self) -> f32 {
        self.padding
    }

    /// Smallest permitted cell side length.
    #[must_use]
    pub const fn min_cell_size(&self) -> u32 {
        self.min_cell_size
    }

    /// Largest permitted cell side length.
    #[must_use]
    pub const fn max_cell_size(&self) -> u32 {
        self.max_cell_size
    }

    /// Width of the control panel for the provided viewport.
    #[must_use]
    pub fn sidebar_width(&self, viewport: Viewport) -> f32 {
        (viewport.width * self.sidebar_fraction).max(0.0)
    }
}

impl Default for CellSizing {
    fn default() -> Self {
        Self {
            sidebar_fraction: Self::DEFAULT_SIDEBAR_FRACTION,
            padding: Self::DEFAULT_PADDING,
            min_cell_size: Self::DEFAULT_MIN_CELL_SIZE,
            max_cell_size: Self::DEFAULT_MAX_CELL_SIZE,
        }
    }
}

/// Computes the side length of a cell so the whole grid fits the viewport.
///
/// The available area excludes the sidebar and the padding on both sides. The
/// result is the smaller of the per-axis fits, clamped into the configured
/// bounds, so a tiny window still yields the minimum size.
#[must_use]
pub fn compute_cell_size(viewport: Viewport, sizing: &CellSizing, dimensions: Dimensions) -> u32 {
    let available_width =
        (viewport.width * (1.0 - sizing.sidebar_fraction) - 2.0 * sizing.padding).max(0.0);
    let available_height = (viewport.height - 2.0 * sizing.padding).max(0.0);

    let fit_width = (available_width / dimensions.columns() as f32).floor();
    let fit_height = (available_height / dimensions.rows() as f32).floor();
    let fit = fit_width.min(fit_height);

    if !fit.is_finite() || fit < sizing.min_cell_size as f32 {
        return sizing.min_cell_size;
    }

    (fit as u32).clamp(sizing.min_cell_size, sizing.max_cell_size)
}

/// Remembers the last computed cell size so adapters only react to changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellSizeTracker {
    current: Option<u32>,
}

impl CellSizeTracker {
    /// Creates a tracker that has not observed any size yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Recomputes the cell size and reports whether it changed.
    pub fn update(
        &mut self,
        viewport: Viewport,
        sizing: &CellSizing,
        dimensions: Dimensions,
    ) -> (u32, bool) {
        let size = compute_cell_size(viewport, sizing, dimensions);
        let changed = self.current != Some(size);
        self.current = Some(size);
        (size, changed)
    }

    /// Most recently computed size, if any.
    #[must_use]
    pub const fn current(&self) -> Option<u32> {
        self.current
    }
}

/// Screen-space placement of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMetrics {
    /// Top-left corner of cell `(0, 0)`.
    pub origin: Vec2,
    /// Side length of a cell in pixels.
    pub cell_size: f32,
    /// Dimensions of the placed grid.
    pub dimensions: Dimensions,
}

impl GridMetrics {
    /// Places the grid to the right of the sidebar using the computed cell size.
    #[must_use]
    pub fn layout(viewport: Viewport, sizing: &CellSizing, dimensions: Dimensions) -> Self {
        let cell_size = compute_cell_size(viewport, sizing, dimensions) as f32;
        let origin = Vec2::new(
            sizing.sidebar_width(viewport) + sizing.padding,
            sizing.padding,
        );
        Self {
            origin,
            cell_size,
            dimensions,
        }
    }

    /// Total pixel extent of the grid.
    #[must_use]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            self.dimensions.columns() as f32 * self.cell_size,
            self.dimensions.rows() as f32 * self.cell_size,
        )
    }

    /// Top-left corner of the provided cell.
    #[must_use]
    pub fn cell_origin(&self, cell: Coordinate) -> Vec2 {
        self.origin
            + Vec2::new(
                cell.column() as f32 * self.cell_size,
                cell.row() as f32 * self.cell_size,
            )
    }

    /// Resolves the cell containing the provided screen position.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<Coordinate> {
        if self.cell_size <= f32::EPSILON {
            return None;
        }

        let local = (position - self.origin) / self.cell_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let cell = Coordinate::new(local.y.floor() as u32, local.x.floor() as u32);
        self.dimensions.contains(cell).then_some(cell)
    }
}

/// Row-major cell visuals for the grid area.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPresentation {
    /// Dimensions of the presented grid.
    pub dimensions: Dimensions,
    /// Visual state of each cell in row-major order.
    pub cells: Vec<CellVisual>,
}

impl GridPresentation {
    /// Creates an all-open grid presentation.
    #[must_use]
    pub fn open(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: vec![CellVisual::Open; dimensions.cell_count()],
        }
    }

    /// Iterates over every cell with its visual state.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, CellVisual)> + '_ {
        let columns = self.dimensions.columns() as usize;
        self.cells.iter().enumerate().map(move |(index, visual)| {
            let row = (index / columns) as u32;
            let column = (index % columns) as u32;
            (Coordinate::new(row, column), *visual)
        })
    }
}

/// Contents of the control panel shown beside the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlPanelView {
    /// Algorithm used for the next solve request.
    pub algorithm: Algorithm,
    /// Dimensions of the current grid.
    pub dimensions: Dimensions,
    /// Statistics presented to users.
    pub stats: DisplayStats,
    /// Lifecycle phase of the playback.
    pub phase: PlaybackPhase,
    /// Whether a solve request is in flight.
    pub solving: bool,
    /// Failure notice from the most recent solve attempt.
    pub notice: Option<String>,
}

impl ControlPanelView {
    /// Creates an idle control panel for the provided grid.
    #[must_use]
    pub fn new(algorithm: Algorithm, dimensions: Dimensions) -> Self {
        Self {
            algorithm,
            dimensions,
            stats: DisplayStats::default(),
            phase: PlaybackPhase::Idle,
            solving: false,
            notice: None,
        }
    }

    /// Text lines describing the statistics.
    #[must_use]
    pub fn stat_lines(&self) -> [String; 4] {
        [
            format!("Solved: {}", if self.stats.solved { "Yes" } else { "No" }),
            format!("Time: {:.3} ms", self.stats.time_ms),
            format!("Nodes expanded: {}", self.stats.nodes_expanded),
            format!("Path length: {}", self.stats.path_length),
        ]
    }
}

/// Scene description combining the grid and the control panel.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Cell visuals for the grid area.
    pub grid: GridPresentation,
    /// Control panel contents.
    pub panel: ControlPanelView,
    /// Colors used to paint cells.
    pub palette: Palette,
    /// Sizing rules for the grid area.
    pub sizing: CellSizing,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        grid: GridPresentation,
        panel: ControlPanelView,
        palette: Palette,
        sizing: CellSizing,
    ) -> Self {
        Self {
            grid,
            panel,
            palette,
            sizing,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Whether a new random grid was requested.
    pub regenerate: bool,
    /// Whether a solve request was triggered.
    pub solve: bool,
    /// Algorithm chosen from the control panel, if any.
    pub select_algorithm: Option<Algorithm>,
    /// Dimensions requested from the control panel, if any.
    pub resize: Option<Dimensions>,
    /// Cell clicked inside the grid, if any.
    pub toggle_cell: Option<Coordinate>,
    /// Whether the current layout should be exported.
    pub export_layout: bool,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting visualizer scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Error)]
pub enum RenderingError {
    /// The sidebar must leave part of the viewport for the grid.
    #[error("sidebar fraction must lie in [0, 1) (received {sidebar_fraction})")]
    InvalidSidebarFraction {
        /// Provided fraction that failed validation.
        sidebar_fraction: f32,
    },
    /// Padding must be a non-negative finite length.
    #[error("padding must be non-negative (received {padding})")]
    InvalidPadding {
        /// Provided padding that failed validation.
        padding: f32,
    },
    /// Cell size bounds must be positive and ordered.
    #[error("cell size bounds must satisfy 0 < min <= max (received {min}..={max})")]
    InvalidCellSizeRange {
        /// Provided lower bound.
        min: u32,
        /// Provided upper bound.
        max: u32,
    },
}
