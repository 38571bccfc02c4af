#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the grid search visualizer.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the session executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams and respond
//! exclusively with new command batches.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs a freshly generated grid together with its endpoints.
    ///
    /// Used both when walls are regenerated and when grid dimensions change.
    ConfigureGrid {
        /// Occupancy matrix that becomes the single source of truth.
        grid: GridState,
        /// Start and end cells that must remain open.
        endpoints: EndpointPair,
    },
    /// Flips a single cell between open and wall.
    ToggleWall {
        /// Cell targeted by the edit.
        cell: Coordinate,
    },
    /// Changes the algorithm used for subsequent solve requests.
    SelectAlgorithm {
        /// Algorithm that should become active.
        algorithm: Algorithm,
    },
    /// Starts a new solve attempt for the current grid.
    BeginSolve,
    /// Delivers a validated solver response.
    CompleteSolve {
        /// Epoch captured when the request was issued.
        epoch: Epoch,
        /// Exploration order, final path and statistics returned by the solver.
        result: SolveResult,
    },
    /// Reports that a solve attempt failed before producing a result.
    FailSolve {
        /// Epoch captured when the request was issued.
        epoch: Epoch,
        /// Classification of the failure.
        failure: SolveFailure,
    },
    /// Advances the playback clock by the provided delta time.
    Tick {
        /// Duration of wall-clock time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Exposes the next cell of the visited sequence.
    RevealVisited {
        /// Epoch of the playback that scheduled the reveal.
        epoch: Epoch,
        /// Cell being revealed.
        cell: Coordinate,
    },
    /// Exposes the next cell of the path sequence.
    RevealPath {
        /// Epoch of the playback that scheduled the reveal.
        epoch: Epoch,
        /// Cell being revealed.
        cell: Coordinate,
    },
    /// Marks the playback scheduled under `epoch` as finished.
    CompletePlayback {
        /// Epoch of the playback that scheduled the completion.
        epoch: Epoch,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that every piece of work tagged with an older epoch is stale.
    EpochAdvanced {
        /// Epoch that became current.
        epoch: Epoch,
    },
    /// Confirms that a new grid was installed.
    GridConfigured {
        /// Dimensions of the installed grid.
        dimensions: Dimensions,
        /// Endpoints associated with the installed grid.
        endpoints: EndpointPair,
    },
    /// Reports that a grid installation was refused without mutating state.
    GridRejected {
        /// Reason the grid was refused.
        error: GridError,
    },
    /// Confirms that a cell changed state.
    WallToggled {
        /// Cell that was edited.
        cell: Coordinate,
        /// State of the cell after the edit.
        state: Cell,
    },
    /// Reports that a cell edit was refused.
    WallToggleRejected {
        /// Cell targeted by the refused edit.
        cell: Coordinate,
    },
    /// Confirms that a different algorithm is active.
    AlgorithmSelected {
        /// Algorithm that became active.
        algorithm: Algorithm,
    },
    /// Requests that adapters dispatch a solve call to the external solver.
    SolveRequested {
        /// Epoch the eventual response must carry to be accepted.
        epoch: Epoch,
        /// Payload describing the grid to solve.
        request: SolveRequest,
    },
    /// Confirms that a solver response was accepted and playback may begin.
    SolveAccepted {
        /// Epoch of the accepted playback.
        epoch: Epoch,
        /// Ordered exploration sequence to replay.
        visited: Vec<Coordinate>,
        /// Ordered path sequence to replay after the exploration.
        path: Vec<Coordinate>,
    },
    /// Reports that a response arrived for a superseded request.
    SolveDiscarded {
        /// Epoch carried by the discarded response.
        epoch: Epoch,
    },
    /// Reports that the current solve attempt failed.
    SolveFailed {
        /// Epoch of the failed request.
        epoch: Epoch,
        /// Classification of the failure.
        failure: SolveFailure,
    },
    /// Indicates that the playback clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a visited cell was revealed.
    VisitedRevealed {
        /// Cell that was revealed.
        cell: Coordinate,
        /// Number of visited reveals applied so far, including this one.
        count: usize,
    },
    /// Confirms that a path cell was revealed.
    PathRevealed {
        /// Cell that was revealed.
        cell: Coordinate,
        /// Number of path reveals applied so far, including this one.
        count: usize,
    },
    /// Reports that a reveal or completion carried a stale epoch and was ignored.
    RevealIgnored {
        /// Epoch carried by the stale command.
        epoch: Epoch,
    },
    /// Announces that playback for the current epoch finished.
    PlaybackCompleted {
        /// Epoch of the finished playback.
        epoch: Epoch,
    },
}

/// Monotonically increasing tag identifying a solve or regenerate attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
    /// Creates an epoch wrapper around the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the epoch.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the epoch that supersedes this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    row: u32,
    column: u32,
}

impl Coordinate {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Size of a rectangular grid measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    rows: u32,
    columns: u32,
}

impl Dimensions {
    /// Creates a validated dimension descriptor.
    ///
    /// Returns [`GridError::InvalidDimension`] when either axis is zero.
    pub fn new(rows: u32, columns: u32) -> Result<Self, GridError> {
        if rows == 0 || columns == 0 {
            return Err(GridError::InvalidDimension { rows, columns });
        }
        Ok(Self { rows, columns })
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.rows) * u64::from(self.columns);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: Coordinate) -> bool {
        cell.row < self.rows && cell.column < self.columns
    }

    /// Cell in the bottom-right corner of the grid.
    #[must_use]
    pub const fn bottom_right(&self) -> Coordinate {
        Coordinate::new(self.rows - 1, self.columns - 1)
    }

    /// Row-major index of the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: Coordinate) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row).ok()?;
        let column = usize::try_from(cell.column).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

/// Occupancy state of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Traversable cell.
    #[default]
    Open,
    /// Blocked cell.
    Wall,
}

impl Cell {
    /// Numeric encoding used by the solver contract (`0` open, `1` wall).
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Wall => 1,
        }
    }

    /// Returns the opposite cell state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Wall,
            Self::Wall => Self::Open,
        }
    }
}

/// Rectangular occupancy matrix stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    dimensions: Dimensions,
    cells: Vec<Cell>,
}

impl GridState {
    /// Creates a grid in which every cell is open.
    #[must_use]
    pub fn open(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: vec![Cell::Open; dimensions.cell_count()],
        }
    }

    /// Builds a grid from row-major cells.
    ///
    /// Returns `None` when the cell count does not match the dimensions.
    #[must_use]
    pub fn from_cells(dimensions: Dimensions, cells: Vec<Cell>) -> Option<Self> {
        if cells.len() != dimensions.cell_count() {
            return None;
        }
        Some(Self { dimensions, cells })
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// State of the provided cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn cell(&self, cell: Coordinate) -> Option<Cell> {
        self.dimensions
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Overwrites the provided cell. Coordinates outside the grid are ignored.
    pub fn set(&mut self, cell: Coordinate, state: Cell) {
        if let Some(slot) = self
            .dimensions
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
        {
            *slot = state;
        }
    }

    /// Row-major slice of every cell.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        let width = usize::try_from(self.dimensions.columns()).unwrap_or(usize::MAX);
        self.cells.chunks(width.max(1))
    }

    /// Number of cells currently marked as walls.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell == Cell::Wall).count()
    }
}

/// Start and end cells of a search.
///
/// `start != end` is not enforced; equal endpoints are forwarded to the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EndpointPair {
    start: Coordinate,
    end: Coordinate,
}

impl EndpointPair {
    /// Creates a new endpoint pair.
    #[must_use]
    pub const fn new(start: Coordinate, end: Coordinate) -> Self {
        Self { start, end }
    }

    /// Default endpoints: top-left start, bottom-right end.
    #[must_use]
    pub const fn corners(dimensions: Dimensions) -> Self {
        Self::new(Coordinate::new(0, 0), dimensions.bottom_right())
    }

    /// Cell where the search begins.
    #[must_use]
    pub const fn start(&self) -> Coordinate {
        self.start
    }

    /// Cell the search tries to reach.
    #[must_use]
    pub const fn end(&self) -> Coordinate {
        self.end
    }

    /// Reports whether the cell is one of the endpoints.
    #[must_use]
    pub fn contains(&self, cell: Coordinate) -> bool {
        self.start == cell || self.end == cell
    }

    /// Repositions the endpoints for a grid of new dimensions.
    ///
    /// The end moves to the new bottom-right corner; the start is clamped into
    /// the new bounds.
    #[must_use]
    pub fn relocated(self, dimensions: Dimensions) -> Self {
        let start = Coordinate::new(
            self.start.row().min(dimensions.rows() - 1),
            self.start.column().min(dimensions.columns() - 1),
        );
        Self::new(start, dimensions.bottom_right())
    }

    /// Checks that both endpoints lie inside the grid.
    pub fn validate(&self, dimensions: Dimensions) -> Result<(), GridError> {
        for (role, cell) in [(EndpointRole::Start, self.start), (EndpointRole::End, self.end)] {
            if !dimensions.contains(cell) {
                return Err(GridError::EndpointOutOfBounds {
                    role,
                    cell,
                    dimensions,
                });
            }
        }
        Ok(())
    }
}

/// Identifies which endpoint an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    /// The start cell.
    Start,
    /// The end cell.
    End,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

/// Errors raised when grid parameters are out of range.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Rows or columns were zero.
    #[error("grid dimensions must be positive (received {rows}x{columns})")]
    InvalidDimension {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
    /// An endpoint fell outside the grid.
    ///
    /// This is the endpoint case of the invalid-dimension class: the start or
    /// end does not fit the requested rows and columns. It is kept separate
    /// from [`GridError::InvalidDimension`] so callers can name the endpoint.
    #[error("{role} cell {cell} lies outside the {dimensions} grid")]
    EndpointOutOfBounds {
        /// Endpoint that failed validation.
        role: EndpointRole,
        /// Offending coordinate.
        cell: Coordinate,
        /// Dimensions the coordinate was checked against.
        dimensions: Dimensions,
    },
}

/// Search algorithms offered by the external solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Depth-first search.
    #[default]
    #[serde(rename = "DFS")]
    DepthFirst,
    /// Breadth-first search.
    #[serde(rename = "BFS")]
    BreadthFirst,
    /// Dijkstra's shortest path.
    #[serde(rename = "Dijkstra")]
    Dijkstra,
    /// A* with a grid heuristic.
    #[serde(rename = "A*")]
    AStar,
    /// Breadth-first search from both endpoints.
    #[serde(rename = "Bidirectional BFS")]
    BidirectionalBreadthFirst,
}

impl Algorithm {
    /// Every algorithm in presentation order.
    pub const ALL: [Algorithm; 5] = [
        Self::DepthFirst,
        Self::BreadthFirst,
        Self::Dijkstra,
        Self::AStar,
        Self::BidirectionalBreadthFirst,
    ];

    /// Name used by the solver contract and shown to users.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DepthFirst => "DFS",
            Self::BreadthFirst => "BFS",
            Self::Dijkstra => "Dijkstra",
            Self::AStar => "A*",
            Self::BidirectionalBreadthFirst => "Bidirectional BFS",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an algorithm name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown algorithm `{0}` (expected one of DFS, BFS, Dijkstra, A*, Bidirectional BFS)")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(trimmed))
            .or_else(|| match trimmed.to_ascii_lowercase().as_str() {
                "astar" | "a-star" => Some(Self::AStar),
                "bidirectional" | "bibfs" | "bi-bfs" => Some(Self::BidirectionalBreadthFirst),
                _ => None,
            })
            .ok_or_else(|| UnknownAlgorithm(trimmed.to_owned()))
    }
}

/// Payload handed to the external solver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveRequest {
    /// Algorithm the solver should run.
    pub algorithm: Algorithm,
    /// Snapshot of the grid at request time.
    pub grid: GridState,
    /// Start and end cells.
    pub endpoints: EndpointPair,
}

/// Summary statistics reported by the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolveStats {
    /// Whether a path from start to end exists.
    pub solved: bool,
    /// Time the solver spent searching, in milliseconds.
    pub time_ms: f64,
    /// Number of cells in the reported path.
    pub path_length: u32,
}

/// Validated solver response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolveResult {
    /// Summary statistics.
    pub stats: SolveStats,
    /// Exploration order; may contain duplicates.
    pub visited: Vec<Coordinate>,
    /// Final route from start to end; empty when unsolved.
    pub path: Vec<Coordinate>,
}

/// Classification of a failed solve attempt.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolveFailure {
    /// Network failure or non-success status.
    #[error("solver unreachable: {message}")]
    Transport {
        /// Human-readable description of the failure.
        message: String,
    },
    /// The response was missing required fields or had the wrong shape.
    #[error("solver returned an invalid response: {message}")]
    InvalidResponse {
        /// Human-readable description of the failure.
        message: String,
    },
}

/// Sequence currently being revealed by an active playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealPhase {
    /// Exploration order is being revealed.
    Visited,
    /// The final path is being revealed.
    Path,
}

/// Lifecycle of the playback controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackPhase {
    /// No playback has started for the current epoch.
    #[default]
    Idle,
    /// Reveals are being applied.
    Playing(RevealPhase),
    /// Every reveal of the playback was applied.
    Complete,
}

/// Statistics presented to users, combining solver stats with playback progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayStats {
    /// Whether the solver found a path.
    pub solved: bool,
    /// Solver time in milliseconds.
    pub time_ms: f64,
    /// Visited reveals applied so far; equals the visited length once complete.
    pub nodes_expanded: usize,
    /// Path length reported by the solver.
    pub path_length: u32,
}
