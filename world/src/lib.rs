#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the grid search visualizer.
//!
//! The [`Session`] owns the grid, the endpoints, the active algorithm, the
//! playback overlay and the solver statistics. It is mutated exclusively by
//! [`apply`]. Every regeneration, edit or solve request advances the session
//! epoch; reveal commands tagged with any other epoch are ignored, so timers
//! scheduled for a superseded playback can never corrupt the current one.

use gridpath_core::{
    Algorithm, Cell, Command, Coordinate, Dimensions, EndpointPair, Epoch, Event, GridState,
    PlaybackPhase, RevealPhase, SolveFailure, SolveRequest, SolveStats,
};
use tracing::debug;

/// Represents the authoritative visualizer session.
#[derive(Debug)]
pub struct Session {
    grid: GridState,
    endpoints: EndpointPair,
    algorithm: Algorithm,
    epoch: Epoch,
    awaiting: Option<Epoch>,
    playback: PlaybackState,
    stats: SolveStats,
    failure: Option<SolveFailure>,
}

impl Session {
    /// Creates a session holding an all-open grid with corner endpoints.
    #[must_use]
    pub fn new(dimensions: Dimensions, algorithm: Algorithm) -> Self {
        Self {
            grid: GridState::open(dimensions),
            endpoints: EndpointPair::corners(dimensions),
            algorithm,
            epoch: Epoch::default(),
            awaiting: None,
            playback: PlaybackState::new(dimensions),
            stats: SolveStats::default(),
            failure: None,
        }
    }

    fn advance_epoch(&mut self, out_events: &mut Vec<Event>) -> Epoch {
        self.epoch = self.epoch.next();
        self.awaiting = None;
        out_events.push(Event::EpochAdvanced { epoch: self.epoch });
        self.epoch
    }

    fn reset_attempt(&mut self, out_events: &mut Vec<Event>) {
        let _ = self.advance_epoch(out_events);
        self.playback.reset(self.grid.dimensions());
        self.stats = SolveStats::default();
        self.failure = None;
    }

    fn open_endpoints(&mut self) {
        self.grid.set(self.endpoints.start(), Cell::Open);
        self.grid.set(self.endpoints.end(), Cell::Open);
    }

    fn accepts_reveal(&self, epoch: Epoch) -> bool {
        epoch == self.epoch && matches!(self.playback.phase, PlaybackPhase::Playing(_))
    }
}

/// Overlay applied on top of a cell by the playback controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Overlay {
    /// The cell has not been revealed.
    #[default]
    None,
    /// The cell was revealed as part of the visited sequence.
    Visited,
    /// The cell was revealed as part of the final path.
    Path,
}

#[derive(Debug)]
struct PlaybackState {
    phase: PlaybackPhase,
    visited: Vec<Coordinate>,
    path: Vec<Coordinate>,
    overlay: OverlayGrid,
}

impl PlaybackState {
    fn new(dimensions: Dimensions) -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            visited: Vec::new(),
            path: Vec::new(),
            overlay: OverlayGrid::new(dimensions),
        }
    }

    fn reset(&mut self, dimensions: Dimensions) {
        self.phase = PlaybackPhase::Idle;
        self.visited.clear();
        self.path.clear();
        if self.overlay.dimensions == dimensions {
            self.overlay.clear();
        } else {
            self.overlay = OverlayGrid::new(dimensions);
        }
    }
}

#[derive(Clone, Debug)]
struct OverlayGrid {
    dimensions: Dimensions,
    cells: Vec<Overlay>,
}

impl OverlayGrid {
    fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: vec![Overlay::None; dimensions.cell_count()],
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Overlay::None);
    }

    fn mark(&mut self, cell: Coordinate, overlay: Overlay) {
        let Some(slot) = self
            .dimensions
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
        else {
            return;
        };

        // Path membership takes precedence over exploration.
        if *slot != Overlay::Path {
            *slot = overlay;
        }
    }

    fn get(&self, cell: Coordinate) -> Overlay {
        self.dimensions
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { grid, endpoints } => {
            let dimensions = grid.dimensions();
            if let Err(error) = endpoints.validate(dimensions) {
                debug!(%error, "rejecting grid configuration");
                out_events.push(Event::GridRejected { error });
                return;
            }

            session.grid = grid;
            session.endpoints = endpoints;
            session.open_endpoints();
            session.reset_attempt(out_events);
            out_events.push(Event::GridConfigured {
                dimensions,
                endpoints,
            });
        }
        Command::ToggleWall { cell } => {
            let Some(current) = session.grid.cell(cell) else {
                out_events.push(Event::WallToggleRejected { cell });
                return;
            };
            if session.endpoints.contains(cell) {
                debug!(%cell, "endpoints cannot become walls");
                out_events.push(Event::WallToggleRejected { cell });
                return;
            }

            let state = current.toggled();
            session.grid.set(cell, state);
            session.reset_attempt(out_events);
            out_events.push(Event::WallToggled { cell, state });
        }
        Command::SelectAlgorithm { algorithm } => {
            session.algorithm = algorithm;
            out_events.push(Event::AlgorithmSelected { algorithm });
        }
        Command::BeginSolve => {
            // The revealed prefix and stats stay visible until a response is
            // accepted, so a failed attempt leaves them untouched.
            let epoch = session.advance_epoch(out_events);
            session.awaiting = Some(epoch);
            session.failure = None;
            session.playback.phase = PlaybackPhase::Idle;
            out_events.push(Event::SolveRequested {
                epoch,
                request: SolveRequest {
                    algorithm: session.algorithm,
                    grid: session.grid.clone(),
                    endpoints: session.endpoints,
                },
            });
        }
        Command::CompleteSolve { epoch, result } => {
            if session.awaiting != Some(epoch) {
                debug!(%epoch, current = %session.epoch, "discarding stale solver response");
                out_events.push(Event::SolveDiscarded { epoch });
                return;
            }

            session.awaiting = None;
            session.playback.reset(session.grid.dimensions());
            session.playback.phase = PlaybackPhase::Playing(RevealPhase::Visited);
            session.stats = result.stats;
            out_events.push(Event::SolveAccepted {
                epoch,
                visited: result.visited,
                path: result.path,
            });
        }
        Command::FailSolve { epoch, failure } => {
            if session.awaiting != Some(epoch) {
                out_events.push(Event::SolveDiscarded { epoch });
                return;
            }

            session.awaiting = None;
            session.failure = Some(failure.clone());
            out_events.push(Event::SolveFailed { epoch, failure });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::RevealVisited { epoch, cell } => {
            if !session.accepts_reveal(epoch) {
                out_events.push(Event::RevealIgnored { epoch });
                return;
            }

            session.playback.visited.push(cell);
            session.playback.overlay.mark(cell, Overlay::Visited);
            out_events.push(Event::VisitedRevealed {
                cell,
                count: session.playback.visited.len(),
            });
        }
        Command::RevealPath { epoch, cell } => {
            if !session.accepts_reveal(epoch) {
                out_events.push(Event::RevealIgnored { epoch });
                return;
            }

            session.playback.phase = PlaybackPhase::Playing(RevealPhase::Path);
            session.playback.path.push(cell);
            session.playback.overlay.mark(cell, Overlay::Path);
            out_events.push(Event::PathRevealed {
                cell,
                count: session.playback.path.len(),
            });
        }
        Command::CompletePlayback { epoch } => {
            if !session.accepts_reveal(epoch) {
                out_events.push(Event::RevealIgnored { epoch });
                return;
            }

            session.playback.phase = PlaybackPhase::Complete;
            out_events.push(Event::PlaybackCompleted { epoch });
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use gridpath_core::{
        Algorithm, Coordinate, Dimensions, DisplayStats, EndpointPair, Epoch, GridState,
        PlaybackPhase, SolveFailure,
    };

    use super::{Overlay, Session};

    /// Provides read-only access to the occupancy grid.
    #[must_use]
    pub fn grid(session: &Session) -> &GridState {
        &session.grid
    }

    /// Dimensions of the current grid.
    #[must_use]
    pub fn dimensions(session: &Session) -> Dimensions {
        session.grid.dimensions()
    }

    /// Start and end cells of the current grid.
    #[must_use]
    pub fn endpoints(session: &Session) -> EndpointPair {
        session.endpoints
    }

    /// Algorithm used for the next solve request.
    #[must_use]
    pub fn algorithm(session: &Session) -> Algorithm {
        session.algorithm
    }

    /// Epoch tagging the current attempt.
    #[must_use]
    pub fn epoch(session: &Session) -> Epoch {
        session.epoch
    }

    /// Epoch of the outstanding solve request, if any.
    #[must_use]
    pub fn awaiting_solve(session: &Session) -> Option<Epoch> {
        session.awaiting
    }

    /// Lifecycle phase of the playback controller.
    #[must_use]
    pub fn playback_phase(session: &Session) -> PlaybackPhase {
        session.playback.phase
    }

    /// Visited cells revealed so far, in reveal order.
    #[must_use]
    pub fn revealed_visited(session: &Session) -> &[Coordinate] {
        &session.playback.visited
    }

    /// Path cells revealed so far, in reveal order.
    #[must_use]
    pub fn revealed_path(session: &Session) -> &[Coordinate] {
        &session.playback.path
    }

    /// Overlay currently applied to the cell.
    #[must_use]
    pub fn overlay(session: &Session, cell: Coordinate) -> Overlay {
        session.playback.overlay.get(cell)
    }

    /// Row-major overlay of every cell.
    #[must_use]
    pub fn overlay_cells(session: &Session) -> &[Overlay] {
        &session.playback.overlay.cells
    }

    /// Failure reported by the most recent solve attempt, if any.
    #[must_use]
    pub fn last_failure(session: &Session) -> Option<&SolveFailure> {
        session.failure.as_ref()
    }

    /// Statistics presented to users.
    ///
    /// `nodes_expanded` follows the revealed count while playback runs.
    #[must_use]
    pub fn display_stats(session: &Session) -> DisplayStats {
        DisplayStats {
            solved: session.stats.solved,
            time_ms: session.stats.time_ms,
            nodes_expanded: session.playback.visited.len(),
            path_length: session.stats.path_length,
        }
    }
}
