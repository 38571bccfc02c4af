//! Wires the session to the generator, the playback scheduler and the solver.

use std::time::Duration;

use gridpath_core::{
    Algorithm, Cell, Command, Coordinate, Dimensions, DisplayStats, EndpointPair, Event,
    GridError, SolveFailure,
};
use gridpath_rendering::{CellVisual, ControlPanelView, FrameInput, GridPresentation, Scene};
use gridpath_solver_client::{PendingSolve, SolveLauncher, Transport};
use gridpath_system_grid_generation::GridGenerator;
use gridpath_system_playback::{Config as PlaybackConfig, Playback};
use gridpath_world::{self as world, query, Overlay, Session};
use tracing::{debug, info, warn};

use crate::grid_transfer::{GridLayout, LayoutTransferError};

/// Virtual frame length used when replaying a solve without a window.
const HEADLESS_STEP: Duration = Duration::from_millis(16);

/// Owns the session and every system that reacts to its events.
#[derive(Debug)]
pub(crate) struct Simulation<T> {
    session: Session,
    generator: GridGenerator,
    playback: Playback,
    launcher: SolveLauncher<T>,
    pending: Option<PendingSolve>,
}

impl<T> Simulation<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Creates a simulation holding an open grid; call [`Self::regenerate`] or
    /// [`Self::import_layout`] to install walls.
    pub(crate) fn new(
        dimensions: Dimensions,
        algorithm: Algorithm,
        generator: GridGenerator,
        playback: PlaybackConfig,
        launcher: SolveLauncher<T>,
    ) -> Self {
        Self {
            session: Session::new(dimensions, algorithm),
            generator,
            playback: Playback::new(playback),
            launcher,
            pending: None,
        }
    }

    /// Draws new walls for the current dimensions and endpoints.
    pub(crate) fn regenerate(&mut self) -> Result<(), GridError> {
        let dimensions = query::dimensions(&self.session);
        let endpoints = query::endpoints(&self.session);
        self.configure(dimensions, endpoints)
    }

    /// Changes the grid dimensions, moving the end to the new bottom-right corner.
    pub(crate) fn resize(&mut self, dimensions: Dimensions) -> Result<(), GridError> {
        let endpoints = query::endpoints(&self.session).relocated(dimensions);
        self.configure(dimensions, endpoints)
    }

    fn configure(
        &mut self,
        dimensions: Dimensions,
        endpoints: EndpointPair,
    ) -> Result<(), GridError> {
        let mut commands = Vec::new();
        self.generator.configure(dimensions, endpoints, &mut commands)?;
        for command in commands {
            self.dispatch(command);
        }
        Ok(())
    }

    /// Installs an imported layout.
    pub(crate) fn import_layout(&mut self, layout: GridLayout) {
        self.dispatch(Command::ConfigureGrid {
            grid: layout.grid,
            endpoints: layout.endpoints,
        });
    }

    /// Current layout as a transfer string.
    pub(crate) fn export_layout(&self) -> Result<String, LayoutTransferError> {
        GridLayout {
            grid: query::grid(&self.session).clone(),
            endpoints: query::endpoints(&self.session),
        }
        .encode()
    }

    /// Flips a cell between open and wall.
    pub(crate) fn toggle_wall(&mut self, cell: Coordinate) {
        self.dispatch(Command::ToggleWall { cell });
    }

    /// Selects the algorithm used by the next solve.
    pub(crate) fn select_algorithm(&mut self, algorithm: Algorithm) {
        self.dispatch(Command::SelectAlgorithm { algorithm });
    }

    /// Starts a solve unless one for the current epoch is already in flight.
    pub(crate) fn request_solve(&mut self) {
        let awaiting = query::awaiting_solve(&self.session);
        if let Some(pending) = &self.pending {
            if awaiting == Some(pending.epoch()) {
                debug!(epoch = %pending.epoch(), "solve already in flight");
                return;
            }
        }
        self.dispatch(Command::BeginSolve);
    }

    /// Delivers the solver outcome once it has arrived.
    pub(crate) fn poll_solve(&mut self) {
        let Some(command) = self.pending.as_ref().and_then(PendingSolve::poll) else {
            return;
        };
        self.pending = None;
        self.dispatch(command);
    }

    /// Advances the playback clock after collecting any solver outcome.
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.poll_solve();
        self.dispatch(Command::Tick { dt });
    }

    /// Applies the input gathered for one frame.
    ///
    /// Returns the exported layout when the frame requested one.
    pub(crate) fn handle_input(&mut self, input: FrameInput) -> Option<String> {
        if let Some(algorithm) = input.select_algorithm {
            self.select_algorithm(algorithm);
        }
        if let Some(dimensions) = input.resize {
            if let Err(error) = self.resize(dimensions) {
                warn!(%error, "resize rejected");
            }
        }
        if input.regenerate {
            if let Err(error) = self.regenerate() {
                warn!(%error, "regeneration rejected");
            }
        }
        if let Some(cell) = input.toggle_cell {
            self.toggle_wall(cell);
        }
        if input.solve {
            self.request_solve();
        }

        if !input.export_layout {
            return None;
        }
        match self.export_layout() {
            Ok(layout) => Some(layout),
            Err(error) => {
                warn!(%error, "failed to export layout");
                None
            }
        }
    }

    /// Runs a single solve to completion, replaying it on a virtual clock.
    pub(crate) fn solve_to_completion(&mut self) -> Result<DisplayStats, SolveFailure> {
        self.request_solve();
        if let Some(pending) = self.pending.take() {
            let command = pending.wait();
            self.dispatch(command);
        }

        if let Some(failure) = query::last_failure(&self.session) {
            return Err(failure.clone());
        }
        while self.playback.is_active() {
            self.dispatch(Command::Tick { dt: HEADLESS_STEP });
        }
        Ok(query::display_stats(&self.session))
    }

    /// Whether a solver call is outstanding.
    pub(crate) fn is_solving(&self) -> bool {
        self.pending.is_some()
    }

    /// Read access to the session.
    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Builds the cell visuals for the current session.
    pub(crate) fn grid_presentation(&self) -> GridPresentation {
        let mut presentation = GridPresentation::open(query::dimensions(&self.session));
        self.fill_presentation(&mut presentation);
        presentation
    }

    fn fill_presentation(&self, presentation: &mut GridPresentation) {
        let grid = query::grid(&self.session);
        let endpoints = query::endpoints(&self.session);
        let overlays = query::overlay_cells(&self.session);

        presentation.dimensions = grid.dimensions();
        presentation.cells.clear();
        presentation.cells.extend(
            grid.cells()
                .iter()
                .zip(overlays)
                .map(|(cell, overlay)| match (cell, overlay) {
                    (Cell::Wall, _) => CellVisual::Wall,
                    (Cell::Open, Overlay::Path) => CellVisual::Path,
                    (Cell::Open, Overlay::Visited) => CellVisual::Visited,
                    (Cell::Open, Overlay::None) => CellVisual::Open,
                }),
        );

        for (cell, visual) in [
            (endpoints.start(), CellVisual::Start),
            (endpoints.end(), CellVisual::End),
        ] {
            if let Some(slot) = grid
                .dimensions()
                .index(cell)
                .and_then(|index| presentation.cells.get_mut(index))
            {
                *slot = visual;
            }
        }
    }

    /// Copies the session state into the scene rendered this frame.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        self.fill_presentation(&mut scene.grid);

        let mut panel = ControlPanelView::new(
            query::algorithm(&self.session),
            query::dimensions(&self.session),
        );
        panel.stats = query::display_stats(&self.session);
        panel.phase = query::playback_phase(&self.session);
        panel.solving = self.is_solving();
        panel.notice = query::last_failure(&self.session).map(ToString::to_string);
        scene.panel = panel;
    }

    /// Plain-text rendering of the grid, one line per row.
    pub(crate) fn render_ascii(&self) -> String {
        let presentation = self.grid_presentation();
        let columns = presentation.dimensions.columns() as usize;
        let mut output = String::with_capacity(presentation.cells.len() + columns);
        for row in presentation.cells.chunks(columns) {
            output.extend(row.iter().map(|visual| match visual {
                CellVisual::Open => '.',
                CellVisual::Wall => '#',
                CellVisual::Visited => 'o',
                CellVisual::Path => '*',
                CellVisual::Start => 'S',
                CellVisual::End => 'E',
            }));
            output.push('\n');
        }
        output
    }

    fn dispatch(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.session, command, &mut events);

        while !events.is_empty() {
            self.observe(&events);

            let mut commands = Vec::new();
            self.playback.handle(&events, &mut commands);
            events.clear();
            for command in commands {
                world::apply(&mut self.session, command, &mut events);
            }
        }
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EpochAdvanced { epoch } => {
                    if let Some(pending) = self.pending.take() {
                        debug!(
                            abandoned = %pending.epoch(),
                            current = %epoch,
                            "abandoning superseded solve"
                        );
                    }
                }
                Event::SolveRequested { epoch, request } => {
                    info!(
                        %epoch,
                        algorithm = %request.algorithm,
                        dimensions = %request.grid.dimensions(),
                        "solve requested"
                    );
                    self.pending = Some(self.launcher.launch(*epoch, request.clone()));
                }
                Event::SolveAccepted {
                    epoch,
                    visited,
                    path,
                } => {
                    info!(%epoch, visited = visited.len(), path = path.len(), "playback started");
                }
                Event::SolveFailed { epoch, failure } => {
                    warn!(%epoch, %failure, "solve failed");
                }
                Event::SolveDiscarded { epoch } => {
                    debug!(%epoch, "stale solver outcome discarded");
                }
                Event::PlaybackCompleted { epoch } => {
                    info!(%epoch, "playback complete");
                }
                Event::GridRejected { error } => {
                    warn!(%error, "grid rejected");
                }
                Event::GridConfigured {
                    dimensions,
                    endpoints,
                } => {
                    debug!(
                        %dimensions,
                        start = %endpoints.start(),
                        end = %endpoints.end(),
                        "grid installed"
                    );
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use gridpath_core::{Coordinate, PlaybackPhase};
    use gridpath_rendering::{CellSizing, Palette};
    use gridpath_solver_client::{SolveError, SolvePipeline, SolverEndpoint, TransportResponse};
    use gridpath_system_grid_generation::Config as GeneratorConfig;

    use super::*;

    const RESPONSE: &str = r#"{
        "stats": {"solved": true, "time": 0.25, "nodesExpanded": 4, "pathLength": 5},
        "visited": [[0,0],[0,1],[1,1],[0,1]],
        "path": [[0,0],[0,1],[0,2],[1,2],[2,2]]
    }"#;

    #[derive(Debug)]
    struct StubTransport {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Transport for StubTransport {
        fn post_json(&self, _url: &str, _body: String) -> Result<TransportResponse, SolveError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(body) => Ok(TransportResponse {
                    status: 200,
                    body: body.to_owned(),
                }),
                None => Err(SolveError::Transport {
                    message: "connection refused".to_owned(),
                }),
            }
        }
    }

    fn dimensions(rows: u32, columns: u32) -> Dimensions {
        Dimensions::new(rows, columns).expect("valid dimensions")
    }

    fn simulation(reply: Option<&'static str>, rows: u32, columns: u32) -> Simulation<StubTransport> {
        let transport = StubTransport {
            reply,
            calls: AtomicUsize::new(0),
        };
        let launcher = SolveLauncher::new(SolvePipeline::new(
            transport,
            SolverEndpoint::new("http://solver.test"),
        ));
        let mut simulation = Simulation::new(
            dimensions(rows, columns),
            Algorithm::BreadthFirst,
            GridGenerator::new(GeneratorConfig::new(0.0, Some(1))),
            PlaybackConfig::default(),
            launcher,
        );
        simulation.regenerate().expect("grid generates");
        simulation
    }

    #[test]
    fn headless_solve_replays_the_full_result() {
        let mut simulation = simulation(Some(RESPONSE), 3, 3);

        let stats = simulation.solve_to_completion().expect("solve succeeds");

        assert!(stats.solved);
        assert_eq!(stats.nodes_expanded, 4);
        assert_eq!(stats.path_length, 5);
        assert_eq!(
            query::playback_phase(simulation.session()),
            PlaybackPhase::Complete
        );
        assert_eq!(simulation.render_ascii(), "S**\n.o*\n..E\n");
    }

    #[test]
    fn second_trigger_is_ignored_while_in_flight() {
        let mut simulation = simulation(Some(RESPONSE), 3, 3);

        simulation.request_solve();
        let epoch = query::epoch(simulation.session());
        simulation.request_solve();

        assert_eq!(query::epoch(simulation.session()), epoch);
        assert!(simulation.is_solving());
    }

    #[test]
    fn regeneration_abandons_the_outstanding_solve() {
        let mut simulation = simulation(Some(RESPONSE), 3, 3);

        simulation.request_solve();
        simulation.regenerate().expect("grid generates");
        simulation.advance(Duration::from_secs(1));

        assert!(!simulation.is_solving());
        assert_eq!(query::awaiting_solve(simulation.session()), None);
        assert!(query::revealed_visited(simulation.session()).is_empty());
        assert_eq!(
            query::playback_phase(simulation.session()),
            PlaybackPhase::Idle
        );
    }

    #[test]
    fn resize_moves_end_to_the_new_corner() {
        let mut simulation = simulation(Some(RESPONSE), 50, 50);

        simulation
            .resize(dimensions(30, 40))
            .expect("resize succeeds");

        let endpoints = query::endpoints(simulation.session());
        assert_eq!(endpoints.start(), Coordinate::new(0, 0));
        assert_eq!(endpoints.end(), Coordinate::new(29, 39));
        assert_eq!(simulation.grid_presentation().cells.len(), 1_200);
    }

    #[test]
    fn wall_edit_clears_completed_playback() {
        let mut simulation = simulation(Some(RESPONSE), 3, 3);
        let _ = simulation.solve_to_completion().expect("solve succeeds");

        simulation.toggle_wall(Coordinate::new(2, 0));

        assert_eq!(
            query::playback_phase(simulation.session()),
            PlaybackPhase::Idle
        );
        assert_eq!(simulation.render_ascii(), "S..\n...\n#.E\n");
    }

    #[test]
    fn failure_is_surfaced_in_the_panel() {
        let mut simulation = simulation(None, 3, 3);

        let failure = simulation.solve_to_completion().expect_err("solver is down");
        assert!(matches!(failure, SolveFailure::Transport { .. }));

        let mut scene = Scene::new(
            GridPresentation::open(dimensions(1, 1)),
            ControlPanelView::new(Algorithm::DepthFirst, dimensions(1, 1)),
            Palette::default(),
            CellSizing::default(),
        );
        simulation.populate_scene(&mut scene);

        assert_eq!(scene.grid.dimensions, dimensions(3, 3));
        assert_eq!(scene.panel.algorithm, Algorithm::BreadthFirst);
        assert!(!scene.panel.solving);
        assert!(scene
            .panel
            .notice
            .as_deref()
            .is_some_and(|notice| notice.contains("connection refused")));
    }

    #[test]
    fn frame_input_exports_the_current_layout() {
        let mut simulation = simulation(Some(RESPONSE), 4, 6);
        let input = FrameInput {
            select_algorithm: Some(Algorithm::AStar),
            toggle_cell: Some(Coordinate::new(1, 1)),
            export_layout: true,
            ..FrameInput::default()
        };

        let exported = simulation.handle_input(input).expect("layout exported");
        let layout = GridLayout::decode(&exported).expect("layout decodes");

        assert_eq!(query::algorithm(simulation.session()), Algorithm::AStar);
        assert_eq!(layout.grid, *query::grid(simulation.session()));

        let mut restored = simulation_with_layout(layout);
        assert_eq!(restored.render_ascii(), simulation.render_ascii());
        restored.toggle_wall(Coordinate::new(0, 0));
        assert_eq!(query::grid(restored.session()).wall_count(), 1);
    }

    fn simulation_with_layout(layout: GridLayout) -> Simulation<StubTransport> {
        let mut simulation = simulation(Some(RESPONSE), 1, 1);
        simulation.import_layout(layout);
        simulation
    }
}
