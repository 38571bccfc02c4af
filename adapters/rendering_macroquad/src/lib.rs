#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the grid search visualizer.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module for the control
//! panel. All UI-specific calls live inside the local `ui` module to avoid
//! leaking Macroquad UI types throughout the renderer.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelUiResult};
use anyhow::Result;
use glam::Vec2;
use gridpath_core::{Algorithm, Dimensions};
use gridpath_rendering::{
    CellSizeTracker, Color, FrameInput, GridMetrics, Presentation, RenderingBackend, Scene,
    Viewport,
};
use macroquad::{
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
    math::Vec2 as MacroquadVec2,
};
use std::time::Duration;
use tracing::debug;

/// Background of the control panel.
const PANEL_BACKGROUND: Color = Color::from_rgb_u8(0x26, 0x26, 0x26);

/// Gap left between neighbouring cells once they are large enough to show it.
const CELL_GAP: f32 = 1.0;

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    regenerate_latched: bool,
    solve_latched: bool,
    algorithm_latched: Option<Algorithm>,
    resize_latched: Option<Dimensions>,
}

impl ControlPanelInputState {
    /// Returns whether the UI requested new walls and clears the latch so the
    /// action fires only once.
    pub fn take_regenerate(&mut self) -> bool {
        let latched = self.regenerate_latched;
        self.regenerate_latched = false;
        latched
    }

    /// Records that the control-panel button requested new walls this frame.
    pub fn register_regenerate(&mut self) {
        self.regenerate_latched = true;
    }

    /// Returns whether the UI requested a solve and clears the latch.
    pub fn take_solve(&mut self) -> bool {
        let latched = self.solve_latched;
        self.solve_latched = false;
        latched
    }

    /// Records that the control-panel button requested a solve this frame.
    pub fn register_solve(&mut self) {
        self.solve_latched = true;
    }

    /// Returns the latched algorithm choice, clearing it so the action fires once.
    pub fn take_algorithm(&mut self) -> Option<Algorithm> {
        self.algorithm_latched.take()
    }

    /// Records that an algorithm button was pressed this frame.
    pub fn register_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm_latched = Some(algorithm);
    }

    /// Returns the latched resize request, clearing it so the action fires once.
    pub fn take_resize(&mut self) -> Option<Dimensions> {
        self.resize_latched.take()
    }

    /// Records that a resize button was pressed this frame.
    pub fn register_resize(&mut self, dimensions: Dimensions) {
        self.resize_latched = Some(dimensions);
    }

    fn register(&mut self, result: ControlPanelUiResult) {
        if result.regenerate {
            self.register_regenerate();
        }
        if result.solve {
            self.register_solve();
        }
        if let Some(algorithm) = result.algorithm {
            self.register_algorithm(algorithm);
        }
        if let Some(dimensions) = result.resize {
            self.register_resize(dimensions);
        }
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the loop.
    quit_requested: bool,
    /// `R` regenerates the walls.
    regenerate: bool,
    /// `Enter` or `Space` requests a solve.
    solve: bool,
    /// `1`-`5` select an algorithm.
    algorithm: Option<Algorithm>,
    /// `L` prints the current layout.
    export_layout: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let regenerate = is_key_pressed(KeyCode::R);
        let solve = is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Space);
        let algorithm = [
            KeyCode::Key1,
            KeyCode::Key2,
            KeyCode::Key3,
            KeyCode::Key4,
            KeyCode::Key5,
        ]
        .into_iter()
        .zip(Algorithm::ALL)
        .find_map(|(key, algorithm)| is_key_pressed(key).then_some(algorithm));
        let export_layout = is_key_pressed(KeyCode::L);

        Self {
            quit_requested,
            regenerate,
            solve,
            algorithm,
            export_layout,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    window_width: i32,
    window_height: i32,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            window_width: 1280,
            window_height: 800,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures the initial window size in pixels.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = i32::try_from(width).unwrap_or(i32::MAX);
        self.window_height = i32::try_from(height).unwrap_or(i32::MAX);
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            window_width,
            window_height,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            window_resizable: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut control_panel_input = ControlPanelInputState::default();
            let mut cell_size_tracker = CellSizeTracker::new();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let viewport = Viewport::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let metrics_before =
                    GridMetrics::layout(viewport, &scene.sizing, scene.grid.dimensions);
                let frame_input =
                    gather_frame_input(&metrics_before, &mut control_panel_input, keyboard);

                update_scene(frame_dt, frame_input, &mut scene);

                let (cell_size, changed) =
                    cell_size_tracker.update(viewport, &scene.sizing, scene.grid.dimensions);
                if changed {
                    debug!(
                        cell_size,
                        width = viewport.width,
                        height = viewport.height,
                        dimensions = %scene.grid.dimensions,
                        "cell size recomputed"
                    );
                }

                let metrics = GridMetrics::layout(viewport, &scene.sizing, scene.grid.dimensions);
                draw_grid(&scene, &metrics);

                let panel_context = draw_control_panel(&scene, viewport);
                let mut control_panel_ui = macroquad::ui::root_ui();
                let result = draw_control_panel_ui(&mut control_panel_ui, panel_context);
                control_panel_input.register(result);

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input(
    metrics: &GridMetrics,
    control_panel_input: &mut ControlPanelInputState,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let click = is_mouse_button_pressed(MouseButton::Left);
    gather_frame_input_from_observations(
        metrics,
        control_panel_input,
        keyboard,
        Vec2::new(cursor_x, cursor_y),
        click,
    )
}

fn gather_frame_input_from_observations(
    metrics: &GridMetrics,
    control_panel_input: &mut ControlPanelInputState,
    keyboard: KeyboardShortcuts,
    cursor_position: Vec2,
    click: bool,
) -> FrameInput {
    let select_algorithm = control_panel_input.take_algorithm().or(keyboard.algorithm);
    let toggle_cell = if click {
        metrics.cell_at(cursor_position)
    } else {
        None
    };

    FrameInput {
        regenerate: control_panel_input.take_regenerate() || keyboard.regenerate,
        solve: control_panel_input.take_solve() || keyboard.solve,
        select_algorithm,
        resize: control_panel_input.take_resize(),
        toggle_cell,
        export_layout: keyboard.export_layout,
    }
}

fn draw_grid(scene: &Scene, metrics: &GridMetrics) {
    if scene.grid.dimensions != metrics.dimensions {
        return;
    }

    let extent = metrics.extent();
    macroquad::shapes::draw_rectangle(
        metrics.origin.x,
        metrics.origin.y,
        extent.x,
        extent.y,
        to_macroquad_color(scene.palette.grid_line),
    );

    let gap = if metrics.cell_size > 4.0 * CELL_GAP {
        CELL_GAP
    } else {
        0.0
    };
    let side = (metrics.cell_size - gap).max(1.0);
    for (cell, visual) in scene.grid.iter() {
        let origin = metrics.cell_origin(cell);
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            side,
            side,
            to_macroquad_color(scene.palette.fill(visual)),
        );
    }
}

fn draw_control_panel(scene: &Scene, viewport: Viewport) -> ControlPanelUiContext<'_> {
    let width = scene.sizing.sidebar_width(viewport);
    let background = to_macroquad_color(PANEL_BACKGROUND);
    macroquad::shapes::draw_rectangle(0.0, 0.0, width, viewport.height, background);

    ControlPanelUiContext {
        origin: MacroquadVec2::new(0.0, 0.0),
        size: MacroquadVec2::new(width, viewport.height),
        background,
        panel: &scene.panel,
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpath_core::Coordinate;
    use gridpath_rendering::CellSizing;

    fn metrics() -> GridMetrics {
        GridMetrics::layout(
            Viewport::new(800.0, 600.0),
            &CellSizing::default(),
            Dimensions::new(10, 10).expect("valid dimensions"),
        )
    }

    #[test]
    fn click_inside_grid_toggles_cell() {
        let metrics = metrics();
        let mut input_state = ControlPanelInputState::default();
        let cursor = metrics.cell_origin(Coordinate::new(3, 4)) + Vec2::splat(0.5);

        let input = gather_frame_input_from_observations(
            &metrics,
            &mut input_state,
            KeyboardShortcuts::default(),
            cursor,
            true,
        );

        assert_eq!(input.toggle_cell, Some(Coordinate::new(3, 4)));
    }

    #[test]
    fn click_over_sidebar_is_ignored() {
        let metrics = metrics();
        let mut input_state = ControlPanelInputState::default();

        let input = gather_frame_input_from_observations(
            &metrics,
            &mut input_state,
            KeyboardShortcuts::default(),
            Vec2::new(10.0, 10.0),
            true,
        );

        assert!(input.toggle_cell.is_none());
    }

    #[test]
    fn latched_buttons_merge_with_keyboard() {
        let metrics = metrics();
        let mut input_state = ControlPanelInputState::default();
        input_state.register_algorithm(Algorithm::Dijkstra);
        input_state.register_regenerate();
        let keyboard = KeyboardShortcuts {
            solve: true,
            algorithm: Some(Algorithm::AStar),
            ..KeyboardShortcuts::default()
        };

        let input = gather_frame_input_from_observations(
            &metrics,
            &mut input_state,
            keyboard,
            Vec2::ZERO,
            false,
        );

        assert!(input.regenerate);
        assert!(input.solve);
        assert_eq!(input.select_algorithm, Some(Algorithm::Dijkstra));
        assert!(!input_state.take_regenerate());
    }

    #[test]
    fn ui_result_registers_every_latch() {
        let mut input_state = ControlPanelInputState::default();
        let resize = Dimensions::new(15, 20).expect("valid dimensions");

        input_state.register(ControlPanelUiResult {
            regenerate: false,
            solve: true,
            algorithm: None,
            resize: Some(resize),
        });

        assert!(input_state.take_solve());
        assert_eq!(input_state.take_resize(), Some(resize));
        assert!(!input_state.take_regenerate());
        assert!(input_state.take_algorithm().is_none());
    }
}
