//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use gridpath_core::{Algorithm, Dimensions, PlaybackPhase, RevealPhase};
use gridpath_rendering::ControlPanelView;
use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};

/// Number of rows or columns added or removed by a single resize button press.
pub(crate) const RESIZE_STEP: u32 = 5;

/// Outcome of rendering the control panel UI for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlPanelUiResult {
    /// Whether the "Redo Walls" button was pressed.
    pub regenerate: bool,
    /// Whether the "Solve" button was pressed.
    pub solve: bool,
    /// Algorithm whose button was pressed, if any.
    pub algorithm: Option<Algorithm>,
    /// Dimensions requested by a resize button, if any.
    pub resize: Option<Dimensions>,
}

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub background: Color,
    /// Settings and statistics displayed by the panel.
    pub panel: &'a ControlPanelView,
}

/// Renders the control panel's interactive elements for the current frame.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext<'_>,
) -> ControlPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .color_selected(Color::from_rgba(70, 70, 70, 255))
        .color_selected_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_inactive(Color::from_rgba(56, 56, 56, 200))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let panel = context.panel;
    let mut result = ControlPanelUiResult::default();
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        ui.label(None, "Settings");
        ui.label(None, &format!("Algorithm: {}", panel.algorithm));
        for algorithm in Algorithm::ALL {
            let label = if algorithm == panel.algorithm {
                format!("> {algorithm}")
            } else {
                algorithm.to_string()
            };
            if ui.button(None, label.as_str()) {
                result.algorithm = Some(algorithm);
            }
        }

        let rows = panel.dimensions.rows();
        let columns = panel.dimensions.columns();
        ui.label(None, &format!("Rows: {rows}  Columns: {columns}"));
        if ui.button(None, "Rows -5") {
            result.resize = resized(rows.saturating_sub(RESIZE_STEP), columns);
        }
        if ui.button(None, "Rows +5") {
            result.resize = resized(rows.saturating_add(RESIZE_STEP), columns);
        }
        if ui.button(None, "Cols -5") {
            result.resize = resized(rows, columns.saturating_sub(RESIZE_STEP));
        }
        if ui.button(None, "Cols +5") {
            result.resize = resized(rows, columns.saturating_add(RESIZE_STEP));
        }

        result.regenerate = ui.button(None, "Redo Walls");
        result.solve = ui.button(None, "Solve");

        ui.label(None, "Stats");
        for line in panel.stat_lines() {
            ui.label(None, line.as_str());
        }
        ui.label(None, status_line(panel));
        if let Some(notice) = &panel.notice {
            ui.label(None, notice.as_str());
        }
        ui.label(None, "R redo walls, Enter solve, 1-5 algorithm, L export");
    });

    ui.pop_skin();

    result
}

fn resized(rows: u32, columns: u32) -> Option<Dimensions> {
    Dimensions::new(rows.max(1), columns.max(1)).ok()
}

fn status_line(panel: &ControlPanelView) -> &'static str {
    if panel.solving {
        return "Status: solving...";
    }
    match panel.phase {
        PlaybackPhase::Idle => "Status: idle",
        PlaybackPhase::Playing(RevealPhase::Visited) => "Status: exploring",
        PlaybackPhase::Playing(RevealPhase::Path) => "Status: tracing path",
        PlaybackPhase::Complete => "Status: done",
    }
}
