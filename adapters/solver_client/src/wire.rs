//! JSON shapes exchanged with the solver service.

use gridpath_core::{Algorithm, Cell, Coordinate, Dimensions, SolveRequest, SolveResult, SolveStats};
use serde::{Deserialize, Serialize};

use crate::SolveError;

#[derive(Debug, Serialize)]
struct WireRequest {
    algorithm: Algorithm,
    grid: Vec<Vec<u8>>,
    start: WirePosition,
    end: WirePosition,
    rows: u32,
    cols: u32,
}

#[derive(Debug, Serialize)]
struct WirePosition {
    row: u32,
    col: u32,
}

impl From<Coordinate> for WirePosition {
    fn from(cell: Coordinate) -> Self {
        Self {
            row: cell.row(),
            col: cell.column(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    stats: WireStats,
    visited: Vec<(u32, u32)>,
    path: Vec<(u32, u32)>,
}

#[derive(Debug, Deserialize)]
struct WireStats {
    solved: bool,
    time: f64,
    #[serde(rename = "pathLength")]
    path_length: u32,
    #[serde(rename = "nodesExpanded", default)]
    nodes_expanded: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    detail: serde_json::Value,
}

/// Serializes a request into the body expected by the `/solve` endpoint.
///
/// Cells are encoded as `0` (open) and `1` (wall), row by row.
pub fn encode_request(request: &SolveRequest) -> Result<String, SolveError> {
    let dimensions = request.grid.dimensions();
    let wire = WireRequest {
        algorithm: request.algorithm,
        grid: request
            .grid
            .rows()
            .map(|row| row.iter().map(|cell| Cell::wire_value(*cell)).collect())
            .collect(),
        start: request.endpoints.start().into(),
        end: request.endpoints.end().into(),
        rows: dimensions.rows(),
        cols: dimensions.columns(),
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Validates a response body and converts it into a [`SolveResult`].
///
/// Every coordinate must lie inside `dimensions`; anything else is rejected so
/// playback can never reveal a cell that does not exist.
pub fn decode_response(body: &str, dimensions: Dimensions) -> Result<SolveResult, SolveError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|error| SolveError::InvalidResponse {
            message: error.to_string(),
        })?;

    if !wire.stats.time.is_finite() {
        return Err(SolveError::InvalidResponse {
            message: "`stats.time` must be a finite number".to_owned(),
        });
    }
    if let Some(nodes_expanded) = wire.stats.nodes_expanded {
        tracing::trace!(nodes_expanded, "solver reported expansion count");
    }

    Ok(SolveResult {
        stats: SolveStats {
            solved: wire.stats.solved,
            time_ms: wire.stats.time,
            path_length: wire.stats.path_length,
        },
        visited: coordinates("visited", wire.visited, dimensions)?,
        path: coordinates("path", wire.path, dimensions)?,
    })
}

/// Extracts the human-readable `detail` field of an error body, if present.
#[must_use]
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<WireErrorBody>(body) {
        Ok(WireErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(WireErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

fn coordinates(
    field: &str,
    pairs: Vec<(u32, u32)>,
    dimensions: Dimensions,
) -> Result<Vec<Coordinate>, SolveError> {
    pairs
        .into_iter()
        .enumerate()
        .map(|(index, (row, column))| {
            let cell = Coordinate::new(row, column);
            if dimensions.contains(cell) {
                Ok(cell)
            } else {
                Err(SolveError::InvalidResponse {
                    message: format!("`{field}[{index}]` {cell} lies outside the {dimensions} grid"),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpath_core::{EndpointPair, GridState};

    fn dimensions() -> Dimensions {
        Dimensions::new(2, 3).expect("valid dimensions")
    }

    #[test]
    fn request_uses_solver_field_names() {
        let dims = dimensions();
        let mut grid = GridState::open(dims);
        grid.set(Coordinate::new(0, 1), Cell::Wall);
        let request = SolveRequest {
            algorithm: Algorithm::BidirectionalBreadthFirst,
            grid,
            endpoints: EndpointPair::corners(dims),
        };

        let body = encode_request(&request).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&body).expect("json");

        assert_eq!(
            value,
            serde_json::json!({
                "algorithm": "Bidirectional BFS",
                "grid": [[0, 1, 0], [0, 0, 0]],
                "start": {"row": 0, "col": 0},
                "end": {"row": 1, "col": 2},
                "rows": 2,
                "cols": 3,
            })
        );
    }

    #[test]
    fn response_with_extra_fields_is_accepted() {
        let body = r#"{
            "stats": {"solved": true, "time": 3, "nodesExpanded": 4, "pathLength": 2},
            "visited": [[0, 0], [0, 1]],
            "path": [[0, 0], [1, 0]],
            "debug": "ignored"
        }"#;

        let result = decode_response(body, dimensions()).expect("valid response");

        assert!(result.stats.solved);
        assert_eq!(result.stats.time_ms, 3.0);
        assert_eq!(result.path, vec![Coordinate::new(0, 0), Coordinate::new(1, 0)]);
    }

    #[test]
    fn missing_path_is_invalid() {
        let body = r#"{"stats": {"solved": false, "time": 0.1, "pathLength": 0}, "visited": []}"#;

        let error = decode_response(body, dimensions()).expect_err("path is required");

        assert!(matches!(
            error,
            SolveError::InvalidResponse { ref message } if message.contains("path")
        ));
    }

    #[test]
    fn wrong_shapes_are_invalid() {
        let cases = [
            r#"{"stats": [], "visited": [], "path": []}"#,
            r#"{"stats": {"solved": "yes", "time": 1, "pathLength": 0}, "visited": [], "path": []}"#,
            r#"{"stats": {"solved": true, "time": 1, "pathLength": 0}, "visited": {}, "path": []}"#,
            r#"{"stats": {"solved": true, "time": 1, "pathLength": 0}, "visited": [[0]], "path": []}"#,
            r#"{"stats": {"solved": true, "time": 1, "pathLength": -1}, "visited": [], "path": []}"#,
            "not json",
        ];

        for body in cases {
            assert!(
                matches!(
                    decode_response(body, dimensions()),
                    Err(SolveError::InvalidResponse { .. })
                ),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn out_of_bounds_coordinates_are_invalid() {
        let body = r#"{"stats": {"solved": true, "time": 1, "pathLength": 1}, "visited": [[0, 0]], "path": [[2, 0]]}"#;

        let error = decode_response(body, dimensions()).expect_err("row 2 is outside");

        assert!(error.to_string().contains("path[0]"));
    }

    #[test]
    fn error_detail_prefers_detail_field() {
        assert_eq!(
            error_detail(r#"{"detail": "Start position is a wall"}"#),
            "Start position is a wall"
        );
        assert_eq!(error_detail("Bad Gateway\n"), "Bad Gateway");
    }
}
