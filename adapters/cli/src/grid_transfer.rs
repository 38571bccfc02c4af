//! Single-line transfer strings describing a grid layout.
//!
//! The format is `grid:v1:<rows>x<cols>:<payload>` where the payload is
//! unpadded base64 over a JSON document holding both endpoints and the wall
//! bitmap packed eight cells per byte in row-major order.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use gridpath_core::{Cell, Coordinate, Dimensions, EndpointPair, GridError, GridState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "grid";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "grid:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Grid walls plus endpoints, as exchanged through transfer strings.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GridLayout {
    /// Wall/open state of every cell.
    pub(crate) grid: GridState,
    /// Start and end cells.
    pub(crate) endpoints: EndpointPair,
}

impl GridLayout {
    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let dimensions = self.grid.dimensions();
        let payload = SerializableLayout {
            start: self.endpoints.start(),
            end: self.endpoints.end(),
            walls: pack_walls(self.grid.cells()),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_HEADER}:{}x{}:{encoded}",
            dimensions.rows(),
            dimensions.columns()
        ))
    }

    /// Decodes a layout from the provided string representation.
    ///
    /// Endpoints are validated against the decoded dimensions and forced open.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts
            .next()
            .ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let dimensions = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableLayout =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        let endpoints = EndpointPair::new(decoded.start, decoded.end);
        endpoints.validate(dimensions)?;

        let cells = unpack_walls(&decoded.walls, dimensions.cell_count())
            .ok_or(LayoutTransferError::WallCountMismatch)?;
        let mut grid =
            GridState::from_cells(dimensions, cells).ok_or(LayoutTransferError::WallCountMismatch)?;
        grid.set(endpoints.start(), Cell::Open);
        grid.set(endpoints.end(), Cell::Open);

        Ok(Self { grid, endpoints })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableLayout {
    start: Coordinate,
    end: Coordinate,
    walls: Vec<u8>,
}

/// Errors that can occur while decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded layout did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded layout.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The wall bitmap does not cover the declared dimensions.
    #[error("wall bitmap does not match the grid dimensions")]
    WallCountMismatch,
    /// The endpoints do not fit the declared dimensions.
    #[error(transparent)]
    Grid(#[from] GridError),
}

fn parse_dimensions(dimensions: &str) -> Result<Dimensions, LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (rows, columns) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;

    Dimensions::new(rows, columns).map_err(|_| invalid())
}

fn pack_walls(cells: &[Cell]) -> Vec<u8> {
    cells
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .filter(|(_, cell)| **cell == Cell::Wall)
                .fold(0_u8, |byte, (bit, _)| byte | (1 << bit))
        })
        .collect()
}

fn unpack_walls(bytes: &[u8], cell_count: usize) -> Option<Vec<Cell>> {
    if bytes.len() != cell_count.div_ceil(8) {
        return None;
    }

    Some(
        (0..cell_count)
            .map(|index| {
                let byte = bytes[index / 8];
                if byte & (1 << (index % 8)) == 0 {
                    Cell::Open
                } else {
                    Cell::Wall
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        let dimensions = Dimensions::new(3, 5).expect("valid dimensions");
        let mut grid = GridState::open(dimensions);
        for cell in [(0, 1), (1, 1), (1, 3), (2, 0)] {
            grid.set(Coordinate::new(cell.0, cell.1), Cell::Wall);
        }
        GridLayout {
            grid,
            endpoints: EndpointPair::corners(dimensions),
        }
    }

    #[test]
    fn encoded_layout_carries_rows_then_columns() {
        let encoded = layout().encode().expect("layout encodes");

        assert!(encoded.starts_with(&format!("{LAYOUT_HEADER}:3x5:")));
        assert!(!encoded.contains('\n'));
        assert_eq!(GridLayout::decode(&encoded).expect("decodes"), layout());
    }

    #[test]
    fn decode_forces_endpoints_open() {
        let dimensions = Dimensions::new(2, 2).expect("valid dimensions");
        let walled = GridState::from_cells(dimensions, vec![Cell::Wall; 4]).expect("cells");
        let encoded = GridLayout {
            grid: walled,
            endpoints: EndpointPair::corners(dimensions),
        }
        .encode()
        .expect("layout encodes");

        let decoded = GridLayout::decode(&encoded).expect("decodes");

        assert_eq!(decoded.grid.wall_count(), 2);
        assert_eq!(decoded.grid.cell(Coordinate::new(0, 0)), Some(Cell::Open));
    }

    #[test]
    fn decode_rejects_malformed_strings() {
        assert!(matches!(
            GridLayout::decode("   "),
            Err(LayoutTransferError::EmptyPayload)
        ));
        assert!(matches!(
            GridLayout::decode("tiles:v1:3x5:AAAA"),
            Err(LayoutTransferError::InvalidPrefix(_))
        ));
        assert!(matches!(
            GridLayout::decode("grid:v2:3x5:AAAA"),
            Err(LayoutTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            GridLayout::decode("grid:v1:0x5:AAAA"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            GridLayout::decode("grid:v1:3x5"),
            Err(LayoutTransferError::MissingPayload)
        ));
        assert!(matches!(
            GridLayout::decode("grid:v1:3x5:!!"),
            Err(LayoutTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn decode_rejects_mismatched_dimensions() {
        let encoded = layout().encode().expect("layout encodes");
        let resized = encoded.replacen(":3x5:", ":9x9:", 1);

        let error = GridLayout::decode(&resized).expect_err("bitmap is too short");

        assert!(matches!(error, LayoutTransferError::WallCountMismatch));
    }

    #[test]
    fn decode_rejects_out_of_bounds_endpoints() {
        let encoded = layout().encode().expect("layout encodes");
        let shrunk = encoded.replacen(":3x5:", ":2x5:", 1);

        let error = GridLayout::decode(&shrunk).expect_err("end lies outside");

        assert!(matches!(error, LayoutTransferError::Grid(_)));
    }
}
