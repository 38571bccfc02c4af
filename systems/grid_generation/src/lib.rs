#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random wall placement for freshly configured grids.
//!
//! Each cell independently becomes a wall with the configured probability,
//! after which both endpoints are forced open. A seeded generator yields the
//! same layout for the same dimensions, endpoints and seed.

use gridpath_core::{Cell, Command, Dimensions, EndpointPair, GridError, GridState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Wall probability used when none is configured.
pub const DEFAULT_WALL_PROBABILITY: f64 = 0.3;

/// Configuration parameters required to construct the grid generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    wall_probability: f64,
    seed: Option<u64>,
}

impl Config {
    /// Creates a configuration, clamping the probability into `[0, 1]`.
    ///
    /// A non-finite probability falls back to [`DEFAULT_WALL_PROBABILITY`].
    #[must_use]
    pub fn new(wall_probability: f64, seed: Option<u64>) -> Self {
        Self {
            wall_probability: sanitize_probability(wall_probability),
            seed,
        }
    }

    /// Probability that any non-endpoint cell becomes a wall.
    #[must_use]
    pub const fn wall_probability(&self) -> f64 {
        self.wall_probability
    }

    /// Seed driving the generator, if the layout should be reproducible.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_WALL_PROBABILITY, None)
    }
}

/// Stateful generator producing successive random grids.
#[derive(Debug)]
pub struct GridGenerator {
    wall_probability: f64,
    rng: ChaCha8Rng,
}

impl GridGenerator {
    /// Creates a generator, seeding from entropy when no seed is configured.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            wall_probability: config.wall_probability,
            rng,
        }
    }

    /// Draws the next random grid for the provided dimensions and endpoints.
    pub fn generate(
        &mut self,
        dimensions: Dimensions,
        endpoints: EndpointPair,
    ) -> Result<GridState, GridError> {
        generate(dimensions, endpoints, self.wall_probability, &mut self.rng)
    }

    /// Draws a grid and emits the command installing it into the session.
    pub fn configure(
        &mut self,
        dimensions: Dimensions,
        endpoints: EndpointPair,
        out: &mut Vec<Command>,
    ) -> Result<(), GridError> {
        let grid = self.generate(dimensions, endpoints)?;
        debug!(
            %dimensions,
            walls = grid.wall_count(),
            "generated grid"
        );
        out.push(Command::ConfigureGrid { grid, endpoints });
        Ok(())
    }
}

/// Builds a grid where each cell is a wall with probability `wall_probability`.
///
/// Endpoints are validated before any randomness is consumed and are always
/// open in the returned grid.
pub fn generate<R: Rng + ?Sized>(
    dimensions: Dimensions,
    endpoints: EndpointPair,
    wall_probability: f64,
    rng: &mut R,
) -> Result<GridState, GridError> {
    endpoints.validate(dimensions)?;

    let probability = sanitize_probability(wall_probability);
    let cells = (0..dimensions.cell_count())
        .map(|_| {
            if rng.gen_bool(probability) {
                Cell::Wall
            } else {
                Cell::Open
            }
        })
        .collect();

    let Some(mut grid) = GridState::from_cells(dimensions, cells) else {
        return Err(GridError::InvalidDimension {
            rows: dimensions.rows(),
            columns: dimensions.columns(),
        });
    };
    grid.set(endpoints.start(), Cell::Open);
    grid.set(endpoints.end(), Cell::Open);
    Ok(grid)
}

fn sanitize_probability(wall_probability: f64) -> f64 {
    if wall_probability.is_finite() {
        wall_probability.clamp(0.0, 1.0)
    } else {
        DEFAULT_WALL_PROBABILITY
    }
}
