use gridpath_core::{
    Algorithm, Cell, Command, Coordinate, Dimensions, EndpointPair, EndpointRole, Event,
    GridError,
};
use gridpath_system_grid_generation::{Config, GridGenerator};
use gridpath_world::{self as world, query, Session};

fn dimensions(rows: u32, columns: u32) -> Dimensions {
    Dimensions::new(rows, columns).expect("valid dimensions")
}

#[test]
fn endpoints_stay_open_across_seeds() {
    let dims = dimensions(50, 90);
    let endpoints = EndpointPair::corners(dims);

    for seed in 0..64 {
        let mut generator = GridGenerator::new(Config::new(0.95, Some(seed)));
        let grid = generator.generate(dims, endpoints).expect("grid");
        assert_eq!(grid.cell(endpoints.start()), Some(Cell::Open), "seed {seed}");
        assert_eq!(grid.cell(endpoints.end()), Some(Cell::Open), "seed {seed}");
        assert_eq!(grid.cells().len(), dims.cell_count());
    }
}

#[test]
fn same_seed_reproduces_layout() {
    let dims = dimensions(20, 30);
    let endpoints = EndpointPair::corners(dims);
    let mut first = GridGenerator::new(Config::new(0.3, Some(0x5eed)));
    let mut second = GridGenerator::new(Config::new(0.3, Some(0x5eed)));

    for _ in 0..3 {
        assert_eq!(
            first.generate(dims, endpoints).expect("grid"),
            second.generate(dims, endpoints).expect("grid")
        );
    }
}

#[test]
fn successive_draws_differ() {
    let dims = dimensions(20, 30);
    let endpoints = EndpointPair::corners(dims);
    let mut generator = GridGenerator::new(Config::new(0.5, Some(7)));

    let first = generator.generate(dims, endpoints).expect("grid");
    let second = generator.generate(dims, endpoints).expect("grid");

    assert_ne!(first, second);
}

#[test]
fn wall_density_tracks_probability() {
    let dims = dimensions(100, 100);
    let endpoints = EndpointPair::corners(dims);
    let mut generator = GridGenerator::new(Config::new(0.3, Some(42)));

    let grid = generator.generate(dims, endpoints).expect("grid");
    let density = grid.wall_count() as f64 / dims.cell_count() as f64;

    assert!((0.25..0.35).contains(&density), "density {density}");
}

#[test]
fn zero_probability_yields_open_grid() {
    let dims = dimensions(3, 3);
    let mut generator = GridGenerator::new(Config::new(0.0, Some(1)));

    let grid = generator
        .generate(dims, EndpointPair::corners(dims))
        .expect("grid");

    assert_eq!(grid.wall_count(), 0);
}

#[test]
fn out_of_bounds_endpoint_is_reported() {
    let dims = dimensions(4, 4);
    let endpoints = EndpointPair::new(Coordinate::new(0, 0), Coordinate::new(4, 0));
    let mut generator = GridGenerator::new(Config::new(0.3, Some(1)));

    let error = generator
        .generate(dims, endpoints)
        .expect_err("end lies outside the grid");

    assert_eq!(
        error,
        GridError::EndpointOutOfBounds {
            role: EndpointRole::End,
            cell: Coordinate::new(4, 0),
            dimensions: dims,
        }
    );
}

#[test]
fn configure_command_installs_grid_into_session() {
    let dims = dimensions(8, 12);
    let endpoints = EndpointPair::corners(dims);
    let mut generator = GridGenerator::new(Config::new(0.4, Some(99)));
    let mut session = Session::new(dimensions(2, 2), Algorithm::DepthFirst);
    let mut commands = Vec::new();
    let mut events = Vec::new();

    generator
        .configure(dims, endpoints, &mut commands)
        .expect("configure");
    for command in commands {
        world::apply(&mut session, command, &mut events);
    }

    assert_eq!(query::dimensions(&session), dims);
    assert_eq!(query::endpoints(&session), endpoints);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::GridConfigured { .. })));
}

#[test]
fn configure_emits_nothing_on_error() {
    let dims = dimensions(2, 2);
    let endpoints = EndpointPair::new(Coordinate::new(5, 5), Coordinate::new(1, 1));
    let mut generator = GridGenerator::new(Config::default());
    let mut commands: Vec<Command> = Vec::new();

    assert!(generator.configure(dims, endpoints, &mut commands).is_err());
    assert!(commands.is_empty());
}
