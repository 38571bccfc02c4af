use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use gridpath_core::{
    Algorithm, Command, Coordinate, Dimensions, EndpointPair, Epoch, Event, GridState,
    PlaybackPhase, SolveResult, SolveStats,
};
use gridpath_system_playback::{Config, Playback};
use gridpath_world::{self as world, query, Session};

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.phase, format!("{:?}", PlaybackPhase::Complete));
    assert_eq!(first.visited.len(), 4);
    assert_eq!(first.path.len(), 3);
}

fn replay(script: Vec<Step>) -> ReplayOutcome {
    let dimensions = Dimensions::new(6, 6).expect("valid dimensions");
    let mut session = Session::new(dimensions, Algorithm::AStar);
    let mut playback = Playback::new(Config::new(
        Duration::from_millis(3),
        Duration::from_millis(7),
    ));
    let mut log = Vec::new();

    for step in script {
        let command = match step {
            Step::Apply(command) => command,
            Step::CompleteCurrent(result) => Command::CompleteSolve {
                epoch: query::epoch(&session),
                result,
            },
        };
        let mut events = Vec::new();
        world::apply(&mut session, command, &mut events);
        record_events(&events, &mut log);
        process_playback(&mut session, &mut playback, events, &mut log);
    }

    ReplayOutcome {
        visited: query::revealed_visited(&session).to_vec(),
        path: query::revealed_path(&session).to_vec(),
        phase: format!("{:?}", query::playback_phase(&session)),
        events: log,
    }
}

fn process_playback(
    session: &mut Session,
    playback: &mut Playback,
    pending_events: Vec<Event>,
    log: &mut Vec<String>,
) {
    let mut events = pending_events;

    loop {
        if events.is_empty() {
            break;
        }

        let mut commands = Vec::new();
        playback.handle(&events, &mut commands);

        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            let mut generated_events = Vec::new();
            world::apply(session, command, &mut generated_events);
            record_events(&generated_events, log);
            events.extend(generated_events);
        }
    }
}

fn record_events(events: &[Event], log: &mut Vec<String>) {
    log.extend(events.iter().map(|event| format!("{event:?}")));
}

enum Step {
    Apply(Command),
    CompleteCurrent(SolveResult),
}

fn tick(millis: u64) -> Step {
    Step::Apply(Command::Tick {
        dt: Duration::from_millis(millis),
    })
}

fn scripted_commands() -> Vec<Step> {
    let dimensions = Dimensions::new(6, 6).expect("valid dimensions");
    let abandoned = SolveResult {
        stats: SolveStats {
            solved: false,
            time_ms: 0.4,
            path_length: 0,
        },
        visited: vec![Coordinate::new(0, 0), Coordinate::new(1, 0)],
        path: Vec::new(),
    };
    let settled = SolveResult {
        stats: SolveStats {
            solved: true,
            time_ms: 2.25,
            path_length: 3,
        },
        visited: vec![
            Coordinate::new(0, 0),
            Coordinate::new(0, 1),
            Coordinate::new(1, 1),
            Coordinate::new(0, 1),
        ],
        path: vec![
            Coordinate::new(0, 0),
            Coordinate::new(0, 1),
            Coordinate::new(1, 1),
        ],
    };

    vec![
        Step::Apply(Command::ConfigureGrid {
            grid: GridState::open(dimensions),
            endpoints: EndpointPair::new(Coordinate::new(0, 0), Coordinate::new(1, 1)),
        }),
        Step::Apply(Command::BeginSolve),
        Step::CompleteCurrent(abandoned),
        tick(2),
        Step::Apply(Command::ToggleWall {
            cell: Coordinate::new(3, 3),
        }),
        tick(50),
        Step::Apply(Command::RevealVisited {
            epoch: Epoch::new(2),
            cell: Coordinate::new(1, 0),
        }),
        Step::Apply(Command::BeginSolve),
        Step::CompleteCurrent(settled),
        tick(4),
        tick(4),
        tick(4),
        tick(16),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    visited: Vec<Coordinate>,
    path: Vec<Coordinate>,
    phase: String,
    events: Vec<String>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
