#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Staggered playback of solver results.
//!
//! When a response is accepted the system schedules one reveal per visited
//! cell at `i * visited_delay`, then one reveal per path cell starting at
//! `N * visited_delay` and spaced by `path_delay`. Reveals are released as the
//! virtual clock advances, in nondecreasing due order with ties broken by
//! scheduling order. Every scheduled command carries the epoch of the
//! playback that produced it, and any epoch advance drops the whole queue.

use std::{collections::VecDeque, time::Duration};

use gridpath_core::{Command, Coordinate, Epoch, Event};

/// Delay between consecutive visited reveals when none is configured.
pub const DEFAULT_VISITED_DELAY: Duration = Duration::from_millis(5);

/// Delay between consecutive path reveals when none is configured.
pub const DEFAULT_PATH_DELAY: Duration = Duration::from_millis(10);

/// Configuration parameters required to construct the playback system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    visited_delay: Duration,
    path_delay: Duration,
}

impl Config {
    /// Creates a configuration using the provided per-step delays.
    #[must_use]
    pub const fn new(visited_delay: Duration, path_delay: Duration) -> Self {
        Self {
            visited_delay,
            path_delay,
        }
    }

    /// Delay between consecutive visited reveals.
    #[must_use]
    pub const fn visited_delay(&self) -> Duration {
        self.visited_delay
    }

    /// Delay between consecutive path reveals.
    #[must_use]
    pub const fn path_delay(&self) -> Duration {
        self.path_delay
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_VISITED_DELAY, DEFAULT_PATH_DELAY)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reveal {
    Visited(Coordinate),
    Path(Coordinate),
    Complete,
}

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    due: Duration,
    epoch: Epoch,
    reveal: Reveal,
}

impl Scheduled {
    fn command(self) -> Command {
        let epoch = self.epoch;
        match self.reveal {
            Reveal::Visited(cell) => Command::RevealVisited { epoch, cell },
            Reveal::Path(cell) => Command::RevealPath { epoch, cell },
            Reveal::Complete => Command::CompletePlayback { epoch },
        }
    }
}

/// Pure system that turns accepted solver responses into timed reveal commands.
#[derive(Debug)]
pub struct Playback {
    visited_delay: Duration,
    path_delay: Duration,
    clock: Duration,
    queue: VecDeque<Scheduled>,
}

impl Playback {
    /// Creates a new playback system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            visited_delay: config.visited_delay,
            path_delay: config.path_delay,
            clock: Duration::ZERO,
            queue: VecDeque::new(),
        }
    }

    /// Consumes events and emits the reveal commands that became due.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::EpochAdvanced { .. } => self.cancel(),
                Event::SolveAccepted {
                    epoch,
                    visited,
                    path,
                } => {
                    self.schedule(*epoch, visited, path);
                    self.release_due(out);
                }
                Event::TimeAdvanced { dt } => {
                    if self.queue.is_empty() {
                        continue;
                    }
                    self.clock = self.clock.saturating_add(*dt);
                    self.release_due(out);
                }
                _ => {}
            }
        }
    }

    /// Reports whether reveals are still waiting to be released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of scheduled commands that have not been released yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Virtual time elapsed since the current playback started.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.clock
    }

    fn cancel(&mut self) {
        self.queue.clear();
        self.clock = Duration::ZERO;
    }

    fn schedule(&mut self, epoch: Epoch, visited: &[Coordinate], path: &[Coordinate]) {
        self.cancel();

        let mut last_due = Duration::ZERO;
        for (index, cell) in visited.iter().enumerate() {
            last_due = step(self.visited_delay, index);
            self.queue.push_back(Scheduled {
                due: last_due,
                epoch,
                reveal: Reveal::Visited(*cell),
            });
        }

        let path_start = step(self.visited_delay, visited.len());
        for (index, cell) in path.iter().enumerate() {
            last_due = path_start.saturating_add(step(self.path_delay, index));
            self.queue.push_back(Scheduled {
                due: last_due,
                epoch,
                reveal: Reveal::Path(*cell),
            });
        }

        self.queue.push_back(Scheduled {
            due: last_due,
            epoch,
            reveal: Reveal::Complete,
        });
    }

    fn release_due(&mut self, out: &mut Vec<Command>) {
        while let Some(next) = self.queue.front() {
            if next.due > self.clock {
                break;
            }
            if let Some(scheduled) = self.queue.pop_front() {
                out.push(scheduled.command());
            }
        }
    }
}

fn step(delay: Duration, index: usize) -> Duration {
    delay.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}
