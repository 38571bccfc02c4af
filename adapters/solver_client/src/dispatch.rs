//! Background execution of solve calls so the frame loop never blocks.

use std::{
    sync::{
        mpsc::{self, Receiver, TryRecvError},
        Arc,
    },
    thread,
};

use gridpath_core::{Command, Epoch, SolveFailure, SolveRequest, SolveResult};
use tracing::warn;

use crate::{SolveError, SolvePipeline, Transport};

type Outcome = Result<SolveResult, SolveError>;

/// Spawns solve calls on worker threads.
#[derive(Debug)]
pub struct SolveLauncher<T> {
    pipeline: Arc<SolvePipeline<T>>,
}

impl<T> Clone for SolveLauncher<T> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<T> SolveLauncher<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Wraps the pipeline so it can be shared with worker threads.
    #[must_use]
    pub fn new(pipeline: SolvePipeline<T>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Starts a solve call tagged with `epoch` and returns a handle to its outcome.
    ///
    /// Dropping the returned handle does not cancel the request: the worker
    /// stays blocked until the solver answers or the transport's request
    /// timeout expires, then discards the outcome. Each superseded solve can
    /// therefore hold one thread for up to that timeout.
    #[must_use]
    pub fn launch(&self, epoch: Epoch, request: SolveRequest) -> PendingSolve {
        let (sender, receiver) = mpsc::channel();
        let pipeline = Arc::clone(&self.pipeline);
        let spawned = thread::Builder::new()
            .name(format!("solve-{}", epoch.get()))
            .spawn(move || {
                let outcome = pipeline.solve(&request);
                // The receiver is gone when the session moved on; nothing to report.
                let _ = sender.send(outcome);
            });
        if let Err(error) = spawned {
            warn!(%error, %epoch, "failed to spawn solver worker");
        }

        PendingSolve { epoch, receiver }
    }

    /// Runs a solve call on the current thread.
    #[must_use]
    pub fn run_blocking(&self, epoch: Epoch, request: &SolveRequest) -> Command {
        into_command(epoch, self.pipeline.solve(request))
    }
}

/// Handle to an in-flight solve call.
#[derive(Debug)]
pub struct PendingSolve {
    epoch: Epoch,
    receiver: Receiver<Outcome>,
}

impl PendingSolve {
    /// Epoch the outcome will be tagged with.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Returns the command completing the call once the outcome has arrived.
    ///
    /// A worker that exits without reporting is treated as a transport failure.
    #[must_use]
    pub fn poll(&self) -> Option<Command> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(into_command(self.epoch, outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(worker_lost(self.epoch)),
        }
    }

    /// Blocks until the outcome arrives.
    #[must_use]
    pub fn wait(self) -> Command {
        match self.receiver.recv() {
            Ok(outcome) => into_command(self.epoch, outcome),
            Err(_) => worker_lost(self.epoch),
        }
    }
}

fn into_command(epoch: Epoch, outcome: Outcome) -> Command {
    match outcome {
        Ok(result) => Command::CompleteSolve { epoch, result },
        Err(error) => {
            warn!(%error, %epoch, "solve attempt failed");
            Command::FailSolve {
                epoch,
                failure: error.failure(),
            }
        }
    }
}

fn worker_lost(epoch: Epoch) -> Command {
    Command::FailSolve {
        epoch,
        failure: SolveFailure::Transport {
            message: "solver worker exited without a response".to_owned(),
        },
    }
}
