//! Solver boundary.
//!
//! The harness never decides where boxes go. It hands a [`SolveRequest`] to
//! an implementation of [`Solver`] and gets a [`Placement`] back. The call is
//! synchronous; [`solve_with_timeout`] bounds it with a wall-clock limit.

use crate::error::{Error, Result};
use crate::model::{Container, Instance};
use crate::placement::Placement;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Input handed to a solver: the container and the box dimensions in item
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub container: Container,
    pub dimensions: Vec<[u32; 3]>,
}

impl SolveRequest {
    /// Copies the box dimensions out of an instance.
    pub fn from_instance(instance: &Instance) -> Self {
        Self {
            container: instance.container,
            dimensions: instance.items.iter().map(|i| i.dimensions()).collect(),
        }
    }

    /// Number of boxes.
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Returns true if there are no boxes.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

/// Cooperative cancellation flag shared between the harness and a solver.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A container-loading solver.
///
/// Implementations should poll `cancel` during long searches and return
/// early once it is set; the harness has already given up on the result.
pub trait Solver: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Decides which boxes to pack and where.
    fn solve(&self, request: &SolveRequest, cancel: &CancelToken) -> Result<Placement>;
}

/// Runs `solver` on `request`, giving up after `limit`.
///
/// Without a limit the solver runs on the calling thread. With a limit it runs
/// on a worker thread; on expiry the cancel token is set and
/// [`Error::SolverTimeout`] is returned. A solver that ignores the token keeps
/// its worker thread busy until it finishes on its own. A panicking solver
/// yields [`Error::Solver`] on either path.
pub fn solve_with_timeout(
    solver: &Arc<dyn Solver>,
    request: &SolveRequest,
    limit: Option<Duration>,
) -> Result<Placement> {
    let Some(limit) = limit else {
        return panic::catch_unwind(AssertUnwindSafe(|| {
            solver.solve(request, &CancelToken::new())
        }))
        .unwrap_or_else(|_| {
            Err(Error::Solver(format!(
                "solver '{}' panicked",
                solver.name()
            )))
        });
    };

    let token = CancelToken::new();
    let (tx, rx) = mpsc::channel();
    let worker_solver = Arc::clone(solver);
    let worker_token = token.clone();
    let worker_request = request.clone();

    thread::Builder::new()
        .name(format!("solver-{}", solver.name()))
        .spawn(move || {
            let result = worker_solver.solve(&worker_request, &worker_token);
            // the receiver is gone if we already timed out
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            token.cancel();
            let limit_ms = limit.as_millis() as u64;
            log::warn!("solver '{}' exceeded {} ms", solver.name(), limit_ms);
            Err(Error::SolverTimeout { limit_ms })
        }
        Err(RecvTimeoutError::Disconnected) => Err(Error::Solver(format!(
            "solver '{}' stopped without a result",
            solver.name()
        ))),
    }
}
