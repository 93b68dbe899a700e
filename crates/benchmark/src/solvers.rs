//! Reference solvers.
//!
//! [`RejectAllSolver`] is the baseline every harness run can use without any
//! packing code. [`CommandSolver`] bridges to a packing program written in any
//! language: the [`SolveRequest`] goes to its stdin as JSON and a
//! [`Placement`] is read back from its stdout.

use contload_core::{CancelToken, Error, Placement, Result, SolveRequest, Solver};
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

/// Interval between checks of the child process and the cancel token.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Packs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllSolver;

impl Solver for RejectAllSolver {
    fn name(&self) -> &str {
        "reject-all"
    }

    fn solve(&self, request: &SolveRequest, _cancel: &CancelToken) -> Result<Placement> {
        Ok(Placement::none(request.len()))
    }
}

/// Runs an external program as the solver.
#[derive(Debug, Clone)]
pub struct CommandSolver {
    program: String,
    args: Vec<String>,
    name: String,
}

impl CommandSolver {
    /// Creates a solver that runs `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = std::path::Path::new(&program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&program)
            .to_string();
        Self {
            program,
            args,
            name,
        }
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Solver for CommandSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, request: &SolveRequest, cancel: &CancelToken) -> Result<Placement> {
        let input = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Solver(format!("cannot start '{}': {}", self.program, e)))?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take())
        else {
            terminate(&mut child);
            return Err(Error::Solver("solver pipes not available".to_string()));
        };

        // Both pipes get their own thread so a large request cannot deadlock
        // against a large response.
        let writer = thread::spawn(move || stdin.write_all(&input));
        let reader = thread::spawn(move || {
            let mut output = Vec::new();
            stdout.read_to_end(&mut output).map(|_| output)
        });

        let status = loop {
            if cancel.is_cancelled() {
                terminate(&mut child);
                return Err(Error::Solver(format!("'{}' was cancelled", self.name)));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    terminate(&mut child);
                    return Err(e.into());
                }
            }
        };

        if let Ok(Err(e)) = writer.join() {
            // a program may exit without reading all of its input
            log::debug!("writing solver input failed: {}", e);
        }
        let output = reader
            .join()
            .map_err(|_| Error::Solver("solver output reader panicked".to_string()))??;

        if !status.success() {
            return Err(Error::Solver(format!(
                "'{}' exited with {}",
                self.name, status
            )));
        }

        serde_json::from_slice(&output)
            .map_err(|e| Error::Solver(format!("'{}' returned malformed placement: {}", self.name, e)))
    }
}

/// Kills and reaps a solver process.
fn terminate(child: &mut Child) {
    log::debug!("killing solver process {}", child.id());
    let _ = child.kill();
    let _ = child.wait();
}
