//! Dexopt session state machine
//!
//! Pure state: no locking, no I/O. The service wraps a [`Session`] in a
//! mutex and supplies the generation step as a closure.

use otadex_errors::{Error, SessionError};
use otadex_types::{DexoptCommand, Lifecycle, NextCommand, Package, SessionStatus};
use std::collections::VecDeque;

#[derive(Debug, Default)]
enum State {
    #[default]
    Uninitialized,
    Prepared {
        pending: VecDeque<Package>,
        /// Commands of the package being served; never present and empty
        current: Option<VecDeque<DexoptCommand>>,
        total: usize,
    },
}

/// One prepare -> iterate -> cleanup cycle
#[derive(Debug, Default)]
pub struct Session {
    state: State,
}

fn not_prepared(operation: &str) -> Error {
    SessionError::NotPrepared {
        operation: format!("{operation}()"),
    }
    .into()
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        match &self.state {
            State::Uninitialized => Lifecycle::Uninitialized,
            State::Prepared {
                pending, current, ..
            } => {
                if pending.is_empty() && current.is_none() {
                    Lifecycle::Exhausted
                } else {
                    Lifecycle::Active
                }
            }
        }
    }

    /// Capture the packages to work through
    ///
    /// `snapshot` only runs when the session is uninitialized.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPrepared` unless the session is uninitialized.
    pub fn prepare<F>(&mut self, snapshot: F) -> Result<usize, Error>
    where
        F: FnOnce() -> Vec<Package>,
    {
        if !matches!(self.state, State::Uninitialized) {
            return Err(SessionError::AlreadyPrepared.into());
        }

        let pending: VecDeque<Package> = snapshot().into();
        let total = pending.len();
        self.state = State::Prepared {
            pending,
            current: None,
            total,
        };
        Ok(total)
    }

    /// Drop all session state; safe to call at any time
    pub fn cleanup(&mut self) {
        self.state = State::Uninitialized;
    }

    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`.
    pub fn is_done(&self) -> Result<bool, Error> {
        match &self.state {
            State::Uninitialized => Err(not_prepared("is_done")),
            State::Prepared {
                pending, current, ..
            } => Ok(pending.is_empty() && current.is_none()),
        }
    }

    /// Fraction of packages fully completed
    ///
    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`.
    pub fn progress(&self) -> Result<f32, Error> {
        match &self.state {
            State::Uninitialized => Err(not_prepared("progress")),
            State::Prepared {
                pending,
                current,
                total,
            } => Ok(completion(*total, pending.len(), current.is_some())),
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let lifecycle = self.lifecycle();
        match &self.state {
            State::Uninitialized => SessionStatus {
                lifecycle,
                total_packages: 0,
                remaining_packages: 0,
                pending_commands: 0,
                progress: 0.0,
            },
            State::Prepared {
                pending,
                current,
                total,
            } => SessionStatus {
                lifecycle,
                total_packages: *total,
                remaining_packages: pending.len(),
                pending_commands: current.as_ref().map_or(0, VecDeque::len),
                progress: completion(*total, pending.len(), current.is_some()),
            },
        }
    }

    /// Hand out the next command, generating packages as needed
    ///
    /// `generate` receives the package just taken off the queue and the
    /// number of packages still behind it. Packages that yield no commands
    /// are passed over.
    ///
    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`, whatever `generate` fails
    /// with, or `InvariantViolation` (after resetting the session) if a
    /// command queue is left present but empty.
    pub fn next_command<F>(&mut self, mut generate: F) -> Result<NextCommand, Error>
    where
        F: FnMut(&Package, usize) -> Result<Vec<DexoptCommand>, Error>,
    {
        loop {
            let State::Prepared {
                pending, current, ..
            } = &mut self.state
            else {
                return Err(not_prepared("next_dexopt_command"));
            };

            if let Some(queue) = current {
                if let Some(command) = queue.pop_front() {
                    if queue.is_empty() {
                        *current = None;
                    }
                    return Ok(NextCommand::Command(command));
                }
            }

            let Some(package) = pending.pop_front() else {
                return Ok(NextCommand::NothingToDo);
            };

            let commands = generate(&package, pending.len())?;
            *current = if commands.is_empty() {
                None
            } else {
                Some(commands.into())
            };

            self.ensure_queue_not_empty(&package)?;
        }
    }

    /// Take the next package off the queue without generating it
    ///
    /// # Errors
    ///
    /// Returns `NotPrepared` before `prepare`.
    pub fn pop_package(&mut self, operation: &str) -> Result<Option<Package>, Error> {
        match &mut self.state {
            State::Uninitialized => Err(not_prepared(operation)),
            State::Prepared { pending, .. } => Ok(pending.pop_front()),
        }
    }

    /// Packages still waiting to be generated, or zero before `prepare`
    #[must_use]
    pub fn remaining_packages(&self) -> usize {
        match &self.state {
            State::Uninitialized => 0,
            State::Prepared { pending, .. } => pending.len(),
        }
    }

    fn ensure_queue_not_empty(&mut self, package: &Package) -> Result<(), Error> {
        let violated = matches!(
            &self.state,
            State::Prepared { current: Some(queue), .. } if queue.is_empty()
        );
        if violated {
            self.cleanup();
            return Err(SessionError::InvariantViolation {
                package: package.name.clone(),
            }
            .into());
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn completion(total: usize, pending: usize, serving: bool) -> f32 {
    if total == 0 {
        return 1.0;
    }
    let completed = total.saturating_sub(pending + usize::from(serving));
    completed as f32 / total as f32
}
