//! The engine-level state machine.
//!
//! The engine is single-threaded but has two suspension points
//! (snapshot restore and image decode) during which re-entrant calls
//! must be refused. Rather than a pair of independently reset boolean
//! flags, the mode is one enum with checked transitions: an operation
//! requested in the wrong state is an error, never a silent flag reset.

use log::debug;

use crate::error::StateError;
use crate::ingest::TicketId;

/// What the engine is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Ready for any operation.
    Idle,
    /// Replaying a history snapshot; saves and re-entrant undo/redo are
    /// suppressed.
    Restoring,
    /// An upload batch holds the ticket; layer ordering and saves are
    /// deferred to batch end.
    Ingesting(TicketId),
}

impl EngineState {
    /// Lowercase state name for errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Restoring => "restoring",
            Self::Ingesting(_) => "ingesting",
        }
    }
}

/// Checked-transition wrapper around [`EngineState`].
#[derive(Debug)]
pub struct StateMachine {
    state: EngineState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// A machine in the `Idle` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EngineState::Idle,
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the engine is ready for any operation.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, EngineState::Idle)
    }

    /// The ticket of the in-flight upload batch, if any.
    #[must_use]
    pub const fn active_ticket(&self) -> Option<TicketId> {
        match self.state {
            EngineState::Ingesting(ticket) => Some(ticket),
            EngineState::Idle | EngineState::Restoring => None,
        }
    }

    /// Enter `Restoring`. Only valid from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the engine is not idle.
    pub fn begin_restore(&mut self) -> Result<(), StateError> {
        match self.state {
            EngineState::Idle => {
                debug!("state: idle -> restoring");
                self.state = EngineState::Restoring;
                Ok(())
            }
            other => Err(StateError {
                action: "begin a restore",
                state: other.name(),
            }),
        }
    }

    /// Leave `Restoring`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when no restore is in progress.
    pub fn finish_restore(&mut self) -> Result<(), StateError> {
        match self.state {
            EngineState::Restoring => {
                debug!("state: restoring -> idle");
                self.state = EngineState::Idle;
                Ok(())
            }
            other => Err(StateError {
                action: "finish a restore",
                state: other.name(),
            }),
        }
    }

    /// Enter `Ingesting` under the given ticket. Only valid from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the engine is not idle.
    pub fn begin_ingest(&mut self, ticket: TicketId) -> Result<(), StateError> {
        match self.state {
            EngineState::Idle => {
                debug!("state: idle -> ingesting under ticket {ticket}");
                self.state = EngineState::Ingesting(ticket);
                Ok(())
            }
            other => Err(StateError {
                action: "begin an ingest",
                state: other.name(),
            }),
        }
    }

    /// Leave `Ingesting`, checking the caller still holds the active
    /// ticket.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when no ingest is in progress or the
    /// ticket does not match the active one.
    pub fn finish_ingest(&mut self, ticket: TicketId) -> Result<(), StateError> {
        match self.state {
            EngineState::Ingesting(active) if active == ticket => {
                debug!("state: ingesting -> idle, ticket {ticket} retired");
                self.state = EngineState::Idle;
                Ok(())
            }
            other => Err(StateError {
                action: "finish an ingest",
                state: other.name(),
            }),
        }
    }
}
