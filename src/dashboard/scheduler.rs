//! Non-overlapping refresh cycles.

use std::{cell::Cell, future::Future};

use crate::prelude::*;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CycleState {
    #[default]
    Idle,

    Running,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trigger {
    /// The timer or the user asks for a refresh.
    Invoke,

    /// The running refresh has finished, successfully or not.
    Complete,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Start the refresh.
    Launch,

    /// Drop the invocation: it is neither queued nor does it cancel the running one.
    Skip,

    /// Back to idle.
    Settle,
}

#[must_use]
pub const fn transition(state: CycleState, trigger: Trigger) -> (CycleState, Action) {
    match (state, trigger) {
        (CycleState::Idle, Trigger::Invoke) => (CycleState::Running, Action::Launch),
        (CycleState::Running, Trigger::Invoke) => (CycleState::Running, Action::Skip),
        (_, Trigger::Complete) => (CycleState::Idle, Action::Settle),
    }
}

/// Guard allowing at most one in-flight run of a refresh cycle.
#[must_use]
pub struct SingleFlight {
    name: &'static str,
    state: Cell<CycleState>,
}

impl SingleFlight {
    pub const fn new(name: &'static str) -> Self {
        Self { name, state: Cell::new(CycleState::Idle) }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[cfg(test)]
    pub fn state(&self) -> CycleState {
        self.state.get()
    }

    fn fire(&self, trigger: Trigger) -> Action {
        let (state, action) = transition(self.state.get(), trigger);
        self.state.set(state);
        action
    }

    /// Drive the cycle unless another run is in flight, in which case the cycle is dropped unpolled.
    pub async fn run<T>(&self, cycle: impl Future<Output = T>) -> Option<T> {
        if self.fire(Trigger::Invoke) != Action::Launch {
            debug!(cycle = self.name, "still running, skipping");
            return None;
        }
        let _settle = Settle(self);
        Some(cycle.await)
    }
}

/// Settles the guard even if the cycle future gets dropped halfway.
struct Settle<'a>(&'a SingleFlight);

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.0.fire(Trigger::Complete);
    }
}
