//! Two-step confirmation gate for destructive clears
//!
//! The first `trigger` arms the gate; a second consecutive `trigger`
//! confirms and returns the gate to idle. `disarm` drops a pending
//! confirmation without deleting anything.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearState {
    #[default]
    Idle,
    Armed,
}

/// Result of triggering the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearStep {
    /// First trigger; nothing deleted, awaiting confirmation
    Armed,
    /// Second consecutive trigger; the caller must delete now
    Confirmed,
}

#[derive(Debug, Default)]
pub struct ClearGate {
    state: ClearState,
}

impl ClearGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClearState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == ClearState::Armed
    }

    pub fn trigger(&mut self) -> ClearStep {
        match self.state {
            ClearState::Idle => {
                self.state = ClearState::Armed;
                ClearStep::Armed
            }
            ClearState::Armed => {
                self.state = ClearState::Idle;
                ClearStep::Confirmed
            }
        }
    }

    pub fn disarm(&mut self) {
        if self.state == ClearState::Armed {
            tracing::debug!("Pending clear confirmation dropped");
        }
        self.state = ClearState::Idle;
    }
}
