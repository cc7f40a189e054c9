//! Phase ordering
//!
//! The pipeline's safety rests on a strict phase order: every asset is
//! loaded before any asset is mutated, cleared before reparented, saved
//! before compiled. `PhaseGate` turns a violation into a typed error
//! instead of silent corruption.

use std::fmt;

/// The six pipeline phases, in execution order. Flush sits between Clear
/// and Reparent as a barrier, not a per-asset pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Load,
    Clear,
    Flush,
    Reparent,
    Save,
    Compile,
    Validate,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Load,
        Phase::Clear,
        Phase::Flush,
        Phase::Reparent,
        Phase::Save,
        Phase::Compile,
        Phase::Validate,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Load => "Load",
            Phase::Clear => "Clear",
            Phase::Flush => "Flush",
            Phase::Reparent => "Reparent",
            Phase::Save => "Save",
            Phase::Compile => "Compile",
            Phase::Validate => "Validate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("phase {got} started out of order; expected {expected}")]
pub struct PhaseOrderError {
    pub expected: Phase,
    pub got: Phase,
}

/// Enforces that phases start in declaration order, each exactly once.
#[derive(Debug, Default)]
pub struct PhaseGate {
    next: usize,
}

impl PhaseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, phase: Phase) -> Result<(), PhaseOrderError> {
        let expected = Phase::ALL[self.next.min(Phase::ALL.len() - 1)];
        if phase != expected || self.next >= Phase::ALL.len() {
            return Err(PhaseOrderError { expected, got: phase });
        }
        self.next += 1;
        Ok(())
    }
}
