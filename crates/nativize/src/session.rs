//! Migration session
//!
//! Per-run bookkeeping. The entry list is append-only during the load
//! phase and sealed the moment mutation begins; counters live on the
//! session, never in globals, so concurrent sessions stay independent.

use std::fmt;

use editor_host::AssetHandle;

use crate::policy::MigrationEntry;

/// A policy entry paired with the handle the load phase resolved for it.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub entry: MigrationEntry,
    pub handle: Option<AssetHandle>,
}

/// Per-run counters. An asset can contribute to several counters (loaded,
/// then cleared, then reparented); `failed` counts failed operations, not
/// assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub loaded: usize,
    pub skipped: usize,
    pub cleared: usize,
    pub reparented: usize,
    pub saved: usize,
    pub compiled: usize,
    pub validated: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("session is sealed; entries cannot be added once mutation has begun")]
pub struct SessionSealed;

#[derive(Debug, Default)]
pub struct MigrationSession {
    entries: Vec<SessionEntry>,
    sealed: bool,
    pub counters: Counters,
    /// Assets whose implemented-interface set the clear phase emptied.
    /// Surfaced in the summary for human review.
    pub interface_removals: Vec<String>,
    /// Human-readable descriptions of failed operations.
    pub failures: Vec<String>,
}

impl MigrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: SessionEntry) -> Result<(), SessionSealed> {
        if self.sealed {
            return Err(SessionSealed);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Freeze the entry list. Called when the clear phase begins.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [SessionEntry] {
        &mut self.entries
    }

    pub fn record_failure(&mut self, description: impl Into<String>) {
        self.counters.failed += 1;
        self.failures.push(description.into());
    }

    pub fn report(&self) -> SummaryReport {
        SummaryReport {
            counters: self.counters,
            interface_removals: self.interface_removals.clone(),
            failures: self.failures.clone(),
        }
    }
}

/// Final run summary, rendered to the log and to stdout.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub counters: Counters,
    pub interface_removals: Vec<String>,
    pub failures: Vec<String>,
}

impl SummaryReport {
    /// A run is clean when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.counters.failed == 0
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== Migration summary ====")?;
        let c = &self.counters;
        writeln!(f, "  loaded:     {}", c.loaded)?;
        writeln!(f, "  cleared:    {}", c.cleared)?;
        writeln!(f, "  reparented: {}", c.reparented)?;
        writeln!(f, "  saved:      {}", c.saved)?;
        writeln!(f, "  compiled:   {}", c.compiled)?;
        writeln!(f, "  validated:  {}", c.validated)?;
        writeln!(f, "  skipped:    {}", c.skipped)?;
        writeln!(f, "  failed:     {}", c.failed)?;
        if !self.interface_removals.is_empty() {
            writeln!(f, "Interfaces removed (review these):")?;
            for name in &self.interface_removals {
                writeln!(f, "  - {}", name)?;
            }
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(f, "  - {}", failure)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Treatment;
    use editor_host::NativeTypeRef;

    fn entry(name: &str) -> SessionEntry {
        SessionEntry {
            entry: MigrationEntry {
                name: name.to_string(),
                target: Some(NativeTypeRef::parse("/Script/SLF.Thing").unwrap()),
                treatment: Treatment::Regular,
                load_rank: 4,
                group: "regular",
            },
            handle: None,
        }
    }

    #[test]
    fn sealed_session_rejects_new_entries() {
        let mut session = MigrationSession::new();
        session.push(entry("B_One")).unwrap();
        session.seal();
        assert!(session.push(entry("B_Two")).is_err());
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn summary_lists_interface_removals_and_failures() {
        let mut session = MigrationSession::new();
        session.interface_removals.push("B_Fireball".into());
        session.record_failure("B_Broken: reparent not confirmed");

        let text = session.report().to_string();
        assert!(text.contains("B_Fireball"));
        assert!(text.contains("B_Broken"));
        assert!(!session.report().is_clean());
    }
}
