//! Phase orchestrator
//!
//! Drives a migration session through the fixed phase order: load every
//! asset, clear graph logic, flush the host, reparent, save, compile the
//! keep-variables subset, validate. Per-asset host failures are logged and
//! counted; the run always completes and renders a summary.

use std::thread;
use std::time::Duration;

use editor_host::{EditorHost, PropertyValue};
use tracing::{info, warn};

use crate::extract::ExtractionCache;
use crate::ops::MutationOps;
use crate::patches;
use crate::phase::{Phase, PhaseGate, PhaseOrderError};
use crate::policy::{PolicyRegistry, Treatment};
use crate::resolver::Resolver;
use crate::session::{MigrationSession, SessionEntry, SummaryReport};

pub struct Orchestrator<'a> {
    host: &'a dyn EditorHost,
    registry: &'a PolicyRegistry,
    resolver: Resolver,
    gate: PhaseGate,
    session: MigrationSession,
}

impl<'a> Orchestrator<'a> {
    pub fn new(host: &'a dyn EditorHost, registry: &'a PolicyRegistry) -> Self {
        let resolver = Resolver::new(
            registry.skip.clone(),
            registry.overrides.clone(),
            registry.search_paths.clone(),
        );
        Self {
            host,
            registry,
            resolver,
            gate: PhaseGate::new(),
            session: MigrationSession::new(),
        }
    }

    /// Run all phases, then the post-phase data patches. The cache feeds
    /// patches that restore extracted values.
    pub fn run(mut self, cache: Option<&ExtractionCache>) -> Result<SummaryReport, PhaseOrderError> {
        self.phase_load()?;
        self.phase_clear()?;
        self.phase_flush()?;
        self.phase_reparent()?;
        self.phase_save()?;
        self.phase_compile()?;
        self.phase_validate()?;

        if !self.registry.patches.is_empty() {
            patches::apply_all(self.host, &self.registry.patches, cache, &mut self.session);
        }

        let report = self.session.report();
        info!("\n{}", report);
        Ok(report)
    }

    fn phase_load(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Load)?;
        info!("Phase 1: loading {} policy entries", self.registry.entries().len());

        for entry in self.registry.entries() {
            if entry.treatment == Treatment::Skip || self.resolver.is_skipped(&entry.name) {
                self.session.counters.skipped += 1;
                continue;
            }
            if self.registry.load_skip.contains(&entry.name) {
                warn!("{}: on the load-skip list, not loading", entry.name);
                self.session.counters.skipped += 1;
                continue;
            }
            match self.resolver.resolve(self.host, &entry.name) {
                Some(handle) => {
                    info!("Loaded {} ({})", entry.name, handle.path());
                    self.session.counters.loaded += 1;
                    // The session is unsealed throughout this phase.
                    let _ = self.session.push(SessionEntry { entry: entry.clone(), handle: Some(handle) });
                }
                None => {
                    warn!("{}: did not resolve, skipping", entry.name);
                    self.session.counters.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn phase_clear(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Clear)?;
        self.session.seal();
        info!("Phase 2: clearing graph logic");
        let ops = MutationOps::new(self.host);

        for i in 0..self.session.entries().len() {
            let SessionEntry { entry, handle } = self.session.entries()[i].clone();
            let Some(handle) = handle else { continue };

            let result = match entry.treatment {
                Treatment::Regular | Treatment::DataAsset => ops.clear_full(&handle),
                Treatment::KeepVars | Treatment::AnimGraphSafe => ops.clear_keep_vars(&handle),
                Treatment::ReparentOnly | Treatment::Interface | Treatment::Skip => {
                    continue;
                }
            };
            match result {
                Ok(true) => self.session.counters.cleared += 1,
                Ok(false) => {
                    self.session.record_failure(format!("{}: clear postcondition not met", entry.name));
                }
                Err(e) => {
                    self.session.record_failure(format!("{}: clear failed: {}", entry.name, e));
                    continue;
                }
            }

            // Animation assets keep their interfaces: the surviving anim
            // graph still implements the animation-layer contracts.
            if entry.treatment == Treatment::AnimGraphSafe {
                continue;
            }
            match ops.remove_interfaces(&handle) {
                Ok(removed) if !removed.is_empty() => {
                    warn!("{}: removed interfaces {:?}", entry.name, removed);
                    self.session.interface_removals.push(entry.name.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    self.session.record_failure(format!("{}: interface removal failed: {}", entry.name, e));
                }
            }
        }
        Ok(())
    }

    /// Barrier between mutation and reparenting: the host must finish any
    /// deferred loads and drop dangling references before parent classes
    /// change underneath them.
    fn phase_flush(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Flush)?;
        info!("Phase 3: flush barrier");
        self.host.collect_garbage();
        match self.host.drain_deferred_work() {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                let delay = self.registry.flush.delay_ms;
                info!("host has no deterministic drain; waiting {} ms", delay);
                thread::sleep(Duration::from_millis(delay));
            }
        }
        Ok(())
    }

    fn phase_reparent(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Reparent)?;
        info!("Phase 4: reparenting");
        let ops = MutationOps::new(self.host);

        for i in 0..self.session.entries().len() {
            let SessionEntry { entry, handle } = self.session.entries()[i].clone();
            let (Some(handle), Some(target)) = (handle, entry.target.clone()) else { continue };
            if entry.treatment == Treatment::Interface {
                continue;
            }
            if self.registry.reparent_skip.contains(&entry.name) {
                warn!("{}: on the reparent-skip list", entry.name);
                self.session.counters.skipped += 1;
                continue;
            }
            match ops.reparent_verified(&handle, &target) {
                Ok(true) => {
                    info!("Reparented {} -> {}", entry.name, target);
                    self.session.counters.reparented += 1;
                }
                Ok(false) => {
                    self.session.record_failure(format!("{}: reparent to {} not confirmed", entry.name, target));
                }
                Err(e) => {
                    self.session.record_failure(format!("{}: reparent failed: {}", entry.name, e));
                }
            }
        }
        Ok(())
    }

    fn phase_save(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Save)?;
        info!("Phase 5: saving");
        let ops = MutationOps::new(self.host);

        // Every loaded entry is persisted, interface assets included: the
        // save is the whole point of touching them.
        for i in 0..self.session.entries().len() {
            let SessionEntry { entry, handle } = self.session.entries()[i].clone();
            let Some(handle) = handle else { continue };
            match ops.save(&handle) {
                Ok(()) => self.session.counters.saved += 1,
                Err(e) => self.session.record_failure(format!("{}: save failed: {}", entry.name, e)),
            }
        }
        Ok(())
    }

    /// Only keep-variables assets are compiled here: their surviving graphs
    /// and variables must resolve against the new parent. Fully cleared
    /// assets have nothing left that could fail, and an anim asset with a
    /// null target is cleared but never reparented, so compiling it would
    /// hit exactly the cleared-but-unreparented state the phase order
    /// exists to avoid.
    fn phase_compile(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Compile)?;
        info!("Phase 6: compiling keep-variables subset");
        let ops = MutationOps::new(self.host);

        for i in 0..self.session.entries().len() {
            let SessionEntry { entry, handle } = self.session.entries()[i].clone();
            let Some(handle) = handle else { continue };
            if entry.treatment != Treatment::KeepVars {
                continue;
            }
            match ops.compile_and_save(&handle) {
                Ok(true) => self.session.counters.compiled += 1,
                Ok(false) => {
                    self.session.record_failure(format!("{}: compile failed", entry.name));
                }
                Err(e) => {
                    self.session.record_failure(format!("{}: compile errored: {}", entry.name, e));
                }
            }
        }
        Ok(())
    }

    fn phase_validate(&mut self) -> Result<(), PhaseOrderError> {
        self.gate.enter(Phase::Validate)?;
        info!("Phase 7: validating {} targets", self.registry.validation.len());

        for target in &self.registry.validation {
            match self.resolver.resolve(self.host, &target.asset) {
                Some(handle) => {
                    let mut all_readable = true;
                    for property in &target.properties {
                        let value: Option<PropertyValue> =
                            self.host.default_object_property(&handle, property).unwrap_or(None);
                        if value.is_none() {
                            warn!("{}: property {} unreadable after migration", target.asset, property);
                            all_readable = false;
                        }
                    }
                    if all_readable {
                        self.session.counters.validated += 1;
                    } else {
                        self.session.record_failure(format!("{}: validation failed", target.asset));
                    }
                }
                None => {
                    self.session.record_failure(format!("{}: validation target did not resolve", target.asset));
                }
            }
        }
        Ok(())
    }
}

/// Run only the validation pass against an already-migrated content tree.
pub fn validate_only(host: &dyn EditorHost, registry: &PolicyRegistry) -> SummaryReport {
    let resolver = Resolver::new(
        registry.skip.clone(),
        registry.overrides.clone(),
        registry.search_paths.clone(),
    );
    let mut session = MigrationSession::new();
    for target in &registry.validation {
        match resolver.resolve(host, &target.asset) {
            Some(handle) => {
                let unreadable: Vec<&String> = target
                    .properties
                    .iter()
                    .filter(|p| {
                        host.default_object_property(&handle, p.as_str())
                            .unwrap_or(None)
                            .is_none()
                    })
                    .collect();
                if unreadable.is_empty() {
                    session.counters.validated += 1;
                } else {
                    session.record_failure(format!(
                        "{}: unreadable properties {:?}",
                        target.asset, unreadable
                    ));
                }
            }
            None => {
                session.record_failure(format!("{}: validation target did not resolve", target.asset));
            }
        }
    }
    session.report()
}
