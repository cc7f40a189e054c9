//! Nativize CLI
//!
//! Drives the migration engine against a content snapshot. Every command
//! completes and reports through the summary counters; only redirect
//! prerequisite failures and policy conflicts abort a run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use editor_host::{AssetPath, ContentSnapshot, MemoryHost};
use nativize::extract::{ExtractionCache, Extractor, Rehydrator};
use nativize::depfix::DependencyRefresher;
use nativize::orchestrator::{Orchestrator, validate_only};
use nativize::patches;
use nativize::redirect::{RedirectDriver, RedirectPlan, scan_affected};
use nativize::retyper::{RetypeMapping, Retyper};
use nativize::session::MigrationSession;
use nativize::{PolicyDocument, PolicyRegistry};

/// Blueprint-to-native migration engine
#[derive(Parser, Debug)]
#[command(name = "nativize")]
#[command(about = "Blueprint-to-native migration engine", long_about = None)]
struct Args {
    /// Path to the policy document
    #[arg(long, default_value = "config/policy.toml")]
    policy: PathBuf,

    /// Content snapshot backing the in-memory host
    #[arg(long, default_value = "demos/content_snapshot.json")]
    snapshot: PathBuf,

    /// Override the policy document's cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, run all phases and patches, rehydrate
    Migrate,
    /// Snapshot properties into the extraction cache
    Extract,
    /// Write cached properties back onto migrated assets
    Rehydrate,
    /// Two-process type-redirect workflow
    Redirect {
        #[command(subcommand)]
        step: RedirectStep,
    },
    /// Rewrite struct pins in place per the redirect plan's mappings
    Retype {
        /// Redirect plan holding the struct mappings
        #[arg(long, default_value = "config/redirects.toml")]
        plan: PathBuf,
    },
    /// Repair assets that referenced a migrated class
    RefreshDeps {
        /// Old generated-class name, e.g. B_ActionManager_C
        #[arg(long)]
        old_class: String,
        /// Replacement native class name
        #[arg(long)]
        new_class: String,
        /// Logical paths of the dependents to repair
        assets: Vec<String>,
    },
    /// Run only the validation pass
    Validate,
    /// Run only the data patches
    Patch,
}

#[derive(Subcommand, Debug)]
enum RedirectStep {
    /// Verify prerequisites, back up and delete legacy assets, persist state
    Prepare {
        #[arg(long, default_value = "config/redirects.toml")]
        plan: PathBuf,
    },
    /// After host restart: recompile affected assets, reparent the component
    Apply {
        #[arg(long, default_value = "config/redirects.toml")]
        plan: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nativize=info,editor_host=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("nativize v{}", env!("CARGO_PKG_VERSION"));

    let snapshot = ContentSnapshot::load(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;
    let host = MemoryHost::from_snapshot(snapshot);

    let doc = PolicyDocument::load(&args.policy)?;
    let mut registry = PolicyRegistry::from_document(&doc)?;
    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&registry.cache_dir));
    let cache = ExtractionCache::new(cache_dir);

    let mut mutated = true;
    match &args.command {
        Command::Migrate => {
            registry.preflight(&host);
            Extractor::new(&host, &cache).run(&registry.extraction)?;
            let report = Orchestrator::new(&host, &registry).run(Some(&cache))?;
            Rehydrator::new(&host, &cache).run(&registry.extraction)?;
            println!("{}", report);
        }
        Command::Extract => {
            let report = Extractor::new(&host, &cache).run(&registry.extraction)?;
            println!(
                "extracted {}, cached {}, empty {}",
                report.extracted, report.cached, report.empty
            );
            mutated = false;
        }
        Command::Rehydrate => {
            let report = Rehydrator::new(&host, &cache).run(&registry.extraction)?;
            println!(
                "applied {}, unchanged {}, failed {}",
                report.applied, report.unchanged, report.failed
            );
        }
        Command::Redirect { step } => match step {
            RedirectStep::Prepare { plan } => {
                let plan = RedirectPlan::load(plan)?;
                let state = RedirectDriver::new(&host, &plan).prepare()?;
                println!(
                    "phase 1 complete: {} affected assets, backup at {}",
                    state.affected.len(),
                    state.backup_dir
                );
            }
            RedirectStep::Apply { plan } => {
                let plan = RedirectPlan::load(plan)?;
                let report = RedirectDriver::new(&host, &plan).apply()?;
                println!(
                    "repaired {}, failed {}, component reparented: {}",
                    report.repaired, report.failed, report.component_reparented
                );
            }
        },
        Command::Retype { plan } => {
            let plan = RedirectPlan::load(plan)?;
            let mappings: Vec<RetypeMapping> = plan
                .structs
                .iter()
                .chain(&plan.enums)
                .map(|s| RetypeMapping {
                    old_path: s.old_path.clone(),
                    new_type: s.new_type.clone(),
                })
                .collect();
            let needles: Vec<String> = mappings.iter().map(|m| m.old_path.clone()).collect();
            let affected = scan_affected(std::path::Path::new(&plan.dna_dir), &needles)?;
            let report = Retyper::new(&host).run(&mappings, &affected);
            println!(
                "{} pins retyped, {} compiled, {} legacy structs deleted",
                report.rewrites, report.compiled, report.deleted
            );
        }
        Command::RefreshDeps { old_class, new_class, assets } => {
            let dependents: Vec<AssetPath> =
                assets.iter().map(|a| AssetPath::new(a.clone())).collect();
            let report = DependencyRefresher::new(&host).run(&dependents, old_class, new_class);
            println!(
                "{} repaired, {} calls retargeted, {} bindings fixed",
                report.refreshed, report.calls_retargeted, report.bindings_fixed
            );
        }
        Command::Validate => {
            let report = validate_only(&host, &registry);
            println!("{}", report);
            mutated = false;
        }
        Command::Patch => {
            let mut session = MigrationSession::new();
            patches::apply_all(&host, &registry.patches, Some(&cache), &mut session);
            println!("{}", session.report());
        }
    }

    if mutated {
        host.to_snapshot().save(&args.snapshot)?;
        info!("snapshot written back to {}", args.snapshot.display());
    }
    Ok(())
}
