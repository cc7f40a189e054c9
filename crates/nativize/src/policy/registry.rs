//! Policy registry
//!
//! Compiles the policy document into per-asset migration entries, rejecting
//! conflicting maps up front and degrading entries whose native types the
//! host cannot resolve.

use std::collections::{BTreeMap, BTreeSet};

use editor_host::{AssetPath, EditorHost, NativeTypeRef, TypeRefError};
use tracing::{info, warn};

use super::config::{ExtractionCategory, FlushConfig, PatchSpec, PolicyDocument, ValidationTarget};

/// Error type for policy loading and registry construction.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy {0}: {1}")]
    Read(String, #[source] std::io::Error),

    #[error("failed to parse policy: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown policy group `{0}`")]
    UnknownGroup(String),

    #[error("`{name}` appears in both `{first_map}` and `{second_map}`")]
    Conflict {
        name: String,
        first_map: String,
        second_map: String,
    },

    #[error("invalid native type for `{name}`: {source}")]
    BadTypeRef {
        name: String,
        #[source]
        source: TypeRefError,
    },
}

/// How the orchestrator handles one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Clear everything, reparent.
    Regular,
    /// Clear event/function graphs, keep variables, reparent, compile later.
    KeepVars,
    /// Reparent without touching graphs.
    ReparentOnly,
    /// Clear-only animation asset; reparents only when a target is given.
    AnimGraphSafe,
    /// Interface asset; recorded, never mutated.
    Interface,
    /// Data asset: reparent only, properties carried by extraction.
    DataAsset,
    /// Excluded from the run entirely.
    Skip,
}

/// One asset the migration touches.
#[derive(Debug, Clone)]
pub struct MigrationEntry {
    pub name: String,
    /// Absent for clear-only entries and degraded (skipped) entries.
    pub target: Option<NativeTypeRef>,
    pub treatment: Treatment,
    /// Load-phase sub-order; lower loads first.
    pub load_rank: u8,
    /// Map the entry came from, for diagnostics.
    pub group: &'static str,
}

struct GroupSpec {
    name: &'static str,
    treatment: Treatment,
    load_rank: u8,
}

// Declaration order is the tiebreak within a load rank.
const GROUPS: &[GroupSpec] = &[
    GroupSpec { name: "priority_state", treatment: Treatment::Regular, load_rank: 0 },
    GroupSpec { name: "anim_graph_safe", treatment: Treatment::AnimGraphSafe, load_rank: 1 },
    GroupSpec { name: "priority_character", treatment: Treatment::Regular, load_rank: 2 },
    GroupSpec { name: "npc_character", treatment: Treatment::Regular, load_rank: 3 },
    GroupSpec { name: "regular", treatment: Treatment::Regular, load_rank: 4 },
    GroupSpec { name: "data_asset", treatment: Treatment::DataAsset, load_rank: 4 },
    GroupSpec { name: "keep_vars", treatment: Treatment::KeepVars, load_rank: 4 },
    GroupSpec { name: "reparent_only", treatment: Treatment::ReparentOnly, load_rank: 4 },
    GroupSpec { name: "interface", treatment: Treatment::Interface, load_rank: 4 },
];

/// The compiled policy: migration entries in load order plus everything else
/// the pipeline needs.
#[derive(Debug)]
pub struct PolicyRegistry {
    entries: Vec<MigrationEntry>,
    pub skip: BTreeSet<String>,
    pub load_skip: BTreeSet<String>,
    pub reparent_skip: BTreeSet<String>,
    pub overrides: BTreeMap<String, AssetPath>,
    pub search_paths: Vec<AssetPath>,
    pub validation: Vec<ValidationTarget>,
    pub extraction: Vec<ExtractionCategory>,
    pub patches: Vec<PatchSpec>,
    pub flush: FlushConfig,
    pub cache_dir: String,
}

impl PolicyRegistry {
    /// Build a registry from a policy document.
    ///
    /// Cross-map duplicates are fatal, with one grandfathered exception: a
    /// name in both `priority_character` and `regular` warns, and the
    /// priority entry wins.
    pub fn from_document(doc: &PolicyDocument) -> Result<Self, PolicyError> {
        for group in doc.maps.keys() {
            if !GROUPS.iter().any(|g| g.name == group) {
                return Err(PolicyError::UnknownGroup(group.clone()));
            }
        }

        let mut entries: Vec<MigrationEntry> = Vec::new();
        let mut seen: BTreeMap<String, &'static str> = BTreeMap::new();

        for spec in GROUPS {
            let Some(map) = doc.maps.get(spec.name) else { continue };
            for (name, target) in map {
                if let Some(first_map) = seen.get(name.as_str()) {
                    if *first_map == "priority_character" && spec.name == "regular" {
                        warn!(
                            "`{}` listed in both `priority_character` and `regular`; \
                             keeping the priority entry",
                            name
                        );
                        continue;
                    }
                    return Err(PolicyError::Conflict {
                        name: name.clone(),
                        first_map: (*first_map).to_string(),
                        second_map: spec.name.to_string(),
                    });
                }
                seen.insert(name.clone(), spec.name);

                let target = if target.is_empty() {
                    None
                } else {
                    Some(NativeTypeRef::parse(target.clone()).map_err(|source| {
                        PolicyError::BadTypeRef { name: name.clone(), source }
                    })?)
                };
                entries.push(MigrationEntry {
                    name: name.clone(),
                    target,
                    treatment: spec.treatment,
                    load_rank: spec.load_rank,
                    group: spec.name,
                });
            }
        }

        entries.sort_by_key(|e| e.load_rank);
        info!("Policy registry: {} entries across {} groups", entries.len(), doc.maps.len());

        Ok(Self {
            entries,
            skip: doc.skip.iter().cloned().collect(),
            load_skip: doc.load_skip.iter().cloned().collect(),
            reparent_skip: doc.reparent_skip.iter().cloned().collect(),
            overrides: doc
                .overrides
                .iter()
                .map(|(k, v)| (k.clone(), AssetPath::new(v.clone())))
                .collect(),
            search_paths: doc.search_paths.iter().map(|p| AssetPath::new(p.clone())).collect(),
            validation: doc.validation.clone(),
            extraction: doc.extraction.clone(),
            patches: doc.patches.clone(),
            flush: doc.flush.clone(),
            cache_dir: doc.cache_dir.clone(),
        })
    }

    /// Entries in load order.
    pub fn entries(&self) -> &[MigrationEntry] {
        &self.entries
    }

    /// Check every entry's native type against the host type table.
    /// Unresolved types degrade the entry to a skip rather than failing the
    /// run; the new class may simply not be compiled in yet.
    pub fn preflight(&mut self, host: &dyn EditorHost) {
        let mut degraded = 0;
        for entry in &mut self.entries {
            let Some(target) = &entry.target else { continue };
            let resolves = host.resolve_native_type(target).unwrap_or(false);
            if !resolves {
                warn!(
                    "native type {} for `{}` does not resolve; entry degraded to skip",
                    target, entry.name
                );
                entry.treatment = Treatment::Skip;
                degraded += 1;
            }
        }
        if degraded > 0 {
            warn!("{} entries degraded to skip during pre-flight", degraded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_host::{MemoryHost, NativeTypeDecl};

    fn doc(toml_text: &str) -> PolicyDocument {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn priority_groups_load_first() {
        let registry = PolicyRegistry::from_document(&doc(
            r#"
            [maps.regular]
            B_Fireball = "/Script/SLF.FireballAbility"

            [maps.priority_state]
            B_StateManager = "/Script/SLF.StateManagerComponent"
            "#,
        ))
        .unwrap();

        let names: Vec<&str> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B_StateManager", "B_Fireball"]);
    }

    #[test]
    fn rank_four_groups_keep_their_documented_sub_order() {
        let registry = PolicyRegistry::from_document(&doc(
            r#"
            [maps.interface]
            BPI_Interact = "/Script/SLF.InteractInterface"

            [maps.reparent_only]
            B_PatrolPath = "/Script/SLF.PatrolPath"

            [maps.keep_vars]
            AC_StatManager = "/Script/SLF.StatManagerComponent"

            [maps.data_asset]
            DA_CharacterData = "/Script/SLF.CharacterData"

            [maps.regular]
            B_Fireball = "/Script/SLF.FireballAbility"
            "#,
        ))
        .unwrap();

        let names: Vec<&str> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["B_Fireball", "DA_CharacterData", "AC_StatManager", "B_PatrolPath", "BPI_Interact"]
        );
    }

    #[test]
    fn cross_map_duplicate_is_fatal_and_names_both_maps() {
        let err = PolicyRegistry::from_document(&doc(
            r#"
            [maps.regular]
            B_Thing = "/Script/SLF.Thing"

            [maps.keep_vars]
            B_Thing = "/Script/SLF.Thing"
            "#,
        ))
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("keep_vars"), "{msg}");
        assert!(msg.contains("regular"), "{msg}");
        assert!(msg.contains("B_Thing"), "{msg}");
    }

    #[test]
    fn priority_character_shadowing_regular_is_tolerated() {
        let registry = PolicyRegistry::from_document(&doc(
            r#"
            [maps.priority_character]
            B_Soulslike_Character = "/Script/SLF.SoulslikeCharacter"

            [maps.regular]
            B_Soulslike_Character = "/Script/SLF.SoulslikeCharacter"
            "#,
        ))
        .unwrap();

        let matching: Vec<_> = registry
            .entries()
            .iter()
            .filter(|e| e.name == "B_Soulslike_Character")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].group, "priority_character");
    }

    #[test]
    fn empty_target_means_clear_only() {
        let registry = PolicyRegistry::from_document(&doc(
            r#"
            [maps.anim_graph_safe]
            ABP_Old = ""
            "#,
        ))
        .unwrap();
        assert!(registry.entries()[0].target.is_none());
        assert_eq!(registry.entries()[0].treatment, Treatment::AnimGraphSafe);
    }

    #[test]
    fn preflight_degrades_unresolved_types() {
        let mut registry = PolicyRegistry::from_document(&doc(
            r#"
            [maps.regular]
            B_Known = "/Script/SLF.Known"
            B_Unknown = "/Script/SLF.Unknown"
            "#,
        ))
        .unwrap();

        let host = MemoryHost::new();
        host.declare_native_type(NativeTypeDecl { name: "/Script/SLF.Known".into(), ..Default::default() });
        registry.preflight(&host);

        let by_name = |n: &str| registry.entries().iter().find(|e| e.name == n).unwrap().treatment;
        assert_eq!(by_name("B_Known"), Treatment::Regular);
        assert_eq!(by_name("B_Unknown"), Treatment::Skip);
    }

    #[test]
    fn unknown_group_is_rejected() {
        let err = PolicyRegistry::from_document(&doc(
            r#"
            [maps.no_such_group]
            B_Thing = "/Script/SLF.Thing"
            "#,
        ))
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownGroup(_)));
    }
}
