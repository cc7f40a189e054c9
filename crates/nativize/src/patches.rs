//! Data patches
//!
//! Small repairs run after the phases: values the class change is known to
//! drop and the rehydrator cannot express. Every patch checks its target
//! first and does nothing when the value is already in place, so the whole
//! set can be re-run freely.

use editor_host::{AssetHandle, AssetPath, EditorHost, PropertyValue};
use tracing::{info, warn};

use crate::extract::ExtractionCache;
use crate::policy::PatchSpec;
use crate::session::MigrationSession;

pub fn apply_all(
    host: &dyn EditorHost,
    specs: &[PatchSpec],
    cache: Option<&ExtractionCache>,
    session: &mut MigrationSession,
) {
    info!("Applying {} data patches", specs.len());
    for spec in specs {
        match spec {
            PatchSpec::SetObjectRef { asset, property, value } => {
                set_object_ref(host, asset, property, value, session);
            }
            PatchSpec::FillFromCache { directory, property, category, field } => {
                fill_from_cache(host, directory, property, category, field, cache, session);
            }
            PatchSpec::MontageMap { asset, property, category, source_property } => {
                montage_map(host, asset, property, category, source_property, cache, session);
            }
            PatchSpec::AppendKey { asset, property, key } => {
                append_key(host, asset, property, key, session);
            }
        }
    }
}

fn load(host: &dyn EditorHost, asset: &str, session: &mut MigrationSession) -> Option<AssetHandle> {
    match host.load_asset(&AssetPath::new(asset)) {
        Ok(Some(handle)) => Some(handle),
        Ok(None) => {
            session.record_failure(format!("patch target {} not found", asset));
            None
        }
        Err(e) => {
            session.record_failure(format!("patch target {} failed to load: {}", asset, e));
            None
        }
    }
}

fn already_set(host: &dyn EditorHost, handle: &AssetHandle, property: &str) -> bool {
    matches!(host.get_property(handle, property), Ok(Some(v)) if v.is_set())
}

fn write(
    host: &dyn EditorHost,
    handle: &AssetHandle,
    property: &str,
    value: PropertyValue,
    session: &mut MigrationSession,
) {
    match host.set_property(handle, property, value) {
        Ok(true) => {
            info!("patched {}.{}", handle.short_name(), property);
            let _ = host.save_asset(handle);
        }
        Ok(false) => {
            session.record_failure(format!("{}: no property {}", handle.short_name(), property));
        }
        Err(e) => {
            session.record_failure(format!("{}: patch write failed: {}", handle.short_name(), e));
        }
    }
}

fn set_object_ref(
    host: &dyn EditorHost,
    asset: &str,
    property: &str,
    value: &str,
    session: &mut MigrationSession,
) {
    let Some(handle) = load(host, asset, session) else { return };
    if already_set(host, &handle, property) {
        info!("{}.{} already set", handle.short_name(), property);
        return;
    }
    write(host, &handle, property, PropertyValue::object(value), session);
}

fn fill_from_cache(
    host: &dyn EditorHost,
    directory: &str,
    property: &str,
    category: &str,
    field: &str,
    cache: Option<&ExtractionCache>,
    session: &mut MigrationSession,
) {
    let Some(cache) = cache else {
        warn!("no cache available; skipping fill of {}", property);
        return;
    };
    let data = match cache.load_category(category) {
        Ok(data) => data,
        Err(e) => {
            session.record_failure(format!("cache category {} unreadable: {}", category, e));
            return;
        }
    };
    let dir = AssetPath::new(directory);
    let assets = match host.list_assets(&dir, true) {
        Ok(assets) => assets,
        Err(e) => {
            session.record_failure(format!("listing {} failed: {}", dir, e));
            return;
        }
    };
    for path in assets {
        let Some(value) = data.get(path.short_name()).and_then(|e| e.get(field)) else { continue };
        let Ok(Some(handle)) = host.load_asset(&path) else { continue };
        if already_set(host, &handle, property) {
            continue;
        }
        write(host, &handle, property, value.clone(), session);
    }
}

fn montage_map(
    host: &dyn EditorHost,
    asset: &str,
    property: &str,
    category: &str,
    source_property: &str,
    cache: Option<&ExtractionCache>,
    session: &mut MigrationSession,
) {
    let Some(cache) = cache else {
        warn!("no cache available; skipping montage map on {}", asset);
        return;
    };
    let Some(handle) = load(host, asset, session) else { return };
    if already_set(host, &handle, property) {
        info!("{}.{} already populated", handle.short_name(), property);
        return;
    }
    let data = match cache.load_category(category) {
        Ok(data) => data,
        Err(e) => {
            session.record_failure(format!("cache category {} unreadable: {}", category, e));
            return;
        }
    };
    let Some(entry) = data.get(handle.short_name()) else {
        warn!("{}: nothing cached under {}", handle.short_name(), category);
        return;
    };
    // Cached struct fields are stored flat as `Source.Field`.
    let prefix = format!("{}.", source_property);
    let fields: std::collections::BTreeMap<String, PropertyValue> = entry
        .iter()
        .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|f| (f.to_string(), v.clone())))
        .collect();
    if fields.is_empty() {
        warn!("{}: no cached {} fields", handle.short_name(), source_property);
        return;
    }
    write(host, &handle, property, PropertyValue::Struct { fields }, session);
}

fn append_key(
    host: &dyn EditorHost,
    asset: &str,
    property: &str,
    key: &str,
    session: &mut MigrationSession,
) {
    let Some(handle) = load(host, asset, session) else { return };
    let mut items = match host.get_property(&handle, property) {
        Ok(Some(PropertyValue::List { items })) => items,
        Ok(_) => Vec::new(),
        Err(e) => {
            session.record_failure(format!("{}: reading {} failed: {}", handle.short_name(), property, e));
            return;
        }
    };
    let present = items
        .iter()
        .any(|i| matches!(i, PropertyValue::Text { value } if value == key));
    if present {
        info!("{}: key {} already mapped", handle.short_name(), key);
        return;
    }
    items.push(PropertyValue::text(key));
    write(host, &handle, property, PropertyValue::List { items }, session);
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_host::{AssetRecord, MemoryHost};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn set_object_ref_is_idempotent() {
        let host = MemoryHost::new();
        let mut asset = AssetRecord::new("/Game/Data/DA_CharacterData");
        asset.properties.insert("DefaultMeshData".into(), PropertyValue::text("None"));
        host.insert_asset(asset);

        let spec = PatchSpec::SetObjectRef {
            asset: "/Game/Data/DA_CharacterData".into(),
            property: "DefaultMeshData".into(),
            value: "/Game/Data/DA_DefaultMeshData".into(),
        };

        let mut session = MigrationSession::new();
        apply_all(&host, std::slice::from_ref(&spec), None, &mut session);
        let record = host.record(&"/Game/Data/DA_CharacterData".into()).unwrap();
        assert_eq!(
            record.properties["DefaultMeshData"],
            PropertyValue::object("/Game/Data/DA_DefaultMeshData")
        );
        let saves = host.save_count(&"/Game/Data/DA_CharacterData".into());

        // Second run leaves the value and save count alone.
        apply_all(&host, std::slice::from_ref(&spec), None, &mut session);
        assert_eq!(host.save_count(&"/Game/Data/DA_CharacterData".into()), saves);
        assert!(session.report().is_clean());
    }

    #[test]
    fn fill_from_cache_restores_unset_properties() {
        let dir = TempDir::new().unwrap();
        let cache = ExtractionCache::new(dir.path());
        let mut entry = BTreeMap::new();
        entry.insert("WorldParticle".to_string(), PropertyValue::object("/Game/FX/P_Sparkle"));
        let mut data = crate::extract::CategoryData::new();
        data.insert("DA_Apple".to_string(), entry);
        cache.save_category("item_data", &data).unwrap();

        let host = MemoryHost::new();
        let mut asset = AssetRecord::new("/Game/Items/DA_Apple");
        asset.properties.insert("WorldParticle".into(), PropertyValue::text("None"));
        host.insert_asset(asset);

        let spec = PatchSpec::FillFromCache {
            directory: "/Game/Items".into(),
            property: "WorldParticle".into(),
            category: "item_data".into(),
            field: "WorldParticle".into(),
        };
        let mut session = MigrationSession::new();
        apply_all(&host, &[spec], Some(&cache), &mut session);

        let record = host.record(&"/Game/Items/DA_Apple".into()).unwrap();
        assert_eq!(record.properties["WorldParticle"], PropertyValue::object("/Game/FX/P_Sparkle"));
    }

    #[test]
    fn montage_map_rebuilds_struct_from_cached_fields() {
        let dir = TempDir::new().unwrap();
        let cache = ExtractionCache::new(dir.path());
        let mut entry = BTreeMap::new();
        for (field, montage) in [
            ("Forward", "/Game/Animations/AM_Dodge_F"),
            ("Backward", "/Game/Animations/AM_Dodge_B"),
            ("Left", "/Game/Animations/AM_Dodge_L"),
            ("Right", "/Game/Animations/AM_Dodge_R"),
        ] {
            entry.insert(format!("DodgeMontages.{field}"), PropertyValue::object(montage));
        }
        let mut data = crate::extract::CategoryData::new();
        data.insert("DA_Dodge".to_string(), entry);
        cache.save_category("action_data", &data).unwrap();

        let host = MemoryHost::new();
        let mut asset = AssetRecord::new("/Game/Actions/DA_Dodge");
        asset
            .properties
            .insert("DirectionalMontages".into(), PropertyValue::Struct { fields: BTreeMap::new() });
        host.insert_asset(asset);

        let spec = PatchSpec::MontageMap {
            asset: "/Game/Actions/DA_Dodge".into(),
            property: "DirectionalMontages".into(),
            category: "action_data".into(),
            source_property: "DodgeMontages".into(),
        };
        let mut session = MigrationSession::new();
        apply_all(&host, std::slice::from_ref(&spec), Some(&cache), &mut session);

        let record = host.record(&"/Game/Actions/DA_Dodge".into()).unwrap();
        let PropertyValue::Struct { fields } = &record.properties["DirectionalMontages"] else {
            panic!()
        };
        assert_eq!(fields.len(), 4);
        assert_eq!(fields["Forward"], PropertyValue::object("/Game/Animations/AM_Dodge_F"));
        assert_eq!(fields["Right"], PropertyValue::object("/Game/Animations/AM_Dodge_R"));
        let saves = host.save_count(&"/Game/Actions/DA_Dodge".into());

        // A populated map is left alone on the next run.
        apply_all(&host, std::slice::from_ref(&spec), Some(&cache), &mut session);
        assert_eq!(host.save_count(&"/Game/Actions/DA_Dodge".into()), saves);
        assert!(session.report().is_clean());
    }

    #[test]
    fn append_key_skips_existing_entries() {
        let host = MemoryHost::new();
        let mut asset = AssetRecord::new("/Game/Input/IMC_Default");
        asset.properties.insert(
            "Mappings".into(),
            PropertyValue::List { items: vec![PropertyValue::text("IA_Dodge")] },
        );
        host.insert_asset(asset);

        let spec = PatchSpec::AppendKey {
            asset: "/Game/Input/IMC_Default".into(),
            property: "Mappings".into(),
            key: "IA_Dodge".into(),
        };
        let mut session = MigrationSession::new();
        apply_all(&host, std::slice::from_ref(&spec), None, &mut session);

        let record = host.record(&"/Game/Input/IMC_Default".into()).unwrap();
        let PropertyValue::List { items } = &record.properties["Mappings"] else { panic!() };
        assert_eq!(items.len(), 1);
    }
}
