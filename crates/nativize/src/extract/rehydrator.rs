//! Rehydrator
//!
//! Writes cached property values back onto migrated assets. Native classes
//! often rename properties to snake_case, so every write tries the
//! snake_case spelling first and falls back to the original name.
//! Per-field failures are logged and the rest of the asset continues; the
//! whole pass can be re-run safely.

use std::collections::BTreeMap;

use editor_host::{AssetHandle, AssetPath, EditorHost, PropertyValue};
use tracing::{info, warn};

use super::cache::{CacheError, ExtractionCache};
use crate::policy::ExtractionCategory;

#[derive(Debug, Clone, Copy, Default)]
pub struct RehydrateReport {
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// `IconSmall` → `icon_small`, `UpperBody` → `upper_body`.
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

pub struct Rehydrator<'a> {
    host: &'a dyn EditorHost,
    cache: &'a ExtractionCache,
}

impl<'a> Rehydrator<'a> {
    pub fn new(host: &'a dyn EditorHost, cache: &'a ExtractionCache) -> Self {
        Self { host, cache }
    }

    pub fn run(&self, categories: &[ExtractionCategory]) -> Result<RehydrateReport, CacheError> {
        let mut report = RehydrateReport::default();

        for category in categories {
            let data = self.cache.load_category(&category.name)?;
            if data.is_empty() {
                continue;
            }
            info!("Rehydrating {}: {} cached assets", category.name, data.len());
            let dir = AssetPath::new(category.directory.clone());

            for (short, entry) in &data {
                let path = dir.join(short);
                let handle = match self.host.load_asset(&path) {
                    Ok(Some(handle)) => handle,
                    Ok(None) => {
                        warn!("{}: cached asset no longer exists at {}", short, path);
                        report.failed += entry.len();
                        continue;
                    }
                    Err(e) => {
                        warn!("{}: load failed: {}", short, e);
                        report.failed += entry.len();
                        continue;
                    }
                };

                for (key, value) in entry {
                    match key.split_once('.') {
                        Some((property, field)) => {
                            self.apply_struct_field(&handle, property, field, value, &mut report)
                        }
                        None => self.apply_direct(&handle, key, value, &mut report),
                    }
                }
            }
        }
        info!(
            "Rehydration done: {} applied, {} unchanged, {} failed",
            report.applied, report.unchanged, report.failed
        );
        Ok(report)
    }

    fn apply_direct(
        &self,
        handle: &AssetHandle,
        name: &str,
        value: &PropertyValue,
        report: &mut RehydrateReport,
    ) {
        let current = self
            .read_with_fallback(handle, name)
            .map(|(_, v)| v);
        if current.as_ref() == Some(value) {
            report.unchanged += 1;
            return;
        }
        if self.write_with_fallback(handle, name, value.clone()) {
            report.applied += 1;
        } else {
            warn!("{}: no writable property for {}", handle.short_name(), name);
            report.failed += 1;
        }
    }

    /// Struct fields are applied read-modify-write on the whole struct, so
    /// unrelated fields survive.
    fn apply_struct_field(
        &self,
        handle: &AssetHandle,
        property: &str,
        field: &str,
        value: &PropertyValue,
        report: &mut RehydrateReport,
    ) {
        let (name, current) = match self.read_with_fallback(handle, property) {
            Some((name, value)) => (name, value),
            None => (property.to_string(), PropertyValue::Struct { fields: BTreeMap::new() }),
        };
        let mut fields = current.as_struct().cloned().unwrap_or_default();
        if fields.get(field) == Some(value) {
            report.unchanged += 1;
            return;
        }
        fields.insert(field.to_string(), value.clone());
        let updated = PropertyValue::Struct { fields };
        let wrote = match self.host.set_property(handle, &name, updated.clone()) {
            Ok(true) => true,
            _ => self.write_with_fallback(handle, property, updated),
        };
        if wrote {
            report.applied += 1;
        } else {
            warn!("{}: no writable property for {}.{}", handle.short_name(), property, field);
            report.failed += 1;
        }
    }

    fn read_with_fallback(&self, handle: &AssetHandle, name: &str) -> Option<(String, PropertyValue)> {
        for candidate in candidates(name) {
            if let Ok(Some(value)) = self.host.get_property(handle, &candidate) {
                return Some((candidate, value));
            }
        }
        None
    }

    fn write_with_fallback(&self, handle: &AssetHandle, name: &str, value: PropertyValue) -> bool {
        for candidate in candidates(name) {
            match self.host.set_property(handle, &candidate, value.clone()) {
                Ok(true) => return true,
                Ok(false) => continue,
                Err(e) => {
                    warn!("{}: writing {} failed: {}", handle.short_name(), candidate, e);
                    return false;
                }
            }
        }
        false
    }
}

fn candidates(name: &str) -> Vec<String> {
    let snake = to_snake_case(name);
    if snake == name {
        vec![name.to_string()]
    } else {
        vec![snake, name.to_string()]
    }
}
