//! Extractor
//!
//! Walks each extraction category's directory, snapshots the configured
//! properties from every asset, and writes the result into the cache.
//! Assets with a non-empty cache entry are skipped, so re-running after a
//! partial failure only touches what is missing.

use editor_host::{AssetPath, EditorHost, PropertyValue};
use tracing::{info, warn};

use super::cache::{CacheError, ExtractionCache};
use super::strategy::{DirectProperty, StructFieldStrategy, TextExport};
use crate::policy::ExtractionCategory;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractReport {
    pub extracted: usize,
    pub cached: usize,
    pub empty: usize,
}

pub struct Extractor<'a> {
    host: &'a dyn EditorHost,
    cache: &'a ExtractionCache,
}

impl<'a> Extractor<'a> {
    pub fn new(host: &'a dyn EditorHost, cache: &'a ExtractionCache) -> Self {
        Self { host, cache }
    }

    pub fn run(&self, categories: &[ExtractionCategory]) -> Result<ExtractReport, CacheError> {
        let strategies: [&dyn StructFieldStrategy; 2] = [&DirectProperty, &TextExport];
        let mut report = ExtractReport::default();

        for category in categories {
            let mut data = self.cache.load_category(&category.name)?;
            let dir = AssetPath::new(category.directory.clone());
            let assets = match self.host.list_assets(&dir, category.recursive) {
                Ok(assets) => assets,
                Err(e) => {
                    warn!("{}: listing {} failed: {}", category.name, dir, e);
                    continue;
                }
            };
            info!("Extracting {}: {} assets under {}", category.name, assets.len(), dir);

            for path in assets {
                let short = path.short_name().to_string();
                if data.get(&short).map(|e| !e.is_empty()).unwrap_or(false) {
                    report.cached += 1;
                    continue;
                }
                let handle = match self.host.load_asset(&path) {
                    Ok(Some(handle)) => handle,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("{}: load failed: {}", short, e);
                        continue;
                    }
                };

                let mut entry = std::collections::BTreeMap::new();

                for property in &category.properties {
                    match self.host.get_property(&handle, property) {
                        Ok(Some(value)) => {
                            let value = match value.as_object_path() {
                                Some(p) => PropertyValue::object(p.package().as_str()),
                                None => value,
                            };
                            entry.insert(property.clone(), value);
                        }
                        Ok(None) => {}
                        Err(e) => warn!("{}: reading {} failed: {}", short, property, e),
                    }
                }

                for spec in &category.struct_properties {
                    let extracted = strategies
                        .iter()
                        .find_map(|s| s.extract(self.host, &handle, &spec.property, &spec.fields))
                        .unwrap_or_default();
                    for (field, value) in extracted {
                        entry.insert(format!("{}.{}", spec.property, field), value);
                    }
                }

                if entry.is_empty() {
                    report.empty += 1;
                } else {
                    report.extracted += 1;
                    data.insert(short, entry);
                }
            }

            self.cache.save_category(&category.name, &data)?;
        }
        info!(
            "Extraction done: {} extracted, {} already cached, {} empty",
            report.extracted, report.cached, report.empty
        );
        Ok(report)
    }
}
