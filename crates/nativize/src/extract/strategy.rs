//! Extraction strategies
//!
//! Reading fields out of a struct-typed property has two routes: direct
//! property access (works when the host can reflect the struct), and a
//! textual export parsed with regexes (works even when reflection cannot
//! traverse the value). The extractor tries them in that order.

use std::collections::BTreeMap;

use editor_host::{AssetHandle, AssetPath, EditorHost, PropertyValue};
use regex::Regex;
use tracing::debug;

/// Normalize an exported object reference to a plain logical package path:
/// strip quotes, a `TypeName'...'` decoration, and any `.ObjectName` suffix.
pub fn normalize_object_path(raw: &str) -> String {
    let mut s = raw.trim().trim_matches('"');
    if let Some(open) = s.find('\'') {
        if s.ends_with('\'') && open < s.len() - 1 {
            s = &s[open + 1..s.len() - 1];
        }
    }
    AssetPath::new(s.trim_matches('"')).package().as_str().to_string()
}

/// One way of pulling named fields out of a struct-typed property.
pub trait StructFieldStrategy {
    fn name(&self) -> &'static str;

    /// `None` when this strategy cannot see the property at all; an empty
    /// map when it can but none of the fields were present.
    fn extract(
        &self,
        host: &dyn EditorHost,
        handle: &AssetHandle,
        property: &str,
        fields: &[String],
    ) -> Option<BTreeMap<String, PropertyValue>>;
}

/// Reflection route: read the struct and pick fields out of it.
pub struct DirectProperty;

impl StructFieldStrategy for DirectProperty {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn extract(
        &self,
        host: &dyn EditorHost,
        handle: &AssetHandle,
        property: &str,
        fields: &[String],
    ) -> Option<BTreeMap<String, PropertyValue>> {
        let value = host.get_property(handle, property).ok()??;
        let struct_fields = value.as_struct()?;
        let mut out = BTreeMap::new();
        for field in fields {
            if let Some(v) = struct_fields.get(field) {
                let v = match v.as_object_path() {
                    Some(path) => PropertyValue::object(path.package().as_str()),
                    None => v.clone(),
                };
                out.insert(field.clone(), v);
            }
        }
        Some(out)
    }
}

/// Fallback route: export the property as text and scrape the fields out
/// with regexes. Field names in exports may carry `_N_GUID` decorations, so
/// the pattern tolerates arbitrary text between name and `=`.
pub struct TextExport;

impl StructFieldStrategy for TextExport {
    fn name(&self) -> &'static str {
        "text-export"
    }

    fn extract(
        &self,
        host: &dyn EditorHost,
        handle: &AssetHandle,
        property: &str,
        fields: &[String],
    ) -> Option<BTreeMap<String, PropertyValue>> {
        let text = host.export_property_text(handle, property).ok()??;
        let mut out = BTreeMap::new();
        for field in fields {
            let pattern = format!(r#"{}[^=]*="([^"]+)""#, regex::escape(field));
            let Ok(re) = Regex::new(&pattern) else { continue };
            if let Some(caps) = re.captures(&text) {
                let path = normalize_object_path(&caps[1]);
                debug!("{}: scraped {} = {}", handle.short_name(), field, path);
                out.insert(field.clone(), PropertyValue::object(path));
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_host::{AssetRecord, MemoryHost};

    #[test]
    fn normalizes_decorated_paths() {
        assert_eq!(
            normalize_object_path("Texture2D'/Game/Tex/T_Apple.T_Apple'"),
            "/Game/Tex/T_Apple"
        );
        assert_eq!(normalize_object_path("\"/Game/Tex/T_Apple.T_Apple\""), "/Game/Tex/T_Apple");
        assert_eq!(normalize_object_path("/Game/Tex/T_Apple"), "/Game/Tex/T_Apple");
    }

    #[test]
    fn text_export_scrapes_fields() {
        let host = MemoryHost::new();
        let mut fields = BTreeMap::new();
        fields.insert("IconSmall".to_string(), PropertyValue::object("/Game/Tex/T_Apple"));
        fields.insert("Weight".to_string(), PropertyValue::Number { value: 1.0 });
        let mut asset = AssetRecord::new("/Game/Items/DA_Apple");
        asset.properties.insert("ItemInformation".into(), PropertyValue::Struct { fields });
        host.insert_asset(asset);

        let handle = host.load_asset(&"/Game/Items/DA_Apple".into()).unwrap().unwrap();
        let out = TextExport
            .extract(&host, &handle, "ItemInformation", &["IconSmall".to_string()])
            .unwrap();
        assert_eq!(out["IconSmall"], PropertyValue::object("/Game/Tex/T_Apple"));
    }

    #[test]
    fn direct_strategy_reads_struct_fields() {
        let host = MemoryHost::new();
        let mut fields = BTreeMap::new();
        fields.insert("IconSmall".to_string(), PropertyValue::object("/Game/Tex/T_Apple.T_Apple"));
        let mut asset = AssetRecord::new("/Game/Items/DA_Apple");
        asset.properties.insert("ItemInformation".into(), PropertyValue::Struct { fields });
        host.insert_asset(asset);

        let handle = host.load_asset(&"/Game/Items/DA_Apple".into()).unwrap().unwrap();
        let out = DirectProperty
            .extract(&host, &handle, "ItemInformation", &["IconSmall".to_string()])
            .unwrap();
        assert_eq!(out["IconSmall"], PropertyValue::object("/Game/Tex/T_Apple"));
    }
}
