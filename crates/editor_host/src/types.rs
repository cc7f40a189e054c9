// Core identifier and value types shared by the port and the engine.
//
// Assets are addressed by content-root-relative logical paths. Native types
// are addressed by `<script-module>.<type-name>` references the host can
// resolve against its type table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A content-root-relative logical path, e.g. `/Game/Framework/Data/DA_Apple`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, with any `.ObjectName` suffix stripped.
    ///
    /// `/Game/Data/DA_Apple.DA_Apple` and `/Game/Data/DA_Apple` both yield
    /// `DA_Apple`.
    pub fn short_name(&self) -> &str {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        last.split('.').next().unwrap_or(last)
    }

    /// Append a child segment: `/Game/Data` + `DA_Apple` → `/Game/Data/DA_Apple`.
    pub fn join(&self, segment: &str) -> AssetPath {
        AssetPath(format!("{}/{}", self.0.trim_end_matches('/'), segment))
    }

    /// True when `self` lives at or below `dir`.
    pub fn is_under(&self, dir: &AssetPath) -> bool {
        let dir = dir.0.trim_end_matches('/');
        self.0 == dir || self.0.starts_with(dir) && self.0.as_bytes().get(dir.len()) == Some(&b'/')
    }

    /// Strip a trailing `.ObjectName` object suffix, keeping the package path.
    pub fn package(&self) -> AssetPath {
        match self.0.rsplit_once('.') {
            Some((pkg, _)) if pkg.contains('/') => AssetPath(pkg.to_string()),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(s: &str) -> Self {
        AssetPath(s.to_string())
    }
}

/// Error produced when parsing a [`NativeTypeRef`].
#[derive(Debug, thiserror::Error)]
pub enum TypeRefError {
    #[error("native type reference `{0}` is not of the form <module>.<type>")]
    Malformed(String),
}

/// A stable `<script-module>.<type-name>` reference the host can resolve to a
/// runtime class or struct, e.g. `/Script/SLF.StatManagerComponent`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeTypeRef(String);

impl NativeTypeRef {
    pub fn parse(s: impl Into<String>) -> Result<Self, TypeRefError> {
        let s = s.into();
        let tail = s.rsplit('/').next().unwrap_or(&s);
        match tail.split_once('.') {
            Some((module, name)) if !module.is_empty() && !name.is_empty() => Ok(Self(s)),
            _ => Err(TypeRefError::Malformed(s)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<type-name>` part of the reference.
    pub fn type_name(&self) -> &str {
        let tail = self.0.rsplit('/').next().unwrap_or(&self.0);
        tail.split_once('.').map(|(_, n)| n).unwrap_or(tail)
    }
}

impl fmt::Display for NativeTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A class an asset can be parented to: either a native type or the
/// generated class of another asset (conventionally `<ShortName>_C`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassRef {
    Native { type_ref: NativeTypeRef },
    Generated { class_name: String },
}

impl ClassRef {
    pub fn native(type_ref: NativeTypeRef) -> Self {
        ClassRef::Native { type_ref }
    }

    pub fn generated(class_name: impl Into<String>) -> Self {
        ClassRef::Generated { class_name: class_name.into() }
    }

    pub fn as_native(&self) -> Option<&NativeTypeRef> {
        match self {
            ClassRef::Native { type_ref } => Some(type_ref),
            ClassRef::Generated { .. } => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ClassRef::Native { type_ref } => type_ref.as_str(),
            ClassRef::Generated { class_name } => class_name,
        }
    }
}

/// A property value readable or writable through the port.
///
/// Object references carry logical paths, never handles; resolving a path
/// back into a handle is the caller's job (the rehydrator does exactly that).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    ObjectRef { path: AssetPath },
    Struct { fields: BTreeMap<String, PropertyValue> },
    Text { value: String },
    Bool { value: bool },
    Number { value: f64 },
    List { items: Vec<PropertyValue> },
}

impl PropertyValue {
    pub fn object(path: impl Into<String>) -> Self {
        PropertyValue::ObjectRef { path: AssetPath::new(path) }
    }

    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Text { value: value.into() }
    }

    pub fn as_object_path(&self) -> Option<&AssetPath> {
        match self {
            PropertyValue::ObjectRef { path } => Some(path),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    /// Whether a value counts as "already set" for idempotent repairs.
    /// Empty structs, empty lists, and the literal text `None` do not.
    pub fn is_set(&self) -> bool {
        match self {
            PropertyValue::ObjectRef { .. } | PropertyValue::Bool { .. } | PropertyValue::Number { .. } => true,
            PropertyValue::Text { value } => !value.is_empty() && value != "None",
            PropertyValue::Struct { fields } => fields.values().any(PropertyValue::is_set),
            PropertyValue::List { items } => !items.is_empty(),
        }
    }
}
