//! Property extraction and rehydration
//!
//! Reparenting a data asset onto a native class can drop property data on
//! the floor. The extractor snapshots the interesting properties into a
//! JSON cache before migration; the rehydrator writes them back onto the
//! migrated assets afterwards. Both passes are idempotent.

mod cache;
mod extractor;
mod rehydrator;
mod strategy;

pub use cache::{CacheError, CategoryData, ExtractionCache};
pub use extractor::{ExtractReport, Extractor};
pub use rehydrator::{RehydrateReport, Rehydrator};
pub use strategy::{DirectProperty, StructFieldStrategy, TextExport, normalize_object_path};
