//! Extraction entrypoints and implementations.
//!
//! Most callers should use [`Extractor`] (from [`unified`]) which:
//!
//! - discovers `.csv` / `.xlsx` / `.xls` files in an input directory
//! - auto-detects format by file extension and parses rows with normalized headers
//! - classifies each file into an [`crate::types::EntityKind`] by its name
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileContext, FileObserver, PipelineObserver, Severity, TracingObserver,
};
pub use unified::{Extractor, SourceFormat};
