//! `rental-etl` loads vehicle-rental export files (riders, scooters, tariffs, rides, payments,
//! maintenance records) into a store, leaving an auditable error trail.
//!
//! The primary entrypoint is [`pipeline::Orchestrator`]: it discovers `.csv` / `.xlsx` / `.xls`
//! files in an input directory, classifies each one by file name, validates and transforms every
//! row, loads the survivors, writes `<file>.errors.json` when anything was rejected, and moves the
//! file to the processed or errors directory.
//!
//! ## Quick example
//!
//! ```no_run
//! use rental_etl::config::EtlConfig;
//! use rental_etl::load::MemoryStore;
//! use rental_etl::pipeline::Orchestrator;
//!
//! # fn main() -> Result<(), rental_etl::EtlError> {
//! let config = EtlConfig::load(None)?;
//! config.ensure_directories()?;
//! let mut orchestrator = Orchestrator::new(config, MemoryStore::new());
//! let report = orchestrator.run()?;
//! for (path, outcome) in &report.files {
//!     println!("{}: {:?}", path.display(), outcome);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Row outcomes
//!
//! Every extracted row ends up in exactly one place:
//!
//! - created in the store (counted in [`types::BatchStats::created`])
//! - rejected by its entity's rules ([`validation`])
//! - failed to transform ([`transform`]) or to load ([`load`])
//!
//! The last two kinds are recorded as strings in [`types::BatchStats::errors`], in encounter order.
//!
//! ## Modules
//!
//! - [`ingestion`]: file discovery, CSV/Excel parsing, pipeline observers
//! - [`validation`]: per-entity business rules
//! - [`transform`]: coercion into typed canonical records
//! - [`load`]: the store contract, in-memory and JSON-lines stores, the batch loader
//! - [`pipeline`]: the orchestrator, error reports and file relocation
//! - [`config`], [`logging`]: layered configuration and tracing setup

pub mod clock;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod load;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod types;
pub mod validation;

pub use error::{EtlError, EtlResult, StoreError, TransformError};
