//! Orchestrator: drives files through extract, validate, transform, load, report and relocate.
//!
//! Each file follows `discovered -> extracting -> rows -> relocated(processed)`, or
//! `discovered -> extracting -> relocated(errors)` when anything before relocation fails. Row-level
//! failures never leave the row; file-level failures never leave [`Orchestrator::run`].

pub mod report;
pub mod row;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::EtlConfig;
use crate::error::EtlResult;
use crate::ingestion::{Extractor, FileContext, PipelineObserver, Severity};
use crate::load::{Loader, Store};
use crate::types::{BatchStats, EntityKind, FileReport, RunReport};

pub use report::{move_file, report_path, write_error_report};
pub use row::{RowOutcome, stage_row};

pub struct Orchestrator<S: Store> {
    config: EtlConfig,
    extractor: Extractor,
    loader: Loader<S>,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl<S: Store> std::fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("loader_closed", &self.loader.is_closed())
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl<S: Store> Orchestrator<S> {
    /// Build an orchestrator reading from `config.input_dir` and loading into `store`.
    pub fn new(config: EtlConfig, store: S) -> Self {
        let extractor = Extractor::new(config.input_dir.clone());
        let loader = Loader::new(store, config.chunk_size);
        Self {
            config,
            extractor,
            loader,
            clock: Arc::new(SystemClock),
            observer: None,
        }
    }

    /// Replace the processing-time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn loader(&self) -> &Loader<S> {
        &self.loader
    }

    /// Process one file end to end and move it to the processed location.
    ///
    /// Errors are not recovered here; [`Orchestrator::run`] relocates the file on failure. A file
    /// that fails leaves no error report behind.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn process_file(&mut self, path: &Path) -> EtlResult<BatchStats> {
        let (kind, rows) = self.extractor.extract_entity(path, self.config.sheet.as_deref())?;
        info!(entity = %kind, rows = rows.len(), "processing file");

        let now = self.clock.now();
        let mut stats = BatchStats::new();
        let mut ready = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            stats.total += 1;
            match stage_row(kind, row, now) {
                RowOutcome::Ready(canonical) => ready.push(canonical),
                RowOutcome::Rejected(reason) => {
                    debug!(row = idx + 1, %reason, "row rejected");
                    stats.errors.push(reason);
                }
                RowOutcome::Failed(reason) => {
                    warn!(row = idx + 1, %reason, "row failed to transform");
                    stats.errors.push(reason);
                }
            }
        }

        if !ready.is_empty() {
            self.loader.load(ready, &mut stats);
        }
        let report = if stats.errors.is_empty() {
            None
        } else {
            Some(write_error_report(&self.config.errors_dir, path, &stats.errors)?)
        };
        if let Err(e) = move_file(path, &self.config.processed_dir) {
            if let Some(report) = report {
                if let Err(remove_err) = std::fs::remove_file(&report) {
                    warn!(report = %report.display(), error = %remove_err, "could not remove error report");
                }
            }
            return Err(e);
        }
        Ok(stats)
    }

    /// Process every file present in the input location when the run starts, then release the
    /// store.
    pub fn run(&mut self) -> EtlResult<RunReport> {
        let report = self
            .extractor
            .list_available_files()
            .map(|files| self.process_all(files));
        let closed = self.loader.close();
        let report = report?;
        closed?;
        info!(
            files = report.len(),
            failed = report.failed_count(),
            "run complete"
        );
        Ok(report)
    }

    fn process_all(&mut self, files: Vec<std::path::PathBuf>) -> RunReport {
        let mut report = RunReport::default();
        for path in files {
            let outcome = match self.process_file(&path) {
                Ok(stats) => {
                    let ctx = FileContext {
                        path: path.clone(),
                        entity: Some(EntityKind::from_path(&path)),
                    };
                    self.notify_processed(&ctx, &stats);
                    FileReport::Processed(stats)
                }
                Err(e) => {
                    let severity = Severity::for_error(&e);
                    error!(path = %path.display(), ?severity, error = %e, "file failed");
                    if let Err(move_err) = move_file(&path, &self.config.errors_dir) {
                        error!(path = %path.display(), error = %move_err, "could not relocate failed file");
                    }
                    let ctx = FileContext {
                        path: path.clone(),
                        entity: None,
                    };
                    if let Some(obs) = self.observer.as_ref() {
                        obs.on_file_failed(&ctx, severity, &e);
                        if severity >= self.config.alert_at_or_above {
                            obs.on_alert(&ctx, severity, &e.to_string());
                        }
                    }
                    FileReport::Failed { error: e.to_string() }
                }
            };
            report.files.insert(path, outcome);
        }
        report
    }

    fn notify_processed(&self, ctx: &FileContext, stats: &BatchStats) {
        let Some(obs) = self.observer.as_ref() else {
            return;
        };
        obs.on_file_processed(ctx, stats);
        if stats.errors.len() > self.config.max_errors {
            obs.on_alert(
                ctx,
                Severity::Warning,
                &format!(
                    "{} row errors exceed max_errors={}",
                    stats.errors.len(),
                    self.config.max_errors
                ),
            );
        }
    }
}
