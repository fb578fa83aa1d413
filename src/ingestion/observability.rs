//! Pipeline observers and alert severities.
//!
//! The orchestrator reports processed files, failed files and alerts through [`PipelineObserver`].
//! Alerts for failed files are gated by [`Severity`] against the configured threshold.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::EtlError;
use crate::types::{BatchStats, EntityKind};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (file processed, but with many row errors).
    Warning,
    /// Error-level event (file failed to parse).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl Severity {
    /// Severity of a file-level failure.
    pub fn for_error(e: &EtlError) -> Self {
        match e {
            EtlError::Io(_) | EtlError::Relocation { .. } | EtlError::Store(_) => Severity::Critical,
            EtlError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Severity::Critical,
                _ => Severity::Error,
            },
            #[cfg(feature = "excel")]
            EtlError::Excel(_) => Severity::Error,
            EtlError::Json(_) | EtlError::UnsupportedFormat { .. } | EtlError::Config(_) => Severity::Error,
        }
    }
}

/// Context about one file handled by the pipeline.
#[derive(Debug, Clone)]
pub struct FileContext {
    /// Path the file was discovered at.
    pub path: PathBuf,
    /// Entity kind, when classification got that far.
    pub entity: Option<EntityKind>,
}

/// Observer interface for per-file pipeline outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait PipelineObserver: Send + Sync {
    /// Called when a file completed its row loop and was moved to the processed location.
    fn on_file_processed(&self, _ctx: &FileContext, _stats: &BatchStats) {}

    /// Called when a file failed and was moved to the errors location.
    fn on_file_failed(&self, _ctx: &FileContext, _severity: Severity, _error: &EtlError) {}

    /// Called when an outcome meets an alert threshold.
    fn on_alert(&self, _ctx: &FileContext, _severity: Severity, _message: &str) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_file_processed(&self, ctx: &FileContext, stats: &BatchStats) {
        for o in &self.observers {
            o.on_file_processed(ctx, stats);
        }
    }

    fn on_file_failed(&self, ctx: &FileContext, severity: Severity, error: &EtlError) {
        for o in &self.observers {
            o.on_file_failed(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, message: &str) {
        for o in &self.observers {
            o.on_alert(ctx, severity, message);
        }
    }
}

/// Emits pipeline events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_file_processed(&self, ctx: &FileContext, stats: &BatchStats) {
        info!(
            path = %ctx.path.display(),
            entity = ?ctx.entity,
            total = stats.total,
            created = stats.created,
            errors = stats.errors.len(),
            "file processed"
        );
    }

    fn on_file_failed(&self, ctx: &FileContext, severity: Severity, error: &EtlError) {
        error!(path = %ctx.path.display(), ?severity, %error, "file failed");
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, message: &str) {
        warn!(path = %ctx.path.display(), ?severity, alert = message, "pipeline alert");
    }
}

/// Appends pipeline events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", Utc::now().to_rfc3339());
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_file_processed(&self, ctx: &FileContext, stats: &BatchStats) {
        self.append_line(&format!(
            "processed path={} total={} created={} errors={}",
            ctx.path.display(),
            stats.total,
            stats.created,
            stats.errors.len()
        ));
    }

    fn on_file_failed(&self, ctx: &FileContext, severity: Severity, error: &EtlError) {
        self.append_line(&format!(
            "failed severity={:?} path={} err={}",
            severity,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, message: &str) {
        self.append_line(&format!(
            "ALERT severity={:?} path={} msg={}",
            severity,
            ctx.path.display(),
            message
        ));
    }
}
