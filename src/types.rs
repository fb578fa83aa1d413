//! Core data model types shared by every pipeline stage.
//!
//! Extraction produces [`RawRow`]s of untyped [`RawValue`]s, classified by a single
//! [`EntityKind`] per file. Validation yields a [`ValidationOutcome`] per row, and the orchestrator
//! folds row outcomes into [`BatchStats`], collected per file into a [`RunReport`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A single untyped cell value as found in the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Missing/empty cell.
    Null,
    /// Integer cell (spreadsheets only).
    Int(i64),
    /// Floating point cell (spreadsheets only).
    Float(f64),
    /// Boolean cell (spreadsheets only).
    Bool(bool),
    /// Text cell. CSV cells are always text.
    Text(String),
}

impl RawValue {
    /// `true` for null cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Render the value as trimmed text. Blank values render as `None`.
    pub fn to_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(match self {
            RawValue::Null => return None,
            RawValue::Int(i) => i.to_string(),
            RawValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            RawValue::Bool(b) => b.to_string(),
            RawValue::Text(s) => s.trim().to_string(),
        })
    }

    /// Interpret the value as a finite number. Text is parsed; booleans are not numbers.
    ///
    /// `NaN`, infinities and text that overflows `f64` (such as `1e400`) are not numbers.
    pub fn to_f64(&self) -> Option<f64> {
        let f = match self {
            RawValue::Int(i) => *i as f64,
            RawValue::Float(f) => *f,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        f.is_finite().then_some(f)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(s) => f.write_str(&s),
            None => f.write_str("None"),
        }
    }
}

/// A column-normalized record extracted from a source file.
///
/// Keys are normalized header names (see [`normalize_header`]). Columns a transformer does not
/// recognize are carried along and ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under an already-normalized column name.
    pub fn insert(&mut self, column: impl Into<String>, value: RawValue) {
        self.fields.insert(column.into(), value);
    }

    /// Builder-style insert of a text cell.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, RawValue::Text(value.to_string()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields.get(column)
    }

    /// The column's value if it is present and not blank.
    pub fn present(&self, column: &str) -> Option<&RawValue> {
        self.get(column).filter(|v| !v.is_blank())
    }

    /// The column's trimmed text if present and not blank.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(RawValue::to_text)
    }

    /// First non-blank text among `columns`, in order.
    pub fn text_any(&self, columns: &[&str]) -> Option<String> {
        columns.iter().find_map(|c| self.text(c))
    }

    /// `true` when every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(RawValue::is_blank)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Normalize a source column header: trimmed, lower-cased, whitespace replaced with underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// The domain category every row of a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Scooter,
    Tariff,
    Ride,
    Payment,
    Maintenance,
    Unknown,
}

impl EntityKind {
    /// Known kinds in classification priority order.
    pub const KNOWN: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Scooter,
        EntityKind::Tariff,
        EntityKind::Ride,
        EntityKind::Payment,
        EntityKind::Maintenance,
    ];

    /// Classify a file by case-insensitive substring match against its base name.
    ///
    /// The singular name is a substring of the plural, so one check covers both.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self::KNOWN
            .into_iter()
            .find(|kind| name.contains(kind.as_str()))
            .unwrap_or(EntityKind::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Scooter => "scooter",
            EntityKind::Tariff => "tariff",
            EntityKind::Ride => "ride",
            EntityKind::Payment => "payment",
            EntityKind::Maintenance => "maintenance",
            EntityKind::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != EntityKind::Unknown
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of validating one row. The first failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(String),
}

impl ValidationOutcome {
    pub fn reject(reason: impl Into<String>) -> Self {
        ValidationOutcome::Rejected(reason.into())
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected(r) => Some(r),
        }
    }
}

/// Per-file counters. `errors` keeps rejection and failure reasons in the order encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub created: usize,
    pub errors: Vec<String>,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What happened to a single discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileReport {
    /// The row loop completed; the file was moved to the processed location.
    Processed(BatchStats),
    /// A file-level failure; the file was moved to the errors location.
    Failed { error: String },
}

impl FileReport {
    pub fn stats(&self) -> Option<&BatchStats> {
        match self {
            FileReport::Processed(stats) => Some(stats),
            FileReport::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileReport::Failed { .. })
    }
}

/// Report of a whole run, keyed by the path each file was discovered at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunReport {
    pub files: BTreeMap<PathBuf, FileReport>,
}

impl RunReport {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&FileReport> {
        self.files.get(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.files.values().filter(|r| r.is_failed()).count()
    }
}
