//! Extractor: file discovery, format inference and entity classification.
//!
//! Most callers should use [`Extractor`], which:
//!
//! - lists supported files in an input directory ([`Extractor::list_available_files`])
//! - parses a file into normalized [`RawRow`]s, inferring the format from the extension
//!   ([`Extractor::extract_data`])
//! - classifies a file by its name into an [`EntityKind`] ([`Extractor::extract_entity`])

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{EtlError, EtlResult};
use crate::types::{EntityKind, RawRow};

use super::csv;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format of `path` from its extension.
    pub fn from_path(path: &Path) -> EtlResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| EtlError::UnsupportedFormat {
                message: format!("path has no extension ({})", path.display()),
            })?;

        Self::from_extension(ext).ok_or_else(|| EtlError::UnsupportedFormat {
            message: format!("extension '{ext}' is not supported ({})", path.display()),
        })
    }
}

/// Discovers and parses source files from one input directory.
#[derive(Debug, Clone)]
pub struct Extractor {
    input_dir: PathBuf,
}

impl Extractor {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// List files with a supported extension directly inside the input directory.
    ///
    /// Order follows the directory listing and is not guaranteed across platforms.
    pub fn list_available_files(&self) -> EtlResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.input_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let supported = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .and_then(SourceFormat::from_extension)
                .is_some();
            if supported {
                files.push(entry.into_path());
            }
        }
        info!(dir = %self.input_dir.display(), count = files.len(), "discovered input files");
        Ok(files)
    }

    /// Parse a whole file into rows.
    ///
    /// For spreadsheets, `sheet` selects a sheet by name; the first sheet is used otherwise.
    /// CSV files ignore `sheet`.
    pub fn extract_data(&self, path: &Path, sheet: Option<&str>) -> EtlResult<Vec<RawRow>> {
        let rows = match SourceFormat::from_path(path)? {
            SourceFormat::Csv => csv::extract_csv_from_path(path)?,
            SourceFormat::Excel => extract_excel_dispatch(path, sheet)?,
        };
        debug!(path = %path.display(), rows = rows.len(), "extracted rows");
        Ok(rows)
    }

    /// Classify the file by name and extract its rows.
    pub fn extract_entity(&self, path: &Path, sheet: Option<&str>) -> EtlResult<(EntityKind, Vec<RawRow>)> {
        let rows = self.extract_data(path, sheet)?;
        Ok((EntityKind::from_path(path), rows))
    }
}

fn extract_excel_dispatch(path: &Path, sheet: Option<&str>) -> EtlResult<Vec<RawRow>> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sheet);

    #[cfg(feature = "excel")]
    {
        super::excel::extract_excel_from_path(path, sheet)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(EtlError::UnsupportedFormat {
            message: "excel extraction not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
