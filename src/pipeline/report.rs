//! Per-file error reports and file relocation.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EtlError, EtlResult};

fn file_name(path: &Path) -> EtlResult<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| EtlError::UnsupportedFormat {
        message: format!("path has no file name ({})", path.display()),
    })
}

/// `<errors_dir>/<source file name>.errors.json`
pub fn report_path(errors_dir: &Path, source: &Path) -> EtlResult<PathBuf> {
    let mut name = file_name(source)?.to_os_string();
    name.push(".errors.json");
    Ok(errors_dir.join(name))
}

/// Write `errors` as an indented JSON array of strings. Non-ASCII text is kept as-is.
pub fn write_error_report(errors_dir: &Path, source: &Path, errors: &[String]) -> EtlResult<PathBuf> {
    fs::create_dir_all(errors_dir)?;
    let path = report_path(errors_dir, source)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, errors)?;
    writer.flush()?;
    debug!(report = %path.display(), errors = errors.len(), "wrote error report");
    Ok(path)
}

/// Move `path` into `dest_dir`, keeping its file name. Falls back to copy + remove across devices.
pub fn move_file(path: &Path, dest_dir: &Path) -> EtlResult<PathBuf> {
    let relocation = |source| EtlError::Relocation {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dest_dir).map_err(relocation)?;
    let dest = dest_dir.join(file_name(path)?);
    if let Err(e) = fs::rename(path, &dest) {
        warn!(from = %path.display(), to = %dest.display(), error = %e, "rename failed, copying");
        fs::copy(path, &dest).map_err(relocation)?;
        fs::remove_file(path).map_err(relocation)?;
    }
    Ok(dest)
}
