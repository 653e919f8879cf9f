//! Persists a rendered report under the output directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::config::ReportOptions;
use crate::errors::MadResult;
use crate::report::assembler::Report;
use crate::report::filename::report_file_name;

/// Create `dir` unless it already exists.
pub fn ensure_output_dir(dir: &Path) -> MadResult<()> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)?;
        debug!(dir = %dir.display(), "created output directory");
    }
    Ok(())
}

/// A temp file in `dir` created with ordinary `0666 & !umask` permissions, so
/// the persisted report is readable like any other file in the directory.
fn report_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Write `report` to its final path in one step and return that path.
///
/// The text goes to a temp file in the output directory first and is then
/// renamed over the target, so a failed write leaves no partial report.
pub fn write_report(
    report: &Report,
    options: &ReportOptions,
    now: NaiveDateTime,
) -> MadResult<PathBuf> {
    let timestamp = options.add_timestamp.then_some(&now);
    let file_name = report_file_name(&options.file_name, timestamp)?;

    ensure_output_dir(&options.output_dir)?;
    let target = options.output_dir.join(file_name);

    let mut tmp = report_temp_file(&options.output_dir)?;
    tmp.write_all(report.render().as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target)?;

    info!(path = %target.display(), "wrote model report");
    Ok(target)
}
