pub mod assembler;
pub mod filename;
pub mod writer;

use std::path::PathBuf;

use chrono::Local;

use crate::config::ReportOptions;
use crate::errors::MadResult;
use assembler::{Report, ReportContext, ReportInputs};

/// Assemble the report for `inputs` and write it. Returns the written path.
pub fn generate_report(
    inputs: &ReportInputs<'_>,
    ctx: &ReportContext<'_>,
    options: &ReportOptions,
) -> MadResult<PathBuf> {
    let report = Report::assemble(inputs, ctx, options)?;
    writer::write_report(&report, options, Local::now().naive_local())
}
