//! Report file naming.

use chrono::NaiveDateTime;

use crate::errors::{MadError, MadResult};

/// Timestamp inserted before the extension.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Extensions are exactly this many characters, dot included (`.txt`).
pub const EXTENSION_CHARS: usize = 4;

/// Split `name` into base and extension at the last four characters. Names
/// of four characters or fewer are all extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let chars = name.chars().count();
    let idx = name
        .char_indices()
        .nth(chars.saturating_sub(EXTENSION_CHARS))
        .map_or(0, |(idx, _)| idx);
    name.split_at(idx)
}

/// `<base>_<timestamp><ext>` when `timestamp` is set, otherwise `name`.
pub fn report_file_name(name: &str, timestamp: Option<&NaiveDateTime>) -> MadResult<String> {
    if name.is_empty() {
        return Err(MadError::Config("report file name is empty".to_string()));
    }
    match timestamp {
        None => Ok(name.to_string()),
        Some(ts) => {
            let (base, ext) = split_extension(name);
            Ok(format!("{base}_{}{ext}", ts.format(TIMESTAMP_FORMAT)))
        }
    }
}
