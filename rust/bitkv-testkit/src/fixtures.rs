//! Temporary fixture files for tests.

use std::io::{Seek, SeekFrom, Write};

/// Writes `contents` into a fresh temporary file with the given extension
/// and returns it positioned at the start.
///
/// The file is removed when the returned handle is dropped.
pub fn write_temp_file(contents: &str, extension: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("bitkv-")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}
