use std::path::Path;

use log::debug;
use util::zip::list_archive;

use crate::errors::SbxError;

/// One line per archive entry: size in bytes, then the entry name.
pub fn list_lines(archive: &Path) -> Result<Vec<String>, SbxError> {
    let entries = list_archive(archive)?;
    debug!("{} holds {} entries", archive.display(), entries.len());
    Ok(entries
        .iter()
        .map(|(name, size)| format!("{:>10}  {}", size, name))
        .collect())
}
