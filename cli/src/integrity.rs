use std::fs::File;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha512};

use crate::errors::SbxError;

pub fn calculate_integrity(bytes: &[u8]) -> String {
    format_integrity(Sha512::digest(bytes).as_slice())
}

/// Streams `path` through SHA-512 and renders it as `sha512-<base64>`.
pub fn file_integrity(path: &Path) -> Result<String, SbxError> {
    let read_error = |e| SbxError::ReadFile {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let mut hasher = Sha512::new();
    std::io::copy(&mut file, &mut hasher).map_err(read_error)?;
    Ok(format_integrity(hasher.finalize().as_slice()))
}

fn format_integrity(hash: &[u8]) -> String {
    format!("sha512-{}", STANDARD.encode(hash))
}
