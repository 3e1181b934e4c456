#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("Script entry point not found: {path}")]
    MissingScript { path: String },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Output archive would overwrite its own input: {path}")]
    OutputIsSource { path: String },

    #[error("Invalid file path: {path}")]
    InvalidFilePath { path: String },

    #[error("Failed to read file '{path}': {source}")]
    FileRead { path: String, #[source] source: std::io::Error },

    #[error("Failed to remove file '{path}': {source}")]
    FileRemove { path: String, #[source] source: std::io::Error },

    #[error("Failed to create destination file '{path}': {source}")]
    DestinationFileCreate { path: String, #[source] source: std::io::Error },

    #[error("Failed to write entry '{entry}' to '{path}': {source}")]
    ArchiveWrite { path: String, entry: String, #[source] source: zip::result::ZipError },

    #[error("Failed to finalize archive '{path}': {source}")]
    ArchiveFinish { path: String, #[source] source: zip::result::ZipError },

    #[error("Failed to read archive '{path}': {source}")]
    ArchiveRead { path: String, #[source] source: zip::result::ZipError },

    #[error("Asset '{key}' resolved from more than one file (second: {path})")]
    DuplicateAssetKey { key: String, path: String },

    #[error("Failed to walk '{path}': {source}")]
    WalkDir { path: String, #[source] source: walkdir::Error },
}

impl From<walkdir::Error> for UtilError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        UtilError::WalkDir { path, source: err }
    }
}
