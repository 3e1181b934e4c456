#[derive(Debug, thiserror::Error)]
pub enum SbxError {
    #[error("Failed to get current directory: {source}")]
    CurrentDirectory { #[source] source: std::io::Error },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile { path: String, #[source] source: std::io::Error },

    #[error("Failed to parse {path}: {source}")]
    ManifestParse { path: String, #[source] source: toml::de::Error },

    #[error("Input directory '{path}' does not exist")]
    InputDirectoryMissing { path: String },

    #[error("Output path '{path}' must end in .sbx, .sbz or .sbzip")]
    InvalidOutputExtension { path: String },

    #[error("Output path has no parent directory: {path}")]
    OutputDirectoryMissing { path: String },

    #[error("Failed to start compiler '{compiler}': {source}")]
    CompilerSpawn { compiler: String, #[source] source: std::io::Error },

    #[error("Compiler '{compiler}' exited with {status}")]
    CompilerFailed { compiler: String, status: std::process::ExitStatus },

    #[error("'{path}' already exists, not overwriting")]
    OverwriteDeclined { path: String },

    #[error("Failed to prompt for confirmation: {message}")]
    Prompt { message: String },

    #[error("Failed to package project: {source}")]
    Package { #[source] source: util::UtilError },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<util::UtilError> for SbxError {
    fn from(err: util::UtilError) -> Self {
        SbxError::Package { source: err }
    }
}

impl From<dialoguer::Error> for SbxError {
    fn from(err: dialoguer::Error) -> Self {
        SbxError::Prompt { message: err.to_string() }
    }
}
