use std::path::{Path, PathBuf};

use serde::Deserialize;
use util::zip::CompressionMethod;

use crate::errors::SbxError;

pub const MANIFEST_FILE: &str = "sbx.toml";

#[derive(Debug, Default, Deserialize)]
pub struct SbxToml {
    pub build: Option<BuildSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    pub output: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub compiler: Option<String>,
    pub compiler_args: Option<Vec<String>>,
    pub compression: Option<Compression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

impl SbxToml {
    fn from_str(path: &Path, contents: &str) -> Result<Self, SbxError> {
        toml::from_str(contents).map_err(|e| SbxError::ManifestParse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Walks up from `start_dir` looking for `sbx.toml`. Returns the directory
    /// holding it together with the parsed manifest.
    pub fn load_nearest(start_dir: PathBuf) -> Result<Option<(PathBuf, Self)>, SbxError> {
        let mut current_dir = start_dir;
        loop {
            let mut file_path = current_dir.join(MANIFEST_FILE);
            if file_path.is_file() {
                let contents =
                    std::fs::read_to_string(&file_path).map_err(|e| SbxError::ReadFile {
                        path: file_path.display().to_string(),
                        source: e,
                    })?;
                let manifest = Self::from_str(&file_path, &contents)?;
                file_path.pop();
                return Ok(Some((file_path, manifest)));
            }
            if !current_dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Loads `sbx.toml` from `dir` only, or the defaults when it has none.
    pub fn load_in(dir: &Path) -> Result<Self, SbxError> {
        let file_path = dir.join(MANIFEST_FILE);
        if !file_path.is_file() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&file_path).map_err(|e| SbxError::ReadFile {
            path: file_path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&file_path, &contents)
    }

    pub fn build(&self) -> &BuildSection {
        static EMPTY: BuildSection = BuildSection {
            output: None,
            assets: None,
            compiler: None,
            compiler_args: None,
            compression: None,
        };
        self.build.as_ref().unwrap_or(&EMPTY)
    }
}
