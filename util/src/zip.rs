use std::env;
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{DateTime, ZipArchive, ZipWriter};
pub use zip::CompressionMethod;

use crate::assets::AssetMap;
use crate::UtilError;

pub const SCRIPT_ENTRY: &str = "main.lua";
pub const SOURCE_MAP_ENTRY: &str = "main.lua.map";

pub struct ArchiveOptions {
    pub compression_method: CompressionMethod,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression_method: CompressionMethod::Deflated,
        }
    }
}

#[derive(Debug, Default)]
pub struct ArchiveSummary {
    /// Entry names in the order they were written.
    pub entries: Vec<String>,
    /// Source files deleted after the archive was finalized.
    pub removed: Vec<PathBuf>,
}

/// A file from the project tree that is moved into the archive: it is
/// embedded under `name` and deleted once the archive is complete.
pub struct ConsumedSource {
    pub name: &'static str,
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// The companion source map path for a script, `<script>.map`.
pub fn source_map_path(script: &Path) -> PathBuf {
    let mut path = script.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

/// Absolute form of `path` with `.`/`..` removed and symlinks resolved for
/// every prefix that exists. The file itself does not need to exist.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(dir) => dir.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
        if let Ok(real) = resolved.canonicalize() {
            resolved = real;
        }
    }
    resolved
}

pub fn is_same_path(a: &Path, b: &Path) -> bool {
    resolve_path(a) == resolve_path(b)
}

/// Fails with `OutputIsSource` when `output` names the script or its
/// source map under any spelling.
pub fn check_output_path(output: &Path, script: &Path) -> Result<(), UtilError> {
    let output_resolved = resolve_path(output);
    for source in [script.to_path_buf(), source_map_path(script)] {
        if resolve_path(&source) == output_resolved {
            return Err(UtilError::OutputIsSource {
                path: output.display().to_string(),
            });
        }
    }
    Ok(())
}

fn read_source(name: &'static str, path: &Path) -> Result<ConsumedSource, UtilError> {
    let contents = fs::read(path).map_err(|e| UtilError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(ConsumedSource {
        name,
        path: path.to_path_buf(),
        contents,
    })
}

/// Reads the script and, when present, its source map.
pub fn read_sources(script: &Path) -> Result<Vec<ConsumedSource>, UtilError> {
    if !script.is_file() {
        return Err(UtilError::MissingScript {
            path: script.display().to_string(),
        });
    }
    let mut sources = vec![read_source(SCRIPT_ENTRY, script)?];

    let map = source_map_path(script);
    if map.is_file() {
        sources.push(read_source(SOURCE_MAP_ENTRY, &map)?);
    } else {
        debug!("No source map at {}", map.display());
    }
    Ok(sources)
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    archive_path: &Path,
    name: &str,
    contents: &[u8],
    options: FileOptions,
) -> Result<(), UtilError> {
    let entry_error = |source| UtilError::ArchiveWrite {
        path: archive_path.display().to_string(),
        entry: name.to_string(),
        source,
    };
    zip.start_file(name, options).map_err(entry_error)?;
    zip.write_all(contents)
        .map_err(|e| entry_error(ZipError::Io(e)))?;
    Ok(())
}

/// Writes `sources` followed by every asset into a new archive on `writer`
/// and finalizes it. `archive_path` only names the archive in errors.
/// Returns the entry names in write order.
pub fn write_archive<W: Write + Seek>(
    writer: W,
    archive_path: &Path,
    sources: &[ConsumedSource],
    assets: &AssetMap,
    archive_options: &ArchiveOptions,
) -> Result<Vec<String>, UtilError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(archive_options.compression_method)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut entries = Vec::with_capacity(sources.len() + assets.len());
    for source in sources {
        debug!("adding {} as {} ...", source.path.display(), source.name);
        write_entry(&mut zip, archive_path, source.name, &source.contents, options)?;
        entries.push(source.name.to_string());
    }
    for asset in assets.iter() {
        write_entry(&mut zip, archive_path, &asset.key, &asset.contents, options)?;
        entries.push(asset.key.clone());
    }
    zip.finish().map_err(|e| UtilError::ArchiveFinish {
        path: archive_path.display().to_string(),
        source: e,
    })?;
    Ok(entries)
}

/// Deletes consumed sources. Only called once the archive holding them has
/// been finalized.
fn remove_sources(sources: Vec<ConsumedSource>) -> Result<Vec<PathBuf>, UtilError> {
    let mut removed = Vec::with_capacity(sources.len());
    for source in sources {
        fs::remove_file(&source.path).map_err(|e| UtilError::FileRemove {
            path: source.path.display().to_string(),
            source: e,
        })?;
        debug!("removed {}", source.path.display());
        removed.push(source.path);
    }
    Ok(removed)
}

/// Creates a fresh archive at `output` containing the script, its optional
/// source map and all assets, then deletes the script and source map.
///
/// The sources are deleted only after the archive is finalized. On any error
/// they are left untouched, and a partially written archive is removed.
pub fn build_archive(
    output: &Path,
    script: &Path,
    assets: &AssetMap,
    options: &ArchiveOptions,
) -> Result<ArchiveSummary, UtilError> {
    build_archive_with(output, script, assets, options, |path| File::create(path))
}

/// [`build_archive`] with the output writer opened by `create`.
pub fn build_archive_with<W, F>(
    output: &Path,
    script: &Path,
    assets: &AssetMap,
    options: &ArchiveOptions,
    create: F,
) -> Result<ArchiveSummary, UtilError>
where
    W: Write + Seek,
    F: FnOnce(&Path) -> io::Result<W>,
{
    check_output_path(output, script)?;
    let sources = read_sources(script)?;

    let writer = create(output).map_err(|e| UtilError::DestinationFileCreate {
        path: output.display().to_string(),
        source: e,
    })?;

    let entries = match write_archive(writer, output, &sources, assets, options) {
        Ok(entries) => entries,
        Err(err) => {
            if output.exists() {
                if let Err(e) = fs::remove_file(output) {
                    warn!(
                        "Failed to remove incomplete archive {}: {}",
                        output.display(),
                        e
                    );
                }
            }
            return Err(err);
        }
    };
    info!("Wrote {} entries to {}", entries.len(), output.display());

    let removed = remove_sources(sources)?;
    Ok(ArchiveSummary { entries, removed })
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>, UtilError> {
    let file = File::open(path).map_err(|e| UtilError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    ZipArchive::new(file).map_err(|e| UtilError::ArchiveRead {
        path: path.display().to_string(),
        source: e,
    })
}

/// Reads every file entry of an archive, in stored order. `archive_path`
/// only names the archive in errors.
pub fn read_archive<R: Read + Seek>(
    reader: R,
    archive_path: &Path,
) -> Result<Vec<(String, Vec<u8>)>, UtilError> {
    let read_error = |source| UtilError::ArchiveRead {
        path: archive_path.display().to_string(),
        source,
    };
    let mut archive = ZipArchive::new(reader).map_err(read_error)?;
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(read_error)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| read_error(ZipError::Io(e)))?;
        entries.push((name, contents));
    }
    Ok(entries)
}

pub fn read_archive_entries(path: &Path) -> Result<Vec<(String, Vec<u8>)>, UtilError> {
    let file = File::open(path).map_err(|e| UtilError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    read_archive(file, path)
}

/// Entry names with their uncompressed sizes, taken from the central
/// directory without decompressing anything.
pub fn list_archive(path: &Path) -> Result<Vec<(String, u64)>, UtilError> {
    let mut archive = open_archive(path)?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(|e| UtilError::ArchiveRead {
            path: path.display().to_string(),
            source: e,
        })?;
        if file.is_dir() {
            continue;
        }
        entries.push((file.name().to_string(), file.size()));
    }
    Ok(entries)
}
