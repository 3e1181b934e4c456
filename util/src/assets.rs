use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Component, Path};

use log::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::UtilError;

/// Every asset entry name starts with this prefix.
pub const ASSETS_PREFIX: &str = "assets/";

pub struct AssetFile {
    pub key: String,
    pub contents: Vec<u8>,
}

/// Archive-relative asset names mapped to file contents, kept in the order
/// the files were discovered.
#[derive(Default)]
pub struct AssetMap {
    files: Vec<AssetFile>,
    index: BTreeMap<String, usize>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset. A key that is already present is rejected and the map
    /// is left unchanged.
    pub fn insert(&mut self, key: String, contents: Vec<u8>) -> Result<(), String> {
        if self.index.contains_key(&key) {
            return Err(key);
        }
        self.index.insert(key.clone(), self.files.len());
        self.files.push(AssetFile { key, contents });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.index
            .get(key)
            .map(|&i| self.files[i].contents.as_slice())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.key.as_str())
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.contents.len()).sum()
    }
}

// Files before subdirectories at each level, then by name.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    a_dir
        .cmp(&b_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Builds the archive entry name for `path`, which must live under `root`.
pub fn asset_key(root: &Path, path: &Path) -> Result<String, UtilError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| UtilError::InvalidFilePath {
            path: path.display().to_string(),
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment.to_str().ok_or_else(|| UtilError::InvalidFilePath {
                    path: path.display().to_string(),
                })?;
                segments.push(segment);
            }
            Component::CurDir => {}
            _ => {
                return Err(UtilError::InvalidFilePath {
                    path: path.display().to_string(),
                })
            }
        }
    }
    if segments.is_empty() {
        return Err(UtilError::InvalidFilePath {
            path: path.display().to_string(),
        });
    }

    Ok(format!("{}{}", ASSETS_PREFIX, segments.join("/")))
}

/// Reads every regular file below `root` into an [`AssetMap`].
///
/// A missing `root` is not an error: packaging with no assets is valid, so an
/// empty map is returned. Symbolic links and special files are skipped with a
/// warning. Any error raised while walking the tree aborts the harvest.
pub fn harvest_assets<P: AsRef<Path>>(root: P) -> Result<AssetMap, UtilError> {
    let root = root.as_ref();
    let mut assets = AssetMap::new();

    if !root.exists() {
        warn!(
            "Assets directory {} does not exist, packaging without assets",
            root.display()
        );
        return Ok(assets);
    }
    if !root.is_dir() {
        return Err(UtilError::NotADirectory {
            path: root.display().to_string(),
        });
    }

    debug!("Harvesting assets from {}", root.display());
    let walker = WalkDir::new(root).follow_links(false).sort_by(files_first);
    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        let path = entry.path();
        if file_type.is_symlink() {
            warn!("Skipping symbolic link {}", path.display());
            continue;
        }
        if !file_type.is_file() {
            warn!("Skipping special file {}", path.display());
            continue;
        }

        let key = asset_key(root, path)?;
        let contents = std::fs::read(path).map_err(|e| UtilError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!("adding asset {} ({} bytes)", key, contents.len());
        assets
            .insert(key, contents)
            .map_err(|key| UtilError::DuplicateAssetKey {
                key,
                path: path.display().to_string(),
            })?;
    }

    info!(
        "Harvested {} assets ({} bytes) from {}",
        assets.len(),
        assets.total_bytes(),
        root.display()
    );
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_root_yields_empty_map() {
        let dir = tempdir().unwrap();
        let assets = harvest_assets(dir.path().join("assets")).unwrap();
        assert!(assets.is_empty());
        assert_eq!(assets.total_bytes(), 0);
    }

    #[test]
    fn test_root_that_is_a_file_is_rejected() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        fs::write(&root, b"not a directory").unwrap();
        assert!(matches!(
            harvest_assets(&root),
            Err(UtilError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_keys_are_prefixed_and_slash_separated() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        write(&root, "logo.png", b"png");
        write(&root, "sound/a.ogg", &[1, 2, 3, 4]);
        write(&root, "levels/world/1/map.json", b"{}");

        let assets = harvest_assets(&root).unwrap();
        let mut keys: Vec<&str> = assets.keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "assets/levels/world/1/map.json",
                "assets/logo.png",
                "assets/sound/a.ogg",
            ]
        );
        assert_eq!(assets.get("assets/sound/a.ogg"), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(assets.total_bytes(), 9);
    }

    #[test]
    fn test_files_come_before_subdirectories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        write(&root, "a/nested.txt", b"1");
        write(&root, "z.txt", b"2");
        write(&root, "b.txt", b"3");
        write(&root, "a/b/deeper.txt", b"4");

        let assets = harvest_assets(&root).unwrap();
        let keys: Vec<&str> = assets.keys().collect();
        assert_eq!(
            keys,
            vec![
                "assets/b.txt",
                "assets/z.txt",
                "assets/a/nested.txt",
                "assets/a/b/deeper.txt",
            ]
        );
    }

    #[test]
    fn test_empty_directories_contribute_nothing() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        fs::create_dir_all(root.join("empty/too")).unwrap();
        assert!(harvest_assets(&root).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        write(&root, "real.txt", b"real");
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path(), root.join("loop")).unwrap();

        let assets = harvest_assets(&root).unwrap();
        let keys: Vec<&str> = assets.keys().collect();
        assert_eq!(keys, vec!["assets/real.txt"]);
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let mut assets = AssetMap::new();
        assets.insert("assets/a".to_string(), vec![1]).unwrap();
        assert_eq!(
            assets.insert("assets/a".to_string(), vec![2]),
            Err("assets/a".to_string())
        );
        assert_eq!(assets.len(), 1);
        assert_eq!(assets.get("assets/a"), Some(&[1u8][..]));
    }

    #[test]
    fn test_asset_key_outside_root() {
        let root = Path::new("/project/assets");
        assert!(asset_key(root, Path::new("/elsewhere/file")).is_err());
        assert!(asset_key(root, root).is_err());
        assert_eq!(
            asset_key(root, Path::new("/project/assets/x/y.bin")).unwrap(),
            "assets/x/y.bin"
        );
    }
}
