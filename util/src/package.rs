use std::path::{Path, PathBuf};

use log::info;

use crate::assets::harvest_assets;
use crate::zip::{build_archive, ArchiveOptions, ArchiveSummary, SCRIPT_ENTRY};
use crate::UtilError;

pub const DEFAULT_ASSETS_DIR: &str = "assets";

pub struct PackageOptions {
    /// Assets directory, relative to the project directory.
    pub assets_dir: PathBuf,
    pub archive: ArchiveOptions,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            archive: ArchiveOptions::default(),
        }
    }
}

/// Packages a compiled project directory into `output`.
///
/// Expects `main.lua` (and optionally `main.lua.map`) at the root of
/// `project_dir`. Assets are harvested completely before the archive is
/// created. On success the script and source map have been moved into the
/// archive and no longer exist in the project directory.
pub fn package_project(
    project_dir: &Path,
    output: &Path,
    options: &PackageOptions,
) -> Result<ArchiveSummary, UtilError> {
    let script = project_dir.join(SCRIPT_ENTRY);
    if !script.is_file() {
        return Err(UtilError::MissingScript {
            path: script.display().to_string(),
        });
    }

    let assets = harvest_assets(project_dir.join(&options.assets_dir))?;
    let summary = build_archive(output, &script, &assets, &options.archive)?;
    info!(
        "Packaged {} into {} ({} entries)",
        project_dir.display(),
        output.display(),
        summary.entries.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::read_archive_entries;
    use std::fs;
    use tempfile::tempdir;

    fn scaffold(project: &Path) {
        fs::write(project.join("main.lua"), b"print(1)").unwrap();
        let sound = project.join("assets").join("sound");
        fs::create_dir_all(&sound).unwrap();
        fs::write(sound.join("a.ogg"), [0x01u8, 0x02, 0x03, 0x04]).unwrap();
    }

    #[test]
    fn test_package_without_source_map() {
        let dir = tempdir().unwrap();
        let project = dir.path();
        scaffold(project);
        let output = project.join("out.sbx");

        let summary = package_project(project, &output, &PackageOptions::default()).unwrap();
        assert_eq!(summary.entries, vec!["main.lua", "assets/sound/a.ogg"]);

        let entries = read_archive_entries(&output).unwrap();
        assert_eq!(
            entries,
            vec![
                ("main.lua".to_string(), b"print(1)".to_vec()),
                ("assets/sound/a.ogg".to_string(), vec![0x01, 0x02, 0x03, 0x04]),
            ]
        );
        assert!(!project.join("main.lua").exists());
        assert!(project.join("assets/sound/a.ogg").exists());
    }

    #[test]
    fn test_package_with_source_map() {
        let dir = tempdir().unwrap();
        let project = dir.path();
        scaffold(project);
        fs::write(project.join("main.lua.map"), b"{}").unwrap();
        let output = project.join("out.sbx");

        package_project(project, &output, &PackageOptions::default()).unwrap();

        let entries = read_archive_entries(&output).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], ("main.lua.map".to_string(), b"{}".to_vec()));
        assert!(!project.join("main.lua").exists());
        assert!(!project.join("main.lua.map").exists());
        assert_eq!(
            fs::read(project.join("assets/sound/a.ogg")).unwrap(),
            vec![0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn test_package_without_assets_directory() {
        let dir = tempdir().unwrap();
        let project = dir.path();
        fs::write(project.join("main.lua"), b"print(1)").unwrap();
        let output = project.join("out.sbx");

        let summary = package_project(project, &output, &PackageOptions::default()).unwrap();
        assert_eq!(summary.entries, vec!["main.lua"]);
    }

    #[test]
    fn test_package_custom_assets_directory() {
        let dir = tempdir().unwrap();
        let project = dir.path();
        fs::write(project.join("main.lua"), b"print(1)").unwrap();
        fs::create_dir_all(project.join("res")).unwrap();
        fs::write(project.join("res/data.bin"), b"x").unwrap();
        let output = project.join("out.sbx");
        let options = PackageOptions {
            assets_dir: PathBuf::from("res"),
            ..PackageOptions::default()
        };

        let summary = package_project(project, &output, &options).unwrap();
        assert_eq!(summary.entries, vec!["main.lua", "assets/data.bin"]);
    }

    #[test]
    fn test_package_missing_script() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.sbx");
        let result = package_project(dir.path(), &output, &PackageOptions::default());
        assert!(matches!(result, Err(UtilError::MissingScript { .. })));
        assert!(!output.exists());
    }
}
