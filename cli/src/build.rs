use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use dialoguer::Confirm;
use log::{debug, info, warn};
use util::package::{package_project, PackageOptions, DEFAULT_ASSETS_DIR};
use util::zip::{check_output_path, ArchiveOptions, ArchiveSummary, SCRIPT_ENTRY};

use crate::compiler::{compiler_args, resolve_compiler, run_compiler};
use crate::errors::SbxError;
use crate::integrity::file_integrity;
use crate::manifest::SbxToml;

pub const ARCHIVE_EXTENSION: &str = "sbx";
pub const ACCEPTED_EXTENSIONS: &[&str] = &["sbx", "sbz", "sbzip"];

#[derive(Debug, Default)]
pub struct BuildArgs {
    pub output: Option<PathBuf>,
    pub force: bool,
    pub skip_compile: bool,
}

pub struct BuildOutcome {
    pub output: PathBuf,
    pub summary: ArchiveSummary,
    pub integrity: String,
}

/// `--output` is taken as given, `build.output` is relative to the project,
/// otherwise the archive is named after the project directory.
pub fn output_path(project_dir: &Path, manifest: &SbxToml, args: &BuildArgs) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    if let Some(output) = &manifest.build().output {
        return project_dir.join(output);
    }
    let name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string());
    project_dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION))
}

pub fn has_archive_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ACCEPTED_EXTENSIONS.contains(&ext))
}

/// Asks on the terminal whether an existing archive may be replaced.
/// Without a terminal the answer is no.
pub fn prompt_overwrite(path: &Path) -> Result<bool, SbxError> {
    if !std::io::stdin().is_terminal() {
        warn!("Cannot ask to overwrite {} without a terminal", path.display());
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()?;
    Ok(answer)
}

/// Compiles the project and packages it into a single archive.
pub fn build<F>(
    project_dir: &Path,
    manifest: &SbxToml,
    args: &BuildArgs,
    confirm_overwrite: F,
) -> Result<BuildOutcome, SbxError>
where
    F: FnOnce(&Path) -> Result<bool, SbxError>,
{
    if !project_dir.is_dir() {
        return Err(SbxError::InputDirectoryMissing {
            path: project_dir.display().to_string(),
        });
    }

    let settings = manifest.build();
    let output = output_path(project_dir, manifest, args);
    debug!("Output archive: {}", output.display());
    if !has_archive_extension(&output) {
        return Err(SbxError::InvalidOutputExtension {
            path: output.display().to_string(),
        });
    }

    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.is_dir() {
        return Err(SbxError::OutputDirectoryMissing {
            path: output.display().to_string(),
        });
    }

    check_output_path(&output, &project_dir.join(SCRIPT_ENTRY))?;

    if output.exists() {
        if args.force {
            info!("Overwriting {}", output.display());
        } else if !confirm_overwrite(&output)? {
            return Err(SbxError::OverwriteDeclined {
                path: output.display().to_string(),
            });
        }
    }

    if args.skip_compile {
        info!("Skipping compiler step");
    } else {
        let compiler = resolve_compiler(settings.compiler.as_deref());
        let arguments = compiler_args(settings.compiler_args.as_deref());
        run_compiler(&compiler, &arguments, project_dir)?;
    }

    let mut archive = ArchiveOptions::default();
    if let Some(compression) = settings.compression {
        archive.compression_method = compression.into();
    }
    let options = PackageOptions {
        assets_dir: settings
            .assets
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
        archive,
    };
    let summary = package_project(project_dir, &output, &options)?;
    let integrity = file_integrity(&output)?;

    Ok(BuildOutcome {
        output,
        summary,
        integrity,
    })
}
