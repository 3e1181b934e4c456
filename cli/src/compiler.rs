use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::errors::SbxError;

pub const DEFAULT_COMPILER: &str = "haxe";
pub const DEFAULT_COMPILER_ARGS: &[&str] = &["build.hxml"];

#[cfg(windows)]
const BUNDLED_BIN: &str = "haxe.exe";
#[cfg(not(windows))]
const BUNDLED_BIN: &str = "haxe";

/// Picks the compiler to run: an explicit name wins, then a `haxe` shipped
/// next to the running `sbx` executable, then `haxe` from `PATH`.
pub fn resolve_compiler(explicit: Option<&str>) -> PathBuf {
    let tool_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_compiler_from(tool_dir.as_deref(), explicit)
}

fn resolve_compiler_from(tool_dir: Option<&Path>, explicit: Option<&str>) -> PathBuf {
    if let Some(compiler) = explicit {
        return PathBuf::from(compiler);
    }
    if let Some(bundled) = tool_dir.map(|dir| dir.join(BUNDLED_BIN)) {
        if bundled.is_file() {
            debug!("Using bundled compiler {}", bundled.display());
            return bundled;
        }
    }
    PathBuf::from(DEFAULT_COMPILER)
}

/// Arguments for the compiler, `build.hxml` unless configured.
pub fn compiler_args(configured: Option<&[String]>) -> Vec<String> {
    match configured {
        Some(args) => args.to_vec(),
        None => DEFAULT_COMPILER_ARGS.iter().map(|a| a.to_string()).collect(),
    }
}

/// Runs the compiler inside `project_dir` and waits for it to finish.
pub fn run_compiler(compiler: &Path, args: &[String], project_dir: &Path) -> Result<(), SbxError> {
    info!("Running {} {}", compiler.display(), args.join(" "));
    let status = Command::new(compiler)
        .args(args)
        .current_dir(project_dir)
        .status()
        .map_err(|e| SbxError::CompilerSpawn {
            compiler: compiler.display().to_string(),
            source: e,
        })?;
    if !status.success() {
        return Err(SbxError::CompilerFailed {
            compiler: compiler.display().to_string(),
            status,
        });
    }
    debug!("Compiler finished with {}", status);
    Ok(())
}
