use std::env;
use std::path::PathBuf;

use clap::{arg, command, value_parser, ArgAction, ArgMatches, Command};
use log::{debug, error, info, LevelFilter};

use crate::build::BuildArgs;
use crate::errors::SbxError;
use crate::manifest::{SbxToml, MANIFEST_FILE};

mod build;
mod compiler;
mod errors;
mod inspect;
mod integrity;
mod logger;
mod manifest;

fn main() {
    if let Err(e) = run_main() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn cli() -> Command {
    command!()
        .arg(arg!(--"log-level" <LEVEL> "Set log level").value_parser(["off", "error", "warn", "info", "debug", "trace"]).global(true))
        .arg(arg!(--"no-color" "Disable colored output").action(ArgAction::SetTrue).global(true))
        .subcommand(
            Command::new("build")
                .about("Compile the project and package it into a .sbx archive")
                .arg(arg!(-i --input <DIR> "Project directory to compile and package").value_parser(value_parser!(PathBuf)))
                .arg(arg!(-o --output <PATH> "Where to write the archive (.sbx, .sbz or .sbzip)").value_parser(value_parser!(PathBuf)))
                .arg(arg!(-f --force "Overwrite an existing archive without asking").visible_short_alias('w').visible_alias("overwrite").action(ArgAction::SetTrue))
                .arg(arg!(--"skip-compile" "Package the existing main.lua without running the compiler").action(ArgAction::SetTrue))
        )
        .subcommand(
            Command::new("list")
                .about("List the entries of a .sbx archive")
                .arg(arg!(<archive> "The archive to inspect").value_parser(value_parser!(PathBuf)))
        )
        .arg_required_else_help(true)
        .args_conflicts_with_subcommands(true)
}

fn run_build(matches: &ArgMatches) -> Result<(), SbxError> {
    let current_dir =
        env::current_dir().map_err(|e| SbxError::CurrentDirectory { source: e })?;
    debug!("Current directory: {}", current_dir.display());

    let (project_dir, manifest) = if let Some(input) = matches.get_one::<PathBuf>("input") {
        info!("Using input directory: {}", input.display());
        let manifest = if input.is_dir() {
            SbxToml::load_in(input)?
        } else {
            SbxToml::default()
        };
        (input.clone(), manifest)
    } else {
        match SbxToml::load_nearest(current_dir.clone())? {
            Some((dir, manifest)) => {
                info!("Found {} at: {}", MANIFEST_FILE, dir.display());
                (dir, manifest)
            }
            None => {
                debug!("No {} found, using defaults", MANIFEST_FILE);
                (current_dir, SbxToml::default())
            }
        }
    };

    let args = BuildArgs {
        output: matches.get_one::<PathBuf>("output").cloned(),
        force: matches.get_flag("force"),
        skip_compile: matches.get_flag("skip-compile"),
    };
    debug!("Build options: {:?}", args);

    let outcome = build::build(&project_dir, &manifest, &args, build::prompt_overwrite)?;
    println!("Integrity: {}", outcome.integrity);
    println!(
        "Packed {} entries into {}",
        outcome.summary.entries.len(),
        outcome.output.display()
    );
    Ok(())
}

fn run_main() -> Result<(), SbxError> {
    let matches = cli().get_matches();

    let no_color = matches.get_flag("no-color");
    let level = matches
        .get_one::<String>("log-level")
        .and_then(|level| logger::level_from_str(level))
        .unwrap_or(LevelFilter::Error);
    if let Err(e) = logger::init_logger(level, !no_color) {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }
    info!("sbx starting with log level: {:?}", level);

    if let Some(matches) = matches.subcommand_matches("build") {
        info!("Running 'build' subcommand");
        run_build(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("list") {
        info!("Running 'list' subcommand");
        let archive = matches
            .get_one::<PathBuf>("archive")
            .ok_or_else(|| SbxError::Internal {
                message: "Archive argument is required".to_string(),
            })?;
        for line in inspect::list_lines(archive)? {
            println!("{}", line);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let matches = cli()
            .try_get_matches_from(["sbx", "build", "-o", "out.sbx", "--force"])
            .unwrap();
        let build = matches.subcommand_matches("build").unwrap();
        assert_eq!(build.get_one::<PathBuf>("output"), Some(&PathBuf::from("out.sbx")));
        assert!(build.get_flag("force"));
        assert!(!build.get_flag("skip-compile"));
    }

    #[test]
    fn test_overwrite_alias_and_input() {
        for flag in ["-w", "--overwrite", "-f"] {
            let matches = cli()
                .try_get_matches_from(["sbx", "build", "-i", "game", flag])
                .unwrap();
            let build = matches.subcommand_matches("build").unwrap();
            assert!(build.get_flag("force"), "{}", flag);
            assert_eq!(build.get_one::<PathBuf>("input"), Some(&PathBuf::from("game")));
        }
    }

    #[test]
    fn test_global_log_level_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["sbx", "list", "game.sbx", "--log-level", "debug"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("log-level").map(String::as_str),
            Some("debug")
        );
    }
}
