//! `limb-rig` command-line tool: build or check a limb from a rig file

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use limb_rig::{build, logging, RigFile, RigReport};
use limb_scene::Scene;
use std::path::PathBuf;
use tracing::info;

fn cli() -> Command {
    let file_arg = Arg::new("file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Rig file (.toml or .json)");

    Command::new("limb-rig")
        .version(limb_rig::VERSION)
        .about("Synthesize a three-joint limb rig from a rig file")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every build step"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("build")
                .about("Build the limb into a fresh scene and print a report")
                .arg(file_arg.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a rig file without building")
                .arg(file_arg),
        )
}

fn file_of(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("file")
        .context("missing rig file argument")
}

fn run_build(args: &ArgMatches) -> Result<()> {
    let path = file_of(args)?;
    let file = RigFile::load(path).with_context(|| format!("loading {}", path.display()))?;
    let mut scene = Scene::new();
    let guides = file
        .instantiate(&mut scene)
        .context("creating guides from the rig file")?;
    let rig = build(&mut scene, file.build.clone(), guides)
        .with_context(|| format!("building {}", file.build.base_name()))?;
    let report = RigReport::collect(&scene, &rig).context("collecting the build report")?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn run_check(args: &ArgMatches) -> Result<()> {
    let path = file_of(args)?;
    let file = RigFile::load(path).with_context(|| format!("loading {}", path.display()))?;
    file.build
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    let mut scene = Scene::new();
    let guides = file.instantiate(&mut scene)?;
    limb_rig::LimbBuilder::new(&mut scene, file.build.clone(), guides)
        .with_context(|| format!("checking guides of {}", path.display()))?;
    info!(limb = %file.build.base_name(), "rig file is valid");
    println!("{}: ok ({})", path.display(), file.build.root_name());
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("verbose"), matches.get_flag("log-json"))?;

    match matches.subcommand() {
        Some(("build", args)) => run_build(args),
        Some(("check", args)) => run_check(args),
        _ => anyhow::bail!("no subcommand given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_reach_subcommands() {
        let matches = cli()
            .try_get_matches_from(["limb-rig", "build", "arm.toml", "--json", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "build");
        assert!(args.get_flag("json"));
        assert_eq!(file_of(args).unwrap(), &PathBuf::from("arm.toml"));
    }
}
