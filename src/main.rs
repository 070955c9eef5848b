use anyhow::{anyhow, Result};
use clap::ArgAction::SetTrue;
use clap::{Arg, Command};

use scan2sphere::commands::{Check, Discover, Reconcile, Run};
use scan2sphere::{logger, Subcommand};

#[tokio::main]
async fn main() -> Result<()> {
    let subcommands: Vec<Box<dyn Subcommand>> = vec![
        Box::new(Run {}),
        Box::new(Reconcile {}),
        Box::new(Discover {}),
        Box::new(Check {}),
    ];

    let mut command = Command::new("scan2sphere")
        .about("Turn downloaded scans into spherical panoramas and a 3D export")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .help("config file [default: config.toml if present]"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(SetTrue)
                .help("log every file operation"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(SetTrue)
                .help("log one json object per line"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .global(true)
                .action(SetTrue)
                .help("hide progress bars"),
        );

    for subcommand in &subcommands {
        command = command.subcommand(subcommand.get_subcommand());
    }

    let matches = command.get_matches();

    let level = if matches.get_flag("verbose") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logger::init(level, matches.get_flag("json-logs"));

    let (name, submatches) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no subcommand given"))?;

    let subcommand = subcommands
        .iter()
        .find(|s| s.get_subcommand().get_name() == name)
        .ok_or_else(|| anyhow!("unknown subcommand {}", name))?;

    subcommand.run(submatches).await
}
