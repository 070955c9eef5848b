use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgMatches};

use crate::config::Config;

pub mod check;
pub mod discover;
pub mod reconcile;
pub mod run;

pub use check::Check;
pub use discover::Discover;
pub use reconcile::Reconcile;
pub use run::Run;

const DEFAULT_CONFIG: &str = "config.toml";

pub fn downloads_arg() -> Arg {
    Arg::new("downloads")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .help("downloads directory, one sub-directory per project [default: from config]")
}

/// Config from `--config` (must exist) or `config.toml` (optional), with the downloads override applied.
pub fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::parse_toml(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG)?,
    };

    if let Ok(Some(downloads)) = matches.try_get_one::<PathBuf>("downloads") {
        config.downloads_dir = downloads.clone();
    }

    Ok(config)
}
