use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};

use crate::commands::load_config;
use crate::cube2sphere::Cube2Sphere;

pub struct Check {}

#[async_trait]
impl crate::Subcommand for Check {
    fn get_subcommand(&self) -> Command {
        Command::new("check")
            .arg(
                Arg::new("tool")
                    .long("tool")
                    .help("path of the cube2sphere executable"),
            )
            .about("Verify that cube2sphere can be started")
    }

    async fn run(&self, matches: &ArgMatches) -> Result<()> {
        let mut config = load_config(matches)?;
        if let Some(tool) = matches.get_one::<String>("tool") {
            config.projection.tool = tool.clone();
        }

        Cube2Sphere::new(&config.projection)
            .check_available()
            .await
            .with_context(|| format!("{} is not usable", config.projection.tool))?;

        log::info!("{} is available", config.projection.tool);
        Ok(())
    }
}
