use anyhow::Result;
use async_trait::async_trait;
use clap::ArgAction::SetTrue;
use clap::{Arg, ArgMatches, Command};

use crate::commands::run::summarize;
use crate::commands::{downloads_arg, load_config};
use crate::cube2sphere::Cube2Sphere;
use crate::pipeline::{Pipeline, Stages};

pub struct Reconcile {}

#[async_trait]
impl crate::Subcommand for Reconcile {
    fn get_subcommand(&self) -> Command {
        Command::new("reconcile")
            .arg(downloads_arg())
            .arg(
                Arg::new("dry-run")
                    .long("dry-run")
                    .action(SetTrue)
                    .help("only log what would be moved and deleted"),
            )
            .about("Move already converted panoramas and the 3D export into place without running cube2sphere")
    }

    async fn run(&self, matches: &ArgMatches) -> Result<()> {
        let mut config = load_config(matches)?;
        if matches.get_flag("dry-run") {
            config.run.dry_run = true;
        }

        let projector = Cube2Sphere::new(&config.projection);
        let report = Pipeline::new(&config, &projector)
            .progress(!matches.get_flag("no-progress"))
            .run(Stages::ReconcileOnly)
            .await?;

        summarize(&report)
    }
}
