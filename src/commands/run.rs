use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::ArgAction::SetTrue;
use clap::{Arg, ArgMatches, Command};

use crate::commands::{downloads_arg, load_config};
use crate::config::Config;
use crate::cube2sphere::Cube2Sphere;
use crate::pipeline::{Pipeline, ProjectStatus, RunReport, Stages};

pub struct Run {}

#[async_trait]
impl crate::Subcommand for Run {
    fn get_subcommand(&self) -> Command {
        Command::new("run")
            .arg(downloads_arg())
            .arg(
                Arg::new("jobs")
                    .short('j')
                    .long("jobs")
                    .value_parser(clap::value_parser!(usize))
                    .help("panoramas converted in parallel per project"),
            )
            .arg(
                Arg::new("timeout")
                    .long("timeout")
                    .value_parser(clap::value_parser!(u64))
                    .help("seconds before a cube2sphere run is killed"),
            )
            .arg(
                Arg::new("tool")
                    .long("tool")
                    .help("path of the cube2sphere executable"),
            )
            .arg(
                Arg::new("dry-run")
                    .long("dry-run")
                    .action(SetTrue)
                    .help("only log what would be converted, moved and deleted"),
            )
            .about("Convert panoramas to spherical jpegs and reduce every project to spherical/ and 3D/")
    }

    async fn run(&self, matches: &ArgMatches) -> Result<()> {
        let mut config = load_config(matches)?;
        apply_overrides(&mut config, matches);

        let projector = Cube2Sphere::new(&config.projection);
        if !config.run.dry_run {
            projector
                .check_available()
                .await
                .context("cube2sphere is required, see `check`")?;
        }

        let report = Pipeline::new(&config, &projector)
            .progress(!matches.get_flag("no-progress"))
            .run(Stages::All)
            .await?;

        summarize(&report)
    }
}

fn apply_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        config.run.concurrency = *jobs;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.projection.timeout_secs = *timeout;
    }
    if let Some(tool) = matches.get_one::<String>("tool") {
        config.projection.tool = tool.clone();
    }
    if matches.get_flag("dry-run") {
        config.run.dry_run = true;
    }
}

pub fn summarize(report: &RunReport) -> Result<()> {
    let count = |status: ProjectStatus| {
        report
            .projects
            .iter()
            .filter(|p| p.status == status)
            .count()
    };

    log::info!(
        "{} projects: {} reconciled, {} already done, {} without descriptor, {} failed",
        report.projects.len(),
        count(ProjectStatus::Reconciled),
        count(ProjectStatus::AlreadyReconciled),
        count(ProjectStatus::ReconcileSkipped),
        report.failed_projects()
    );

    for project in &report.projects {
        if let ProjectStatus::Failed(e) = &project.status {
            log::error!("{} failed: {}", project.name, e);
        }
        if !project.failed_units.is_empty() {
            log::error!(
                "{}: panoramas not converted: {}",
                project.name,
                project.failed_units.join(", ")
            );
        }
    }

    if !report.is_success() {
        bail!(
            "{} projects and {} panoramas failed",
            report.failed_projects(),
            report.failed_units()
        );
    }

    Ok(())
}
