use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{ArgMatches, Command};

use crate::commands::{downloads_arg, load_config};
use crate::discover::{discover_project, find_descriptor, is_reconciled, list_projects};
use crate::layout::ProjectPaths;

pub struct Discover {}

#[async_trait]
impl crate::Subcommand for Discover {
    fn get_subcommand(&self) -> Command {
        Command::new("discover")
            .arg(downloads_arg())
            .about("List projects, their model, descriptor and panoramas without changing anything")
    }

    async fn run(&self, matches: &ArgMatches) -> Result<()> {
        let config = load_config(matches)?;
        let downloads_dir = &config.downloads_dir;

        let projects = list_projects(downloads_dir)
            .with_context(|| format!("cannot list {}", downloads_dir.display()))?;

        for name in projects {
            if is_reconciled(&ProjectPaths::new(downloads_dir, &name, &config.layout)) {
                println!("{}: already reconciled", name);
                continue;
            }

            let project = match discover_project(downloads_dir, &name, &config.layout) {
                Ok(project) => project,
                Err(e) => {
                    println!("{}: {}", name, e);
                    continue;
                }
            };

            let descriptor = find_descriptor(&project.assets)?
                .map(|stem| format!("{}.{}", stem, project.assets.descriptor_ext()))
                .unwrap_or_else(|| "<none>".to_string());

            println!(
                "{}: model {}, descriptor {}, {} panoramas",
                name,
                project.model,
                descriptor,
                project.pano_ids.len()
            );
            for id in &project.pano_ids {
                println!("  {}", id);
            }
        }

        Ok(())
    }
}
