use std::path::Path;

use futures_util::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::cube2sphere::{PanoUnit, Projector};
use crate::discover::{self, Project};
use crate::error::{Error, Result};
use crate::layout::ProjectPaths;
use crate::normalize;
use crate::reconcile::Reconciler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stages {
    All,
    ReconcileOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    Reconciled,
    /// No descriptor; converted panoramas stay in the asset tree.
    ReconcileSkipped,
    AlreadyReconciled,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ProjectReport {
    pub name: String,
    pub status: ProjectStatus,
    pub converted: usize,
    pub failed_units: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    pub fn failed_projects(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| matches!(p.status, ProjectStatus::Failed(_)))
            .count()
    }

    pub fn failed_units(&self) -> usize {
        self.projects.iter().map(|p| p.failed_units.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed_projects() == 0 && self.failed_units() == 0
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
    projector: &'a dyn Projector,
    progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, projector: &'a dyn Projector) -> Self {
        Self {
            config,
            projector,
            progress: false,
        }
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, stages: Stages) -> Result<RunReport> {
        let downloads_dir = &self.config.downloads_dir;
        let names = discover::list_projects(downloads_dir)?;
        log::info!("found {} projects in {}", names.len(), downloads_dir.display());

        let pb = self.bar(names.len(), "projects");
        let mut report = RunReport::default();

        for name in names {
            pb.set_message(name.clone());
            let project = self.run_project(downloads_dir, &name, stages).await;
            match &project.status {
                ProjectStatus::Failed(e) => log::error!("{}: {}", name, e),
                status => log::info!(
                    "{}: {:?}, {} panoramas converted, {} failed",
                    name,
                    status,
                    project.converted,
                    project.failed_units.len()
                ),
            }
            report.projects.push(project);
            pb.inc(1);
        }

        pb.finish_with_message("done");
        Ok(report)
    }

    /// Never fails; errors end up in the returned report.
    pub async fn run_project(
        &self,
        downloads_dir: &Path,
        name: &str,
        stages: Stages,
    ) -> ProjectReport {
        let mut report = ProjectReport {
            name: name.to_string(),
            status: ProjectStatus::Reconciled,
            converted: 0,
            failed_units: vec![],
        };

        let paths = ProjectPaths::new(downloads_dir, name, &self.config.layout);
        if discover::is_reconciled(&paths) {
            report.status = ProjectStatus::AlreadyReconciled;
            return report;
        }

        let project = match discover::discover_project(downloads_dir, name, &self.config.layout) {
            Ok(project) => project,
            Err(e) => {
                report.status = ProjectStatus::Failed(e.to_string());
                return report;
            }
        };

        if stages == Stages::All {
            if let Err(e) = self.convert_panoramas(&project, &mut report).await {
                report.status = ProjectStatus::Failed(e.to_string());
                return report;
            }
        }

        // every unit has finished here, so pruning cannot race a conversion
        let reconciler =
            Reconciler::new(&project.paths, &project.assets).dry_run(self.config.run.dry_run);
        match reconciler.run() {
            Ok(result) => {
                log::debug!(
                    "{}: moved {} entries, pruned {}",
                    name,
                    result.moved.len(),
                    result.pruned.len()
                );
            }
            Err(e @ Error::MissingDescriptor { .. }) => {
                log::warn!("{}: {}, leaving project untouched", name, e);
                report.status = ProjectStatus::ReconcileSkipped;
            }
            Err(e) => report.status = ProjectStatus::Failed(e.to_string()),
        }

        report
    }

    async fn convert_panoramas(&self, project: &Project, report: &mut ProjectReport) -> Result<()> {
        let staging = project.assets.staging_dir();
        if !self.config.run.dry_run {
            std::fs::create_dir_all(&staging).map_err(Error::io(&staging))?;
        }

        let pb = self.bar(project.pano_ids.len(), "panoramas");
        pb.set_message(project.paths.name.clone());

        let concurrency = self.config.run.concurrency.max(1);
        let units = project
            .pano_ids
            .iter()
            .map(|id| PanoUnit::new(&project.assets, id))
            .collect::<Vec<_>>();

        let results = stream::iter(units)
            .map(|unit| {
                let pb = pb.clone();
                async move {
                    let result = self.convert_unit(&unit).await;
                    pb.inc(1);
                    (unit.id, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        pb.finish_and_clear();

        for (id, result) in results {
            match result {
                Ok(()) => report.converted += 1,
                Err(e) => {
                    log::error!("{}/{}: {}", project.paths.name, id, e);
                    report.failed_units.push(id);
                }
            }
        }
        report.failed_units.sort();

        Ok(())
    }

    async fn convert_unit(&self, unit: &PanoUnit) -> Result<()> {
        if self.config.run.dry_run {
            log::info!("would convert {} -> {}", unit.id, unit.output.jpeg().display());
            return Ok(());
        }

        let result = match self.projector.project(unit).await {
            Ok(intermediate) => {
                normalize::to_jpeg_blocking(
                    intermediate,
                    unit.output.jpeg(),
                    self.config.normalize.jpeg_quality,
                )
                .await
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            // leftovers would otherwise end up in spherical/
            discard_intermediate(&unit.output.intermediate(self.projector.format()));
        }
        result?;

        log::debug!("wrote {}", unit.output.jpeg().display());
        Ok(())
    }

    fn bar(&self, len: usize, unit: &str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        let template = format!(
            "[{{bar:40.green/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        );
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏"));
        }
        pb
    }
}

/// Returns false when a leftover exists but could not be removed.
fn discard_intermediate(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            log::warn!("could not remove intermediate {}: {}", path.display(), e);
            false
        }
    }
}
