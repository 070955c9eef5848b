use std::collections::BTreeSet;
use std::path::Path;

use crate::config::Layout;
use crate::error::{Error, Result};
use crate::layout::{AssetPaths, ProjectPaths};

#[derive(Debug, Clone)]
pub struct Project {
    pub paths: ProjectPaths,
    pub model: String,
    pub assets: AssetPaths,
    pub pano_ids: Vec<String>,
}

pub fn list_projects(downloads_dir: &Path) -> Result<Vec<String>> {
    let mut projects = list_names(downloads_dir, |path| path.is_dir())?;
    projects.sort();
    Ok(projects)
}

pub fn discover_project(downloads_dir: &Path, name: &str, layout: &Layout) -> Result<Project> {
    let paths = ProjectPaths::new(downloads_dir, name, layout);
    let model = select_model(&paths)?;
    let assets = paths.assets(&model);
    let pano_ids = pano_ids(&assets.pano_dir())?;

    Ok(Project {
        paths,
        model,
        assets,
        pano_ids,
    })
}

/// First model directory in lexicographic order.
pub fn select_model(project: &ProjectPaths) -> Result<String> {
    let models_dir = project.models_dir();
    if !models_dir.is_dir() {
        return Err(Error::MissingModel {
            project: project.name.clone(),
        });
    }

    let mut models = list_names(&models_dir, |path| path.is_dir())?;
    models.sort();

    if models.len() > 1 {
        log::warn!(
            "{}: found {} models, using {}",
            project.name,
            models.len(),
            models[0]
        );
    }

    models.into_iter().next().ok_or_else(|| Error::MissingModel {
        project: project.name.clone(),
    })
}

/// Deduplicated panorama ids of the cube faces in `pano_dir`. A missing directory has none.
pub fn pano_ids(pano_dir: &Path) -> Result<Vec<String>> {
    if !pano_dir.is_dir() {
        log::warn!("no panorama directory at {}", pano_dir.display());
        return Ok(vec![]);
    }

    let ids = list_names(pano_dir, |path| path.is_file())?
        .iter()
        .filter_map(|name| pano_id(name))
        .map(str::to_string)
        .collect::<BTreeSet<_>>();

    Ok(ids.into_iter().collect())
}

/// Everything before the first `_`; names without one are not cube faces.
pub fn pano_id(file_name: &str) -> Option<&str> {
    let (id, _) = file_name.split_once('_')?;
    if id.is_empty() {
        return None;
    }

    Some(id)
}

/// Stem of the first descriptor file in lexicographic order.
pub fn find_descriptor(assets: &AssetPaths) -> Result<Option<String>> {
    if !assets.root.is_dir() {
        return Ok(None);
    }

    let suffix = format!(".{}", assets.descriptor_ext());
    let mut stems = list_names(&assets.root, |path| path.is_file())?
        .into_iter()
        .filter_map(|name| name.strip_suffix(&suffix).map(str::to_string))
        .filter(|stem| !stem.is_empty())
        .collect::<Vec<_>>();
    stems.sort();

    if stems.len() > 1 {
        log::warn!(
            "found {} descriptors in {}, using {}{}",
            stems.len(),
            assets.root.display(),
            stems[0],
            suffix
        );
    }

    Ok(stems.into_iter().next())
}

pub fn is_reconciled(project: &ProjectPaths) -> bool {
    !project.models_dir().exists()
        && (project.spherical_dir().is_dir() || project.export_dir().is_dir())
}

fn list_names(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>> {
    let names = dir
        .read_dir()
        .map_err(Error::io(dir))?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if !keep(&path) {
                return None;
            }

            entry.file_name().into_string().ok()
        })
        .collect();

    Ok(names)
}
