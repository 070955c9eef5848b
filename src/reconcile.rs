use std::fs;
use std::path::{Path, PathBuf};

use crate::discover::find_descriptor;
use crate::error::{Error, Result};
use crate::layout::{is_texture_name, AssetPaths, ProjectPaths};

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub descriptor: String,
    pub moved: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
}

/// Moves the outputs of a project into `spherical/` and `3D/` and deletes everything else.
pub struct Reconciler<'a> {
    project: &'a ProjectPaths,
    assets: &'a AssetPaths,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(project: &'a ProjectPaths, assets: &'a AssetPaths) -> Self {
        Self {
            project,
            assets,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Without a descriptor nothing is moved or deleted.
    pub fn run(&self) -> Result<ReconcileReport> {
        let stem = find_descriptor(self.assets)?.ok_or_else(|| Error::MissingDescriptor {
            assets: self.assets.root.clone(),
        })?;

        let mut report = ReconcileReport {
            descriptor: stem.clone(),
            ..Default::default()
        };

        self.move_panoramas(&mut report)?;
        self.move_export(&stem, &mut report)?;
        self.prune(&mut report)?;

        Ok(report)
    }

    fn move_panoramas(&self, report: &mut ReconcileReport) -> Result<()> {
        let staging = self.assets.staging_dir();
        let spherical = self.project.spherical_dir();

        if !staging.is_dir() {
            return self.create_dir(&spherical);
        }

        if !spherical.exists() {
            self.move_path(&staging, &spherical)?;
            report.moved.push(spherical);
            return Ok(());
        }

        // merge into the output of an earlier run
        for entry in read_dir(&staging)? {
            let dst = spherical.join(entry.file_name());
            self.move_path(&entry.path(), &dst)?;
            report.moved.push(dst);
        }
        if !self.dry_run {
            fs::remove_dir(&staging).map_err(Error::io(&staging))?;
        }

        Ok(())
    }

    fn move_export(&self, stem: &str, report: &mut ReconcileReport) -> Result<()> {
        let export = self.project.export_dir();
        self.create_dir(&export)?;

        for src in [self.assets.geometry(stem), self.assets.material(stem)] {
            if !src.is_file() {
                log::debug!("skipping missing {}", src.display());
                continue;
            }
            let dst = export.join(file_name(&src));
            self.move_path(&src, &dst)?;
            report.moved.push(dst);
        }

        let texture_dir = self.assets.texture_dir(stem);
        if !texture_dir.is_dir() {
            log::debug!("no texture directory at {}", texture_dir.display());
            return Ok(());
        }

        for entry in read_dir(&texture_dir)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_texture_name(stem, name) {
                continue;
            }

            let dst = export.join(name);
            self.move_path(&entry.path(), &dst)?;
            report.moved.push(dst);
        }

        Ok(())
    }

    /// Deletes every entry of the project directory except the two output directories.
    /// Protected paths are compared as resolved paths, never by name prefix.
    fn prune(&self, report: &mut ReconcileReport) -> Result<()> {
        let root = canonical(&self.project.root)?;
        let protected = [
            root.join(file_name(&self.project.spherical_dir())),
            root.join(file_name(&self.project.export_dir())),
        ];

        for entry in read_dir(&self.project.root)? {
            let resolved = root.join(entry.file_name());
            if protected.contains(&resolved) {
                continue;
            }

            let path = entry.path();
            if self.dry_run {
                log::info!("would delete {}", path.display());
                report.pruned.push(path);
                continue;
            }

            let file_type = entry.file_type().map_err(Error::io(&path))?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path).map_err(Error::io(&path))?;
            } else {
                fs::remove_file(&path).map_err(Error::io(&path))?;
            }
            log::debug!("deleted {}", path.display());
            report.pruned.push(path);
        }

        Ok(())
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        if self.dry_run {
            if !dir.exists() {
                log::info!("would create {}", dir.display());
            }
            return Ok(());
        }

        fs::create_dir_all(dir).map_err(Error::io(dir))
    }

    fn move_path(&self, src: &Path, dst: &Path) -> Result<()> {
        if self.dry_run {
            log::info!("would move {} -> {}", src.display(), dst.display());
            return Ok(());
        }

        log::debug!("moving {} -> {}", src.display(), dst.display());
        move_path(src, dst)
    }
}

/// `rename`, falling back to copy and remove for files on another filesystem.
pub fn move_path(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if src.is_file() => {
            log::debug!("rename of {} failed ({}), copying", src.display(), e);
            fs::copy(src, dst).map_err(Error::io(dst))?;
            fs::remove_file(src).map_err(Error::io(src))
        }
        Err(e) => Err(Error::Io {
            path: src.to_path_buf(),
            source: e,
        }),
    }
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    dir.read_dir()
        .map_err(Error::io(dir))?
        .map(|entry| entry.map_err(Error::io(dir)))
        .collect()
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(Error::io(path))
}

fn file_name(path: &Path) -> &std::ffi::OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use anyhow::Result;
    use tempfile::TempDir;

    use super::*;
    use crate::config::Layout;

    struct Fixture {
        _dir: TempDir,
        project: ProjectPaths,
        assets: AssetPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let project = ProjectPaths::new(dir.path(), "proj1", &Layout::default());
            let assets = project.assets("m1");
            fs::create_dir_all(&assets.root).unwrap();
            Self {
                _dir: dir,
                project,
                assets,
            }
        }

        fn touch(&self, path: &Path) {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
        }

        /// Relative paths of every file and directory under the project.
        fn tree(&self) -> BTreeSet<String> {
            fn walk(root: &Path, dir: &Path, out: &mut BTreeSet<String>) {
                for entry in fs::read_dir(dir).unwrap() {
                    let path = entry.unwrap().path();
                    out.insert(path.strip_prefix(root).unwrap().display().to_string());
                    if path.is_dir() {
                        walk(root, &path, out);
                    }
                }
            }

            let mut out = BTreeSet::new();
            walk(&self.project.root, &self.project.root, &mut out);
            out
        }

        fn populate(&self) {
            self.touch(&self.assets.root.join("scan.dam"));
            self.touch(&self.assets.geometry("scan"));
            self.touch(&self.assets.material("scan"));
            self.touch(&self.assets.output_stem("abc").jpeg());
            self.touch(&self.assets.face("abc", 0));
            let textures = self.assets.texture_dir("scan");
            self.touch(&textures.join("scan_000.jpg"));
            self.touch(&textures.join("scan_001.jpg"));
            self.touch(&textures.join("scan_0001.jpg"));
            self.touch(&textures.join("other_000.jpg"));
            self.touch(&self.project.root.join("notes.txt"));
        }
    }

    fn names(set: &[&str]) -> BTreeSet<String> {
        set.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reconcile() -> Result<()> {
        let fx = Fixture::new();
        fx.populate();

        let report = Reconciler::new(&fx.project, &fx.assets).run()?;
        assert_eq!(report.descriptor, "scan");
        assert_eq!(report.moved.len(), 5);

        assert_eq!(
            fx.tree(),
            names(&[
                "3D",
                "3D/scan.mtl",
                "3D/scan.obj",
                "3D/scan_000.jpg",
                "3D/scan_001.jpg",
                "spherical",
                "spherical/abc_spherical.jpg",
            ])
        );

        Ok(())
    }

    #[test]
    fn test_twice_is_noop() -> Result<()> {
        let fx = Fixture::new();
        fx.populate();
        Reconciler::new(&fx.project, &fx.assets).run()?;
        let before = fx.tree();

        let again = Reconciler::new(&fx.project, &fx.assets).run();
        assert!(matches!(again, Err(Error::MissingDescriptor { .. })));
        assert_eq!(fx.tree(), before);

        Ok(())
    }

    #[test]
    fn test_missing_descriptor_leaves_tree() -> Result<()> {
        let fx = Fixture::new();
        fx.populate();
        fs::remove_file(fx.assets.root.join("scan.dam"))?;
        let before = fx.tree();

        let result = Reconciler::new(&fx.project, &fx.assets).run();
        assert!(matches!(result, Err(Error::MissingDescriptor { .. })));
        assert_eq!(fx.tree(), before);
        assert!(!fx.project.spherical_dir().exists());
        assert!(!fx.project.export_dir().exists());

        Ok(())
    }

    #[test]
    fn test_prune_keeps_only_outputs() -> Result<()> {
        let fx = Fixture::new();
        fx.touch(&fx.assets.root.join("scan.dam"));
        for name in ["spherical2", "spheric", "3", "3D.bak", "x3D", "_spherical"] {
            fx.touch(&fx.project.root.join(name).join("file"));
        }
        fx.touch(&fx.project.root.join("3Dx"));
        fx.touch(&fx.project.spherical_dir().join("old_spherical.jpg"));

        let report = Reconciler::new(&fx.project, &fx.assets).run()?;
        assert_eq!(report.pruned.len(), 8);

        assert_eq!(
            fx.tree(),
            names(&["3D", "spherical", "spherical/old_spherical.jpg"])
        );

        Ok(())
    }

    #[test]
    fn test_merge_into_existing_spherical() -> Result<()> {
        let fx = Fixture::new();
        fx.populate();
        fx.touch(&fx.project.spherical_dir().join("old_spherical.jpg"));

        Reconciler::new(&fx.project, &fx.assets).run()?;

        assert!(fx.project.spherical_dir().join("old_spherical.jpg").is_file());
        assert!(fx.project.spherical_dir().join("abc_spherical.jpg").is_file());
        assert!(!fx.project.models_dir().exists());

        Ok(())
    }

    #[test]
    fn test_missing_obj_and_textures_are_skipped() -> Result<()> {
        let fx = Fixture::new();
        fx.touch(&fx.assets.root.join("scan.dam"));
        fx.touch(&fx.assets.material("scan"));

        Reconciler::new(&fx.project, &fx.assets).run()?;

        assert_eq!(fx.tree(), names(&["3D", "3D/scan.mtl", "spherical"]));

        Ok(())
    }

    #[test]
    fn test_dry_run_changes_nothing() -> Result<()> {
        let fx = Fixture::new();
        fx.populate();
        let before = fx.tree();

        let report = Reconciler::new(&fx.project, &fx.assets)
            .dry_run(true)
            .run()?;

        assert_eq!(fx.tree(), before);
        assert_eq!(report.moved.len(), 5);
        assert_eq!(report.pruned.len(), 2);
        assert!(report.pruned.contains(&fx.project.models_dir()));
        assert!(report.pruned.contains(&fx.project.root.join("notes.txt")));

        Ok(())
    }
}
