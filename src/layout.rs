//! Path conventions of the downloads tree.
//!
//! ```text
//! <downloads>/<project>/models/<model>/assets/
//!     <stem>.dam, <stem>.obj, <stem>.mtl
//!     pan/2k/_/<id>_skybox{0..5}.jpg
//!     _/<stem>_texture_jpg_high/<stem>_NNN.jpg
//! <downloads>/<project>/spherical/<id>_spherical.jpg
//! <downloads>/<project>/3D/<stem>.{obj,mtl}, <stem>_NNN.jpg
//! ```

use std::path::{Path, PathBuf};

use crate::config::Layout;

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub name: String,
    pub root: PathBuf,
    layout: Layout,
}

impl ProjectPaths {
    pub fn new(downloads_dir: &Path, name: &str, layout: &Layout) -> Self {
        Self {
            name: name.to_string(),
            root: downloads_dir.join(name),
            layout: layout.clone(),
        }
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(&self.layout.models_dir)
    }

    pub fn spherical_dir(&self) -> PathBuf {
        self.root.join(&self.layout.spherical_dir)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root.join(&self.layout.export_dir)
    }

    pub fn assets(&self, model: &str) -> AssetPaths {
        AssetPaths {
            root: self
                .models_dir()
                .join(model)
                .join(&self.layout.assets_dir),
            layout: self.layout.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub root: PathBuf,
    layout: Layout,
}

impl AssetPaths {
    pub fn pano_dir(&self) -> PathBuf {
        self.root.join(&self.layout.pano_dir)
    }

    /// Panoramas are written here first and moved out during reconciliation.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(&self.layout.spherical_dir)
    }

    pub fn descriptor_ext(&self) -> &str {
        &self.layout.descriptor_ext
    }

    pub fn geometry(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{}.obj", stem))
    }

    pub fn material(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{}.mtl", stem))
    }

    pub fn texture_dir(&self, stem: &str) -> PathBuf {
        self.root
            .join(&self.layout.texture_dir)
            .join(format!("{}{}", stem, self.layout.texture_suffix))
    }

    pub fn face(&self, id: &str, index: u8) -> PathBuf {
        self.pano_dir().join(format!("{}_skybox{}.jpg", id, index))
    }

    pub fn faces(&self, id: &str) -> CubeFaces {
        CubeFaces {
            top: self.face(id, 0),
            back: self.face(id, 1),
            right: self.face(id, 2),
            front: self.face(id, 3),
            left: self.face(id, 4),
            bottom: self.face(id, 5),
        }
    }

    pub fn output_stem(&self, id: &str) -> OutputStem {
        OutputStem(
            self.staging_dir()
                .join(format!("{}_{}", id, self.layout.output_suffix)),
        )
    }
}

/// `<stem>_NNN.jpg`: matching prefix, `.jpg` extension and a three character counter.
pub fn is_texture_name(stem: &str, name: &str) -> bool {
    let prefix = format!("{}_", stem);
    name.starts_with(&prefix)
        && name.ends_with(".jpg")
        && name.chars().count() == format!("{}000.jpg", prefix).chars().count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeFaces {
    pub front: PathBuf,
    pub back: PathBuf,
    pub right: PathBuf,
    pub left: PathBuf,
    pub top: PathBuf,
    pub bottom: PathBuf,
}

impl CubeFaces {
    /// Positional order expected by cube2sphere.
    pub fn in_tool_order(&self) -> [&Path; 6] {
        [
            &self.front,
            &self.back,
            &self.right,
            &self.left,
            &self.top,
            &self.bottom,
        ]
    }

    pub fn missing(&self) -> Vec<String> {
        self.in_tool_order()
            .iter()
            .filter(|face| !face.is_file())
            .map(|face| face.display().to_string())
            .collect()
    }
}

/// Output path without extension, as handed to the projection tool via `-o`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStem(PathBuf);

impl OutputStem {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// The tool appends a frame counter: `<stem>0001.<ext>`.
    pub fn intermediate(&self, format: &str) -> PathBuf {
        let mut name = self.0.as_os_str().to_owned();
        name.push(format!("0001.{}", format));
        PathBuf::from(name)
    }

    pub fn jpeg(&self) -> PathBuf {
        let mut name = self.0.as_os_str().to_owned();
        name.push(".jpg");
        PathBuf::from(name)
    }
}
