use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub downloads_dir: PathBuf,
    pub projection: Projection,
    pub normalize: Normalize,
    pub layout: Layout,
    pub run: Run,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub tool: String,
    /// Arguments placed before the face paths, e.g. `["-m", "cube2sphere"]` for a python launcher.
    pub tool_args: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub rotation: [i32; 3],
    pub format: String,
    pub timeout_secs: u64,
    pub check_faces: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Normalize {
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub models_dir: String,
    pub assets_dir: String,
    pub pano_dir: String,
    pub descriptor_ext: String,
    pub spherical_dir: String,
    pub export_dir: String,
    pub texture_dir: String,
    pub texture_suffix: String,
    pub output_suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Run {
    pub concurrency: usize,
    pub dry_run: bool,
}

impl Config {
    pub fn parse_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_file = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&config_file)
    }

    /// Reads `path` when it exists and falls back to defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::parse_toml(path)
    }

    fn parse(config: &str) -> Result<Self> {
        let config: Config = toml::from_str(config)?;
        Ok(config)
    }
}

impl Projection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            projection: Projection::default(),
            normalize: Normalize::default(),
            layout: Layout::default(),
            run: Run::default(),
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            tool: "cube2sphere".to_string(),
            tool_args: vec![],
            width: 4096,
            height: 2048,
            rotation: [0, 0, 180],
            format: "png".to_string(),
            timeout_secs: 600,
            check_faces: true,
        }
    }
}

impl Default for Normalize {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            assets_dir: "assets".to_string(),
            pano_dir: "pan/2k/_".to_string(),
            descriptor_ext: "dam".to_string(),
            spherical_dir: "spherical".to_string(),
            export_dir: "3D".to_string(),
            texture_dir: "_".to_string(),
            texture_suffix: "_texture_jpg_high".to_string(),
            output_suffix: "spherical".to_string(),
        }
    }
}

impl Default for Run {
    fn default() -> Self {
        Self {
            concurrency: 1,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn test_parse_toml() -> Result<()> {
        let config = Config::parse_toml("config.test.toml")?;

        assert_eq!(config.downloads_dir, PathBuf::from("/var/scans"));
        assert_eq!(config.projection.tool, "/opt/cube2sphere/bin/cube2sphere");
        assert_eq!(config.projection.width, 2048);
        assert_eq!(config.projection.height, 1024);
        assert_eq!(config.projection.timeout(), Duration::from_secs(30));
        assert!(!config.projection.check_faces);
        assert_eq!(config.normalize.jpeg_quality, 90);
        assert_eq!(config.run.concurrency, 4);

        // untouched sections keep their defaults
        assert_eq!(config.projection.rotation, [0, 0, 180]);
        assert_eq!(config.projection.format, "png");
        assert_eq!(config.layout.pano_dir, "pan/2k/_");
        assert!(!config.run.dry_run);

        Ok(())
    }

    #[test]
    fn test_example_matches_defaults() -> Result<()> {
        let example = Config::parse_toml("config.example.toml")?;
        let defaults = Config::default();

        assert_eq!(example.downloads_dir, defaults.downloads_dir);
        assert_eq!(example.projection.width, defaults.projection.width);
        assert_eq!(example.projection.rotation, defaults.projection.rotation);
        assert_eq!(example.normalize.jpeg_quality, defaults.normalize.jpeg_quality);
        assert_eq!(example.layout.texture_suffix, defaults.layout.texture_suffix);
        assert_eq!(example.run.concurrency, defaults.run.concurrency);

        Ok(())
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() -> Result<()> {
        let config = Config::load_or_default("does-not-exist.toml")?;
        assert_eq!(config.projection.width, 4096);
        assert_eq!(config.layout.export_dir, "3D");

        Ok(())
    }
}
