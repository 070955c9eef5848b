use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::Projection;
use crate::error::{Error, Result};
use crate::layout::{AssetPaths, CubeFaces, OutputStem};

#[derive(Debug, Clone)]
pub struct PanoUnit {
    pub id: String,
    pub faces: CubeFaces,
    pub output: OutputStem,
}

impl PanoUnit {
    pub fn new(assets: &AssetPaths, id: &str) -> Self {
        Self {
            id: id.to_string(),
            faces: assets.faces(id),
            output: assets.output_stem(id),
        }
    }
}

/// Turns the cube faces of a unit into an equirectangular image and returns its path.
#[async_trait]
pub trait Projector: Send + Sync {
    async fn project(&self, unit: &PanoUnit) -> Result<PathBuf>;

    fn format(&self) -> &str;
}

pub struct Cube2Sphere {
    config: Projection,
}

impl Cube2Sphere {
    pub fn new(config: &Projection) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn command(&self, unit: &PanoUnit) -> Command {
        let [x, y, z] = self.config.rotation;

        let mut cmd = Command::new(&self.config.tool);
        cmd.args(&self.config.tool_args)
            .args(unit.faces.in_tool_order())
            .arg("-r")
            .args([self.config.width.to_string(), self.config.height.to_string()])
            .arg("-R")
            .args([x.to_string(), y.to_string(), z.to_string()])
            .args(["-f", self.config.format.as_str()])
            .arg("-o")
            .arg(unit.output.as_path());
        cmd
    }

    pub async fn check_available(&self) -> Result<()> {
        let mut cmd = Command::new(&self.config.tool);
        cmd.args(&self.config.tool_args)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| Error::ToolUnavailable {
            tool: self.config.tool.clone(),
            source,
        })?;

        match tokio::time::timeout(self.config.timeout(), child.wait()).await {
            Ok(status) => {
                let status = status.map_err(Error::io(&self.config.tool))?;
                log::debug!("{} --help exited with {}", self.config.tool, status);
                Ok(())
            }
            Err(_) => Err(Error::ToolTimeout {
                tool: self.config.tool.clone(),
                secs: self.config.timeout_secs,
            }),
        }
    }
}

#[async_trait]
impl Projector for Cube2Sphere {
    async fn project(&self, unit: &PanoUnit) -> Result<PathBuf> {
        if self.config.check_faces {
            let missing = unit.faces.missing();
            if !missing.is_empty() {
                return Err(Error::MissingFaces {
                    id: unit.id.clone(),
                    missing,
                });
            }
        }

        let mut cmd = self.command(unit);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!("running: {:?}", cmd);
        let child = cmd.spawn().map_err(|source| Error::ToolUnavailable {
            tool: self.config.tool.clone(),
            source,
        })?;

        // dropping the child on timeout kills it
        let output = tokio::time::timeout(self.config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| Error::ProjectionTimeout {
                id: unit.id.clone(),
                secs: self.config.timeout_secs,
            })?
            .map_err(Error::io(&self.config.tool))?;

        if !output.status.success() {
            return Err(Error::ProjectionFailed {
                id: unit.id.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let intermediate = unit.output.intermediate(&self.config.format);
        if !intermediate.is_file() {
            return Err(Error::MissingOutput {
                id: unit.id.clone(),
                path: intermediate,
            });
        }

        Ok(intermediate)
    }

    fn format(&self) -> &str {
        &self.config.format
    }
}
