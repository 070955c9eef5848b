use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No model directory found in project: {project}")]
    MissingModel { project: String },

    #[error("No descriptor file found in: {}", .assets.display())]
    MissingDescriptor { assets: PathBuf },

    #[error("Panorama {id} is missing faces: {}", .missing.join(", "))]
    MissingFaces { id: String, missing: Vec<String> },

    #[error("Could not start projection tool {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        source: std::io::Error,
    },

    #[error("Projection of {id} failed: {status} -> {stderr}")]
    ProjectionFailed {
        id: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Projection tool {tool} did not respond within {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    #[error("Projection of {id} timed out after {secs}s")]
    ProjectionTimeout { id: String, secs: u64 },

    #[error("Projection of {id} produced no output at: {}", .path.display())]
    MissingOutput { id: String, path: PathBuf },

    #[error("Normalization of {} failed: {source}", .path.display())]
    Normalization {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
