use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageEncoder};

use crate::error::{Error, Result};

/// Re-encodes `src` as an opaque JPEG at `dst` and removes `src` afterwards.
/// Alpha is dropped, not composited.
pub fn to_jpeg(src: &Path, dst: &Path, quality: u8) -> Result<()> {
    let img = image::open(src).map_err(|source| Error::Normalization {
        path: src.to_path_buf(),
        source,
    })?;

    if img.color().has_alpha() {
        log::debug!("dropping alpha channel of {}", src.display());
    }
    let rgb = img.to_rgb8();

    if let Err(e) = write_jpeg(&rgb, dst, quality) {
        let _ = std::fs::remove_file(dst);
        return Err(e);
    }

    std::fs::remove_file(src).map_err(Error::io(src))?;

    Ok(())
}

fn write_jpeg(rgb: &image::RgbImage, dst: &Path, quality: u8) -> Result<()> {
    let file = File::create(dst).map_err(Error::io(dst))?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|source| Error::Normalization {
            path: dst.to_path_buf(),
            source,
        })?;

    writer.flush().map_err(Error::io(dst))
}

pub async fn to_jpeg_blocking(src: PathBuf, dst: PathBuf, quality: u8) -> Result<()> {
    let path = src.clone();
    tokio::task::spawn_blocking(move || to_jpeg(&src, &dst, quality))
        .await
        .map_err(|e| Error::Io {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?
}
