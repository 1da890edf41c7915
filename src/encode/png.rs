use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameOrder, FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{RollError, RollResult};
use crate::render::frame::FrameRGBA;
use std::path::{Path, PathBuf};

/// Write one frame as a PNG file.
pub fn save_png(path: &Path, frame: &FrameRGBA) -> RollResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| RollError::encoding(format!("write png '{}': {e}", path.display())))
}

/// File name of frame `idx` inside a sequence directory.
pub fn frame_file_name(idx: FrameIndex) -> String {
    format!("{:08}.png", idx.0)
}

/// Sink writing one PNG per frame into a directory.
///
/// Frames are written into a staging directory beside the target, which is renamed into place by
/// `end`. `abort` removes the staging directory, leaving any previous target untouched.
#[derive(Debug)]
pub struct PngSequenceSink {
    out_dir: PathBuf,
    overwrite: bool,
    staging: Option<PathBuf>,
    order: FrameOrder,
    written: u64,
}

impl PngSequenceSink {
    /// Sink writing into `out_dir`, replacing an existing directory on success.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            overwrite: true,
            staging: None,
            order: FrameOrder::default(),
            written: 0,
        }
    }

    /// Refuse to start when the target directory already exists.
    pub fn no_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }

    /// Target directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Frames written by the current or last render.
    pub fn frames_written(&self) -> u64 {
        self.written
    }

    fn discard(&mut self) {
        if let Some(staging) = self.staging.take() {
            let _ = std::fs::remove_dir_all(&staging);
        }
        self.order.finish();
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> RollResult<()> {
        if self.staging.is_some() {
            return Err(RollError::encoding("png sink already started"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RollError::encoding("png sink width/height must be non-zero"));
        }
        if !self.overwrite && self.out_dir.exists() {
            return Err(RollError::encoding(format!(
                "output directory '{}' already exists",
                self.out_dir.display()
            )));
        }

        let staging = staging_dir(&self.out_dir);
        ensure_parent_dir(&staging)?;
        if staging.exists() {
            std::fs::remove_dir_all(&staging).map_err(|e| {
                RollError::encoding(format!(
                    "remove stale staging directory '{}': {e}",
                    staging.display()
                ))
            })?;
        }
        std::fs::create_dir(&staging).map_err(|e| {
            RollError::encoding(format!(
                "create staging directory '{}': {e}",
                staging.display()
            ))
        })?;

        tracing::debug!(staging = %staging.display(), "png sequence started");
        self.staging = Some(staging);
        self.order.start(cfg);
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RollResult<()> {
        self.order.check(idx, frame)?;
        let Some(staging) = self.staging.as_ref() else {
            return Err(RollError::encoding("png sink not started"));
        };
        save_png(&staging.join(frame_file_name(idx)), frame)?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> RollResult<()> {
        self.order
            .config()
            .ok_or_else(|| RollError::encoding("png sink not started"))?;
        let Some(staging) = self.staging.take() else {
            return Err(RollError::encoding("png sink not started"));
        };
        self.order.finish();

        if !self.overwrite && self.out_dir.exists() {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(RollError::encoding(format!(
                "output directory '{}' appeared during rendering",
                self.out_dir.display()
            )));
        }
        if let Err(e) = move_into_place(&staging, &self.out_dir) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        tracing::info!(
            out_dir = %self.out_dir.display(),
            frames = self.written,
            "png sequence finished"
        );
        Ok(())
    }

    fn abort(&mut self) {
        self.discard();
    }
}

impl Drop for PngSequenceSink {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Rename `staging` onto `out_dir`. An existing `out_dir` is moved aside first and restored
/// if the rename fails; it is deleted only once the new directory is in place.
fn move_into_place(staging: &Path, out_dir: &Path) -> RollResult<()> {
    let backup = if out_dir.exists() {
        let backup = sibling(out_dir, "old");
        if backup.exists() {
            std::fs::remove_dir_all(&backup).map_err(|e| {
                RollError::encoding(format!(
                    "remove stale backup directory '{}': {e}",
                    backup.display()
                ))
            })?;
        }
        std::fs::rename(out_dir, &backup).map_err(|e| {
            RollError::encoding(format!(
                "move old output directory '{}' aside: {e}",
                out_dir.display()
            ))
        })?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = std::fs::rename(staging, out_dir) {
        if let Some(backup) = backup.as_ref() {
            if let Err(restore) = std::fs::rename(backup, out_dir) {
                tracing::error!(
                    backup = %backup.display(),
                    error = %restore,
                    "failed to restore old output directory"
                );
            }
        }
        return Err(RollError::encoding(format!(
            "move '{}' to '{}': {e}",
            staging.display(),
            out_dir.display()
        )));
    }

    if let Some(backup) = backup {
        if let Err(e) = std::fs::remove_dir_all(&backup) {
            tracing::warn!(backup = %backup.display(), error = %e, "old output directory left behind");
        }
    }
    Ok(())
}

fn staging_dir(out_dir: &Path) -> PathBuf {
    sibling(out_dir, "partial")
}

fn sibling(out_dir: &Path, suffix: &str) -> PathBuf {
    let name = out_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_owned());
    out_dir.with_file_name(format!(".{name}.{}.{suffix}", std::process::id()))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
