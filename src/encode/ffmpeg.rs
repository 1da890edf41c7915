use crate::encode::sink::{FrameOrder, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{RollError, RollResult};
use crate::render::frame::FrameRGBA;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Constant rate factor used for piano-roll output.
pub const DEFAULT_CRF: u8 = 15;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Replace the output file if it already exists.
    pub overwrite: bool,
    /// x264 constant rate factor (0..=51, lower is better quality).
    pub crf: u8,
}

impl FfmpegSinkOpts {
    /// Options for writing an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            crf: DEFAULT_CRF,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// ffmpeg writes to a staging file beside the output; the staging file is renamed onto the
/// output path only after ffmpeg exits successfully. Aborting, or dropping an unfinished sink,
/// kills ffmpeg and deletes the staging file.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    staging: Option<PathBuf>,

    order: FrameOrder,
}

impl FfmpegSink {
    /// Create a sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            staging: None,
            order: FrameOrder::default(),
        }
    }

    /// Output path the finished video is moved to.
    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    fn discard(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        if let Some(staging) = self.staging.take() {
            let _ = std::fs::remove_file(&staging);
        }
        self.order.finish();
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> RollResult<()> {
        if self.child.is_some() {
            return Err(RollError::encoding("ffmpeg sink already started"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RollError::encoding(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(RollError::encoding(format!(
                "ffmpeg sink width/height must be even for yuv420p output, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if self.opts.crf > 51 {
            return Err(RollError::encoding(format!(
                "crf must be within 0..=51, got {}",
                self.opts.crf
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(RollError::encoding(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(RollError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let staging = staging_path(&self.opts.out_path);

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // The staging file is ours; always let ffmpeg replace a stale one.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-crf",
            &self.opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]);
        cmd.arg(&staging);

        tracing::debug!(staging = %staging.display(), ?cmd, "spawning ffmpeg");
        let mut child = cmd.spawn().map_err(|e| {
            RollError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            return Err(RollError::encoding("failed to open ffmpeg stdin"));
        };
        let Some(mut stderr) = child.stderr.take() else {
            let _ = child.kill();
            return Err(RollError::encoding("failed to open ffmpeg stderr"));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.staging = Some(staging);
        self.order.start(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RollResult<()> {
        self.order.check(idx, frame)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RollError::encoding("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            RollError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> RollResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| RollError::encoding("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            RollError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RollError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| RollError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            self.discard();
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(RollError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let Some(staging) = self.staging.take() else {
            return Err(RollError::encoding("ffmpeg staging file missing"));
        };
        if !self.opts.overwrite && self.opts.out_path.exists() {
            let _ = std::fs::remove_file(&staging);
            self.order.finish();
            return Err(RollError::encoding(format!(
                "output file '{}' appeared during encoding",
                self.opts.out_path.display()
            )));
        }
        if let Err(e) = std::fs::rename(&staging, &self.opts.out_path) {
            let _ = std::fs::remove_file(&staging);
            self.order.finish();
            return Err(RollError::encoding(format!(
                "failed to move '{}' to '{}': {e}",
                staging.display(),
                self.opts.out_path.display()
            )));
        }

        self.order.finish();
        tracing::info!(out = %self.opts.out_path.display(), "ffmpeg encode finished");
        Ok(())
    }

    fn abort(&mut self) {
        if self.child.is_some() || self.staging.is_some() {
            tracing::warn!(out = %self.opts.out_path.display(), "aborting ffmpeg encode");
        }
        self.discard();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.discard();
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Hidden sibling of `out` used while ffmpeg is still writing.
pub fn staging_path(out: &Path) -> PathBuf {
    let name = out
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.mp4".to_owned());
    out.with_file_name(format!(".{name}.{}.partial", std::process::id()))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> RollResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
