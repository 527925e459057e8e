pub mod ffmpeg;
pub mod scratch;

pub use ffmpeg::{check_ffmpeg, check_ffprobe, escape_drawtext, FfmpegTools, OverlayStyle};
pub use scratch::ScratchDir;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Which streams a media file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamLayout {
    pub has_video: bool,
    pub has_audio: bool,
}

impl StreamLayout {
    pub fn is_audio_video(&self) -> bool {
        self.has_video && self.has_audio
    }
}

/// Media probing and editing primitives used by the pipeline.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Duration in whole seconds, rounded up.
    async fn duration(&self, path: &Path) -> Result<u64>;

    async fn stream_layout(&self, path: &Path) -> Result<StreamLayout>;

    /// Scale `video` to the square frame and draw `text` on it. Output has no audio.
    async fn overlay_text(&self, video: &Path, text: &str, dest: &Path) -> Result<()>;

    /// Join videos end to end, dropping any audio.
    async fn concat_video_only(&self, inputs: &[PathBuf], dest: &Path) -> Result<()>;

    /// Mux `audio` onto `video`; output is as long as the shorter input.
    async fn merge(&self, video: &Path, audio: &Path, dest: &Path) -> Result<()>;

    /// Join audio+video files end to end in one pass.
    async fn concat_av(&self, inputs: &[PathBuf], dest: &Path) -> Result<()>;

    fn name(&self) -> &'static str;
}
