//! Stretching a silent clip to cover its narration.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::clip::ClipJob;
use crate::error::{FreddyError, Result};
use crate::media::{MediaTools, ScratchDir};

/// Upper bound on doubling passes; 2^32 times any non-empty clip covers any narration.
pub const MAX_PASSES: u32 = 32;

/// Doubles a clip by self-concatenation until it lasts at least as long as a target.
pub struct ClipSynchronizer<'a> {
    media: &'a dyn MediaTools,
    scratch: &'a ScratchDir,
}

impl<'a> ClipSynchronizer<'a> {
    pub fn new(media: &'a dyn MediaTools, scratch: &'a ScratchDir) -> Self {
        Self { media, scratch }
    }

    /// Returns a clip and its duration, with duration `>= target`.
    ///
    /// Fails with [`FreddyError::SynchronizationStall`] when the clip has no
    /// measurable length, or when [`MAX_PASSES`] doublings still fall short.
    ///
    /// Durations are whole seconds rounded up, so a pass over a sub-second
    /// clip may report no growth; only the pass count bounds the loop.
    pub async fn sync(&self, video: &Path, target: u64) -> Result<(PathBuf, u64)> {
        let mut path = video.to_path_buf();
        let mut duration = self.media.duration(&path).await?;

        if duration == 0 {
            return Err(FreddyError::SynchronizationStall { path, duration });
        }

        let mut passes = 0;
        while duration < target {
            if passes == MAX_PASSES {
                return Err(FreddyError::SynchronizationStall { path, duration });
            }

            let next = self.scratch.next_file("mp4");
            self.media
                .concat_video_only(&[path.clone(), path.clone()], &next)
                .await?;

            let next_duration = self.media.duration(&next).await?;
            passes += 1;
            debug!(
                "Pass {}: {}s -> {}s (target {}s)",
                passes, duration, next_duration, target
            );
            path = next;
            duration = next_duration;
        }

        Ok((path, duration))
    }

    /// Extend the job's video to cover its audio.
    pub async fn sync_job(&self, job: &mut ClipJob) -> Result<()> {
        let (video, duration) = self.sync(&job.video, job.audio_duration).await?;
        job.video = video;
        job.video_duration = duration;
        Ok(())
    }
}
