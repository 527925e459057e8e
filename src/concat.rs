//! Joining finished phrase clips into the final video.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::clip::FinishedClip;
use crate::error::{FreddyError, Result};
use crate::media::MediaTools;

pub struct Concatenator<'a> {
    media: &'a dyn MediaTools,
}

impl<'a> Concatenator<'a> {
    pub fn new(media: &'a dyn MediaTools) -> Self {
        Self { media }
    }

    /// Concatenate `clips` into `output` in the given order, in a single pass.
    ///
    /// Every clip must carry both a video and an audio stream.
    pub async fn concat(&self, clips: &[FinishedClip], output: &Path) -> Result<()> {
        if clips.is_empty() {
            return Err(FreddyError::Concat {
                index: 0,
                message: "no clips to concatenate".to_string(),
            });
        }

        for (position, clip) in clips.iter().enumerate() {
            assert_eq!(
                clip.index, position,
                "clip order does not match story order"
            );

            let layout = self.media.stream_layout(&clip.path).await?;
            debug!("Clip {} layout: {:?}", clip.index, layout);
            if !layout.is_audio_video() {
                return Err(FreddyError::Concat {
                    index: clip.index,
                    message: format!(
                        "{} is missing its {} stream",
                        clip.path.display(),
                        if layout.has_video { "audio" } else { "video" }
                    ),
                });
            }
        }

        let inputs: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        info!("Concatenating {} clips into {}", inputs.len(), output.display());
        self.media.concat_av(&inputs, output).await
    }
}
