use crate::clip::{ClipJob, FinishedClip};
use crate::concat::Concatenator;
use crate::config::Config;
use crate::error::{FreddyError, PhraseContext, Result, Stage};
use crate::media::{FfmpegTools, MediaTools, OverlayStyle, ScratchDir};
use crate::search::{GiphyClient, VideoSource};
use crate::segment::{Phrase, Segmenter, Story};
use crate::speech::{EspeakSynthesizer, Synthesizer};
use crate::sync::ClipSynchronizer;
use crate::terms::{KeywordExtractor, TermExtractor};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// External services the pipeline drives.
pub struct Collaborators {
    pub synthesizer: Box<dyn Synthesizer>,
    pub media: Box<dyn MediaTools>,
    pub terms: Box<dyn TermExtractor>,
    pub source: Box<dyn VideoSource>,
}

impl Collaborators {
    /// espeak, ffmpeg, keyword terms and Giphy, configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.giphy_api_key.as_ref().ok_or_else(|| {
            FreddyError::Config(
                "Giphy API key not set. Set GIPHY_API_KEY environment variable.".to_string(),
            )
        })?;

        let mut synthesizer = EspeakSynthesizer::new();
        if let Some(ref voice) = config.voice {
            synthesizer = synthesizer.with_voice(voice.clone());
        }
        if let Some(speed) = config.speed {
            synthesizer = synthesizer.with_speed(speed);
        }

        let style = OverlayStyle {
            frame_size: config.frame_size,
            font_size: config.font_size,
            ..OverlayStyle::default()
        };

        Ok(Self {
            synthesizer: Box::new(synthesizer),
            media: Box::new(FfmpegTools::new(style)),
            terms: Box::new(KeywordExtractor::default()),
            source: Box::new(GiphyClient::new(api_key.clone()).with_rating(config.rating.clone())),
        })
    }
}

/// Statistics from one render.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total time taken for the entire pipeline.
    pub total_time: Duration,
    /// Time spent building per-phrase clips.
    pub clip_time: Duration,
    /// Time spent in the final concatenation.
    pub concat_time: Duration,
    /// Number of phrases, including the terminal phrase.
    pub phrases: usize,
    /// Sum of narration durations in seconds.
    pub narration_secs: u64,
}

/// Result of rendering one story.
#[derive(Debug)]
pub struct RenderResult {
    pub output_path: PathBuf,
    pub phrases: Vec<String>,
    pub stats: PipelineStats,
}

/// Sequential story-to-video pipeline.
pub struct Pipeline {
    collaborators: Collaborators,
    scratch: ScratchDir,
    segmenter: Segmenter,
    show_progress: bool,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, scratch: ScratchDir) -> Self {
        Self {
            collaborators,
            scratch,
            segmenter: Segmenter::default(),
            show_progress: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Share a flag that aborts the run before the next phrase when set.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            warn!("Pipeline cancelled");
            return Err(FreddyError::Cancelled);
        }
        Ok(())
    }

    /// Segment story text, appending the terminal phrase.
    pub fn story(&self, text: &str) -> Result<Story> {
        Story::from_text(text, &self.segmenter)
    }

    /// Build the narrated clip for one phrase.
    ///
    /// A failure that happens while the cancel flag is set is reported as
    /// [`FreddyError::Cancelled`]; an interrupt also reaches the running child.
    pub async fn build_clip(&self, index: usize, phrase: &Phrase) -> Result<FinishedClip> {
        match self.run_clip_steps(index, phrase).await {
            Err(e) if self.cancelled.load(Ordering::Relaxed) => {
                warn!("Phrase {} interrupted: {}", index, e);
                Err(FreddyError::Cancelled)
            }
            result => result,
        }
    }

    async fn run_clip_steps(&self, index: usize, phrase: &Phrase) -> Result<FinishedClip> {
        let c = &self.collaborators;
        let media = c.media.as_ref();
        let text = phrase.text();

        // Narration
        let audio = self.scratch.next_file(c.synthesizer.extension());
        c.synthesizer
            .synthesize(&text, &audio)
            .await
            .at(index, Stage::Synthesize)?;
        let audio_duration = media.duration(&audio).await.at(index, Stage::Probe)?;
        if audio_duration == 0 {
            return Err(FreddyError::collaborator(
                c.synthesizer.name(),
                format!("{} has zero duration", audio.display()),
            ))
            .at(index, Stage::Probe);
        }

        // Footage
        let terms = c.terms.terms(phrase);
        debug!("Phrase {}: searching {} for {:?}", index, c.source.name(), terms);
        let url = c.source.search(&terms).await.at(index, Stage::Search)?;

        let download = self.scratch.next_file("mp4");
        c.source
            .download(&url, &download)
            .await
            .at(index, Stage::Download)?;

        let captioned = self.scratch.next_file("mp4");
        media
            .overlay_text(&download, &text, &captioned)
            .await
            .at(index, Stage::Overlay)?;

        let mut job = ClipJob {
            index,
            text,
            audio,
            audio_duration,
            video: captioned,
            video_duration: 0,
        };
        ClipSynchronizer::new(media, &self.scratch)
            .sync_job(&mut job)
            .await
            .at(index, Stage::Sync)?;

        let path = self.scratch.next_file("mp4");
        media
            .merge(&job.video, &job.audio, &path)
            .await
            .at(index, Stage::Merge)?;

        debug!(
            "Phrase {}: {}s narration over {}s of video -> {}",
            index,
            job.audio_duration,
            job.video_duration,
            path.display()
        );

        Ok(FinishedClip {
            index,
            text: job.text,
            path,
            audio_duration: job.audio_duration,
        })
    }

    /// Build every phrase's clip, strictly in story order.
    pub async fn build_story(&self, story: &Story) -> Result<Vec<FinishedClip>> {
        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(story.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} phrases {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut clips = Vec::with_capacity(story.len());

        for (index, phrase) in story.phrases().iter().enumerate() {
            self.check_cancelled()?;

            info!("Phrase {}/{}: {:?}", index + 1, story.len(), phrase.text());
            if let Some(ref pb) = progress_bar {
                pb.set_message(phrase.text());
            }

            let clip = self.build_clip(index, phrase).await?;
            debug_assert_eq!(clip.index, clips.len());
            clips.push(clip);

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("✓ all clips built");
        }

        Ok(clips)
    }

    /// Render story text into a video at `output`.
    ///
    /// The video is assembled in the scratch directory and only moved to
    /// `output` once everything succeeded.
    pub async fn render(&self, text: &str, output: &Path) -> Result<RenderResult> {
        let start_time = Instant::now();

        let story = self.story(text)?;
        info!("Story has {} phrases", story.len());

        let clip_start = Instant::now();
        let clips = self.build_story(&story).await?;
        let clip_time = clip_start.elapsed();

        self.check_cancelled()?;

        let concat_start = Instant::now();
        let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("mp4");
        let staged = self.scratch.next_file(ext);
        Concatenator::new(self.collaborators.media.as_ref())
            .concat(&clips, &staged)
            .await?;
        move_into_place(&staged, output).await?;
        let concat_time = concat_start.elapsed();

        info!("Wrote {} clips to {:?}", clips.len(), output);

        let stats = PipelineStats {
            total_time: start_time.elapsed(),
            clip_time,
            concat_time,
            phrases: clips.len(),
            narration_secs: clips.iter().map(|c| c.audio_duration).sum(),
        };

        Ok(RenderResult {
            output_path: output.to_path_buf(),
            phrases: story.texts(),
            stats,
        })
    }

    /// Read a story file and render it.
    pub async fn render_file(&self, input: &Path, output: &Path) -> Result<RenderResult> {
        if !input.exists() {
            return Err(FreddyError::FileNotFound(input.display().to_string()));
        }
        let text = tokio::fs::read_to_string(input).await?;
        self.render(&text, output).await
    }
}

/// Move a finished file onto its final path, copying across filesystems.
async fn move_into_place(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    if tokio::fs::rename(from, to).await.is_err() {
        debug!("Rename failed, copying {:?} to {:?}", from, to);
        tokio::fs::copy(from, to).await?;
        if let Err(e) = tokio::fs::remove_file(from).await {
            warn!("Could not remove staged file {:?}: {}", from, e);
        }
    }
    Ok(())
}

/// Print a summary of the render.
pub fn print_summary(result: &RenderResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                        Video Complete                         ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!("  Phrases:    {}", result.stats.phrases);
    println!("  Narration:  {}s", result.stats.narration_secs);
    println!();
    println!("  Timing:");
    println!(
        "    Clips:       {:.2}s",
        result.stats.clip_time.as_secs_f64()
    );
    println!(
        "    Concat:      {:.2}s",
        result.stats.concat_time.as_secs_f64()
    );
    println!(
        "    Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
