//! Integration tests for freddy
//!
//! These tests drive the segmenter and the clip pipeline with in-memory
//! collaborators, without media tools or network access.

use async_trait::async_trait;
use freddy::clip::FinishedClip;
use freddy::concat::Concatenator;
use freddy::error::{FreddyError, Result, Stage};
use freddy::media::{MediaTools, ScratchDir, StreamLayout};
use freddy::pipeline::{Collaborators, Pipeline};
use freddy::search::VideoSource;
use freddy::segment::{is_splittable, Phrase, Segmenter, SentenceSplitter, Story};
use freddy::speech::Synthesizer;
use freddy::terms::KeywordExtractor;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// In-memory collaborators
// ============================================================================

#[derive(Debug, Clone)]
struct FakeFile {
    duration: u64,
    layout: StreamLayout,
    label: String,
}

/// Shared record of every file the fake collaborators produced.
#[derive(Default)]
struct Studio {
    files: Mutex<HashMap<PathBuf, FakeFile>>,
}

impl Studio {
    fn put(&self, path: &Path, file: FakeFile) -> Result<()> {
        std::fs::write(path, file.label.as_bytes())?;
        self.files.lock().unwrap().insert(path.to_path_buf(), file);
        Ok(())
    }

    fn get(&self, path: &Path) -> Result<FakeFile> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FreddyError::FileNotFound(path.display().to_string()))
    }
}

/// One second of narration per word.
struct FakeSynth {
    studio: Arc<Studio>,
    silent: bool,
}

#[async_trait]
impl Synthesizer for FakeSynth {
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<()> {
        let duration = if self.silent { 0 } else { text.split_whitespace().count() as u64 };
        self.studio.put(
            dest,
            FakeFile {
                duration,
                layout: StreamLayout { has_video: false, has_audio: true },
                label: text.to_string(),
            },
        )
    }

    fn extension(&self) -> &'static str {
        "wav"
    }

    fn name(&self) -> &'static str {
        "fake-tts"
    }
}

/// Every search hit is a clip of `clip_secs` seconds.
struct FakeSource {
    studio: Arc<Studio>,
    clip_secs: u64,
    fail_on: Option<String>,
    /// Raised just before a `fail_on` search fails, like Ctrl+C killing a child.
    interrupt: Option<Arc<AtomicBool>>,
    searches: Mutex<Vec<String>>,
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn search(&self, terms: &str) -> Result<String> {
        self.searches.lock().unwrap().push(terms.to_string());
        if self.fail_on.as_deref() == Some(terms) {
            if let Some(ref flag) = self.interrupt {
                flag.store(true, Ordering::Relaxed);
            }
            return Err(FreddyError::collaborator("fake-search", "no clips"));
        }
        Ok(format!("https://clips.test/{}", terms.replace(' ', "+")))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.studio.put(
            dest,
            FakeFile {
                duration: self.clip_secs,
                layout: StreamLayout { has_video: true, has_audio: false },
                label: url.to_string(),
            },
        )
    }

    fn name(&self) -> &'static str {
        "fake-search"
    }
}

struct FakeMedia {
    studio: Arc<Studio>,
    drop_audio_on_merge: bool,
}

#[async_trait]
impl MediaTools for FakeMedia {
    async fn duration(&self, path: &Path) -> Result<u64> {
        Ok(self.studio.get(path)?.duration)
    }

    async fn stream_layout(&self, path: &Path) -> Result<StreamLayout> {
        Ok(self.studio.get(path)?.layout)
    }

    async fn overlay_text(&self, video: &Path, text: &str, dest: &Path) -> Result<()> {
        let source = self.studio.get(video)?;
        self.studio.put(
            dest,
            FakeFile {
                duration: source.duration,
                layout: StreamLayout { has_video: true, has_audio: false },
                label: text.to_string(),
            },
        )
    }

    async fn concat_video_only(&self, inputs: &[PathBuf], dest: &Path) -> Result<()> {
        let mut duration = 0;
        for input in inputs {
            duration += self.studio.get(input)?.duration;
        }
        let label = self.studio.get(&inputs[0])?.label;
        self.studio.put(
            dest,
            FakeFile {
                duration,
                layout: StreamLayout { has_video: true, has_audio: false },
                label,
            },
        )
    }

    async fn merge(&self, video: &Path, audio: &Path, dest: &Path) -> Result<()> {
        let video = self.studio.get(video)?;
        let audio = self.studio.get(audio)?;
        self.studio.put(
            dest,
            FakeFile {
                duration: video.duration.min(audio.duration),
                layout: StreamLayout {
                    has_video: true,
                    has_audio: !self.drop_audio_on_merge,
                },
                label: video.label,
            },
        )
    }

    async fn concat_av(&self, inputs: &[PathBuf], dest: &Path) -> Result<()> {
        let mut duration = 0;
        let mut labels = Vec::new();
        for input in inputs {
            let file = self.studio.get(input)?;
            duration += file.duration;
            labels.push(file.label);
        }
        self.studio.put(
            dest,
            FakeFile {
                duration,
                layout: StreamLayout { has_video: true, has_audio: true },
                label: labels.join("|"),
            },
        )
    }

    fn name(&self) -> &'static str {
        "fake-media"
    }
}

struct Harness {
    studio: Arc<Studio>,
    clip_secs: u64,
    fail_on: Option<String>,
    interrupt: Option<Arc<AtomicBool>>,
    silent: bool,
    drop_audio_on_merge: bool,
}

impl Harness {
    fn new() -> Self {
        Self {
            studio: Arc::new(Studio::default()),
            clip_secs: 2,
            fail_on: None,
            interrupt: None,
            silent: false,
            drop_audio_on_merge: false,
        }
    }

    fn pipeline(&self) -> Pipeline {
        let collaborators = Collaborators {
            synthesizer: Box::new(FakeSynth {
                studio: self.studio.clone(),
                silent: self.silent,
            }),
            media: Box::new(FakeMedia {
                studio: self.studio.clone(),
                drop_audio_on_merge: self.drop_audio_on_merge,
            }),
            terms: Box::new(KeywordExtractor::default()),
            source: Box::new(FakeSource {
                studio: self.studio.clone(),
                clip_secs: self.clip_secs,
                fail_on: self.fail_on.clone(),
                interrupt: self.interrupt.clone(),
                searches: Mutex::new(Vec::new()),
            }),
        };
        Pipeline::new(collaborators, ScratchDir::temporary().unwrap())
    }
}

fn segment(text: &str) -> Vec<String> {
    Segmenter::default()
        .segment(text)
        .unwrap()
        .iter()
        .map(Phrase::text)
        .collect()
}

// ============================================================================
// Segmentation Tests
// ============================================================================

mod segmentation_tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "Jack and Jill went up the hill. They fell down.",
        "He ran, jumped, and fell hard today.",
        "Once upon a time, in a land far far away, there lived a tiny dragon; it was very shy, and it loved to read books by the fire.",
        "no punctuation at all in this rather long line of words",
        "Hi.",
        "A, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p.",
    ];

    #[test]
    fn test_jack_and_jill_story() {
        let story = Story::from_text(
            "Jack and Jill went up the hill. They fell down.",
            &Segmenter::default(),
        )
        .unwrap();

        assert_eq!(
            story.texts(),
            vec!["Jack and Jill went up the hill.", "They fell down.", "The End."]
        );
    }

    #[test]
    fn test_comma_split_drops_separator() {
        let phrases = segment("He ran, jumped, and fell hard today.");
        assert_eq!(phrases, vec!["He ran , jumped", "and fell hard today."]);
        // The splitting comma after "jumped" is in neither phrase
        assert!(!phrases[0].ends_with(','));
        assert!(!phrases[1].starts_with(','));
    }

    #[test]
    fn test_non_empty_text_yields_phrases() {
        for text in SAMPLES {
            assert!(!segment(text).is_empty(), "no phrases for {text:?}");
        }
    }

    #[test]
    fn test_phrases_are_short_or_unsplittable() {
        for text in SAMPLES {
            for phrase in Segmenter::default().segment(text).unwrap() {
                assert!(
                    phrase.token_count() <= 5 || !is_splittable(phrase.tokens()),
                    "phrase {:?} from {:?} should have been split",
                    phrase.text(),
                    text
                );
            }
        }
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        for text in SAMPLES {
            assert_eq!(segment(text), segment(text));
        }
    }

    #[test]
    fn test_long_unpunctuated_sentence_is_one_phrase() {
        let phrases = segment("no punctuation at all in this rather long line of words");
        assert_eq!(phrases.len(), 1);
    }

    #[test]
    fn test_multiline_story_file() {
        let story = Story::from_text(
            "Jack and Jill\nwent up the hill\nto fetch a pail of water.\n",
            &Segmenter::default(),
        )
        .unwrap();

        assert_eq!(
            story.texts(),
            vec![
                "Jack and Jill",
                "went up the hill",
                "to fetch a pail of water.",
                "The End."
            ]
        );
    }

    #[test]
    fn test_empty_text_is_an_error() {
        let result = Story::from_text("\n\n   \n", &Segmenter::default());
        assert!(matches!(result, Err(FreddyError::Segmentation(_))));
    }
}

// ============================================================================
// Pipeline Tests
// ============================================================================

mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_render_preserves_phrase_order() {
        let harness = Harness::new();
        let pipeline = harness.pipeline();
        let out_dir = tempfile::TempDir::new().unwrap();
        let output = out_dir.path().join("story.mp4");

        let result = pipeline
            .render("Jack and Jill went up the hill. They fell down.", &output)
            .await
            .unwrap();

        assert_eq!(result.output_path, output);
        assert_eq!(result.stats.phrases, 3);
        // 7 + 3 + 2 words of narration
        assert_eq!(result.stats.narration_secs, 12);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Jack and Jill went up the hill.|They fell down.|The End."
        );
    }

    #[tokio::test]
    async fn test_clips_cover_their_narration() {
        let harness = Harness::new();
        let pipeline = harness.pipeline();
        let story = pipeline
            .story("A long sentence of many words that keeps on going on and on.")
            .unwrap();

        let clips = pipeline.build_story(&story).await.unwrap();

        assert_eq!(clips.len(), story.len());
        for (position, clip) in clips.iter().enumerate() {
            assert_eq!(clip.index, position);
            assert_eq!(clip.text, story.phrases()[position].text());

            let file = harness.studio.get(&clip.path).unwrap();
            assert!(file.layout.is_audio_video());
            assert_eq!(file.duration, clip.audio_duration);
        }
    }

    #[tokio::test]
    async fn test_narration_total_matches_phrases() {
        let harness = Harness::new();
        let pipeline = harness.pipeline();
        let out_dir = tempfile::TempDir::new().unwrap();
        let output = out_dir.path().join("story.mp4");

        let result = pipeline
            .render("Hello there. Good night, sweet prince, sleep well.", &output)
            .await
            .unwrap();

        assert_eq!(
            result.phrases,
            vec!["Hello there.", "Good night , sweet prince", "sleep well.", "The End."]
        );
        assert_eq!(result.stats.phrases, 4);
        assert_eq!(result.stats.narration_secs, 2 + 5 + 2 + 2);
    }

    #[tokio::test]
    async fn test_search_failure_names_phrase_and_stage() {
        let mut harness = Harness::new();
        harness.fail_on = Some("fell down".to_string());
        let pipeline = harness.pipeline();
        let out_dir = tempfile::TempDir::new().unwrap();
        let output = out_dir.path().join("story.mp4");

        let err = pipeline
            .render("Jack and Jill went up the hill. They fell down.", &output)
            .await
            .unwrap_err();

        assert_eq!(err.phrase_context(), Some((1, Stage::Search)));
        assert!(err.to_string().contains("fake-search failed"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_zero_length_clip_is_a_stall() {
        let mut harness = Harness::new();
        harness.clip_secs = 0;
        let pipeline = harness.pipeline();
        let story = pipeline.story("The cat sat.").unwrap();

        let err = pipeline.build_story(&story).await.unwrap_err();

        match err {
            FreddyError::Phrase { index, stage, source } => {
                assert_eq!(index, 0);
                assert_eq!(stage, Stage::Sync);
                assert!(matches!(*source, FreddyError::SynchronizationStall { duration: 0, .. }));
            }
            other => panic!("Expected phrase error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_silent_narration_is_rejected() {
        let mut harness = Harness::new();
        harness.silent = true;
        let pipeline = harness.pipeline();
        let story = pipeline.story("The cat sat.").unwrap();

        let err = pipeline.build_story(&story).await.unwrap_err();
        assert_eq!(err.phrase_context(), Some((0, Stage::Probe)));
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let harness = Harness::new();
        let cancelled = Arc::new(AtomicBool::new(false));
        let pipeline = harness.pipeline().with_cancel_flag(cancelled.clone());
        let out_dir = tempfile::TempDir::new().unwrap();
        let output = out_dir.path().join("story.mp4");

        cancelled.store(true, Ordering::Relaxed);
        let result = pipeline.render("The cat sat.", &output).await;

        assert!(matches!(result, Err(FreddyError::Cancelled)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_interrupted_collaborator_reports_cancelled() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut harness = Harness::new();
        harness.fail_on = Some("fell down".to_string());
        harness.interrupt = Some(cancelled.clone());
        let pipeline = harness.pipeline().with_cancel_flag(cancelled);
        let out_dir = tempfile::TempDir::new().unwrap();
        let output = out_dir.path().join("story.mp4");

        let err = pipeline
            .render("Jack and Jill went up the hill. They fell down.", &output)
            .await
            .unwrap_err();

        assert!(matches!(err, FreddyError::Cancelled), "got: {err:?}");
        assert!(!output.exists());
    }

    #[test]
    fn test_custom_segmenter_drives_the_story() {
        /// Sentences are separated by `|`.
        struct BarSplitter;

        impl SentenceSplitter for BarSplitter {
            fn sentences(&self, text: &str) -> Vec<String> {
                text.split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
        }

        let harness = Harness::new();
        let pipeline = harness
            .pipeline()
            .with_segmenter(Segmenter::new(Box::new(BarSplitter)));

        let story = pipeline.story("Mary had a lamb|Its fleece was white").unwrap();
        assert_eq!(
            story.texts(),
            vec!["Mary had a lamb", "Its fleece was white", "The End."]
        );
    }

    #[tokio::test]
    async fn test_missing_audio_fails_concat() {
        let mut harness = Harness::new();
        harness.drop_audio_on_merge = true;
        let pipeline = harness.pipeline();
        let out_dir = tempfile::TempDir::new().unwrap();
        let output = out_dir.path().join("story.mp4");

        let err = pipeline.render("The cat sat.", &output).await.unwrap_err();

        assert!(matches!(err, FreddyError::Concat { index: 0, .. }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_render_file_missing_input() {
        let harness = Harness::new();
        let pipeline = harness.pipeline();

        let result = pipeline
            .render_file(Path::new("/nonexistent/story.txt"), Path::new("/tmp/out.mp4"))
            .await;
        assert!(matches!(result, Err(FreddyError::FileNotFound(_))));
    }
}

// ============================================================================
// Concatenator Tests
// ============================================================================

mod concat_tests {
    use super::*;

    fn media(studio: &Arc<Studio>) -> FakeMedia {
        FakeMedia {
            studio: studio.clone(),
            drop_audio_on_merge: false,
        }
    }

    fn clip(studio: &Studio, dir: &Path, index: usize, secs: u64, audio: bool) -> FinishedClip {
        let path = dir.join(format!("clip{index}.mp4"));
        studio
            .put(
                &path,
                FakeFile {
                    duration: secs,
                    layout: StreamLayout { has_video: true, has_audio: audio },
                    label: format!("phrase {index}"),
                },
            )
            .unwrap();
        FinishedClip {
            index,
            text: format!("phrase {index}"),
            path,
            audio_duration: secs,
        }
    }

    #[tokio::test]
    async fn test_concat_order_and_duration() {
        let studio = Arc::new(Studio::default());
        let dir = tempfile::TempDir::new().unwrap();
        let clips: Vec<FinishedClip> = (0..4)
            .map(|i| clip(&studio, dir.path(), i, i as u64 + 1, true))
            .collect();
        let output = dir.path().join("out.mp4");

        let media = media(&studio);
        Concatenator::new(&media).concat(&clips, &output).await.unwrap();

        let file = studio.get(&output).unwrap();
        assert_eq!(file.label, "phrase 0|phrase 1|phrase 2|phrase 3");
        assert_eq!(file.duration, 1 + 2 + 3 + 4);
    }

    #[tokio::test]
    async fn test_concat_rejects_clip_without_audio() {
        let studio = Arc::new(Studio::default());
        let dir = tempfile::TempDir::new().unwrap();
        let clips = vec![
            clip(&studio, dir.path(), 0, 2, true),
            clip(&studio, dir.path(), 1, 2, false),
        ];
        let output = dir.path().join("out.mp4");

        let media = media(&studio);
        let err = Concatenator::new(&media)
            .concat(&clips, &output)
            .await
            .unwrap_err();

        match err {
            FreddyError::Concat { index, message } => {
                assert_eq!(index, 1);
                assert!(message.contains("audio"));
            }
            other => panic!("Expected Concat error, got: {other}"),
        }
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_concat_rejects_empty_input() {
        let studio = Arc::new(Studio::default());
        let media = media(&studio);
        let result = Concatenator::new(&media)
            .concat(&[], Path::new("/tmp/never.mp4"))
            .await;
        assert!(matches!(result, Err(FreddyError::Concat { .. })));
    }

    #[tokio::test]
    #[should_panic(expected = "clip order does not match story order")]
    async fn test_concat_asserts_story_order() {
        let studio = Arc::new(Studio::default());
        let dir = tempfile::TempDir::new().unwrap();
        let clips = vec![
            clip(&studio, dir.path(), 1, 2, true),
            clip(&studio, dir.path(), 0, 2, true),
        ];

        let media = media(&studio);
        let _ = Concatenator::new(&media)
            .concat(&clips, &dir.path().join("out.mp4"))
            .await;
    }
}
