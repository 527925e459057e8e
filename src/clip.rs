use std::path::PathBuf;

/// Working state for one phrase while its clip is assembled.
#[derive(Debug, Clone)]
pub struct ClipJob {
    /// Position of the phrase in the story.
    pub index: usize,
    pub text: String,
    pub audio: PathBuf,
    /// Narration length in whole seconds, rounded up.
    pub audio_duration: u64,
    /// Current silent video for the phrase.
    pub video: PathBuf,
    pub video_duration: u64,
}

/// Narrated clip for one phrase, at least as long as its audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedClip {
    pub index: usize,
    pub text: String,
    pub path: PathBuf,
    pub audio_duration: u64,
}
