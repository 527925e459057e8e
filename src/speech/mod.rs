pub mod espeak;

pub use espeak::EspeakSynthesizer;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Text-to-speech engine producing narration audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text` into an audio file at `dest`.
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<()>;

    /// Extension of the files this engine writes.
    fn extension(&self) -> &'static str;

    fn name(&self) -> &'static str;
}
