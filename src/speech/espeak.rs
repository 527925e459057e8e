//! Narration through the `espeak` speech synthesizer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{FreddyError, Result};

use super::Synthesizer;

pub struct EspeakSynthesizer {
    binary: PathBuf,
    voice: Option<String>,
    words_per_minute: Option<u32>,
}

impl Default for EspeakSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakSynthesizer {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("espeak"),
            voice: None,
            words_per_minute: None,
        }
    }

    /// Use a different espeak-compatible binary (e.g. `espeak-ng`).
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_speed(mut self, words_per_minute: u32) -> Self {
        self.words_per_minute = Some(words_per_minute);
        self
    }

    fn build_args(&self, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-w".into(), dest.into()];
        if let Some(ref voice) = self.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        if let Some(wpm) = self.words_per_minute {
            args.push("-s".into());
            args.push(wpm.to_string().into());
        }
        // Text goes through stdin so phrases starting with '-' are spoken
        args.push("--stdin".into());
        args
    }
}

#[async_trait]
impl Synthesizer for EspeakSynthesizer {
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<()> {
        if text.trim().is_empty() {
            return Err(FreddyError::collaborator("espeak", "cannot synthesize empty text"));
        }

        debug!("Synthesizing {:?} into {}", text, dest.display());

        let mut child = Command::new(&self.binary)
            .args(self.build_args(dest))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FreddyError::collaborator(
                    "espeak",
                    format!("Failed to run {}: {e}", self.binary.display()),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("espeak failed for {}", dest.display());
            return Err(FreddyError::collaborator(
                "espeak",
                format!("espeak exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        if !dest.exists() {
            return Err(FreddyError::collaborator(
                "espeak",
                format!("Audio file was not created: {}", dest.display()),
            ));
        }

        Ok(())
    }

    fn extension(&self) -> &'static str {
        "wav"
    }

    fn name(&self) -> &'static str {
        "espeak"
    }
}
