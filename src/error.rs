use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage in which a per-phrase failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Synthesize,
    Probe,
    Search,
    Download,
    Overlay,
    Sync,
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Synthesize => "synthesize",
            Stage::Probe => "probe",
            Stage::Search => "search",
            Stage::Download => "download",
            Stage::Overlay => "overlay",
            Stage::Sync => "sync",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum FreddyError {
    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error("Clip {} cannot be extended: measured duration {duration}s", .path.display())]
    SynchronizationStall { path: PathBuf, duration: u64 },

    #[error("Phrase {index} failed during {stage}: {source}")]
    Phrase {
        index: usize,
        stage: Stage,
        #[source]
        source: Box<FreddyError>,
    },

    #[error("Cannot concatenate clip {index}: {message}")]
    Concat { index: usize, message: String },

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FreddyError {
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        FreddyError::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Phrase index and stage, if this error carries per-phrase context.
    pub fn phrase_context(&self) -> Option<(usize, Stage)> {
        match self {
            FreddyError::Phrase { index, stage, .. } => Some((*index, *stage)),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FreddyError>;

/// Attach phrase index and stage to a failed collaborator call.
pub(crate) trait PhraseContext<T> {
    fn at(self, index: usize, stage: Stage) -> Result<T>;
}

impl<T> PhraseContext<T> for Result<T> {
    fn at(self, index: usize, stage: Stage) -> Result<T> {
        self.map_err(|e| FreddyError::Phrase {
            index,
            stage,
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_context_wraps_error() {
        let result: Result<()> = Err(FreddyError::collaborator("giphy", "no results"));
        let err = result.at(3, Stage::Search).unwrap_err();

        assert_eq!(err.phrase_context(), Some((3, Stage::Search)));
        let message = err.to_string();
        assert!(message.contains("Phrase 3"));
        assert!(message.contains("search"));
        assert!(message.contains("giphy failed: no results"));
    }

    #[test]
    fn test_stall_message_names_clip() {
        let err = FreddyError::SynchronizationStall {
            path: PathBuf::from("/tmp/4.mp4"),
            duration: 0,
        };
        assert_eq!(
            err.to_string(),
            "Clip /tmp/4.mp4 cannot be extended: measured duration 0s"
        );
    }
}
