pub mod clip;
pub mod concat;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod search;
pub mod segment;
pub mod speech;
pub mod sync;
pub mod terms;

pub use clip::{ClipJob, FinishedClip};
pub use config::Config;
pub use error::{FreddyError, Result, Stage};
pub use pipeline::{print_summary, Collaborators, Pipeline, PipelineStats, RenderResult};
pub use segment::{Phrase, Segmenter, Story, TERMINAL_PHRASE};
