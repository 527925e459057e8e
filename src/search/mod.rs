pub mod giphy;

pub use giphy::{GiphyClient, Selection};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Remote catalogue of short video clips.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// URL of one clip matching `terms`.
    async fn search(&self, terms: &str) -> Result<String>;

    /// Fetch `url` into a local file.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;

    fn name(&self) -> &'static str;
}
