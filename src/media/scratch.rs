use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::Result;

/// Write-once scratch area for one run's intermediate files.
///
/// Hands out fresh paths `<dir>/<n>.<ext>` from a counter starting at 0.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    next_id: AtomicU64,
    // Deleted on drop when present.
    _temp: Option<TempDir>,
}

impl ScratchDir {
    /// Use `path` as a persistent cache directory, created if missing.
    ///
    /// With `clean` set any previous contents are removed first.
    pub fn persistent(path: impl Into<PathBuf>, clean: bool) -> Result<Self> {
        let root = path.into();

        if clean && root.is_dir() {
            info!("Cleaning cache directory {}", root.display());
            std::fs::remove_dir_all(&root)?;
        }
        std::fs::create_dir_all(&root)?;
        debug!("Using cache directory {}", root.display());

        Ok(Self {
            root,
            next_id: AtomicU64::new(0),
            _temp: None,
        })
    }

    /// A scratch directory under the system temp dir, deleted on drop.
    pub fn temporary() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().to_path_buf();
        debug!("Using temp directory {}", root.display());

        Ok(Self {
            root,
            next_id: AtomicU64::new(0),
            _temp: Some(temp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Next unused file path with the given extension.
    pub fn next_file(&self, ext: &str) -> PathBuf {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{id}.{ext}"))
    }
}
