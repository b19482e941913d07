//! Scratch space for compiler output.
//!
//! Each invocation gets its own scratch directory. The compiler writes through
//! reserved paths (and may write siblings next to them, as sparse bundles do);
//! everything in the directory is removed when the `ScratchSpace` is dropped.
//! Emitted output streams hold an `Arc<ScratchSpace>`, so the directory lives
//! exactly as long as someone can still read from it.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tempfile::TempDir;
use thiserror::Error;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScratchError {
  #[error("failed to create scratch directory in {parent}: {source}")]
  CreateDir {
    parent: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to reserve scratch file in {dir}: {source}")]
  Reserve {
    dir: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A per-invocation temporary directory.
#[derive(Debug)]
pub struct ScratchSpace {
  dir: TempDir,
}

impl ScratchSpace {
  /// Create a scratch directory under `parent`, or the system temp dir.
  pub fn new(parent: Option<&Path>) -> Result<Self, ScratchError> {
    let parent = parent.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    let dir = tempfile::Builder::new()
      .prefix("jbbpipe-")
      .tempdir_in(&parent)
      .map_err(|source| ScratchError::CreateDir { parent, source })?;

    debug!(dir = %dir.path().display(), "created scratch space");
    Ok(Self { dir })
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  /// Reserve a uniquely named file ending in `suffix`.
  ///
  /// The file exists (empty) when this returns and its handle is closed;
  /// callers write through the path.
  pub fn reserve(&self, suffix: &str) -> Result<PathBuf, ScratchError> {
    let reserve_err = |source| ScratchError::Reserve {
      dir: self.dir.path().to_path_buf(),
      source,
    };

    let file = tempfile::Builder::new()
      .prefix("bundle-")
      .suffix(suffix)
      .tempfile_in(self.dir.path())
      .map_err(reserve_err)?;

    // keep() leaves removal to the scratch directory
    let path = file.into_temp_path().keep().map_err(|e| reserve_err(e.error))?;

    debug!(path = %path.display(), "reserved scratch file");
    Ok(path)
  }
}

impl Drop for ScratchSpace {
  fn drop(&mut self) {
    debug!(dir = %self.dir.path().display(), "removing scratch space");
  }
}

/// A file inside a scratch space, readable as an async stream.
///
/// Keeps the scratch space alive until the stream is dropped.
pub struct ScratchStream {
  file: tokio::fs::File,
  _scratch: Arc<ScratchSpace>,
}

impl ScratchStream {
  pub async fn open(scratch: Arc<ScratchSpace>, path: &Path) -> io::Result<Self> {
    let file = tokio::fs::File::open(path).await?;
    Ok(Self {
      file,
      _scratch: scratch,
    })
  }
}

impl AsyncRead for ScratchStream {
  fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
    Pin::new(&mut self.file).poll_read(cx, buf)
  }
}
