//! Writing build files to an output directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::file::{BuildFile, Contents};

#[derive(Debug, Error)]
pub enum DestError {
  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Write `file` to `dest/<relative path>` and return the written path.
///
/// Streams are copied without buffering the whole file. Directory entries
/// create a directory; other files without contents are skipped.
pub async fn write_file(file: BuildFile, dest: &Path) -> Result<Option<PathBuf>, DestError> {
  let target = dest.join(file.relative());
  let write_err = |source| DestError::Write {
    path: target.clone(),
    source,
  };

  if file.is_directory() {
    tokio::fs::create_dir_all(&target).await.map_err(write_err)?;
    return Ok(Some(target));
  }

  if file.is_null() {
    debug!(path = %target.display(), "skipping file without contents");
    return Ok(None);
  }

  if let Some(parent) = target.parent() {
    tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
  }

  match file.contents {
    Contents::Null => return Ok(None),
    Contents::Buffer(bytes) => {
      tokio::fs::write(&target, bytes).await.map_err(write_err)?;
    }
    Contents::Stream(mut stream) => {
      let mut out = tokio::fs::File::create(&target).await.map_err(write_err)?;
      tokio::io::copy(&mut stream, &mut out).await.map_err(write_err)?;
      out.flush().await.map_err(write_err)?;
    }
  }

  debug!(path = %target.display(), "wrote output");
  Ok(Some(target))
}
