//! Reading inputs into build files.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::file::{BuildFile, Contents, FileStat};

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("failed to read source {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Build one file per path.
///
/// Regular files are buffered, or opened as streams when `buffer` is false.
/// Directories become content-less entries so bundle source directories can
/// be compiled in place. Each file's base is the directory it was found in.
pub async fn read_sources(paths: &[PathBuf], buffer: bool) -> Result<Vec<BuildFile>, SourceError> {
  let load = if buffer { Load::Buffer } else { Load::Stream };
  load_sources(paths, load).await
}

/// Like `read_sources`, but no file is read or opened: every entry is
/// content-less and carries only its resolved path and stat.
pub async fn stat_sources(paths: &[PathBuf]) -> Result<Vec<BuildFile>, SourceError> {
  load_sources(paths, Load::StatOnly).await
}

#[derive(Debug, Clone, Copy)]
enum Load {
  Buffer,
  Stream,
  StatOnly,
}

async fn load_sources(paths: &[PathBuf], load: Load) -> Result<Vec<BuildFile>, SourceError> {
  let mut files = Vec::with_capacity(paths.len());
  for path in paths {
    files.push(load_source(path, load).await?);
  }
  Ok(files)
}

async fn load_source(path: &Path, load: Load) -> Result<BuildFile, SourceError> {
  let read_err = |source| SourceError::Read {
    path: path.to_path_buf(),
    source,
  };

  let path = dunce::canonicalize(path).map_err(read_err)?;
  let meta = tokio::fs::metadata(&path).await.map_err(read_err)?;

  let contents = match load {
    _ if meta.is_dir() => Contents::Null,
    Load::StatOnly => Contents::Null,
    Load::Buffer => Contents::Buffer(tokio::fs::read(&path).await.map_err(read_err)?),
    Load::Stream => Contents::Stream(Box::pin(tokio::fs::File::open(&path).await.map_err(read_err)?)),
  };

  debug!(path = %path.display(), contents = ?contents, "read source");
  Ok(BuildFile::new(path, contents).with_stat(FileStat::from(&meta)))
}
