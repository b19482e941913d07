//! Bundle descriptor loading.
//!
//! Every input is compiled from a `bundle.json` found beside it. The document
//! belongs to the compiler; nothing here looks inside it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::DESCRIPTOR_FILE;
use crate::file::BuildFile;

#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to read bundle descriptor {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse bundle descriptor {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// A parsed `bundle.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleDescriptor {
  /// Where the descriptor was read from.
  pub path: PathBuf,
  /// The parsed document.
  pub document: serde_json::Value,
}

impl BundleDescriptor {
  /// Directory containing the descriptor.
  pub fn dir(&self) -> &Path {
    self.path.parent().unwrap_or(Path::new(""))
  }
}

/// Location of the descriptor for `file`.
///
/// A bundle source directory holds its own descriptor; any other file uses
/// the one in its parent directory.
pub fn descriptor_path(file: &BuildFile) -> PathBuf {
  if file.is_directory() {
    return file.path().join(DESCRIPTOR_FILE);
  }
  file.path().parent().unwrap_or(Path::new("")).join(DESCRIPTOR_FILE)
}

/// Read and parse the descriptor for `file`.
pub async fn load_descriptor(file: &BuildFile) -> Result<BundleDescriptor, DescriptorError> {
  let path = descriptor_path(file);
  debug!(path = %path.display(), "reading bundle descriptor");

  let text = tokio::fs::read_to_string(&path)
    .await
    .map_err(|source| DescriptorError::Read {
      path: path.clone(),
      source,
    })?;

  let document = serde_json::from_str(&text).map_err(|source| DescriptorError::Parse {
    path: path.clone(),
    source,
  })?;

  Ok(BundleDescriptor { path, document })
}
