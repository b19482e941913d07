//! Build file objects.
//!
//! A `BuildFile` is one unit flowing through the pipeline: a path (with the
//! history of paths it has had), the directory it is relative to, and its
//! contents. Contents are either absent (`Null`), held in memory (`Buffer`),
//! or an async byte stream (`Stream`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt};

/// An owned async byte source.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send + Sync>>;

/// Contents of a build file.
pub enum Contents {
  /// No contents (directory entries, or files read without contents).
  Null,
  /// Fully buffered contents.
  Buffer(Vec<u8>),
  /// Streamed contents, read at most once.
  Stream(ByteStream),
}

impl Contents {
  pub fn is_null(&self) -> bool {
    matches!(self, Contents::Null)
  }

  pub fn is_buffer(&self) -> bool {
    matches!(self, Contents::Buffer(_))
  }

  pub fn is_stream(&self) -> bool {
    matches!(self, Contents::Stream(_))
  }

  /// Drain the contents into memory.
  ///
  /// `Null` yields an empty vector.
  pub async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
    match self {
      Contents::Null => Ok(Vec::new()),
      Contents::Buffer(bytes) => Ok(bytes),
      Contents::Stream(mut stream) => {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).await?;
        Ok(bytes)
      }
    }
  }
}

impl fmt::Debug for Contents {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Contents::Null => write!(f, "Null"),
      Contents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
      Contents::Stream(_) => write!(f, "Stream"),
    }
  }
}

impl From<Vec<u8>> for Contents {
  fn from(bytes: Vec<u8>) -> Self {
    Contents::Buffer(bytes)
  }
}

/// The subset of filesystem metadata carried with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStat {
  pub is_dir: bool,
  pub len: u64,
}

impl From<&std::fs::Metadata> for FileStat {
  fn from(meta: &std::fs::Metadata) -> Self {
    Self {
      is_dir: meta.is_dir(),
      len: meta.len(),
    }
  }
}

/// One file flowing through the pipeline.
#[derive(Debug)]
pub struct BuildFile {
  pub cwd: PathBuf,
  pub base: PathBuf,
  history: Vec<PathBuf>,
  pub stat: Option<FileStat>,
  pub contents: Contents,
  /// Free-form attributes set by upstream stages; preserved across `derive`.
  pub metadata: BTreeMap<String, serde_json::Value>,
}

impl BuildFile {
  /// Create a file whose base is the parent of `path`.
  pub fn new(path: impl Into<PathBuf>, contents: Contents) -> Self {
    let path = path.into();
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let cwd = std::env::current_dir().unwrap_or_default();
    Self {
      cwd,
      base,
      history: vec![path],
      stat: None,
      contents,
      metadata: BTreeMap::new(),
    }
  }

  pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
    self.base = base.into();
    self
  }

  pub fn with_stat(mut self, stat: FileStat) -> Self {
    self.stat = Some(stat);
    self
  }

  /// Current path.
  pub fn path(&self) -> &Path {
    // history is never empty: `new` seeds it and `set_path` only appends
    self.history.last().map(PathBuf::as_path).unwrap_or(Path::new(""))
  }

  /// Every path this file has had, oldest first.
  pub fn history(&self) -> &[PathBuf] {
    &self.history
  }

  /// Change the path, recording the previous one in the history.
  pub fn set_path(&mut self, path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_path() != self.path() {
      self.history.push(path);
    }
  }

  /// Path relative to `base`, falling back to the file name.
  pub fn relative(&self) -> PathBuf {
    let path = self.path();
    match path.strip_prefix(&self.base) {
      Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
      _ => path.file_name().map(PathBuf::from).unwrap_or_default(),
    }
  }

  pub fn is_null(&self) -> bool {
    self.contents.is_null()
  }

  pub fn is_directory(&self) -> bool {
    self.is_null() && self.stat.is_some_and(|s| s.is_dir)
  }

  /// Clone everything except the contents, which are replaced.
  ///
  /// Streams cannot be duplicated, so a derived file always gets new
  /// contents; metadata and path history carry over.
  pub fn derive(&self, contents: Contents) -> BuildFile {
    BuildFile {
      cwd: self.cwd.clone(),
      base: self.base.clone(),
      history: self.history.clone(),
      stat: self.stat,
      contents,
      metadata: self.metadata.clone(),
    }
  }
}

/// File name with its final `.`-delimited extension removed.
///
/// `foo/bar.jbbsrc` gives `bar` and `bar.tar.gz` gives `bar.tar`. A name
/// without a dot is returned whole; `.jbbsrc` has an empty stem.
pub fn stem(path: &Path) -> String {
  let Some(name) = path.file_name() else {
    return String::new();
  };
  let name = name.to_string_lossy();
  match name.rsplit_once('.') {
    Some((stem, _)) => stem.to_string(),
    None => name.into_owned(),
  }
}

/// `path` with its file name replaced by `stem(path)` followed by `suffix`.
///
/// Only the file name changes; dots in directory names are never touched.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
  path.with_file_name(format!("{}{}", stem(path), suffix))
}
