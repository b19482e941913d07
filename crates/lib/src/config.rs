//! Adapter and runner configuration.
//!
//! `JbbConfig` is the option object handed to the compiler. Three keys are
//! understood here (`path`, `profile`, `sparse`); every other key is kept
//! verbatim and forwarded. `RunConfig` controls how the pipeline runner
//! schedules files and is never forwarded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::consts::{BUNDLE_SUFFIXES, SPARSE_SUFFIXES};

/// Errors building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("options must be a JSON object, got {0}")]
  NotAnObject(&'static str),

  #[error("invalid option value: {0}")]
  Invalid(#[from] serde_json::Error),

  #[error("failed to read options file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Options forwarded to the bundle compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JbbConfig {
  /// Asset base directory. Defaults to the descriptor's directory.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,

  /// Compiler profile, passed through untouched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub profile: Option<String>,

  /// Split the bundle into four files.
  #[serde(default)]
  pub sparse: bool,

  /// Any other option, forwarded verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl JbbConfig {
  /// Build a configuration from a caller-supplied option object.
  pub fn from_options(options: Map<String, Value>) -> Result<Self, ConfigError> {
    Ok(serde_json::from_value(Value::Object(options))?)
  }

  /// Build a configuration from any JSON value, which must be an object.
  pub fn from_value(value: Value) -> Result<Self, ConfigError> {
    match value {
      Value::Object(map) => Self::from_options(map),
      Value::Null => Ok(Self::default()),
      other => Err(ConfigError::NotAnObject(json_kind(&other))),
    }
  }

  /// Load an option object from a JSON file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_value(serde_json::from_str(&text)?)
  }

  /// Shallow merge: every key present in `other` replaces the one in `self`.
  pub fn merge(self, other: Map<String, Value>) -> Result<Self, ConfigError> {
    let mut map = self.to_options();
    for (key, value) in other {
      map.insert(key, value);
    }
    Self::from_options(map)
  }

  /// The option object as it is forwarded to the compiler.
  pub fn to_options(&self) -> Map<String, Value> {
    match serde_json::to_value(self) {
      Ok(Value::Object(map)) => map,
      // a struct with a flattened map always serializes to an object
      _ => Map::new(),
    }
  }

  /// Output layout selected by the `sparse` flag.
  pub fn layout(&self) -> OutputLayout {
    if self.sparse { OutputLayout::Sparse } else { OutputLayout::Bundle }
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// Which physical files a compile produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
  /// One `.jbb` file.
  Bundle,
  /// Four `.jbbp` files.
  Sparse,
}

impl OutputLayout {
  /// Output suffixes in emission order.
  pub fn suffixes(self) -> &'static [&'static str] {
    match self {
      OutputLayout::Bundle => BUNDLE_SUFFIXES,
      OutputLayout::Sparse => SPARSE_SUFFIXES,
    }
  }
}

/// Pipeline runner settings.
#[derive(Debug, Clone)]
pub struct RunConfig {
  /// Maximum number of files processed at once.
  pub parallelism: usize,

  /// Parent directory for scratch spaces. System temp dir if None.
  pub scratch_dir: Option<PathBuf>,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      scratch_dir: None,
    }
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
