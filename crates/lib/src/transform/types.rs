//! Error and stage types for the bundle transform.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompileError;
use crate::consts::PLUGIN_NAME;
use crate::descriptor::DescriptorError;
use crate::scratch::ScratchError;

/// Where a file is in its trip through the transform.
///
/// Stages only move forward. A failed file stops in the stage that failed,
/// which is the stage recorded on its `PluginError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Idle,
  DescriptorLoading,
  Compiling,
  Materializing,
  Done,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Idle => "idle",
      Stage::DescriptorLoading => "descriptor",
      Stage::Compiling => "compile",
      Stage::Materializing => "materialize",
      Stage::Done => "done",
    };
    f.write_str(name)
  }
}

/// Failure of one step of the transform.
#[derive(Debug, Error)]
pub enum TransformError {
  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  #[error(transparent)]
  Scratch(#[from] ScratchError),

  #[error("compile failed: {0}")]
  Compile(#[from] CompileError),

  #[error("failed to open compiled output {path}: {source}")]
  OutputOpen {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl TransformError {
  /// The stage this error ends.
  pub fn stage(&self) -> Stage {
    match self {
      TransformError::Descriptor(_) => Stage::DescriptorLoading,
      TransformError::Scratch(_) | TransformError::Compile(_) => Stage::Compiling,
      TransformError::OutputOpen { .. } => Stage::Materializing,
    }
  }
}

/// A pipeline-level error: one per failed input file.
#[derive(Debug, Error)]
#[error("{plugin}: {source}")]
pub struct PluginError {
  pub plugin: &'static str,
  /// The input file that failed.
  pub file: PathBuf,
  pub stage: Stage,
  #[source]
  pub source: TransformError,
  /// Report the full cause chain, not just the top-level message.
  pub show_stack: bool,
}

impl PluginError {
  pub fn new(file: PathBuf, source: TransformError) -> Self {
    Self {
      plugin: PLUGIN_NAME,
      file,
      stage: source.stage(),
      source,
      show_stack: true,
    }
  }

  /// Human-readable report, including nested causes when `show_stack` is set.
  pub fn report(&self) -> String {
    let mut out = format!("[{}] {} ({} stage): {}", self.plugin, self.file.display(), self.stage, self.source);
    if self.show_stack {
      let mut cause = std::error::Error::source(&self.source);
      while let Some(err) = cause {
        out.push_str(&format!("\n  caused by: {}", err));
        cause = err.source();
      }
    }
    out
  }
}
