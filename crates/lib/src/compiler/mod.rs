//! Bundle compiler interface.
//!
//! The compiler is opaque: it receives the descriptor document, a scratch
//! path to write to, and the forwarded options, and reports completion once.
//! `CommandCompiler` drives an external program; tests and embedders can
//! supply any other implementation.

pub mod cmd;

use std::future::Future;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::OutputLayout;

pub use cmd::CommandCompiler;

/// Errors reported by a compiler.
#[derive(Debug, Error)]
pub enum CompileError {
  /// The compiler program could not be started.
  #[error("failed to start compiler {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The compiler exited unsuccessfully.
  #[error("compiler {program} failed with exit code {code:?}{}", format_stderr(.stderr))]
  Failed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The request could not be handed to the compiler.
  #[error("failed to encode compile request: {0}")]
  Encode(#[from] serde_json::Error),

  /// I/O error while talking to the compiler.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Failure reported by an in-process compiler.
  #[error("{0}")]
  Other(String),
}

fn format_stderr(stderr: &str) -> String {
  let stderr = stderr.trim();
  if stderr.is_empty() {
    String::new()
  } else {
    format!(": {}", stderr)
  }
}

/// Everything a compiler needs for one bundle.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
  /// The descriptor document, passed through untouched.
  pub bundle: &'a Value,
  /// Scratch path to write the bundle to. Sparse bundles are written to
  /// siblings sharing its base name.
  pub output: &'a Path,
  /// Forwarded options, with `path` already resolved.
  pub options: &'a Map<String, Value>,
  /// Which files the compiler is expected to produce.
  pub layout: OutputLayout,
}

/// A bundle compiler.
///
/// `compile` resolves exactly once; `Ok(())` means every file of
/// `request.layout` has been written.
pub trait BundleCompiler: Send + Sync {
  fn compile(&self, request: CompileRequest<'_>) -> impl Future<Output = Result<(), CompileError>> + Send;
}
