//! Test utilities for jbbpipe-lib.
//!
//! `FakeCompiler` stands in for the external bundle compiler: it writes one
//! small file per expected output and records what it was asked to do.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::compiler::{BundleCompiler, CompileError, CompileRequest};
use crate::config::OutputLayout;
use crate::consts::{DESCRIPTOR_FILE, SCRATCH_SUFFIX};

#[derive(Debug, Default)]
struct Calls {
  count: usize,
  options: Option<Map<String, Value>>,
  layout: Option<OutputLayout>,
}

/// In-process compiler writing `bundle:<suffix>` into each output.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
  failure: Option<String>,
  limit: Option<usize>,
  calls: Arc<Mutex<Calls>>,
}

impl FakeCompiler {
  pub fn new() -> Self {
    Self::default()
  }

  /// A compiler that always fails with `message`.
  pub fn failing(message: &str) -> Self {
    Self {
      failure: Some(message.to_string()),
      ..Self::default()
    }
  }

  /// Only write the first `n` outputs, then report success anyway.
  pub fn writing_only(mut self, n: usize) -> Self {
    self.limit = Some(n);
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.lock().unwrap().count
  }

  pub fn last_options(&self) -> Option<Map<String, Value>> {
    self.calls.lock().unwrap().options.clone()
  }

  pub fn last_layout(&self) -> Option<OutputLayout> {
    self.calls.lock().unwrap().layout
  }
}

impl BundleCompiler for FakeCompiler {
  async fn compile(&self, request: CompileRequest<'_>) -> Result<(), CompileError> {
    {
      let mut calls = self.calls.lock().unwrap();
      calls.count += 1;
      calls.options = Some(request.options.clone());
      calls.layout = Some(request.layout);
    }

    if let Some(message) = &self.failure {
      return Err(CompileError::Other(message.clone()));
    }

    let output = request.output.to_string_lossy();
    let base = output.strip_suffix(SCRATCH_SUFFIX).unwrap_or(&output);
    let limit = self.limit.unwrap_or(usize::MAX);

    for suffix in request.layout.suffixes().iter().take(limit) {
      tokio::fs::write(format!("{}{}", base, suffix), format!("bundle:{}", suffix)).await?;
    }

    Ok(())
  }
}

/// Write `bundle.json` into `dir`.
pub fn write_descriptor(dir: &Path, document: &Value) {
  std::fs::write(dir.join(DESCRIPTOR_FILE), serde_json::to_vec_pretty(document).unwrap()).unwrap();
}
