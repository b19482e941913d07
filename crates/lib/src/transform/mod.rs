//! The bundle transform.
//!
//! For each input file:
//! 1. read `bundle.json` beside it
//! 2. reserve a scratch path in a fresh scratch space
//! 3. run the compiler into that path
//! 4. stream every produced file back out under the input's stem
//!
//! Each step either hands its result to the next or ends the file with a
//! single `PluginError`. Files without contents pass through untouched.

pub mod materialize;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::compiler::{BundleCompiler, CompileRequest};
use crate::config::JbbConfig;
use crate::consts::SCRATCH_SUFFIX;
use crate::descriptor::{BundleDescriptor, load_descriptor};
use crate::file::BuildFile;
use crate::scratch::ScratchSpace;

pub use materialize::{CompiledBundle, output_paths};
pub use types::{PluginError, Stage, TransformError};

/// Compiles build files into JBB bundles.
///
/// One instance is shared by every file of a run; it holds no per-file
/// state beyond the default asset path, which is fixed by the first
/// successful compile when the options leave `path` unset.
pub struct JbbTransform<C> {
  config: JbbConfig,
  compiler: C,
  scratch_dir: Option<PathBuf>,
  default_path: OnceLock<PathBuf>,
}

impl<C: BundleCompiler> JbbTransform<C> {
  pub fn new(config: JbbConfig, compiler: C) -> Self {
    Self {
      config,
      compiler,
      scratch_dir: None,
      default_path: OnceLock::new(),
    }
  }

  /// Create scratch spaces under `dir` instead of the system temp dir.
  pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.scratch_dir = Some(dir.into());
    self
  }

  /// The effective configuration, including a defaulted `path` once known.
  pub fn config(&self) -> JbbConfig {
    let mut config = self.config.clone();
    if config.path.is_none() {
      config.path = self.default_path.get().cloned();
    }
    config
  }

  pub fn compiler(&self) -> &C {
    &self.compiler
  }

  /// Run one file through the transform.
  ///
  /// Returns the derived outputs in suffix order, the input itself when it
  /// has no contents, or the one error that ended it.
  pub async fn process(&self, file: BuildFile) -> Result<Vec<BuildFile>, PluginError> {
    if file.is_null() && !file.is_directory() {
      debug!(file = %file.path().display(), "passing through file without contents");
      return Ok(vec![file]);
    }

    let mut stage = Stage::Idle;
    let result = self.run_stages(&file, &mut stage).await;

    match result {
      Ok(outputs) => {
        info!(file = %file.path().display(), outputs = outputs.len(), "bundle compiled");
        Ok(outputs)
      }
      Err(e) => {
        warn!(file = %file.path().display(), stage = %stage, error = %e, "bundle failed");
        Err(PluginError::new(file.path().to_path_buf(), e))
      }
    }
  }

  async fn run_stages(&self, file: &BuildFile, stage: &mut Stage) -> Result<Vec<BuildFile>, TransformError> {
    *stage = Stage::DescriptorLoading;
    let descriptor = load_descriptor(file).await?;

    *stage = Stage::Compiling;
    let scratch = Arc::new(ScratchSpace::new(self.scratch_dir.as_deref())?);
    let bundle = self.compile(&descriptor, &scratch).await?;

    *stage = Stage::Materializing;
    let outputs = materialize::materialize(file, &bundle, scratch).await?;

    *stage = Stage::Done;
    Ok(outputs)
  }

  async fn compile(&self, descriptor: &BundleDescriptor, scratch: &ScratchSpace) -> Result<CompiledBundle, TransformError> {
    let output = scratch.reserve(SCRATCH_SUFFIX)?;
    let layout = self.config.layout();

    let asset_path = self.asset_path(descriptor);
    let mut options = self.config.to_options();
    options.insert("path".to_string(), Value::String(asset_path.to_string_lossy().into_owned()));

    debug!(
      descriptor = %descriptor.path.display(),
      output = %output.display(),
      layout = ?layout,
      "compiling bundle"
    );

    self
      .compiler
      .compile(CompileRequest {
        bundle: &descriptor.document,
        output: &output,
        options: &options,
        layout,
      })
      .await?;

    if self.config.path.is_none() && self.default_path.set(asset_path.clone()).is_ok() {
      debug!(path = %asset_path.display(), "defaulted asset path");
    }

    Ok(CompiledBundle {
      base: strip_scratch_suffix(&output),
      layout,
    })
  }

  fn asset_path(&self, descriptor: &BundleDescriptor) -> PathBuf {
    if let Some(path) = &self.config.path {
      return path.clone();
    }
    self
      .default_path
      .get()
      .cloned()
      .unwrap_or_else(|| descriptor.dir().to_path_buf())
  }
}

fn strip_scratch_suffix(path: &Path) -> PathBuf {
  let text = path.to_string_lossy();
  match text.strip_suffix(SCRATCH_SUFFIX) {
    Some(base) => PathBuf::from(base),
    None => path.to_path_buf(),
  }
}
