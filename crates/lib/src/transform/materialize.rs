//! Turning compiled scratch files back into build files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::types::TransformError;
use crate::config::OutputLayout;
use crate::file::{BuildFile, Contents, with_suffix};
use crate::scratch::{ScratchSpace, ScratchStream};

/// The files a compile left in scratch space.
#[derive(Debug, Clone)]
pub struct CompiledBundle {
  /// Scratch path minus its `.jbb` suffix; outputs live at `base + suffix`.
  pub base: PathBuf,
  pub layout: OutputLayout,
}

impl CompiledBundle {
  /// Scratch path of each output, in emission order.
  pub fn scratch_paths(&self) -> Vec<PathBuf> {
    let base = self.base.to_string_lossy();
    self
      .layout
      .suffixes()
      .iter()
      .map(|suffix| PathBuf::from(format!("{}{}", base, suffix)))
      .collect()
  }
}

/// Output names for `input` under `layout`, in emission order.
pub fn output_paths(input: &Path, layout: OutputLayout) -> Vec<PathBuf> {
  layout.suffixes().iter().map(|suffix| with_suffix(input, suffix)).collect()
}

/// Open every compiled file and derive one build file per output.
///
/// Nothing is returned unless every output could be opened.
pub async fn materialize(
  original: &BuildFile,
  bundle: &CompiledBundle,
  scratch: Arc<ScratchSpace>,
) -> Result<Vec<BuildFile>, TransformError> {
  let names = output_paths(original.path(), bundle.layout);
  let mut outputs = Vec::with_capacity(names.len());

  for (scratch_path, name) in bundle.scratch_paths().into_iter().zip(names) {
    let stream = ScratchStream::open(scratch.clone(), &scratch_path)
      .await
      .map_err(|source| TransformError::OutputOpen {
        path: scratch_path.clone(),
        source,
      })?;

    debug!(from = %scratch_path.display(), to = %name.display(), "materializing output");

    let mut file = original.derive(Contents::Stream(Box::pin(stream)));
    file.set_path(name);
    outputs.push(file);
  }

  Ok(outputs)
}
