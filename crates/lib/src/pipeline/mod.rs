//! Pipeline host.
//!
//! Reads source files, pushes them through a `JbbTransform` with bounded
//! parallelism and delivers the results as a stream of `PipelineEvent`s:
//! every input ends in either its outputs or exactly one error.

pub mod dest;
pub mod source;

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::compiler::BundleCompiler;
use crate::config::RunConfig;
use crate::file::BuildFile;
use crate::transform::{JbbTransform, PluginError};

pub use dest::{DestError, write_file};
pub use source::{SourceError, read_sources, stat_sources};

/// What a transform sends downstream.
#[derive(Debug)]
pub enum PipelineEvent {
  File(BuildFile),
  Error(PluginError),
}

/// Downstream end of a transform.
#[derive(Debug, Clone)]
pub struct Sink {
  tx: mpsc::Sender<PipelineEvent>,
}

impl Sink {
  pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
    Self { tx }
  }

  pub async fn push(&self, file: BuildFile) {
    if self.tx.send(PipelineEvent::File(file)).await.is_err() {
      debug!("downstream closed, dropping file");
    }
  }

  pub async fn error(&self, err: PluginError) {
    if self.tx.send(PipelineEvent::Error(err)).await.is_err() {
      debug!("downstream closed, dropping error");
    }
  }
}

/// Summary of a pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
  pub inputs: usize,
  pub succeeded: usize,
  pub failed: usize,
}

impl<C: BundleCompiler> JbbTransform<C> {
  /// Process one file and send its outcome to `sink`.
  ///
  /// Sends every output in order on success, or exactly one error. Returns
  /// whether the file succeeded; the returned future resolving is the
  /// file's completion.
  pub async fn transform(&self, file: BuildFile, sink: &Sink) -> bool {
    match self.process(file).await {
      Ok(outputs) => {
        for output in outputs {
          sink.push(output).await;
        }
        true
      }
      Err(e) => {
        sink.error(e).await;
        false
      }
    }
  }
}

/// Run every file through `transform`, at most `config.parallelism` at once.
///
/// Events arrive on `sink` as files complete; outputs of one input are kept
/// together and in order, inputs may finish in any order.
pub async fn run_pipeline<C>(
  transform: Arc<JbbTransform<C>>,
  files: Vec<BuildFile>,
  config: &RunConfig,
  sink: Sink,
) -> RunSummary
where
  C: BundleCompiler + 'static,
{
  let mut summary = RunSummary {
    inputs: files.len(),
    ..RunSummary::default()
  };
  info!(inputs = summary.inputs, parallelism = config.parallelism, "starting pipeline");

  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut join_set = JoinSet::new();

  for file in files {
    let transform = transform.clone();
    let semaphore = semaphore.clone();
    let sink = sink.clone();

    join_set.spawn(async move {
      let _permit = semaphore.acquire_owned().await.ok();
      transform.transform(file, &sink).await
    });
  }

  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(true) => summary.succeeded += 1,
      Ok(false) => summary.failed += 1,
      Err(e) => {
        error!(error = %e, "transform task panicked");
        summary.failed += 1;
      }
    }
  }

  info!(
    succeeded = summary.succeeded,
    failed = summary.failed,
    "pipeline complete"
  );
  summary
}
