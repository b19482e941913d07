//! Implementation of the `jbbpipe build` command.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use jbbpipe_lib::consts::PLUGIN_NAME;
use jbbpipe_lib::pipeline::{PipelineEvent, RunSummary, Sink, read_sources, run_pipeline, write_file};
use jbbpipe_lib::{CommandCompiler, JbbTransform, RunConfig};

use crate::BuildArgs;
use crate::output::{OutputFormat, format_duration, print_error, print_json, print_mapping, print_success, print_warning};

use super::load_config;

struct Written {
  input: PathBuf,
  output: PathBuf,
}

struct Failure {
  file: PathBuf,
  stage: String,
  message: String,
  report: String,
}

/// Inputs with at least one output that failed to write.
fn unwritten_inputs(failures: &[Failure]) -> usize {
  failures
    .iter()
    .filter(|f| f.stage == "write")
    .map(|f| &f.file)
    .collect::<BTreeSet<_>>()
    .len()
}

/// Execute the build command.
///
/// Reads every input, compiles them through the configured compiler with
/// bounded parallelism and writes the produced bundles under `dest`.
/// Fails if any input failed, after every other input has been written.
pub fn cmd_build(args: BuildArgs, format: OutputFormat) -> Result<()> {
  let config = load_config(&args.options)?;

  let mut compiler = match &args.compiler {
    Some(program) => CommandCompiler::new(program.clone()),
    None => CommandCompiler::from_env(),
  };
  compiler = compiler.args(args.compiler_args.iter().cloned());

  let mut run_config = RunConfig::default();
  if let Some(jobs) = args.jobs {
    run_config.parallelism = jobs.max(1);
  }
  run_config.scratch_dir = args.scratch_dir.clone();

  let mut transform = JbbTransform::new(config, compiler);
  if let Some(dir) = &run_config.scratch_dir {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create scratch dir: {}", dir.display()))?;
    transform = transform.with_scratch_dir(dir.clone());
  }
  let transform = Arc::new(transform);

  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let (summary, written, failures) = rt.block_on(async {
    let files = read_sources(&args.inputs, !args.stream).await?;
    info!(inputs = files.len(), dest = %args.dest.display(), "building");

    let (tx, mut rx) = mpsc::channel(64);
    let runner = tokio::spawn({
      let transform = transform.clone();
      async move { run_pipeline(transform, files, &run_config, Sink::new(tx)).await }
    });

    let mut written = Vec::new();
    let mut failures = Vec::new();
    while let Some(event) = rx.recv().await {
      match event {
        PipelineEvent::File(file) => {
          let input = file.history().first().cloned().unwrap_or_default();
          match write_file(file, &args.dest).await {
            Ok(Some(output)) => written.push(Written { input, output }),
            Ok(None) => {}
            Err(e) => {
              warn!(input = %input.display(), error = %e, "failed to write output");
              failures.push(Failure {
                report: format!("[{}] {} (write stage): {}", PLUGIN_NAME, input.display(), e),
                file: input,
                stage: "write".to_string(),
                message: e.to_string(),
              });
            }
          }
        }
        PipelineEvent::Error(err) => failures.push(Failure {
          file: err.file.clone(),
          stage: err.stage.to_string(),
          message: err.source.to_string(),
          report: err.report(),
        }),
      }
    }

    let summary: RunSummary = runner.await.context("Pipeline task failed")?;
    anyhow::Ok((summary, written, failures))
  })?;
  let elapsed = start.elapsed();

  if format.is_json() {
    let output = json!({
      "inputs": summary.inputs,
      "succeeded": summary.succeeded,
      "failed": summary.failed,
      "duration_ms": elapsed.as_millis() as u64,
      "outputs": written.iter().map(|w| json!({
        "input": w.input.display().to_string(),
        "output": w.output.display().to_string(),
      })).collect::<Vec<_>>(),
      "errors": failures.iter().map(|f| json!({
        "file": f.file.display().to_string(),
        "stage": f.stage,
        "message": f.message,
      })).collect::<Vec<_>>(),
    });
    print_json(&output)?;
  } else {
    for failure in &failures {
      print_error(&failure.report);
    }
    if summary.succeeded > 0 {
      print_success(&format!(
        "Compiled {} of {} input(s) in {}",
        summary.succeeded,
        summary.inputs,
        format_duration(elapsed)
      ));
      for w in &written {
        print_mapping(&w.input.display().to_string(), &w.output.display().to_string());
      }
    } else if summary.inputs == 0 {
      print_warning("No inputs to compile");
    }
  }

  if summary.failed > 0 {
    bail!("{} of {} input(s) failed", summary.failed, summary.inputs);
  }
  let unwritten = unwritten_inputs(&failures);
  if unwritten > 0 {
    bail!("{} input(s) could not be written to {}", unwritten, args.dest.display());
  }
  Ok(())
}
