//! External compiler process.
//!
//! Runs the configured program once per bundle. The request is written to the
//! process's stdin as a JSON envelope:
//!
//! ```json
//! { "bundle": { ... }, "output": "/tmp/jbbpipe-x/bundle-y.jbb", "config": { ... } }
//! ```
//!
//! and mirrored into the environment for wrapper scripts:
//! - `JBB_OUTPUT` - scratch path to write to
//! - `JBB_SPARSE` - `1` for sparse bundles, `0` otherwise
//! - `JBB_PATH` - asset base directory
//! - `JBB_PROFILE` - compiler profile, when set
//!
//! The process exiting with status 0 is the completion signal.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{BundleCompiler, CompileError, CompileRequest};
use crate::config::OutputLayout;
use crate::consts::{COMPILER_ENV, DEFAULT_COMPILER};

/// Compiles bundles by running an external program.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
  program: String,
  args: Vec<String>,
  env: BTreeMap<String, String>,
  cwd: Option<PathBuf>,
}

#[derive(Serialize)]
struct Envelope<'a> {
  bundle: &'a Value,
  output: &'a std::path::Path,
  config: &'a Map<String, Value>,
}

impl CommandCompiler {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: BTreeMap::new(),
      cwd: None,
    }
  }

  /// Program named by `JBBPIPE_COMPILER`, or `jbb`.
  pub fn from_env() -> Self {
    let program = std::env::var(COMPILER_ENV)
      .ok()
      .filter(|p| !p.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_COMPILER.to_string());
    Self::new(program)
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  async fn run(&self, request: CompileRequest<'_>) -> Result<(), CompileError> {
    info!(program = %self.program, output = %request.output.display(), "invoking compiler");

    let envelope = serde_json::to_vec(&Envelope {
      bundle: request.bundle,
      output: request.output,
      config: request.options,
    })?;

    let mut command = Command::new(&self.program);
    command
      .args(&self.args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .env("JBB_OUTPUT", request.output)
      .env(
        "JBB_SPARSE",
        if request.layout == OutputLayout::Sparse { "1" } else { "0" },
      );

    if let Some(Value::String(path)) = request.options.get("path") {
      command.env("JBB_PATH", path);
    }
    if let Some(Value::String(profile)) = request.options.get("profile") {
      command.env("JBB_PROFILE", profile);
    }
    for (key, value) in &self.env {
      command.env(key, value);
    }
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }

    debug!(program = %self.program, args = ?self.args, "spawning compiler");

    let mut child = command.spawn().map_err(|source| CompileError::Spawn {
      program: self.program.clone(),
      source,
    })?;

    // stdin is fed while output drains; a compiler may fill its pipes first
    let stdin = child.stdin.take();
    let write_request = async move {
      let Some(mut stdin) = stdin else {
        return Ok(());
      };
      // A compiler driven purely by the environment may exit without reading
      match stdin.write_all(&envelope).await {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
          debug!("compiler closed stdin before reading the request");
          Ok(())
        }
        result => result,
      }
    };

    let (written, output) = tokio::join!(write_request, child.wait_with_output());
    let output = output?;
    written?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "compiler stdout");
    }

    if !output.status.success() {
      warn!(program = %self.program, code = ?output.status.code(), "compiler failed");
      return Err(CompileError::Failed {
        program: self.program.clone(),
        code: output.status.code(),
        stderr: stderr.into_owned(),
      });
    }

    if !stderr.trim().is_empty() {
      debug!(stderr = %stderr.trim(), "compiler stderr");
    }

    Ok(())
  }
}

impl BundleCompiler for CommandCompiler {
  fn compile(&self, request: CompileRequest<'_>) -> impl Future<Output = Result<(), CompileError>> + Send {
    self.run(request)
  }
}
