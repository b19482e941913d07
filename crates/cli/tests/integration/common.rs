//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Shell compiler: records the request it was given and writes
/// `<suffix>:<profile>` into every file it is expected to produce.
pub const FAKE_COMPILER: &str = r#"
base="${JBB_OUTPUT%.jbb}"
cat > "$base.request.json"
if [ "$JBB_SPARSE" = "1" ]; then
  for s in .jbbp _b16.jbbp _b32.jbbp _b64.jbbp; do
    printf '%s:%s' "$s" "$JBB_PROFILE" > "$base$s"
  done
else
  printf '%s:%s' ".jbb" "$JBB_PROFILE" > "$JBB_OUTPUT"
fi
"#;

/// Isolated test environment.
///
/// Sources live in `src/`, scratch spaces in `scratch/` and outputs are
/// written to `build/`.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    Self { temp }
  }

  pub fn src(&self) -> PathBuf {
    self.temp.path().join("src")
  }

  pub fn scratch(&self) -> PathBuf {
    self.temp.path().join("scratch")
  }

  pub fn dest(&self) -> PathBuf {
    self.temp.path().join("build")
  }

  /// Write a file relative to `src/`.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.src().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn with_descriptor(self) -> Self {
    self.write_file("bundle.json", r#"{ "name": "md2" }"#);
    self
  }

  /// The jbbpipe binary with `JBBPIPE_COMPILER` cleared.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("jbbpipe");
    cmd.env_remove("JBBPIPE_COMPILER");
    cmd.current_dir(self.temp.path());
    cmd
  }

  /// `jbbpipe build` wired to `script` as the compiler.
  pub fn build_cmd(&self, script: &str) -> Command {
    let mut cmd = self.cmd();
    cmd.arg("build");
    cmd.arg("--dest").arg(self.dest());
    cmd.arg("--scratch-dir").arg(self.scratch());
    cmd.args(["--compiler", "/bin/sh", "--compiler-arg", "-c", "--compiler-arg", script]);
    cmd
  }

  pub fn read_output(&self, name: &str) -> String {
    std::fs::read_to_string(self.dest().join(name)).unwrap_or_else(|e| panic!("Failed to read output {}: {}", name, e))
  }

  /// Entries left in the scratch directory.
  pub fn scratch_entries(&self) -> usize {
    count_entries(&self.scratch())
  }
}

fn count_entries(dir: &Path) -> usize {
  std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
