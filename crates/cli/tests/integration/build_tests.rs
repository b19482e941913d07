//! Build command integration tests.

use predicates::prelude::*;

use super::common::{FAKE_COMPILER, TestEnv};

#[test]
fn build_writes_bundle() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");

  env
    .build_cmd(FAKE_COMPILER)
    .arg(&input)
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled 1 of 1 input(s)"));

  assert_eq!(env.read_output("md2.jbb"), ".jbb:");
  assert_eq!(env.scratch_entries(), 0);
}

#[test]
fn build_sparse_writes_four_parts() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");

  env
    .build_cmd(FAKE_COMPILER)
    .arg("--sparse")
    .arg("--profile")
    .arg("release")
    .arg(&input)
    .assert()
    .success();

  assert_eq!(env.read_output("md2.jbbp"), ".jbbp:release");
  assert_eq!(env.read_output("md2_b16.jbbp"), "_b16.jbbp:release");
  assert_eq!(env.read_output("md2_b32.jbbp"), "_b32.jbbp:release");
  assert_eq!(env.read_output("md2_b64.jbbp"), "_b64.jbbp:release");
  assert!(!env.dest().join("md2.jbb").exists());
}

#[test]
fn build_streamed_input() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");

  env.build_cmd(FAKE_COMPILER).arg("--stream").arg(&input).assert().success();

  assert_eq!(env.read_output("md2.jbb"), ".jbb:");
}

#[test]
fn build_bundle_source_directory() {
  let env = TestEnv::new();
  env.write_file("md2.jbbsrc/bundle.json", r#"{ "name": "md2" }"#);

  env
    .build_cmd(FAKE_COMPILER)
    .arg(env.src().join("md2.jbbsrc"))
    .assert()
    .success();

  assert_eq!(env.read_output("md2.jbb"), ".jbb:");
}

#[test]
fn build_fails_without_descriptor() {
  let env = TestEnv::new();
  let input = env.write_file("md2.jbbsrc", "source");

  env
    .build_cmd(FAKE_COMPILER)
    .arg(&input)
    .assert()
    .failure()
    .stderr(predicate::str::contains("[jbbpipe]"))
    .stderr(predicate::str::contains("bundle.json"))
    .stderr(predicate::str::contains("1 of 1 input(s) failed"));

  assert!(!env.dest().join("md2.jbb").exists());
}

#[test]
fn build_reports_compiler_stderr() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");

  env
    .build_cmd("echo 'unknown profile' >&2; exit 3")
    .arg(&input)
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown profile"));

  assert_eq!(env.scratch_entries(), 0);
}

#[test]
fn build_keeps_good_inputs_when_one_fails() {
  let env = TestEnv::new().with_descriptor();
  let good = env.write_file("good.jbbsrc", "source");
  let bad = env.write_file("orphan/bad.jbbsrc", "source");

  env
    .build_cmd(FAKE_COMPILER)
    .arg(&good)
    .arg(&bad)
    .assert()
    .failure()
    .stdout(predicate::str::contains("Compiled 1 of 2 input(s)"))
    .stderr(predicate::str::contains("bad.jbbsrc"));

  assert_eq!(env.read_output("good.jbb"), ".jbb:");
}

#[test]
fn build_reports_every_failure_when_dest_is_unwritable() {
  let env = TestEnv::new().with_descriptor();
  let good = env.write_file("good.jbbsrc", "source");
  let other = env.write_file("other.jbbsrc", "source");
  let bad = env.write_file("orphan/bad.jbbsrc", "source");
  std::fs::write(env.dest(), "not a directory").unwrap();

  env
    .build_cmd(FAKE_COMPILER)
    .args(["--jobs", "1"])
    .arg(&good)
    .arg(&other)
    .arg(&bad)
    .assert()
    .failure()
    .stderr(predicate::str::contains("good.jbbsrc (write stage)"))
    .stderr(predicate::str::contains("other.jbbsrc (write stage)"))
    .stderr(predicate::str::contains("bad.jbbsrc (descriptor stage)"));

  assert_eq!(env.scratch_entries(), 0);
}

#[test]
fn build_fails_when_outputs_cannot_be_written() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");
  std::fs::write(env.dest(), "not a directory").unwrap();

  env
    .build_cmd(FAKE_COMPILER)
    .arg(&input)
    .assert()
    .failure()
    .stderr(predicate::str::contains("1 input(s) could not be written"));
}

#[test]
fn build_json_summary() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");

  let output = env
    .build_cmd(FAKE_COMPILER)
    .args(["--format", "json"])
    .arg(&input)
    .output()
    .unwrap();

  assert!(output.status.success());
  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["inputs"], 1);
  assert_eq!(value["succeeded"], 1);
  assert_eq!(value["failed"], 0);
  assert_eq!(value["outputs"].as_array().unwrap().len(), 1);
  assert!(value["errors"].as_array().unwrap().is_empty());
}

#[test]
fn build_sends_options_file_to_compiler() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");
  let options = env.temp.path().join("options.json");
  std::fs::write(&options, r#"{ "profile": "debug", "log": 2 }"#).unwrap();
  let script = format!(
    "cat > {}; printf x > \"$JBB_OUTPUT\"",
    env.temp.path().join("request.json").display()
  );

  env
    .build_cmd(&script)
    .arg("--options")
    .arg(&options)
    .arg(&input)
    .assert()
    .success();

  let request: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(env.temp.path().join("request.json")).unwrap()).unwrap();
  assert_eq!(request["bundle"]["name"], "md2");
  assert_eq!(request["config"]["profile"], "debug");
  assert_eq!(request["config"]["log"], 2);
  assert_eq!(
    request["config"]["path"],
    dunce::canonicalize(env.src()).unwrap().display().to_string()
  );
}

#[test]
fn compiler_from_environment() {
  let env = TestEnv::new().with_descriptor();
  let input = env.write_file("md2.jbbsrc", "source");

  env
    .cmd()
    .env("JBBPIPE_COMPILER", "/bin/sh")
    .arg("build")
    .arg("--dest")
    .arg(env.dest())
    .args(["--compiler-arg", "-c", "--compiler-arg", FAKE_COMPILER])
    .arg(&input)
    .assert()
    .success();

  assert_eq!(env.read_output("md2.jbb"), ".jbb:");
}
