//! Implementation of the `jbbpipe plan` command.
//!
//! Resolves each input's descriptor and the names of the files a build
//! would produce, without running the compiler.

use anyhow::{Context, Result, bail};
use serde_json::json;

use jbbpipe_lib::descriptor::descriptor_path;
use jbbpipe_lib::pipeline::stat_sources;
use jbbpipe_lib::transform::output_paths;

use crate::PlanArgs;
use crate::output::{OutputFormat, print_info, print_json, print_mapping, print_stat, print_warning};

use super::load_config;

pub fn cmd_plan(args: PlanArgs, format: OutputFormat) -> Result<()> {
  let config = load_config(&args.options)?;
  let layout = config.layout();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let files = rt.block_on(stat_sources(&args.inputs))?;

  let mut missing = 0;
  let mut entries = Vec::with_capacity(files.len());
  for file in &files {
    let descriptor = descriptor_path(file);
    let found = descriptor.is_file();
    if !found {
      missing += 1;
    }
    let outputs = output_paths(&file.relative(), layout);
    entries.push((file.relative(), descriptor, found, outputs));
  }

  if format.is_json() {
    let output = json!({
      "layout": format!("{:?}", layout).to_lowercase(),
      "inputs": entries.iter().map(|(input, descriptor, found, outputs)| json!({
        "input": input.display().to_string(),
        "descriptor": descriptor.display().to_string(),
        "descriptor_found": found,
        "outputs": outputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
      })).collect::<Vec<_>>(),
    });
    print_json(&output)?;
  } else {
    for (input, descriptor, found, outputs) in &entries {
      print_info(&input.display().to_string());
      let status = if *found { "found" } else { "missing" };
      print_stat("descriptor", &format!("{} ({})", descriptor.display(), status));
      for out in outputs {
        print_mapping(&input.display().to_string(), &out.display().to_string());
      }
    }
    if missing > 0 {
      print_warning(&format!("{} input(s) have no bundle descriptor", missing));
    }
  }

  if missing > 0 {
    bail!("{} of {} input(s) have no bundle descriptor", missing, entries.len());
  }
  Ok(())
}
