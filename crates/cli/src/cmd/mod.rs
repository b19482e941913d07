mod build;
mod plan;

pub use build::cmd_build;
pub use plan::cmd_plan;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use jbbpipe_lib::JbbConfig;

use crate::OptionArgs;

/// Options file (if any) with individual flags merged over it.
pub(crate) fn load_config(args: &OptionArgs) -> Result<JbbConfig> {
  let base = match &args.options {
    Some(path) => {
      JbbConfig::from_file(path).with_context(|| format!("Failed to load options: {}", path.display()))?
    }
    None => JbbConfig::default(),
  };

  let mut overrides = Map::new();
  if let Some(profile) = &args.profile {
    overrides.insert("profile".to_string(), Value::String(profile.clone()));
  }
  if args.sparse {
    overrides.insert("sparse".to_string(), Value::Bool(true));
  }
  if let Some(path) = &args.path {
    overrides.insert("path".to_string(), Value::String(path.to_string_lossy().into_owned()));
  }

  base.merge(overrides).context("Invalid options")
}
