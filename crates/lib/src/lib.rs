//! jbbpipe-lib: compile build files into JavaScript Binary Bundles.
//!
//! This crate adapts an external JBB compiler to a file pipeline:
//! - `BuildFile`: one file flowing through the pipeline
//! - `JbbTransform`: reads `bundle.json`, runs the compiler in a scratch
//!   space and emits the compiled bundle (or four sparse parts)
//! - `BundleCompiler`: the opaque compiler, driven as a process by `CommandCompiler`
//! - `pipeline`: reading sources, running transforms in parallel, writing outputs

pub mod compiler;
pub mod config;
pub mod consts;
pub mod descriptor;
pub mod file;
pub mod pipeline;
pub mod scratch;
pub mod transform;

#[cfg(test)]
pub(crate) mod util;

pub use compiler::{BundleCompiler, CommandCompiler, CompileError, CompileRequest};
pub use config::{JbbConfig, OutputLayout, RunConfig};
pub use file::{BuildFile, Contents};
pub use transform::{JbbTransform, PluginError, Stage, TransformError};
