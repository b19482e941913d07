//! Names and suffixes shared across the crate.

/// Identity reported on every pipeline error.
pub const PLUGIN_NAME: &str = "jbbpipe";

/// Descriptor file looked up beside each input.
pub const DESCRIPTOR_FILE: &str = "bundle.json";

/// Suffix of the scratch file handed to the compiler.
pub const SCRATCH_SUFFIX: &str = ".jbb";

/// Output suffixes for a regular bundle.
pub const BUNDLE_SUFFIXES: &[&str] = &[".jbb"];

/// Output suffixes for a sparse bundle, in emission order.
pub const SPARSE_SUFFIXES: &[&str] = &[".jbbp", "_b16.jbbp", "_b32.jbbp", "_b64.jbbp"];

/// Environment variable naming the default compiler program.
pub const COMPILER_ENV: &str = "JBBPIPE_COMPILER";

/// Compiler program used when nothing else is configured.
pub const DEFAULT_COMPILER: &str = "jbb";
