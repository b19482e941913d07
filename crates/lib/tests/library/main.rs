//! Library integration tests: the transform driven through a real compiler process.

#![cfg(unix)]
