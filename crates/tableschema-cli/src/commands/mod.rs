//! CLI command implementations.

pub mod infer;
pub mod read;
pub mod validate;
