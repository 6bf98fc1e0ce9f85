//! Small helpers shared by the workspace crates: environment lookups and
//! credential-file loading.

pub mod config;
pub mod env;
