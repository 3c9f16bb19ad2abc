//! Controller configuration: typed settings, file persistence, environment overrides.

pub mod persistence;
pub mod types;
