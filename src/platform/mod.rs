// LogStream - platform/mod.rs
//
// Platform abstraction layer: config file location and loading, filesystem
// reads.
// Dependencies: standard library, directories, toml.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
