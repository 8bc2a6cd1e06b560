// LogStream - core/mod.rs
//
// Core business logic layer: record model, line grammar, wire events.
// Must NOT depend on: app, platform, or any filesystem access.

pub mod event;
pub mod model;
pub mod parser;
