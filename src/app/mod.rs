// LogStream - app/mod.rs
//
// Application layer: source registry, snapshot reads, growth watchers,
// subscriber fan-out, and the request-level facade.
// Dependencies: core, platform, util.

pub mod api;
pub mod hub;
pub mod registry;
pub mod snapshot;
pub mod tail;
