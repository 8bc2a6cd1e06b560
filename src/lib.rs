// LogStream - lib.rs
//
// Library entry point, exposing the tail engine for the binary, integration
// tests, and any transport layer that embeds it.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
