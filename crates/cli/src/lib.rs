//! The `switchboard` binary: demo commands served over stdin/stdout.

pub mod app;
pub mod commands;
pub mod serve;
