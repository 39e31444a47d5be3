//! CLI command implementations.

pub mod common;
pub mod devices;
pub mod modules;
pub mod render;
pub mod run;
pub mod settings;
pub mod validate;
