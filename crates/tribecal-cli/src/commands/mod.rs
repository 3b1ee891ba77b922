//! CLI command implementations.

pub mod analyze;
pub mod calibrate;
mod common;
pub mod compare;
pub mod config;
pub mod regress;
