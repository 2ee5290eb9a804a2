//! Shared code for the quoter binaries

pub mod commands;
pub mod common;
