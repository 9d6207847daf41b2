//! CLI command implementations.

pub mod common;
pub mod config;
pub mod discover;
pub mod init;
pub mod narrate;
pub mod play;
pub mod tour;
