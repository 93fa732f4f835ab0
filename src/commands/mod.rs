//! CLI commands

pub mod init;
pub mod sync;
pub mod update;
pub mod utils;
