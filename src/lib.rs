//! 小纸条 (little-notes) library
//!
//! This library provides functionality for creating, storing, searching, and
//! managing small personal notes with tags, pins, expiration countdowns and
//! full data export/import.

mod backend;
mod cli;
mod config;
mod errors;
mod helper;
mod note;
mod settings;
mod sort;
mod storage;
mod timestatus;
mod transfer;
mod types;

// Re-export key components
pub use backend::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use settings::*;
pub use sort::*;
pub use storage::*;
pub use timestatus::*;
pub use transfer::*;
pub use types::*;
