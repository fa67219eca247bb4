//! Infrastructure layer for Colloquy.
//!
//! Contains implementations of the repository traits defined in `colloquy-core`
//! (SQLite chat store and user directory) plus config and data directory
//! resolution.

pub mod config;
pub mod sqlite;
