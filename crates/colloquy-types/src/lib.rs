//! Shared domain types for Colloquy.
//!
//! This crate contains the core domain types used across the Colloquy
//! workspace: users, chats, messages, read receipts, identifiers,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod id;
pub mod user;
