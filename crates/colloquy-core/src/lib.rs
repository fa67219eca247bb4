//! Chat domain logic and repository trait definitions for Colloquy.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the storage-independent rules: per-user search,
//! caller-relative display resolution, and input validation. It depends only
//! on `colloquy-types` -- never on `colloquy-infra` or any database/IO crate.

pub mod chat;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;
