//! Request extractors.

pub mod caller;
pub mod query;
