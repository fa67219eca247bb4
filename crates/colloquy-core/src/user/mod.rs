//! User directory contract and service.

pub mod repository;
pub mod service;
