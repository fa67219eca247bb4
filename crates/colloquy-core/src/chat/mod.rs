//! Chat storage contract, search, display resolution, and service.

pub mod repository;
pub mod search;
pub mod service;
pub mod view;
