//! Core types, traits and pure functions for repocache.
//!
//! Nothing in this crate performs I/O. The [`storage::Store`] and
//! [`cache::Cache`] traits describe the collaborators; the functions in
//! [`cache`] and [`query`] are the pure pieces the orchestrator composes.

pub mod cache;
pub mod entity;
pub mod query;
pub mod storage;
