//! services/api/src/lib.rs
//!
//! The adapters, stores, orchestrator and web layer of the Qalbu service,
//! shared by the `api` and `openapi` binaries.

pub mod adapters;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod records;
pub mod stores;
pub mod web;
