//! Descriptor-driven settings resolution with lazy default persistence.
//!
//! Each property of a registered settings class resolves through the cache,
//! then the durable record store, then the declared default. Newly seen
//! defaults are written back so later reads find them in the store.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
