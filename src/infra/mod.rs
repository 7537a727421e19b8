//! Infrastructure adapters and runtime bootstrap.

pub mod catalog;
pub mod db;
pub mod error;
pub mod memory;
pub mod resources;
pub mod telemetry;
