//! Settings resolution services and the collaborator seams they depend on.

pub mod codec;
pub mod error;
pub mod identity;
pub mod registry;
pub mod repos;
pub mod resolver;
pub mod resources;
