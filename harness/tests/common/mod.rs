//! Shared test infrastructure

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::*;
