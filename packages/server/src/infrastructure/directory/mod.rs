//! User directory implementations.

pub mod inmemory;

pub use inmemory::{InMemoryUserDirectory, SeedError, SeedUser};
