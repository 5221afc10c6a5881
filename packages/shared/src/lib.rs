//! Utilities shared by the clubroom binaries and their tests.

pub mod logger;
pub mod time;
