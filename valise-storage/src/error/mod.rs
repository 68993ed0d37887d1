//! Error types

mod storage;

pub use storage::*;
