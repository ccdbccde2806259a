// src/chunker/mod.rs
//! The two chunking strategies sharing one contract.

pub mod hierarchy;
pub mod structure;
pub mod window;
