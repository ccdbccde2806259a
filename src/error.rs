// src/error.rs
//! Error taxonomy for the chunking engine.
//!
//! Only two kinds of failure exist: an absent argument reference, and
//! tokenizer failures propagated unchanged from the tokenizer capability.
//! Degenerate configuration values (zero size, out-of-range overlap) are
//! normalized, never rejected.

use thiserror::Error;

use crate::tokenizer::TokenizerError;

/// Errors surfaced by the chunking entry points.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// A required argument reference was absent.
    #[error("invalid argument: {0} must be present")]
    InvalidArgument(&'static str),

    /// A tokenizer failure, propagated unchanged from the capability.
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChunkError>;
