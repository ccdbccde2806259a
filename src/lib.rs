// src/lib.rs
//! # Document Chunker
//!
//! Converts arbitrarily long source text into token-bounded chunks suitable
//! for downstream embedding and indexing, preserving document provenance.
//! Two strategies share one contract:
//!
//! - **Token window**: slides a fixed-size, overlap-aware window over a
//!   flattened token stream spanning all input slices. Chunks may cross
//!   slice boundaries and carry every contributing document id.
//! - **Structure-aware**: recursively splits markdown-ish text along a
//!   priority-ordered hierarchy of separators (paragraph breaks, headings,
//!   block markers, sentences, clauses, single graphemes), re-stitches
//!   chunks with token-level overlap, and merges stray image references
//!   into their preceding context.
//!
//! Tokenization is an injected capability: chunkers resolve a [`Tokenizer`]
//! from the configured `encoding_model` through the process-wide
//! [`TokenizerRegistry`]. Both strategies are pure functions over their
//! arguments and safe to run from any number of threads concurrently.
//!
//! ## Quick Start
//!
//! ```rust
//! use doc_chunker::{chunk, ChunkSlice, ChunkStrategy, ChunkingConfig};
//!
//! let slices = vec![ChunkSlice::new(
//!     "doc-1",
//!     "# Introduction\n\nThis is a test document with enough text to chunk.",
//! )];
//! let config = ChunkingConfig::default();
//!
//! let chunks = chunk(ChunkStrategy::Structure, Some(&slices), Some(&config)).unwrap();
//! for chunk in &chunks {
//!     println!("{} tokens from {:?}", chunk.token_count, chunk.document_ids);
//! }
//! ```
//!
//! ## Custom configuration
//!
//! ```rust
//! use doc_chunker::{chunk, ChunkSlice, ChunkStrategy, ChunkingConfig};
//!
//! let config = ChunkingConfig::new(512, 64, "cl100k_base");
//! let slices = vec![ChunkSlice::new("doc-1", "Plain text to window over.")];
//! let chunks = chunk(ChunkStrategy::TokenWindow, Some(&slices), Some(&config)).unwrap();
//! assert_eq!(chunks.len(), 1);
//! ```

pub mod chunker;
pub mod error;
pub mod overlap;
pub mod pool;
pub mod tokenizer;
pub mod types;

pub use chunker::hierarchy::{FragmentRange, SeparatorTier};
pub use error::{ChunkError, Result};
pub use tokenizer::{HfTokenizer, TiktokenTokenizer, Tokenizer, TokenizerError, TokenizerRegistry};
pub use types::{ChunkSlice, ChunkingConfig, TextChunk};

use serde::{Deserialize, Serialize};

/// Which chunking strategy to run; selected by pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Fixed-size overlapping windows over the flattened token stream.
    TokenWindow,
    /// Separator-hierarchy splitting that respects semantic boundaries.
    Structure,
}

/// Chunk `slices` under `config` with the selected strategy.
///
/// `None` for either argument is an [`ChunkError::InvalidArgument`];
/// semantically empty input (zero slices, or slices encoding to zero
/// tokens) yields `Ok` with an empty vector.
pub fn chunk(
    strategy: ChunkStrategy,
    slices: Option<&[ChunkSlice]>,
    config: Option<&ChunkingConfig>,
) -> Result<Vec<TextChunk>> {
    match strategy {
        ChunkStrategy::TokenWindow => chunker::window::chunk(slices, config),
        ChunkStrategy::Structure => chunker::structure::chunk(slices, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_serde_names() {
        assert_eq!(
            serde_json::to_string(&ChunkStrategy::TokenWindow).unwrap(),
            "\"token_window\""
        );
        assert_eq!(
            serde_json::to_string(&ChunkStrategy::Structure).unwrap(),
            "\"structure\""
        );
    }

    #[test]
    fn test_dispatch_rejects_absent_arguments() {
        for strategy in [ChunkStrategy::TokenWindow, ChunkStrategy::Structure] {
            assert!(matches!(
                chunk(strategy, None, None),
                Err(ChunkError::InvalidArgument("slices"))
            ));
        }
    }
}
