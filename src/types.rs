// src/types.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One input unit of source text, tagged with the document it came from.
///
/// Slices are produced by the document-loading stage (one per document or
/// pre-split segment) and consumed read-only by the chunkers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSlice {
    /// Identifier of the source document this slice belongs to.
    pub document_id: String,
    /// Raw text content of the slice.
    pub text: String,
}

impl ChunkSlice {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
        }
    }
}

/// Configuration for a single chunking call.
///
/// Degenerate values are normalized rather than rejected: a zero `size` is
/// coerced to 1 and `overlap` is clamped into `[0, size - 1]`. This keeps
/// the chunkers permissive for varied caller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target maximum tokens per chunk.
    pub size: usize,
    /// Tokens shared between adjacent chunks for context continuity.
    pub overlap: usize,
    /// Tokenizer selector, e.g. an encoding name ("cl100k_base") or a model
    /// name ("gpt-4"). Resolved through the tokenizer registry.
    pub encoding_model: String,
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize, encoding_model: impl Into<String>) -> Self {
        Self {
            size,
            overlap,
            encoding_model: encoding_model.into(),
        }
    }

    /// Chunk size with the ≥1 coercion applied.
    pub(crate) fn effective_size(&self) -> usize {
        self.size.max(1)
    }

    /// Overlap clamped into `[0, size - 1]`.
    pub(crate) fn effective_overlap(&self) -> usize {
        self.overlap.min(self.effective_size() - 1)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 800,
            overlap: 100,
            encoding_model: "cl100k_base".to_string(),
        }
    }
}

/// One output unit of bounded token size.
///
/// `document_ids` lists every slice whose content contributed to this chunk;
/// the token-window chunker can span slice boundaries, so there may be more
/// than one. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Deduplicated ids of the documents this chunk was drawn from.
    pub document_ids: BTreeSet<String>,
    /// The chunk content.
    pub text: String,
    /// Token count of `text` under the configured tokenizer.
    pub token_count: usize,
}

impl TextChunk {
    /// Build a chunk attributed to a single document.
    pub(crate) fn single(document_id: &str, text: String, token_count: usize) -> Self {
        let mut document_ids = BTreeSet::new();
        document_ids.insert(document_id.to_string());
        Self {
            document_ids,
            text,
            token_count,
        }
    }
}
