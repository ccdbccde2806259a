// src/chunker/window.rs
//! Token-window chunker.
//!
//! Flattens every slice's encoding into one ordered token stream and slides
//! a fixed-size, overlap-aware window over it. Chunks may span slice
//! boundaries; each chunk records every document whose tokens fall inside
//! its window. Operates purely over token ids; the text of a chunk is the
//! decoded window.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{ChunkError, Result};
use crate::pool;
use crate::tokenizer::{Tokenizer, TokenizerRegistry};
use crate::types::{ChunkSlice, ChunkingConfig, TextChunk};

/// A contiguous run of tokens in the flattened stream belonging to one slice.
struct TokenRun {
    slice_index: usize,
    start: usize,
    end: usize,
}

/// Chunk `slices` with the tokenizer named by `config.encoding_model`.
///
/// `None` for either argument is an [`ChunkError::InvalidArgument`]; empty
/// input (no slices, or slices that encode to zero tokens) yields an empty
/// output, not an error.
pub fn chunk(
    slices: Option<&[ChunkSlice]>,
    config: Option<&ChunkingConfig>,
) -> Result<Vec<TextChunk>> {
    let slices = slices.ok_or(ChunkError::InvalidArgument("slices"))?;
    let config = config.ok_or(ChunkError::InvalidArgument("config"))?;
    let tokenizer = TokenizerRegistry::global().resolve(&config.encoding_model)?;
    chunk_with(tokenizer.as_ref(), slices, config)
}

/// Like [`chunk`], with an explicitly injected tokenizer.
pub fn chunk_with(
    tokenizer: &dyn Tokenizer,
    slices: &[ChunkSlice],
    config: &ChunkingConfig,
) -> Result<Vec<TextChunk>> {
    let chunk_size = config.effective_size();
    let overlap = config.effective_overlap();
    let step = (chunk_size - overlap).max(1);

    // Flatten all slices into one token stream. Run-length bookkeeping per
    // slice keeps document-id collection proportional to the number of
    // slices a window touches, not the window length.
    let mut stream = pool::acquire();
    let mut runs: Vec<TokenRun> = Vec::with_capacity(slices.len());
    for (slice_index, slice) in slices.iter().enumerate() {
        let ids = tokenizer.encode(&slice.text)?;
        if ids.is_empty() {
            continue;
        }
        runs.push(TokenRun {
            slice_index,
            start: stream.len(),
            end: stream.len() + ids.len(),
        });
        stream.extend_from_slice(&ids);
    }

    let total = stream.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut run_cursor = 0;
    loop {
        let end = (start + chunk_size).min(total);

        // Runs that ended before this window can never be touched again.
        while runs[run_cursor].end <= start {
            run_cursor += 1;
        }
        let mut document_ids = BTreeSet::new();
        let mut run = run_cursor;
        while run < runs.len() && runs[run].start < end {
            document_ids.insert(slices[runs[run].slice_index].document_id.clone());
            run += 1;
        }

        let text = tokenizer.decode(&stream[start..end])?;
        chunks.push(TextChunk {
            document_ids,
            text,
            token_count: end - start,
        });

        if end == total {
            break;
        }
        start += step;
    }

    debug!(
        slices = slices.len(),
        tokens = total,
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "token-window chunking complete"
    );
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::test_util::CharTokenizer;

    fn slice(id: &str, text: &str) -> ChunkSlice {
        ChunkSlice::new(id, text)
    }

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(size, overlap, "unused-by-chunk_with")
    }

    #[test]
    fn test_absent_arguments_rejected() {
        let slices = vec![slice("doc-1", "text")];
        let cfg = ChunkingConfig::default();
        assert!(matches!(
            chunk(None, Some(&cfg)),
            Err(ChunkError::InvalidArgument("slices"))
        ));
        assert!(matches!(
            chunk(Some(&slices), None),
            Err(ChunkError::InvalidArgument("config"))
        ));
    }

    #[test]
    fn test_empty_inputs_yield_empty_output() {
        let t = CharTokenizer;
        assert!(chunk_with(&t, &[], &config(10, 2)).unwrap().is_empty());
        let empty = vec![slice("doc-1", "")];
        assert!(chunk_with(&t, &empty, &config(10, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_single_short_slice_is_verbatim() {
        let t = CharTokenizer;
        let slices = vec![slice("doc-1", "short")];
        let chunks = chunk_with(&t, &slices, &config(100, 10)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].token_count, 5);
        assert!(chunks[0].document_ids.contains("doc-1"));
    }

    #[test]
    fn test_window_sizes_and_overlap() {
        let t = CharTokenizer;
        // 26 tokens, size 10, overlap 2 -> step 8: [0,10) [8,18) [16,26)
        let slices = vec![slice("doc-1", "abcdefghijklmnopqrstuvwxyz")];
        let chunks = chunk_with(&t, &slices, &config(10, 2)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].text, "ijklmnopqr");
        assert_eq!(chunks[2].text, "qrstuvwxyz");
        for chunk in &chunks {
            assert_eq!(chunk.token_count, 10);
        }
    }

    #[test]
    fn test_overlap_exactness() {
        let t = CharTokenizer;
        let slices = vec![slice("doc-1", "abcdefghijklmnopqrstu")];
        let overlap = 3;
        let chunks = chunk_with(&t, &slices, &config(8, overlap)).unwrap();
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(pair[0].text.chars().count() - overlap).collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_coverage_modulo_overlap() {
        let t = CharTokenizer;
        let text = "the quick brown fox jumps over the lazy dog";
        let slices = vec![slice("doc-1", text)];
        let cfg = config(7, 2);
        let chunks = chunk_with(&t, &slices, &cfg).unwrap();

        // Dropping each chunk's leading overlap (except the first) and
        // concatenating reconstructs the input exactly once per position.
        let mut reassembled = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { cfg.overlap };
            reassembled.extend(chunk.text.chars().skip(skip));
        }
        assert_eq!(reassembled, text);
    }

    #[test]
    fn test_chunk_spanning_slices_collects_both_ids() {
        let t = CharTokenizer;
        let slices = vec![slice("doc-1", "aaaa"), slice("doc-2", "bbbb")];
        let chunks = chunk_with(&t, &slices, &config(6, 0)).unwrap();
        assert_eq!(chunks.len(), 2);
        // First window covers all of doc-1 and part of doc-2.
        assert_eq!(chunks[0].document_ids.len(), 2);
        // Second window is entirely inside doc-2.
        assert_eq!(chunks[1].document_ids.len(), 1);
        assert!(chunks[1].document_ids.contains("doc-2"));
    }

    #[test]
    fn test_slice_order_preserved() {
        let t = CharTokenizer;
        let slices = vec![slice("a", "11111"), slice("b", "22222")];
        let chunks = chunk_with(&t, &slices, &config(5, 0)).unwrap();
        assert_eq!(chunks[0].text, "11111");
        assert_eq!(chunks[1].text, "22222");
    }

    #[test]
    fn test_degenerate_config_still_terminates() {
        let t = CharTokenizer;
        let slices = vec![slice("doc-1", "abcdef")];
        // size 0 coerces to 1, overlap clamps to 0 -> one chunk per token.
        let chunks = chunk_with(&t, &slices, &config(0, 5)).unwrap();
        assert_eq!(chunks.len(), 6);
        for chunk in &chunks {
            assert_eq!(chunk.token_count, 1);
        }
    }

    #[test]
    fn test_determinism() {
        let t = CharTokenizer;
        let slices = vec![slice("doc-1", "deterministic output please")];
        let cfg = config(6, 2);
        let a = chunk_with(&t, &slices, &cfg).unwrap();
        let b = chunk_with(&t, &slices, &cfg).unwrap();
        assert_eq!(a, b);
    }
}
