// src/chunker/structure.rs
//! Structure-aware (markdown) chunker.
//!
//! Splits each slice along the separator hierarchy, strongest tier first,
//! falling back to weaker separators (ultimately single graphemes) only when
//! a unit is too large for the active token budget. Produced units are
//! re-stitched with token-level overlap and a post-pass merges image
//! references into their preceding chunk so an image never opens a chunk
//! without context.
//!
//! The recursive splitter works on byte ranges into one normalized buffer
//! per slice; text is only materialized when a chunk is emitted.

use std::borrow::Cow;
use std::ops::Range;

use tracing::{debug, trace};

use crate::chunker::hierarchy::{self, FragmentRange, SeparatorTier};
use crate::error::{ChunkError, Result};
use crate::overlap;
use crate::tokenizer::{Tokenizer, TokenizerError, TokenizerRegistry};
use crate::types::{ChunkSlice, ChunkingConfig, TextChunk};

/// Minimum token budget; smaller configured sizes are raised to this.
const MIN_BUDGET: usize = 5;

/// Chunk `slices` with the tokenizer named by `config.encoding_model`.
///
/// Slices are chunked independently; every output chunk is attributed to
/// exactly one document. `None` arguments are rejected with
/// [`ChunkError::InvalidArgument`]; semantically empty input yields an
/// empty output.
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
    let size = config.effective_size();
    let overlap_tokens = config.effective_overlap();
    // The secondary budget reserves room for the overlap prefix prepended to
    // every chunk after the first, so the stitched token count still
    // respects the configured size.
    let primary = size.max(MIN_BUDGET);
    let secondary = primary.saturating_sub(overlap_tokens).max(MIN_BUDGET);

    let mut chunks = Vec::new();
    for slice in slices {
        let normalized = normalize_line_endings(&slice.text);
        let splitter = Splitter {
            text: &normalized,
            tokenizer,
            primary,
            secondary,
        };

        let mut ranges = Vec::new();
        splitter.split(0..normalized.len(), SeparatorTier::strongest(), &mut ranges)?;

        let mut units: Vec<String> = ranges
            .into_iter()
            .map(|range| normalized[range].to_string())
            .collect();
        if overlap_tokens > 0 && units.len() > 1 {
            units = overlap::stitch(tokenizer, units, overlap_tokens)?;
        }
        let units = merge_leading_images(units);

        for text in units {
            if text.trim().is_empty() {
                continue;
            }
            let token_count = tokenizer.count_tokens(&text)?;
            if token_count == 0 {
                continue;
            }
            chunks.push(TextChunk::single(&slice.document_id, text, token_count));
        }
    }

    debug!(
        slices = slices.len(),
        chunks = chunks.len(),
        primary,
        secondary,
        "structure-aware chunking complete"
    );
    Ok(chunks)
}

/// Normalize CRLF and bare CR line endings to LF.
fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            normalized.push('\n');
        } else {
            normalized.push(c);
        }
    }
    Cow::Owned(normalized)
}

/// Recursive range-based splitter for one normalized slice buffer.
struct Splitter<'a> {
    text: &'a str,
    tokenizer: &'a dyn Tokenizer,
    primary: usize,
    secondary: usize,
}

impl Splitter<'_> {
    /// The active budget: primary until the slice's first chunk is out.
    fn budget(&self, produced: usize) -> usize {
        if produced == 0 {
            self.primary
        } else {
            self.secondary
        }
    }

    fn count(&self, range: &Range<usize>) -> std::result::Result<usize, TokenizerError> {
        self.tokenizer.count_tokens(&self.text[range.clone()])
    }

    /// Split `span` into budget-sized ranges appended to `out`.
    ///
    /// Splits along `tier`'s separators, accumulating sentence-like units (a
    /// unit ends at its separator) greedily; a unit that alone exceeds the
    /// budget recurses into the next weaker tier, emitting all but its last
    /// piece and seeding the growing chunk with that remainder. At the
    /// character tier an over-budget unit is a single grapheme and is
    /// emitted as-is.
    fn split(
        &self,
        span: Range<usize>,
        tier: SeparatorTier,
        out: &mut Vec<Range<usize>>,
    ) -> std::result::Result<(), TokenizerError> {
        if span.is_empty() {
            return Ok(());
        }
        if self.count(&span)? <= self.budget(out.len()) {
            out.push(span);
            return Ok(());
        }
        trace!(?tier, start = span.start, end = span.end, "splitting over-budget span");

        let units = units_of(&self.text[span.clone()], tier, span.start);
        let mut current: Option<Range<usize>> = None;
        for unit in units {
            match current.take() {
                None => current = self.seed(unit, tier, out)?,
                Some(grown) => {
                    let merged = grown.start..unit.end;
                    if self.count(&merged)? <= self.budget(out.len()) {
                        current = Some(merged);
                    } else {
                        out.push(grown);
                        current = self.seed(unit, tier, out)?;
                    }
                }
            }
        }
        if let Some(rest) = current {
            out.push(rest);
        }
        Ok(())
    }

    /// Start a new growing chunk from `unit`, recursing into the next
    /// weaker tier when the unit alone exceeds the active budget.
    fn seed(
        &self,
        unit: Range<usize>,
        tier: SeparatorTier,
        out: &mut Vec<Range<usize>>,
    ) -> std::result::Result<Option<Range<usize>>, TokenizerError> {
        if self.count(&unit)? <= self.budget(out.len()) {
            return Ok(Some(unit));
        }
        match tier.weaker() {
            Some(weaker) => {
                self.split(unit, weaker, out)?;
                // The trailing piece stays open so following units can pack
                // onto it.
                Ok(out.pop())
            }
            None => {
                // A single grapheme over budget: atomic, emit unchanged.
                out.push(unit);
                Ok(None)
            }
        }
    }
}

/// Group one tier's fragments into sentence-like units: each unit is the
/// content up to and including its separator. Ranges are rebased onto the
/// full buffer via `base`.
fn units_of(span_text: &str, tier: SeparatorTier, base: usize) -> Vec<Range<usize>> {
    let fragments: Vec<FragmentRange> = hierarchy::split_fragments(span_text, tier);
    let mut units = Vec::new();
    let mut open: Option<usize> = None;
    for fragment in &fragments {
        let start = *open.get_or_insert(fragment.range.start);
        if fragment.is_separator {
            units.push(base + start..base + fragment.range.end);
            open = None;
        }
    }
    if let Some(start) = open {
        units.push(base + start..base + span_text.len());
    }
    units
}

/// Merge chunks that open with an image reference into their predecessor.
///
/// A chunk whose trimmed text starts with `![` is appended to the previous
/// chunk joined by a blank line; the very first chunk of a slice stands
/// alone. Consecutive images fold into the same growing predecessor.
fn merge_leading_images(units: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(units.len());
    for text in units {
        match merged.last_mut() {
            Some(previous) if text.trim_start().starts_with("![") => {
                previous.push_str("\n\n");
                previous.push_str(&text);
            }
            _ => merged.push(text),
        }
    }
    merged
}
