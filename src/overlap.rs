// src/overlap.rs
//! Token-level overlap re-stitching for structure-aware chunks.
//!
//! Mirrors the token-window chunker's overlap, but computed per adjacent
//! pair: the prefix prepended to a unit is decoded from the trailing
//! `overlap` tokens of the previous unit's *own original* text, not from the
//! previously-overlapped result. The first unit is kept verbatim.

use crate::tokenizer::{Tokenizer, TokenizerError};

/// Prepend decoded tail-of-previous-unit prefixes to every unit after the
/// first. No-op for a single unit or zero overlap.
pub fn stitch(
    tokenizer: &dyn Tokenizer,
    mut units: Vec<String>,
    overlap: usize,
) -> Result<Vec<String>, TokenizerError> {
    if overlap == 0 || units.len() <= 1 {
        return Ok(units);
    }

    // Prefixes come from the original unit texts, so compute them all
    // before mutating anything.
    let mut prefixes = Vec::with_capacity(units.len() - 1);
    for previous in &units[..units.len() - 1] {
        let ids = tokenizer.encode(previous)?;
        let tail_start = ids.len().saturating_sub(overlap);
        prefixes.push(tokenizer.decode(&ids[tail_start..])?);
    }

    for (unit, prefix) in units.iter_mut().skip(1).zip(prefixes) {
        unit.insert_str(0, &prefix);
    }
    Ok(units)
}
