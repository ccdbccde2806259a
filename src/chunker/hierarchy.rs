// src/chunker/hierarchy.rs
//! The separator hierarchy driving the structure-aware chunker.
//!
//! Five descending-priority tiers of literal separator strings, plus a
//! terminal character tier where every grapheme is its own separator. Each
//! literal tier is a process-wide table built once: separators are grouped
//! by first character, and within a group sorted longest-first so the
//! longest match at a position wins (`"!!!\n\n"` before `"!\n\n"`).

use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

/// Explicit block breaks: blank lines, sentence enders combined with a blank
/// line, ATX headings, horizontal rules.
const BLOCK_BREAK_SEPARATORS: &[&str] = &[
    "\n\n",
    ".\n\n",
    "..\n\n",
    "...\n\n",
    "…\n\n",
    "!\n\n",
    "!!\n\n",
    "!!!\n\n",
    "?\n\n",
    "??\n\n",
    "???\n\n",
    "?!\n\n",
    "!?\n\n",
    "‽\n\n",
    "。\n\n",
    "！\n\n",
    "？\n\n",
    "\n# ",
    "\n## ",
    "\n### ",
    "\n#### ",
    "\n##### ",
    "\n###### ",
    "\n---",
    "\n***",
    "\n___",
];

/// Potential block markers: blockquotes, fenced code, ordered-list items.
const BLOCK_MARKER_SEPARATORS: &[&str] = &[
    "\n> ",
    "\n```",
    "\n0. ",
    "\n1. ",
    "\n2. ",
    "\n3. ",
    "\n4. ",
    "\n5. ",
    "\n6. ",
    "\n7. ",
    "\n8. ",
    "\n9. ",
];

/// Weak tier 1: images, links, table pipes, definition lists.
const INLINE_MARKER_SEPARATORS: &[&str] = &["\n![", "\n[", "\n|", "\n: "];

/// Weak tier 2: sentence-ending punctuation, singly or combined, including
/// interrobang and ellipsis variants, with and without trailing whitespace.
const SENTENCE_SEPARATORS: &[&str] = &[
    ". ", ".", ".. ", "..", "... ", "...", "… ", "…", "! ", "!", "!! ", "!!", "!!! ", "!!!",
    "? ", "?", "?? ", "??", "??? ", "???", "?! ", "?!", "!? ", "!?", "‽ ", "‽", "⁇ ", "⁇",
    "⁈ ", "⁈", "⁉ ", "⁉", "。", "！", "？",
];

/// Weak tier 3: clause punctuation.
const CLAUSE_SEPARATORS: &[&str] = &[
    "; ", ";", ": ", ":", ", ", ",", "(", ")", "[", "]", "{", "}", "\n", "；", "，", "、", "：",
    "（", "）",
];

/// One priority level in the separator hierarchy, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorTier {
    /// Explicit block breaks (paragraph ends, headings, horizontal rules).
    BlockBreak,
    /// Potential block markers (blockquotes, lists, fenced code).
    BlockMarker,
    /// Inline structure (images, links, tables, definition lists).
    InlineMarker,
    /// Sentence-ending punctuation.
    Sentence,
    /// Clause punctuation.
    Clause,
    /// Terminal fallback: every grapheme is a one-grapheme separator.
    Character,
}

impl SeparatorTier {
    /// The strongest tier; recursive splitting starts here.
    pub fn strongest() -> Self {
        SeparatorTier::BlockBreak
    }

    /// The next weaker tier, or `None` past the character tier.
    pub fn weaker(self) -> Option<Self> {
        match self {
            SeparatorTier::BlockBreak => Some(SeparatorTier::BlockMarker),
            SeparatorTier::BlockMarker => Some(SeparatorTier::InlineMarker),
            SeparatorTier::InlineMarker => Some(SeparatorTier::Sentence),
            SeparatorTier::Sentence => Some(SeparatorTier::Clause),
            SeparatorTier::Clause => Some(SeparatorTier::Character),
            SeparatorTier::Character => None,
        }
    }

    fn table(self) -> Option<&'static TierTable> {
        match self {
            SeparatorTier::BlockBreak => Some(&BLOCK_BREAK),
            SeparatorTier::BlockMarker => Some(&BLOCK_MARKER),
            SeparatorTier::InlineMarker => Some(&INLINE_MARKER),
            SeparatorTier::Sentence => Some(&SENTENCE),
            SeparatorTier::Clause => Some(&CLAUSE),
            SeparatorTier::Character => None,
        }
    }
}

/// A half-open byte span over a text buffer, flagged as content or separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRange {
    pub range: Range<usize>,
    pub is_separator: bool,
}

/// Separator lookup table: candidates bucketed by first character,
/// longest-first within a bucket.
struct TierTable {
    groups: HashMap<char, Vec<&'static str>>,
}

static BLOCK_BREAK: Lazy<TierTable> = Lazy::new(|| TierTable::new(BLOCK_BREAK_SEPARATORS));
static BLOCK_MARKER: Lazy<TierTable> = Lazy::new(|| TierTable::new(BLOCK_MARKER_SEPARATORS));
static INLINE_MARKER: Lazy<TierTable> = Lazy::new(|| TierTable::new(INLINE_MARKER_SEPARATORS));
static SENTENCE: Lazy<TierTable> = Lazy::new(|| TierTable::new(SENTENCE_SEPARATORS));
static CLAUSE: Lazy<TierTable> = Lazy::new(|| TierTable::new(CLAUSE_SEPARATORS));

impl TierTable {
    fn new(separators: &[&'static str]) -> Self {
        let mut groups: HashMap<char, Vec<&'static str>> = HashMap::new();
        for sep in separators {
            let first = sep.chars().next().expect("separators are non-empty");
            groups.entry(first).or_default().push(sep);
        }
        for candidates in groups.values_mut() {
            candidates.sort_by_key(|sep| std::cmp::Reverse(sep.len()));
        }
        Self { groups }
    }

    /// Byte length of the longest separator matching at the start of `rest`,
    /// given that `rest` starts with `first`.
    fn longest_match(&self, rest: &str, first: char) -> Option<usize> {
        let candidates = self.groups.get(&first)?;
        candidates
            .iter()
            .find(|sep| rest.starts_with(**sep))
            .map(|sep| sep.len())
    }
}

/// Split `text` into alternating content/separator fragments for one tier.
///
/// The scan skips to the next character that opens some separator in the
/// tier, then tests that character's candidates longest-first. A character
/// that opens no full candidate is stepped over one character at a time,
/// which avoids infinite loops on false-positive first characters.
///
/// Fragments cover `text` exactly; content fragments are never empty. For
/// the character tier every grapheme comes back as a separator fragment, so
/// any input can be split.
pub fn split_fragments(text: &str, tier: SeparatorTier) -> Vec<FragmentRange> {
    let table = match tier.table() {
        Some(table) => table,
        None => return split_graphemes(text),
    };

    let mut fragments = Vec::new();
    let mut frag_start = 0;
    let mut pos = 0;
    while pos < text.len() {
        let c = match text[pos..].chars().next() {
            Some(c) => c,
            None => break,
        };
        match table.longest_match(&text[pos..], c) {
            Some(len) => {
                if pos > frag_start {
                    fragments.push(FragmentRange {
                        range: frag_start..pos,
                        is_separator: false,
                    });
                }
                fragments.push(FragmentRange {
                    range: pos..pos + len,
                    is_separator: true,
                });
                pos += len;
                frag_start = pos;
            }
            None => pos += c.len_utf8(),
        }
    }
    if frag_start < text.len() {
        fragments.push(FragmentRange {
            range: frag_start..text.len(),
            is_separator: false,
        });
    }
    fragments
}

fn split_graphemes(text: &str) -> Vec<FragmentRange> {
    text.grapheme_indices(true)
        .map(|(offset, grapheme)| FragmentRange {
            range: offset..offset + grapheme.len(),
            is_separator: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment_texts<'a>(text: &'a str, fragments: &[FragmentRange]) -> Vec<&'a str> {
        fragments.iter().map(|f| &text[f.range.clone()]).collect()
    }

    #[test]
    fn test_longest_match_wins() {
        let text = "hello.\n\nworld";
        let fragments = split_fragments(text, SeparatorTier::BlockBreak);
        assert_eq!(fragment_texts(text, &fragments), vec!["hello", ".\n\n", "world"]);
        assert!(!fragments[0].is_separator);
        assert!(fragments[1].is_separator);
        assert!(!fragments[2].is_separator);
    }

    #[test]
    fn test_repeated_punctuation_beats_single() {
        let text = "wow!!!\n\nnext";
        let fragments = split_fragments(text, SeparatorTier::BlockBreak);
        assert_eq!(fragment_texts(text, &fragments), vec!["wow", "!!!\n\n", "next"]);
    }

    #[test]
    fn test_false_positive_first_char_advances() {
        // '!' opens several block-break separators, but "a!b" completes none.
        let text = "a!b";
        let fragments = split_fragments(text, SeparatorTier::BlockBreak);
        assert_eq!(fragment_texts(text, &fragments), vec!["a!b"]);
        assert!(!fragments[0].is_separator);
    }

    #[test]
    fn test_heading_marker_is_block_break() {
        let text = "intro\n## Section\nbody";
        let fragments = split_fragments(text, SeparatorTier::BlockBreak);
        assert_eq!(
            fragment_texts(text, &fragments),
            vec!["intro", "\n## ", "Section\nbody"]
        );
    }

    #[test]
    fn test_adjacent_separators_produce_no_empty_content() {
        let text = "a.\n\n\n\nb";
        let fragments = split_fragments(text, SeparatorTier::BlockBreak);
        assert_eq!(fragment_texts(text, &fragments), vec!["a", ".\n\n", "\n\n", "b"]);
        for fragment in &fragments {
            assert!(!fragment.range.is_empty());
        }
    }

    #[test]
    fn test_sentence_tier_prefers_trailing_space_variant() {
        let text = "one. two";
        let fragments = split_fragments(text, SeparatorTier::Sentence);
        assert_eq!(fragment_texts(text, &fragments), vec!["one", ". ", "two"]);
    }

    #[test]
    fn test_character_tier_covers_every_grapheme() {
        let text = "a✔️b";
        let fragments = split_fragments(text, SeparatorTier::Character);
        assert!(fragments.iter().all(|f| f.is_separator));
        let total: usize = fragments.iter().map(|f| f.range.len()).sum();
        assert_eq!(total, text.len());
    }

    #[test]
    fn test_tier_ordering_terminates_at_character() {
        let mut tier = SeparatorTier::strongest();
        let mut depth = 0;
        while let Some(weaker) = tier.weaker() {
            tier = weaker;
            depth += 1;
        }
        assert_eq!(tier, SeparatorTier::Character);
        assert_eq!(depth, 5);
    }

    #[test]
    fn test_fragments_cover_input_exactly() {
        let text = "First sentence. Second!\n\n- item\n- item\n\n![img](url)\n\nEnd.";
        for tier in [
            SeparatorTier::BlockBreak,
            SeparatorTier::BlockMarker,
            SeparatorTier::InlineMarker,
            SeparatorTier::Sentence,
            SeparatorTier::Clause,
            SeparatorTier::Character,
        ] {
            let fragments = split_fragments(text, tier);
            let mut pos = 0;
            for fragment in &fragments {
                assert_eq!(fragment.range.start, pos, "gap under {tier:?}");
                pos = fragment.range.end;
            }
            assert_eq!(pos, text.len(), "tail missing under {tier:?}");
        }
    }
}
