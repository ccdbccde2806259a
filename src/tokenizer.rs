// src/tokenizer.rs
//! The tokenizer capability consumed by both chunkers.
//!
//! Chunkers never tokenize text themselves; they go through a [`Tokenizer`]
//! resolved by the `encoding_model` string in the chunking configuration.
//! Two backends ship with the crate:
//!
//! - [`TiktokenTokenizer`]: BPE encodings with embedded vocabularies
//!   (`cl100k_base`, `o200k_base`, ...), resolvable by encoding name or by
//!   OpenAI model name. Deterministic and fully offline.
//! - [`HfTokenizer`]: adapter over the `tokenizers` crate for callers that
//!   carry a HuggingFace `tokenizer.json`.
//!
//! Custom capabilities register with the process-wide [`TokenizerRegistry`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Errors raised by tokenizer backends and the registry.
///
/// These are the tokenizer collaborator's error surface; the chunkers
/// propagate them unchanged.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The registry has no tokenizer for the requested model key.
    #[error("no tokenizer registered for model `{0}`")]
    UnknownModel(String),

    /// A backend failure (decode of invalid sequences, file load, ...).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// An injected tokenization capability.
///
/// Implementations must be deterministic and round-trip-stable for
/// re-encoded decoded text under ordinary content.
pub trait Tokenizer: Send + Sync {
    /// Encode text into an ordered sequence of token ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Decode an ordered sequence of token ids back into text.
    fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError>;

    /// Count the tokens `text` encodes to.
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode(text)?.len())
    }
}

/// Tiktoken BPE tokenizer, the default backend for the registry.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    /// Build a tokenizer for an encoding name or an OpenAI model name.
    ///
    /// Encoding names (`cl100k_base` etc.) are matched directly; anything
    /// else is treated as a model name and mapped to its encoding.
    pub fn for_model(name: &str) -> Result<Self, TokenizerError> {
        let bpe = match name {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
            model => tiktoken_rs::get_bpe_from_model(model),
        }
        .map_err(|_| TokenizerError::UnknownModel(name.to_string()))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        // Special-token markers inside documents are plain text, not controls.
        Ok(self.bpe.encode_ordinary(text))
    }

    fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        Ok(self.bpe.decode(ids.to_vec())?)
    }
}

/// Adapter over a HuggingFace `tokenizers::Tokenizer`.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenizerError> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(backend_err)?;
        Ok(Self { inner })
    }

    /// Wrap an already-configured tokenizer.
    pub fn new(inner: tokenizers::Tokenizer) -> Self {
        Self { inner }
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let encoding = self.inner.encode(text, false).map_err(backend_err)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        self.inner.decode(ids, true).map_err(backend_err)
    }
}

fn backend_err(e: tokenizers::Error) -> TokenizerError {
    TokenizerError::Backend(anyhow::anyhow!(e))
}

/// Process-wide map from `encoding_model` strings to tokenizer capabilities.
///
/// Resolution checks explicit registrations first, then falls back to
/// building a [`TiktokenTokenizer`] for the key and caching it. Built
/// tokenizers are shared across all concurrent callers; the map is only
/// written on registration or first resolution of a key.
pub struct TokenizerRegistry {
    entries: RwLock<HashMap<String, Arc<dyn Tokenizer>>>,
}

static GLOBAL: Lazy<TokenizerRegistry> = Lazy::new(TokenizerRegistry::new);

impl TokenizerRegistry {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry used by the chunking entry points.
    pub fn global() -> &'static TokenizerRegistry {
        &GLOBAL
    }

    /// Register a tokenizer under a model key, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, tokenizer: Arc<dyn Tokenizer>) {
        self.entries.write().unwrap().insert(name.into(), tokenizer);
    }

    /// Resolve a model key to a tokenizer.
    ///
    /// Unknown keys that tiktoken cannot map either are rejected with
    /// [`TokenizerError::UnknownModel`].
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tokenizer>, TokenizerError> {
        if let Some(tokenizer) = self.entries.read().unwrap().get(name) {
            return Ok(Arc::clone(tokenizer));
        }

        let built: Arc<dyn Tokenizer> = Arc::new(TiktokenTokenizer::for_model(name)?);
        let mut entries = self.entries.write().unwrap();
        // Another caller may have raced us here; keep whichever landed first.
        let entry = entries
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&built));
        Ok(Arc::clone(entry))
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::{Tokenizer, TokenizerError};

    /// One token per char, id = code point. Deterministic, round-trip
    /// stable, and makes token arithmetic in tests exact.
    pub struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
            Ok(text.chars().map(|c| c as u32).collect())
        }

        fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
            ids.iter()
                .map(|&id| {
                    char::from_u32(id)
                        .ok_or_else(|| TokenizerError::Backend(anyhow::anyhow!("bad id {id}")))
                })
                .collect()
        }
    }
}
