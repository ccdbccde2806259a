// src/pool.rs
//! Scoped scratch buffers for token streams.
//!
//! The token-window chunker flattens every slice's encoding into one token
//! stream; for large documents that buffer is worth reusing. [`acquire`]
//! hands out a guard that returns its buffer to a small process-wide pool on
//! drop, so release happens on every exit path, including `?` returns.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Buffers kept beyond this are dropped instead of pooled.
const MAX_POOLED: usize = 8;

static POOL: Lazy<Mutex<Vec<Vec<u32>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A pooled `Vec<u32>`, cleared and returned to the pool on drop.
pub struct TokenBuffer {
    buf: Option<Vec<u32>>,
}

/// Take a scratch buffer from the pool, or allocate a fresh one.
pub fn acquire() -> TokenBuffer {
    let buf = POOL
        .lock()
        .map(|mut pool| pool.pop())
        .unwrap_or(None)
        .unwrap_or_default();
    TokenBuffer { buf: Some(buf) }
}

impl Deref for TokenBuffer {
    type Target = Vec<u32>;

    fn deref(&self) -> &Vec<u32> {
        self.buf.as_ref().expect("buffer taken")
    }
}

impl DerefMut for TokenBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u32> {
        self.buf.as_mut().expect("buffer taken")
    }
}

impl Drop for TokenBuffer {
    fn drop(&mut self) {
        if let Some(mut buf) = self.buf.take() {
            buf.clear();
            if let Ok(mut pool) = POOL.lock() {
                if pool.len() < MAX_POOLED {
                    pool.push(buf);
                }
            }
        }
    }
}
