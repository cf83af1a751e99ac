#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for document chunking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Target character overlap between consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Split document text into overlapping chunks suitable for embedding.
///
/// Text no longer than `chunk_size` is returned as a single chunk. Longer
/// text is split by a sliding window that prefers to end chunks just past a
/// sentence-ending period or newline, as long as that boundary falls in the
/// second half of the window. Chunks are trimmed and empty chunks dropped;
/// empty input yields no chunks.
#[inline]
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let mut end = usize::min(start + chunk_size, chars.len());

        if end < chars.len() {
            // Snap to the nearest sentence boundary, unless it would leave
            // the chunk shorter than half the window.
            if let Some(boundary) = last_sentence_boundary(&chars, end) {
                if boundary > start + chunk_size / 2 {
                    end = boundary + 1;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }

        // The start+1 floor guarantees forward progress even when the
        // overlap is at least as large as the window.
        let next_start = usize::max(end.saturating_sub(overlap), start + 1);
        if next_start >= chars.len() {
            break;
        }
        start = next_start;
    }

    debug!(
        "Chunked {} characters into {} chunks (size {}, overlap {})",
        chars.len(),
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

/// Split text using the supplied configuration
#[inline]
pub fn chunk_with_config(text: &str, config: &ChunkingConfig) -> Vec<String> {
    chunk_text(text, config.chunk_size, config.overlap)
}

/// Position of the last period or newline at or before `from`
fn last_sentence_boundary(chars: &[char], from: usize) -> Option<usize> {
    let upper = usize::min(from, chars.len() - 1);
    chars[..=upper].iter().rposition(|&c| c == '.' || c == '\n')
}
