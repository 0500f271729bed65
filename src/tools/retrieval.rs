//! Chunking and lexical ranking for document question answering.
//!
//! Documents are split into overlapping character windows. Chunks are ranked
//! by how many distinct query terms they contain.

use std::collections::HashSet;

/// Splits `text` into windows of `size` characters, each starting
/// `size - overlap` characters after the previous one.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Returns up to `k` chunks most relevant to `query`, best first.
///
/// Chunks sharing no term with the query are dropped; when none match, the
/// first chunk is returned so the model still sees the start of the
/// document.
pub fn rank_chunks<'a>(chunks: &'a [String], query: &str, k: usize) -> Vec<&'a str> {
    let wanted = terms(query);
    let mut scored: Vec<(usize, usize)> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| (i, terms(chunk).intersection(&wanted).count()))
        .filter(|(_, score)| *score > 0)
        .collect();
    // Stable sort keeps document order among equal scores.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let picked: Vec<&str> = scored
        .into_iter()
        .take(k)
        .map(|(i, _)| chunks[i].as_str())
        .collect();
    if picked.is_empty() {
        chunks.first().map(|c| vec![c.as_str()]).unwrap_or_default()
    } else {
        picked
    }
}
