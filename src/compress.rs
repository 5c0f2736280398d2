//! Canonicalization of a span index after merging.

use crate::{Span, SpanIndex};

/// Join overlapping or touching same-label spans until none remain.
///
/// Every join replaces two spans with their hull, so the loop ends after at
/// most `n - 1` joins per sentence.
pub fn compress(index: &SpanIndex) -> SpanIndex {
    let mut result = index.clone();
    for (id, spans) in index.entries() {
        let compressed = compress_spans(spans.to_vec());
        if compressed.len() != spans.len() {
            tracing::debug!(
                "compressed sentence {}: {} -> {} spans",
                id,
                spans.len(),
                compressed.len()
            );
        }
        result.replace_sentence(id, compressed);
    }
    result
}

/// Compress the spans of a single sentence.
pub fn compress_spans(mut spans: Vec<Span>) -> Vec<Span> {
    while let Some((i, j)) = find_mergeable(&spans) {
        // j < i, so removing i first keeps j valid
        let a = spans.remove(i);
        let b = spans.remove(j);
        spans.push(a.hull(&b));
    }
    spans
}

fn find_mergeable(spans: &[Span]) -> Option<(usize, usize)> {
    for i in 0..spans.len() {
        for j in 0..i {
            let (a, b) = (&spans[i], &spans[j]);
            if a.label() == b.label() && (a.intersects(b) || a.touches(b)) {
                return Some((i, j));
            }
        }
    }
    None
}
