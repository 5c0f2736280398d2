//! Conversion of a user text selection into candidate spans.

use serde::{Deserialize, Serialize};

use crate::{AnnotationError, Label, SentenceBlock, SentenceId, Span};

/// The part of a selection falling inside one sentence, in character
/// offsets relative to that sentence's text.
///
/// A selection is the ordered list of these triples for every rendered
/// sentence the highlight intersects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub sentence_id: SentenceId,
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(sentence_id: impl Into<SentenceId>, start: usize, end: usize) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            start,
            end,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Turn a selection into one span per intersected sentence.
///
/// `blocks` are the sentences in render order. When the selection also
/// reaches into the previous rendered sentence, the span starts at the
/// beginning of the block; when it reaches into the next one, the span runs
/// to the end of the block. Collapsed ranges produce nothing, as do ranges
/// for sentences that are not rendered.
///
/// Offsets past the end of a sentence, or a start after the end, are
/// rejected rather than clamped. So is the `concept` label.
pub fn resolve_selection(
    selection: &[SelectionRange],
    blocks: &[SentenceBlock],
    label: Label,
) -> Result<Vec<Span>, AnnotationError> {
    if label == Label::Concept {
        return Err(AnnotationError::UnselectableLabel { label });
    }

    let touched = |idx: usize| {
        blocks
            .get(idx)
            .map_or(false, |b| selection.iter().any(|r| r.sentence_id == b.sentence_id))
    };

    let mut spans = Vec::new();
    for (idx, block) in blocks.iter().enumerate() {
        for range in selection.iter().filter(|r| r.sentence_id == block.sentence_id) {
            let text_len = block.char_len();
            if range.start > range.end || range.end > text_len {
                return Err(AnnotationError::InvalidSpan {
                    sentence_id: range.sentence_id,
                    start: range.start,
                    end: range.end,
                    reason: format!(
                        "selection does not fit a sentence of {} characters",
                        text_len
                    ),
                });
            }

            let start = if idx > 0 && touched(idx - 1) {
                0
            } else {
                range.start
            };
            let end = if touched(idx + 1) { text_len } else { range.end };
            if start >= end {
                continue;
            }

            spans.push(Span::new(block.sentence_id, start, end, label)?);
        }
    }

    Ok(spans)
}
