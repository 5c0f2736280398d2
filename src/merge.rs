//! Integration of newly proposed spans into an existing index.

use crate::{AnnotationWarning, Reported, SentenceId, Span, SpanIndex};

/// Merge `new_spans` into `index`; new spans take priority over old ones.
///
/// See [`merge_annotations_reported`] for the rules.
pub fn merge_annotations(index: &SpanIndex, new_spans: &[Span]) -> SpanIndex {
    merge_annotations_reported(index, new_spans).into_value()
}

/// Merge `new_spans` into `index`, collecting warnings.
///
/// Each sentence touched by a new span is processed independently. The new
/// spans of a sentence are applied one at a time, in input order, against
/// the sentence's current spans:
///
/// 1. an old span fully covered by the new span is dropped,
/// 2. an old span partially overlapping it is replaced by its remainder(s)
///    outside the new span, keeping the old label,
/// 3. any other old span is kept,
///
/// after which the new span is inserted, unless its label is neutral
/// (the eraser), in which case it only cuts. A new span identical in extent
/// and label to an existing one leaves the sentence as it is.
///
/// Sentences without new spans are copied unchanged. Touching same-label
/// spans are not joined here; that is [`compress`](crate::compress)'s job.
pub fn merge_annotations_reported(index: &SpanIndex, new_spans: &[Span]) -> Reported<SpanIndex> {
    let mut result = Reported::ok(index.clone());

    let mut affected: Vec<SentenceId> = Vec::new();
    for span in new_spans {
        if !affected.contains(&span.sentence_id()) {
            affected.push(span.sentence_id());
        }
    }

    for id in affected {
        let incoming: Vec<&Span> = new_spans.iter().filter(|s| s.sentence_id() == id).collect();
        if incoming.len() > 1 {
            result.add_warning(AnnotationWarning::MultipleNewSpansPerSentence {
                sentence_id: id,
                count: incoming.len(),
            });
        }

        let before = index.get(id).len();
        let mut current = index.get(id).to_vec();
        for new in incoming {
            current = apply_span(current, new);
        }
        tracing::debug!(
            "merged sentence {}: {} -> {} spans",
            id,
            before,
            current.len()
        );
        result.value.replace_sentence(id, current);
    }

    result
}

fn apply_span(current: Vec<Span>, new: &Span) -> Vec<Span> {
    if current
        .iter()
        .any(|old| old.same_extent(new) && old.label() == new.label())
    {
        return current;
    }

    let mut result = Vec::with_capacity(current.len() + 2);
    for old in current {
        if new.covers(&old) {
            continue;
        }
        if new.intersects(&old) {
            result.extend(remainders(&old, new));
        } else {
            result.push(old);
        }
    }

    if !new.label().is_neutral() {
        result.push(new.clone());
    }
    result
}

/// The parts of `old` lying before and after `cut`, labeled like `old`.
///
/// Yields zero, one or two untagged fragments.
pub(crate) fn remainders(old: &Span, cut: &Span) -> impl Iterator<Item = Span> {
    let before = if old.start() < cut.start() {
        old.fragment(old.start(), cut.start(), old.label())
    } else {
        None
    };
    let after = if old.end() > cut.end() {
        old.fragment(cut.end(), old.end(), old.label())
    } else {
        None
    };
    before.into_iter().chain(after)
}
