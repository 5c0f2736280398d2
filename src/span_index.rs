//! Per-sentence multimap of active spans.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AnnotationError, SentenceId, Span};

/// Spans currently active for each sentence.
///
/// Cloning an index is the snapshot operation: every pipeline stage takes
/// an index by reference and returns a new one, so a clone taken before an
/// edit stays valid for undo and comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SpanIndexRepr")]
pub struct SpanIndex {
    sentences: BTreeMap<SentenceId, Vec<Span>>,
}

#[derive(Deserialize)]
struct SpanIndexRepr {
    sentences: BTreeMap<SentenceId, Vec<Span>>,
}

impl TryFrom<SpanIndexRepr> for SpanIndex {
    type Error = AnnotationError;

    fn try_from(repr: SpanIndexRepr) -> Result<Self, Self::Error> {
        let mut index = SpanIndex::new();
        for (id, spans) in repr.sentences {
            if let Some(misfiled) = spans.iter().find(|s| s.sentence_id() != id) {
                return Err(AnnotationError::InvalidSpan {
                    sentence_id: misfiled.sentence_id(),
                    start: misfiled.start(),
                    end: misfiled.end(),
                    reason: format!("stored under sentence {}", id),
                });
            }
            index.replace_sentence(id, spans);
        }
        Ok(index)
    }
}

impl SpanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from spans, grouped by their sentence.
    pub fn from_spans(spans: impl IntoIterator<Item = Span>) -> Self {
        let mut index = Self::new();
        for span in spans {
            index.add(span);
        }
        index
    }

    /// Append a span to its sentence's list.
    pub fn add(&mut self, span: Span) -> &mut Self {
        self.sentences
            .entry(span.sentence_id())
            .or_default()
            .push(span);
        self
    }

    /// Replace everything stored for the span's sentence with this one span.
    pub fn set(&mut self, span: Span) -> &mut Self {
        self.sentences.insert(span.sentence_id(), vec![span]);
        self
    }

    /// Replace everything stored for `id`. An empty list removes the key.
    pub fn replace_sentence(&mut self, id: SentenceId, spans: Vec<Span>) -> &mut Self {
        if spans.is_empty() {
            self.sentences.remove(&id);
        } else {
            self.sentences.insert(id, spans);
        }
        self
    }

    /// Spans of one sentence; empty if the sentence has none.
    pub fn get(&self, id: SentenceId) -> &[Span] {
        self.sentences.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, id: SentenceId) -> bool {
        !self.get(id).is_empty()
    }

    /// True if any span of the sentence satisfies `pred`.
    pub fn contains(&self, id: SentenceId, pred: impl Fn(&Span) -> bool) -> bool {
        self.get(id).iter().any(pred)
    }

    /// Remove every span of the sentence matching `pred`, returning them.
    pub fn remove_all(&mut self, id: SentenceId, pred: impl Fn(&Span) -> bool) -> Vec<Span> {
        let Some(spans) = self.sentences.get_mut(&id) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<Span>, Vec<Span>) = spans.drain(..).partition(|s| pred(s));
        *spans = kept;
        if spans.is_empty() {
            self.sentences.remove(&id);
        }
        removed
    }

    /// Remove every span equal to `span`, returning the removed copies.
    pub fn remove(&mut self, span: &Span) -> Vec<Span> {
        self.remove_all(span.sentence_id(), |s| s == span)
    }

    /// Remove matching spans across all sentences.
    pub fn retain(&mut self, pred: impl Fn(&Span) -> bool) -> &mut Self {
        for spans in self.sentences.values_mut() {
            spans.retain(|s| pred(s));
        }
        self.sentences.retain(|_, spans| !spans.is_empty());
        self
    }

    /// Sentences with at least one span, in id order.
    pub fn entries(&self) -> impl Iterator<Item = (SentenceId, &[Span])> + '_ {
        self.sentences
            .iter()
            .filter(|(_, spans)| !spans.is_empty())
            .map(|(id, spans)| (*id, spans.as_slice()))
    }

    pub fn sentence_ids(&self) -> impl Iterator<Item = SentenceId> + '_ {
        self.entries().map(|(id, _)| id)
    }

    /// All spans, grouped by sentence in id order.
    pub fn spans(&self) -> impl Iterator<Item = &Span> + '_ {
        self.sentences.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Number of sentences carrying spans.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Total number of spans across all sentences.
    pub fn span_count(&self) -> usize {
        self.sentences.values().map(Vec::len).sum()
    }

    /// Spans of one sentence ordered by `(start, end, label)`.
    pub fn sorted(&self, id: SentenceId) -> Vec<Span> {
        let mut spans = self.get(id).to_vec();
        spans.sort_by_key(|s| (s.start(), s.end(), s.label()));
        spans
    }

    /// Serialize to the RON snapshot format.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Parse a RON snapshot. Span ranges and sentence keys are re-checked on the way in.
    pub fn from_ron_str(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

impl FromIterator<Span> for SpanIndex {
    fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
        Self::from_spans(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;

    fn span(sentence: u32, start: usize, end: usize, label: Label) -> Span {
        Span::new(SentenceId(sentence), start, end, label).unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let mut index = SpanIndex::new();
        index
            .add(span(1, 0, 5, Label::Accept))
            .add(span(1, 6, 9, Label::Reject))
            .add(span(2, 0, 3, Label::Accept));

        assert_eq!(index.get(SentenceId(1)).len(), 2);
        assert_eq!(index.get(SentenceId(2)).len(), 1);
        assert!(index.get(SentenceId(3)).is_empty());
        assert_eq!(index.len(), 2);
        assert_eq!(index.span_count(), 3);
    }

    #[test]
    fn test_set_replaces_sentence() {
        let mut index = SpanIndex::new();
        index.add(span(1, 0, 5, Label::Accept)).add(span(1, 6, 9, Label::Reject));
        index.set(span(1, 2, 4, Label::Reject));
        assert_eq!(index.get(SentenceId(1)), &[span(1, 2, 4, Label::Reject)]);
    }

    #[test]
    fn test_remove_all_with_predicate() {
        let mut index = SpanIndex::new();
        index
            .add(span(1, 0, 5, Label::Concept))
            .add(span(1, 6, 9, Label::Reject))
            .add(span(1, 10, 12, Label::Concept));

        let removed = index.remove_all(SentenceId(1), |s| s.label() == Label::Concept);
        assert_eq!(removed.len(), 2);
        assert_eq!(index.get(SentenceId(1)), &[span(1, 6, 9, Label::Reject)]);

        // Removing the last span drops the sentence.
        index.remove(&span(1, 6, 9, Label::Reject));
        assert!(!index.has(SentenceId(1)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_clone_is_independent_snapshot() {
        let mut index = SpanIndex::new();
        index.add(span(1, 0, 5, Label::Accept));
        let snapshot = index.clone();

        index.add(span(1, 6, 8, Label::Reject));
        assert_eq!(snapshot.span_count(), 1);
        assert_eq!(index.span_count(), 2);
    }

    #[test]
    fn test_contains() {
        let index = SpanIndex::from_spans(vec![span(4, 0, 5, Label::Reject)]);
        assert!(index.contains(SentenceId(4), |s| s.label() == Label::Reject));
        assert!(!index.contains(SentenceId(4), |s| s.label() == Label::Accept));
        assert!(!index.contains(SentenceId(5), |_| true));
    }

    #[test]
    fn test_ron_round_trip_rejects_invalid_spans() {
        let index = SpanIndex::from_spans(vec![
            span(1, 0, 5, Label::Accept),
            span(2, 3, 9, Label::Concept).with_tag("award"),
        ]);
        let ron = index.to_ron_string().unwrap();
        assert_eq!(SpanIndex::from_ron_str(&ron).unwrap(), index);

        let broken = ron.replacen("end: 5", "end: 0", 1);
        assert!(SpanIndex::from_ron_str(&broken).is_err());
    }

    #[test]
    fn test_ron_rejects_span_filed_under_other_sentence() {
        let misfiled =
            "(sentences: {1: [(sentence_id: 2, start: 0, end: 10, label: accept)]})";
        let err = SpanIndex::from_ron_str(misfiled).unwrap_err();
        assert!(err.to_string().contains("stored under sentence 1"));
    }

    #[test]
    fn test_ron_drops_empty_sentence_lists() {
        let ron = "(sentences: {1: [], 3: [(sentence_id: 3, start: 1, end: 4, label: reject)]})";
        let index = SpanIndex::from_ron_str(ron).unwrap();
        assert_eq!(index, SpanIndex::from_spans(vec![span(3, 1, 4, Label::Reject)]));
        assert_eq!(index.sentence_ids().collect::<Vec<_>>(), vec![SentenceId(3)]);
    }
}
