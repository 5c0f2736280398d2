//! Sentence content blocks and concept alignment.
//!
//! Concepts are key phrases the recommendation service associates with a
//! sentence. Each one is located in the sentence text by a case-insensitive
//! search for its surface form; only the first occurrence counts.

use serde::{Deserialize, Serialize};

use crate::merge::remainders;
use crate::{AnnotationWarning, FeedbackValue, Label, Reported, SentenceId, Span, SpanIndex};

/// A concept attached to a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Concept {
    /// Identifier used in interactions (e.g. a stemmed form).
    pub id: String,
    /// The text searched for inside the sentence.
    pub surface: String,
}

impl Concept {
    pub fn new(id: impl Into<String>, surface: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            surface: surface.into(),
        }
    }

    /// A concept whose identifier is also its surface form.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: text.clone(),
            surface: text,
        }
    }
}

/// One rendered sentence: its id, flattened text and concept list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceBlock {
    pub sentence_id: SentenceId,
    pub text: String,
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

impl SentenceBlock {
    pub fn new(sentence_id: impl Into<SentenceId>, text: impl Into<String>) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            text: text.into(),
            concepts: Vec::new(),
        }
    }

    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.concepts.push(concept);
        self
    }

    /// Length of the text in characters, the unit of span offsets.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.id == id)
    }

    pub fn has_concept(&self, id: &str) -> bool {
        self.concept(id).is_some()
    }

    /// Text covered by `[start, end)` in character offsets.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Character range of the first case-insensitive occurrence of `surface` in `text`.
pub fn locate_concept(text: &str, surface: &str) -> Option<(usize, usize)> {
    let haystack: Vec<char> = text.chars().collect();
    let needle: Vec<char> = surface.chars().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len())
        .find(|&i| {
            haystack[i..i + needle.len()]
                .iter()
                .zip(&needle)
                .all(|(a, b)| eq_ignore_case(*a, *b))
        })
        .map(|i| (i, i + needle.len()))
}

/// Concept spans of one sentence, in the order of its concept list.
///
/// Concepts that do not occur in the text are skipped.
pub fn concept_spans(block: &SentenceBlock) -> Vec<Span> {
    block
        .concepts
        .iter()
        .filter_map(|concept| {
            let (start, end) = locate_concept(&block.text, &concept.surface)?;
            Span::new(block.sentence_id, start, end, Label::Concept)
                .ok()
                .map(|span| span.with_tag(concept.id.clone()))
        })
        .collect()
}

/// Index holding the concept spans of every block.
pub fn seed_concept_spans(blocks: &[SentenceBlock]) -> SpanIndex {
    blocks.iter().flat_map(concept_spans).collect()
}

/// Relabel the parts of `old`-valued spans that overlap a concept.
///
/// See [`reclassify_concept_reported`] for the rules.
pub fn reclassify_concept(
    index: &SpanIndex,
    blocks: &[SentenceBlock],
    concept: &str,
    old: FeedbackValue,
    new: FeedbackValue,
) -> SpanIndex {
    reclassify_concept_reported(index, blocks, concept, old, new).into_value()
}

/// Relabel the parts of `old`-valued spans that overlap a concept, collecting warnings.
///
/// For every block listing `concept`, each span labeled `old` that
/// intersects the concept occurrence is split: the remainders outside the
/// occurrence keep `old`, the overlapping sub-range becomes `new` and is
/// tagged with the concept id. A `new` value of `recommendation` clears the
/// overlapping sub-range instead. Spans with another label are untouched.
pub fn reclassify_concept_reported(
    index: &SpanIndex,
    blocks: &[SentenceBlock],
    concept: &str,
    old: FeedbackValue,
    new: FeedbackValue,
) -> Reported<SpanIndex> {
    let mut result = Reported::ok(index.clone());
    if old == new {
        return result;
    }

    let old_label = Label::from(old);
    let new_label = Label::from(new);

    for block in blocks {
        let Some(entry) = block.concept(concept) else {
            continue;
        };
        let id = block.sentence_id;
        if !index.contains(id, |s| s.label() == old_label) {
            continue;
        }

        let occurrence = locate_concept(&block.text, &entry.surface)
            .and_then(|(start, end)| Span::new(id, start, end, Label::Concept).ok());
        let Some(occurrence) = occurrence else {
            result.add_warning(AnnotationWarning::AmbiguousConceptOccurrence {
                sentence_id: id,
                concept: concept.to_string(),
            });
            continue;
        };

        let mut updated = Vec::with_capacity(index.get(id).len() + 2);
        for span in index.get(id) {
            if span.label() != old_label || !span.intersects(&occurrence) {
                updated.push(span.clone());
                continue;
            }
            updated.extend(remainders(span, &occurrence));
            if !new_label.is_neutral() {
                let start = span.start().max(occurrence.start());
                let end = span.end().min(occurrence.end());
                updated.extend(
                    span.fragment(start, end, new_label)
                        .map(|converted| converted.with_tag(concept)),
                );
            }
        }

        tracing::debug!(
            "reclassified '{}' in sentence {}: {} -> {}",
            concept,
            id,
            old,
            new
        );
        result.value.replace_sentence(id, updated);
    }

    result
}
