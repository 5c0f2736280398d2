//! Interactions: the per-concept feedback submitted to the recommendation service.

use serde::{Deserialize, Serialize};

use crate::concept::concept_spans;
use crate::{FeedbackValue, SentenceBlock, SpanIndex};

/// Feedback on one concept in one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub concept: String,
    pub value: FeedbackValue,
    pub iteration: u32,
}

impl Interaction {
    pub fn new(concept: impl Into<String>, value: FeedbackValue, iteration: u32) -> Self {
        Self {
            concept: concept.into(),
            value,
            iteration,
        }
    }
}

/// Interactions keyed by concept, in first-insertion order.
///
/// Replacing an existing concept keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionMap {
    items: Vec<Interaction>,
}

impl InteractionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, interaction: Interaction) {
        match self
            .items
            .iter_mut()
            .find(|i| i.concept == interaction.concept)
        {
            Some(existing) => *existing = interaction,
            None => self.items.push(interaction),
        }
    }

    pub fn remove(&mut self, concept: &str) -> Option<Interaction> {
        let pos = self.items.iter().position(|i| i.concept == concept)?;
        Some(self.items.remove(pos))
    }

    pub fn get(&self, concept: &str) -> Option<&Interaction> {
        self.items.iter().find(|i| i.concept == concept)
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.get(concept).is_some()
    }

    /// Apply feedback from the recommendation list.
    ///
    /// A `recommendation` value withdraws the concept's feedback; any other
    /// value records it.
    pub fn apply_feedback(&mut self, items: impl IntoIterator<Item = Interaction>) {
        for item in items {
            if item.value == FeedbackValue::Recommendation {
                self.remove(&item.concept);
            } else {
                self.insert(item);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Interaction> {
        self.items
    }
}

impl FromIterator<Interaction> for InteractionMap {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        let mut map = Self::new();
        for interaction in iter {
            map.insert(interaction);
        }
        map
    }
}

/// Derive interactions from the accept/reject spans of an index.
///
/// A concept receives the value of a span that fully covers its occurrence
/// in the sentence. Spans are visited sentence by sentence in block order,
/// and by start offset within a sentence; a later span covering the same
/// concept overrides an earlier one.
pub fn to_interactions(
    index: &SpanIndex,
    blocks: &[SentenceBlock],
    iteration: u32,
) -> Vec<Interaction> {
    let mut map = InteractionMap::new();

    for block in blocks {
        if !index.has(block.sentence_id) {
            continue;
        }
        let occurrences = concept_spans(block);

        for span in index.sorted(block.sentence_id) {
            let Some(value) = span.label().feedback() else {
                continue;
            };
            for occurrence in occurrences.iter().filter(|o| span.covers(o)) {
                if let Some(concept) = occurrence.tag() {
                    map.insert(Interaction::new(concept, value, iteration));
                }
            }
        }
    }

    map.into_vec()
}

/// Payload submitted to the recommendation service: `{"items": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackBatch {
    pub items: Vec<Interaction>,
}

/// A concept suggested by the recommendation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub concept: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub uncertainty: f64,
    #[serde(default = "default_recommendation_value")]
    pub value: FeedbackValue,
}

fn default_recommendation_value() -> FeedbackValue {
    FeedbackValue::Recommendation
}

/// Recommendations ordered by uncertainty (highest first), showing the
/// locally recorded value for concepts that already have feedback.
pub fn overlay_recommendations(
    recommendations: &[Recommendation],
    interactions: &InteractionMap,
) -> Vec<Recommendation> {
    let mut result: Vec<Recommendation> = recommendations
        .iter()
        .map(|rec| match interactions.get(&rec.concept) {
            Some(local) => Recommendation {
                value: local.value,
                ..rec.clone()
            },
            None => rec.clone(),
        })
        .collect();

    result.sort_by(|a, b| {
        b.uncertainty
            .partial_cmp(&a.uncertainty)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    result
}
