//! Annotation state for one summary under review.
//!
//! An [`AnnotationSession`] owns the span index and the interaction map and
//! runs the reconciliation pipeline on every edit:
//!
//! ```text
//! selection ─▶ resolve ─▶ merge ─▶ compress ─▶ to_interactions
//! ```
//!
//! Every step works on a fresh [`SpanIndex`], so a [`snapshot`] taken
//! before an edit can be restored afterwards.
//!
//! [`snapshot`]: AnnotationSession::snapshot

use crate::{
    compress, merge_annotations_reported, overlay_recommendations, reclassify_concept_reported,
    resolve_selection, to_interactions, AnnotationError, AnnotationWarning, FeedbackBatch,
    FeedbackValue, Interaction, InteractionMap, Label, Recommendation, SelectionRange,
    SentenceBlock, SessionConfig, SpanIndex,
};

/// Saved session state, see [`AnnotationSession::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub index: SpanIndex,
    pub interactions: InteractionMap,
}

#[derive(Debug, Clone)]
pub struct AnnotationSession {
    config: SessionConfig,
    index: SpanIndex,
    interactions: InteractionMap,
    iteration: u32,
}

impl AnnotationSession {
    pub fn new(config: SessionConfig, iteration: u32) -> Self {
        Self {
            config,
            index: SpanIndex::new(),
            interactions: InteractionMap::new(),
            iteration,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn index(&self) -> &SpanIndex {
        &self.index
    }

    pub fn interactions(&self) -> &InteractionMap {
        &self.interactions
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Drop all spans and interactions, e.g. when switching assignments.
    pub fn reset(&mut self, iteration: u32) {
        tracing::debug!("session reset for iteration {}", iteration);
        self.index = SpanIndex::new();
        self.interactions = InteractionMap::new();
        self.iteration = iteration;
    }

    /// Label a selection and reconcile it with the existing spans.
    ///
    /// The interaction map is rebuilt from the resulting index. On error the
    /// session is left untouched.
    pub fn apply_selection(
        &mut self,
        selection: &[SelectionRange],
        blocks: &[SentenceBlock],
        label: Label,
    ) -> Result<Vec<AnnotationWarning>, AnnotationError> {
        let new_spans = resolve_selection(selection, blocks, label)?;
        if new_spans.is_empty() {
            return Ok(Vec::new());
        }

        let merged = merge_annotations_reported(&self.index, &new_spans);
        self.index = if self.config.compress_after_merge {
            compress(&merged.value)
        } else {
            merged.value
        };
        self.refresh_interactions(blocks);

        Ok(merged.warnings)
    }

    /// Apply the label bound to `key`. Unbound keys do nothing.
    pub fn apply_key(
        &mut self,
        key: &str,
        selection: &[SelectionRange],
        blocks: &[SentenceBlock],
    ) -> Result<Vec<AnnotationWarning>, AnnotationError> {
        match self.config.key_bindings.label_for(key) {
            Some(label) => self.apply_selection(selection, blocks, label),
            None => {
                tracing::debug!("no label bound to key {}", key);
                Ok(Vec::new())
            }
        }
    }

    /// Change the feedback value of a concept that already has one.
    ///
    /// Spans carrying the current value are relabeled where they overlap the
    /// concept, concept-labeled spans are dropped, and the interaction map
    /// is rebuilt from the result. Concepts without an interaction are left
    /// alone.
    pub fn change_interaction(
        &mut self,
        concept: &str,
        value: FeedbackValue,
        blocks: &[SentenceBlock],
    ) -> Vec<AnnotationWarning> {
        let Some(current) = self.interactions.get(concept).map(|i| i.value) else {
            return Vec::new();
        };

        let reclassified =
            reclassify_concept_reported(&self.index, blocks, concept, current, value);
        let mut index = reclassified.value;
        index.retain(|s| s.label() != Label::Concept);
        self.index = if self.config.compress_after_merge {
            compress(&index)
        } else {
            index
        };
        self.refresh_interactions(blocks);

        reclassified.warnings
    }

    /// Apply feedback given on the recommendation list.
    pub fn record_feedback(&mut self, items: impl IntoIterator<Item = Interaction>) {
        self.interactions.apply_feedback(items);
    }

    /// The payload to submit for the current iteration.
    pub fn submission(&self) -> FeedbackBatch {
        FeedbackBatch {
            items: self.interactions.iter().cloned().collect(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            index: self.index.clone(),
            interactions: self.interactions.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.index = snapshot.index;
        self.interactions = snapshot.interactions;
    }

    /// Recommendations sorted for display, showing local feedback values.
    pub fn overlay_recommendations(&self, recommendations: &[Recommendation]) -> Vec<Recommendation> {
        overlay_recommendations(recommendations, &self.interactions)
    }

    fn refresh_interactions(&mut self, blocks: &[SentenceBlock]) {
        self.interactions = to_interactions(&self.index, blocks, self.iteration)
            .into_iter()
            .collect();
    }
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(SessionConfig::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Concept, KeyBindings, SentenceId, Span};

    fn blocks() -> Vec<SentenceBlock> {
        // 0         1         2         3
        // 0123456789012345678901234567890123456
        // The jury praised the opening speech.
        vec![SentenceBlock::new(1, "The jury praised the opening speech.")
            .with_concept(Concept::plain("jury"))
            .with_concept(Concept::new("open speech", "opening speech"))]
    }

    #[test]
    fn test_apply_selection_derives_interactions() {
        let mut session = AnnotationSession::new(SessionConfig::default(), 4);
        let warnings = session
            .apply_selection(&[SelectionRange::new(1, 0, 8)], &blocks(), Label::Accept)
            .unwrap();
        assert!(warnings.is_empty());

        let interaction = session.interactions().get("jury").unwrap();
        assert_eq!(interaction.value, FeedbackValue::Accept);
        assert_eq!(interaction.iteration, 4);
        assert!(!session.interactions().contains("open speech"));
    }

    #[test]
    fn test_error_leaves_session_untouched() {
        let mut session = AnnotationSession::default();
        session
            .apply_selection(&[SelectionRange::new(1, 0, 8)], &blocks(), Label::Accept)
            .unwrap();
        let before = session.snapshot();

        let result =
            session.apply_selection(&[SelectionRange::new(1, 0, 99)], &blocks(), Label::Reject);
        assert!(result.is_err());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_concept_key_stores_nothing() {
        let config = SessionConfig {
            key_bindings: KeyBindings::empty().bind("KeyK", Label::Concept),
            ..SessionConfig::default()
        };
        let mut session = AnnotationSession::new(config, 0);

        let result = session.apply_key("KeyK", &[SelectionRange::new(1, 0, 8)], &blocks());
        assert_eq!(
            result,
            Err(AnnotationError::UnselectableLabel { label: Label::Concept })
        );
        assert!(session.index().is_empty());
    }

    #[test]
    fn test_touching_selections_are_compressed() {
        let mut session = AnnotationSession::default();
        session
            .apply_selection(&[SelectionRange::new(1, 0, 8)], &blocks(), Label::Reject)
            .unwrap();
        session
            .apply_selection(&[SelectionRange::new(1, 8, 16)], &blocks(), Label::Reject)
            .unwrap();
        assert_eq!(
            session.index().get(SentenceId(1)),
            &[Span::new(SentenceId(1), 0, 16, Label::Reject).unwrap()]
        );
    }

    #[test]
    fn test_compression_can_be_disabled() {
        let config = SessionConfig {
            compress_after_merge: false,
            ..SessionConfig::default()
        };
        let mut session = AnnotationSession::new(config, 0);
        session
            .apply_selection(&[SelectionRange::new(1, 0, 8)], &blocks(), Label::Reject)
            .unwrap();
        session
            .apply_selection(&[SelectionRange::new(1, 8, 16)], &blocks(), Label::Reject)
            .unwrap();
        assert_eq!(session.index().span_count(), 2);
    }

    #[test]
    fn test_apply_key_uses_bindings() {
        let mut session = AnnotationSession::default();
        session
            .apply_key("KeyR", &[SelectionRange::new(1, 17, 35)], &blocks())
            .unwrap();
        assert_eq!(
            session.interactions().get("open speech").map(|i| i.value),
            Some(FeedbackValue::Reject)
        );

        // The eraser clears the span and with it the interaction.
        session
            .apply_key("KeyC", &[SelectionRange::new(1, 0, 36)], &blocks())
            .unwrap();
        assert!(session.index().is_empty());
        assert!(session.interactions().is_empty());

        // Unbound keys do nothing.
        session
            .apply_key("KeyQ", &[SelectionRange::new(1, 0, 8)], &blocks())
            .unwrap();
        assert!(session.index().is_empty());
    }

    #[test]
    fn test_change_interaction_relabels_concept_range() {
        let mut session = AnnotationSession::default();
        session
            .apply_selection(&[SelectionRange::new(1, 0, 36)], &blocks(), Label::Accept)
            .unwrap();
        assert_eq!(session.interactions().len(), 2);

        session.change_interaction("jury", FeedbackValue::Reject, &blocks());

        let spans = session.index().sorted(SentenceId(1));
        let summary: Vec<(usize, usize, Label)> =
            spans.iter().map(|s| (s.start(), s.end(), s.label())).collect();
        assert_eq!(
            summary,
            vec![
                (0, 4, Label::Accept),
                (4, 8, Label::Reject),
                (8, 36, Label::Accept),
            ]
        );
        assert_eq!(spans[1].tag(), Some("jury"));
        assert_eq!(
            session.interactions().get("jury").map(|i| i.value),
            Some(FeedbackValue::Reject)
        );
        assert_eq!(
            session.interactions().get("open speech").map(|i| i.value),
            Some(FeedbackValue::Accept)
        );
    }

    #[test]
    fn test_change_interaction_without_feedback_is_noop() {
        let mut session = AnnotationSession::default();
        let warnings = session.change_interaction("jury", FeedbackValue::Reject, &blocks());
        assert!(warnings.is_empty());
        assert!(session.index().is_empty());
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut session = AnnotationSession::default();
        let empty = session.snapshot();
        session
            .apply_selection(&[SelectionRange::new(1, 0, 8)], &blocks(), Label::Accept)
            .unwrap();
        assert!(!session.index().is_empty());

        session.restore(empty);
        assert!(session.index().is_empty());
        assert!(session.interactions().is_empty());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut session = AnnotationSession::default();
        session.record_feedback(vec![Interaction::new("jury", FeedbackValue::Accept, 0)]);
        session.reset(2);
        assert!(session.interactions().is_empty());
        assert_eq!(session.iteration(), 2);
    }
}
