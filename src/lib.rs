//! Span reconciliation for interactive summary feedback.
//!
//! Readers highlight parts of a generated summary and mark them as
//! relevant (`accept`) or irrelevant (`reject`). This crate keeps the
//! resulting labeled character ranges consistent and turns them into
//! per-concept feedback for the recommendation service.
//!
//! ## Pipeline
//!
//! - [`resolve_selection`] - Turns a multi-sentence selection into one [`Span`] per sentence
//! - [`merge_annotations`] - Integrates new spans, splitting or dropping the ones they overlap
//! - [`compress`] - Joins overlapping or touching spans with the same label
//! - [`reclassify_concept`] - Relabels the parts of spans overlapping a concept
//! - [`to_interactions`] - Derives concept feedback from accept/reject spans
//!
//! All of these are pure: they take a [`SpanIndex`] by reference and return
//! a new one. [`AnnotationSession`] wires them together and keeps the
//! current index and [`InteractionMap`].
//!
//! ## Offsets
//!
//! Span offsets count characters (Unicode scalar values) of the sentence
//! text, never bytes.
//!
//! ## Example
//!
//! ```
//! use summary_feedback::{AnnotationSession, Label, SelectionRange, SentenceBlock, Concept};
//!
//! let blocks = vec![SentenceBlock::new(1, "The jury praised the speech.")
//!     .with_concept(Concept::plain("jury"))];
//!
//! let mut session = AnnotationSession::default();
//! session
//!     .apply_selection(&[SelectionRange::new(1, 4, 8)], &blocks, Label::Accept)
//!     .unwrap();
//! assert_eq!(session.submission().items.len(), 1);
//! ```

mod compress;
mod concept;
mod config;
mod display;
mod error;
mod interaction;
mod merge;
mod selection;
mod session;
mod span;
mod span_index;

pub use compress::{compress, compress_spans};
pub use concept::{
    concept_spans, locate_concept, reclassify_concept, reclassify_concept_reported,
    seed_concept_spans, Concept, SentenceBlock,
};
pub use config::{KeyBindings, SessionConfig};
pub use display::SentenceDisplay;
pub use error::{AnnotationError, AnnotationWarning, ConfigError, Reported};
pub use interaction::{
    overlay_recommendations, to_interactions, FeedbackBatch, Interaction, InteractionMap,
    Recommendation,
};
pub use merge::{merge_annotations, merge_annotations_reported};
pub use selection::{resolve_selection, SelectionRange};
pub use session::{AnnotationSession, SessionSnapshot};
pub use span::{FeedbackValue, Label, SentenceId, Span};
pub use span_index::SpanIndex;
