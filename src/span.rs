//! Labeled character ranges within a single sentence.

use serde::{Deserialize, Serialize};

use crate::AnnotationError;

/// Identifier of a sentence within the current task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentenceId(pub u32);

impl std::fmt::Display for SentenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SentenceId {
    fn from(id: u32) -> Self {
        SentenceId(id)
    }
}

/// What a span says about the text it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Text marked as relevant.
    Accept,
    /// Text marked as irrelevant.
    Reject,
    /// Occurrence of a known concept, derived from the sentence text.
    Concept,
    /// Neutral state. Used by the eraser, never stored in a canonical index.
    #[serde(alias = "remove")]
    Recommendation,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Accept => "accept",
            Label::Reject => "reject",
            Label::Concept => "concept",
            Label::Recommendation => "recommendation",
        }
    }

    /// Neutral labels erase feedback instead of recording it.
    pub fn is_neutral(&self) -> bool {
        *self == Label::Recommendation
    }

    /// The interaction value carried by this label, if it is user feedback.
    pub fn feedback(&self) -> Option<FeedbackValue> {
        match self {
            Label::Accept => Some(FeedbackValue::Accept),
            Label::Reject => Some(FeedbackValue::Reject),
            Label::Concept | Label::Recommendation => None,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Label::Accept),
            "reject" => Ok(Label::Reject),
            "concept" => Ok(Label::Concept),
            "recommendation" | "remove" => Ok(Label::Recommendation),
            other => Err(format!("unknown label '{}'", other)),
        }
    }
}

/// Value of an [`Interaction`](crate::Interaction) sent to the recommendation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackValue {
    Accept,
    Reject,
    Recommendation,
}

impl FeedbackValue {
    pub fn as_str(&self) -> &'static str {
        Label::from(*self).as_str()
    }
}

impl From<FeedbackValue> for Label {
    fn from(value: FeedbackValue) -> Self {
        match value {
            FeedbackValue::Accept => Label::Accept,
            FeedbackValue::Reject => Label::Reject,
            FeedbackValue::Recommendation => Label::Recommendation,
        }
    }
}

impl std::fmt::Display for FeedbackValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeedbackValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Label>()? {
            Label::Accept => Ok(FeedbackValue::Accept),
            Label::Reject => Ok(FeedbackValue::Reject),
            Label::Recommendation => Ok(FeedbackValue::Recommendation),
            Label::Concept => Err("'concept' is not a feedback value".to_string()),
        }
    }
}

/// A labeled, half-open character range `[start, end)` within one sentence.
///
/// Spans are never mutated; every transformation builds new spans so older
/// [`SpanIndex`](crate::SpanIndex) snapshots stay valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpanRepr")]
pub struct Span {
    sentence_id: SentenceId,
    start: usize,
    end: usize,
    label: Label,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

#[derive(Deserialize)]
struct SpanRepr {
    sentence_id: SentenceId,
    start: usize,
    end: usize,
    label: Label,
    #[serde(default)]
    tag: Option<String>,
}

impl TryFrom<SpanRepr> for Span {
    type Error = AnnotationError;

    fn try_from(repr: SpanRepr) -> Result<Self, Self::Error> {
        let span = Span::new(repr.sentence_id, repr.start, repr.end, repr.label)?;
        Ok(match repr.tag {
            Some(tag) => span.with_tag(tag),
            None => span,
        })
    }
}

impl Span {
    /// Create an untagged span. Fails unless `start < end`.
    pub fn new(
        sentence_id: SentenceId,
        start: usize,
        end: usize,
        label: Label,
    ) -> Result<Self, AnnotationError> {
        if end <= start {
            return Err(AnnotationError::InvalidSpan {
                sentence_id,
                start,
                end,
                reason: "end must be greater than start".to_string(),
            });
        }
        Ok(Self {
            sentence_id,
            start,
            end,
            label,
            tag: None,
        })
    }

    /// Copy of this span carrying a concept tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = if tag.is_empty() { None } else { Some(tag) };
        self
    }

    /// Copy of this span with another label. The tag is kept.
    pub fn with_label(&self, label: Label) -> Self {
        Self {
            label,
            ..self.clone()
        }
    }

    /// Untagged span over `[start, end)` of the same sentence with `label`.
    ///
    /// Returns `None` for an empty range; used when cutting spans into
    /// fragments, where an empty remainder simply does not exist.
    pub fn fragment(&self, start: usize, end: usize, label: Label) -> Option<Self> {
        Span::new(self.sentence_id, start, end, label).ok()
    }

    /// Smallest span covering both, labeled like `self`.
    ///
    /// The tag survives only when both spans carry the same one.
    pub fn hull(&self, other: &Span) -> Self {
        Self {
            sentence_id: self.sentence_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            label: self.label,
            tag: if self.tag == other.tag {
                self.tag.clone()
            } else {
                None
            },
        }
    }

    /// Reject offsets that run past a sentence of `text_len` characters.
    pub fn check_within(&self, text_len: usize) -> Result<(), AnnotationError> {
        if self.end > text_len {
            return Err(AnnotationError::InvalidSpan {
                sentence_id: self.sentence_id,
                start: self.start,
                end: self.end,
                reason: format!("sentence is only {} characters long", text_len),
            });
        }
        Ok(())
    }

    pub fn sentence_id(&self) -> SentenceId {
        self.sentence_id
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True iff `other` lies entirely inside this span.
    pub fn covers(&self, other: &Span) -> bool {
        self.sentence_id == other.sentence_id
            && other.start >= self.start
            && other.end <= self.end
    }

    /// True iff both spans share at least one character.
    pub fn intersects(&self, other: &Span) -> bool {
        self.sentence_id == other.sentence_id
            && self.start < other.end
            && self.end > other.start
    }

    /// True iff one span ends exactly where the other starts.
    pub fn touches(&self, other: &Span) -> bool {
        self.sentence_id == other.sentence_id
            && (self.start == other.end || self.end == other.start)
    }

    /// Same sentence and the same `[start, end)`.
    pub fn same_extent(&self, other: &Span) -> bool {
        self.sentence_id == other.sentence_id
            && self.start == other.start
            && self.end == other.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}@{}..{}",
            self.sentence_id, self.label, self.start, self.end
        )?;
        if let Some(tag) = &self.tag {
            write!(f, " ({})", tag)?;
        }
        Ok(())
    }
}
