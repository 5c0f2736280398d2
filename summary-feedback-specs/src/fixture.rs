//! Core types for parsed `.ann` fixture files.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use summary_feedback::{Concept, FeedbackValue, Label, SelectionRange, SentenceBlock, SentenceId};

/// A parsed `.ann` fixture document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnFixture {
    /// Optional title from `# Title` header
    pub title: Option<String>,
    /// Sentences in render order
    pub sentences: Vec<FixtureSentence>,
    /// `>` lines, executed in order
    pub steps: Vec<Step>,
    /// `=` lines, checked after all steps ran
    pub expectations: Vec<Expectation>,
}

/// A `[id] text` line, with its `concepts [id]:` line if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSentence {
    pub id: SentenceId,
    /// The normalized text (markers removed)
    pub text: String,
    /// Spans present before the first step
    pub spans: Vec<SpanMarker>,
    pub concepts: Vec<Concept>,
    pub source_line: usize,
}

/// A span marker extracted from «label:text» syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanMarker {
    pub label: Label,
    /// The marked text content (without guillemets)
    pub text: String,
    /// Character range in the normalized text
    pub char_range: Range<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub source_line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StepKind {
    /// `> merge 10:15..30 reject`: merge raw spans
    Merge {
        ranges: Vec<SelectionRange>,
        label: Label,
    },
    /// `> select 10:3..8 11:0..4 accept`: resolve a selection, then merge
    Select {
        ranges: Vec<SelectionRange>,
        label: Label,
    },
    /// `> reclassify "concept" accept -> reject`
    Reclassify {
        concept: String,
        old: FeedbackValue,
        new: FeedbackValue,
    },
    /// `> compress`
    Compress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    pub kind: ExpectationKind,
    pub source_line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ExpectationKind {
    /// `= [10] accept@0..15 reject@15..30`, or `= [10] -` for no spans
    Spans {
        sentence_id: SentenceId,
        spans: Vec<ExpectedSpan>,
    },
    /// `= interaction "concept" reject`
    Interaction { concept: String, value: FeedbackValue },
    /// `= no interaction "concept"`
    NoInteraction { concept: String },
    /// `= warnings 1`
    Warnings { count: usize },
}

/// `label@start..end` in an expectation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpectedSpan {
    pub label: Label,
    pub start: usize,
    pub end: usize,
}

impl AnnFixture {
    /// Create an empty fixture (for testing/building).
    pub fn empty() -> Self {
        Self {
            title: None,
            sentences: Vec::new(),
            steps: Vec::new(),
            expectations: Vec::new(),
        }
    }

    /// The sentences as content blocks, in render order.
    pub fn blocks(&self) -> Vec<SentenceBlock> {
        self.sentences
            .iter()
            .map(|s| SentenceBlock {
                sentence_id: s.id,
                text: s.text.clone(),
                concepts: s.concepts.clone(),
            })
            .collect()
    }

    pub fn sentence(&self, id: SentenceId) -> Option<&FixtureSentence> {
        self.sentences.iter().find(|s| s.id == id)
    }
}

impl std::fmt::Display for ExpectedSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}..{}", self.label, self.start, self.end)
    }
}

impl std::fmt::Display for ExpectationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectationKind::Spans { sentence_id, spans } => {
                write!(f, "[{}]", sentence_id)?;
                if spans.is_empty() {
                    return write!(f, " -");
                }
                for span in spans {
                    write!(f, " {}", span)?;
                }
                Ok(())
            }
            ExpectationKind::Interaction { concept, value } => {
                write!(f, "interaction \"{}\" {}", concept, value)
            }
            ExpectationKind::NoInteraction { concept } => {
                write!(f, "no interaction \"{}\"", concept)
            }
            ExpectationKind::Warnings { count } => write!(f, "warnings {}", count),
        }
    }
}
