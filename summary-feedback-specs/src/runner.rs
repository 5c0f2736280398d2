//! Runs fixture steps through the reconciliation pipeline and checks expectations.

use std::path::Path;

use summary_feedback::{
    compress, merge_annotations_reported, reclassify_concept_reported, resolve_selection,
    to_interactions, AnnotationError, AnnotationWarning, Interaction, SentenceBlock, SentenceId,
    Span, SpanIndex,
};

use crate::errors::{SpecError, SpecResult};
use crate::failures::{ExpectedFailures, FailureState, HarnessResult};
use crate::fixture::{AnnFixture, Expectation, ExpectationKind, ExpectedSpan, StepKind};
use crate::formatter::{format_failure, format_summary};
use crate::loader::load_all_fixtures;

/// State after all steps of a fixture ran.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub index: SpanIndex,
    pub interactions: Vec<Interaction>,
    pub warnings: Vec<AnnotationWarning>,
}

/// Result of checking one expectation.
#[derive(Debug, Clone)]
pub struct ExpectationResult {
    pub expectation: Expectation,
    pub outcome: ExpectationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationOutcome {
    Passed,
    Failed { expected: String, actual: String },
}

impl ExpectationResult {
    pub fn passed(&self) -> bool {
        self.outcome == ExpectationOutcome::Passed
    }
}

/// Seed the index from the fixture's markers and execute every step in order.
pub fn run_fixture(fixture: &AnnFixture) -> SpecResult<RunOutcome> {
    let blocks = fixture.blocks();
    let mut index = SpanIndex::new();
    let mut warnings = Vec::new();

    for sentence in &fixture.sentences {
        for marker in &sentence.spans {
            let span = Span::new(
                sentence.id,
                marker.char_range.start,
                marker.char_range.end,
                marker.label,
            )
            .map_err(|e| SpecError::Step {
                line: sentence.source_line,
                message: e.to_string(),
            })?;
            index.add(span);
        }
    }

    for step in &fixture.steps {
        let step_err = |message: String| SpecError::Step {
            line: step.source_line,
            message,
        };

        index = match &step.kind {
            StepKind::Merge { ranges, label } => {
                let spans = ranges
                    .iter()
                    .map(|r| -> Result<Span, AnnotationError> {
                        let span = Span::new(r.sentence_id, r.start, r.end, *label)?;
                        if let Some(block) = find_block(&blocks, span.sentence_id()) {
                            span.check_within(block.char_len())?;
                        }
                        Ok(span)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| step_err(e.to_string()))?;
                let merged = merge_annotations_reported(&index, &spans);
                warnings.extend(merged.warnings);
                merged.value
            }
            StepKind::Select { ranges, label } => {
                let spans = resolve_selection(ranges, &blocks, *label)
                    .map_err(|e| step_err(e.to_string()))?;
                let merged = merge_annotations_reported(&index, &spans);
                warnings.extend(merged.warnings);
                merged.value
            }
            StepKind::Reclassify { concept, old, new } => {
                let result = reclassify_concept_reported(&index, &blocks, concept, *old, *new);
                warnings.extend(result.warnings);
                result.value
            }
            StepKind::Compress => compress(&index),
        };
    }

    let interactions = to_interactions(&index, &blocks, 0);
    Ok(RunOutcome {
        index,
        interactions,
        warnings,
    })
}

fn find_block(blocks: &[SentenceBlock], id: SentenceId) -> Option<&SentenceBlock> {
    blocks.iter().find(|b| b.sentence_id == id)
}

/// Check all expectations of a fixture against a run.
pub fn check_fixture(fixture: &AnnFixture, outcome: &RunOutcome) -> Vec<ExpectationResult> {
    fixture
        .expectations
        .iter()
        .map(|expectation| ExpectationResult {
            expectation: expectation.clone(),
            outcome: check_expectation(&expectation.kind, outcome),
        })
        .collect()
}

fn check_expectation(kind: &ExpectationKind, outcome: &RunOutcome) -> ExpectationOutcome {
    let compare = |expected: String, actual: String| {
        if expected == actual {
            ExpectationOutcome::Passed
        } else {
            ExpectationOutcome::Failed { expected, actual }
        }
    };

    match kind {
        ExpectationKind::Spans { sentence_id, spans } => {
            let actual: Vec<ExpectedSpan> = outcome
                .index
                .sorted(*sentence_id)
                .iter()
                .map(|s| ExpectedSpan {
                    label: s.label(),
                    start: s.start(),
                    end: s.end(),
                })
                .collect();
            compare(format_spans(spans), format_spans(&actual))
        }
        ExpectationKind::Interaction { concept, value } => {
            let actual = outcome
                .interactions
                .iter()
                .find(|i| &i.concept == concept)
                .map_or_else(|| "none".to_string(), |i| i.value.to_string());
            compare(value.to_string(), actual)
        }
        ExpectationKind::NoInteraction { concept } => {
            let actual = outcome
                .interactions
                .iter()
                .find(|i| &i.concept == concept)
                .map_or_else(|| "none".to_string(), |i| i.value.to_string());
            compare("none".to_string(), actual)
        }
        ExpectationKind::Warnings { count } => {
            compare(count.to_string(), outcome.warnings.len().to_string())
        }
    }
}

fn format_spans(spans: &[ExpectedSpan]) -> String {
    if spans.is_empty() {
        return "-".to_string();
    }
    spans
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of running every fixture in a directory.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub result: HarnessResult,
    /// Failure details and per-fixture summaries
    pub report: String,
}

/// Run every `.ann` fixture under `dir`, classifying failures with `expected`.
///
/// A fixture whose steps fail to run counts as one failure with the
/// reference `run`.
pub fn run_suite(dir: &Path, expected: &ExpectedFailures) -> SpecResult<SuiteReport> {
    let mut suite = SuiteReport::default();

    for (name, fixture) in load_all_fixtures(dir)? {
        let mut fixture_result = HarnessResult::new();

        match run_fixture(&fixture) {
            Ok(outcome) => {
                for result in check_fixture(&fixture, &outcome) {
                    if result.passed() {
                        fixture_result.record_pass();
                        continue;
                    }
                    let reference = ExpectedFailures::format_ref(result.expectation.source_line);
                    let state = expected.is_expected(&name, &reference);
                    fixture_result.record_failure(state);
                    if state == FailureState::Regression {
                        suite
                            .report
                            .push_str(&format_failure(&name, &fixture, &result, &outcome));
                    }
                }
            }
            Err(err) => {
                let state = expected.is_expected(&name, "run");
                fixture_result.record_failure(state);
                if state == FailureState::Regression {
                    suite.report.push_str(&format!("\nERROR: {}: {}\n", name, err));
                }
            }
        }

        suite.report.push_str(&format_summary(
            &name,
            fixture_result.passed,
            fixture_result.total - fixture_result.passed,
            fixture_result.expected_failures,
            fixture_result.regressions,
        ));
        suite.result.absorb(&fixture_result);
    }

    Ok(suite)
}
