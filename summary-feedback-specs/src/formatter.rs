//! Failure and summary formatting for the harness report.

use std::fmt::Write;

use summary_feedback::SentenceDisplay;

use crate::fixture::{AnnFixture, ExpectationKind};
use crate::runner::{ExpectationOutcome, ExpectationResult, RunOutcome};

/// Format a failed expectation with the sentence it concerns, if any.
pub fn format_failure(
    fixture_name: &str,
    fixture: &AnnFixture,
    result: &ExpectationResult,
    outcome: &RunOutcome,
) -> String {
    let mut output = String::new();
    let expectation = &result.expectation;

    let _ = writeln!(output, "\nFAIL: {}:{}", fixture_name, expectation.source_line);
    let _ = writeln!(output, "  = {}", expectation.kind);

    if let ExpectationOutcome::Failed { expected, actual } = &result.outcome {
        let _ = writeln!(output, "  expected: {}", expected);
        let _ = writeln!(output, "  found:    {}", actual);
    }

    // Draw the actual spans under the sentence text.
    if let ExpectationKind::Spans { sentence_id, .. } = &expectation.kind {
        if let Some(block) = fixture
            .blocks()
            .into_iter()
            .find(|b| b.sentence_id == *sentence_id)
        {
            let display = SentenceDisplay::new(&block).with_index(&outcome.index);
            let _ = writeln!(output);
            for line in display.to_string().lines() {
                let _ = writeln!(output, "  {}", line);
            }
        }
    }

    output
}

/// Format a one-fixture summary line.
pub fn format_summary(
    fixture_name: &str,
    passed: usize,
    failed: usize,
    expected_failures: usize,
    regressions: usize,
) -> String {
    let status = if regressions > 0 { "FAIL" } else { "PASS" };
    format!(
        "\n{}: {}\n  {} passed, {} failed ({} expected, {} regressions)\n",
        status, fixture_name, passed, failed, expected_failures, regressions
    )
}
