//! Fixture-driven testing infrastructure for summary-feedback.
//!
//! Test cases are `.ann` files: sentences with inline «label:text» spans,
//! a list of edit steps, and the expected spans and interactions after
//! all steps ran.
//!
//! ## Modules
//!
//! - [`parser`] - Parses `.ann` fixture files
//! - [`fixture`] - Parsed fixture types
//! - [`loader`] - Fixture file loading
//! - [`runner`] - Executes steps and checks expectations
//! - [`formatter`] - Failure reports with rendered spans
//! - [`failures`] - Expected failures tracking via TOML
//! - [`errors`] - Error types for the fixture system

pub mod errors;
pub mod failures;
pub mod fixture;
pub mod formatter;
pub mod loader;
pub mod parser;
pub mod runner;

pub use errors::{SpecError, SpecResult};
pub use failures::{ExpectedFailures, FailureEntry, FailureState, HarnessResult};
pub use fixture::{
    AnnFixture, Expectation, ExpectationKind, ExpectedSpan, FixtureSentence, SpanMarker, Step,
    StepKind,
};
pub use formatter::{format_failure, format_summary};
pub use loader::{load_all_fixtures, load_fixture};
pub use parser::{parse_fixture, parse_spans};
pub use runner::{
    check_fixture, run_fixture, run_suite, ExpectationOutcome, ExpectationResult, RunOutcome,
    SuiteReport,
};
