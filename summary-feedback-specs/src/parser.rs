//! Parser for `.ann` fixture files.
//!
//! ```text
//! # Title
//! [10] «accept:Lorem ipsum dolor sit» amet, consectetur adipiscing elit.
//! concepts [10]: lorem ipsum; dolor = dolor sit
//! > merge 10:15..30 reject
//! > select 10:3..8 11:0..4 accept
//! > reclassify "lorem ipsum" accept -> reject
//! > compress
//! = [10] accept@0..15 reject@15..30
//! = [11] -
//! = interaction "lorem ipsum" reject
//! = no interaction "dolor"
//! = warnings 0
//! ```
//!
//! All offsets are character offsets into the marker-free sentence text.

use crate::errors::{SpecError, SpecResult};
use crate::fixture::{
    AnnFixture, Expectation, ExpectationKind, ExpectedSpan, FixtureSentence, SpanMarker, Step,
    StepKind,
};
use summary_feedback::{Concept, FeedbackValue, Label, SelectionRange, SentenceId};

/// Parse «label:text» markers, returning the normalized text and the markers.
///
/// Marker ranges count characters of the normalized (marker-free) text.
pub fn parse_spans(input: &str, line: usize) -> SpecResult<(String, Vec<SpanMarker>)> {
    let mut spans = Vec::new();
    let mut normalized = String::new();
    let mut normalized_len = 0;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '«' {
            normalized.push(ch);
            normalized_len += 1;
            continue;
        }

        let start = normalized_len;

        let mut label_str = String::new();
        loop {
            match chars.next() {
                Some(':') => break,
                Some(c) if c.is_alphanumeric() => label_str.push(c),
                Some(c) => {
                    return Err(SpecError::Parse {
                        line,
                        message: format!(
                            "Invalid span marker: expected a label or ':', found '{}'",
                            c
                        ),
                    });
                }
                None => {
                    return Err(SpecError::Parse {
                        line,
                        message: "Unclosed span marker: expected ':'".to_string(),
                    });
                }
            }
        }
        let label = parse_label(&label_str, line)?;

        let mut text = String::new();
        loop {
            match chars.next() {
                Some('»') => break,
                Some(c) => {
                    text.push(c);
                    normalized.push(c);
                    normalized_len += 1;
                }
                None => {
                    return Err(SpecError::Parse {
                        line,
                        message: "Unclosed span marker: expected '»'".to_string(),
                    });
                }
            }
        }

        if text.is_empty() {
            return Err(SpecError::Parse {
                line,
                message: "Empty span marker".to_string(),
            });
        }

        spans.push(SpanMarker {
            label,
            text,
            char_range: start..normalized_len,
        });
    }

    Ok((normalized, spans))
}

/// Parse a full `.ann` fixture file.
pub fn parse_fixture(input: &str) -> SpecResult<AnnFixture> {
    let mut fixture = AnnFixture::empty();
    let mut concept_lines = Vec::new();

    for (line_idx, line) in input.lines().enumerate() {
        let line_num = line_idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if let Some(title) = trimmed.strip_prefix("# ") {
            if fixture.title.is_none() {
                fixture.title = Some(title.trim().to_string());
            }
        } else if let Some(step) = trimmed.strip_prefix('>') {
            fixture.steps.push(Step {
                kind: parse_step(step.trim(), line_num)?,
                source_line: line_num,
            });
        } else if let Some(expectation) = trimmed.strip_prefix('=') {
            fixture.expectations.push(Expectation {
                kind: parse_expectation(expectation.trim(), line_num)?,
                source_line: line_num,
            });
        } else if let Some(rest) = trimmed.strip_prefix("concepts") {
            concept_lines.push((line_num, rest.trim()));
        } else if trimmed.starts_with('[') {
            let (id, rest) = parse_sentence_ref(trimmed, line_num)?;
            if fixture.sentence(id).is_some() {
                return Err(SpecError::Parse {
                    line: line_num,
                    message: format!("Sentence [{}] defined twice", id),
                });
            }
            let (text, spans) = parse_spans(rest.trim(), line_num)?;
            fixture.sentences.push(FixtureSentence {
                id,
                text,
                spans,
                concepts: Vec::new(),
                source_line: line_num,
            });
        } else {
            return Err(SpecError::Parse {
                line: line_num,
                message: format!("Unrecognized line: {}", trimmed),
            });
        }
    }

    // Concepts may be listed before or after their sentence.
    for (line_num, rest) in concept_lines {
        let (id, list) = parse_sentence_ref(rest, line_num)?;
        let list = list.trim_start().strip_prefix(':').ok_or_else(|| SpecError::Parse {
            line: line_num,
            message: "Expected ':' after concepts sentence reference".to_string(),
        })?;
        let concepts = parse_concepts(list);
        let sentence = fixture
            .sentences
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SpecError::Parse {
                line: line_num,
                message: format!("Concepts for unknown sentence [{}]", id),
            })?;
        sentence.concepts.extend(concepts);
    }

    Ok(fixture)
}

/// `[12] rest` -> `(12, "rest")`
fn parse_sentence_ref(input: &str, line: usize) -> SpecResult<(SentenceId, &str)> {
    let err = |message: String| SpecError::Parse { line, message };

    let inner = input
        .strip_prefix('[')
        .ok_or_else(|| err(format!("Expected '[' in: {}", input)))?;
    let close = inner
        .find(']')
        .ok_or_else(|| err(format!("Expected ']' in: {}", input)))?;
    let id: u32 = inner[..close]
        .trim()
        .parse()
        .map_err(|_| err(format!("Invalid sentence id: '{}'", &inner[..close])))?;

    Ok((SentenceId(id), &inner[close + 1..]))
}

/// `lorem ipsum; dolor = dolor sit`
fn parse_concepts(input: &str) -> Vec<Concept> {
    input
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, surface)) => Concept::new(id.trim(), surface.trim()),
            None => Concept::plain(entry),
        })
        .collect()
}

fn parse_step(input: &str, line: usize) -> SpecResult<StepKind> {
    let (command, args) = input.split_once(' ').unwrap_or((input, ""));
    match command {
        "merge" | "select" => {
            let mut words: Vec<&str> = args.split_whitespace().collect();
            let label = words.pop().ok_or_else(|| SpecError::Parse {
                line,
                message: format!("'{}' needs ranges and a label", command),
            })?;
            let label = parse_label(label, line)?;
            let ranges = words
                .into_iter()
                .map(|w| parse_range(w, line))
                .collect::<SpecResult<Vec<_>>>()?;
            if command == "merge" {
                Ok(StepKind::Merge { ranges, label })
            } else {
                Ok(StepKind::Select { ranges, label })
            }
        }
        "reclassify" => {
            let (concept, rest) = parse_quoted(args, line)?;
            let (old, new) = rest.split_once("->").ok_or_else(|| SpecError::Parse {
                line,
                message: "Expected 'old -> new' after concept".to_string(),
            })?;
            Ok(StepKind::Reclassify {
                concept,
                old: parse_value(old.trim(), line)?,
                new: parse_value(new.trim(), line)?,
            })
        }
        "compress" => Ok(StepKind::Compress),
        other => Err(SpecError::Parse {
            line,
            message: format!("Unknown step '{}'", other),
        }),
    }
}

fn parse_expectation(input: &str, line: usize) -> SpecResult<ExpectationKind> {
    if input.starts_with('[') {
        let (sentence_id, rest) = parse_sentence_ref(input, line)?;
        let rest = rest.trim();
        let spans = if rest == "-" {
            Vec::new()
        } else {
            rest.split_whitespace()
                .map(|w| parse_expected_span(w, line))
                .collect::<SpecResult<Vec<_>>>()?
        };
        return Ok(ExpectationKind::Spans { sentence_id, spans });
    }

    if let Some(rest) = input.strip_prefix("no interaction") {
        let (concept, _) = parse_quoted(rest, line)?;
        return Ok(ExpectationKind::NoInteraction { concept });
    }

    if let Some(rest) = input.strip_prefix("interaction") {
        let (concept, value) = parse_quoted(rest, line)?;
        return Ok(ExpectationKind::Interaction {
            concept,
            value: parse_value(value.trim(), line)?,
        });
    }

    if let Some(rest) = input.strip_prefix("warnings") {
        let count = rest.trim().parse().map_err(|_| SpecError::Parse {
            line,
            message: format!("Invalid warning count: '{}'", rest.trim()),
        })?;
        return Ok(ExpectationKind::Warnings { count });
    }

    Err(SpecError::Parse {
        line,
        message: format!("Unknown expectation: {}", input),
    })
}

/// `10:3..8`
fn parse_range(input: &str, line: usize) -> SpecResult<SelectionRange> {
    let err = || SpecError::Parse {
        line,
        message: format!("Invalid range '{}', expected id:start..end", input),
    };
    let (id, bounds) = input.split_once(':').ok_or_else(err)?;
    let id: u32 = id.parse().map_err(|_| err())?;
    let (start, end) = parse_bounds(bounds).ok_or_else(err)?;
    Ok(SelectionRange::new(id, start, end))
}

/// `accept@0..15`
fn parse_expected_span(input: &str, line: usize) -> SpecResult<ExpectedSpan> {
    let err = || SpecError::Parse {
        line,
        message: format!("Invalid span '{}', expected label@start..end", input),
    };
    let (label, bounds) = input.split_once('@').ok_or_else(err)?;
    let (start, end) = parse_bounds(bounds).ok_or_else(err)?;
    Ok(ExpectedSpan {
        label: parse_label(label, line)?,
        start,
        end,
    })
}

fn parse_bounds(input: &str) -> Option<(usize, usize)> {
    let (start, end) = input.split_once("..")?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// `"some concept" rest` -> `("some concept", " rest")`
fn parse_quoted(input: &str, line: usize) -> SpecResult<(String, &str)> {
    let err = || SpecError::Parse {
        line,
        message: format!("Expected a quoted concept in: {}", input),
    };
    let inner = input.trim_start().strip_prefix('"').ok_or_else(err)?;
    let close = inner.find('"').ok_or_else(err)?;
    Ok((inner[..close].to_string(), &inner[close + 1..]))
}

fn parse_label(input: &str, line: usize) -> SpecResult<Label> {
    input
        .parse::<Label>()
        .map_err(|message| SpecError::Parse { line, message })
}

fn parse_value(input: &str, line: usize) -> SpecResult<FeedbackValue> {
    input
        .parse::<FeedbackValue>()
        .map_err(|message| SpecError::Parse { line, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spans_char_offsets() {
        let (text, spans) = parse_spans("Un «accept:café» très «reject:bon».", 1).unwrap();
        assert_eq!(text, "Un café très bon.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].label, Label::Accept);
        assert_eq!(spans[0].char_range, 3..7);
        assert_eq!(spans[1].char_range, 13..16);
        assert_eq!(spans[1].text, "bon");
    }

    #[test]
    fn test_parse_spans_errors() {
        assert!(parse_spans("«accept:open", 1).is_err());
        assert!(parse_spans("«maybe:text»", 1).is_err());
        assert!(parse_spans("«accept:»", 1).is_err());
        assert!(parse_spans("«acc ept:x»", 1).is_err());
    }

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            parse_step("select 10:3..8 11:0..4 accept", 1).unwrap(),
            StepKind::Select {
                ranges: vec![SelectionRange::new(10, 3, 8), SelectionRange::new(11, 0, 4)],
                label: Label::Accept,
            }
        );
        assert_eq!(
            parse_step("merge 2:0..5 remove", 1).unwrap(),
            StepKind::Merge {
                ranges: vec![SelectionRange::new(2, 0, 5)],
                label: Label::Recommendation,
            }
        );
        assert_eq!(
            parse_step("reclassify \"globe award\" accept -> reject", 1).unwrap(),
            StepKind::Reclassify {
                concept: "globe award".to_string(),
                old: FeedbackValue::Accept,
                new: FeedbackValue::Reject,
            }
        );
        assert_eq!(parse_step("compress", 1).unwrap(), StepKind::Compress);
        assert!(parse_step("split 1:0..2", 1).is_err());
        assert!(parse_step("merge 1:0-2 accept", 1).is_err());
    }

    #[test]
    fn test_parse_expectations() {
        assert_eq!(
            parse_expectation("[10] accept@0..15 reject@15..30", 1).unwrap(),
            ExpectationKind::Spans {
                sentence_id: SentenceId(10),
                spans: vec![
                    ExpectedSpan { label: Label::Accept, start: 0, end: 15 },
                    ExpectedSpan { label: Label::Reject, start: 15, end: 30 },
                ],
            }
        );
        assert_eq!(
            parse_expectation("[11] -", 1).unwrap(),
            ExpectationKind::Spans {
                sentence_id: SentenceId(11),
                spans: vec![],
            }
        );
        assert_eq!(
            parse_expectation("no interaction \"dolor\"", 1).unwrap(),
            ExpectationKind::NoInteraction {
                concept: "dolor".to_string()
            }
        );
        assert_eq!(
            parse_expectation("interaction \"lorem ipsum\" reject", 1).unwrap(),
            ExpectationKind::Interaction {
                concept: "lorem ipsum".to_string(),
                value: FeedbackValue::Reject,
            }
        );
        assert_eq!(
            parse_expectation("warnings 2", 1).unwrap(),
            ExpectationKind::Warnings { count: 2 }
        );
    }

    #[test]
    fn test_parse_fixture() {
        let fixture = parse_fixture(
            r#"
# Example
// comment
[10] «accept:Lorem ipsum dolor sit» amet.
[11] Second sentence.
concepts [10]: lorem ipsum; dolor = dolor sit
> merge 10:15..30 reject
= [10] accept@0..15 reject@15..30
"#,
        )
        .unwrap();

        assert_eq!(fixture.title.as_deref(), Some("Example"));
        assert_eq!(fixture.sentences.len(), 2);
        assert_eq!(fixture.sentences[0].text, "Lorem ipsum dolor sit amet.");
        assert_eq!(fixture.sentences[0].spans[0].char_range, 0..21);
        assert_eq!(
            fixture.sentences[0].concepts,
            vec![
                Concept::plain("lorem ipsum"),
                Concept::new("dolor", "dolor sit"),
            ]
        );
        assert_eq!(fixture.steps.len(), 1);
        assert_eq!(fixture.steps[0].source_line, 7);
        assert_eq!(fixture.expectations[0].source_line, 8);
    }

    #[test]
    fn test_parse_fixture_errors() {
        let unknown = parse_fixture("[1] Text.\nconcepts [2]: x").unwrap_err();
        assert!(matches!(unknown, SpecError::Parse { line: 2, .. }));

        let duplicate = parse_fixture("[1] Text.\n[1] Again.").unwrap_err();
        assert!(matches!(duplicate, SpecError::Parse { line: 2, .. }));

        let garbage = parse_fixture("hello").unwrap_err();
        assert!(matches!(garbage, SpecError::Parse { line: 1, .. }));
    }
}
