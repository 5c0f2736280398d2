use std::fmt::Write;

use unicode_width::UnicodeWidthChar;

use crate::concept::concept_spans;
use crate::{SentenceBlock, Span, SpanIndex};

/// Text rendering of one sentence with its spans drawn underneath.
///
/// ```text
/// The jury praised the opening speech.
/// ╰──────╯accept
///                      ╰────────────╯reject [open speech]
/// ```
///
/// Columns follow the terminal display width of the text, so wide
/// characters shift the markers accordingly.
pub struct SentenceDisplay<'a> {
    block: &'a SentenceBlock,
    spans: Vec<Span>,
}

impl<'a> SentenceDisplay<'a> {
    pub fn new(block: &'a SentenceBlock) -> Self {
        SentenceDisplay {
            block,
            spans: Vec::new(),
        }
    }

    pub fn include(&mut self, span: Span) {
        if span.sentence_id() == self.block.sentence_id {
            self.spans.push(span);
        }
    }

    /// Takes self, includes the sentence's spans from `index`
    pub fn with_index(mut self, index: &SpanIndex) -> Self {
        for span in index.get(self.block.sentence_id) {
            self.include(span.clone());
        }
        self
    }

    /// Takes self, includes the located concept occurrences
    pub fn with_concepts(mut self) -> Self {
        for span in concept_spans(self.block) {
            self.include(span);
        }
        self
    }

    /// Display column at which each character offset starts, plus one
    /// trailing entry for the end of the text.
    fn columns(&self) -> Vec<usize> {
        let mut columns = Vec::with_capacity(self.block.text.len() + 1);
        let mut col = 0;
        columns.push(col);
        for c in self.block.text.chars() {
            col += c.width().unwrap_or(0);
            columns.push(col);
        }
        columns
    }
}

impl<'a> std::fmt::Display for SentenceDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.block.text)?;

        let columns = self.columns();
        let column = |offset: usize| {
            columns
                .get(offset)
                .or_else(|| columns.last())
                .copied()
                .unwrap_or(0)
        };

        let mut spans: Vec<&Span> = self.spans.iter().collect();
        spans.sort_by_key(|s| (s.start(), s.end(), s.label()));

        for span in spans {
            f.write_char('\n')?;

            let start_col = column(span.start());
            let end_col = column(span.end());
            for _ in 0..start_col {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;
            for _ in (start_col + 1)..end_col.saturating_sub(1) {
                f.write_char('─')?;
            }
            if end_col.saturating_sub(start_col) > 1 {
                f.write_char('╯')?;
            }

            f.write_str(span.label().as_str())?;
            if let Some(tag) = span.tag() {
                write!(f, " [{}]", tag)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Concept, Label, SentenceId};

    #[test]
    fn test_spans_rendered_in_start_order() {
        let block = SentenceBlock::new(1, "The jury praised the opening speech.");
        let index = SpanIndex::from_spans(vec![
            Span::new(SentenceId(1), 21, 35, Label::Reject)
                .unwrap()
                .with_tag("open speech"),
            Span::new(SentenceId(1), 0, 8, Label::Accept).unwrap(),
        ]);

        let display = SentenceDisplay::new(&block).with_index(&index);
        insta::assert_snapshot!(display, @r###"
        The jury praised the opening speech.
        ╰──────╯accept
                             ╰────────────╯reject [open speech]
        "###);
    }

    #[test]
    fn test_concepts_and_single_character_span() {
        let block = SentenceBlock::new(2, "A jury of peers.")
            .with_concept(Concept::plain("jury"))
            .with_concept(Concept::plain("peers"));
        let mut display = SentenceDisplay::new(&block).with_concepts();
        display.include(Span::new(SentenceId(2), 0, 1, Label::Accept).unwrap());

        insta::assert_snapshot!(display, @r###"
        A jury of peers.
        ╰accept
          ╰──╯concept [jury]
                  ╰───╯concept [peers]
        "###);
    }

    #[test]
    fn test_wide_characters_shift_columns() {
        let block = SentenceBlock::new(3, "東京 is big");
        let mut display = SentenceDisplay::new(&block);
        display.include(Span::new(SentenceId(3), 0, 2, Label::Concept).unwrap());
        display.include(Span::new(SentenceId(3), 6, 9, Label::Reject).unwrap());
        // Spans of other sentences are ignored.
        display.include(Span::new(SentenceId(4), 0, 2, Label::Accept).unwrap());

        insta::assert_snapshot!(display, @r###"
        東京 is big
        ╰──╯concept
                ╰─╯reject
        "###);
    }
}
