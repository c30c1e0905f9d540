// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Deterministic, line-oriented parser of feature-file text.
//!
//! Recognizes `Feature:`, `Scenario:`/`Scenario Outline:`, the step
//! keywords `Given`/`When`/`Then`/`And`/`But`, `@tag` lines, `#` comments,
//! `"""`/`'''` text blocks and `|`-delimited tables. Continuation steps
//! (`And`/`But`) inherit the nearest preceding primary keyword, which is
//! what the [matcher] later matches against. An `Examples:` section of a
//! `Scenario Outline` is accepted and its value table skipped: example
//! values substitute into `<param>` slots at execution time and so never
//! affect which template a step's text matches.
//!
//! Unrecognized lines are a [`ParseError`] with their line number, except
//! free description text directly under a `Feature:` line. A parse error
//! aborts the affected file only; sibling files in a batch proceed.
//!
//! [matcher]: crate::matcher

use lazy_regex::regex_captures;

use crate::{
    document::{
        Category, Document, Feature, Payload, Scenario, Step, StepKeyword,
        Table,
    },
    error::ParseError,
};

/// Parses feature-file text into a [`Document`].
///
/// # Errors
///
/// [`ParseError`] with the offending 1-based line number if the text is not
/// a well-formed feature document.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    Parser::new(input).run()
}

struct Parser<'s> {
    lines: Vec<&'s str>,
    pos: usize,
    features: Vec<Feature>,
    /// Tags seen since the last `Feature:`/`Scenario:` line, with the line
    /// number of the first of them.
    pending_tags: Option<(usize, Vec<String>)>,
    /// Nearest preceding primary keyword within the current scenario.
    last_primary: Option<Category>,
    /// Whether a payload block may still attach to the last parsed step.
    step_open: bool,
    /// Whether free text is currently a feature description.
    in_description: bool,
    /// Whether the current scenario is a `Scenario Outline`.
    outline_open: bool,
    /// Whether a `|` row belongs to an `Examples:` value table.
    in_examples: bool,
}

impl<'s> Parser<'s> {
    fn new(input: &'s str) -> Self {
        Self {
            lines: input.lines().collect(),
            pos: 0,
            features: Vec::new(),
            pending_tags: None,
            last_primary: None,
            step_open: false,
            in_description: false,
            outline_open: false,
            in_examples: false,
        }
    }

    fn run(mut self) -> Result<Document, ParseError> {
        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            let lineno = self.pos + 1;
            self.pos += 1;

            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('@') {
                self.tag_line(lineno, line)?;
            } else if let Some((_, name)) =
                regex_captures!(r"^Feature:\s*(.*)$", line)
            {
                self.begin_feature(name.trim());
            } else if let Some((_, keyword, name)) =
                regex_captures!(r"^(Scenario Outline|Scenario):\s*(.*)$", line)
            {
                self.begin_scenario(
                    lineno,
                    name.trim(),
                    keyword == "Scenario Outline",
                )?;
            } else if line.starts_with("Examples:") {
                self.begin_examples(lineno)?;
            } else if let Some((_, keyword, text)) =
                regex_captures!(r"^(Given|When|Then|And|But)\s+(.+)$", line)
            {
                self.step_line(lineno, keyword, text.trim())?;
            } else if line.starts_with("\"\"\"") || line.starts_with("'''") {
                // An opener may carry a content-type suffix (`"""json`).
                let marker = &line[..3];
                self.doc_string(lineno, raw, marker)?;
            } else if line.starts_with('|') {
                if self.in_examples {
                    self.skip_example_rows();
                } else {
                    self.table(lineno, line)?;
                }
            } else if self.in_description {
                if let Some(feature) = self.features.last_mut() {
                    feature.description.push(line.to_owned());
                }
            } else {
                return Err(ParseError::new(
                    lineno,
                    format!("unrecognized line: `{line}`"),
                ));
            }
        }

        if let Some((lineno, tags)) = self.pending_tags.take() {
            return Err(ParseError::new(
                lineno,
                format!(
                    "tags not attached to a Feature or Scenario: @{}",
                    tags.join(" @"),
                ),
            ));
        }
        Ok(Document {
            features: self.features,
        })
    }

    fn tag_line(&mut self, lineno: usize, line: &str) -> Result<(), ParseError> {
        self.in_description = false;
        self.step_open = false;
        self.in_examples = false;

        let (_, tags) = self
            .pending_tags
            .get_or_insert_with(|| (lineno, Vec::new()));
        for token in line.split_whitespace() {
            let Some(name) = token.strip_prefix('@').filter(|n| !n.is_empty())
            else {
                return Err(ParseError::new(
                    lineno,
                    format!("malformed tag `{token}`"),
                ));
            };
            tags.push(name.to_owned());
        }
        Ok(())
    }

    fn begin_feature(&mut self, name: &str) {
        let tags = self.pending_tags.take().map(|(_, t)| t).unwrap_or_default();
        self.features.push(Feature {
            name: name.to_owned(),
            tags,
            description: Vec::new(),
            scenarios: Vec::new(),
        });
        self.last_primary = None;
        self.step_open = false;
        self.in_description = true;
        self.outline_open = false;
        self.in_examples = false;
    }

    fn begin_scenario(
        &mut self,
        lineno: usize,
        name: &str,
        outline: bool,
    ) -> Result<(), ParseError> {
        let tags = self.pending_tags.take().map(|(_, t)| t).unwrap_or_default();
        let Some(feature) = self.features.last_mut() else {
            return Err(ParseError::new(
                lineno,
                "Scenario outside of a Feature",
            ));
        };
        feature.scenarios.push(Scenario {
            name: name.to_owned(),
            tags,
            steps: Vec::new(),
        });
        self.last_primary = None;
        self.step_open = false;
        self.in_description = false;
        self.outline_open = outline;
        self.in_examples = false;
        Ok(())
    }

    /// Opens an `Examples:` section of a `Scenario Outline`, so that the
    /// value table that follows is skipped instead of attached as a step
    /// payload.
    fn begin_examples(&mut self, lineno: usize) -> Result<(), ParseError> {
        if !self.outline_open {
            return Err(ParseError::new(
                lineno,
                "Examples outside of a Scenario Outline",
            ));
        }
        self.step_open = false;
        self.in_description = false;
        self.in_examples = true;
        Ok(())
    }

    /// Consumes the remaining `|` rows of an `Examples:` value table.
    fn skip_example_rows(&mut self) {
        while self
            .lines
            .get(self.pos)
            .is_some_and(|l| l.trim().starts_with('|'))
        {
            self.pos += 1;
        }
    }

    fn step_line(
        &mut self,
        lineno: usize,
        keyword: &str,
        text: &str,
    ) -> Result<(), ParseError> {
        let keyword = match keyword {
            "Given" => StepKeyword::Given,
            "When" => StepKeyword::When,
            "Then" => StepKeyword::Then,
            "And" => StepKeyword::And,
            _ => StepKeyword::But,
        };
        let category = match keyword.primary() {
            Some(primary) => primary,
            None => self.last_primary.ok_or_else(|| {
                ParseError::new(
                    lineno,
                    format!(
                        "continuation step `{keyword}` has no preceding \
                         Given/When/Then",
                    ),
                )
            })?,
        };

        let scenario = self.current_scenario().ok_or_else(|| {
            ParseError::new(lineno, "step outside of a Scenario")
        })?;
        scenario.steps.push(Step {
            keyword,
            category,
            text: text.to_owned(),
            payload: None,
            line: lineno,
        });

        self.last_primary = Some(category);
        self.step_open = true;
        self.in_description = false;
        self.in_examples = false;
        Ok(())
    }

    /// Consumes a `"""`/`'''` block opened at `lineno` and attaches it to
    /// the last step. Content is taken verbatim, with the opening marker's
    /// indentation stripped.
    fn doc_string(
        &mut self,
        lineno: usize,
        raw: &str,
        marker: &str,
    ) -> Result<(), ParseError> {
        let indent_len = raw.len() - raw.trim_start().len();
        let indent = &raw[..indent_len];

        let mut content = Vec::new();
        loop {
            let Some(&body) = self.lines.get(self.pos) else {
                return Err(ParseError::new(
                    lineno,
                    format!("unterminated `{marker}` text block"),
                ));
            };
            self.pos += 1;
            if body.trim() == marker {
                break;
            }
            content
                .push(body.strip_prefix(indent).unwrap_or(body).to_owned());
        }

        self.attach_payload(lineno, Payload::DocString(content.join("\n")))
    }

    /// Consumes consecutive `|` rows starting at `lineno` and attaches the
    /// table to the last step. Every row must close with `|` and all rows
    /// must have the same column count; violations report the table's
    /// starting line.
    fn table(&mut self, lineno: usize, first: &str) -> Result<(), ParseError> {
        let mut rows = vec![table_row(lineno, first)?];
        while let Some(line) =
            self.lines.get(self.pos).map(|l| l.trim()).filter(|l| l.starts_with('|'))
        {
            rows.push(table_row(lineno, line)?);
            self.pos += 1;
        }

        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(ParseError::new(
                lineno,
                "table rows have differing column counts",
            ));
        }
        self.attach_payload(lineno, Payload::Table(Table::new(rows)))
    }

    fn attach_payload(
        &mut self,
        lineno: usize,
        payload: Payload,
    ) -> Result<(), ParseError> {
        let kind = payload.kind();
        let step = self
            .step_open
            .then(|| self.current_scenario()?.steps.last_mut())
            .flatten()
            .ok_or_else(|| {
                ParseError::new(
                    lineno,
                    format!("{kind} does not follow a step"),
                )
            })?;
        if step.payload.is_some() {
            return Err(ParseError::new(
                lineno,
                format!("step `{step}` already has a payload"),
            ));
        }
        step.payload = Some(payload);
        Ok(())
    }

    fn current_scenario(&mut self) -> Option<&mut Scenario> {
        self.features.last_mut()?.scenarios.last_mut()
    }
}

/// Splits one `| a | b |` row into trimmed cells.
fn table_row(table_line: usize, row: &str) -> Result<Vec<String>, ParseError> {
    let Some(inner) = row
        .strip_prefix('|')
        .and_then(|r| r.strip_suffix('|'))
    else {
        return Err(ParseError::new(
            table_line,
            "unterminated table row (missing closing `|`)",
        ));
    };
    Ok(inner.split('|').map(|cell| cell.trim().to_owned()).collect())
}
