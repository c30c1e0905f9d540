// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Structured representation of a parsed feature document.
//!
//! A [`Document`] is an ordered sequence of [`Feature`]s, each grouping
//! [`Scenario`]s, each an ordered sequence of [`Step`]s. Everything here is
//! immutable once produced by the [`parser`].
//!
//! [`parser`]: crate::parser

use std::{collections::HashMap, fmt};

use derive_more::with_trait::Display;

/// Primary keyword category of a [`Step`] or a [`Template`].
///
/// Matching never crosses categories: a template registered under
/// [`Category::Given`] is never a candidate for a `Then` step, even if the
/// phrase text is identical.
///
/// [`Template`]: crate::template::Template
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Category {
    /// `Given` steps and templates.
    #[display("Given")]
    Given,

    /// `When` steps and templates.
    #[display("When")]
    When,

    /// `Then` steps and templates.
    #[display("Then")]
    Then,
}

/// Keyword as it appears on a step line.
///
/// `And`/`But` are continuations: for matching purposes they inherit the
/// nearest preceding primary keyword (see [`StepKeyword::primary`]).
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum StepKeyword {
    /// `Given` keyword.
    #[display("Given")]
    Given,

    /// `When` keyword.
    #[display("When")]
    When,

    /// `Then` keyword.
    #[display("Then")]
    Then,

    /// `And` continuation keyword.
    #[display("And")]
    And,

    /// `But` continuation keyword.
    #[display("But")]
    But,
}

impl StepKeyword {
    /// Returns the [`Category`] this keyword denotes, or [`None`] for a
    /// continuation keyword.
    #[must_use]
    pub const fn primary(self) -> Option<Category> {
        match self {
            Self::Given => Some(Category::Given),
            Self::When => Some(Category::When),
            Self::Then => Some(Category::Then),
            Self::And | Self::But => None,
        }
    }

    /// Indicates whether this keyword is a continuation (`And`/`But`).
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        self.primary().is_none()
    }
}

/// Tabular payload attached to a [`Step`].
///
/// Rows are ordered; the first row is conventionally a header of column
/// names.
///
/// # Example
///
/// ```rust
/// use feature_verifier::Table;
///
/// let table = Table::new(vec![
///     vec!["name".to_owned(), "value".to_owned()],
///     vec!["Origin-Host".to_owned(), "epc.example".to_owned()],
/// ]);
/// assert_eq!(table.header(), Some(&["name".to_owned(), "value".to_owned()][..]));
/// assert_eq!(table.hashes()[0]["name"], "Origin-Host");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a new [`Table`] from ordered rows of ordered columns.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Returns all rows, including the header row.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the header row, if the table is non-empty.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Returns the body rows keyed by the header row's column names.
    ///
    /// Rows shorter than the header omit the missing columns.
    #[must_use]
    pub fn hashes(&self) -> Vec<HashMap<String, String>> {
        let Some(header) = self.header() else {
            return Vec::new();
        };
        self.rows[1..]
            .iter()
            .map(|row| {
                header
                    .iter()
                    .zip(row)
                    .map(|(key, cell)| (key.clone(), cell.clone()))
                    .collect()
            })
            .collect()
    }
}

/// Payload attached to a [`Step`]: either a free-form text block or a
/// [`Table`]. At most one payload may attach to a given step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    /// Free-form text block delimited by `"""` (or `'''`) markers.
    DocString(String),

    /// Pipe-delimited tabular block.
    Table(Table),
}

impl Payload {
    /// Returns the kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::DocString(_) => PayloadKind::DocString,
            Self::Table(_) => PayloadKind::Table,
        }
    }
}

/// Kind of a [`Payload`], without its content.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PayloadKind {
    /// Free-form text block.
    DocString,

    /// Tabular block.
    Table,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocString => write!(f, "text block"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Single parsed step of a [`Scenario`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// Keyword as written in the source line.
    pub keyword: StepKeyword,

    /// Resolved primary [`Category`] (inherited from the nearest preceding
    /// primary keyword for `And`/`But` steps).
    pub category: Category,

    /// Step phrase, with the keyword stripped.
    pub text: String,

    /// Optional attached [`Payload`].
    pub payload: Option<Payload>,

    /// 1-based line number of the step line in the source text.
    pub line: usize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword, self.text)
    }
}

/// Named, ordered sequence of [`Step`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scenario {
    /// Name following the `Scenario:` keyword.
    pub name: String,

    /// Tags attached to this scenario (without the leading `@`).
    pub tags: Vec<String>,

    /// Steps in document order. Order is significant: continuation keywords
    /// carry implicit anchoring to the preceding primary keyword.
    pub steps: Vec<Step>,
}

/// Named group of [`Scenario`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Feature {
    /// Name following the `Feature:` keyword.
    pub name: String,

    /// Tags attached to this feature (without the leading `@`).
    pub tags: Vec<String>,

    /// Free-form description lines between the `Feature:` line and the
    /// first tag or scenario.
    pub description: Vec<String>,

    /// Scenarios in document order.
    pub scenarios: Vec<Scenario>,
}

/// One parsed feature file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    /// Features in document order.
    pub features: Vec<Feature>,
}

impl Document {
    /// Returns the total number of [`Step`]s across all features.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.features
            .iter()
            .flat_map(|f| &f.scenarios)
            .map(|s| s.steps.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_keywords_have_no_primary_category() {
        assert_eq!(StepKeyword::Given.primary(), Some(Category::Given));
        assert_eq!(StepKeyword::And.primary(), None);
        assert!(StepKeyword::But.is_continuation());
        assert!(!StepKeyword::Then.is_continuation());
    }

    #[test]
    fn category_and_keyword_render_as_source_keywords() {
        assert_eq!(Category::Given.to_string(), "Given");
        assert_eq!(StepKeyword::But.to_string(), "But");
    }

    #[test]
    fn table_hashes_key_rows_by_header() {
        let table = Table::new(vec![
            vec!["name".to_owned(), "value".to_owned()],
            vec!["Session-Id".to_owned(), "abc".to_owned()],
            vec!["Result-Code".to_owned(), "2001".to_owned()],
        ]);

        let hashes = table.hashes();
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0]["name"], "Session-Id");
        assert_eq!(hashes[1]["value"], "2001");
    }

    #[test]
    fn empty_table_has_no_header_and_no_hashes() {
        let table = Table::new(Vec::new());
        assert_eq!(table.header(), None);
        assert!(table.hashes().is_empty());
    }

    #[test]
    fn step_displays_with_its_written_keyword() {
        let step = Step {
            keyword: StepKeyword::And,
            category: Category::Given,
            text: "path is /subscribers".to_owned(),
            payload: None,
            line: 4,
        };
        assert_eq!(step.to_string(), "And path is /subscribers");
    }

    #[test]
    fn payload_kind_display() {
        assert_eq!(PayloadKind::DocString.to_string(), "text block");
        assert_eq!(PayloadKind::Table.to_string(), "table");
    }
}
