// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of catalog compilation and document parsing.
//!
//! [`CatalogError`]s are fatal: a broken catalog cannot safely verify
//! anything, so compilation is aborted and nothing is matched.
//! [`ParseError`]s are per-file: the affected document is reported as
//! malformed while its siblings in a batch proceed. Undefined and ambiguous
//! steps are not errors in this sense at all, but accumulated
//! [`Diagnostic`]s.
//!
//! [`Diagnostic`]: crate::report::Diagnostic

use derive_more::with_trait::{Display, Error};

use crate::document::Category;

/// Fatal error of compiling a step-template catalog.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum CatalogError {
    /// Two templates of the same [`Category`] have character-for-character
    /// equal literal segments, which would make every future match of that
    /// phrase ambiguous by construction.
    #[display(
        "duplicate {category} template: `{phrase}` is structurally \
         identical to `{existing}`"
    )]
    DuplicateTemplate {
        /// Category both templates are registered under.
        category: Category,

        /// Phrase of the template being registered.
        phrase: String,

        /// Phrase of the previously registered template.
        existing: String,
    },

    /// A template phrase contains a malformed placeholder.
    #[display("invalid placeholder in `{phrase}`: {reason}")]
    InvalidPlaceholder {
        /// Phrase of the offending template.
        phrase: String,

        /// What is wrong with the placeholder.
        reason: String,
    },

    /// A catalog line is not a valid `(category, phrase, payload)` entry.
    #[display("malformed catalog entry at line {line}: {reason}")]
    MalformedEntry {
        /// 1-based line number in the catalog text.
        line: usize,

        /// What is wrong with the entry.
        reason: String,
    },
}

impl CatalogError {
    /// Creates an [`CatalogError::InvalidPlaceholder`] for the given phrase.
    #[must_use]
    pub fn invalid_placeholder(
        phrase: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPlaceholder {
            phrase: phrase.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`CatalogError::MalformedEntry`] at the given line.
    #[must_use]
    pub fn malformed_entry(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            line,
            reason: reason.into(),
        }
    }
}

/// Error of parsing a feature document.
///
/// Aborts verification of the affected file only.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("malformed document at line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number the malformation was detected at. For block
    /// constructs (tables, text blocks) this is the line the block started
    /// on.
    pub line: usize,

    /// What is wrong with the document.
    pub reason: String,
}

impl ParseError {
    /// Creates a new [`ParseError`] at the given line.
    #[must_use]
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_template_display_names_both_phrases() {
        let err = CatalogError::DuplicateTemplate {
            category: Category::Given,
            phrase: "target type is {kind}".into(),
            existing: "target type is {target}".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("duplicate Given template"));
        assert!(msg.contains("target type is {kind}"));
        assert!(msg.contains("target type is {target}"));
    }

    #[test]
    fn parse_error_display_carries_line_number() {
        let err = ParseError::new(17, "unterminated table");
        assert_eq!(
            err.to_string(),
            "malformed document at line 17: unterminated table",
        );
    }

    #[test]
    fn catalog_error_is_std_error() {
        let err = CatalogError::malformed_entry(3, "no category keyword");
        let _: &dyn std::error::Error = &err;
    }
}
