// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Aggregation of per-step match results into a verification outcome.
//!
//! [`verify`] traverses a parseable document to the end even after finding
//! errors, so a single invocation reports *all* defects of a document, not
//! just the first. A document passes iff it produced zero error
//! [`Diagnostic`]s.

use std::fmt;

use derive_more::with_trait::Display;
use itertools::Itertools as _;

use crate::{
    catalog::CompiledCatalog,
    document::Document,
    error::ParseError,
    matcher::{match_step, MatchResult},
    parser,
};

/// Severity of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// Fails verification of the document.
    Error,

    /// Reported, but does not fail verification.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Kind of a step [`Diagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticKind {
    /// Step text matched zero catalog templates in its category.
    UndefinedStep,

    /// Step text matched more than one catalog template.
    AmbiguousStep,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedStep => write!(f, "undefined step"),
            Self::AmbiguousStep => write!(f, "ambiguous step"),
        }
    }
}

/// One located verification finding.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(
    "{severity}: {kind} at line {line} \
     (Feature: {feature} / Scenario: {scenario}, step {step_index}): \
     {message}"
)]
pub struct Diagnostic {
    /// Severity of the finding.
    pub severity: Severity,

    /// Kind of the finding.
    pub kind: DiagnosticKind,

    /// Name of the containing feature.
    pub feature: String,

    /// Name of the containing scenario.
    pub scenario: String,

    /// 0-based index of the step within its scenario.
    pub step_index: usize,

    /// 1-based source line of the step.
    pub line: usize,

    /// Human-readable remediation message.
    pub message: String,
}

/// Per-document match counters, in document order of discovery.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of uniquely matched steps.
    pub matched: usize,

    /// Number of steps matching zero templates.
    pub undefined: usize,

    /// Number of steps matching more than one template.
    pub ambiguous: usize,
}

impl Stats {
    /// Creates a new [`Stats`] with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            matched: 0,
            undefined: 0,
            ambiguous: 0,
        }
    }

    /// Total number of steps these [`Stats`] were collected over.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.matched + self.undefined + self.ambiguous
    }
}

/// Outcome of verifying one document against a catalog.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationOutcome {
    /// Every step matched exactly one template.
    Passed {
        /// Match counters of the document.
        stats: Stats,
    },

    /// The document parsed, but contains undefined or ambiguous steps.
    Failed {
        /// Match counters of the document.
        stats: Stats,

        /// All error diagnostics, in document order.
        diagnostics: Vec<Diagnostic>,
    },

    /// The document itself is not parseable. Remediation differs from
    /// [`VerificationOutcome::Failed`]: the feature file is broken, not the
    /// catalog vocabulary.
    Malformed {
        /// The parse error, located by line.
        error: ParseError,
    },
}

impl VerificationOutcome {
    /// Indicates whether this outcome is a pass.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Verifies document text against the given catalog.
///
/// Parses the text, matches every step in document order against the
/// catalog, and aggregates the results. Pure: no I/O, no side effects; the
/// catalog is only read.
#[must_use]
pub fn verify(
    document_text: &str,
    catalog: &CompiledCatalog,
) -> VerificationOutcome {
    let document = match parser::parse(document_text) {
        Ok(doc) => doc,
        Err(error) => return VerificationOutcome::Malformed { error },
    };
    verify_document(&document, catalog)
}

/// Verifies an already-parsed [`Document`].
#[must_use]
pub fn verify_document(
    document: &Document,
    catalog: &CompiledCatalog,
) -> VerificationOutcome {
    let mut stats = Stats::new();
    let mut diagnostics = Vec::new();

    for feature in &document.features {
        for scenario in &feature.scenarios {
            for (step_index, step) in scenario.steps.iter().enumerate() {
                match match_step(catalog, step) {
                    MatchResult::Unique { .. } => stats.matched += 1,
                    MatchResult::Unmatched => {
                        stats.undefined += 1;
                        diagnostics.push(Diagnostic {
                            severity: Severity::Error,
                            kind: DiagnosticKind::UndefinedStep,
                            feature: feature.name.clone(),
                            scenario: scenario.name.clone(),
                            step_index,
                            line: step.line,
                            message: format!(
                                "no {} template matches `{step}`",
                                step.category,
                            ),
                        });
                    }
                    MatchResult::Ambiguous { patterns } => {
                        stats.ambiguous += 1;
                        diagnostics.push(Diagnostic {
                            severity: Severity::Error,
                            kind: DiagnosticKind::AmbiguousStep,
                            feature: feature.name.clone(),
                            scenario: scenario.name.clone(),
                            step_index,
                            line: step.line,
                            message: format!(
                                "`{step}` matches {} templates: {}",
                                patterns.len(),
                                patterns
                                    .iter()
                                    .map(|p| format!("`{}`", p.phrase()))
                                    .join(", "),
                            ),
                        });
                    }
                }
            }
        }
    }

    if diagnostics.is_empty() {
        VerificationOutcome::Passed { stats }
    } else {
        VerificationOutcome::Failed { stats, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CompiledCatalog {
        CompiledCatalog::compile(
            "Given target type is {target}\n\
             Given path is {path}\n\
             When we send {operation} request\n\
             Then we expect response status code {status:int}\n",
        )
        .unwrap()
    }

    const PASSING: &str = "\
Feature: Provisioning
  Scenario: Create
    Given target type is EPC
    And path is /subscribers
    When we send POST request
    Then we expect response status code 201
";

    #[test]
    fn well_formed_document_with_known_steps_passes() {
        let outcome = verify(PASSING, &catalog());
        assert_eq!(
            outcome,
            VerificationOutcome::Passed {
                stats: Stats {
                    matched: 4,
                    undefined: 0,
                    ambiguous: 0,
                },
            },
        );
    }

    #[test]
    fn undefined_steps_fail_with_located_diagnostics() {
        let text = "\
Feature: Provisioning
  Scenario: Create
    Given target type is EPC
    When we retry POST request
    Then we expect response status code 201
    And response body is empty
";
        let VerificationOutcome::Failed { stats, diagnostics } =
            verify(text, &catalog())
        else {
            panic!("expected failure");
        };

        assert_eq!(stats.matched, 2);
        assert_eq!(stats.undefined, 2);
        assert_eq!(diagnostics.len(), 2);

        // Diagnostics come in document order and keep traversing past the
        // first defect.
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UndefinedStep);
        assert_eq!(diagnostics[0].line, 4);
        assert_eq!(diagnostics[0].step_index, 1);
        assert_eq!(diagnostics[1].line, 6);
        assert_eq!(diagnostics[1].step_index, 3);
        assert!(diagnostics[1].message.contains("Then"));
        assert!(diagnostics[1]
            .message
            .contains("And response body is empty"));
    }

    #[test]
    fn ambiguous_steps_list_all_matching_phrases() {
        let catalog = CompiledCatalog::compile(
            "Given target type is {target}\n\
             Given target type is {target}, {extra}\n",
        )
        .unwrap();
        let text = "\
Feature: f
  Scenario: s
    Given target type is EPC, extra
";
        let VerificationOutcome::Failed { stats, diagnostics } =
            verify(text, &catalog)
        else {
            panic!("expected failure");
        };

        assert_eq!(stats.ambiguous, 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::AmbiguousStep);
        assert!(diagnostics[0].message.contains("2 templates"));
        assert!(diagnostics[0]
            .message
            .contains("`target type is {target}`"));
        assert!(diagnostics[0]
            .message
            .contains("`target type is {target}, {extra}`"));
    }

    #[test]
    fn unparseable_document_is_malformed_not_failed() {
        let outcome = verify("not a feature\n", &catalog());
        let VerificationOutcome::Malformed { error } = outcome else {
            panic!("expected malformed outcome");
        };
        assert_eq!(error.line, 1);
    }

    #[test]
    fn verifying_twice_yields_identical_outcomes() {
        let catalog = catalog();
        assert_eq!(verify(PASSING, &catalog), verify(PASSING, &catalog));
    }

    #[test]
    fn diagnostic_display_is_located() {
        let text = "\
Feature: Provisioning
  Scenario: Create
    Given undefined phrase
";
        let VerificationOutcome::Failed { diagnostics, .. } =
            verify(text, &catalog())
        else {
            panic!("expected failure");
        };
        let rendered = diagnostics[0].to_string();
        assert!(rendered.starts_with("error: undefined step at line 3"));
        assert!(rendered.contains("Feature: Provisioning"));
        assert!(rendered.contains("Scenario: Create"));
    }

    #[test]
    fn stats_total_sums_all_counters() {
        let stats = Stats {
            matched: 2,
            undefined: 1,
            ambiguous: 1,
        };
        assert_eq!(stats.total(), 4);
    }
}
