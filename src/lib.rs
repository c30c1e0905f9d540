// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Verifier for Gherkin-style feature files against a versioned catalog of
//! step templates.
//!
//! Guards a shared library of executable-specification documents from
//! drifting out of sync with the vocabulary a test-automation harness
//! understands: undefined and ambiguously-worded steps are caught before
//! they ever reach execution. Executing matched steps is explicitly not
//! this crate's concern; the harness stays a pluggable external
//! collaborator consuming [`MatchResult`] bindings.
//!
//! The surrounding system talks to the core through two operations:
//!
//! - [`CompiledCatalog::compile`] — once at process start;
//! - [`verify`] — once per feature file, read-only against the shared
//!   catalog.
//!
//! ```rust
//! use feature_verifier::{verify, CompiledCatalog, VerificationOutcome};
//!
//! let catalog = CompiledCatalog::compile(
//!     "Given target type is {target}\n\
//!      When we send {operation} request\n",
//! )?;
//!
//! let outcome = verify(
//!     "Feature: Provisioning\n\
//!     \x20 Scenario: Create\n\
//!     \x20   Given target type is EPC\n\
//!     \x20   When we send POST request\n",
//!     &catalog,
//! );
//! assert!(outcome.is_pass());
//! # Ok::<(), feature_verifier::CatalogError>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod document;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod report;
pub mod template;

/// Step catalog shipped with this crate, in the line format of
/// [`CompiledCatalog::compile`]. Data, not logic: the executable behavior
/// behind each phrase lives in the external harness.
pub const DEFAULT_CATALOG: &str = include_str!("../catalog/steps.catalog");

pub use self::{
    catalog::{CompiledCatalog, CompiledPattern},
    document::{
        Category, Document, Feature, Payload, PayloadKind, Scenario, Step,
        StepKeyword, Table,
    },
    error::{CatalogError, ParseError},
    matcher::{match_step, Bindings, MatchResult, Value},
    parser::parse,
    report::{
        verify, verify_document, Diagnostic, DiagnosticKind, Severity,
        Stats, VerificationOutcome,
    },
    template::{
        ParamType, PayloadExpectation, Placeholder, Segment, Template,
    },
};
