// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Classification of parsed steps against a compiled catalog.
//!
//! For a [`Step`] of category `K`, candidate patterns are exactly those
//! compiled from templates registered under `K`. Every candidate is tested
//! and all full matches are collected, so more than one match is a
//! caller-visible [`MatchResult::Ambiguous`] rather than a silent
//! first-match preference: it usually indicates a catalog authoring defect,
//! not a document defect.

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

use crate::{
    catalog::{CompiledCatalog, CompiledPattern},
    document::{Payload, PayloadKind, Step},
    template::{ParamType, PayloadExpectation},
};

/// Typed value extracted for a placeholder when a step matches a template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// Capture of a `string` placeholder.
    String(String),

    /// Capture of an `int` placeholder.
    Integer(i64),

    /// Capture of an `enum(...)` placeholder: the matched literal.
    Enum(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) | Self::Enum(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

/// Extracted placeholder bindings of a unique match.
///
/// Keys are unique; iteration order is the placeholder order in the
/// template, which is the form a downstream harness consumes.
pub type Bindings = LinkedHashMap<String, Value>;

/// Classification of one [`Step`] against a [`CompiledCatalog`].
#[derive(Clone, Debug, PartialEq)]
pub enum MatchResult<'c> {
    /// No pattern of the step's category matches.
    Unmatched,

    /// Exactly one pattern matches.
    Unique {
        /// The matching pattern.
        pattern: &'c CompiledPattern,

        /// Typed bindings in placeholder order.
        bindings: Bindings,
    },

    /// More than one pattern matches.
    Ambiguous {
        /// Every matching pattern, sorted by phrase for stable reporting.
        patterns: Vec<&'c CompiledPattern>,
    },
}

/// Matches the given [`Step`] against the patterns of its category.
#[must_use]
pub fn match_step<'c>(
    catalog: &'c CompiledCatalog,
    step: &Step,
) -> MatchResult<'c> {
    let mut matches = catalog
        .patterns(step.category)
        .iter()
        .filter_map(|pattern| {
            try_match(pattern, step).map(|bindings| (pattern, bindings))
        })
        .collect::<Vec<_>>();

    match matches.len() {
        0 => MatchResult::Unmatched,
        // Instead of `.unwrap()` to avoid documenting `# Panics`.
        1 => {
            let (pattern, bindings) =
                matches.pop().unwrap_or_else(|| unreachable!());
            MatchResult::Unique { pattern, bindings }
        }
        _ => MatchResult::Ambiguous {
            patterns: matches
                .into_iter()
                .map(|(pattern, _)| pattern)
                .sorted_by_key(|p| p.phrase().to_owned())
                .collect(),
        },
    }
}

/// Tests one candidate pattern, extracting bindings on a full match.
///
/// The payload declaration gates candidacy: a pattern expecting a text
/// block or table does not match a step lacking one, which makes payload
/// shape a discriminator between otherwise-identical templates. The payload
/// *content* is never inspected here.
fn try_match(pattern: &CompiledPattern, step: &Step) -> Option<Bindings> {
    match (pattern.payload(), step.payload.as_ref().map(Payload::kind)) {
        (PayloadExpectation::Any, _) => {}
        (PayloadExpectation::DocString, Some(PayloadKind::DocString))
        | (PayloadExpectation::Table, Some(PayloadKind::Table)) => {}
        _ => return None,
    }

    let captures = pattern.regex().captures(&step.text)?;

    let mut bindings = Bindings::new();
    for placeholder in pattern.placeholders() {
        // A named group of a fully-matched pattern always captures.
        let raw = captures.name(&placeholder.name)?.as_str();
        let value = match &placeholder.ty {
            ParamType::String => Value::String(raw.to_owned()),
            // A digit run exceeding `i64` rejects the candidate, so that a
            // matched pattern always yields bindings.
            ParamType::Integer => Value::Integer(raw.parse().ok()?),
            ParamType::Enum(_) => Value::Enum(raw.to_owned()),
        };
        _ = bindings.insert(placeholder.name.clone(), value);
    }
    Some(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Category, StepKeyword};

    fn step(category: Category, text: &str) -> Step {
        Step {
            keyword: match category {
                Category::Given => StepKeyword::Given,
                Category::When => StepKeyword::When,
                Category::Then => StepKeyword::Then,
            },
            category,
            text: text.to_owned(),
            payload: None,
            line: 1,
        }
    }

    fn catalog(text: &str) -> CompiledCatalog {
        CompiledCatalog::compile(text).unwrap()
    }

    #[test]
    fn unique_match_binds_string_placeholder() {
        let catalog = catalog(
            "Given target type is {target}\nWhen we send {operation} request\n",
        );

        let result = match_step(&catalog, &step(Category::Given, "target type is EPC"));
        let MatchResult::Unique { pattern, bindings } = result else {
            panic!("expected unique match, got {result:?}");
        };
        assert_eq!(pattern.phrase(), "target type is {target}");
        assert_eq!(bindings["target"], Value::String("EPC".to_owned()));

        let result =
            match_step(&catalog, &step(Category::When, "we send POST request"));
        let MatchResult::Unique { bindings, .. } = result else {
            panic!("expected unique match, got {result:?}");
        };
        assert_eq!(bindings["operation"], Value::String("POST".to_owned()));
    }

    #[test]
    fn matching_never_crosses_categories() {
        let catalog = catalog("Given target type is {target}\n");
        let result =
            match_step(&catalog, &step(Category::Then, "target type is EPC"));
        assert_eq!(result, MatchResult::Unmatched);
    }

    #[test]
    fn truncated_phrase_is_unmatched() {
        // `{target}` requires a non-empty capture.
        let catalog = catalog("Given target type is {target}\n");
        let result =
            match_step(&catalog, &step(Category::Given, "target type is"));
        assert_eq!(result, MatchResult::Unmatched);
        let result =
            match_step(&catalog, &step(Category::Given, "target type is "));
        assert_eq!(result, MatchResult::Unmatched);
    }

    #[test]
    fn string_placeholder_is_greedy_up_to_trailing_literal() {
        let catalog =
            catalog("Then extract path from {property} and save as {name}\n");
        let result = match_step(
            &catalog,
            &step(
                Category::Then,
                "extract path from URI in content and save as redirect and save as target",
            ),
        );
        let MatchResult::Unique { bindings, .. } = result else {
            panic!("expected unique match, got {result:?}");
        };
        // Longest capture that still allows the trailing literal to match.
        assert_eq!(
            bindings["property"],
            Value::String(
                "URI in content and save as redirect".to_owned(),
            ),
        );
        assert_eq!(bindings["name"], Value::String("target".to_owned()));
    }

    #[test]
    fn ambiguous_match_lists_every_pattern() {
        let catalog = catalog(
            "Given target type is {target}\n\
             Given target type is {target}, {extra}\n",
        );
        let result = match_step(
            &catalog,
            &step(Category::Given, "target type is EPC, extra"),
        );
        let MatchResult::Ambiguous { patterns } = result else {
            panic!("expected ambiguous match, got {result:?}");
        };
        assert_eq!(
            patterns.iter().map(|p| p.phrase()).collect::<Vec<_>>(),
            vec![
                "target type is {target}",
                "target type is {target}, {extra}",
            ],
        );
    }

    #[test]
    fn integer_placeholder_rejects_non_digits() {
        let catalog = catalog("Then we expect response status code {status:int}\n");

        let result = match_step(
            &catalog,
            &step(Category::Then, "we expect response status code 204"),
        );
        let MatchResult::Unique { bindings, .. } = result else {
            panic!("expected unique match, got {result:?}");
        };
        assert_eq!(bindings["status"], Value::Integer(204));

        let result = match_step(
            &catalog,
            &step(Category::Then, "we expect response status code OK"),
        );
        assert_eq!(result, MatchResult::Unmatched);
    }

    #[test]
    fn integer_overflow_rejects_the_candidate() {
        let catalog = catalog("Then Sleep for {amount:int} seconds\n");
        let result = match_step(
            &catalog,
            &step(Category::Then, "Sleep for 99999999999999999999999999 seconds"),
        );
        assert_eq!(result, MatchResult::Unmatched);
    }

    #[test]
    fn enum_placeholder_matches_listed_literals_only() {
        let catalog = catalog(
            "Given callback request HTTP method {method:enum(POST|PUT|DELETE)}\n",
        );

        let result = match_step(
            &catalog,
            &step(Category::Given, "callback request HTTP method PUT"),
        );
        let MatchResult::Unique { bindings, .. } = result else {
            panic!("expected unique match, got {result:?}");
        };
        assert_eq!(bindings["method"], Value::Enum("PUT".to_owned()));

        let result = match_step(
            &catalog,
            &step(Category::Given, "callback request HTTP method PATCH"),
        );
        assert_eq!(result, MatchResult::Unmatched);
    }

    #[test]
    fn bindings_preserve_placeholder_order() {
        let catalog = catalog("Then we store key {token} value {fetched}\n");
        let result = match_step(
            &catalog,
            &step(Category::Then, "we store key access value xyz"),
        );
        let MatchResult::Unique { bindings, .. } = result else {
            panic!("expected unique match, got {result:?}");
        };
        assert_eq!(
            bindings.keys().collect::<Vec<_>>(),
            vec!["token", "fetched"],
        );
    }

    #[test]
    fn payload_expectation_discriminates_identical_phrases() {
        let catalog = catalog(
            "Given request content is :: text\n\
             Given request content is :: table\n",
        );

        let mut with_text = step(Category::Given, "request content is");
        with_text.payload = Some(Payload::DocString("body".to_owned()));
        let MatchResult::Unique { pattern, .. } =
            match_step(&catalog, &with_text)
        else {
            panic!("expected unique match");
        };
        assert_eq!(pattern.payload(), PayloadExpectation::DocString);

        // Neither template accepts a bare step.
        let bare = step(Category::Given, "request content is");
        assert_eq!(match_step(&catalog, &bare), MatchResult::Unmatched);
    }

    #[test]
    fn unannotated_template_ignores_payload_presence() {
        let catalog = catalog("Given request header is {header}\n");
        let mut with_table =
            step(Category::Given, "request header is Accept: text/plain");
        with_table.payload = Some(Payload::Table(crate::document::Table::new(
            vec![vec!["k".to_owned(), "v".to_owned()]],
        )));
        assert!(matches!(
            match_step(&catalog, &with_table),
            MatchResult::Unique { .. },
        ));
    }

    #[test]
    fn classification_is_independent_of_registration_order() {
        let forward = catalog(
            "Given target type is {target}\n\
             Given target tag is {tag}\n\
             Given path is {path}\n",
        );
        let reversed = catalog(
            "Given path is {path}\n\
             Given target tag is {tag}\n\
             Given target type is {target}\n",
        );

        for text in ["target type is IMS", "path is /x", "no such phrase"] {
            let s = step(Category::Given, text);
            assert_eq!(match_step(&forward, &s), match_step(&reversed, &s));
        }
    }

    #[test]
    fn generated_step_text_round_trips_to_its_template() {
        let catalog = catalog("Given {parameter} computed using {algorithm}\n");
        // Substituting boundary-free strings into the template's phrase
        // must match uniquely.
        let text = "OP-c computed using Milenage";
        let MatchResult::Unique { bindings, .. } =
            match_step(&catalog, &step(Category::Given, text))
        else {
            panic!("expected unique match");
        };
        assert_eq!(bindings["parameter"], Value::String("OP-c".to_owned()));
        assert_eq!(
            bindings["algorithm"],
            Value::String("Milenage".to_owned()),
        );
    }
}
