// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compilation of a step-template catalog into matchable patterns.
//!
//! The catalog text is a declarative list of `(category, phrase, payload)`
//! entries, one per line:
//!
//! ```text
//! # HTTP
//! Given target type is {target}
//! When we send {operation} request
//! Given request content is :: text
//! Given Diameter request AVPs are :: table
//! ```
//!
//! Lines starting with `#` and blank lines are skipped. A trailing
//! ` :: text` or ` :: table` declares the expected payload shape; entries
//! without it do not inspect payloads.
//!
//! Each entry compiles into a [`CompiledPattern`]: an anchored [`Regex`]
//! whose named capture groups are the template's placeholders. The `string`
//! type expands to a greedy `.+`, so the engine picks the longest capture
//! that still lets all subsequent literal segments match. Two templates of
//! one category whose literal segments are character-for-character equal
//! are rejected as [`CatalogError::DuplicateTemplate`] at compile time,
//! regardless of placeholder naming.
//!
//! A [`CompiledCatalog`] is built once per verification run and is
//! read-only afterwards, so matching any number of documents against it
//! needs no locking.

use std::collections::HashMap;

use regex::Regex;

use crate::{
    document::Category,
    error::CatalogError,
    template::{
        ParamType, PayloadExpectation, Placeholder, Segment, Template,
    },
};

/// Matchable pattern compiled from a [`Template`].
///
/// Owns the matching automaton (an anchored [`Regex`]) and the ordered list
/// of placeholder names and types. Lives as long as its catalog.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    category: Category,
    phrase: String,
    payload: PayloadExpectation,
    regex: Regex,
    placeholders: Vec<Placeholder>,
    fingerprint: String,
}

// `Regex` itself is not comparable; two patterns are equal iff they were
// compiled from equal templates, which the regex source reflects.
impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category
            && self.phrase == other.phrase
            && self.payload == other.payload
            && self.regex.as_str() == other.regex.as_str()
            && self.placeholders == other.placeholders
            && self.fingerprint == other.fingerprint
    }
}

impl Eq for CompiledPattern {}

impl CompiledPattern {
    /// Compiles the given [`Template`] into a [`CompiledPattern`].
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidPlaceholder`] if the template's placeholder
    /// notation is malformed.
    pub fn compile(template: &Template) -> Result<Self, CatalogError> {
        let segments = template.segments()?;

        let mut source = String::from('^');
        let mut fingerprint = fingerprint_prefix(template);
        let mut placeholders = Vec::new();
        for segment in segments {
            match segment {
                Segment::Literal(lit) => {
                    source.push_str(&regex::escape(&lit));
                    fingerprint.push('\u{1}');
                    fingerprint.push_str(&lit);
                }
                Segment::Placeholder(ph) => {
                    source.push_str(&format!(
                        "(?P<{}>{})",
                        ph.name,
                        type_pattern(&ph.ty),
                    ));
                    fingerprint.push('\u{0}');
                    placeholders.push(ph);
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| {
            CatalogError::invalid_placeholder(&template.phrase, e.to_string())
        })?;

        Ok(Self {
            category: template.category,
            phrase: template.phrase.clone(),
            payload: template.payload,
            regex,
            placeholders,
            fingerprint,
        })
    }

    /// [`Category`] this pattern's template was registered under.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Human-authored template phrase this pattern was compiled from.
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Declared payload shape.
    #[must_use]
    pub const fn payload(&self) -> PayloadExpectation {
        self.payload
    }

    /// The matching automaton.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Placeholders in phrase order.
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Structural identity of this pattern: category, payload declaration
    /// and the literal segment sequence, with placeholder names and types
    /// excluded.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint_prefix(template: &Template) -> String {
    let payload = match template.payload {
        PayloadExpectation::Any => "any",
        PayloadExpectation::DocString => "text",
        PayloadExpectation::Table => "table",
    };
    format!("{}\u{2}{payload}\u{2}", template.category)
}

fn type_pattern(ty: &ParamType) -> String {
    match ty {
        ParamType::String => ".+".to_owned(),
        ParamType::Integer => "[0-9]+".to_owned(),
        ParamType::Enum(lits) => {
            itertools::join(lits.iter().map(|l| regex::escape(l)), "|")
        }
    }
}

/// Full, compiled set of templates available for matching in one
/// verification run.
///
/// Built once, published immutably, then shared read-only across every
/// document verified in the run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompiledCatalog {
    given: Vec<CompiledPattern>,
    when: Vec<CompiledPattern>,
    then: Vec<CompiledPattern>,
}

impl CompiledCatalog {
    /// Compiles catalog text in the line format described at the
    /// [module level](self).
    ///
    /// # Errors
    ///
    /// Any [`CatalogError`] aborts construction: a malformed catalog cannot
    /// safely verify anything.
    pub fn compile(catalog_text: &str) -> Result<Self, CatalogError> {
        let mut templates = Vec::new();
        for (idx, raw) in catalog_text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            templates.push(parse_entry(idx + 1, line)?);
        }
        Self::from_templates(templates)
    }

    /// Compiles an already-translated list of [`Template`]s.
    ///
    /// This is the seam for adapter layers whose catalog source is not the
    /// line format of [`CompiledCatalog::compile`].
    ///
    /// # Errors
    ///
    /// [`CatalogError::DuplicateTemplate`] if two templates of one category
    /// are structurally identical, or [`CatalogError::InvalidPlaceholder`]
    /// if a phrase is malformed.
    pub fn from_templates(
        templates: impl IntoIterator<Item = Template>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        let mut seen = HashMap::<String, String>::new();

        for template in templates {
            let pattern = CompiledPattern::compile(&template)?;
            if let Some(existing) = seen.insert(
                pattern.fingerprint().to_owned(),
                pattern.phrase().to_owned(),
            ) {
                return Err(CatalogError::DuplicateTemplate {
                    category: pattern.category(),
                    phrase: pattern.phrase().to_owned(),
                    existing,
                });
            }
            catalog.patterns_mut(pattern.category()).push(pattern);
        }
        Ok(catalog)
    }

    /// Returns the patterns registered under the given [`Category`].
    #[must_use]
    pub fn patterns(&self, category: Category) -> &[CompiledPattern] {
        match category {
            Category::Given => &self.given,
            Category::When => &self.when,
            Category::Then => &self.then,
        }
    }

    fn patterns_mut(&mut self, category: Category) -> &mut Vec<CompiledPattern> {
        match category {
            Category::Given => &mut self.given,
            Category::When => &mut self.when,
            Category::Then => &mut self.then,
        }
    }

    /// Total number of compiled patterns across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.given.len() + self.when.len() + self.then.len()
    }

    /// Indicates whether this catalog contains no patterns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses one non-blank, non-comment catalog line.
fn parse_entry(line: usize, entry: &str) -> Result<Template, CatalogError> {
    let (body, payload) = match entry.rsplit_once(" :: ") {
        Some((body, "text")) => (body, PayloadExpectation::DocString),
        Some((body, "table")) => (body, PayloadExpectation::Table),
        Some((_, other)) => {
            return Err(CatalogError::malformed_entry(
                line,
                format!("unknown payload annotation `{other}`"),
            ));
        }
        None => (entry, PayloadExpectation::Any),
    };

    let (category, phrase) = if let Some(rest) = body.strip_prefix("Given ") {
        (Category::Given, rest)
    } else if let Some(rest) = body.strip_prefix("When ") {
        (Category::When, rest)
    } else if let Some(rest) = body.strip_prefix("Then ") {
        (Category::Then, rest)
    } else {
        return Err(CatalogError::malformed_entry(
            line,
            "entry must start with `Given `, `When ` or `Then `",
        ));
    };

    let phrase = phrase.trim();
    if phrase.is_empty() {
        return Err(CatalogError::malformed_entry(line, "empty phrase"));
    }
    Ok(Template::new(category, phrase, payload))
}
