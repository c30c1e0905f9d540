// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step templates and their placeholder grammar.
//!
//! A template phrase embeds placeholders with a `{name}` or `{name:type}`
//! notation:
//!
//! - `{target}` — untyped, defaults to [`ParamType::String`];
//! - `{interval:int}` — one or more decimal digits;
//! - `{method:enum(GET|POST|DELETE)}` — exactly one of the listed literals.
//!
//! [`Template::segments`] splits a phrase into alternating literal and
//! placeholder segments, validating the notation. [Compilation] of segments
//! into a matchable pattern lives in the [`catalog`] module.
//!
//! [Compilation]: crate::catalog::CompiledPattern
//! [`catalog`]: crate::catalog

use std::fmt;

use crate::{document::Category, error::CatalogError};

/// Declared type of a [`Placeholder`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamType {
    /// Greedy, non-empty run of characters up to the next literal boundary
    /// or end of phrase. The default when no type is annotated.
    String,

    /// One or more decimal digits.
    Integer,

    /// Exactly one of the listed literals.
    Enum(Vec<String>),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "int"),
            Self::Enum(lits) => write!(f, "enum({})", lits.join("|")),
        }
    }
}

/// Named, typed capture slot inside a [`Template`] phrase.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Placeholder {
    /// Placeholder name, an ASCII identifier unique within its template.
    pub name: String,

    /// Declared [`ParamType`].
    pub ty: ParamType,
}

/// Segment of a [`Template`] phrase: matched verbatim if literal, against
/// the type's token grammar if a placeholder.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    /// Literal run of characters, matched verbatim.
    Literal(String),

    /// Typed capture slot.
    Placeholder(Placeholder),
}

/// Payload declaration of a [`Template`].
///
/// An unannotated template does not inspect payloads at all. An annotated
/// one requires a payload of the declared kind to be present, which lets
/// two templates with identical phrases coexist and be discriminated by
/// payload shape.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PayloadExpectation {
    /// Payload presence is not part of the matching contract.
    #[default]
    Any,

    /// A free-form text block must be attached.
    DocString,

    /// A table must be attached.
    Table,
}

/// Catalog-registered phrase pattern with typed placeholders.
///
/// Templates are pure data: no executable behavior is attached, execution
/// being strictly the external harness's concern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    /// [`Category`] the template is registered under. Part of template
    /// identity: matching never crosses categories.
    pub category: Category,

    /// Human-authored phrase, placeholders included.
    pub phrase: String,

    /// Declared payload shape.
    pub payload: PayloadExpectation,
}

impl Template {
    /// Creates a new [`Template`].
    #[must_use]
    pub fn new(
        category: Category,
        phrase: impl Into<String>,
        payload: PayloadExpectation,
    ) -> Self {
        Self {
            category,
            phrase: phrase.into(),
            payload,
        }
    }

    /// Splits this template's phrase into alternating [`Segment`]s.
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidPlaceholder`] on an unclosed `{`, an empty or
    /// non-identifier name, a duplicate name, an unknown type annotation,
    /// or a malformed `enum(...)` literal list.
    pub fn segments(&self) -> Result<Vec<Segment>, CatalogError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut seen_names = Vec::<String>::new();

        let mut rest = self.phrase.as_str();
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                return Err(self.invalid("unclosed `{`"));
            };
            literal.push_str(&rest[..open]);
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let inner = &rest[open + 1..open + close];
            let placeholder = self.parse_placeholder(inner)?;
            if seen_names.contains(&placeholder.name) {
                return Err(self.invalid(format!(
                    "duplicate placeholder name `{}`",
                    placeholder.name,
                )));
            }
            seen_names.push(placeholder.name.clone());
            segments.push(Segment::Placeholder(placeholder));

            rest = &rest[open + close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(segments)
    }

    /// Parses the inside of a `{...}` placeholder.
    fn parse_placeholder(&self, inner: &str) -> Result<Placeholder, CatalogError> {
        let (name, ty) = match inner.split_once(':') {
            Some((name, ty)) => (name, Some(ty)),
            None => (inner, None),
        };

        if name.is_empty() {
            return Err(self.invalid("empty placeholder name"));
        }
        if !is_identifier(name) {
            return Err(self.invalid(format!(
                "placeholder name `{name}` is not an identifier",
            )));
        }

        let ty = match ty {
            None | Some("string") => ParamType::String,
            Some("int" | "integer") => ParamType::Integer,
            Some(spec) => self.parse_enum_type(name, spec)?,
        };

        Ok(Placeholder {
            name: name.to_owned(),
            ty,
        })
    }

    /// Parses an `enum(lit1|lit2|...)` type annotation.
    fn parse_enum_type(
        &self,
        name: &str,
        spec: &str,
    ) -> Result<ParamType, CatalogError> {
        let Some(list) = spec
            .strip_prefix("enum(")
            .and_then(|s| s.strip_suffix(')'))
        else {
            return Err(self.invalid(format!(
                "unknown type `{spec}` of placeholder `{name}`",
            )));
        };

        let literals: Vec<String> =
            list.split('|').map(str::to_owned).collect();
        if literals.iter().any(String::is_empty) {
            return Err(self.invalid(format!(
                "empty literal in enum placeholder `{name}`",
            )));
        }
        Ok(ParamType::Enum(literals))
    }

    fn invalid(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::invalid_placeholder(&self.phrase, reason)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
