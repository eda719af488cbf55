//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

use thiserror::Error;

/// A convenience wrapper around `Result` for `yangson::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum listing possible errors from yangson.
///
/// Several variants carry a structured cursor in addition to the
/// human-readable detail: a schema path, an instance JSON pointer, or an
/// input offset.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// The YANG library document is ill-formed or inconsistent.
    #[error("bad-yang-library: {0}")]
    BadYangLibrary(String),

    /// A feature required by an implemented module is unknown.
    #[error("feature-prerequisite-error: feature '{feature}' in module '{module}'")]
    FeaturePrerequisite { module: String, feature: String },

    /// Two revisions of the same module are marked as implemented.
    #[error("multiple-implemented-revisions: module '{0}'")]
    MultipleImplementedRevisions(String),

    /// A referenced module could not be found in the search path.
    #[error("module-not-found: '{name}'{}", fmt_revision(.revision))]
    ModuleNotFound {
        name: String,
        revision: Option<String>,
    },

    /// No schema node exists with the given name and namespace.
    #[error("nonexistent-schema-node: {}", fmt_qname(.ns, .name))]
    NonexistentSchemaNode { name: String, ns: Option<String> },

    /// The operation is inapplicable to this kind of schema node.
    #[error("bad-schema-node-type: {path} is not a {expected}")]
    BadSchemaNodeType {
        path: String,
        expected: &'static str,
    },

    /// An unknown object member was encountered while decoding raw data.
    #[error("raw-member-error: member '{member}' [{path}]")]
    RawMember { path: String, member: String },

    /// A raw value is not acceptable for the declared type.
    #[error("raw-type-error: {detail} [{path}]")]
    RawType { path: String, detail: String },

    /// Syntactic validation failure.
    #[error("schema-error: {detail} [{path}]")]
    Schema { path: String, detail: String },

    /// Semantic validation failure (`when`, `must`, leafref, identity).
    #[error("semantic-error: {detail} [{path}]")]
    Semantic { path: String, detail: String },

    /// The navigation target does not exist.
    #[error("nonexistent-instance: {detail} [{path}]")]
    NonexistentInstance { path: String, detail: String },

    /// The operation is inapplicable to the shape of the instance value.
    #[error("instance-value-error: {detail} [{path}]")]
    InstanceValue { path: String, detail: String },

    /// A parser met input it cannot accept.
    #[error("unexpected-input: expected {expected} at offset {offset}")]
    UnexpectedInput { offset: usize, expected: String },

    /// A parser ran out of input.
    #[error("end-of-input: expected {0}")]
    EndOfInput(String),
}

impl Error {
    pub(crate) fn raw_type(detail: impl Into<String>) -> Error {
        Error::RawType {
            path: String::new(),
            detail: detail.into(),
        }
    }

    pub(crate) fn schema(
        path: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        Error::Schema {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn semantic(
        path: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        Error::Semantic {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn nonexistent_instance(
        path: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        Error::NonexistentInstance {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn instance_value(
        path: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        Error::InstanceValue {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn unexpected_input(
        offset: usize,
        expected: impl Into<String>,
    ) -> Error {
        Error::UnexpectedInput {
            offset,
            expected: expected.into(),
        }
    }

    /// Fill in an empty structured cursor with the given path.
    pub(crate) fn with_path(mut self, new_path: &str) -> Error {
        match &mut self {
            Error::RawType { path, .. }
            | Error::Schema { path, .. }
            | Error::Semantic { path, .. }
            | Error::RawMember { path, .. }
            | Error::NonexistentInstance { path, .. }
            | Error::InstanceValue { path, .. }
                if path.is_empty() =>
            {
                *path = new_path.to_string();
            }
            _ => (),
        }
        self
    }
}

fn fmt_revision(revision: &Option<String>) -> String {
    match revision {
        Some(revision) => format!(" revision {}", revision),
        None => String::new(),
    }
}

fn fmt_qname(ns: &Option<String>, name: &str) -> String {
    match ns {
        Some(ns) => format!("{}:{}", ns, name),
        None => name.to_string(),
    }
}
