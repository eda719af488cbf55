//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Validator for JSON-encoded instance data against YANG data models.
//!
//! Given a YANG library description of a server's module set
//! ([RFC 7895]) and a JSON instance document ([RFC 7951]), yangson loads
//! the referenced modules, assembles a schema tree, and offers
//! navigation, mutation and validation of the instance data against that
//! tree.
//!
//! ## Design Goals
//! * A pure-Rust schema tree and instance model with no C library
//!   dependency
//! * Fully persistent instance data: every mutation returns a new root
//!   and the input stays valid, so documents can be shared freely across
//!   threads
//! * Addressing via both identifier grammars: RESTCONF resource
//!   identifiers and YANG instance identifiers
//!
//! [RFC 7895]: https://datatracker.ietf.org/doc/html/rfc7895
//! [RFC 7951]: https://datatracker.ietf.org/doc/html/rfc7951

mod error;
mod xpath;

pub mod context;
pub mod data;
pub mod iter;
pub mod path;
pub mod schema;
pub mod statement;
pub mod types;
pub mod utils;
pub mod value;

pub use crate::error::{Error, Result};
