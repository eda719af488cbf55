//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Parsers for RESTCONF resource identifiers and YANG instance
//! identifiers, and the instance routes they produce.

use std::fmt;

use indexmap::IndexMap;

use crate::context::Context;
use crate::data::InstanceNode;
use crate::error::{Error, Result};
use crate::schema::{SchemaNode, SchemaNodeKind};
use crate::utils::percent_decode;
use crate::value::{InstanceName, Value};

/// An ordered sequence of selectors addressing an instance inside a data
/// tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceRoute {
    selectors: Vec<InstanceSelector>,
}

impl InstanceRoute {
    pub fn new() -> InstanceRoute {
        InstanceRoute::default()
    }

    pub fn push(&mut self, selector: InstanceSelector) {
        self.selectors.push(selector);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InstanceSelector> {
        self.selectors.iter()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl<'a> IntoIterator for &'a InstanceRoute {
    type Item = &'a InstanceSelector;
    type IntoIter = std::slice::Iter<'a, InstanceSelector>;

    fn into_iter(self) -> Self::IntoIter {
        self.selectors.iter()
    }
}

impl fmt::Display for InstanceRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selector in &self.selectors {
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

/// One step of an [`InstanceRoute`].
#[derive(Clone, Debug, PartialEq)]
pub enum InstanceSelector {
    /// Object member selected by its instance name.
    MemberName(InstanceName),
    /// Array entry selected by its (zero-based) index.
    EntryIndex(usize),
    /// Leaf-list entry selected by its value.
    EntryValue(Value),
    /// List entry selected by its key values.
    EntryKeys(IndexMap<InstanceName, Value>),
}

impl InstanceSelector {
    /// Apply the selector to a value. Never fails; an unmatched selector
    /// yields `None`.
    pub fn peek_step<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match self {
            InstanceSelector::MemberName(name) => {
                value.as_object()?.get(name)
            }
            InstanceSelector::EntryIndex(index) => {
                value.as_array()?.get(*index)
            }
            InstanceSelector::EntryValue(target) => {
                value.as_array()?.iter().find(|entry| *entry == target)
            }
            InstanceSelector::EntryKeys(keys) => {
                value.as_array()?.iter().find(|entry| {
                    match entry.as_object() {
                        Some(object) => keys
                            .iter()
                            .all(|(k, v)| object.get(k) == Some(v)),
                        None => false,
                    }
                })
            }
        }
    }

    /// Apply the selector to an instance node, moving the focus one step.
    pub fn goto_step<'a>(
        &self,
        inst: &InstanceNode<'a>,
    ) -> Result<InstanceNode<'a>> {
        match self {
            InstanceSelector::MemberName(name) => inst.member(name),
            InstanceSelector::EntryIndex(index) => {
                inst.entry(*index as isize)
            }
            InstanceSelector::EntryValue(target) => {
                let array = inst.value().as_array().ok_or_else(|| {
                    Error::instance_value(
                        inst.json_pointer(),
                        "entry of non-array",
                    )
                })?;
                let index = array
                    .iter()
                    .position(|entry| entry == target)
                    .ok_or_else(|| {
                        Error::nonexistent_instance(
                            inst.json_pointer(),
                            format!("entry '{}'", target.string_value()),
                        )
                    })?;
                inst.entry(index as isize)
            }
            InstanceSelector::EntryKeys(keys) => inst.look_up(keys),
        }
    }
}

impl fmt::Display for InstanceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceSelector::MemberName(name) => write!(f, "/{}", name),
            // Entry indexes are rendered one-based, as in the instance
            // identifier grammar.
            InstanceSelector::EntryIndex(index) => {
                write!(f, "[{}]", index + 1)
            }
            InstanceSelector::EntryValue(value) => {
                write!(f, "[.='{}']", value.string_value())
            }
            InstanceSelector::EntryKeys(keys) => {
                for (name, value) in keys {
                    write!(f, "[{}='{}']", name, value.string_value())?;
                }
                Ok(())
            }
        }
    }
}

/// Offset-tracking scanner shared by the identifier grammars.
#[derive(Debug)]
pub(crate) struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str) -> Parser<'a> {
        Parser { input, pos: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn peek(&self) -> Result<char> {
        self.peek_opt()
            .ok_or_else(|| Error::EndOfInput("more input".to_string()))
    }

    pub(crate) fn peek_opt(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    pub(crate) fn advance(&mut self) {
        if let Some(c) = self.peek_opt() {
            self.pos += c.len_utf8();
        }
    }

    pub(crate) fn char(&mut self, expected: char) -> Result<()> {
        match self.peek_opt() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(_) => Err(Error::unexpected_input(
                self.pos,
                format!("'{}'", expected),
            )),
            None => Err(Error::EndOfInput(format!("'{}'", expected))),
        }
    }

    pub(crate) fn one_of(&mut self, set: &str) -> Result<char> {
        match self.peek_opt() {
            Some(c) if set.contains(c) => {
                self.advance();
                Ok(c)
            }
            Some(_) => Err(Error::unexpected_input(
                self.pos,
                format!("one of '{}'", set),
            )),
            None => Err(Error::EndOfInput(format!("one of '{}'", set))),
        }
    }

    /// Text up to (and consuming) the `stop` character.
    pub(crate) fn up_to(&mut self, stop: char) -> Result<&'a str> {
        match self.input[self.pos..].find(stop) {
            Some(index) => {
                let text = &self.input[self.pos..self.pos + index];
                self.pos += index + stop.len_utf8();
                Ok(text)
            }
            None => Err(Error::EndOfInput(format!("'{}'", stop))),
        }
    }

    /// Text up to the `stop` character or the end of the input. The stop
    /// character, if found, is consumed; the flag tells which case
    /// happened.
    pub(crate) fn take_until(&mut self, stop: char) -> (&'a str, bool) {
        match self.input[self.pos..].find(stop) {
            Some(index) => {
                let text = &self.input[self.pos..self.pos + index];
                self.pos += index + stop.len_utf8();
                (text, true)
            }
            None => {
                let text = &self.input[self.pos..];
                self.pos = self.input.len();
                (text, false)
            }
        }
    }

    pub(crate) fn skip_ws(&mut self) {
        while let Some(c) = self.peek_opt() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    pub(crate) fn unsigned_integer(&mut self) -> Result<u64> {
        let start = self.pos;
        while matches!(self.peek_opt(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| Error::unexpected_input(start, "unsigned integer"))
    }

    /// A YANG identifier.
    pub(crate) fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.peek_opt() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.advance(),
            Some(_) => {
                return Err(Error::unexpected_input(self.pos, "identifier"))
            }
            None => return Err(Error::EndOfInput("identifier".to_string())),
        }
        while let Some(c) = self.peek_opt() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(&self.input[start..self.pos])
    }

    pub(crate) fn save(&self) -> usize {
        self.pos
    }

    pub(crate) fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Consume `word` if it appears here as a whole word.
    pub(crate) fn accept_word(&mut self, word: &str) -> bool {
        let rest = &self.input[self.pos..];
        if let Some(after) = rest.strip_prefix(word) {
            let boundary = after.chars().next().map_or(true, |c| {
                !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            });
            if boundary {
                self.pos += word.len();
                return true;
            }
        }
        false
    }

    /// Consume `token` if the input continues with it.
    pub(crate) fn accept(&mut self, token: &str) -> bool {
        if self.input[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// The shared `[prefix:]local` member-name production.
    pub(crate) fn prefixed_name(
        &mut self,
    ) -> Result<(Option<&'a str>, &'a str)> {
        let first = self.identifier()?;
        if self.peek_opt() == Some(':') {
            self.advance();
            Ok((Some(first), self.identifier()?))
        } else {
            Ok((None, first))
        }
    }
}

/// Parser for RESTCONF resource identifiers (RFC 8040).
#[derive(Debug)]
pub struct ResourceIdParser;

impl ResourceIdParser {
    /// Parse a resource identifier against the schema of `context`.
    pub fn parse(context: &Context, text: &str) -> Result<InstanceRoute> {
        let mut parser = Parser::new(text);
        if parser.peek_opt() == Some('/') {
            parser.advance();
        }
        let mut route = InstanceRoute::new();
        let mut snode = context.schema();
        loop {
            let (member, cnode) = member_name(&mut parser, snode)?;
            route.push(member);
            if parser.at_end() {
                return Ok(route);
            }
            if parser.one_of("/=")? == '=' {
                let (selector, more) = key_values(&mut parser, cnode)?;
                route.push(selector);
                if !more {
                    return Ok(route);
                }
            }
            snode = cnode;
        }
    }
}

/// Parse the `=`-separated leaf-list value or list keys of one path step.
fn key_values(
    parser: &mut Parser<'_>,
    snode: SchemaNode<'_>,
) -> Result<(InstanceSelector, bool)> {
    let offset = parser.offset();
    let (text, more) = parser.take_until('/');
    if text.is_empty() {
        return Err(Error::unexpected_input(offset, "entry value or keys"));
    }
    match snode.kind() {
        SchemaNodeKind::LeafList => {
            let decoded = percent_decode(text)?;
            let value = snode
                .expect_dtype()?
                .parse_value(&decoded)
                .map_err(|e| e.with_path(&snode.path()))?;
            Ok((InstanceSelector::EntryValue(value), more))
        }
        SchemaNodeKind::List => {
            let parts: Vec<&str> = text.split(',').collect();
            let keys = snode.keys();
            if parts.len() != keys.len() {
                return Err(Error::unexpected_input(
                    offset,
                    format!("exactly {} keys", keys.len()),
                ));
            }
            let mut map = IndexMap::new();
            for ((kname, kns), part) in keys.iter().zip(parts) {
                let knode = snode
                    .get_data_child(kname, kns.as_deref())
                    .ok_or_else(|| Error::NonexistentSchemaNode {
                        name: kname.clone(),
                        ns: kns.clone(),
                    })?;
                let decoded = percent_decode(part)?;
                let value = knode
                    .expect_dtype()?
                    .parse_value(&decoded)
                    .map_err(|e| e.with_path(&knode.path()))?;
                map.insert(knode.iname(), value);
            }
            Ok((InstanceSelector::EntryKeys(map), more))
        }
        _ => Err(Error::BadSchemaNodeType {
            path: snode.path(),
            expected: "list or leaf-list",
        }),
    }
}

/// Parser for YANG instance identifiers (RFC 7950, section 9.13).
#[derive(Debug)]
pub struct InstanceIdParser;

impl InstanceIdParser {
    /// Parse an instance identifier against the schema of `context`.
    pub fn parse(context: &Context, text: &str) -> Result<InstanceRoute> {
        let mut parser = Parser::new(text);
        let mut route = InstanceRoute::new();
        let mut snode = context.schema();
        loop {
            parser.char('/')?;
            let (member, cnode) = member_name(&mut parser, snode)?;
            route.push(member);
            if parser.at_end() {
                return Ok(route);
            }
            if parser.peek()? == '[' {
                parser.advance();
                parser.skip_ws();
                let next = parser.peek()?;
                if next.is_ascii_digit() {
                    let offset = parser.offset();
                    let index = parser.unsigned_integer()?;
                    if index < 1 {
                        return Err(Error::unexpected_input(
                            offset,
                            "positive index",
                        ));
                    }
                    parser.skip_ws();
                    parser.char(']')?;
                    route.push(InstanceSelector::EntryIndex(
                        (index - 1) as usize,
                    ));
                } else if cnode.kind() == SchemaNodeKind::LeafList {
                    parser.char('.')?;
                    let value = predicate_value(&mut parser, cnode)?;
                    route.push(InstanceSelector::EntryValue(value));
                } else {
                    route.push(key_predicates(&mut parser, cnode)?);
                }
                if parser.at_end() {
                    return Ok(route);
                }
            }
            snode = cnode;
        }
    }
}

/// Resolve one member name against the current schema node.
fn member_name<'a>(
    parser: &mut Parser<'_>,
    snode: SchemaNode<'a>,
) -> Result<(InstanceSelector, SchemaNode<'a>)> {
    let (prefix, name) = parser.prefixed_name()?;
    let cnode = snode.get_data_child(name, prefix).ok_or_else(|| {
        Error::NonexistentSchemaNode {
            name: name.to_string(),
            ns: prefix.map(str::to_string),
        }
    })?;
    Ok((InstanceSelector::MemberName(cnode.iname()), cnode))
}

/// Parse the `='value'` part of a predicate, including the closing
/// bracket, and convert the quoted text with the node's type.
fn predicate_value(
    parser: &mut Parser<'_>,
    tnode: SchemaNode<'_>,
) -> Result<Value> {
    parser.skip_ws();
    parser.char('=')?;
    parser.skip_ws();
    let quote = parser.one_of("'\"")?;
    let text = parser.up_to(quote)?;
    parser.skip_ws();
    parser.char(']')?;
    tnode
        .expect_dtype()?
        .parse_value(text)
        .map_err(|e| e.with_path(&tnode.path()))
}

/// Parse one or more `[prefix:name='value']` key predicates; the first
/// opening bracket is already consumed.
fn key_predicates(
    parser: &mut Parser<'_>,
    snode: SchemaNode<'_>,
) -> Result<InstanceSelector> {
    if snode.kind() != SchemaNodeKind::List {
        return Err(Error::BadSchemaNodeType {
            path: snode.path(),
            expected: "list",
        });
    }
    let mut map = IndexMap::new();
    loop {
        let (prefix, name) = parser.prefixed_name()?;
        let knode = snode.get_data_child(name, prefix).ok_or_else(|| {
            Error::NonexistentSchemaNode {
                name: name.to_string(),
                ns: prefix.map(str::to_string),
            }
        })?;
        let value = predicate_value(parser, knode)?;
        map.insert(knode.iname(), value);
        if parser.at_end() || parser.peek()? != '[' {
            break;
        }
        parser.advance();
        parser.skip_ws();
    }
    Ok(InstanceSelector::EntryKeys(map))
}
