//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG built-in and derived data types.

use std::collections::BTreeSet;
use std::str::FromStr;

use base64::prelude::*;
use regex::Regex;
use rust_decimal::Decimal;

use crate::context::ModuleSet;
use crate::error::{Error, Result};
use crate::statement::Statement;
use crate::value::Value;
use crate::xpath::{self, LocationPath};

/// A set of allowed ranges, as restricted by `range` or `length`
/// statements.
#[derive(Clone, Debug)]
pub struct RangeSet<T> {
    parts: Vec<(T, T)>,
}

impl<T: Copy + PartialOrd> RangeSet<T> {
    pub(crate) fn single(min: T, max: T) -> RangeSet<T> {
        RangeSet {
            parts: vec![(min, max)],
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.parts
            .iter()
            .any(|(lo, hi)| *lo <= value && value <= *hi)
    }

    fn lower(&self) -> T {
        self.parts[0].0
    }

    fn upper(&self) -> T {
        self.parts[self.parts.len() - 1].1
    }

    /// Apply a `range`/`length` restriction such as `"1..10 | 15 | 20..max"`
    /// on top of the receiver. Bounds must lie within the base set.
    pub(crate) fn restricted(
        &self,
        spec: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<RangeSet<T>> {
        let invalid =
            || Error::BadYangLibrary(format!("invalid range '{}'", spec));
        let mut parts = Vec::new();
        for part in spec.split('|') {
            let part = part.trim();
            let (lo, hi) = match part.split_once("..") {
                Some((lo, hi)) => (lo.trim(), hi.trim()),
                None => (part, part),
            };
            let lo = if lo == "min" {
                self.lower()
            } else {
                parse(lo).ok_or_else(invalid)?
            };
            let hi = if hi == "max" {
                self.upper()
            } else {
                parse(hi).ok_or_else(invalid)?
            };
            if !(self.contains(lo) && self.contains(hi)) {
                return Err(Error::BadYangLibrary(format!(
                    "range '{}' exceeds the base type",
                    spec
                )));
            }
            parts.push((lo, hi));
        }
        if parts.is_empty() {
            return Err(invalid());
        }
        Ok(RangeSet { parts })
    }
}

/// A compiled `pattern` restriction. Patterns are anchored to the whole
/// value, as XSD regular expressions are.
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: Regex,
    invert: bool,
}

impl Pattern {
    fn compile(pattern: &str, invert: bool) -> Result<Pattern> {
        let regex =
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                Error::BadYangLibrary(format!(
                    "invalid pattern '{}': {}",
                    pattern, e
                ))
            })?;
        Ok(Pattern { regex, invert })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text) != self.invert
    }
}

/// One enumerator of an `enumeration` type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub value: i32,
}

/// One flag of a `bits` type.
#[derive(Clone, Debug, PartialEq)]
pub struct BitFlag {
    pub name: String,
    pub position: u32,
}

/// A resolved YANG data type: a built-in type with the cumulative
/// restrictions of its typedef chain applied.
#[derive(Clone, Debug)]
pub enum DataType {
    Boolean,
    Empty,
    Int8(RangeSet<i128>),
    Int16(RangeSet<i128>),
    Int32(RangeSet<i128>),
    Int64(RangeSet<i128>),
    Uint8(RangeSet<i128>),
    Uint16(RangeSet<i128>),
    Uint32(RangeSet<i128>),
    Uint64(RangeSet<i128>),
    Decimal64 {
        fraction_digits: u32,
        range: RangeSet<Decimal>,
    },
    String {
        length: RangeSet<i128>,
        patterns: Vec<Pattern>,
    },
    Binary {
        length: RangeSet<i128>,
    },
    Enumeration {
        variants: Vec<EnumVariant>,
    },
    Bits {
        flags: Vec<BitFlag>,
    },
    /// The admissible identities are precomputed at schema construction.
    IdentityRef {
        identities: BTreeSet<String>,
    },
    InstanceIdentifier {
        require_instance: bool,
    },
    LeafRef {
        path: LocationPath,
        require_instance: bool,
    },
    Union {
        members: Vec<DataType>,
    },
}

impl DataType {
    /// Name of the underlying built-in type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Empty => "empty",
            DataType::Int8(_) => "int8",
            DataType::Int16(_) => "int16",
            DataType::Int32(_) => "int32",
            DataType::Int64(_) => "int64",
            DataType::Uint8(_) => "uint8",
            DataType::Uint16(_) => "uint16",
            DataType::Uint32(_) => "uint32",
            DataType::Uint64(_) => "uint64",
            DataType::Decimal64 { .. } => "decimal64",
            DataType::String { .. } => "string",
            DataType::Binary { .. } => "binary",
            DataType::Enumeration { .. } => "enumeration",
            DataType::Bits { .. } => "bits",
            DataType::IdentityRef { .. } => "identityref",
            DataType::InstanceIdentifier { .. } => "instance-identifier",
            DataType::LeafRef { .. } => "leafref",
            DataType::Union { .. } => "union",
        }
    }

    /// Parse a textual value, applying all restrictions of the type.
    pub fn parse_value(&self, text: &str) -> Result<Value> {
        match self {
            DataType::Boolean => match text {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(Error::raw_type(format!(
                    "'{}' is not a boolean",
                    text
                ))),
            },
            DataType::Empty => {
                if text.is_empty() {
                    Ok(Value::Empty)
                } else {
                    Err(Error::raw_type("non-empty value of type 'empty'"))
                }
            }
            DataType::Int8(_)
            | DataType::Int16(_)
            | DataType::Int32(_)
            | DataType::Int64(_)
            | DataType::Uint8(_)
            | DataType::Uint16(_)
            | DataType::Uint32(_)
            | DataType::Uint64(_) => {
                let number = parse_i128(text).ok_or_else(|| {
                    Error::raw_type(format!("'{}' is not an integer", text))
                })?;
                self.int_from_i128(number)
            }
            DataType::Decimal64 {
                fraction_digits,
                range,
            } => {
                let mut decimal = Decimal::from_str(text).map_err(|_| {
                    Error::raw_type(format!("'{}' is not a decimal", text))
                })?;
                if decimal.scale() > *fraction_digits {
                    return Err(Error::raw_type(format!(
                        "'{}' has more than {} fraction digits",
                        text, fraction_digits
                    )));
                }
                decimal.rescale(*fraction_digits);
                if !range.contains(decimal) {
                    return Err(Error::raw_type(format!(
                        "'{}' is out of range",
                        text
                    )));
                }
                Ok(Value::Decimal(decimal))
            }
            DataType::String { length, patterns } => {
                if !length.contains(text.chars().count() as i128) {
                    return Err(Error::raw_type(format!(
                        "string length {} not allowed",
                        text.chars().count()
                    )));
                }
                for pattern in patterns {
                    if !pattern.matches(text) {
                        return Err(Error::raw_type(format!(
                            "'{}' does not match pattern",
                            text
                        )));
                    }
                }
                Ok(Value::String(text.to_string()))
            }
            DataType::Binary { length } => {
                let bytes = BASE64_STANDARD.decode(text).map_err(|_| {
                    Error::raw_type("invalid base64 data")
                })?;
                if !length.contains(bytes.len() as i128) {
                    return Err(Error::raw_type(format!(
                        "binary length {} not allowed",
                        bytes.len()
                    )));
                }
                Ok(Value::Binary(bytes))
            }
            DataType::Enumeration { variants } => {
                if variants.iter().any(|v| v.name == text) {
                    Ok(Value::Enum(text.to_string()))
                } else {
                    Err(Error::raw_type(format!(
                        "'{}' is not an enumerator",
                        text
                    )))
                }
            }
            DataType::Bits { flags } => {
                let mut present = Vec::new();
                for token in text.split_whitespace() {
                    let flag = flags
                        .iter()
                        .find(|f| f.name == token)
                        .ok_or_else(|| {
                            Error::raw_type(format!(
                                "'{}' is not a defined bit",
                                token
                            ))
                        })?;
                    if !present.contains(&(flag.position, flag.name.clone()))
                    {
                        present.push((flag.position, flag.name.clone()));
                    }
                }
                present.sort_by_key(|(position, _)| *position);
                Ok(Value::Bits(
                    present.into_iter().map(|(_, name)| name).collect(),
                ))
            }
            DataType::IdentityRef { identities } => {
                if text.contains(':') {
                    if identities.contains(text) {
                        Ok(Value::IdentityRef(text.to_string()))
                    } else {
                        Err(Error::raw_type(format!(
                            "'{}' is not a known identity",
                            text
                        )))
                    }
                } else {
                    let mut matches = identities.iter().filter(|q| {
                        q.split_once(':')
                            .map(|(_, local)| local == text)
                            .unwrap_or(false)
                    });
                    match (matches.next(), matches.next()) {
                        (Some(qname), None) => {
                            Ok(Value::IdentityRef(qname.clone()))
                        }
                        _ => Err(Error::raw_type(format!(
                            "'{}' is not a unique identity",
                            text
                        ))),
                    }
                }
            }
            DataType::InstanceIdentifier { .. } => {
                if text.starts_with('/') {
                    Ok(Value::InstanceId(text.to_string()))
                } else {
                    Err(Error::raw_type(format!(
                        "'{}' is not an instance identifier",
                        text
                    )))
                }
            }
            // Leafref values live in the textual space of their target.
            DataType::LeafRef { .. } => Ok(Value::String(text.to_string())),
            DataType::Union { members } => members
                .iter()
                .find_map(|member| member.parse_value(text).ok())
                .ok_or_else(|| {
                    Error::raw_type(format!(
                        "'{}' is not acceptable to any union member",
                        text
                    ))
                }),
        }
    }

    /// Canonical textual form of a value of this type.
    pub fn canonical_string(&self, value: &Value) -> String {
        match (self, value) {
            (
                DataType::Decimal64 {
                    fraction_digits, ..
                },
                Value::Decimal(decimal),
            ) => {
                let mut decimal = *decimal;
                decimal.rescale(*fraction_digits);
                decimal.to_string()
            }
            (DataType::Union { members }, value) => members
                .iter()
                .find(|member| member.check(value).is_ok())
                .map(|member| member.canonical_string(value))
                .unwrap_or_else(|| value.string_value()),
            _ => value.string_value(),
        }
    }

    /// Decode a value from its raw (JSON) form per RFC 7951.
    pub fn from_raw(&self, raw: &serde_json::Value) -> Result<Value> {
        match self {
            DataType::Boolean => match raw.as_bool() {
                Some(b) => Ok(Value::Boolean(b)),
                None => Err(Error::raw_type("expected a boolean")),
            },
            DataType::Int8(_)
            | DataType::Int16(_)
            | DataType::Int32(_)
            | DataType::Uint8(_)
            | DataType::Uint16(_)
            | DataType::Uint32(_) => {
                let number = json_to_i128(raw, false).ok_or_else(|| {
                    Error::raw_type("expected a number")
                })?;
                self.int_from_i128(number)
            }
            // 64-bit integers are encoded as JSON strings.
            DataType::Int64(_) | DataType::Uint64(_) => {
                let number = json_to_i128(raw, true).ok_or_else(|| {
                    Error::raw_type("expected a number or numeric string")
                })?;
                self.int_from_i128(number)
            }
            DataType::Decimal64 { .. } => match raw {
                serde_json::Value::String(text) => self.parse_value(text),
                serde_json::Value::Number(number) => {
                    self.parse_value(&number.to_string())
                }
                _ => Err(Error::raw_type("expected a decimal string")),
            },
            DataType::Empty => {
                let ok = matches!(raw.as_array(), Some(entries)
                    if entries.len() == 1 && entries[0].is_null());
                if ok {
                    Ok(Value::Empty)
                } else {
                    Err(Error::raw_type("expected [null]"))
                }
            }
            DataType::Union { members } => members
                .iter()
                .find_map(|member| member.from_raw(raw).ok())
                .ok_or_else(|| {
                    Error::raw_type(
                        "value not acceptable to any union member",
                    )
                }),
            // Leafrefs are encoded with the rules of their target type,
            // so any scalar form is carried over as text.
            DataType::LeafRef { .. } => match raw {
                serde_json::Value::String(text) => {
                    Ok(Value::String(text.clone()))
                }
                serde_json::Value::Number(number) => {
                    Ok(Value::String(number.to_string()))
                }
                serde_json::Value::Bool(b) => {
                    Ok(Value::String(b.to_string()))
                }
                _ => Err(Error::raw_type("expected a scalar leafref")),
            },
            _ => match raw.as_str() {
                Some(text) => self.parse_value(text),
                None => Err(Error::raw_type(format!(
                    "expected a string value of type {}",
                    self.name()
                ))),
            },
        }
    }

    /// Encode a value of this type into its raw (JSON) form.
    pub fn to_raw(&self, value: &Value) -> serde_json::Value {
        value.to_raw()
    }

    /// Re-check that a cooked value conforms to the type.
    pub(crate) fn check(&self, value: &Value) -> Result<()> {
        let mismatch =
            || Error::raw_type(format!("value is not a {}", self.name()));
        match (self, value) {
            (DataType::Boolean, Value::Boolean(_)) => Ok(()),
            (DataType::Empty, Value::Empty) => Ok(()),
            (DataType::Int8(range), Value::Int8(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Int16(range), Value::Int16(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Int32(range), Value::Int32(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Int64(range), Value::Int64(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Uint8(range), Value::Uint8(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Uint16(range), Value::Uint16(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Uint32(range), Value::Uint32(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Uint64(range), Value::Uint64(v)) => {
                check_range(range, *v as i128)
            }
            (DataType::Decimal64 { range, .. }, Value::Decimal(v)) => {
                if range.contains(*v) {
                    Ok(())
                } else {
                    Err(Error::raw_type("decimal out of range"))
                }
            }
            (DataType::String { length, patterns }, Value::String(s)) => {
                if !length.contains(s.chars().count() as i128) {
                    return Err(Error::raw_type("string length not allowed"));
                }
                for pattern in patterns {
                    if !pattern.matches(s) {
                        return Err(Error::raw_type(
                            "string does not match pattern",
                        ));
                    }
                }
                Ok(())
            }
            (DataType::Binary { length }, Value::Binary(bytes)) => {
                if length.contains(bytes.len() as i128) {
                    Ok(())
                } else {
                    Err(Error::raw_type("binary length not allowed"))
                }
            }
            (DataType::Enumeration { variants }, Value::Enum(name)) => {
                if variants.iter().any(|v| &v.name == name) {
                    Ok(())
                } else {
                    Err(Error::raw_type("unknown enumerator"))
                }
            }
            (DataType::Bits { flags }, Value::Bits(names)) => {
                for name in names {
                    if !flags.iter().any(|f| &f.name == name) {
                        return Err(Error::raw_type("unknown bit"));
                    }
                }
                Ok(())
            }
            (DataType::IdentityRef { identities }, Value::IdentityRef(q)) => {
                if identities.contains(q) {
                    Ok(())
                } else {
                    Err(Error::raw_type("unknown identity"))
                }
            }
            (DataType::InstanceIdentifier { .. }, Value::InstanceId(_)) => {
                Ok(())
            }
            (DataType::LeafRef { .. }, Value::String(_)) => Ok(()),
            (DataType::Union { members }, value) => {
                if members.iter().any(|m| m.check(value).is_ok()) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            _ => Err(mismatch()),
        }
    }

    /// Width and range checks shared by the integer types.
    fn int_from_i128(&self, number: i128) -> Result<Value> {
        let (range, lo, hi) = match self {
            DataType::Int8(r) => (r, i8::MIN as i128, i8::MAX as i128),
            DataType::Int16(r) => (r, i16::MIN as i128, i16::MAX as i128),
            DataType::Int32(r) => (r, i32::MIN as i128, i32::MAX as i128),
            DataType::Int64(r) => (r, i64::MIN as i128, i64::MAX as i128),
            DataType::Uint8(r) => (r, 0, u8::MAX as i128),
            DataType::Uint16(r) => (r, 0, u16::MAX as i128),
            DataType::Uint32(r) => (r, 0, u32::MAX as i128),
            DataType::Uint64(r) => (r, 0, u64::MAX as i128),
            _ => unreachable!("not an integer type"),
        };
        if number < lo || number > hi || !range.contains(number) {
            return Err(Error::raw_type(format!(
                "{} is out of range",
                number
            )));
        }
        Ok(match self {
            DataType::Int8(_) => Value::Int8(number as i8),
            DataType::Int16(_) => Value::Int16(number as i16),
            DataType::Int32(_) => Value::Int32(number as i32),
            DataType::Int64(_) => Value::Int64(number as i64),
            DataType::Uint8(_) => Value::Uint8(number as u8),
            DataType::Uint16(_) => Value::Uint16(number as u16),
            DataType::Uint32(_) => Value::Uint32(number as u32),
            DataType::Uint64(_) => Value::Uint64(number as u64),
            _ => unreachable!(),
        })
    }
}

fn check_range(range: &RangeSet<i128>, number: i128) -> Result<()> {
    if range.contains(number) {
        Ok(())
    } else {
        Err(Error::raw_type(format!("{} is out of range", number)))
    }
}

fn parse_i128(text: &str) -> Option<i128> {
    let text = text.strip_prefix('+').unwrap_or(text);
    <i128 as num_traits::Num>::from_str_radix(text, 10).ok()
}

fn json_to_i128(raw: &serde_json::Value, allow_string: bool) -> Option<i128> {
    match raw {
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(|n| n as i128)
            .or_else(|| number.as_u64().map(|n| n as i128)),
        serde_json::Value::String(text) if allow_string => parse_i128(text),
        _ => None,
    }
}

/// A type resolved from a `type` statement, together with the default
/// value inherited from the typedef chain (if any).
#[derive(Clone, Debug)]
pub(crate) struct ResolvedType {
    pub(crate) dtype: DataType,
    pub(crate) default: Option<String>,
}

/// Resolve a `type` statement in the context of module `mid`, following
/// typedef chains and applying restrictions cumulatively.
pub(crate) fn resolve_type(
    modules: &ModuleSet,
    mid: usize,
    stmt: &Statement,
) -> Result<ResolvedType> {
    resolve_type_depth(modules, mid, stmt, 0)
}

fn resolve_type_depth(
    modules: &ModuleSet,
    mid: usize,
    stmt: &Statement,
    depth: usize,
) -> Result<ResolvedType> {
    if depth > 32 {
        return Err(Error::BadYangLibrary(
            "typedef chain too deep (cycle?)".to_string(),
        ));
    }
    let name = stmt.expect_argument()?;
    if let Some(dtype) = builtin_type(modules, mid, name, stmt)? {
        return Ok(ResolvedType {
            dtype,
            default: None,
        });
    }

    // Not a built-in: resolve through a typedef.
    let (tmid, typedef) =
        modules.find_typedef(mid, name).ok_or_else(|| {
            Error::BadYangLibrary(format!("unknown type '{}'", name))
        })?;
    let base_stmt = typedef.find1("type").ok_or_else(|| {
        Error::BadYangLibrary(format!(
            "typedef '{}' without a type",
            name
        ))
    })?;
    let base = resolve_type_depth(modules, tmid, base_stmt, depth + 1)?;
    let dtype = apply_restrictions(modules, mid, base.dtype, stmt)?;
    let default = typedef
        .find1("default")
        .and_then(|s| s.argument())
        .map(str::to_string)
        .or(base.default);
    Ok(ResolvedType { dtype, default })
}

/// Build a built-in type with the restrictions given in `stmt`, or `None`
/// if `name` is not a built-in type.
fn builtin_type(
    modules: &ModuleSet,
    mid: usize,
    name: &str,
    stmt: &Statement,
) -> Result<Option<DataType>> {
    let full_length = || RangeSet::single(0, u64::MAX as i128);
    let base = match name {
        "boolean" => DataType::Boolean,
        "empty" => DataType::Empty,
        "int8" => {
            DataType::Int8(RangeSet::single(i8::MIN as i128, i8::MAX as i128))
        }
        "int16" => DataType::Int16(RangeSet::single(
            i16::MIN as i128,
            i16::MAX as i128,
        )),
        "int32" => DataType::Int32(RangeSet::single(
            i32::MIN as i128,
            i32::MAX as i128,
        )),
        "int64" => DataType::Int64(RangeSet::single(
            i64::MIN as i128,
            i64::MAX as i128,
        )),
        "uint8" => DataType::Uint8(RangeSet::single(0, u8::MAX as i128)),
        "uint16" => DataType::Uint16(RangeSet::single(0, u16::MAX as i128)),
        "uint32" => DataType::Uint32(RangeSet::single(0, u32::MAX as i128)),
        "uint64" => DataType::Uint64(RangeSet::single(0, u64::MAX as i128)),
        "decimal64" => {
            let fraction_digits = stmt
                .find1("fraction-digits")
                .ok_or_else(|| {
                    Error::BadYangLibrary(
                        "decimal64 without fraction-digits".to_string(),
                    )
                })?
                .expect_argument()?
                .parse::<u32>()
                .ok()
                .filter(|fd| (1..=18).contains(fd))
                .ok_or_else(|| {
                    Error::BadYangLibrary(
                        "invalid fraction-digits".to_string(),
                    )
                })?;
            DataType::Decimal64 {
                fraction_digits,
                range: RangeSet::single(
                    Decimal::new(i64::MIN, fraction_digits),
                    Decimal::new(i64::MAX, fraction_digits),
                ),
            }
        }
        "string" => DataType::String {
            length: full_length(),
            patterns: Vec::new(),
        },
        "binary" => DataType::Binary {
            length: full_length(),
        },
        "enumeration" => DataType::Enumeration {
            variants: enum_variants(stmt)?,
        },
        "bits" => DataType::Bits {
            flags: bit_flags(stmt)?,
        },
        "identityref" => {
            let mut bases = Vec::new();
            for base in stmt.find_all("base") {
                bases.push(identity_qname(
                    modules,
                    mid,
                    base.expect_argument()?,
                )?);
            }
            if bases.is_empty() {
                return Err(Error::BadYangLibrary(
                    "identityref without a base".to_string(),
                ));
            }
            DataType::IdentityRef {
                identities: modules.derived_identities(&bases),
            }
        }
        "instance-identifier" => DataType::InstanceIdentifier {
            require_instance: require_instance(stmt)?,
        },
        "leafref" => {
            let path_stmt = stmt.find1("path").ok_or_else(|| {
                Error::BadYangLibrary("leafref without a path".to_string())
            })?;
            let resolver = |prefix: &str| {
                modules
                    .prefix_module_name(mid, prefix)
                    .map(str::to_string)
            };
            DataType::LeafRef {
                path: xpath::parse_path(
                    path_stmt.expect_argument()?,
                    &resolver,
                )?,
                require_instance: require_instance(stmt)?,
            }
        }
        "union" => {
            let mut members = Vec::new();
            for member in stmt.find_all("type") {
                members.push(
                    resolve_type_depth(modules, mid, member, 1)?.dtype,
                );
            }
            if members.is_empty() {
                return Err(Error::BadYangLibrary(
                    "union without member types".to_string(),
                ));
            }
            DataType::Union { members }
        }
        _ => return Ok(None),
    };

    // Restrictions given directly on a built-in type reference.
    let restricted = apply_restrictions(modules, mid, base, stmt)?;
    Ok(Some(restricted))
}

/// Apply the restriction substatements of `stmt` on top of `dtype`.
fn apply_restrictions(
    _modules: &ModuleSet,
    _mid: usize,
    dtype: DataType,
    stmt: &Statement,
) -> Result<DataType> {
    let range_spec = stmt.find1("range").map(|s| s.expect_argument());
    let length_spec = stmt.find1("length").map(|s| s.expect_argument());
    Ok(match dtype {
        DataType::Int8(range) => {
            DataType::Int8(int_restricted(range, range_spec)?)
        }
        DataType::Int16(range) => {
            DataType::Int16(int_restricted(range, range_spec)?)
        }
        DataType::Int32(range) => {
            DataType::Int32(int_restricted(range, range_spec)?)
        }
        DataType::Int64(range) => {
            DataType::Int64(int_restricted(range, range_spec)?)
        }
        DataType::Uint8(range) => {
            DataType::Uint8(int_restricted(range, range_spec)?)
        }
        DataType::Uint16(range) => {
            DataType::Uint16(int_restricted(range, range_spec)?)
        }
        DataType::Uint32(range) => {
            DataType::Uint32(int_restricted(range, range_spec)?)
        }
        DataType::Uint64(range) => {
            DataType::Uint64(int_restricted(range, range_spec)?)
        }
        DataType::Decimal64 {
            fraction_digits,
            range,
        } => {
            let range = match range_spec {
                Some(spec) => range
                    .restricted(spec?, |s| Decimal::from_str(s).ok())?,
                None => range,
            };
            DataType::Decimal64 {
                fraction_digits,
                range,
            }
        }
        DataType::String {
            length,
            mut patterns,
        } => {
            let length = int_restricted(length, length_spec)?;
            for pattern in stmt.find_all("pattern") {
                let invert = pattern
                    .find1("modifier")
                    .and_then(|m| m.argument())
                    == Some("invert-match");
                patterns.push(Pattern::compile(
                    pattern.expect_argument()?,
                    invert,
                )?);
            }
            DataType::String { length, patterns }
        }
        DataType::Binary { length } => DataType::Binary {
            length: int_restricted(length, length_spec)?,
        },
        DataType::Enumeration { variants } => {
            if stmt.find1("enum").is_none() {
                DataType::Enumeration { variants }
            } else {
                // A derived enumeration may only keep a subset.
                let mut subset = Vec::new();
                for e in stmt.find_all("enum") {
                    let name = e.expect_argument()?;
                    let variant = variants
                        .iter()
                        .find(|v| v.name == name)
                        .ok_or_else(|| {
                            Error::BadYangLibrary(format!(
                                "'{}' is not an enumerator of the base type",
                                name
                            ))
                        })?;
                    subset.push(variant.clone());
                }
                DataType::Enumeration { variants: subset }
            }
        }
        DataType::Bits { flags } => {
            if stmt.find1("bit").is_none() {
                DataType::Bits { flags }
            } else {
                let mut subset = Vec::new();
                for b in stmt.find_all("bit") {
                    let name = b.expect_argument()?;
                    let flag = flags
                        .iter()
                        .find(|f| f.name == name)
                        .ok_or_else(|| {
                            Error::BadYangLibrary(format!(
                                "'{}' is not a bit of the base type",
                                name
                            ))
                        })?;
                    subset.push(flag.clone());
                }
                DataType::Bits { flags: subset }
            }
        }
        DataType::LeafRef {
            path,
            require_instance: base_ri,
        } => DataType::LeafRef {
            path,
            require_instance: match stmt.find1("require-instance") {
                Some(_) => require_instance(stmt)?,
                None => base_ri,
            },
        },
        DataType::InstanceIdentifier {
            require_instance: base_ri,
        } => DataType::InstanceIdentifier {
            require_instance: match stmt.find1("require-instance") {
                Some(_) => require_instance(stmt)?,
                None => base_ri,
            },
        },
        other => other,
    })
}

fn int_restricted(
    base: RangeSet<i128>,
    spec: Option<Result<&str>>,
) -> Result<RangeSet<i128>> {
    match spec {
        Some(spec) => base.restricted(spec?, parse_i128),
        None => Ok(base),
    }
}

fn require_instance(stmt: &Statement) -> Result<bool> {
    Ok(stmt
        .find1("require-instance")
        .and_then(|s| s.argument())
        != Some("false"))
}

fn enum_variants(stmt: &Statement) -> Result<Vec<EnumVariant>> {
    let mut variants: Vec<EnumVariant> = Vec::new();
    let mut next = 0i64;
    for e in stmt.find_all("enum") {
        let name = e.expect_argument()?.to_string();
        let value = match e.find1("value") {
            Some(v) => v
                .expect_argument()?
                .parse::<i32>()
                .map_err(|_| {
                    Error::BadYangLibrary(format!(
                        "invalid value of enum '{}'",
                        name
                    ))
                })?,
            None => i32::try_from(next).map_err(|_| {
                Error::BadYangLibrary(format!(
                    "implicit value of enum '{}' overflows",
                    name
                ))
            })?,
        };
        next = value as i64 + 1;
        variants.push(EnumVariant { name, value });
    }
    if variants.is_empty() {
        return Err(Error::BadYangLibrary(
            "enumeration without enumerators".to_string(),
        ));
    }
    Ok(variants)
}

fn bit_flags(stmt: &Statement) -> Result<Vec<BitFlag>> {
    let mut flags: Vec<BitFlag> = Vec::new();
    let mut next = 0u64;
    for b in stmt.find_all("bit") {
        let name = b.expect_argument()?.to_string();
        let position = match b.find1("position") {
            Some(p) => p.expect_argument()?.parse::<u32>().map_err(|_| {
                Error::BadYangLibrary(format!(
                    "invalid position of bit '{}'",
                    name
                ))
            })?,
            None => u32::try_from(next).map_err(|_| {
                Error::BadYangLibrary(format!(
                    "implicit position of bit '{}' overflows",
                    name
                ))
            })?,
        };
        next = position as u64 + 1;
        flags.push(BitFlag { name, position });
    }
    if flags.is_empty() {
        return Err(Error::BadYangLibrary(
            "bits type without bit definitions".to_string(),
        ));
    }
    Ok(flags)
}

/// Translate a possibly prefixed identity reference into its
/// `module:name` form.
fn identity_qname(
    modules: &ModuleSet,
    mid: usize,
    text: &str,
) -> Result<String> {
    match text.split_once(':') {
        Some((prefix, local)) => {
            let module =
                modules.prefix_module_name(mid, prefix).ok_or_else(|| {
                    Error::BadYangLibrary(format!(
                        "unknown prefix '{}'",
                        prefix
                    ))
                })?;
            Ok(format!("{}:{}", module, local))
        }
        None => Ok(format!("{}:{}", modules.module_name(mid), text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint8() -> DataType {
        DataType::Uint8(RangeSet::single(0, u8::MAX as i128))
    }

    #[test]
    fn integer_ranges() {
        let base = RangeSet::single(0, 255);
        let restricted =
            base.restricted("1..10 | 64 | 128..max", parse_i128).unwrap();
        assert!(restricted.contains(5));
        assert!(restricted.contains(64));
        assert!(restricted.contains(255));
        assert!(!restricted.contains(11));
        assert!(base.restricted("0..300", parse_i128).is_err());
    }

    #[test]
    fn integer_parsing() {
        assert_eq!(uint8().parse_value("64").unwrap(), Value::Uint8(64));
        assert!(uint8().parse_value("256").is_err());
        assert!(uint8().parse_value("abc").is_err());
        assert!(uint8().parse_value("-1").is_err());
    }

    #[test]
    fn decimal_canonical_form() {
        let dtype = DataType::Decimal64 {
            fraction_digits: 2,
            range: RangeSet::single(
                Decimal::new(i64::MIN, 2),
                Decimal::new(i64::MAX, 2),
            ),
        };
        let value = dtype.parse_value("6.4").unwrap();
        assert_eq!(dtype.canonical_string(&value), "6.40");
        assert!(dtype.parse_value("6.412").is_err());
    }

    #[test]
    fn union_first_match() {
        let dtype = DataType::Union {
            members: vec![
                uint8(),
                DataType::String {
                    length: RangeSet::single(0, u64::MAX as i128),
                    patterns: Vec::new(),
                },
            ],
        };
        assert_eq!(dtype.parse_value("7").unwrap(), Value::Uint8(7));
        assert_eq!(
            dtype.parse_value("up").unwrap(),
            Value::String("up".to_string())
        );
    }

    #[test]
    fn raw_forms() {
        assert!(uint8().from_raw(&serde_json::json!("7")).is_err());
        assert_eq!(
            uint8().from_raw(&serde_json::json!(7)).unwrap(),
            Value::Uint8(7)
        );
        let dtype = DataType::Uint64(RangeSet::single(0, u64::MAX as i128));
        assert_eq!(
            dtype.from_raw(&serde_json::json!("10000000000")).unwrap(),
            Value::Uint64(10000000000)
        );
    }
}
