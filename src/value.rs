//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Instance values and the persistent building blocks they are made of.

use std::sync::Arc;

use base64::prelude::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Name of an object member: `module:local` at a namespace crossing,
/// otherwise just `local`.
pub type InstanceName = String;

/// Modification timestamp carried by structured values.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock reading used to stamp new structured values.
pub(crate) fn now() -> Timestamp {
    Utc::now()
}

/// A single value of a YANG instance document.
///
/// Scalar variants mirror the YANG built-in types; `Object` and `Array`
/// represent containers/list entries and lists/leaf-lists respectively.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    /// `decimal64` value with the fixed scale of its type.
    Decimal(Decimal),
    String(String),
    Binary(Vec<u8>),
    Enum(String),
    /// Identity reference in its canonical `module:identity` form.
    IdentityRef(String),
    /// Set of bit names, kept in position order.
    Bits(Vec<String>),
    /// Unresolved instance-identifier text.
    InstanceId(String),
    Empty,
    /// Opaque anydata/anyxml subtree.
    Any(serde_json::Value),
    Object(ObjectValue),
    Array(ArrayValue),
}

impl Value {
    /// Returns whether the value is an object or an array.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Timestamp of a structured value, `None` for scalars.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Object(object) => Some(object.timestamp()),
            Value::Array(array) => Some(array.timestamp()),
            _ => None,
        }
    }

    /// Type-independent textual form of a scalar, as used in route displays
    /// and XPath string comparisons. Structured values yield an empty
    /// string.
    pub fn string_value(&self) -> String {
        match self {
            Value::Boolean(v) => v.to_string(),
            Value::Int8(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Uint8(v) => v.to_string(),
            Value::Uint16(v) => v.to_string(),
            Value::Uint32(v) => v.to_string(),
            Value::Uint64(v) => v.to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Binary(v) => BASE64_STANDARD.encode(v),
            Value::Enum(v) => v.clone(),
            Value::IdentityRef(v) => v.clone(),
            Value::Bits(v) => v.join(" "),
            Value::InstanceId(v) => v.clone(),
            Value::Empty => String::new(),
            Value::Any(v) => v.to_string(),
            Value::Object(_) | Value::Array(_) => String::new(),
        }
    }

    /// Convert the value to its raw form, ready for JSON encoding per
    /// RFC 7951 (64-bit integers and decimals as strings, binary as
    /// base64, `empty` as `[null]`).
    pub fn to_raw(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Boolean(v) => json!(v),
            Value::Int8(v) => json!(v),
            Value::Int16(v) => json!(v),
            Value::Int32(v) => json!(v),
            Value::Int64(v) => json!(v.to_string()),
            Value::Uint8(v) => json!(v),
            Value::Uint16(v) => json!(v),
            Value::Uint32(v) => json!(v),
            Value::Uint64(v) => json!(v.to_string()),
            Value::Decimal(v) => json!(v.to_string()),
            Value::String(v) => json!(v),
            Value::Binary(v) => json!(BASE64_STANDARD.encode(v)),
            Value::Enum(v) => json!(v),
            Value::IdentityRef(v) => json!(v),
            Value::Bits(v) => json!(v.join(" ")),
            Value::InstanceId(v) => json!(v),
            Value::Empty => json!([null]),
            Value::Any(v) => v.clone(),
            Value::Object(object) => {
                let mut map = serde_json::Map::new();
                for (name, value) in object.iter() {
                    map.insert(name.clone(), value.to_raw());
                }
                serde_json::Value::Object(map)
            }
            Value::Array(array) => serde_json::Value::Array(
                array.iter().map(Value::to_raw).collect(),
            ),
        }
    }
}

/// Object value: an insertion-ordered mapping from instance names to
/// values, plus a modification timestamp.
///
/// The member map is shared behind an `Arc`; cloning an object is cheap and
/// mutations go through copy-on-write constructors returning new objects.
#[derive(Clone, Debug)]
pub struct ObjectValue {
    members: Arc<IndexMap<InstanceName, Value>>,
    timestamp: Timestamp,
}

impl ObjectValue {
    pub fn new() -> ObjectValue {
        ObjectValue::from_map(IndexMap::new())
    }

    pub fn from_map(members: IndexMap<InstanceName, Value>) -> ObjectValue {
        ObjectValue {
            members: Arc::new(members),
            timestamp: now(),
        }
    }

    pub(crate) fn with_timestamp(
        members: IndexMap<InstanceName, Value>,
        timestamp: Timestamp,
    ) -> ObjectValue {
        ObjectValue {
            members: Arc::new(members),
            timestamp,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.members.get_index_of(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceName, &Value)> {
        self.members.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &InstanceName> {
        self.members.keys()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Copy of the member map, used as the starting point of copy-on-write
    /// updates.
    pub(crate) fn to_map(&self) -> IndexMap<InstanceName, Value> {
        (*self.members).clone()
    }

    /// Return a freshly stamped copy with `name` set or replaced. An
    /// existing member keeps its position, a new one is appended.
    pub(crate) fn with_member(&self, name: &str, value: Value) -> ObjectValue {
        let mut members = self.to_map();
        members.insert(name.to_string(), value);
        ObjectValue::from_map(members)
    }

    /// Return a freshly stamped copy without `name`, preserving the order
    /// of the remaining members. `None` if the member is absent.
    pub(crate) fn without_member(&self, name: &str) -> Option<ObjectValue> {
        let mut members = self.to_map();
        members.shift_remove(name)?;
        Some(ObjectValue::from_map(members))
    }
}

impl Default for ObjectValue {
    fn default() -> ObjectValue {
        ObjectValue::new()
    }
}

// Content equality; timestamps are bookkeeping, not data.
impl PartialEq for ObjectValue {
    fn eq(&self, other: &ObjectValue) -> bool {
        self.members == other.members
    }
}

/// Array value: an ordered sequence of values plus a modification
/// timestamp, backing YANG lists and leaf-lists.
#[derive(Clone, Debug)]
pub struct ArrayValue {
    entries: Arc<Vec<Value>>,
    timestamp: Timestamp,
}

impl ArrayValue {
    pub fn new() -> ArrayValue {
        ArrayValue::from_vec(Vec::new())
    }

    pub fn from_vec(entries: Vec<Value>) -> ArrayValue {
        ArrayValue {
            entries: Arc::new(entries),
            timestamp: now(),
        }
    }

    pub(crate) fn with_timestamp(
        entries: Vec<Value>,
        timestamp: Timestamp,
    ) -> ArrayValue {
        ArrayValue {
            entries: Arc::new(entries),
            timestamp,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub(crate) fn as_slice(&self) -> &[Value] {
        &self.entries
    }

    pub(crate) fn to_vec(&self) -> Vec<Value> {
        (*self.entries).clone()
    }
}

impl Default for ArrayValue {
    fn default() -> ArrayValue {
        ArrayValue::new()
    }
}

// Content equality; timestamps are bookkeeping, not data.
impl PartialEq for ArrayValue {
    fn eq(&self, other: &ArrayValue) -> bool {
        self.entries == other.entries
    }
}

/// Persistent singly-linked list of instance values.
///
/// Used for the `before`/`after` sibling chains of array entries in the
/// instance zipper; tails are shared between derived lists.
#[derive(Clone, Debug, Default)]
pub struct List(Option<Arc<ListNode>>);

#[derive(Debug)]
struct ListNode {
    head: Value,
    tail: List,
}

impl List {
    /// The empty list.
    pub fn empty() -> List {
        List(None)
    }

    /// Build a list preserving slice order: the head is the first element.
    pub fn from_slice(values: &[Value]) -> List {
        let mut list = List::empty();
        for value in values.iter().rev() {
            list = list.cons(value.clone());
        }
        list
    }

    /// Prepend a value, returning a new list sharing the receiver as tail.
    pub fn cons(&self, value: Value) -> List {
        List(Some(Arc::new(ListNode {
            head: value,
            tail: self.clone(),
        })))
    }

    /// Split the list into its head and tail, or `None` if empty.
    pub fn pop(&self) -> Option<(Value, List)> {
        self.0
            .as_ref()
            .map(|node| (node.head.clone(), node.tail.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter(self.0.as_deref())
    }
}

/// An iterator over the values of a persistent list, head first.
#[derive(Debug)]
pub struct ListIter<'a>(Option<&'a ListNode>);

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let node = self.0?;
        self.0 = node.tail.0.as_deref();
        Some(&node.head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_sharing() {
        let base = List::from_slice(&[Value::Uint8(1), Value::Uint8(2)]);
        let extended = base.cons(Value::Uint8(0));

        // The original list is unaffected by the extension.
        assert_eq!(base.len(), 2);
        assert_eq!(extended.len(), 3);
        let (head, tail) = extended.pop().unwrap();
        assert_eq!(head, Value::Uint8(0));
        assert_eq!(
            tail.iter().cloned().collect::<Vec<_>>(),
            vec![Value::Uint8(1), Value::Uint8(2)]
        );
    }

    #[test]
    fn object_member_order() {
        let object = ObjectValue::new()
            .with_member("b", Value::Uint8(2))
            .with_member("a", Value::Uint8(1));
        assert_eq!(
            object.names().cloned().collect::<Vec<_>>(),
            vec!["b".to_string(), "a".to_string()]
        );

        let trimmed = object.without_member("b").unwrap();
        assert_eq!(trimmed.len(), 1);
        assert_eq!(object.len(), 2);
    }

    #[test]
    fn raw_form_of_scalars() {
        assert_eq!(Value::Uint16(443).to_raw(), serde_json::json!(443));
        assert_eq!(
            Value::Uint64(10000000000).to_raw(),
            serde_json::json!("10000000000")
        );
        assert_eq!(Value::Empty.to_raw(), serde_json::json!([null]));
    }
}
