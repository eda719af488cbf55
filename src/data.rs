//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG instance data, represented as a persistent zipper.
//!
//! An [`InstanceNode`] is a focus into an immutable instance document
//! plus the context needed to rebuild the document around a changed
//! focus. Every mutating operation returns a new node; the receiver and
//! everything reachable from it remain valid.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::iter::{Ancestors, Entries, NodeIterable, PrecedingEntries};
use crate::path::{InstanceIdParser, InstanceRoute, InstanceSelector};
use crate::schema::{
    ContentType, NodeId, SchemaNode, SchemaNodeKind, ValidationScope,
};
use crate::types::DataType;
use crate::value::{
    now, ArrayValue, InstanceName, List, ObjectValue, Timestamp, Value,
};

/// Key of one step in an instance path: an object member name or an
/// array entry index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum InstanceKey {
    Member(InstanceName),
    Entry(usize),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::Member(name) => write!(f, "{}", name),
            InstanceKey::Entry(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for InstanceKey {
    fn from(name: &str) -> InstanceKey {
        InstanceKey::Member(name.to_string())
    }
}

impl From<usize> for InstanceKey {
    fn from(index: usize) -> InstanceKey {
        InstanceKey::Entry(index)
    }
}

/// YANG instance node: a zipper over an instance document, bound to its
/// schema node.
#[derive(Clone, Debug)]
pub struct InstanceNode<'a> {
    context: &'a Context,
    inner: Arc<Inner<'a>>,
}

#[derive(Debug)]
enum Inner<'a> {
    /// The root owns the whole document value.
    Root {
        value: Value,
        schema: NodeId,
        timestamp: Timestamp,
    },
    /// An object member: its name, the other members of the parent
    /// object, and its original position in insertion order.
    Member {
        name: InstanceName,
        pos: usize,
        siblings: IndexMap<InstanceName, Value>,
        value: Value,
        parent: InstanceNode<'a>,
        schema: NodeId,
        timestamp: Timestamp,
    },
    /// An array entry with persistent chains of the adjacent entries.
    /// `before` holds the preceding entries nearest-first.
    Entry {
        index: usize,
        before: List,
        after: List,
        value: Value,
        parent: InstanceNode<'a>,
        schema: NodeId,
        timestamp: Timestamp,
    },
}

// Structural equality of focus position and content.
impl PartialEq for InstanceNode<'_> {
    fn eq(&self, other: &InstanceNode<'_>) -> bool {
        self.schema_id() == other.schema_id()
            && self.path() == other.path()
            && self.value() == other.value()
    }
}

// ===== impl InstanceNode =====

impl<'a> InstanceNode<'a> {
    /// Create a root node owning the whole document value.
    pub(crate) fn root(context: &'a Context, value: Value) -> InstanceNode<'a> {
        let timestamp = value.timestamp().unwrap_or_else(now);
        InstanceNode {
            context,
            inner: Arc::new(Inner::Root {
                value,
                schema: 0,
                timestamp,
            }),
        }
    }

    fn make(&self, inner: Inner<'a>) -> InstanceNode<'a> {
        InstanceNode {
            context: self.context,
            inner: Arc::new(inner),
        }
    }

    /// Value of the receiver.
    pub fn value(&self) -> &Value {
        match &*self.inner {
            Inner::Root { value, .. }
            | Inner::Member { value, .. }
            | Inner::Entry { value, .. } => value,
        }
    }

    /// Time of the receiver's last modification.
    pub fn timestamp(&self) -> Timestamp {
        match &*self.inner {
            Inner::Root { timestamp, .. }
            | Inner::Member { timestamp, .. }
            | Inner::Entry { timestamp, .. } => *timestamp,
        }
    }

    fn schema_id(&self) -> NodeId {
        match &*self.inner {
            Inner::Root { schema, .. }
            | Inner::Member { schema, .. }
            | Inner::Entry { schema, .. } => *schema,
        }
    }

    /// The schema node corresponding to the receiver.
    pub fn schema(&self) -> SchemaNode<'a> {
        SchemaNode::new(self.context, self.schema_id())
    }

    /// The receiver's namespace (that of its schema node).
    pub fn namespace(&self) -> &'a str {
        self.schema().namespace()
    }

    pub fn is_root(&self) -> bool {
        matches!(&*self.inner, Inner::Root { .. })
    }

    /// Instance name of the receiver; array entries take the name of
    /// their parent member.
    pub fn name(&self) -> Option<InstanceName> {
        match &*self.inner {
            Inner::Root { .. } => None,
            Inner::Member { name, .. } => Some(name.clone()),
            Inner::Entry { parent, .. } => parent.name(),
        }
    }

    /// Index of an array entry in its parent array.
    pub fn index(&self) -> Option<usize> {
        match &*self.inner {
            Inner::Entry { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Path of the receiver in the data tree.
    pub fn path(&self) -> Vec<InstanceKey> {
        let mut keys = Vec::new();
        let mut node = self;
        loop {
            match &*node.inner {
                Inner::Root { .. } => break,
                Inner::Member { name, parent, .. } => {
                    keys.push(InstanceKey::Member(name.clone()));
                    node = parent;
                }
                Inner::Entry { index, parent, .. } => {
                    keys.push(InstanceKey::Entry(*index));
                    node = parent;
                }
            }
        }
        keys.reverse();
        keys
    }

    /// JSON Pointer (RFC 6901) of the receiver.
    pub fn json_pointer(&self) -> String {
        let path = self.path();
        if path.is_empty() {
            return "/".to_string();
        }
        let mut pointer = String::new();
        for key in path {
            pointer.push('/');
            pointer.push_str(&key.to_string());
        }
        pointer
    }

    /// The instance route addressing the receiver from the root.
    pub fn route(&self) -> InstanceRoute {
        let mut route = InstanceRoute::new();
        for key in self.path() {
            route.push(match key {
                InstanceKey::Member(name) => {
                    InstanceSelector::MemberName(name)
                }
                InstanceKey::Entry(index) => {
                    InstanceSelector::EntryIndex(index)
                }
            });
        }
        route
    }

    // ===== navigation =====

    /// Return the member with the given instance name.
    pub fn member(&self, name: &str) -> Result<InstanceNode<'a>> {
        let object = match self.value() {
            Value::Object(object) => object,
            Value::Array(_) => {
                return Err(Error::instance_value(
                    self.json_pointer(),
                    "member of non-object",
                ))
            }
            _ => {
                return Err(Error::instance_value(
                    self.json_pointer(),
                    "scalar instance",
                ))
            }
        };
        let pos = object.index_of(name).ok_or_else(|| {
            Error::nonexistent_instance(
                self.json_pointer(),
                format!("member '{}'", name),
            )
        })?;
        let mut siblings = object.to_map();
        let value = siblings.shift_remove(name).unwrap();
        let schema = self.member_schema_node(name)?;
        Ok(self.make(Inner::Member {
            name: name.to_string(),
            pos,
            siblings,
            value,
            parent: self.clone(),
            schema: schema.id(),
            timestamp: object.timestamp(),
        }))
    }

    /// Return the array entry with the given index; negative indexes
    /// count from the tail.
    pub fn entry(&self, index: isize) -> Result<InstanceNode<'a>> {
        let array = match self.value() {
            Value::Array(array) => array,
            Value::Object(_) => {
                return Err(Error::instance_value(
                    self.json_pointer(),
                    "entry of non-array",
                ))
            }
            _ => {
                return Err(Error::instance_value(
                    self.json_pointer(),
                    "scalar instance",
                ))
            }
        };
        let len = array.len() as isize;
        let normalized = if index < 0 { len + index } else { index };
        if normalized < 0 || normalized >= len {
            return Err(Error::nonexistent_instance(
                self.json_pointer(),
                format!("entry {}", index),
            ));
        }
        let idx = normalized as usize;
        let entries = array.as_slice();
        let mut before = List::empty();
        for value in &entries[..idx] {
            before = before.cons(value.clone());
        }
        let after = List::from_slice(&entries[idx + 1..]);
        Ok(self.make(Inner::Entry {
            index: idx,
            before,
            after,
            value: entries[idx].clone(),
            parent: self.clone(),
            schema: self.schema_id(),
            timestamp: array.timestamp(),
        }))
    }

    /// Return the member or entry with the given key.
    pub fn item(&self, key: impl Into<InstanceKey>) -> Result<InstanceNode<'a>> {
        match key.into() {
            InstanceKey::Member(name) => self.member(&name),
            InstanceKey::Entry(index) => self.entry(index as isize),
        }
    }

    /// Return the sibling member with the given instance name.
    pub fn sibling(&self, name: &str) -> Result<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Member { .. } => self.up()?.member(name),
            _ => Err(Error::instance_value(
                self.json_pointer(),
                "sibling of non-member",
            )),
        }
    }

    /// Return the instance node corresponding to the receiver's parent.
    pub fn up(&self) -> Result<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Root { .. } => Err(Error::nonexistent_instance(
                "/",
                "up of top",
            )),
            Inner::Member {
                name,
                pos,
                siblings,
                value,
                parent,
                timestamp,
                ..
            } => {
                // Reinsert the focused member at its original position.
                let mut members = siblings.clone();
                let at = (*pos).min(members.len());
                members.shift_insert(at, name.clone(), value.clone());
                let object =
                    ObjectValue::with_timestamp(members, *timestamp);
                let ts = (*timestamp).max(parent.timestamp());
                Ok(parent.copy_with(Value::Object(object), Some(ts)))
            }
            Inner::Entry {
                before,
                after,
                value,
                parent,
                timestamp,
                ..
            } => {
                let mut entries: Vec<Value> =
                    before.iter().cloned().collect();
                entries.reverse();
                entries.push(value.clone());
                entries.extend(after.iter().cloned());
                let array =
                    ArrayValue::with_timestamp(entries, *timestamp);
                let ts = (*timestamp).max(parent.timestamp());
                Ok(parent.copy_with(Value::Array(array), Some(ts)))
            }
        }
    }

    /// Return the instance node corresponding to the root of the data
    /// tree.
    pub fn top(&self) -> InstanceNode<'a> {
        let mut node = self.clone();
        while let Ok(parent) = node.up() {
            node = parent;
        }
        node
    }

    /// Return the next entry of the parent array.
    pub fn next(&self) -> Result<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Entry {
                index,
                before,
                after,
                value,
                parent,
                schema,
                timestamp,
            } => {
                let (head, tail) = after.pop().ok_or_else(|| {
                    Error::nonexistent_instance(
                        self.json_pointer(),
                        "next of last",
                    )
                })?;
                Ok(self.make(Inner::Entry {
                    index: index + 1,
                    before: before.cons(value.clone()),
                    after: tail,
                    value: head,
                    parent: parent.clone(),
                    schema: *schema,
                    timestamp: *timestamp,
                }))
            }
            _ => Err(Error::instance_value(
                self.json_pointer(),
                "not an array entry",
            )),
        }
    }

    /// Return the previous entry of the parent array.
    pub fn previous(&self) -> Result<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Entry {
                index,
                before,
                after,
                value,
                parent,
                schema,
                timestamp,
            } => {
                let (head, tail) = before.pop().ok_or_else(|| {
                    Error::nonexistent_instance(
                        self.json_pointer(),
                        "previous of first",
                    )
                })?;
                Ok(self.make(Inner::Entry {
                    index: index - 1,
                    before: tail,
                    after: after.cons(value.clone()),
                    value: head,
                    parent: parent.clone(),
                    schema: *schema,
                    timestamp: *timestamp,
                }))
            }
            _ => Err(Error::instance_value(
                self.json_pointer(),
                "not an array entry",
            )),
        }
    }

    /// Lazy iterator over the entries of an array value.
    pub fn entries(&self) -> Entries<'a> {
        Entries::new(self.entry(0).ok())
    }

    /// Member names of an object value, in insertion order.
    pub fn member_names(&self) -> Vec<InstanceName> {
        self.value()
            .as_object()
            .map(|object| object.names().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterator over the receiver's ancestors.
    pub fn ancestors(&self) -> Ancestors<'a, InstanceNode<'a>> {
        Ancestors::new(self.up().ok())
    }

    /// Iterator over the following entries of the parent array.
    pub fn following_siblings(&self) -> Entries<'a> {
        Entries::new(self.next().ok())
    }

    /// Iterator over the preceding entries of the parent array, nearest
    /// first.
    pub fn preceding_siblings(&self) -> PrecedingEntries<'a> {
        PrecedingEntries::new(self.previous().ok())
    }

    /// Move the focus along an instance route.
    pub fn goto(&self, route: &InstanceRoute) -> Result<InstanceNode<'a>> {
        let mut node = self.clone();
        for selector in route {
            node = selector.goto_step(&node)?;
        }
        Ok(node)
    }

    /// Return the value a route points at, without moving the focus.
    pub fn peek<'v>(&'v self, route: &InstanceRoute) -> Option<&'v Value> {
        let mut value = self.value();
        for selector in route {
            value = selector.peek_step(value)?;
        }
        Some(value)
    }

    // ===== mutation =====

    fn copy_with(
        &self,
        value: Value,
        timestamp: Option<Timestamp>,
    ) -> InstanceNode<'a> {
        let ts = timestamp
            .or_else(|| value.timestamp())
            .unwrap_or_else(now);
        let inner = match &*self.inner {
            Inner::Root { schema, .. } => Inner::Root {
                value,
                schema: *schema,
                timestamp: ts,
            },
            Inner::Member {
                name,
                pos,
                siblings,
                parent,
                schema,
                ..
            } => Inner::Member {
                name: name.clone(),
                pos: *pos,
                siblings: siblings.clone(),
                value,
                parent: parent.clone(),
                schema: *schema,
                timestamp: ts,
            },
            Inner::Entry {
                index,
                before,
                after,
                parent,
                schema,
                ..
            } => Inner::Entry {
                index: *index,
                before: before.clone(),
                after: after.clone(),
                value,
                parent: parent.clone(),
                schema: *schema,
                timestamp: ts,
            },
        };
        self.make(inner)
    }

    /// Decode a raw value against the receiver's schema node. An array
    /// entry decodes through the per-entry decoder of its list schema.
    fn cook_raw(&self, raw: &serde_json::Value) -> Result<Value> {
        match &*self.inner {
            Inner::Entry { .. } => self.schema().entry_from_raw(raw),
            _ => self.schema().from_raw(raw),
        }
    }

    /// Replace the focused value.
    pub fn update(&self, value: Value) -> InstanceNode<'a> {
        self.copy_with(value, None)
    }

    /// Replace the focused value with a decoded raw value.
    pub fn update_raw(
        &self,
        raw: &serde_json::Value,
    ) -> Result<InstanceNode<'a>> {
        Ok(self.copy_with(self.cook_raw(raw)?, None))
    }

    /// Set or create the named member and focus on it. Members not
    /// permitted by the schema are rejected.
    pub fn put_member(
        &self,
        name: &str,
        value: Value,
    ) -> Result<InstanceNode<'a>> {
        let object = self.value().as_object().ok_or_else(|| {
            Error::instance_value(
                self.json_pointer(),
                "member of non-object",
            )
        })?;
        self.member_schema_node(name)?;
        let updated = object.with_member(name, value);
        self.copy_with(Value::Object(updated), None).member(name)
    }

    /// Set or create the named member from a raw value.
    pub fn put_member_raw(
        &self,
        name: &str,
        raw: &serde_json::Value,
    ) -> Result<InstanceNode<'a>> {
        let cnode = self.member_schema_node(name)?;
        self.put_member(name, cnode.from_raw(raw)?)
    }

    /// Remove a member or entry from the focused value.
    pub fn delete_item(&self, key: &InstanceKey) -> Result<InstanceNode<'a>> {
        match (self.value(), key) {
            (Value::Object(object), InstanceKey::Member(name)) => {
                let updated =
                    object.without_member(name).ok_or_else(|| {
                        Error::nonexistent_instance(
                            self.json_pointer(),
                            format!("member '{}'", name),
                        )
                    })?;
                Ok(self.copy_with(Value::Object(updated), None))
            }
            (Value::Array(array), InstanceKey::Entry(index)) => {
                if *index >= array.len() {
                    return Err(Error::nonexistent_instance(
                        self.json_pointer(),
                        format!("entry {}", index),
                    ));
                }
                let mut entries = array.to_vec();
                entries.remove(*index);
                Ok(self.copy_with(
                    Value::Array(ArrayValue::from_vec(entries)),
                    None,
                ))
            }
            (Value::Object(_) | Value::Array(_), key) => {
                Err(Error::nonexistent_instance(
                    self.json_pointer(),
                    format!("item {}", key),
                ))
            }
            _ => Err(Error::instance_value(
                self.json_pointer(),
                "scalar value",
            )),
        }
    }

    /// Return the list entry whose keys match.
    pub fn look_up(
        &self,
        keys: &IndexMap<InstanceName, Value>,
    ) -> Result<InstanceNode<'a>> {
        let array = self.value().as_array().ok_or_else(|| {
            Error::instance_value(
                self.json_pointer(),
                "lookup on non-list",
            )
        })?;
        for (index, entry) in array.iter().enumerate() {
            let Some(object) = entry.as_object() else {
                continue;
            };
            if keys.iter().all(|(k, v)| object.get(k) == Some(v)) {
                return self.entry(index as isize);
            }
        }
        Err(Error::nonexistent_instance(
            self.json_pointer(),
            "entry lookup failed",
        ))
    }

    /// Insert a new entry before the receiver and focus on it.
    pub fn insert_before(&self, value: Value) -> Result<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Entry {
                index,
                before,
                after,
                value: focus,
                parent,
                schema,
                ..
            } => Ok(self.make(Inner::Entry {
                index: *index,
                before: before.clone(),
                after: after.cons(focus.clone()),
                value,
                parent: parent.clone(),
                schema: *schema,
                timestamp: now(),
            })),
            _ => Err(Error::instance_value(
                self.json_pointer(),
                "not an array entry",
            )),
        }
    }

    /// Insert a new entry after the receiver and focus on it.
    pub fn insert_after(&self, value: Value) -> Result<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Entry {
                index,
                before,
                after,
                value: focus,
                parent,
                schema,
                ..
            } => Ok(self.make(Inner::Entry {
                index: *index + 1,
                before: before.cons(focus.clone()),
                after: after.clone(),
                value,
                parent: parent.clone(),
                schema: *schema,
                timestamp: now(),
            })),
            _ => Err(Error::instance_value(
                self.json_pointer(),
                "not an array entry",
            )),
        }
    }

    /// Insert a decoded raw value before the receiver.
    pub fn insert_before_raw(
        &self,
        raw: &serde_json::Value,
    ) -> Result<InstanceNode<'a>> {
        self.insert_before(self.cook_raw(raw)?)
    }

    /// Insert a decoded raw value after the receiver.
    pub fn insert_after_raw(
        &self,
        raw: &serde_json::Value,
    ) -> Result<InstanceNode<'a>> {
        self.insert_after(self.cook_raw(raw)?)
    }

    // ===== defaults, validation, encoding =====

    /// Return the receiver with defaults added recursively to its value.
    pub fn add_defaults(
        &self,
        ctype: ContentType,
    ) -> Result<InstanceNode<'a>> {
        let snode = self.schema();
        match self.value() {
            Value::Object(object) if snode.is_internal() => {
                let mut result = self.clone();
                let names: Vec<InstanceName> =
                    object.names().cloned().collect();
                for name in names {
                    result =
                        result.member(&name)?.add_defaults(ctype)?.up()?;
                }
                snode.insert_defaults(result, ctype, false)
            }
            Value::Array(array)
                if snode.kind() == SchemaNodeKind::List =>
            {
                let mut result = self.clone();
                for index in 0..array.len() {
                    result = result
                        .entry(index as isize)?
                        .add_defaults(ctype)?
                        .up()?;
                }
                Ok(result)
            }
            _ => Ok(self.clone()),
        }
    }

    /// Validate the receiver's value against its schema node.
    pub fn validate(
        &self,
        scope: ValidationScope,
        ctype: ContentType,
    ) -> Result<()> {
        self.schema().validate_instance(self, scope, ctype)
    }

    /// Return the receiver's value in raw form, ready for JSON encoding.
    pub fn raw_value(&self) -> serde_json::Value {
        self.value().to_raw()
    }

    /// The nodes the receiver's value designates (leafref and
    /// instance-identifier), or empty.
    pub fn deref(&self) -> Vec<InstanceNode<'a>> {
        match self.schema().dtype() {
            Some(DataType::LeafRef { path, .. }) => {
                let target = self.value().string_value();
                path.eval_nodes(self)
                    .into_iter()
                    .filter(|node| {
                        node.canonical_value().as_deref()
                            == Some(target.as_str())
                    })
                    .collect()
            }
            Some(DataType::InstanceIdentifier { .. }) => {
                let Value::InstanceId(text) = self.value() else {
                    return Vec::new();
                };
                match InstanceIdParser::parse(self.context, text) {
                    Ok(route) => {
                        self.top().goto(&route).into_iter().collect()
                    }
                    Err(_) => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    // ===== crate-internal helpers =====

    /// The schema node of a member, or `NonexistentSchemaNode`.
    pub(crate) fn member_schema_node(
        &self,
        name: &str,
    ) -> Result<SchemaNode<'a>> {
        self.schema().iname_child(name).ok_or_else(|| {
            let (prefix, local) =
                crate::utils::split_instance_name(name);
            Error::NonexistentSchemaNode {
                name: local.to_string(),
                ns: prefix.map(str::to_string),
            }
        })
    }

    /// Canonical textual form of a terminal value.
    pub(crate) fn canonical_value(&self) -> Option<String> {
        self.schema()
            .dtype()
            .map(|dtype| dtype.canonical_string(self.value()))
    }

    /// XPath parent axis: an array entry ascends two structural levels.
    pub(crate) fn xpath_parent(&self) -> Option<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Root { .. } => None,
            Inner::Member { .. } => self.up().ok(),
            Inner::Entry { .. } => self.up().ok()?.up().ok(),
        }
    }

    /// XPath child axis, restricted to one qualified name; array members
    /// expand to their entries.
    pub(crate) fn xpath_children(
        &self,
        ns: Option<&str>,
        name: &str,
    ) -> Vec<InstanceNode<'a>> {
        let snode = self.schema();
        if !snode.is_internal() {
            return Vec::new();
        }
        let Some(object) = self.value().as_object() else {
            return Vec::new();
        };
        let Some(cnode) = snode.get_data_child(name, ns) else {
            return Vec::new();
        };
        let iname = cnode.iname();
        if !object.contains(&iname) {
            return Vec::new();
        }
        match self.member(&iname) {
            Ok(member) => member.node_set(),
            Err(_) => Vec::new(),
        }
    }

    /// XPath node-set of the receiver: entries for an array, the node
    /// itself otherwise.
    pub(crate) fn node_set(&self) -> Vec<InstanceNode<'a>> {
        if let Value::Array(array) = self.value() {
            (0..array.len())
                .filter_map(|index| self.entry(index as isize).ok())
                .collect()
        } else {
            vec![self.clone()]
        }
    }
}

impl<'a> NodeIterable<'a> for InstanceNode<'a> {
    fn parent(&self) -> Option<InstanceNode<'a>> {
        self.up().ok()
    }

    fn next_sibling(&self) -> Option<InstanceNode<'a>> {
        match &*self.inner {
            Inner::Root { .. } => None,
            Inner::Entry { .. } => self.next().ok(),
            Inner::Member { name, .. } => {
                let parent = self.up().ok()?;
                let names = parent.member_names();
                let position = names.iter().position(|n| n == name)?;
                parent.member(names.get(position + 1)?).ok()
            }
        }
    }

    fn first_child(&self) -> Option<InstanceNode<'a>> {
        match self.value() {
            Value::Object(object) => {
                let name = object.names().next().cloned()?;
                self.member(&name).ok()
            }
            Value::Array(_) => self.entry(0).ok(),
            _ => None,
        }
    }
}
