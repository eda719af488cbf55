//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG schema data.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::context::{Context, ModuleSet};
use crate::data::{InstanceKey, InstanceNode};
use crate::error::{Error, Result};
use crate::iter::{Ancestors, NodeIterable, Siblings, Traverse};
use crate::path::{InstanceIdParser, Parser};
use crate::statement::Statement;
use crate::types::{resolve_type, DataType};
use crate::utils::split_instance_name;
use crate::value::{ArrayValue, ObjectValue, Value};
use crate::xpath::{self, Expr};

/// Index of a schema node in the context's arena.
pub(crate) type NodeId = usize;

/// One `unique` statement: a tuple of descendant leaf references, each a
/// path of `(namespace, name)` segments.
pub(crate) type UniqueSpec = Vec<Vec<(Option<String>, String)>>;

bitflags! {
    /// Which classes of constraints a validation pass enforces.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ValidationScope: u8 {
        /// Mandatory presence, cardinality, list keys and uniqueness, and
        /// type-level constraints.
        const SYNTAX = 0x01;
        /// `when` and `must` expressions, leafref targets, identities and
        /// instance identifiers.
        const SEMANTICS = 0x02;
        /// Both scopes.
        const ALL = Self::SYNTAX.bits() | Self::SEMANTICS.bits();
    }
}

/// Whether data is configuration, operational state, or unrestricted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Config,
    Nonconfig,
    All,
}

impl ContentType {
    /// Does this content type admit a node with the given `config` flag?
    pub(crate) fn admits(self, config: bool) -> bool {
        match self {
            ContentType::Config => config,
            ContentType::Nonconfig => !config,
            ContentType::All => true,
        }
    }
}

/// NACM default access (RFC 8341).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DefaultDeny {
    #[default]
    None,
    Write,
    All,
}

/// YANG schema node kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaNodeKind {
    /// The implicit root of the schema tree.
    Root,
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    AnyData,
    AnyXml,
}

/// A `must` constraint with its optional error message.
#[derive(Clone, Debug)]
pub(crate) struct Must {
    pub(crate) expr: Expr,
    pub(crate) error_message: Option<String>,
}

/// Owned representation of one schema node in the arena.
#[derive(Debug)]
pub(crate) struct SchemaNodeData {
    pub(crate) kind: SchemaNodeKind,
    pub(crate) name: String,
    pub(crate) ns: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) config: Option<bool>,
    pub(crate) mandatory: bool,
    pub(crate) presence: bool,
    pub(crate) default_deny: DefaultDeny,
    pub(crate) when: Option<Expr>,
    pub(crate) musts: Vec<Must>,
    pub(crate) dtype: Option<DataType>,
    pub(crate) default: Option<Value>,
    pub(crate) defaults: Vec<Value>,
    pub(crate) default_case: Option<(Option<String>, String)>,
    pub(crate) keys: Vec<(String, Option<String>)>,
    pub(crate) unique: Vec<UniqueSpec>,
    pub(crate) min_elements: u64,
    pub(crate) max_elements: Option<u64>,
    pub(crate) user_ordered: bool,
    // Construction-time state.
    pub(crate) nsswitch: bool,
    default_text: Vec<String>,
    typedef_default: Option<String>,
}

impl SchemaNodeData {
    fn new(
        kind: SchemaNodeKind,
        name: &str,
        ns: &str,
        parent: Option<NodeId>,
    ) -> SchemaNodeData {
        SchemaNodeData {
            kind,
            name: name.to_string(),
            ns: ns.to_string(),
            parent,
            children: Vec::new(),
            config: None,
            mandatory: false,
            presence: false,
            default_deny: DefaultDeny::default(),
            when: None,
            musts: Vec::new(),
            dtype: None,
            default: None,
            defaults: Vec::new(),
            default_case: None,
            keys: Vec::new(),
            unique: Vec::new(),
            min_elements: 0,
            max_elements: None,
            user_ordered: false,
            nsswitch: false,
            default_text: Vec::new(),
            typedef_default: None,
        }
    }
}

/// Generic YANG schema node: a cheap handle into the schema arena owned by
/// a [`Context`].
#[derive(Clone, Copy, Debug)]
pub struct SchemaNode<'a> {
    context: &'a Context,
    id: NodeId,
}

impl PartialEq for SchemaNode<'_> {
    fn eq(&self, other: &SchemaNode<'_>) -> bool {
        self.id == other.id
            && std::ptr::eq(self.context, other.context)
    }
}

// ===== impl SchemaNode =====

impl<'a> SchemaNode<'a> {
    pub(crate) fn new(context: &'a Context, id: NodeId) -> SchemaNode<'a> {
        SchemaNode { context, id }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn data(&self) -> &'a SchemaNodeData {
        &self.context.snodes[self.id]
    }

    /// Returns the kind of the schema node.
    pub fn kind(&self) -> SchemaNodeKind {
        self.data().kind
    }

    /// Schema node name.
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// Namespace of the node: the name of its owning YANG module.
    pub fn namespace(&self) -> &'a str {
        &self.data().ns
    }

    /// Returns the parent node, or `None` for the schema root.
    pub fn parent(&self) -> Option<SchemaNode<'a>> {
        self.data()
            .parent
            .map(|id| SchemaNode::new(self.context, id))
    }

    /// Returns an iterator over the children of the node.
    pub fn children(&self) -> Siblings<'a, SchemaNode<'a>> {
        Siblings::new(self.first_child())
    }

    /// Returns an iterator over the ancestors of the node.
    pub fn ancestors(&self) -> Ancestors<'a, SchemaNode<'a>> {
        Ancestors::new(self.parent())
    }

    /// Returns an iterator over all nodes of the subtree (depth-first
    /// search algorithm).
    pub fn traverse(&self) -> Traverse<'a, SchemaNode<'a>> {
        Traverse::new(*self)
    }

    /// Returns whether the node carries data in instance documents
    /// (choice and case are transparent structuring nodes).
    pub fn is_data_node(&self) -> bool {
        !matches!(
            self.kind(),
            SchemaNodeKind::Choice
                | SchemaNodeKind::Case
                | SchemaNodeKind::Root
        )
    }

    /// Returns whether the node may have children.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind(),
            SchemaNodeKind::Root
                | SchemaNodeKind::Container
                | SchemaNodeKind::List
                | SchemaNodeKind::Choice
                | SchemaNodeKind::Case
        )
    }

    /// Returns whether the node is a leaf or leaf-list.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind(),
            SchemaNodeKind::Leaf | SchemaNodeKind::LeafList
        )
    }

    /// Returns whether the node represents configuration. The flag is
    /// inherited from the parent unless overridden locally.
    pub fn config(&self) -> bool {
        let mut node = *self;
        loop {
            if let Some(config) = node.data().config {
                return config;
            }
            match node.parent() {
                Some(parent) => node = parent,
                None => return true,
            }
        }
    }

    /// Returns whether the node is mandatory.
    pub fn is_mandatory(&self) -> bool {
        self.data().mandatory
    }

    /// Returns whether the node is a presence container.
    pub fn is_presence_container(&self) -> bool {
        self.kind() == SchemaNodeKind::Container && self.data().presence
    }

    /// NACM default access of the node.
    pub fn default_deny(&self) -> DefaultDeny {
        self.data().default_deny
    }

    /// The min-elements constraint.
    pub fn min_elements(&self) -> u64 {
        self.data().min_elements
    }

    /// The max-elements constraint.
    pub fn max_elements(&self) -> Option<u64> {
        self.data().max_elements
    }

    /// Returns whether the node is a user-ordered list or leaf-list.
    pub fn is_user_ordered(&self) -> bool {
        self.data().user_ordered
    }

    /// Key descriptors of a list, in declaration order.
    pub fn keys(&self) -> &'a [(String, Option<String>)] {
        &self.data().keys
    }

    /// Type of a leaf or leaf-list node.
    pub fn dtype(&self) -> Option<&'a DataType> {
        self.data().dtype.as_ref()
    }

    pub(crate) fn expect_dtype(&self) -> Result<&'a DataType> {
        self.dtype().ok_or_else(|| Error::BadSchemaNodeType {
            path: self.path(),
            expected: "leaf or leaf-list",
        })
    }

    /// Default value of a leaf.
    pub fn default_value(&self) -> Option<&'a Value> {
        self.data().default.as_ref()
    }

    /// Default values of a leaf-list.
    pub fn default_values(&self) -> &'a [Value] {
        &self.data().defaults
    }

    /// The default case of a choice.
    pub fn default_case(&self) -> Option<SchemaNode<'a>> {
        let (ns, name) = self.data().default_case.as_ref()?;
        self.children().find(|case| {
            case.name() == name
                && ns.as_deref().map_or(true, |ns| case.namespace() == ns)
        })
    }

    /// Returns the unique direct child with the given name and namespace
    /// (the receiver's namespace if not given).
    pub fn get_child(
        &self,
        name: &str,
        ns: Option<&str>,
    ) -> Option<SchemaNode<'a>> {
        let ns = ns.unwrap_or(self.namespace());
        self.children()
            .find(|c| c.name() == name && c.namespace() == ns)
    }

    /// Returns the first data node with the given name and namespace
    /// reachable from the receiver only through transparent choice/case
    /// nodes. A direct data child is preferred.
    pub fn get_data_child(
        &self,
        name: &str,
        ns: Option<&str>,
    ) -> Option<SchemaNode<'a>> {
        let ns = ns.unwrap_or(self.namespace());
        let mut candidates = Vec::new();
        for child in self.children() {
            if child.name() == name && child.namespace() == ns {
                if child.is_data_node() {
                    return Some(child);
                }
                candidates.insert(0, child);
            } else if matches!(
                child.kind(),
                SchemaNodeKind::Choice | SchemaNodeKind::Case
            ) {
                candidates.push(child);
            }
        }
        candidates
            .into_iter()
            .find_map(|c| c.get_data_child(name, Some(ns)))
    }

    /// Walk a sequence of `(name, namespace)` components from the
    /// receiver.
    pub fn get_schema_descendant<'n>(
        &self,
        path: impl IntoIterator<Item = (&'n str, Option<&'n str>)>,
    ) -> Option<SchemaNode<'a>> {
        let mut node = *self;
        for (name, ns) in path {
            node = node.get_child(name, ns)?;
        }
        Some(node)
    }

    /// Nearest ancestor that is a data node (or the root), skipping
    /// transparent choice/case layers.
    pub(crate) fn data_parent(&self) -> Option<SchemaNode<'a>> {
        let mut node = self.parent()?;
        while matches!(
            node.kind(),
            SchemaNodeKind::Choice | SchemaNodeKind::Case
        ) {
            node = node.parent()?;
        }
        Some(node)
    }

    /// Qualified name of the node (`namespace:name`).
    pub fn qname(&self) -> String {
        format!("{}:{}", self.namespace(), self.name())
    }

    /// Instance name of the node: qualified iff its namespace differs
    /// from the namespace of its data parent.
    pub fn iname(&self) -> String {
        match self.data_parent() {
            Some(parent) if parent.namespace() == self.namespace() => {
                self.name().to_string()
            }
            _ => self.qname(),
        }
    }

    /// Schema path of the node from the root.
    pub fn path(&self) -> String {
        let mut parts = Vec::new();
        let mut node = *self;
        while node.kind() != SchemaNodeKind::Root {
            parts.push(node.iname());
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// Resolve a member instance name against the receiver.
    pub(crate) fn iname_child(&self, iname: &str) -> Option<SchemaNode<'a>> {
        let (prefix, local) = split_instance_name(iname);
        self.get_data_child(local, prefix)
    }

    /// Data-node descendants reachable only through transparent
    /// choice/case layers.
    pub(crate) fn data_descendants(&self) -> Vec<SchemaNode<'a>> {
        let mut result = Vec::new();
        for child in self.children() {
            if child.is_data_node() {
                result.push(child);
            } else {
                result.extend(child.data_descendants());
            }
        }
        result
    }

    /// Cases of a choice that are materialized in `object`.
    pub(crate) fn active_cases(
        &self,
        object: &ObjectValue,
    ) -> Vec<SchemaNode<'a>> {
        self.children()
            .filter(|case| {
                case.data_descendants()
                    .iter()
                    .any(|d| object.contains(&d.iname()))
            })
            .collect()
    }

    // ===== raw-to-cooked conversion =====

    /// Transform a raw (JSON-shaped) value into a cooked [`Value`], walking
    /// the schema and the raw document in lockstep.
    pub fn from_raw(&self, raw: &serde_json::Value) -> Result<Value> {
        match self.kind() {
            SchemaNodeKind::Root | SchemaNodeKind::Container => {
                self.object_from_raw(raw)
            }
            SchemaNodeKind::List | SchemaNodeKind::LeafList => {
                let entries = raw.as_array().ok_or_else(|| {
                    Error::raw_type("expected an array")
                        .with_path(&self.path())
                })?;
                let cooked = entries
                    .iter()
                    .map(|entry| self.entry_from_raw(entry))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue::from_vec(cooked)))
            }
            SchemaNodeKind::Leaf => self
                .expect_dtype()?
                .from_raw(raw)
                .map_err(|e| e.with_path(&self.path())),
            SchemaNodeKind::AnyData | SchemaNodeKind::AnyXml => {
                Ok(Value::Any(raw.clone()))
            }
            SchemaNodeKind::Choice | SchemaNodeKind::Case => {
                Err(Error::BadSchemaNodeType {
                    path: self.path(),
                    expected: "data node",
                })
            }
        }
    }

    /// Decode a single entry of a list or leaf-list.
    pub(crate) fn entry_from_raw(
        &self,
        raw: &serde_json::Value,
    ) -> Result<Value> {
        match self.kind() {
            SchemaNodeKind::List => self.object_from_raw(raw),
            SchemaNodeKind::LeafList => self
                .expect_dtype()?
                .from_raw(raw)
                .map_err(|e| e.with_path(&self.path())),
            _ => Err(Error::BadSchemaNodeType {
                path: self.path(),
                expected: "list or leaf-list",
            }),
        }
    }

    fn object_from_raw(&self, raw: &serde_json::Value) -> Result<Value> {
        let map = raw.as_object().ok_or_else(|| {
            Error::raw_type("expected an object").with_path(&self.path())
        })?;
        let mut members = IndexMap::new();
        for (key, rvalue) in map {
            let (prefix, local) = split_instance_name(key);
            let cnode =
                self.get_data_child(local, prefix).ok_or_else(|| {
                    Error::RawMember {
                        path: self.path(),
                        member: key.clone(),
                    }
                })?;
            members.insert(cnode.iname(), cnode.from_raw(rvalue)?);
        }
        Ok(Value::Object(ObjectValue::from_map(members)))
    }

    // ===== default insertion =====

    /// Inspect each not-yet-present child of an internal node bound to
    /// `inst` and inject its defaults.
    pub(crate) fn insert_defaults(
        &self,
        inst: InstanceNode<'a>,
        ctype: ContentType,
        lazy: bool,
    ) -> Result<InstanceNode<'a>> {
        let mut result = inst;
        for child in self.children() {
            result = child.default_into(result, ctype, lazy)?;
        }
        Ok(result)
    }

    /// Inject the receiver's defaults into the object focused by `parent`.
    fn default_into(
        &self,
        parent: InstanceNode<'a>,
        ctype: ContentType,
        lazy: bool,
    ) -> Result<InstanceNode<'a>> {
        let data = self.data();
        match data.kind {
            SchemaNodeKind::Choice => {
                let object = match parent.value().as_object() {
                    Some(object) => object.clone(),
                    None => return Ok(parent),
                };
                if !self.active_cases(&object).is_empty() {
                    return Ok(parent);
                }
                let Some(case) = self.default_case() else {
                    return Ok(parent);
                };
                let mut result = parent;
                for child in case.children() {
                    result = child.default_into(result, ctype, lazy)?;
                }
                Ok(result)
            }
            SchemaNodeKind::Leaf => {
                if !ctype.admits(self.config()) {
                    return Ok(parent);
                }
                let iname = self.iname();
                if member_present(&parent, &iname) {
                    return Ok(parent);
                }
                let Some(default) = data.default.as_ref() else {
                    return Ok(parent);
                };
                if !self.when_satisfied(&parent) {
                    return Ok(parent);
                }
                parent.put_member(&iname, default.clone())?.up()
            }
            SchemaNodeKind::LeafList => {
                if !ctype.admits(self.config()) || data.defaults.is_empty()
                {
                    return Ok(parent);
                }
                let iname = self.iname();
                if member_present(&parent, &iname) {
                    return Ok(parent);
                }
                if !self.when_satisfied(&parent) {
                    return Ok(parent);
                }
                let value = Value::Array(ArrayValue::from_vec(
                    data.defaults.clone(),
                ));
                parent.put_member(&iname, value)?.up()
            }
            SchemaNodeKind::Container if !data.presence => {
                if lazy || !ctype.admits(self.config()) {
                    return Ok(parent);
                }
                let iname = self.iname();
                if member_present(&parent, &iname) {
                    return Ok(parent);
                }
                if data.when.is_some() && !self.when_satisfied(&parent) {
                    return Ok(parent);
                }
                let member = parent
                    .put_member(&iname, Value::Object(ObjectValue::new()))?;
                let member = self.insert_defaults(member, ctype, lazy)?;
                let empty = member
                    .value()
                    .as_object()
                    .map(|o| o.is_empty())
                    .unwrap_or(true);
                if empty && data.when.is_none() {
                    // Nothing to materialize, leave the container out.
                    member.up()?.delete_item(&InstanceKey::Member(iname))
                } else {
                    member.up()
                }
            }
            _ => Ok(parent),
        }
    }

    fn when_satisfied(&self, parent: &InstanceNode<'a>) -> bool {
        match &self.data().when {
            Some(when) => when.evaluate(parent),
            None => true,
        }
    }

    // ===== validation =====

    /// Validate the instance node bound to the receiver.
    pub(crate) fn validate_instance(
        &self,
        inst: &InstanceNode<'a>,
        scope: ValidationScope,
        ctype: ContentType,
    ) -> Result<()> {
        match self.kind() {
            SchemaNodeKind::Root => {
                self.validate_object(inst, scope, ctype)
            }
            SchemaNodeKind::Container => {
                self.validate_node_constraints(inst, scope)?;
                self.validate_object(inst, scope, ctype)
            }
            SchemaNodeKind::List => self.validate_list(inst, scope, ctype),
            SchemaNodeKind::LeafList => {
                self.validate_leaf_list(inst, scope)
            }
            SchemaNodeKind::Leaf => {
                self.validate_node_constraints(inst, scope)?;
                self.validate_terminal(inst, scope)
            }
            SchemaNodeKind::AnyData | SchemaNodeKind::AnyXml => {
                self.validate_node_constraints(inst, scope)
            }
            SchemaNodeKind::Choice | SchemaNodeKind::Case => Ok(()),
        }
    }

    /// `when` and `must` checks common to all node kinds.
    fn validate_node_constraints(
        &self,
        inst: &InstanceNode<'a>,
        scope: ValidationScope,
    ) -> Result<()> {
        if !scope.contains(ValidationScope::SEMANTICS) {
            return Ok(());
        }
        let data = self.data();
        if let Some(when) = &data.when {
            if !when.evaluate(inst) {
                return Err(Error::semantic(
                    inst.json_pointer(),
                    "expression of 'when' is false",
                ));
            }
        }
        for must in &data.musts {
            if !must.expr.evaluate(inst) {
                let detail = must
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "'must' condition violated".into());
                return Err(Error::semantic(inst.json_pointer(), detail));
            }
        }
        Ok(())
    }

    fn validate_object(
        &self,
        inst: &InstanceNode<'a>,
        scope: ValidationScope,
        ctype: ContentType,
    ) -> Result<()> {
        let pointer = inst.json_pointer();
        let object = match inst.value().as_object() {
            Some(object) => object.clone(),
            None => return Err(Error::schema(pointer, "expected an object")),
        };

        if scope.contains(ValidationScope::SYNTAX) {
            for name in object.names() {
                let cnode = self.iname_child(name).ok_or_else(|| {
                    Error::schema(
                        pointer.clone(),
                        format!("unknown member '{}'", name),
                    )
                })?;
                if !ctype.admits(cnode.config()) {
                    let expected = match ctype {
                        ContentType::Config => "configuration",
                        _ => "state data",
                    };
                    return Err(Error::schema(
                        pointer.clone(),
                        format!(
                            "member '{}' is not {}",
                            name, expected
                        ),
                    ));
                }
            }
            for child in self.children() {
                if child.kind() == SchemaNodeKind::Choice
                    && child.active_cases(&object).len() > 1
                {
                    return Err(Error::schema(
                        pointer.clone(),
                        format!(
                            "multiple cases of choice '{}'",
                            child.name()
                        ),
                    ));
                }
            }
            for child in self.children() {
                check_mandatory_child(child, &object, &pointer, ctype)?;
            }
        }

        // Recurse into the members in document order.
        let names: Vec<String> = object.names().cloned().collect();
        for name in names {
            let member = inst.member(&name)?;
            member.schema().validate_instance(&member, scope, ctype)?;
        }
        Ok(())
    }

    fn validate_list(
        &self,
        inst: &InstanceNode<'a>,
        scope: ValidationScope,
        ctype: ContentType,
    ) -> Result<()> {
        let pointer = inst.json_pointer();
        let array = match inst.value().as_array() {
            Some(array) => array.clone(),
            None => return Err(Error::schema(pointer, "expected an array")),
        };

        if scope.contains(ValidationScope::SYNTAX) {
            self.check_cardinality(array.len(), &pointer)?;
        }

        let mut seen_keys = HashSet::new();
        for index in 0..array.len() {
            let entry = inst.entry(index as isize)?;
            self.validate_node_constraints(&entry, scope)?;

            if scope.contains(ValidationScope::SYNTAX) {
                let object = match entry.value().as_object() {
                    Some(object) => object.clone(),
                    None => {
                        return Err(Error::schema(
                            entry.json_pointer(),
                            "list entry must be an object",
                        ))
                    }
                };
                let mut tuple = Vec::new();
                for (kname, kns) in self.keys() {
                    let knode = self
                        .get_data_child(kname, kns.as_deref())
                        .ok_or_else(|| {
                            Error::schema(
                                entry.json_pointer(),
                                format!("unknown list key '{}'", kname),
                            )
                        })?;
                    let iname = knode.iname();
                    match object.get(&iname) {
                        Some(value) if !value.is_structured() => {
                            tuple.push(
                                knode
                                    .expect_dtype()?
                                    .canonical_string(value),
                            );
                        }
                        Some(_) => {
                            return Err(Error::schema(
                                entry.json_pointer(),
                                format!("key '{}' is not a scalar", iname),
                            ))
                        }
                        None => {
                            return Err(Error::schema(
                                entry.json_pointer(),
                                format!("missing list key '{}'", iname),
                            ))
                        }
                    }
                }
                if !tuple.is_empty() && !seen_keys.insert(tuple) {
                    return Err(Error::schema(
                        entry.json_pointer(),
                        "duplicate list keys",
                    ));
                }
            }

            self.validate_object(&entry, scope, ctype)?;
        }

        if scope.contains(ValidationScope::SYNTAX) {
            for unique in &self.data().unique {
                self.check_unique(&array, unique, &pointer)?;
            }
        }
        Ok(())
    }

    fn validate_leaf_list(
        &self,
        inst: &InstanceNode<'a>,
        scope: ValidationScope,
    ) -> Result<()> {
        let pointer = inst.json_pointer();
        let array = match inst.value().as_array() {
            Some(array) => array.clone(),
            None => return Err(Error::schema(pointer, "expected an array")),
        };

        if scope.contains(ValidationScope::SYNTAX) {
            self.check_cardinality(array.len(), &pointer)?;
            // Entries of a configuration leaf-list must be unique.
            if self.config() {
                let mut seen = Vec::new();
                for value in array.iter() {
                    if seen.contains(&value) {
                        return Err(Error::schema(
                            pointer.clone(),
                            "duplicate leaf-list entries",
                        ));
                    }
                    seen.push(value);
                }
            }
        }

        let dtype = self.expect_dtype()?;
        for index in 0..array.len() {
            let entry = inst.entry(index as isize)?;
            self.validate_node_constraints(&entry, scope)?;
            if scope.contains(ValidationScope::SYNTAX) {
                dtype.check(entry.value()).map_err(|e| {
                    Error::schema(entry.json_pointer(), detail_of(e))
                })?;
            }
            if scope.contains(ValidationScope::SEMANTICS) {
                self.validate_value_semantics(&entry)?;
            }
        }
        Ok(())
    }

    fn validate_terminal(
        &self,
        inst: &InstanceNode<'a>,
        scope: ValidationScope,
    ) -> Result<()> {
        if scope.contains(ValidationScope::SYNTAX) {
            self.expect_dtype()?.check(inst.value()).map_err(|e| {
                Error::schema(inst.json_pointer(), detail_of(e))
            })?;
        }
        if scope.contains(ValidationScope::SEMANTICS) {
            self.validate_value_semantics(inst)?;
        }
        Ok(())
    }

    /// Type-directed semantic checks: leafref targets and instance
    /// identifiers must resolve.
    fn validate_value_semantics(
        &self,
        inst: &InstanceNode<'a>,
    ) -> Result<()> {
        match self.expect_dtype()? {
            DataType::LeafRef {
                path,
                require_instance: true,
            } => {
                let target = inst.value().string_value();
                let found = path.eval_nodes(inst).iter().any(|node| {
                    node.canonical_value().as_deref()
                        == Some(target.as_str())
                });
                if !found {
                    return Err(Error::semantic(
                        inst.json_pointer(),
                        format!("leafref target '{}' not found", target),
                    ));
                }
                Ok(())
            }
            DataType::InstanceIdentifier { require_instance } => {
                let Value::InstanceId(text) = inst.value() else {
                    return Ok(());
                };
                let route =
                    InstanceIdParser::parse(self.context, text).map_err(
                        |_| {
                            Error::semantic(
                                inst.json_pointer(),
                                format!(
                                    "invalid instance identifier '{}'",
                                    text
                                ),
                            )
                        },
                    )?;
                if *require_instance
                    && inst.top().peek(&route).is_none()
                {
                    return Err(Error::semantic(
                        inst.json_pointer(),
                        format!("no instance matches '{}'", text),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_cardinality(&self, len: usize, pointer: &str) -> Result<()> {
        let data = self.data();
        if (len as u64) < data.min_elements {
            return Err(Error::schema(
                pointer,
                format!("fewer than {} entries", data.min_elements),
            ));
        }
        if let Some(max) = data.max_elements {
            if len as u64 > max {
                return Err(Error::schema(
                    pointer,
                    format!("more than {} entries", max),
                ));
            }
        }
        Ok(())
    }

    /// Check one `unique` constraint over all entries of a list. Entries
    /// missing any referenced leaf do not participate.
    fn check_unique(
        &self,
        array: &ArrayValue,
        unique: &UniqueSpec,
        pointer: &str,
    ) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in array.iter() {
            let mut tuple = Vec::new();
            let mut complete = true;
            for component in unique {
                let mut node = *self;
                let mut value = Some(entry);
                for (ns, name) in component {
                    match node.get_data_child(name, ns.as_deref()) {
                        Some(next) => {
                            value = value
                                .and_then(Value::as_object)
                                .and_then(|o| o.get(&next.iname()));
                            node = next;
                        }
                        None => {
                            value = None;
                        }
                    }
                    if value.is_none() {
                        break;
                    }
                }
                match value {
                    Some(value) if !value.is_structured() => tuple.push(
                        node.expect_dtype()?.canonical_string(value),
                    ),
                    _ => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete && !tuple.is_empty() && !seen.insert(tuple) {
                return Err(Error::schema(
                    pointer,
                    "'unique' constraint violated",
                ));
            }
        }
        Ok(())
    }
}

/// True when `iname` is a member of the object focused by `inst`.
fn member_present(inst: &InstanceNode<'_>, iname: &str) -> bool {
    inst.value()
        .as_object()
        .map(|object| object.contains(iname))
        .unwrap_or(false)
}

fn detail_of(error: Error) -> String {
    match error {
        Error::RawType { detail, .. } => detail,
        other => other.to_string(),
    }
}

/// Mandatory-presence check for one child of an internal node, descending
/// through transparent choices and non-presence containers.
fn check_mandatory_child(
    child: SchemaNode<'_>,
    object: &ObjectValue,
    pointer: &str,
    ctype: ContentType,
) -> Result<()> {
    if !ctype.admits(child.config()) {
        return Ok(());
    }
    let data = child.data();
    match data.kind {
        SchemaNodeKind::Leaf
        | SchemaNodeKind::AnyData
        | SchemaNodeKind::AnyXml => {
            if data.mandatory && !object.contains(&child.iname()) {
                return Err(Error::schema(
                    pointer,
                    format!("missing mandatory node '{}'", child.iname()),
                ));
            }
        }
        SchemaNodeKind::List | SchemaNodeKind::LeafList => {
            if data.min_elements > 0 && !object.contains(&child.iname()) {
                return Err(Error::schema(
                    pointer,
                    format!(
                        "missing entries of mandatory node '{}'",
                        child.iname()
                    ),
                ));
            }
        }
        SchemaNodeKind::Container => {
            if !data.presence
                && !object.contains(&child.iname())
                && has_mandatory_descendant(child)
            {
                return Err(Error::schema(
                    pointer,
                    format!(
                        "missing mandatory descendant of '{}'",
                        child.iname()
                    ),
                ));
            }
        }
        SchemaNodeKind::Choice => {
            let active = child.active_cases(object);
            match active.as_slice() {
                [] if data.mandatory => {
                    return Err(Error::schema(
                        pointer,
                        format!(
                            "no case of mandatory choice '{}'",
                            child.name()
                        ),
                    ))
                }
                [case] => {
                    for inner in case.children() {
                        check_mandatory_child(
                            inner, object, pointer, ctype,
                        )?;
                    }
                }
                _ => (),
            }
        }
        SchemaNodeKind::Case | SchemaNodeKind::Root => (),
    }
    Ok(())
}

fn has_mandatory_descendant(node: SchemaNode<'_>) -> bool {
    node.children().any(|child| match child.kind() {
        SchemaNodeKind::Leaf
        | SchemaNodeKind::AnyData
        | SchemaNodeKind::AnyXml
        | SchemaNodeKind::Choice => child.data().mandatory,
        SchemaNodeKind::List | SchemaNodeKind::LeafList => {
            child.data().min_elements > 0
        }
        SchemaNodeKind::Container => {
            !child.data().presence && has_mandatory_descendant(child)
        }
        SchemaNodeKind::Case | SchemaNodeKind::Root => false,
    })
}

impl<'a> NodeIterable<'a> for SchemaNode<'a> {
    fn parent(&self) -> Option<SchemaNode<'a>> {
        SchemaNode::parent(self)
    }

    fn next_sibling(&self) -> Option<SchemaNode<'a>> {
        let parent = self.parent()?;
        let siblings = &parent.data().children;
        let position = siblings.iter().position(|id| *id == self.id)?;
        siblings
            .get(position + 1)
            .map(|id| SchemaNode::new(self.context, *id))
    }

    fn first_child(&self) -> Option<SchemaNode<'a>> {
        self.data()
            .children
            .first()
            .map(|id| SchemaNode::new(self.context, *id))
    }
}

// ===== schema tree construction =====

/// A tree-shaped overlay of `refine` and `uses`-`augment` patches, keyed
/// by descendant path components.
#[derive(Clone, Debug, Default)]
struct ChangeSet<'s> {
    patch: Vec<(usize, &'s Statement)>,
    subset: HashMap<String, ChangeSet<'s>>,
}

impl<'s> ChangeSet<'s> {
    fn from_statement(
        mid: usize,
        stmt: &'s Statement,
    ) -> Result<ChangeSet<'s>> {
        let mut changes = ChangeSet {
            patch: vec![(mid, stmt)],
            subset: HashMap::new(),
        };
        for part in stmt.expect_argument()?.split('/').rev() {
            if part.is_empty() {
                continue;
            }
            let local =
                part.split_once(':').map(|(_, l)| l).unwrap_or(part);
            let mut subset = HashMap::new();
            subset.insert(local.to_string(), changes);
            changes = ChangeSet {
                patch: Vec::new(),
                subset,
            };
        }
        Ok(changes)
    }

    /// Join the receiver with another change set.
    fn join(mut self, other: ChangeSet<'s>) -> ChangeSet<'s> {
        self.patch.extend(other.patch);
        for (name, sub) in other.subset {
            match self.subset.remove(&name) {
                Some(existing) => {
                    self.subset.insert(name, existing.join(sub));
                }
                None => {
                    self.subset.insert(name, sub);
                }
            }
        }
        self
    }

    fn subset(&self, name: &str) -> Option<&ChangeSet<'s>> {
        self.subset.get(name)
    }
}

/// Top-down construction of the schema arena from parsed module
/// statements.
pub(crate) struct SchemaBuilder<'m> {
    modules: &'m ModuleSet,
    nodes: Vec<SchemaNodeData>,
}

impl<'m> SchemaBuilder<'m> {
    pub(crate) fn build(modules: &ModuleSet) -> Result<Vec<SchemaNodeData>> {
        let mut root =
            SchemaNodeData::new(SchemaNodeKind::Root, "", "", None);
        root.nsswitch = true;
        let mut builder = SchemaBuilder {
            modules,
            nodes: vec![root],
        };

        for (mid, module) in modules.iter_implemented() {
            log::debug!("building schema tree of module '{}'", module.name);
            builder.handle_substatements(
                0,
                &module.statement,
                mid,
                mid,
                None,
            )?;
        }

        // Module-level augments are applied once all the trees exist.
        for (mid, module) in modules.iter_implemented() {
            for augment in module.statement.find_all("augment") {
                builder.apply_augment(augment, mid)?;
            }
        }

        builder.check_list_keys()?;
        Ok(builder.nodes)
    }

    fn handle_substatements(
        &mut self,
        node: NodeId,
        stmt: &'m Statement,
        mid: usize,
        nsmid: usize,
        changes: Option<&ChangeSet<'m>>,
    ) -> Result<()> {
        for s in stmt.substatements() {
            // Prefixed (extension) keywords are resolved against the
            // module's prefix map.
            let keyword = match s.prefix() {
                Some(prefix) => {
                    match self.modules.prefix_module_name(mid, prefix) {
                        Some(module) => {
                            format!("{}:{}", module, s.keyword())
                        }
                        None => continue,
                    }
                }
                None => s.keyword().to_string(),
            };
            match keyword.as_str() {
                "container" => self.handle_child(
                    node,
                    SchemaNodeKind::Container,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "list" => self.handle_child(
                    node,
                    SchemaNodeKind::List,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "leaf" => self.handle_child(
                    node,
                    SchemaNodeKind::Leaf,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "leaf-list" => self.handle_child(
                    node,
                    SchemaNodeKind::LeafList,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "choice" => self.handle_child(
                    node,
                    SchemaNodeKind::Choice,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "case" => self.handle_child(
                    node,
                    SchemaNodeKind::Case,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "anydata" => self.handle_child(
                    node,
                    SchemaNodeKind::AnyData,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "anyxml" => self.handle_child(
                    node,
                    SchemaNodeKind::AnyXml,
                    s,
                    mid,
                    nsmid,
                    changes,
                )?,
                "uses" => {
                    self.handle_uses(node, s, mid, nsmid, changes)?
                }
                "config" => match s.argument() {
                    Some("false") => {
                        self.nodes[node].config = Some(false)
                    }
                    Some("true") => self.nodes[node].config = Some(true),
                    _ => (),
                },
                "presence" => self.nodes[node].presence = true,
                "mandatory" => {
                    self.nodes[node].mandatory =
                        s.argument() == Some("true")
                }
                "min-elements" => {
                    self.nodes[node].min_elements = s
                        .expect_argument()?
                        .parse()
                        .map_err(|_| {
                            Error::BadYangLibrary(
                                "invalid min-elements".to_string(),
                            )
                        })?
                }
                "max-elements" => {
                    let argument = s.expect_argument()?;
                    self.nodes[node].max_elements =
                        if argument == "unbounded" {
                            None
                        } else {
                            Some(argument.parse().map_err(|_| {
                                Error::BadYangLibrary(
                                    "invalid max-elements".to_string(),
                                )
                            })?)
                        }
                }
                "ordered-by" => {
                    self.nodes[node].user_ordered =
                        s.argument() == Some("user")
                }
                "key" => {
                    let keys = s
                        .expect_argument()?
                        .split_whitespace()
                        .map(|key| self.split_node_id(key, mid))
                        .collect::<Result<Vec<_>>>()?;
                    self.nodes[node].keys = keys
                        .into_iter()
                        .map(|(ns, name)| (name, ns))
                        .collect();
                }
                "unique" => {
                    let mut spec = Vec::new();
                    for component in
                        s.expect_argument()?.split_whitespace()
                    {
                        let segments = component
                            .split('/')
                            .map(|part| self.split_node_id(part, mid))
                            .collect::<Result<Vec<_>>>()?;
                        spec.push(segments);
                    }
                    self.nodes[node].unique.push(spec);
                }
                "default" => match self.nodes[node].kind {
                    SchemaNodeKind::Choice => {
                        let (ns, name) = self
                            .split_node_id(s.expect_argument()?, mid)?;
                        self.nodes[node].default_case = Some((ns, name));
                    }
                    _ => self.nodes[node]
                        .default_text
                        .push(s.expect_argument()?.to_string()),
                },
                "when" => {
                    let expr = self.parse_expr(s.expect_argument()?, mid)?;
                    self.nodes[node].when = Some(expr);
                }
                "must" => {
                    let expr = self.parse_expr(s.expect_argument()?, mid)?;
                    let error_message = s
                        .find1("error-message")
                        .and_then(|m| m.argument())
                        .map(str::to_string);
                    self.nodes[node].musts.push(Must {
                        expr,
                        error_message,
                    });
                }
                "ietf-netconf-acm:default-deny-all" => {
                    self.nodes[node].default_deny = DefaultDeny::All
                }
                "ietf-netconf-acm:default-deny-write" => {
                    self.nodes[node].default_deny = DefaultDeny::Write
                }
                _ => (),
            }
        }
        Ok(())
    }

    fn handle_child(
        &mut self,
        parent: NodeId,
        kind: SchemaNodeKind,
        stmt: &'m Statement,
        mid: usize,
        nsmid: usize,
        changes: Option<&ChangeSet<'m>>,
    ) -> Result<()> {
        if !self.if_features(stmt, mid)? {
            return Ok(());
        }
        let name = stmt.expect_argument()?.to_string();
        let ns = if self.nodes[parent].nsswitch {
            self.modules.module_name(nsmid).to_string()
        } else {
            self.nodes[parent].ns.clone()
        };

        // A non-case child of a choice gets an implicit case wrapper.
        let parent = if self.nodes[parent].kind == SchemaNodeKind::Choice
            && kind != SchemaNodeKind::Case
        {
            let case_id = self.nodes.len();
            self.nodes.push(SchemaNodeData::new(
                SchemaNodeKind::Case,
                &name,
                &ns,
                Some(parent),
            ));
            self.nodes[parent].children.push(case_id);
            case_id
        } else {
            parent
        };

        let mut node =
            SchemaNodeData::new(kind, &name, &ns, Some(parent));
        if matches!(kind, SchemaNodeKind::Leaf | SchemaNodeKind::LeafList)
        {
            let tstmt = stmt.find1("type").ok_or_else(|| {
                Error::BadYangLibrary(format!(
                    "node '{}' without a type",
                    name
                ))
            })?;
            let resolved = resolve_type(self.modules, mid, tstmt)?;
            node.dtype = Some(resolved.dtype);
            node.typedef_default = resolved.default;
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);

        let child_changes = changes.and_then(|c| c.subset(&name));
        self.handle_substatements(id, stmt, mid, nsmid, child_changes)?;

        // Apply the overlay patches addressed to this node.
        if let Some(changes) = child_changes {
            for (pmid, patch) in changes.patch.iter().copied() {
                match patch.keyword() {
                    "refine" => self.handle_substatements(
                        id, patch, pmid, pmid, None,
                    )?,
                    "augment" => self.handle_augment_body(
                        id, patch, pmid, pmid, None,
                    )?,
                    _ => (),
                }
            }
        }

        self.finish_node(id, mid)
    }

    fn handle_uses(
        &mut self,
        node: NodeId,
        stmt: &'m Statement,
        mid: usize,
        nsmid: usize,
        changes: Option<&ChangeSet<'m>>,
    ) -> Result<()> {
        if !self.if_features(stmt, mid)? {
            return Ok(());
        }
        let name = stmt.expect_argument()?;
        let (gmid, grouping) =
            self.modules.find_grouping(mid, name).ok_or_else(|| {
                Error::BadYangLibrary(format!(
                    "unknown grouping '{}'",
                    name
                ))
            })?;

        // Join the change sets of refine/augment siblings into the
        // current overlay.
        let mut joined = changes.cloned().unwrap_or_default();
        for refine in stmt.find_all("refine") {
            joined = joined.join(ChangeSet::from_statement(mid, refine)?);
        }
        for augment in stmt.find_all("augment") {
            joined =
                joined.join(ChangeSet::from_statement(mid, augment)?);
        }

        // The grouping body is expanded with the namespace of the using
        // module; gmid only drives the resolution of references inside
        // the grouping.
        self.handle_substatements(node, grouping, gmid, nsmid, Some(&joined))
    }

    /// Apply a module-level `augment` statement. Namespace switching is
    /// enabled at the target so that the new children carry the
    /// augmenting module's namespace.
    fn apply_augment(
        &mut self,
        stmt: &'m Statement,
        mid: usize,
    ) -> Result<()> {
        if !self.if_features(stmt, mid)? {
            return Ok(());
        }
        let path = stmt.expect_argument()?;
        let target = self.resolve_schema_path(path, mid)?;
        let saved = self.nodes[target].nsswitch;
        self.nodes[target].nsswitch = true;
        let result = self.handle_augment_body(target, stmt, mid, mid, None);
        self.nodes[target].nsswitch = saved;
        result
    }

    /// Dispatch only the data-definition statements of an `augment` body;
    /// its `when`/`if-feature`/`description` substatements do not belong
    /// to the target node.
    fn handle_augment_body(
        &mut self,
        node: NodeId,
        stmt: &'m Statement,
        mid: usize,
        nsmid: usize,
        changes: Option<&ChangeSet<'m>>,
    ) -> Result<()> {
        for s in stmt.substatements() {
            if s.prefix().is_some() {
                continue;
            }
            let kind = match s.keyword() {
                "container" => Some(SchemaNodeKind::Container),
                "list" => Some(SchemaNodeKind::List),
                "leaf" => Some(SchemaNodeKind::Leaf),
                "leaf-list" => Some(SchemaNodeKind::LeafList),
                "choice" => Some(SchemaNodeKind::Choice),
                "case" => Some(SchemaNodeKind::Case),
                "anydata" => Some(SchemaNodeKind::AnyData),
                "anyxml" => Some(SchemaNodeKind::AnyXml),
                _ => None,
            };
            match kind {
                Some(kind) => {
                    self.handle_child(node, kind, s, mid, nsmid, changes)?
                }
                None if s.keyword() == "uses" => {
                    self.handle_uses(node, s, mid, nsmid, changes)?
                }
                None => (),
            }
        }
        Ok(())
    }

    /// Finish a node once its substatements and patches are applied:
    /// parse the collected default values with the resolved type.
    fn finish_node(&mut self, id: NodeId, mid: usize) -> Result<()> {
        match self.nodes[id].kind {
            SchemaNodeKind::Leaf => {
                let text = self.nodes[id]
                    .default_text
                    .last()
                    .cloned()
                    .or_else(|| self.nodes[id].typedef_default.clone());
                if let Some(text) = text {
                    let value = self.parse_default(id, mid, &text)?;
                    self.nodes[id].default = Some(value);
                }
            }
            SchemaNodeKind::LeafList => {
                let texts = if self.nodes[id].default_text.is_empty() {
                    self.nodes[id]
                        .typedef_default
                        .clone()
                        .into_iter()
                        .collect()
                } else {
                    self.nodes[id].default_text.clone()
                };
                for text in texts {
                    let value = self.parse_default(id, mid, &text)?;
                    self.nodes[id].defaults.push(value);
                }
            }
            _ => (),
        }
        Ok(())
    }

    fn parse_default(
        &self,
        id: NodeId,
        mid: usize,
        text: &str,
    ) -> Result<Value> {
        let dtype = self.nodes[id].dtype.as_ref().ok_or_else(|| {
            Error::BadYangLibrary(format!(
                "default on untyped node '{}'",
                self.nodes[id].name
            ))
        })?;
        // Identityref defaults are written with a module prefix; translate
        // it to the module name before parsing.
        let translated;
        let mut text = text;
        if matches!(dtype, DataType::IdentityRef { .. }) {
            if let Some((prefix, local)) = text.split_once(':') {
                if let Some(module) =
                    self.modules.prefix_module_name(mid, prefix)
                {
                    translated = format!("{}:{}", module, local);
                    text = &translated;
                }
            }
        }
        dtype.parse_value(text).map_err(|e| {
            Error::BadYangLibrary(format!(
                "invalid default '{}' of node '{}': {}",
                text, self.nodes[id].name, e
            ))
        })
    }

    /// Evaluate the `if-feature` expressions of a statement. Unknown
    /// features are a prerequisite error; disabled features drop the
    /// statement.
    fn if_features(&self, stmt: &Statement, mid: usize) -> Result<bool> {
        for s in stmt.find_all("if-feature") {
            if !self.feature_expr(s.expect_argument()?, mid)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn feature_expr(&self, text: &str, mid: usize) -> Result<bool> {
        let mut parser = Parser::new(text);
        let value = self.feature_or(&mut parser, mid)?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(Error::BadYangLibrary(format!(
                "invalid if-feature expression '{}'",
                text
            )));
        }
        Ok(value)
    }

    fn feature_or(
        &self,
        parser: &mut Parser<'_>,
        mid: usize,
    ) -> Result<bool> {
        let mut value = self.feature_and(parser, mid)?;
        loop {
            parser.skip_ws();
            if parser.accept_word("or") {
                value |= self.feature_and(parser, mid)?;
            } else {
                return Ok(value);
            }
        }
    }

    fn feature_and(
        &self,
        parser: &mut Parser<'_>,
        mid: usize,
    ) -> Result<bool> {
        let mut value = self.feature_term(parser, mid)?;
        loop {
            parser.skip_ws();
            if parser.accept_word("and") {
                value &= self.feature_term(parser, mid)?;
            } else {
                return Ok(value);
            }
        }
    }

    fn feature_term(
        &self,
        parser: &mut Parser<'_>,
        mid: usize,
    ) -> Result<bool> {
        parser.skip_ws();
        if parser.accept_word("not") {
            return Ok(!self.feature_term(parser, mid)?);
        }
        if parser.accept("(") {
            let value = self.feature_or(parser, mid)?;
            parser.skip_ws();
            parser.char(')').map_err(|_| {
                Error::BadYangLibrary(
                    "unbalanced if-feature expression".to_string(),
                )
            })?;
            return Ok(value);
        }
        let (prefix, name) = parser.prefixed_name().map_err(|_| {
            Error::BadYangLibrary(
                "invalid if-feature expression".to_string(),
            )
        })?;
        let fmid = match prefix {
            Some(prefix) => self
                .modules
                .prefix_to_module(mid, prefix)
                .ok_or_else(|| {
                    Error::BadYangLibrary(format!(
                        "unknown prefix '{}'",
                        prefix
                    ))
                })?,
            None => mid,
        };
        let module = self.modules.module(fmid);
        if !module.declared_features.contains(name) {
            return Err(Error::FeaturePrerequisite {
                module: module.name.clone(),
                feature: name.to_string(),
            });
        }
        Ok(module.features.contains(name))
    }

    fn parse_expr(&self, text: &str, mid: usize) -> Result<Expr> {
        let modules = self.modules;
        let resolver = |prefix: &str| {
            modules.prefix_module_name(mid, prefix).map(str::to_string)
        };
        xpath::parse_expr(text, &resolver)
    }

    /// Split a `[prefix:]name` schema node identifier, resolving the
    /// prefix to a module name.
    fn split_node_id(
        &self,
        text: &str,
        mid: usize,
    ) -> Result<(Option<String>, String)> {
        match text.split_once(':') {
            Some((prefix, local)) => {
                let module = self
                    .modules
                    .prefix_module_name(mid, prefix)
                    .ok_or_else(|| {
                        Error::BadYangLibrary(format!(
                            "unknown prefix '{}'",
                            prefix
                        ))
                    })?;
                Ok((Some(module.to_string()), local.to_string()))
            }
            None => Ok((None, text.to_string())),
        }
    }

    /// Resolve an absolute schema node path (an augment target).
    fn resolve_schema_path(
        &self,
        path: &str,
        mid: usize,
    ) -> Result<NodeId> {
        let mut node = 0;
        for part in path.split('/') {
            if part.is_empty() {
                continue;
            }
            let (ns, name) = self.split_node_id(part, mid)?;
            let ns =
                ns.unwrap_or_else(|| self.modules.module_name(mid).into());
            node = self.nodes[node]
                .children
                .iter()
                .copied()
                .find(|id| {
                    self.nodes[*id].name == name && self.nodes[*id].ns == ns
                })
                .ok_or_else(|| {
                    Error::BadYangLibrary(format!(
                        "augment target '{}' not found",
                        path
                    ))
                })?;
        }
        Ok(node)
    }

    /// Every declared list key must resolve to a leaf child.
    fn check_list_keys(&self) -> Result<()> {
        for node in &self.nodes {
            if node.kind != SchemaNodeKind::List {
                continue;
            }
            for (name, ns) in &node.keys {
                let ns = ns.as_deref().unwrap_or(&node.ns);
                let found = node.children.iter().any(|id| {
                    self.nodes[*id].kind == SchemaNodeKind::Leaf
                        && self.nodes[*id].name == *name
                        && self.nodes[*id].ns == ns
                });
                if !found {
                    return Err(Error::BadYangLibrary(format!(
                        "list '{}' has no key leaf '{}'",
                        node.name, name
                    )));
                }
            }
        }
        Ok(())
    }
}
