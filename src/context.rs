//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG data model context.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Deserialize;

use crate::data::InstanceNode;
use crate::error::{Error, Result};
use crate::path::{InstanceIdParser, InstanceRoute, ResourceIdParser};
use crate::schema::{SchemaBuilder, SchemaNode, SchemaNodeData, SchemaNodeKind};
use crate::statement::{self, Statement};

/// Context of a YANG data model.
///
/// The context owns the parsed modules listed by a YANG library document
/// (RFC 7895) and the schema tree assembled from them. After construction
/// it is read-only and safe to share across threads.
#[derive(Debug)]
pub struct Context {
    module_set_id: String,
    pub(crate) modules: ModuleSet,
    pub(crate) snodes: Vec<SchemaNodeData>,
}

/// Supplies YANG module sources as parsed statement trees.
pub trait ModuleLoader {
    /// Load the module (or submodule) with the given name and optional
    /// revision.
    fn load(&self, name: &str, revision: Option<&str>) -> Result<Statement>;
}

/// Loads modules from `name[@revision].yang` files found on a search path.
#[derive(Debug)]
pub struct FileLoader {
    search_dirs: Vec<PathBuf>,
}

impl FileLoader {
    pub fn new<I, P>(search_dirs: I) -> FileLoader
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        FileLoader {
            search_dirs: search_dirs.into_iter().map(Into::into).collect(),
        }
    }
}

impl ModuleLoader for FileLoader {
    fn load(&self, name: &str, revision: Option<&str>) -> Result<Statement> {
        for dir in &self.search_dirs {
            let mut candidates = Vec::new();
            if let Some(revision) = revision {
                candidates.push(dir.join(format!("{}@{}.yang", name, revision)));
            }
            candidates.push(dir.join(format!("{}.yang", name)));
            for path in candidates {
                let Ok(text) = std::fs::read_to_string(&path) else {
                    continue;
                };
                log::debug!(
                    "loading module '{}' from {}",
                    name,
                    path.display()
                );
                return statement::parse(&text).map_err(|e| {
                    Error::BadYangLibrary(format!(
                        "module '{}': {}",
                        name, e
                    ))
                });
            }
        }
        Err(Error::ModuleNotFound {
            name: name.to_string(),
            revision: revision.map(str::to_string),
        })
    }
}

/// A static map of embedded YANG modules, keyed by name and optional
/// revision. Useful for tests and for applications shipping their models
/// in the binary.
#[derive(Debug, Default)]
pub struct EmbeddedModules {
    modules: HashMap<(&'static str, Option<&'static str>), &'static str>,
}

impl EmbeddedModules {
    pub fn new() -> EmbeddedModules {
        EmbeddedModules::default()
    }

    pub fn add(
        &mut self,
        name: &'static str,
        revision: Option<&'static str>,
        data: &'static str,
    ) {
        self.modules.insert((name, revision), data);
    }
}

impl ModuleLoader for EmbeddedModules {
    fn load(&self, name: &str, revision: Option<&str>) -> Result<Statement> {
        let data = self
            .modules
            .get(&(name, revision))
            .or_else(|| self.modules.get(&(name, None)))
            .or_else(|| {
                self.modules
                    .iter()
                    .find(|((n, _), _)| *n == name)
                    .map(|(_, data)| data)
            })
            .ok_or_else(|| Error::ModuleNotFound {
                name: name.to_string(),
                revision: revision.map(str::to_string),
            })?;
        statement::parse(data).map_err(|e| {
            Error::BadYangLibrary(format!("module '{}': {}", name, e))
        })
    }
}

// ===== YANG library decoding (RFC 7895) =====

#[derive(Debug, Deserialize)]
struct YangLibrary {
    #[serde(rename = "ietf-yang-library:modules-state")]
    modules_state: ModulesState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ModulesState {
    module_set_id: String,
    #[serde(default)]
    module: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ModuleEntry {
    name: String,
    #[serde(default)]
    revision: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    feature: Vec<String>,
    #[serde(default)]
    deviation: Vec<serde_json::Value>,
    conformance_type: String,
    #[serde(default)]
    submodule: Vec<SubmoduleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SubmoduleEntry {
    name: String,
    #[serde(default)]
    revision: String,
}

// ===== module set =====

/// The set of modules listed by the YANG library, with prefix maps and
/// the identity derivation closure.
#[derive(Debug)]
pub(crate) struct ModuleSet {
    pub(crate) modules: Vec<ModuleData>,
    /// Identity qname to the identities directly derived from it.
    derived: HashMap<String, Vec<String>>,
}

#[derive(Debug)]
pub(crate) struct ModuleData {
    pub(crate) name: String,
    pub(crate) revision: Option<String>,
    pub(crate) namespace: String,
    pub(crate) prefix: String,
    pub(crate) implemented: bool,
    /// Features enabled by the YANG library entry.
    pub(crate) features: HashSet<String>,
    /// Features declared by the module text (and its submodules).
    pub(crate) declared_features: HashSet<String>,
    pub(crate) statement: Statement,
    /// Prefixes usable inside this module, including its own and those of
    /// its submodules.
    own_prefixes: Vec<String>,
    prefix_map: HashMap<String, usize>,
}

impl ModuleSet {
    pub(crate) fn module(&self, mid: usize) -> &ModuleData {
        &self.modules[mid]
    }

    pub(crate) fn module_name(&self, mid: usize) -> &str {
        &self.modules[mid].name
    }

    pub(crate) fn iter_implemented(
        &self,
    ) -> impl Iterator<Item = (usize, &ModuleData)> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, m)| m.implemented)
    }

    /// Resolve a prefix in the context of module `mid`.
    pub(crate) fn prefix_to_module(
        &self,
        mid: usize,
        prefix: &str,
    ) -> Option<usize> {
        self.modules[mid].prefix_map.get(prefix).copied()
    }

    /// Resolve a prefix to the name of the module it designates.
    pub(crate) fn prefix_module_name(
        &self,
        mid: usize,
        prefix: &str,
    ) -> Option<&str> {
        self.prefix_to_module(mid, prefix)
            .map(|idx| self.modules[idx].name.as_str())
    }

    /// Find a typedef visible from module `mid` under the given
    /// (possibly prefixed) name.
    pub(crate) fn find_typedef(
        &self,
        mid: usize,
        name: &str,
    ) -> Option<(usize, &Statement)> {
        self.find_definition(mid, name, "typedef")
    }

    /// Find a grouping visible from module `mid`.
    pub(crate) fn find_grouping(
        &self,
        mid: usize,
        name: &str,
    ) -> Option<(usize, &Statement)> {
        self.find_definition(mid, name, "grouping")
    }

    fn find_definition(
        &self,
        mid: usize,
        name: &str,
        keyword: &str,
    ) -> Option<(usize, &Statement)> {
        let (tmid, local) = match name.split_once(':') {
            Some((prefix, local)) => {
                (self.prefix_to_module(mid, prefix)?, local)
            }
            None => (mid, name),
        };
        find_definition_in(&self.modules[tmid].statement, keyword, local)
            .map(|stmt| (tmid, stmt))
    }

    /// All identities transitively derived from every one of `bases`
    /// (their intersection), in `module:name` form.
    pub(crate) fn derived_identities(
        &self,
        bases: &[String],
    ) -> BTreeSet<String> {
        let mut result: Option<BTreeSet<String>> = None;
        for base in bases {
            let mut derived = BTreeSet::new();
            let mut queue = vec![base.clone()];
            while let Some(identity) = queue.pop() {
                for next in
                    self.derived.get(&identity).into_iter().flatten()
                {
                    if derived.insert(next.clone()) {
                        queue.push(next.clone());
                    }
                }
            }
            result = Some(match result {
                Some(acc) => {
                    acc.intersection(&derived).cloned().collect()
                }
                None => derived,
            });
        }
        result.unwrap_or_default()
    }

    /// Collect the identity statements of all modules and build the
    /// derivation map.
    fn build_derived(&mut self) -> Result<()> {
        let mut edges: Vec<(String, String)> = Vec::new();
        for (mid, module) in self.modules.iter().enumerate() {
            for identity in module.statement.find_all("identity") {
                let name = identity.expect_argument()?;
                let qname = format!("{}:{}", module.name, name);
                for base in identity.find_all("base") {
                    let base_arg = base.expect_argument()?;
                    let base_qname = match base_arg.split_once(':') {
                        Some((prefix, local)) => {
                            let bmod = self
                                .prefix_to_module(mid, prefix)
                                .ok_or_else(|| {
                                    Error::BadYangLibrary(format!(
                                        "unknown prefix '{}'",
                                        prefix
                                    ))
                                })?;
                            format!(
                                "{}:{}",
                                self.modules[bmod].name, local
                            )
                        }
                        None => format!("{}:{}", module.name, base_arg),
                    };
                    edges.push((base_qname, qname.clone()));
                }
            }
        }
        for (base, derived) in edges {
            self.derived.entry(base).or_default().push(derived);
        }
        Ok(())
    }
}

fn find_definition_in<'s>(
    stmt: &'s Statement,
    keyword: &str,
    name: &str,
) -> Option<&'s Statement> {
    for s in stmt.substatements() {
        if s.keyword() == keyword && s.argument() == Some(name) {
            return Some(s);
        }
        if let Some(found) = find_definition_in(s, keyword, name) {
            return Some(found);
        }
    }
    None
}

/// A YANG module of a [`Context`].
#[derive(Clone, Copy, Debug)]
pub struct Module<'a> {
    context: &'a Context,
    id: usize,
}

impl<'a> Module<'a> {
    fn data(&self) -> &'a ModuleData {
        &self.context.modules.modules[self.id]
    }

    /// Name of the module.
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// Revision of the module.
    pub fn revision(&self) -> Option<&'a str> {
        self.data().revision.as_deref()
    }

    /// Namespace URI of the module.
    pub fn namespace(&self) -> &'a str {
        &self.data().namespace
    }

    /// Prefix of the module.
    pub fn prefix(&self) -> &'a str {
        &self.data().prefix
    }

    /// Return true if the module is implemented, not just imported.
    pub fn is_implemented(&self) -> bool {
        self.data().implemented
    }

    /// Features of the module enabled in the data model.
    pub fn features(&self) -> impl Iterator<Item = &'a str> {
        self.data().features.iter().map(String::as_str)
    }
}

// ===== impl Context =====

impl Context {
    /// Create a context from a YANG library document passed as a JSON
    /// string.
    pub fn from_yang_library_str(
        ylib: &str,
        loader: &dyn ModuleLoader,
    ) -> Result<Context> {
        let value: serde_json::Value = serde_json::from_str(ylib)
            .map_err(|e| Error::BadYangLibrary(e.to_string()))?;
        Context::from_yang_library(&value, loader)
    }

    /// Create a context from a decoded YANG library document, loading
    /// every referenced module through `loader` and assembling the schema
    /// tree.
    pub fn from_yang_library(
        ylib: &serde_json::Value,
        loader: &dyn ModuleLoader,
    ) -> Result<Context> {
        let library: YangLibrary = serde_json::from_value(ylib.clone())
            .map_err(|e| Error::BadYangLibrary(e.to_string()))?;
        let state = library.modules_state;

        // Each module may be implemented in at most one revision.
        let mut implemented: HashSet<&str> = HashSet::new();
        for entry in &state.module {
            if entry.conformance_type == "implement"
                && !implemented.insert(entry.name.as_str())
            {
                return Err(Error::MultipleImplementedRevisions(
                    entry.name.clone(),
                ));
            }
        }

        let mut modules = Vec::new();
        for entry in &state.module {
            modules.push(load_module(entry, loader)?);
        }

        // Prefix maps: the module's own prefixes plus one entry per
        // import.
        let mut prefix_maps = Vec::new();
        for (own, module) in modules.iter().enumerate() {
            let mut map = HashMap::new();
            for prefix in &module.own_prefixes {
                map.insert(prefix.clone(), own);
            }
            for import in module.statement.find_all("import") {
                let iname = import.expect_argument()?;
                let iprefix = import
                    .find1("prefix")
                    .and_then(|p| p.argument())
                    .ok_or_else(|| {
                        Error::BadYangLibrary(format!(
                            "import of '{}' without a prefix",
                            iname
                        ))
                    })?;
                let revision = import
                    .find1("revision-date")
                    .and_then(|r| r.argument());
                let target = modules
                    .iter()
                    .position(|m| {
                        m.name == iname
                            && revision
                                .map_or(true, |r| m.revision.as_deref() == Some(r))
                    })
                    .ok_or_else(|| Error::ModuleNotFound {
                        name: iname.to_string(),
                        revision: revision.map(str::to_string),
                    })?;
                map.insert(iprefix.to_string(), target);
            }
            prefix_maps.push(map);
        }
        for (module, map) in modules.iter_mut().zip(prefix_maps) {
            module.prefix_map = map;
        }

        let mut module_set = ModuleSet {
            modules,
            derived: HashMap::new(),
        };
        module_set.build_derived()?;

        let snodes = SchemaBuilder::build(&module_set)?;
        Ok(Context {
            module_set_id: state.module_set_id,
            modules: module_set,
            snodes,
        })
    }

    /// The module-set id published by the YANG library.
    pub fn module_set_id(&self) -> &str {
        &self.module_set_id
    }

    /// The root of the schema tree.
    pub fn schema(&self) -> SchemaNode<'_> {
        SchemaNode::new(self, 0)
    }

    /// The modules of the data model, in YANG library order.
    pub fn modules(&self) -> impl Iterator<Item = Module<'_>> {
        (0..self.modules.modules.len())
            .map(move |id| Module { context: self, id })
    }

    /// Returns an iterator over all nodes of the schema tree (depth-first
    /// search algorithm).
    pub fn traverse(&self) -> impl Iterator<Item = SchemaNode<'_>> {
        self.schema().traverse().skip(1)
    }

    /// Cook a raw (JSON-decoded) instance document into a zipper focused
    /// on its root.
    pub fn from_raw(&self, raw: &serde_json::Value) -> Result<InstanceNode<'_>> {
        let value = self.schema().from_raw(raw)?;
        Ok(InstanceNode::root(self, value))
    }

    /// Parse a RESTCONF resource identifier against the schema.
    pub fn parse_resource_id(&self, text: &str) -> Result<InstanceRoute> {
        ResourceIdParser::parse(self, text)
    }

    /// Parse a YANG instance identifier against the schema.
    pub fn parse_instance_id(&self, text: &str) -> Result<InstanceRoute> {
        InstanceIdParser::parse(self, text)
    }

    /// Render the schema tree as ASCII art.
    pub fn ascii_tree(&self) -> String {
        let mut output = String::new();
        let children: Vec<_> = self.schema().children().collect();
        for (index, child) in children.iter().enumerate() {
            render_tree(
                *child,
                "",
                index + 1 == children.len(),
                &mut output,
            );
        }
        output
    }

    /// Produce a JSON digest of the schema tree.
    pub fn schema_digest(&self) -> String {
        let digest = serde_json::json!({
            "module-set-id": self.module_set_id,
            "config": true,
            "children": digest_children(self.schema()),
        });
        digest.to_string()
    }
}

fn load_module(
    entry: &ModuleEntry,
    loader: &dyn ModuleLoader,
) -> Result<ModuleData> {
    let revision = (!entry.revision.is_empty())
        .then(|| entry.revision.clone());
    let mut statement = loader.load(&entry.name, revision.as_deref())?;
    if statement.keyword() != "module"
        || statement.argument() != Some(entry.name.as_str())
    {
        return Err(Error::BadYangLibrary(format!(
            "'{}' is not a module",
            entry.name
        )));
    }
    let prefix = statement
        .find1("prefix")
        .and_then(|p| p.argument())
        .ok_or_else(|| {
            Error::BadYangLibrary(format!(
                "module '{}' without a prefix",
                entry.name
            ))
        })?
        .to_string();
    let namespace = statement
        .find1("namespace")
        .and_then(|n| n.argument())
        .unwrap_or_default()
        .to_string();
    if !entry.namespace.is_empty() && namespace != entry.namespace {
        log::warn!(
            "module '{}': namespace differs from the YANG library",
            entry.name
        );
    }
    if !entry.deviation.is_empty() {
        log::warn!(
            "module '{}': deviations are not applied",
            entry.name
        );
    }

    let mut declared_features: HashSet<String> = statement
        .find_all("feature")
        .filter_map(|f| f.argument())
        .map(str::to_string)
        .collect();
    let mut own_prefixes = vec![prefix.clone()];

    // Splice the substatements of every listed submodule into the
    // including module.
    for submodule in &entry.submodule {
        let subrev = (!submodule.revision.is_empty())
            .then_some(submodule.revision.as_str());
        let substmt = loader.load(&submodule.name, subrev)?;
        if substmt.keyword() != "submodule" {
            return Err(Error::BadYangLibrary(format!(
                "'{}' is not a submodule",
                submodule.name
            )));
        }
        if let Some(belongs_to) = substmt.find1("belongs-to") {
            if let Some(p) =
                belongs_to.find1("prefix").and_then(|p| p.argument())
            {
                own_prefixes.push(p.to_string());
            }
        }
        declared_features.extend(
            substmt
                .find_all("feature")
                .filter_map(|f| f.argument())
                .map(str::to_string),
        );
        for s in substmt.substatements() {
            if !matches!(s.keyword(), "belongs-to" | "yang-version") {
                statement.substatements_mut().push(s.clone());
            }
        }
    }

    Ok(ModuleData {
        name: entry.name.clone(),
        revision,
        namespace,
        prefix,
        implemented: entry.conformance_type == "implement",
        features: entry.feature.iter().cloned().collect(),
        declared_features,
        statement,
        own_prefixes,
        prefix_map: HashMap::new(),
    })
}

// ===== schema output =====

fn render_tree(
    snode: SchemaNode<'_>,
    indent: &str,
    last: bool,
    output: &mut String,
) {
    let flags = match snode.kind() {
        SchemaNodeKind::Choice | SchemaNodeKind::Case => "--".to_string(),
        _ => {
            if snode.config() {
                "rw".to_string()
            } else {
                "ro".to_string()
            }
        }
    };
    let name = match snode.kind() {
        SchemaNodeKind::Choice => format!("({})", snode.iname()),
        SchemaNodeKind::Case => format!(":({})", snode.iname()),
        _ => snode.iname(),
    };
    let mut line = format!("{}+--{} {}", indent, flags, name);
    match snode.kind() {
        SchemaNodeKind::List => {
            line.push('*');
            let keys: Vec<&str> = snode
                .keys()
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            if !keys.is_empty() {
                let _ = write!(line, " [{}]", keys.join(" "));
            }
        }
        SchemaNodeKind::LeafList => {
            line.push('*');
            if let Some(dtype) = snode.dtype() {
                let _ = write!(line, "   {}", dtype.name());
            }
        }
        SchemaNodeKind::Leaf => {
            if !snode.is_mandatory() {
                line.push('?');
            }
            if let Some(dtype) = snode.dtype() {
                let _ = write!(line, "   {}", dtype.name());
            }
        }
        SchemaNodeKind::Container => {
            if snode.is_presence_container() {
                line.push('!');
            }
        }
        _ => (),
    }
    output.push_str(&line);
    output.push('\n');

    let next_indent = if last {
        format!("{}   ", indent)
    } else {
        format!("{}|  ", indent)
    };
    let children: Vec<_> = snode.children().collect();
    for (index, child) in children.iter().enumerate() {
        render_tree(
            *child,
            &next_indent,
            index + 1 == children.len(),
            output,
        );
    }
}

fn digest_children(snode: SchemaNode<'_>) -> serde_json::Value {
    let mut children = serde_json::Map::new();
    for child in snode.children() {
        children.insert(child.iname(), digest_node(child));
    }
    serde_json::Value::Object(children)
}

fn digest_node(snode: SchemaNode<'_>) -> serde_json::Value {
    let kind = match snode.kind() {
        SchemaNodeKind::Root => "root",
        SchemaNodeKind::Container => "container",
        SchemaNodeKind::List => "list",
        SchemaNodeKind::Leaf => "leaf",
        SchemaNodeKind::LeafList => "leaf-list",
        SchemaNodeKind::Choice => "choice",
        SchemaNodeKind::Case => "case",
        SchemaNodeKind::AnyData => "anydata",
        SchemaNodeKind::AnyXml => "anyxml",
    };
    let mut digest = serde_json::Map::new();
    digest.insert("kind".into(), kind.into());
    digest.insert("config".into(), snode.config().into());
    match snode.kind() {
        SchemaNodeKind::List => {
            let keys: Vec<String> = snode
                .keys()
                .iter()
                .map(|(name, _)| name.clone())
                .collect();
            digest.insert("keys".into(), keys.into());
        }
        SchemaNodeKind::Container => {
            digest.insert(
                "presence".into(),
                snode.is_presence_container().into(),
            );
        }
        SchemaNodeKind::Leaf | SchemaNodeKind::LeafList => {
            if let Some(dtype) = snode.dtype() {
                digest.insert("type".into(), dtype.name().into());
            }
        }
        _ => (),
    }
    if snode.is_internal() {
        digest.insert("children".into(), digest_children(snode));
    }
    serde_json::Value::Object(digest)
}
