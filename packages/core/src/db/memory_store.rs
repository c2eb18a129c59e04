//! In-memory tree store
//!
//! Arena-backed implementation of [`TreeStore`]. Nodes live in a vector of
//! slots addressed by [`NodeId`]; removing a node leaves a tombstone so ids
//! are never reused. Paths are computed from parent links on every request.
//!
//! # Architecture
//!
//! - One `Workspace` behind a `tokio::sync::RwLock`, shared by all sessions
//! - Built-in `nt:`/`mix:`/`rep:` types registered at construction
//! - `/jcr:system` created at construction; version snapshots are kept
//!   out of the arena in per-node histories
//! - Writes to a checked-in versionable node (or anything below it) fail
//!   with `StoreError::CheckedIn`
//!
//! The store can be flipped to "unavailable" to exercise outage handling.

use super::error::{StoreError, StoreResult};
use super::query::EqualityQuery;
use super::tree_store::{
    Credentials, FrozenNode, NodeData, NodeId, NodeTypeDefinition, PropertyValue, TreeSession,
    TreeStore, VersionRecord,
};
use crate::constants::{
    FROZEN_NODE, MIX_CREATED, MIX_REFERENCEABLE, MIX_VERSIONABLE, JCR_CREATED, NT_BASE, NT_FILE,
    NT_FOLDER, NT_RESOURCE, NT_UNSTRUCTURED, REP_ROOT, REP_SYSTEM, ROOT_VERSION, SYSTEM_NODE,
    VERSION_STORAGE_NODE,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

const BUILTIN_NAMESPACES: &[(&str, &str)] = &[
    ("jcr", "http://www.jcp.org/jcr/1.0"),
    ("nt", "http://www.jcp.org/jcr/nt/1.0"),
    ("mix", "http://www.jcp.org/jcr/mix/1.0"),
    ("rep", "internal"),
];

const NT_HIERARCHY_NODE: &str = "nt:hierarchyNode";
const NT_FROZEN_NODE: &str = "nt:frozenNode";
const REP_VERSION_STORAGE: &str = "rep:versionStorage";

fn builtin_node_types() -> Vec<NodeTypeDefinition> {
    let primary = |name: &str, supertypes: &[&str]| NodeTypeDefinition {
        name: name.to_string(),
        supertypes: supertypes.iter().map(|s| s.to_string()).collect(),
        is_mixin: false,
        properties: Vec::new(),
    };
    let mixin = |name: &str, supertypes: &[&str]| NodeTypeDefinition {
        is_mixin: true,
        ..primary(name, supertypes)
    };

    vec![
        primary(NT_BASE, &[]),
        mixin(MIX_CREATED, &[]),
        mixin(MIX_REFERENCEABLE, &[]),
        mixin(MIX_VERSIONABLE, &[MIX_REFERENCEABLE]),
        primary(NT_HIERARCHY_NODE, &[NT_BASE, MIX_CREATED]),
        primary(NT_FOLDER, &[NT_HIERARCHY_NODE]),
        primary(NT_FILE, &[NT_HIERARCHY_NODE]),
        primary(NT_RESOURCE, &[NT_BASE]),
        primary(NT_UNSTRUCTURED, &[NT_BASE]),
        primary(NT_FROZEN_NODE, &[NT_BASE]),
        primary(REP_ROOT, &[NT_UNSTRUCTURED]),
        primary(REP_SYSTEM, &[NT_BASE]),
        primary(REP_VERSION_STORAGE, &[NT_BASE]),
    ]
}

/// Arena slot
#[derive(Debug, Clone)]
struct Slot {
    name: String,
    parent: Option<NodeId>,
    primary_type: String,
    mixins: Vec<String>,
    properties: BTreeMap<String, PropertyValue>,
    children: Vec<NodeId>,
    checked_out: bool,
}

impl Slot {
    fn new(name: &str, parent: Option<NodeId>, primary_type: &str) -> Self {
        Self {
            name: name.to_string(),
            parent,
            primary_type: primary_type.to_string(),
            mixins: Vec::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            checked_out: true,
        }
    }
}

#[derive(Debug)]
struct Workspace {
    slots: Vec<Option<Slot>>,
    namespaces: BTreeMap<String, String>,
    node_types: BTreeMap<String, NodeTypeDefinition>,
    histories: HashMap<NodeId, Vec<VersionRecord>>,
}

impl Workspace {
    fn new() -> Self {
        let mut ws = Self {
            slots: Vec::new(),
            namespaces: BUILTIN_NAMESPACES
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
            node_types: builtin_node_types()
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
            histories: HashMap::new(),
        };

        let root = ws.alloc(Slot::new("", None, REP_ROOT));
        let system = ws.alloc(Slot::new(SYSTEM_NODE, Some(root), REP_SYSTEM));
        let storage = ws.alloc(Slot::new(
            VERSION_STORAGE_NODE,
            Some(system),
            REP_VERSION_STORAGE,
        ));
        if let Some(Some(slot)) = ws.slots.get_mut(root.0 as usize) {
            slot.children.push(system);
        }
        if let Some(Some(slot)) = ws.slots.get_mut(system.0 as usize) {
            slot.children.push(storage);
        }
        ws
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn alloc(&mut self, slot: Slot) -> NodeId {
        let id = NodeId(self.slots.len() as u64);
        self.slots.push(Some(slot));
        id
    }

    fn slot(&self, id: NodeId) -> StoreResult<&Slot> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| StoreError::node_not_found(id.to_string()))
    }

    fn slot_mut(&mut self, id: NodeId) -> StoreResult<&mut Slot> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| StoreError::node_not_found(id.to_string()))
    }

    fn path_of(&self, id: NodeId) -> StoreResult<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let slot = self.slot(node)?;
            if slot.parent.is_some() {
                segments.push(slot.name.as_str());
            }
            current = slot.parent;
        }
        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }

    fn child_named(&self, parent: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
        let slot = self.slot(parent)?;
        Ok(slot
            .children
            .iter()
            .copied()
            .find(|c| self.slot(*c).map(|s| s.name == name).unwrap_or(false)))
    }

    fn resolve(&self, path: &str) -> StoreResult<Option<NodeId>> {
        if !path.starts_with('/') {
            return Ok(None);
        }
        let mut current = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match self.child_named(current, segment)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// The type itself plus every transitive supertype.
    fn type_closure(&self, name: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(def) = self.node_types.get(&next) {
                queue.extend(def.supertypes.iter().cloned());
            }
        }
        seen
    }

    fn is_of_type(&self, slot: &Slot, node_type: &str) -> bool {
        std::iter::once(&slot.primary_type)
            .chain(slot.mixins.iter())
            .any(|t| self.type_closure(t).contains(node_type))
    }

    fn is_versionable(&self, id: NodeId) -> StoreResult<bool> {
        let slot = self.slot(id)?;
        Ok(self.is_of_type(slot, MIX_VERSIONABLE))
    }

    /// Fails when the node or its nearest versionable ancestor is checked in.
    fn ensure_writable(&self, id: NodeId) -> StoreResult<()> {
        let mut current = Some(id);
        while let Some(node) = current {
            let slot = self.slot(node)?;
            if self.is_of_type(slot, MIX_VERSIONABLE) {
                if slot.checked_out {
                    return Ok(());
                }
                return Err(StoreError::CheckedIn(self.path_of(node)?));
            }
            current = slot.parent;
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> StoreResult<()> {
        let illegal = |c: char| matches!(c, '/' | '[' | ']' | '*' | '|') || c.is_control();
        if name.is_empty() || name == "." || name == ".." || name.contains(illegal) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if let Some((prefix, local)) = name.split_once(':') {
            if local.is_empty() || local.contains(':') || !self.namespaces.contains_key(prefix) {
                return Err(StoreError::InvalidName(name.to_string()));
            }
        }
        Ok(())
    }

    fn snapshot(&self, id: NodeId) -> StoreResult<NodeData> {
        let slot = self.slot(id)?;
        Ok(NodeData {
            id,
            name: slot.name.clone(),
            path: self.path_of(id)?,
            parent: slot.parent,
            primary_type: slot.primary_type.clone(),
            mixins: slot.mixins.clone(),
            properties: slot.properties.clone(),
            children: slot.children.clone(),
        })
    }

    fn freeze(&self, id: NodeId, as_name: &str) -> StoreResult<FrozenNode> {
        let slot = self.slot(id)?;
        let children = slot
            .children
            .iter()
            .map(|child| {
                let name = self.slot(*child)?.name.clone();
                self.freeze(*child, &name)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(FrozenNode {
            name: as_name.to_string(),
            primary_type: slot.primary_type.clone(),
            mixins: slot.mixins.clone(),
            properties: slot.properties.clone(),
            children,
        })
    }

    fn is_descendant_or_self(&self, candidate: NodeId, ancestor: NodeId) -> StoreResult<bool> {
        let mut current = Some(candidate);
        while let Some(node) = current {
            if node == ancestor {
                return Ok(true);
            }
            current = self.slot(node)?.parent;
        }
        Ok(false)
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if let Ok(slot) = self.slot(id) {
                order.push(id);
                stack.extend(slot.children.iter().rev().copied());
            }
        }
        order
    }

    fn version_path(id: NodeId, version: &str) -> String {
        format!(
            "/{}/{}/{}/{}/{}",
            SYSTEM_NODE, VERSION_STORAGE_NODE, id.0, version, FROZEN_NODE
        )
    }

    fn next_version_name(history: &[VersionRecord]) -> String {
        let last = history.iter().rev().find(|v| v.name != ROOT_VERSION);
        match last.and_then(|v| v.name.split_once('.')) {
            Some((major, minor)) => match (major.parse::<u32>(), minor.parse::<u32>()) {
                (Ok(major), Ok(minor)) => format!("{}.{}", major, minor + 1),
                _ => format!("{}.0", history.len()),
            },
            None => "1.0".to_string(),
        }
    }
}

/// In-memory engine shared by every session it opens.
#[derive(Clone)]
pub struct MemoryTreeStore {
    workspace: Arc<RwLock<Workspace>>,
    credentials: Credentials,
    available: Arc<AtomicBool>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryTreeStore {
    /// Store accepting the default administrative credentials (`admin`/`admin`).
    pub fn new() -> Self {
        Self::with_credentials(Credentials::new("admin", "admin"))
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(Workspace::new())),
            credentials,
            available: Arc::new(AtomicBool::new(true)),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Sessions opened and not yet logged out.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

impl Default for MemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn login(&self, credentials: &Credentials) -> StoreResult<Box<dyn TreeSession>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store is offline"));
        }
        if credentials != &self.credentials {
            return Err(StoreError::LoginFailed {
                user: credentials.user.clone(),
            });
        }

        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            workspace: self.workspace.clone(),
            available: self.available.clone(),
            open_sessions: self.open_sessions.clone(),
            open: AtomicBool::new(true),
            user: credentials.user.clone(),
        }))
    }
}

/// Session over a [`MemoryTreeStore`]; changes apply to the shared arena directly.
pub struct MemorySession {
    workspace: Arc<RwLock<Workspace>>,
    available: Arc<AtomicBool>,
    open_sessions: Arc<AtomicUsize>,
    open: AtomicBool,
    user: String,
}

impl MemorySession {
    fn guard(&self) -> StoreResult<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(StoreError::SessionClosed);
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store went offline"));
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.logout();
    }
}

#[async_trait]
impl TreeSession for MemorySession {
    fn user(&self) -> &str {
        &self.user
    }

    async fn register_namespace(&self, prefix: &str, uri: &str) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;
        match ws.namespaces.get(prefix) {
            Some(existing) if existing == uri => Ok(()),
            Some(existing) => Err(StoreError::NamespaceConflict {
                prefix: prefix.to_string(),
                uri: existing.clone(),
            }),
            None => {
                ws.namespaces.insert(prefix.to_string(), uri.to_string());
                Ok(())
            }
        }
    }

    async fn register_node_types(
        &self,
        definitions: &[NodeTypeDefinition],
    ) -> StoreResult<Vec<String>> {
        self.guard()?;
        let mut ws = self.workspace.write().await;

        let batch: HashSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        for def in definitions {
            let prefix = def.name.split_once(':').map(|(p, _)| p).unwrap_or_default();
            if !ws.namespaces.contains_key(prefix) {
                return Err(StoreError::invalid_definition(format!(
                    "{}: namespace prefix '{}' is not registered",
                    def.name, prefix
                )));
            }
            if let Some(missing) = def
                .supertypes
                .iter()
                .find(|s| !ws.node_types.contains_key(*s) && !batch.contains(s.as_str()))
            {
                return Err(StoreError::invalid_definition(format!(
                    "{}: unknown supertype {}",
                    def.name, missing
                )));
            }
        }

        let mut added = Vec::new();
        for def in definitions {
            if ws.node_types.insert(def.name.clone(), def.clone()).is_none() {
                added.push(def.name.clone());
            }
        }
        Ok(added)
    }

    async fn has_node_type(&self, name: &str) -> StoreResult<bool> {
        self.guard()?;
        Ok(self.workspace.read().await.node_types.contains_key(name))
    }

    async fn root(&self) -> StoreResult<NodeId> {
        self.guard()?;
        Ok(self.workspace.read().await.root())
    }

    async fn node(&self, id: NodeId) -> StoreResult<Option<NodeData>> {
        self.guard()?;
        let ws = self.workspace.read().await;
        match ws.snapshot(id) {
            Ok(data) => Ok(Some(data)),
            Err(StoreError::NodeNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn node_at(&self, path: &str) -> StoreResult<Option<NodeId>> {
        self.guard()?;
        self.workspace.read().await.resolve(path)
    }

    async fn child(&self, parent: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
        self.guard()?;
        self.workspace.read().await.child_named(parent, name)
    }

    async fn children(&self, parent: NodeId) -> StoreResult<Vec<NodeId>> {
        self.guard()?;
        Ok(self.workspace.read().await.slot(parent)?.children.clone())
    }

    async fn path_of(&self, id: NodeId) -> StoreResult<String> {
        self.guard()?;
        self.workspace.read().await.path_of(id)
    }

    async fn add_node(
        &self,
        parent: NodeId,
        name: &str,
        primary_type: &str,
    ) -> StoreResult<NodeId> {
        self.guard()?;
        let mut ws = self.workspace.write().await;

        ws.validate_name(name)?;
        match ws.node_types.get(primary_type) {
            Some(def) if !def.is_mixin => {}
            _ => return Err(StoreError::unknown_node_type(primary_type)),
        }
        ws.ensure_writable(parent)?;
        if ws.child_named(parent, name)?.is_some() {
            let parent_path = ws.path_of(parent)?;
            return Err(StoreError::item_exists(super::tree_store::join_path(
                &parent_path,
                name,
            )));
        }

        let mut slot = Slot::new(name, Some(parent), primary_type);
        if ws.type_closure(primary_type).contains(MIX_CREATED) {
            slot.properties
                .insert(JCR_CREATED.to_string(), PropertyValue::Date(Utc::now()));
        }
        let id = ws.alloc(slot);
        ws.slot_mut(parent)?.children.push(id);
        Ok(id)
    }

    async fn add_mixin(&self, id: NodeId, mixin: &str) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;

        match ws.node_types.get(mixin) {
            Some(def) if def.is_mixin => {}
            _ => return Err(StoreError::unknown_node_type(mixin)),
        }
        if ws.slot(id)?.mixins.iter().any(|m| m == mixin) {
            return Ok(());
        }
        ws.ensure_writable(id)?;
        ws.slot_mut(id)?.mixins.push(mixin.to_string());

        if ws.is_versionable(id)? && !ws.histories.contains_key(&id) {
            let source_path = ws.path_of(id)?;
            let root_version = VersionRecord {
                name: ROOT_VERSION.to_string(),
                created: Utc::now(),
                path: Workspace::version_path(id, ROOT_VERSION),
                source_path,
                frozen: FrozenNode {
                    name: FROZEN_NODE.to_string(),
                    primary_type: NT_FROZEN_NODE.to_string(),
                    mixins: Vec::new(),
                    properties: BTreeMap::new(),
                    children: Vec::new(),
                },
            };
            ws.histories.insert(id, vec![root_version]);
        }
        Ok(())
    }

    async fn set_property(&self, id: NodeId, name: &str, value: PropertyValue) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;
        ws.ensure_writable(id)?;
        ws.slot_mut(id)?.properties.insert(name.to_string(), value);
        Ok(())
    }

    async fn remove_property(&self, id: NodeId, name: &str) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;
        ws.ensure_writable(id)?;
        ws.slot_mut(id)?.properties.remove(name);
        Ok(())
    }

    async fn remove(&self, id: NodeId) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;

        let parent = ws
            .slot(id)?
            .parent
            .ok_or_else(|| StoreError::constraint_violation("cannot remove the root node"))?;
        ws.ensure_writable(parent)?;
        ws.slot_mut(parent)?.children.retain(|c| *c != id);

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(slot) = ws.slots.get_mut(next.0 as usize).and_then(Option::take) {
                stack.extend(slot.children);
            }
        }
        Ok(())
    }

    async fn move_node(&self, id: NodeId, new_parent: NodeId, new_name: &str) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;

        ws.validate_name(new_name)?;
        let (name, old_parent) = {
            let slot = ws.slot(id)?;
            let parent = slot
                .parent
                .ok_or_else(|| StoreError::constraint_violation("cannot move the root node"))?;
            (slot.name.clone(), parent)
        };
        if old_parent == new_parent && name == new_name {
            return Ok(());
        }
        if ws.is_descendant_or_self(new_parent, id)? {
            return Err(StoreError::constraint_violation(format!(
                "cannot move {} below itself",
                ws.path_of(id)?
            )));
        }
        ws.ensure_writable(old_parent)?;
        ws.ensure_writable(new_parent)?;
        if ws.child_named(new_parent, new_name)?.is_some() {
            let target = ws.path_of(new_parent)?;
            return Err(StoreError::item_exists(super::tree_store::join_path(
                &target, new_name,
            )));
        }

        if old_parent != new_parent {
            ws.slot_mut(old_parent)?.children.retain(|c| *c != id);
            ws.slot_mut(new_parent)?.children.push(id);
            ws.slot_mut(id)?.parent = Some(new_parent);
        }
        ws.slot_mut(id)?.name = new_name.to_string();
        Ok(())
    }

    async fn query(&self, query: &EqualityQuery) -> StoreResult<Vec<NodeId>> {
        self.guard()?;
        let ws = self.workspace.read().await;
        Ok(ws
            .document_order()
            .into_iter()
            .filter(|id| {
                ws.slot(*id)
                    .map(|slot| {
                        ws.is_of_type(slot, query.node_type())
                            && query.matches_properties(|name| slot.properties.get(name))
                    })
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn is_versionable(&self, id: NodeId) -> StoreResult<bool> {
        self.guard()?;
        self.workspace.read().await.is_versionable(id)
    }

    async fn is_checked_out(&self, id: NodeId) -> StoreResult<bool> {
        self.guard()?;
        let ws = self.workspace.read().await;
        Ok(ws.slot(id)?.checked_out)
    }

    async fn checkout(&self, id: NodeId) -> StoreResult<()> {
        self.guard()?;
        let mut ws = self.workspace.write().await;
        if !ws.is_versionable(id)? {
            return Err(StoreError::NotVersionable(ws.path_of(id)?));
        }
        ws.slot_mut(id)?.checked_out = true;
        Ok(())
    }

    async fn checkin(&self, id: NodeId) -> StoreResult<String> {
        self.guard()?;
        let mut ws = self.workspace.write().await;
        if !ws.is_versionable(id)? {
            return Err(StoreError::NotVersionable(ws.path_of(id)?));
        }

        let history = ws.histories.get(&id).cloned().unwrap_or_default();
        if !ws.slot(id)?.checked_out {
            return Ok(history
                .last()
                .map(|v| v.name.clone())
                .unwrap_or_else(|| ROOT_VERSION.to_string()));
        }

        let name = Workspace::next_version_name(&history);
        let record = VersionRecord {
            name: name.clone(),
            created: Utc::now(),
            path: Workspace::version_path(id, &name),
            source_path: ws.path_of(id)?,
            frozen: ws.freeze(id, FROZEN_NODE)?,
        };
        ws.histories.entry(id).or_default().push(record);
        ws.slot_mut(id)?.checked_out = false;
        Ok(name)
    }

    async fn version_history(&self, id: NodeId) -> StoreResult<Vec<VersionRecord>> {
        self.guard()?;
        let ws = self.workspace.read().await;
        if !ws.is_versionable(id)? {
            return Err(StoreError::NotVersionable(ws.path_of(id)?));
        }
        Ok(ws.histories.get(&id).cloned().unwrap_or_default())
    }

    async fn save(&self) -> StoreResult<()> {
        self.guard()?;
        tracing::trace!("Session for '{}' saved", self.user);
        Ok(())
    }

    fn logout(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open() -> (MemoryTreeStore, Box<dyn TreeSession>) {
        let store = MemoryTreeStore::new();
        let session = store
            .login(&Credentials::new("admin", "admin"))
            .await
            .unwrap();
        (store, session)
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_credentials() {
        let store = MemoryTreeStore::new();
        let err = store
            .login(&Credentials::new("admin", "wrong"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::LoginFailed { .. }));
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let store = MemoryTreeStore::new();
        store.set_available(false);
        let err = store
            .login(&Credentials::new("admin", "admin"))
            .await
            .err()
            .unwrap();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_paths_follow_moves() {
        let (_store, session) = open().await;
        let root = session.root().await.unwrap();
        let a = session.add_node(root, "a", NT_FOLDER).await.unwrap();
        let b = session.add_node(root, "b", NT_FOLDER).await.unwrap();
        let leaf = session.add_node(a, "leaf", NT_FOLDER).await.unwrap();

        assert_eq!(session.path_of(leaf).await.unwrap(), "/a/leaf");
        session.move_node(leaf, b, "leaf").await.unwrap();
        assert_eq!(session.path_of(leaf).await.unwrap(), "/b/leaf");
        assert_eq!(session.node_at("/b/leaf").await.unwrap(), Some(leaf));
        assert_eq!(session.node_at("/a/leaf").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_move_renames_in_place() {
        let (_store, session) = open().await;
        let root = session.root().await.unwrap();
        let a = session.add_node(root, "a", NT_FOLDER).await.unwrap();
        let leaf = session.add_node(a, "leaf", NT_FOLDER).await.unwrap();
        session.add_node(a, "taken", NT_FOLDER).await.unwrap();

        session.move_node(leaf, a, "renamed").await.unwrap();
        assert_eq!(session.path_of(leaf).await.unwrap(), "/a/renamed");
        assert_eq!(session.children(a).await.unwrap().len(), 2);

        let err = session.move_node(leaf, a, "taken").await.unwrap_err();
        assert_eq!(err, StoreError::ItemExists("/a/taken".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_sibling_rejected() {
        let (_store, session) = open().await;
        let root = session.root().await.unwrap();
        session.add_node(root, "docs", NT_FOLDER).await.unwrap();
        let err = session.add_node(root, "docs", NT_FOLDER).await.unwrap_err();
        assert_eq!(err, StoreError::ItemExists("/docs".to_string()));
    }

    #[tokio::test]
    async fn test_unregistered_mixin_rejected() {
        let (_store, session) = open().await;
        let root = session.root().await.unwrap();
        let node = session.add_node(root, "n", NT_FILE).await.unwrap();
        let err = session.add_mixin(node, "oaf:NodeType").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownNodeType(_)));
    }

    #[tokio::test]
    async fn test_checkin_blocks_writes_until_checkout() {
        let (_store, session) = open().await;
        let root = session.root().await.unwrap();
        let node = session.add_node(root, "page", NT_FILE).await.unwrap();
        session.add_mixin(node, MIX_VERSIONABLE).await.unwrap();

        assert_eq!(session.checkin(node).await.unwrap(), "1.0");
        let err = session
            .set_property(node, "title", PropertyValue::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CheckedIn(_)));

        session.checkout(node).await.unwrap();
        session
            .set_property(node, "title", PropertyValue::from("x"))
            .await
            .unwrap();
        assert_eq!(session.checkin(node).await.unwrap(), "1.1");

        let history = session.version_history(node).await.unwrap();
        let names: Vec<_> = history.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec![ROOT_VERSION, "1.0", "1.1"]);
        assert_eq!(
            history[2].frozen.properties.get("title"),
            Some(&PropertyValue::from("x"))
        );
    }

    #[tokio::test]
    async fn test_remove_subtree_keeps_ids_unique() {
        let (_store, session) = open().await;
        let root = session.root().await.unwrap();
        let a = session.add_node(root, "a", NT_FOLDER).await.unwrap();
        let child = session.add_node(a, "child", NT_FOLDER).await.unwrap();
        session.remove(a).await.unwrap();

        assert!(session.node(a).await.unwrap().is_none());
        assert!(session.node(child).await.unwrap().is_none());
        let again = session.add_node(root, "a", NT_FOLDER).await.unwrap();
        assert_ne!(again, a);
    }

    #[tokio::test]
    async fn test_logout_releases_session() {
        let (store, session) = open().await;
        assert_eq!(store.open_sessions(), 1);
        session.logout();
        session.logout();
        assert_eq!(store.open_sessions(), 0);
        assert_eq!(session.root().await.unwrap_err(), StoreError::SessionClosed);
    }
}
