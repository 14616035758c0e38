//! In-memory block trees.
//!
//! A [`DagNode`] is one block's data model: scalars, byte strings, ordered
//! lists, insertion-ordered maps, and embedded [`Link`]s. Strings, bytes
//! and containers are reference-counted, so cloning a node is cheap and
//! never deep-copies. Containers are shared and interiorly mutable, which
//! lets callers build graphs where the same container appears more than
//! once, including cyclic ones. Consumers that walk a tree must therefore
//! track container identity ([`ContainerId`]).

use std::fmt;
use std::mem;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{TypeError, TypeResult};
use crate::link::Link;

/// Identity of a shared container.
///
/// Derived from the container's address, so it is only meaningful while a
/// handle to the container is alive. Once the last handle is dropped the
/// address may be reused by a new container, which means ids collected
/// from a graph that is being mutated concurrently can collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(usize);

/// The contents of a link slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkValue {
    /// An already-parsed content identifier.
    Cid(Link),
    /// A textual content identifier, parsed when the link is encoded.
    Text(Arc<str>),
}

impl From<Link> for LinkValue {
    fn from(link: Link) -> Self {
        LinkValue::Cid(link)
    }
}

/// One value in a block tree.
#[derive(Clone, Debug)]
pub enum DagNode {
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    Text(Arc<str>),
    Bytes(Arc<[u8]>),
    List(DagList),
    Map(DagMap),
    Link(LinkValue),
}

impl DagNode {
    /// A text node.
    pub fn text(s: impl Into<Arc<str>>) -> Self {
        DagNode::Text(s.into())
    }

    /// A byte-string node.
    pub fn bytes(b: impl Into<Arc<[u8]>>) -> Self {
        DagNode::Bytes(b.into())
    }

    /// A link node holding a parsed identifier.
    pub fn link(link: Link) -> Self {
        DagNode::Link(LinkValue::Cid(link))
    }

    /// A link node holding a textual identifier.
    pub fn link_text(s: impl Into<Arc<str>>) -> Self {
        DagNode::Link(LinkValue::Text(s.into()))
    }

    /// A list node built from the given elements.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = DagNode>,
    {
        DagNode::List(DagList::from_nodes(items.into_iter().collect()))
    }

    /// A map node built from the given entries, in order.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, DagNode)>,
        K: Into<String>,
    {
        DagNode::Map(DagMap::from_entries(entries))
    }

    /// Short name of the value category, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DagNode::Null => "null",
            DagNode::Bool(_) => "bool",
            DagNode::Integer(_) => "integer",
            DagNode::Float(_) => "float",
            DagNode::Text(_) => "text",
            DagNode::Bytes(_) => "bytes",
            DagNode::List(_) => "list",
            DagNode::Map(_) => "map",
            DagNode::Link(_) => "link",
        }
    }

    /// Returns `true` for lists, maps and links.
    pub fn is_container_or_link(&self) -> bool {
        matches!(self, DagNode::List(_) | DagNode::Map(_) | DagNode::Link(_))
    }
}

impl From<bool> for DagNode {
    fn from(v: bool) -> Self {
        DagNode::Bool(v)
    }
}

impl From<i64> for DagNode {
    fn from(v: i64) -> Self {
        DagNode::Integer(v.into())
    }
}

impl From<u64> for DagNode {
    fn from(v: u64) -> Self {
        DagNode::Integer(v.into())
    }
}

impl From<i32> for DagNode {
    fn from(v: i32) -> Self {
        DagNode::Integer(v.into())
    }
}

impl From<f64> for DagNode {
    fn from(v: f64) -> Self {
        DagNode::Float(v)
    }
}

impl From<&str> for DagNode {
    fn from(v: &str) -> Self {
        DagNode::Text(v.into())
    }
}

impl From<String> for DagNode {
    fn from(v: String) -> Self {
        DagNode::Text(v.into())
    }
}

impl From<Vec<u8>> for DagNode {
    fn from(v: Vec<u8>) -> Self {
        DagNode::Bytes(v.into())
    }
}

impl From<Link> for DagNode {
    fn from(v: Link) -> Self {
        DagNode::link(v)
    }
}

impl From<DagList> for DagNode {
    fn from(v: DagList) -> Self {
        DagNode::List(v)
    }
}

impl From<DagMap> for DagNode {
    fn from(v: DagMap) -> Self {
        DagNode::Map(v)
    }
}

// ---------------------------------------------------------------
// Shared containers
// ---------------------------------------------------------------

/// Shared, ordered sequence of nodes.
#[derive(Clone, Default)]
pub struct DagList(Arc<RwLock<Vec<DagNode>>>);

impl DagList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list owning the given elements.
    pub fn from_nodes(nodes: Vec<DagNode>) -> Self {
        Self(Arc::new(RwLock::new(nodes)))
    }

    /// Append an element.
    pub fn push(&self, node: impl Into<DagNode>) -> TypeResult<()> {
        self.write()?.push(node.into());
        Ok(())
    }

    /// Number of elements.
    pub fn len(&self) -> TypeResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns `true` if the list has no elements.
    pub fn is_empty(&self) -> TypeResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Clone out the current elements. Containers inside are shared, not copied.
    pub fn snapshot(&self) -> TypeResult<Vec<DagNode>> {
        Ok(self.read()?.clone())
    }

    /// Identity of this list.
    pub fn id(&self) -> ContainerId {
        ContainerId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Returns `true` if both handles refer to the same list.
    pub fn ptr_eq(&self, other: &DagList) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn read(&self) -> TypeResult<RwLockReadGuard<'_, Vec<DagNode>>> {
        self.0.read().map_err(|_| TypeError::Poisoned("list"))
    }

    fn write(&self) -> TypeResult<RwLockWriteGuard<'_, Vec<DagNode>>> {
        self.0.write().map_err(|_| TypeError::Poisoned("list"))
    }
}

// The last handle hands its elements to `release` instead of letting the
// drop glue recurse once per nesting level.
impl Drop for DagList {
    fn drop(&mut self) {
        if let Some(lock) = Arc::get_mut(&mut self.0) {
            let items = mem::take(lock.get_mut().unwrap_or_else(PoisonError::into_inner));
            release(items);
        }
    }
}

// Contents are not printed: a list may contain itself.
impl fmt::Debug for DagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DagList").field(&self.id()).finish()
    }
}

/// Shared mapping from text keys to nodes, preserving insertion order.
#[derive(Clone, Default)]
pub struct DagMap(Arc<RwLock<Vec<(String, DagNode)>>>);

impl DagMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map from entries in order. A repeated key keeps its first
    /// position and takes the last value.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, DagNode)>,
        K: Into<String>,
    {
        let mut out: Vec<(String, DagNode)> = Vec::new();
        for (key, value) in entries {
            upsert(&mut out, key.into(), value);
        }
        Self(Arc::new(RwLock::new(out)))
    }

    /// Insert or replace an entry. Replacing keeps the key's position.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<DagNode>) -> TypeResult<()> {
        let mut entries = self.write()?;
        upsert(&mut entries, key.into(), value.into());
        Ok(())
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> TypeResult<Option<DagNode>> {
        Ok(self
            .read()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> TypeResult<Vec<String>> {
        Ok(self.read()?.iter().map(|(k, _)| k.clone()).collect())
    }

    /// Number of entries.
    pub fn len(&self) -> TypeResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> TypeResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Clone out the current entries in order. Containers inside are shared.
    pub fn snapshot(&self) -> TypeResult<Vec<(String, DagNode)>> {
        Ok(self.read()?.clone())
    }

    /// Identity of this map.
    pub fn id(&self) -> ContainerId {
        ContainerId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Returns `true` if both handles refer to the same map.
    pub fn ptr_eq(&self, other: &DagMap) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn read(&self) -> TypeResult<RwLockReadGuard<'_, Vec<(String, DagNode)>>> {
        self.0.read().map_err(|_| TypeError::Poisoned("map"))
    }

    fn write(&self) -> TypeResult<RwLockWriteGuard<'_, Vec<(String, DagNode)>>> {
        self.0.write().map_err(|_| TypeError::Poisoned("map"))
    }
}

impl Drop for DagMap {
    fn drop(&mut self) {
        if let Some(lock) = Arc::get_mut(&mut self.0) {
            let entries = mem::take(lock.get_mut().unwrap_or_else(PoisonError::into_inner));
            release(entries.into_iter().map(|(_, v)| v).collect());
        }
    }
}

impl fmt::Debug for DagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DagMap").field(&self.id()).finish()
    }
}

/// Drop a batch of nodes from a flat queue. Containers held by their last
/// handle are emptied into the queue first, so each one is freed with no
/// children left to recurse into.
fn release(mut pending: Vec<DagNode>) {
    while let Some(node) = pending.pop() {
        match node {
            DagNode::List(mut list) => {
                if let Some(lock) = Arc::get_mut(&mut list.0) {
                    pending.append(lock.get_mut().unwrap_or_else(PoisonError::into_inner));
                }
            }
            DagNode::Map(mut map) => {
                if let Some(lock) = Arc::get_mut(&mut map.0) {
                    let entries = lock.get_mut().unwrap_or_else(PoisonError::into_inner);
                    pending.extend(entries.drain(..).map(|(_, v)| v));
                }
            }
            _ => {}
        }
    }
}

fn upsert(entries: &mut Vec<(String, DagNode)>, key: String, value: DagNode) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_insertion_order() {
        let map = DagMap::new();
        map.insert("b", 1).unwrap();
        map.insert("a", 2).unwrap();
        map.insert("c", 3).unwrap();
        assert_eq!(map.keys().unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn reinsert_keeps_position() {
        let map = DagMap::from_entries([("x", DagNode::from(1)), ("y", DagNode::from(2))]);
        map.insert("x", "replaced").unwrap();
        assert_eq!(map.keys().unwrap(), vec!["x", "y"]);
        assert!(matches!(map.get("x").unwrap(), Some(DagNode::Text(t)) if &*t == "replaced"));
        assert_eq!(map.len().unwrap(), 2);
    }

    #[test]
    fn from_entries_collapses_duplicate_keys() {
        let map = DagMap::from_entries([
            ("k", DagNode::from(1)),
            ("j", DagNode::Null),
            ("k", DagNode::from(2)),
        ]);
        assert_eq!(map.keys().unwrap(), vec!["k", "j"]);
        assert!(matches!(map.get("k").unwrap(), Some(DagNode::Integer(2))));
    }

    #[test]
    fn clones_share_identity() {
        let list = DagList::new();
        let alias = list.clone();
        alias.push(true).unwrap();
        assert!(list.ptr_eq(&alias));
        assert_eq!(list.id(), alias.id());
        assert_eq!(list.len().unwrap(), 1);
    }

    #[test]
    fn distinct_containers_have_distinct_ids() {
        let a = DagMap::new();
        let b = DagMap::new();
        assert!(!a.ptr_eq(&b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn self_containing_list_debug_does_not_recurse() {
        let list = DagList::new();
        list.push(list.clone()).unwrap();
        let printed = format!("{list:?}");
        assert!(printed.starts_with("DagList"));
    }

    #[test]
    fn snapshot_shares_nested_containers() {
        let inner = DagMap::new();
        let outer = DagList::from_nodes(vec![DagNode::Map(inner.clone())]);
        let snap = outer.snapshot().unwrap();
        match &snap[0] {
            DagNode::Map(m) => assert!(m.ptr_eq(&inner)),
            other => panic!("unexpected {}", other.kind()),
        }
    }

    #[test]
    fn kind_names() {
        assert_eq!(DagNode::Null.kind(), "null");
        assert_eq!(DagNode::bytes(vec![1u8, 2]).kind(), "bytes");
        assert_eq!(DagNode::link_text("bafy").kind(), "link");
        assert!(DagNode::list(Vec::new()).is_container_or_link());
        assert!(!DagNode::from("x").is_container_or_link());
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let list = DagList::new();
        let clone = list.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.0.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert_eq!(list.len().unwrap_err(), TypeError::Poisoned("list"));
    }

    fn nested(depth: usize) -> DagNode {
        let mut node = DagNode::Null;
        for i in 0..depth {
            node = if i % 2 == 0 {
                DagNode::list([node])
            } else {
                DagNode::map([("next", node)])
            };
        }
        node
    }

    #[test]
    fn deep_tree_drops_without_overflow() {
        drop(nested(200_000));
    }

    #[test]
    fn dropping_a_handle_keeps_shared_children_alive() {
        let shared = DagList::from_nodes(vec![DagNode::from(7)]);
        let outer = DagNode::map([("inner", DagNode::List(shared.clone()))]);
        drop(outer);
        assert_eq!(shared.len().unwrap(), 1);
    }

    #[test]
    fn deep_tree_under_a_live_handle_is_intact() {
        let DagNode::List(root) = nested(1_001) else {
            panic!("expected list");
        };
        let alias = root.clone();
        drop(root);
        assert_eq!(alias.len().unwrap(), 1);
    }

    proptest::proptest! {
        #[test]
        fn keys_come_back_in_first_insertion_order(keys in proptest::collection::vec("[a-z]{1,4}", 0..24)) {
            let map = DagMap::new();
            let mut expected: Vec<String> = Vec::new();
            for (i, key) in keys.iter().enumerate() {
                map.insert(key.as_str(), i as i64).unwrap();
                if !expected.contains(key) {
                    expected.push(key.clone());
                }
            }
            proptest::prop_assert_eq!(map.keys().unwrap(), expected);
        }
    }
}
