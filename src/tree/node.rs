//! Tree nodes
//!
//! Nodes are immutable and shared through `Arc`. Every structural change builds
//! new nodes along the modified path and reuses every untouched subtree.

use crate::element::{ChartView, Element, ElementRef, NamedDataSet, Table};
use crate::error::{DataError, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};

/// Opaque structural configuration of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLayout(pub BTreeMap<String, String>);

impl ContainerLayout {
    /// Layout used for the four top-level sections.
    pub fn allow_empty() -> Self {
        let mut settings = BTreeMap::new();
        settings.insert("allow_empty".to_string(), "true".to_string());
        ContainerLayout(settings)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// A node in the UI tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AppNode {
    Container(Arc<ContainerNode>),
    Leaf(Arc<LeafNode>),
}

impl AppNode {
    pub fn generation_id(&self) -> &str {
        match self {
            AppNode::Container(c) => &c.generation_id,
            AppNode::Leaf(l) => &l.generation_id,
        }
    }

    pub fn fragment_id(&self) -> Option<&str> {
        match self {
            AppNode::Container(c) => c.fragment_id.as_deref(),
            AppNode::Leaf(l) => l.fragment_id.as_deref(),
        }
    }

    pub fn owner_hash(&self) -> &str {
        match self {
            AppNode::Container(c) => &c.owner_hash,
            AppNode::Leaf(l) => &l.owner_hash,
        }
    }

    pub fn as_container(&self) -> Option<&Arc<ContainerNode>> {
        match self {
            AppNode::Container(c) => Some(c),
            AppNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Arc<LeafNode>> {
        match self {
            AppNode::Leaf(l) => Some(l),
            AppNode::Container(_) => None,
        }
    }

    /// True when both handles point at the same node allocation.
    pub fn ptr_eq(&self, other: &AppNode) -> bool {
        match (self, other) {
            (AppNode::Container(a), AppNode::Container(b)) => Arc::ptr_eq(a, b),
            (AppNode::Leaf(a), AppNode::Leaf(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Look up the descendant at `path`. Leaves have no descendants.
    pub fn get_at(&self, path: &[usize]) -> Option<&AppNode> {
        match self {
            AppNode::Container(c) => c.get_at(path),
            AppNode::Leaf(_) => None,
        }
    }

    /// Keep only the nodes owned by `owner_hash`.
    ///
    /// A container owned by someone else is dropped together with its whole
    /// subtree.
    pub fn filter_by_owner(&self, owner_hash: &str) -> Option<AppNode> {
        match self {
            AppNode::Container(c) => c
                .filter_by_owner(owner_hash)
                .map(|c| AppNode::Container(Arc::new(c))),
            AppNode::Leaf(l) => (l.owner_hash == owner_hash).then(|| self.clone()),
        }
    }

    /// Depth-first collection of every leaf payload into `acc`.
    pub fn collect_leaf_payloads(&self, acc: &mut HashSet<ElementRef>) {
        match self {
            AppNode::Container(c) => {
                for child in c.children.iter() {
                    child.collect_leaf_payloads(acc);
                }
            }
            AppNode::Leaf(l) => {
                acc.insert(ElementRef(l.element.clone()));
            }
        }
    }

    fn set_at_depth(
        &self,
        path: &[usize],
        depth: usize,
        node: AppNode,
        generation_id: &str,
    ) -> Result<AppNode, TreeError> {
        match self {
            AppNode::Container(c) => Ok(AppNode::Container(Arc::new(
                c.set_at_depth(path, depth, node, generation_id)?,
            ))),
            AppNode::Leaf(_) => Err(TreeError::InvalidPath(path.to_vec())),
        }
    }
}

/// A node holding an ordered list of children.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    pub owner_hash: String,
    pub children: Arc<Vec<AppNode>>,
    pub layout: ContainerLayout,
    pub generation_id: String,
    pub fragment_id: Option<String>,
}

impl ContainerNode {
    pub fn new(
        owner_hash: impl Into<String>,
        children: Vec<AppNode>,
        layout: ContainerLayout,
        generation_id: impl Into<String>,
        fragment_id: Option<String>,
    ) -> Self {
        Self {
            owner_hash: owner_hash.into(),
            children: Arc::new(children),
            layout,
            generation_id: generation_id.into(),
            fragment_id,
        }
    }

    /// An empty container that accepts having no children.
    pub fn empty(owner_hash: impl Into<String>, generation_id: impl Into<String>) -> Self {
        Self::new(
            owner_hash,
            Vec::new(),
            ContainerLayout::allow_empty(),
            generation_id,
            None,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Copy of this container with a different child list.
    pub fn with_children(&self, children: Vec<AppNode>, generation_id: &str) -> Self {
        Self {
            owner_hash: self.owner_hash.clone(),
            children: Arc::new(children),
            layout: self.layout.clone(),
            generation_id: generation_id.to_string(),
            fragment_id: self.fragment_id.clone(),
        }
    }

    /// Look up the descendant at `path`.
    ///
    /// Returns `None` for an empty path, an out-of-range index, or a path that
    /// continues below a leaf.
    pub fn get_at(&self, path: &[usize]) -> Option<&AppNode> {
        let (&index, rest) = path.split_first()?;
        let child = self.children.get(index)?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.get_at(rest)
        }
    }

    /// Return a copy of this container with `node` placed at `path`.
    ///
    /// The last index may equal the child count, which appends. Every container
    /// on the path is rebuilt and stamped with `generation_id`; siblings off the
    /// path are shared unchanged.
    pub fn set_at(
        &self,
        path: &[usize],
        node: AppNode,
        generation_id: &str,
    ) -> Result<ContainerNode, TreeError> {
        self.set_at_depth(path, 0, node, generation_id)
    }

    fn set_at_depth(
        &self,
        path: &[usize],
        depth: usize,
        node: AppNode,
        generation_id: &str,
    ) -> Result<ContainerNode, TreeError> {
        let Some(&index) = path.get(depth) else {
            return Err(TreeError::EmptyPath);
        };
        let len = self.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        let mut children: Vec<AppNode> = self.children.as_ref().clone();
        if depth + 1 == path.len() {
            if index == len {
                children.push(node);
            } else {
                children[index] = node;
            }
        } else {
            let updated = match self.children.get(index) {
                Some(child) => child.set_at_depth(path, depth + 1, node, generation_id)?,
                None => return Err(TreeError::InvalidPath(path.to_vec())),
            };
            children[index] = updated;
        }

        Ok(self.with_children(children, generation_id))
    }

    fn filter_by_owner(&self, owner_hash: &str) -> Option<ContainerNode> {
        if self.owner_hash != owner_hash {
            return None;
        }
        let children = self
            .children
            .iter()
            .filter_map(|child| child.filter_by_owner(owner_hash))
            .collect();
        Some(self.with_children(children, &self.generation_id))
    }
}

/// A node holding one payload.
///
/// The decoded tabular and chart views are computed on first read and cached
/// for the lifetime of the node.
#[derive(Debug)]
pub struct LeafNode {
    pub element: Arc<Element>,
    pub owner_hash: String,
    pub generation_id: String,
    pub fragment_id: Option<String>,
    table: OnceLock<Result<Arc<Table>, DataError>>,
    chart: OnceLock<Result<Arc<ChartView>, DataError>>,
}

impl LeafNode {
    pub fn new(
        element: Arc<Element>,
        owner_hash: impl Into<String>,
        generation_id: impl Into<String>,
        fragment_id: Option<String>,
    ) -> Self {
        Self {
            element,
            owner_hash: owner_hash.into(),
            generation_id: generation_id.into(),
            fragment_id,
            table: OnceLock::new(),
            chart: OnceLock::new(),
        }
    }

    /// Decoded tabular view of a `DataFrame` payload.
    pub fn table(&self) -> Result<Arc<Table>, DataError> {
        self.table
            .get_or_init(|| match self.element.as_ref() {
                Element::DataFrame { data } => Table::decode(data).map(Arc::new),
                _ => Err(DataError::NotTabular),
            })
            .clone()
    }

    /// Decoded view of a `Chart` payload.
    pub fn chart(&self) -> Result<Arc<ChartView>, DataError> {
        self.chart
            .get_or_init(|| match self.element.as_ref() {
                Element::Chart {
                    spec,
                    data,
                    datasets,
                } => ChartView::decode(spec, data.as_deref(), datasets).map(Arc::new),
                _ => Err(DataError::NotChart),
            })
            .clone()
    }

    /// Append `rows` to this leaf's data, producing a new leaf stamped with
    /// `generation_id`.
    ///
    /// The new leaf keeps the same payload object; only its derived view
    /// reflects the appended rows.
    pub fn add_rows(&self, rows: &NamedDataSet, generation_id: &str) -> Result<LeafNode, DataError> {
        let mut appended = LeafNode::new(
            self.element.clone(),
            self.owner_hash.clone(),
            generation_id,
            self.fragment_id.clone(),
        );

        match self.element.as_ref() {
            Element::DataFrame { .. } => {
                if rows.has_name() {
                    return Err(DataError::NamedAppendNotSupported);
                }
                let incoming = Table::decode(&rows.data)?;
                let table = self.table()?.add_rows(&incoming)?;
                appended.table = OnceLock::from(Ok(Arc::new(table)));
            }
            Element::Chart { .. } => {
                let incoming = Table::decode(&rows.data)?;
                let chart = self.chart()?.add_rows(rows.name.as_deref(), &incoming)?;
                appended.chart = OnceLock::from(Ok(Arc::new(chart)));
            }
            other => return Err(DataError::UnsupportedAppend(other.kind())),
        }

        Ok(appended)
    }
}

impl PartialEq for LeafNode {
    fn eq(&self, other: &Self) -> bool {
        self.owner_hash == other.owner_hash
            && self.generation_id == other.generation_id
            && self.fragment_id == other.fragment_id
            && self.element == other.element
            && match self.element.as_ref() {
                Element::DataFrame { .. } => self.table() == other.table(),
                Element::Chart { .. } => self.chart() == other.chart(),
                _ => true,
            }
    }
}
