//! Tree root
//!
//! The root is a container with exactly four sections in fixed positions:
//! `main`, `sidebar`, `event` and `bottom`. The shape is checked when a root is
//! built, so every `AppRoot` value is well formed.

use crate::element::ElementRef;
use crate::error::TreeError;
use crate::tree::node::{AppNode, ContainerLayout, ContainerNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Generation of a tree that has not seen any run yet.
pub const NO_GENERATION: &str = "";

/// Positions of the four top-level sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Main = 0,
    Sidebar = 1,
    Event = 2,
    Bottom = 3,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Main, Section::Sidebar, Section::Event, Section::Bottom];

    pub fn name(self) -> &'static str {
        match self {
            Section::Main => "main",
            Section::Sidebar => "sidebar",
            Section::Event => "event",
            Section::Bottom => "bottom",
        }
    }
}

/// Logo shown by the app shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logo {
    pub image: String,
    pub link: Option<String>,
    pub icon_image: Option<String>,
}

/// Installed logo plus the script and run that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoInfo {
    pub logo: Logo,
    pub owner_hash: String,
    pub generation_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppRoot {
    pub(crate) owner_hash: String,
    pub(crate) generation_id: String,
    pub(crate) layout: ContainerLayout,
    pub(crate) sections: [Arc<ContainerNode>; 4],
    pub(crate) logo: Option<LogoInfo>,
}

impl AppRoot {
    /// A root with four empty sections.
    pub fn empty(owner_hash: impl Into<String>) -> Self {
        let owner_hash = owner_hash.into();
        let section = || Arc::new(ContainerNode::empty(owner_hash.clone(), NO_GENERATION));
        Self {
            sections: [section(), section(), section(), section()],
            owner_hash,
            generation_id: NO_GENERATION.to_string(),
            layout: ContainerLayout::allow_empty(),
            logo: None,
        }
    }

    /// Build a root from a plain container, checking the four-section shape.
    pub fn from_container(
        owner_hash: impl Into<String>,
        container: &ContainerNode,
        logo: Option<LogoInfo>,
    ) -> Result<Self, TreeError> {
        if container.children.len() != Section::ALL.len() {
            return Err(TreeError::InvalidRoot(format!(
                "expected 4 sections, found {}",
                container.children.len()
            )));
        }

        let mut sections = Vec::with_capacity(Section::ALL.len());
        for (section, child) in Section::ALL.iter().zip(container.children.iter()) {
            match child {
                AppNode::Container(c) => sections.push(c.clone()),
                AppNode::Leaf(_) => {
                    return Err(TreeError::InvalidRoot(format!(
                        "section '{}' is not a container",
                        section.name()
                    )))
                }
            }
        }
        let sections: [Arc<ContainerNode>; 4] = sections
            .try_into()
            .map_err(|_| TreeError::InvalidRoot("expected 4 sections".to_string()))?;

        Ok(Self {
            owner_hash: owner_hash.into(),
            generation_id: container.generation_id.clone(),
            layout: container.layout.clone(),
            sections,
            logo,
        })
    }

    /// The root as a plain container with the four sections as children.
    pub fn to_container(&self) -> ContainerNode {
        ContainerNode::new(
            self.owner_hash.clone(),
            self.sections
                .iter()
                .map(|s| AppNode::Container(s.clone()))
                .collect(),
            self.layout.clone(),
            self.generation_id.clone(),
            None,
        )
    }

    pub fn owner_hash(&self) -> &str {
        &self.owner_hash
    }

    pub fn generation_id(&self) -> &str {
        &self.generation_id
    }

    pub fn logo(&self) -> Option<&LogoInfo> {
        self.logo.as_ref()
    }

    pub fn section(&self, section: Section) -> &Arc<ContainerNode> {
        &self.sections[section as usize]
    }

    pub fn main(&self) -> &Arc<ContainerNode> {
        self.section(Section::Main)
    }

    pub fn sidebar(&self) -> &Arc<ContainerNode> {
        self.section(Section::Sidebar)
    }

    pub fn event(&self) -> &Arc<ContainerNode> {
        self.section(Section::Event)
    }

    pub fn bottom(&self) -> &Arc<ContainerNode> {
        self.section(Section::Bottom)
    }

    /// Look up the node at `path`; the first index selects the section.
    pub fn get_at(&self, path: &[usize]) -> Option<AppNode> {
        let (&index, rest) = path.split_first()?;
        let section = self.sections.get(index)?;
        if rest.is_empty() {
            Some(AppNode::Container(section.clone()))
        } else {
            section.get_at(rest).cloned()
        }
    }

    /// Place `node` at `path`, returning the new root.
    ///
    /// The root and the containers along the path are stamped with
    /// `generation_id`. Sections can be replaced by containers but never
    /// removed, added or turned into leaves.
    pub fn set_at(
        &self,
        path: &[usize],
        node: AppNode,
        generation_id: &str,
    ) -> Result<AppRoot, TreeError> {
        let Some((&index, rest)) = path.split_first() else {
            return Err(TreeError::EmptyPath);
        };
        let len = self.sections.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        if index == len {
            return Err(TreeError::InvalidRoot(
                "cannot add a fifth top-level section".to_string(),
            ));
        }

        let section = if rest.is_empty() {
            match node {
                AppNode::Container(c) => c,
                AppNode::Leaf(_) => {
                    return Err(TreeError::InvalidRoot(format!(
                        "section '{}' must remain a container",
                        Section::ALL[index].name()
                    )))
                }
            }
        } else {
            Arc::new(self.sections[index].set_at(rest, node, generation_id)?)
        };

        let mut sections = self.sections.clone();
        sections[index] = section;
        Ok(Self {
            owner_hash: self.owner_hash.clone(),
            generation_id: generation_id.to_string(),
            layout: self.layout.clone(),
            sections,
            logo: self.logo.clone(),
        })
    }

    /// Keep only nodes owned by `owner_hash`; the result is owned by it too.
    ///
    /// A section that fails the test becomes an empty container. The logo is
    /// kept only if the same owner supplied it.
    pub fn filter_by_owner(&self, owner_hash: &str) -> AppRoot {
        let sections = self.sections.clone().map(|section| {
            match AppNode::Container(section.clone()).filter_by_owner(owner_hash) {
                Some(AppNode::Container(c)) => c,
                _ => Arc::new(ContainerNode::empty(owner_hash, self.generation_id.clone())),
            }
        });

        Self {
            owner_hash: owner_hash.to_string(),
            generation_id: self.generation_id.clone(),
            layout: self.layout.clone(),
            sections,
            logo: self
                .logo
                .clone()
                .filter(|logo| logo.owner_hash == owner_hash),
        }
    }

    /// Collect every leaf payload, extending `acc` when one is given.
    pub fn collect_leaf_payloads(&self, acc: Option<HashSet<ElementRef>>) -> HashSet<ElementRef> {
        let mut acc = acc.unwrap_or_default();
        for section in &self.sections {
            for child in section.children.iter() {
                child.collect_leaf_payloads(&mut acc);
            }
        }
        acc
    }

    /// Install a logo supplied by `owner_hash` during run `generation_id`.
    pub fn with_logo(&self, logo: Logo, owner_hash: &str, generation_id: &str) -> AppRoot {
        Self {
            logo: Some(LogoInfo {
                logo,
                owner_hash: owner_hash.to_string(),
                generation_id: generation_id.to_string(),
            }),
            ..self.clone()
        }
    }
}
