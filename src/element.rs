//! Leaf Payloads
//!
//! Application-defined values carried by leaf nodes. The tree never looks inside
//! a payload except to decode the tabular and chart views used by row appends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub mod chart;
pub mod table;

pub use chart::{ChartView, DecodedDataSet};
pub use table::{Cell, Column, DataType, Table};

/// A block of encoded rows, optionally tagged with a dataset name.
///
/// `name: None` is an unnamed dataset; named datasets are only meaningful
/// for chart payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDataSet {
    pub name: Option<String>,
    pub data: Vec<u8>,
}

impl NamedDataSet {
    pub fn unnamed(data: Vec<u8>) -> Self {
        Self { name: None, data }
    }

    pub fn named(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            data,
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }
}

/// Payload of a leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Text {
        body: String,
    },
    /// Visible error placeholder, written in place of a delta that failed.
    Exception {
        message: String,
    },
    DataFrame {
        data: Vec<u8>,
    },
    Chart {
        spec: String,
        data: Option<Vec<u8>>,
        datasets: Vec<NamedDataSet>,
    },
    /// Generic key/value widget state.
    Widget {
        id: String,
        state: BTreeMap<String, String>,
    },
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Text { .. } => "text",
            Element::Exception { .. } => "exception",
            Element::DataFrame { .. } => "dataframe",
            Element::Chart { .. } => "chart",
            Element::Widget { .. } => "widget",
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Element::Text { body: body.into() }
    }

    pub fn exception(message: impl Into<String>) -> Self {
        Element::Exception {
            message: message.into(),
        }
    }
}

/// Identity handle for a leaf payload.
///
/// Two refs are equal only when they point at the same payload allocation, so a
/// set of refs answers "is this exact payload still in the tree".
#[derive(Debug, Clone)]
pub struct ElementRef(pub Arc<Element>);

impl ElementRef {
    pub fn element(&self) -> &Element {
        &self.0
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ElementRef {}

impl Hash for ElementRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}
