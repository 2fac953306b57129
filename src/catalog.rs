//! Node catalog: the inbound list of node types a palette offers.
//!
//! The payload is grouped as categories -> functions -> node specifications.
//! The editor only uses it to seed new nodes; everything else about a node
//! type stays opaque.

use std::collections::HashSet;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::model::NodeData;

/// One node type, as offered by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(flatten)]
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFunction {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<CatalogFunction>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeCatalog {
    #[serde(default)]
    pub categories: Vec<CatalogCategory>,
}

/// A node spec together with where it sits in the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry<'a> {
    pub category: &'a str,
    pub function: &'a str,
    pub spec: &'a NodeSpec,
}

impl NodeCatalog {
    /// Parse a catalog payload. Node names must be unique across the catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: NodeCatalog = serde_json::from_str(json)?;

        let mut seen = HashSet::new();
        for entry in catalog.entries() {
            if !seen.insert(entry.spec.data.node_name.as_str()) {
                return Err(CatalogError::DuplicateNode(entry.spec.data.node_name.clone()));
            }
        }

        info!("node catalog: {} node type(s)", seen.len());
        Ok(catalog)
    }

    /// Every node spec in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_>> + '_ {
        self.categories.iter().flat_map(|category| {
            category.functions.iter().flat_map(move |function| {
                function.nodes.iter().map(move |spec| CatalogEntry {
                    category: &category.name,
                    function: &function.name,
                    spec,
                })
            })
        })
    }

    pub fn find(&self, node_name: &str) -> Option<&NodeSpec> {
        self.entries()
            .find(|e| e.spec.data.node_name == node_name)
            .map(|e| e.spec)
    }

    /// Fresh template for `add_node`.
    pub fn template(&self, node_name: &str) -> Option<NodeData> {
        self.find(node_name).map(|spec| spec.data.clone())
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.entries().map(|e| e.spec.data.node_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}
