// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Anatomical structure graph.

The ontology arrives as a nested tree (each node carries its `children`).
It is flattened once into an arena of [`StructureNode`]s with explicit
parent/children maps, the same shape used for any rooted hierarchy in this
workspace. Lookups by acronym and name are served from four indices:

- exact acronym / exact name (a later node with the same key wins)
- lowercased acronym / lowercased name (the first node seen wins)
*/

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StructureError, StructureResult};

/// Ontology structure identifier
pub type StructureId = u32;

/// One anatomical structure of the ontology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureNode {
    pub id: StructureId,
    pub acronym: String,
    pub name: String,
    /// Six hex digits without the leading `#`
    #[serde(default, rename = "color_hex_triplet")]
    pub color: Option<String>,
    #[serde(default, rename = "parent_structure_id")]
    pub parent_id: Option<StructureId>,
}

/// Nested node as delivered by the ontology service
#[derive(Debug, Clone, Deserialize)]
pub struct RawStructure {
    pub id: StructureId,
    pub acronym: String,
    pub name: String,
    #[serde(default)]
    pub color_hex_triplet: Option<String>,
    #[serde(default)]
    pub parent_structure_id: Option<StructureId>,
    #[serde(default)]
    pub children: Vec<RawStructure>,
}

/// Flattened, indexed ontology tree
#[derive(Debug, Clone, Default)]
pub struct StructureGraph {
    /// Nodes in pre-order of the source tree
    nodes: Vec<StructureNode>,
    index: HashMap<StructureId, usize>,
    children_map: HashMap<StructureId, Vec<StructureId>>,
    roots: Vec<StructureId>,
    by_acronym: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_acronym_lower: HashMap<String, usize>,
    by_name_lower: HashMap<String, usize>,
}

impl StructureGraph {
    /// Build from an ontology payload
    ///
    /// Accepts either the bare list of root nodes or the service envelope
    /// `{"msg": [...]}`.
    pub fn from_json_tree(payload: &Value) -> StructureResult<Self> {
        let roots = match payload {
            Value::Object(map) => map.get("msg").ok_or_else(|| {
                StructureError::InvalidPayload("object payload without \"msg\"".to_string())
            })?,
            other => other,
        };

        let raw: Vec<RawStructure> = serde_json::from_value(roots.clone())
            .map_err(|e| StructureError::InvalidPayload(e.to_string()))?;
        Self::from_raw_tree(raw)
    }

    /// Build from nested nodes
    ///
    /// A nested node's parent is the node it is nested under. Top-level
    /// nodes keep whatever parent they declare, which must then exist.
    pub fn from_raw_tree(roots: Vec<RawStructure>) -> StructureResult<Self> {
        let mut flat = Vec::new();
        let mut stack: Vec<(RawStructure, Option<StructureId>)> =
            roots.into_iter().rev().map(|raw| (raw, None)).collect();

        while let Some((raw, nesting_parent)) = stack.pop() {
            let RawStructure {
                id,
                acronym,
                name,
                color_hex_triplet,
                parent_structure_id,
                children,
            } = raw;

            flat.push(StructureNode {
                id,
                acronym,
                name,
                color: color_hex_triplet,
                parent_id: nesting_parent.or(parent_structure_id),
            });

            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }

        Self::from_nodes(flat)
    }

    /// Build from a flat node list with explicit parent ids
    pub fn from_nodes(nodes: Vec<StructureNode>) -> StructureResult<Self> {
        let mut graph = StructureGraph::default();

        for (position, node) in nodes.iter().enumerate() {
            if graph.index.insert(node.id, position).is_some() {
                return Err(StructureError::DuplicateStructure(node.id));
            }
        }

        for node in &nodes {
            match node.parent_id {
                Some(parent) => {
                    if !graph.index.contains_key(&parent) {
                        return Err(StructureError::UnknownParent {
                            id: node.id,
                            parent,
                        });
                    }
                    graph.children_map.entry(parent).or_default().push(node.id);
                }
                None => graph.roots.push(node.id),
            }
        }

        // every node must hang off a root, otherwise its parent links loop
        let mut reached = HashSet::with_capacity(nodes.len());
        let mut pending: Vec<StructureId> = graph.roots.clone();
        while let Some(id) = pending.pop() {
            if reached.insert(id) {
                if let Some(children) = graph.children_map.get(&id) {
                    pending.extend(children.iter().copied());
                }
            }
        }
        if reached.len() != nodes.len() {
            if let Some(node) = nodes.iter().find(|n| !reached.contains(&n.id)) {
                return Err(StructureError::Cycle(node.id));
            }
        }

        for (position, node) in nodes.iter().enumerate() {
            graph.by_acronym.insert(node.acronym.clone(), position);
            graph.by_name.insert(node.name.clone(), position);
            graph
                .by_acronym_lower
                .entry(node.acronym.to_lowercase())
                .or_insert(position);
            graph
                .by_name_lower
                .entry(node.name.to_lowercase())
                .or_insert(position);
        }

        graph.nodes = nodes;
        tracing::debug!(
            target: "brain-atlas-structures",
            "Built structure graph with {} nodes and {} roots",
            graph.nodes.len(),
            graph.roots.len()
        );
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in source pre-order
    pub fn iter(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.iter()
    }

    pub fn roots(&self) -> &[StructureId] {
        &self.roots
    }

    pub fn contains(&self, id: StructureId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: StructureId) -> Option<&StructureNode> {
        self.index.get(&id).map(|&position| &self.nodes[position])
    }

    pub fn parent(&self, id: StructureId) -> Option<StructureId> {
        self.get(id).and_then(|node| node.parent_id)
    }

    pub fn children(&self, id: StructureId) -> &[StructureId] {
        self.children_map
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    ///
    /// Empty for roots and for unknown ids.
    pub fn ancestors(&self, id: StructureId) -> Vec<StructureId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.parent(parent);
        }
        ancestors
    }

    /// Every node below `id`, excluding `id` itself
    pub fn descendants(&self, id: StructureId) -> HashSet<StructureId> {
        let mut descendants = HashSet::new();
        let mut pending: Vec<StructureId> = self.children(id).to_vec();
        while let Some(child) = pending.pop() {
            if descendants.insert(child) {
                pending.extend_from_slice(self.children(child));
            }
        }
        descendants
    }

    /// True if `ancestor` lies strictly above `id`
    pub fn is_ancestor_of(&self, ancestor: StructureId, id: StructureId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    pub fn by_acronym(&self, acronym: &str) -> Option<&StructureNode> {
        self.by_acronym.get(acronym).map(|&p| &self.nodes[p])
    }

    pub fn by_name(&self, name: &str) -> Option<&StructureNode> {
        self.by_name.get(name).map(|&p| &self.nodes[p])
    }

    /// Case-insensitive acronym lookup
    pub fn by_acronym_ci(&self, acronym: &str) -> Option<&StructureNode> {
        self.by_acronym_lower
            .get(&acronym.to_lowercase())
            .map(|&p| &self.nodes[p])
    }

    /// Case-insensitive name lookup
    pub fn by_name_ci(&self, name: &str) -> Option<&StructureNode> {
        self.by_name_lower
            .get(&name.to_lowercase())
            .map(|&p| &self.nodes[p])
    }

    /// Resolve a label in precedence order: exact acronym, exact name,
    /// lowercased acronym, lowercased name
    pub fn resolve(&self, label: &str) -> Option<&StructureNode> {
        self.by_acronym(label)
            .or_else(|| self.by_name(label))
            .or_else(|| self.by_acronym_ci(label))
            .or_else(|| self.by_name_ci(label))
    }

    /// Flat list of nodes, for persisting alongside the outputs
    pub fn to_nodes(&self) -> &[StructureNode] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "success": true,
            "msg": [{
                "id": 997, "acronym": "root", "name": "root",
                "color_hex_triplet": "FFFFFF", "parent_structure_id": null,
                "children": [
                    {
                        "id": 8, "acronym": "grey",
                        "name": "Basic cell groups and regions",
                        "color_hex_triplet": "BFDAE3", "parent_structure_id": 997,
                        "children": [
                            {
                                "id": 315, "acronym": "Isocortex", "name": "Isocortex",
                                "color_hex_triplet": "70FF71", "parent_structure_id": 8,
                                "children": [
                                    { "id": 385, "acronym": "VISp",
                                      "name": "Primary visual area",
                                      "color_hex_triplet": "08858C",
                                      "parent_structure_id": 315, "children": [] },
                                    { "id": 417, "acronym": "VISrl",
                                      "name": "Rostrolateral visual area",
                                      "parent_structure_id": 315, "children": [] }
                                ]
                            }
                        ]
                    },
                    { "id": 1009, "acronym": "fiber tracts", "name": "fiber tracts",
                      "parent_structure_id": 997, "children": [] }
                ]
            }]
        })
    }

    #[test]
    fn test_flatten_preserves_preorder() {
        let graph = StructureGraph::from_json_tree(&sample_payload()).unwrap();
        let ids: Vec<_> = graph.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![997, 8, 315, 385, 417, 1009]);
        assert_eq!(graph.roots(), &[997]);
        assert_eq!(graph.children(997), &[8, 1009]);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let graph = StructureGraph::from_json_tree(&sample_payload()).unwrap();
        assert_eq!(graph.ancestors(385), vec![315, 8, 997]);
        assert!(graph.ancestors(997).is_empty());
        assert!(graph.ancestors(123456).is_empty());
        assert!(graph.is_ancestor_of(8, 417));
        assert!(!graph.is_ancestor_of(385, 417));
    }

    #[test]
    fn test_descendants() {
        let graph = StructureGraph::from_json_tree(&sample_payload()).unwrap();
        let below_grey = graph.descendants(8);
        assert_eq!(below_grey, HashSet::from([315, 385, 417]));
        assert!(graph.descendants(385).is_empty());
    }

    #[test]
    fn test_lookup_precedence() {
        let graph = StructureGraph::from_json_tree(&sample_payload()).unwrap();
        assert_eq!(graph.resolve("VISp").map(|n| n.id), Some(385));
        assert_eq!(graph.resolve("Primary visual area").map(|n| n.id), Some(385));
        assert_eq!(graph.resolve("visp").map(|n| n.id), Some(385));
        assert_eq!(graph.resolve("PRIMARY VISUAL AREA").map(|n| n.id), Some(385));
        assert!(graph.resolve("CA1").is_none());
    }

    #[test]
    fn test_exact_collision_last_wins_lowercase_first_wins() {
        let nodes = vec![
            StructureNode {
                id: 1,
                acronym: "root".into(),
                name: "root".into(),
                color: None,
                parent_id: None,
            },
            StructureNode {
                id: 2,
                acronym: "Ab".into(),
                name: "first".into(),
                color: None,
                parent_id: Some(1),
            },
            StructureNode {
                id: 3,
                acronym: "Ab".into(),
                name: "second".into(),
                color: None,
                parent_id: Some(1),
            },
            StructureNode {
                id: 4,
                acronym: "AB".into(),
                name: "third".into(),
                color: None,
                parent_id: Some(1),
            },
        ];
        let graph = StructureGraph::from_nodes(nodes).unwrap();
        assert_eq!(graph.by_acronym("Ab").map(|n| n.id), Some(3));
        assert_eq!(graph.by_acronym_ci("ab").map(|n| n.id), Some(2));
    }

    #[test]
    fn test_color_is_optional() {
        let graph = StructureGraph::from_json_tree(&sample_payload()).unwrap();
        assert_eq!(graph.get(385).and_then(|n| n.color.as_deref()), Some("08858C"));
        assert!(graph.get(417).and_then(|n| n.color.as_deref()).is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let payload = json!([{
            "id": 1, "acronym": "a", "name": "a",
            "children": [{ "id": 1, "acronym": "b", "name": "b", "children": [] }]
        }]);
        assert_eq!(
            StructureGraph::from_json_tree(&payload).unwrap_err(),
            StructureError::DuplicateStructure(1)
        );
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let nodes = vec![StructureNode {
            id: 5,
            acronym: "x".into(),
            name: "x".into(),
            color: None,
            parent_id: Some(99),
        }];
        assert!(matches!(
            StructureGraph::from_nodes(nodes),
            Err(StructureError::UnknownParent { id: 5, parent: 99 })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let node = |id, parent| StructureNode {
            id,
            acronym: format!("n{}", id),
            name: format!("node {}", id),
            color: None,
            parent_id: Some(parent),
        };
        let nodes = vec![
            StructureNode {
                id: 1,
                acronym: "root".into(),
                name: "root".into(),
                color: None,
                parent_id: None,
            },
            node(2, 3),
            node(3, 2),
        ];
        assert!(matches!(
            StructureGraph::from_nodes(nodes),
            Err(StructureError::Cycle(_))
        ));
    }

    #[test]
    fn test_payload_without_msg_rejected() {
        assert!(matches!(
            StructureGraph::from_json_tree(&json!({"success": false})),
            Err(StructureError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut raw = RawStructure {
            id: 20_000,
            acronym: "leaf".into(),
            name: "leaf".into(),
            color_hex_triplet: None,
            parent_structure_id: None,
            children: vec![],
        };
        for id in (0..20_000).rev() {
            raw = RawStructure {
                id,
                acronym: format!("a{}", id),
                name: format!("n{}", id),
                color_hex_triplet: None,
                parent_structure_id: None,
                children: vec![raw],
            };
        }
        let graph = StructureGraph::from_raw_tree(vec![raw]).unwrap();
        assert_eq!(graph.len(), 20_001);
        assert_eq!(graph.ancestors(20_000).len(), 20_000);
    }
}
