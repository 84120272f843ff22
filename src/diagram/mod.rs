//! The live object graph as a flat node/edge list.
//!
//! Extraction walks breadth-first from the objects visible in a root
//! package plus the REPL bindings, and follows every field and every
//! collection element. Nodes are memoized by object identity before their
//! own slots are followed, so cycles end in a back-edge. Null carries no
//! identity: each null reference gets a node of its own, under an id no
//! heap object uses.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::interpreter::{
    Field, LIST_MODULE, OBJECT_MODULE, ObjectGraph, REPL, SET_MODULE, short_name,
};
use crate::types::Id;

const LOCK: &str = "🔒";
const EDGE_WIDTH: f64 = 1.5;
const BUILT_IN_PREFIX: &str = "wollok.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "literal")]
    Literal,
    #[serde(rename = "REPL")]
    Repl,
    #[serde(rename = "null")]
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    pub kind: ElementKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub id: String,
    pub label: String,
    pub constant: bool,
    pub source: String,
    pub target: String,
    /// Module of the collection this edge enumerates, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_module: Option<String>,
}

impl DiagramEdge {
    pub fn style(&self) -> &'static str {
        match self.target_module.as_deref() {
            Some(LIST_MODULE) | Some(SET_MODULE) => "dotted",
            _ => "solid",
        }
    }

    pub fn display_label(&self) -> String {
        if self.constant {
            format!("{}{LOCK}", self.label)
        } else {
            self.label.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

/// One record for the graph visualization library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramElement {
    pub data: ElementData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementData {
    Node {
        id: String,
        label: String,
        #[serde(rename = "type")]
        kind: ElementKind,
        fontsize: &'static str,
    },
    Edge {
        id: String,
        label: String,
        source: String,
        target: String,
        width: f64,
        fontsize: &'static str,
        style: &'static str,
    },
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn elements(&self) -> Vec<DiagramElement> {
        let nodes = self.nodes.iter().map(|node| ElementData::Node {
            id: node.id.clone(),
            label: node.label.clone(),
            kind: node.kind,
            fontsize: font_size(&node.label),
        });
        let edges = self.edges.iter().map(|edge| ElementData::Edge {
            id: edge.id.clone(),
            label: edge.display_label(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            width: EDGE_WIDTH,
            fontsize: font_size(&edge.label),
            style: edge.style(),
        });
        nodes.chain(edges).map(|data| DiagramElement { data }).collect()
    }
}

fn font_size(label: &str) -> &'static str {
    match label.chars().count() {
        n if n > 8 => "7px",
        n if n > 5 => "8px",
        _ => "9px",
    }
}

/// Extract the diagram of everything reachable from `root`, a package name,
/// plus the REPL bindings. Without a root only the REPL bindings are walked.
pub fn extract<G: ObjectGraph + ?Sized>(graph: &G, root: Option<&str>) -> Diagram {
    let mut extractor = Extractor {
        graph,
        diagram: Diagram::default(),
        visited: HashSet::new(),
        pending: VecDeque::new(),
        nulls: 0,
    };
    let root = root.unwrap_or(REPL);

    for id in visible_objects(graph, root) {
        extractor.visit(&id);
    }

    let bindings = graph.repl_bindings();
    if root == REPL || !bindings.is_empty() {
        let repl = extractor.repl_node();
        for binding in &bindings {
            extractor.link(&repl, binding, None);
        }
    }

    extractor.drain();
    log::debug!(
        "extracted {} nodes and {} edges from {root}",
        extractor.diagram.nodes.len(),
        extractor.diagram.edges.len()
    );
    extractor.diagram
}

/// Top-level objects declared in `package` plus the ones it imports.
/// Imports are not followed transitively.
fn visible_objects<G: ObjectGraph + ?Sized>(graph: &G, package: &str) -> Vec<Id> {
    let Some(scope) = graph.package(package) else {
        return Vec::new();
    };
    let mut ids: Vec<Id> = scope.objects.iter().map(|o| o.id.clone()).collect();
    for import in &scope.imports {
        let Some(imported) = graph.package(&import.package) else {
            log::warn!("{package} imports unknown package {}", import.package);
            continue;
        };
        ids.extend(
            imported
                .objects
                .into_iter()
                .filter(|o| import.member.as_ref().is_none_or(|m| *m == o.name))
                .map(|o| o.id),
        );
    }
    ids
}

struct Extractor<'g, G: ?Sized> {
    graph: &'g G,
    diagram: Diagram,
    visited: HashSet<Id>,
    pending: VecDeque<Id>,
    nulls: usize,
}

impl<G: ObjectGraph + ?Sized> Extractor<'_, G> {
    /// Ensure `id` has a node and return the node id to point edges at.
    fn visit(&mut self, id: &Id) -> String {
        let Some(module) = self.graph.module_fqn(id) else {
            let node_id = loop {
                self.nulls += 1;
                let candidate = format!("null_{}", self.nulls);
                if self.is_free(&candidate) {
                    break candidate;
                }
            };
            self.visited.insert(node_id.clone());
            self.diagram.nodes.push(DiagramNode {
                id: node_id.clone(),
                kind: ElementKind::Null,
                label: "null".to_string(),
            });
            return node_id;
        };
        if self.visited.insert(id.clone()) {
            let (kind, label) = self.describe(id, &module);
            self.diagram.nodes.push(DiagramNode {
                id: id.clone(),
                kind,
                label,
            });
            self.pending.push_back(id.clone());
        }
        id.clone()
    }

    /// Add the REPL node under an id no heap object uses.
    fn repl_node(&mut self) -> String {
        let mut node_id = REPL.to_string();
        let mut suffix = 0;
        while !self.is_free(&node_id) {
            suffix += 1;
            node_id = format!("{REPL}_{suffix}");
        }
        self.visited.insert(node_id.clone());
        self.diagram.nodes.push(DiagramNode {
            id: node_id.clone(),
            kind: ElementKind::Repl,
            label: REPL.to_string(),
        });
        node_id
    }

    /// Synthetic node ids must not collide with object ids.
    fn is_free(&self, candidate: &str) -> bool {
        let candidate: Id = candidate.to_string();
        !self.visited.contains(&candidate) && self.graph.module_fqn(&candidate).is_none()
    }

    fn describe(&self, id: &Id, module: &str) -> (ElementKind, String) {
        if module == OBJECT_MODULE {
            return (ElementKind::Object, short_name(module).to_string());
        }
        if is_built_in(module) {
            let label = match module {
                LIST_MODULE | SET_MODULE => short_name(module).to_string(),
                _ => self.graph.print_string(id),
            };
            return (ElementKind::Literal, label);
        }
        let label = self
            .graph
            .well_known_name(id)
            .unwrap_or_else(|| short_name(module).to_string());
        (ElementKind::Object, label)
    }

    fn drain(&mut self) {
        while let Some(id) = self.pending.pop_front() {
            let module = self.graph.module_fqn(&id).unwrap_or_default();
            if is_built_in(&module) && module != OBJECT_MODULE {
                self.expand_elements(&id, &module);
            } else {
                for field in self.graph.fields(&id) {
                    self.link(&id, &field, None);
                }
            }
        }
    }

    fn expand_elements(&mut self, id: &Id, module: &str) {
        let Some(elements) = self.graph.elements(id) else {
            return;
        };
        for (index, element) in elements.into_iter().enumerate() {
            let label = if module == LIST_MODULE {
                index.to_string()
            } else {
                String::new()
            };
            let slot = Field {
                name: label,
                value: element,
                constant: false,
            };
            self.link(id, &slot, Some(module));
        }
    }

    fn link(&mut self, source: &str, slot: &Field, collection: Option<&str>) {
        let target = self.visit(&slot.value);
        self.diagram.edges.push(DiagramEdge {
            id: format!("{source}_{target}_{}", slot.name),
            label: slot.name.clone(),
            constant: slot.constant,
            source: source.to_string(),
            target,
            target_module: collection.map(str::to_string),
        });
    }
}

fn is_built_in(module: &str) -> bool {
    module.starts_with(BUILT_IN_PREFIX)
}
