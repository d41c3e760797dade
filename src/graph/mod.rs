//! Schema Dependency Graph
//!
//! Directed graph over schema files (petgraph). An edge `a -> b` means `a`
//! includes `b`. Cycles are allowed; traversal visits each normalized name
//! at most once.

pub mod export;

pub use export::{NodeLink, NodeLinkGraph, NodeLinkNode};

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, info};

use crate::model::SchemaModel;
use crate::schema::normalize_name;

/// Metadata attached to a node
pub type NodeProperties = BTreeMap<String, String>;

/// The schema dependency graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,

    /// Node index lookup: name -> NodeIndex
    node_indices: HashMap<String, NodeIndex>,

    /// Properties per node, last write wins
    properties: HashMap<String, NodeProperties>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the graph reachable from `starting` through declared includes
    pub fn resolve(starting: &[String], model: &dyn SchemaModel, vendor_prefixes: &[String]) -> Self {
        let mut graph = Self::new();
        graph.extend_from(starting, model, vendor_prefixes);
        graph
    }

    /// Depth-first traversal from each starting name.
    ///
    /// Every node touched gets freshly read properties. A dependency is
    /// descended into only when it declares dependencies of its own and
    /// has not been visited yet.
    pub fn extend_from(&mut self, starting: &[String], model: &dyn SchemaModel, vendor_prefixes: &[String]) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = starting
            .iter()
            .rev()
            .map(|name| normalize_name(name, vendor_prefixes))
            .collect();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            self.add_node(&name, model.read_properties(&name));

            let dependencies = model.read_dependencies(&name);
            // reversed so the first declared include is explored first
            for dep in dependencies.iter().rev() {
                let dep = normalize_name(dep, vendor_prefixes);
                self.add_edge(&name, &dep);
                self.add_node(&dep, model.read_properties(&dep));
                if !visited.contains(&dep) && !model.read_dependencies(&dep).is_empty() {
                    stack.push(dep);
                }
            }
        }

        debug!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            "dependency graph resolved"
        );
        for cycle in self.cycles() {
            info!(schemas = ?cycle, "circular include group");
        }
    }

    /// Add a node, or overwrite the properties of an existing one
    pub fn add_node(&mut self, name: &str, properties: NodeProperties) -> NodeIndex {
        let idx = self.ensure_node(name);
        self.properties.insert(name.to_string(), properties);
        idx
    }

    /// Add the edge `from -> to` once, creating missing nodes
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        self.graph.update_edge(a, b, ());
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_indices.insert(name.to_string(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    pub fn properties(&self, name: &str) -> Option<&NodeProperties> {
        self.properties.get(name)
    }

    /// Node names, sorted
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.graph.node_weights().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes
    }

    /// Edges as (from, to), sorted
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_references()
            .map(|e| (self.graph[e.source()].as_str(), self.graph[e.target()].as_str()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Direct includes of `name`
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Files that directly include `name`
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Groups of mutually including files (strongly connected components
    /// with more than one member, or a file including itself)
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<String> = scc.iter().map(|&n| self.graph[n].clone()).collect();
                names.sort();
                names
            })
            .collect();
        groups.sort();
        groups
    }
}
