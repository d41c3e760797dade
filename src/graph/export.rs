//! Graph serialization
//!
//! Node-link JSON (the layout networkx's `node_link_data` reads) and
//! GraphViz DOT. Both are sorted so identical graphs serialize identically.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DependencyGraph;
use crate::error::Result;

/// Node-link document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinkGraph {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: BTreeMap<String, String>,
    pub nodes: Vec<NodeLinkNode>,
    pub links: Vec<NodeLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinkNode {
    pub id: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLink {
    pub source: String,
    pub target: String,
}

impl DependencyGraph {
    pub fn to_node_link(&self) -> NodeLinkGraph {
        let nodes = self
            .nodes()
            .into_iter()
            .map(|name| {
                let mut properties = self.properties(name).cloned().unwrap_or_default();
                // `id` is reserved for the node name
                properties.remove("id");
                NodeLinkNode {
                    id: name.to_string(),
                    properties,
                }
            })
            .collect();

        let links = self
            .edges()
            .into_iter()
            .map(|(source, target)| NodeLink {
                source: source.to_string(),
                target: target.to_string(),
            })
            .collect();

        NodeLinkGraph {
            directed: true,
            multigraph: false,
            graph: BTreeMap::new(),
            nodes,
            links,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_node_link())?)
    }

    /// Write node-link JSON to `path`, creating parent directories
    pub fn write_node_link(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Export to DOT format for GraphViz visualization
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph SchemaDependencies {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  bgcolor=\"#1e1e1e\";\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fontcolor=\"white\", color=\"#404040\"];\n");
        output.push_str("  edge [color=\"#808080\"];\n");
        output.push('\n');

        let color_map = [
            ("service", "#2196F3"),
            ("business_object", "#00BCD4"),
            ("enum", "#FF5722"),
            ("exception", "#F44336"),
        ];

        for name in self.nodes() {
            let kind = self
                .properties(name)
                .and_then(|p| p.get("kind"))
                .map(String::as_str);
            let color = color_map
                .iter()
                .find(|(k, _)| kind == Some(*k))
                .map(|(_, color)| *color)
                .unwrap_or("#9E9E9E");
            let label = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];\n",
                dot_id(name),
                dot_escape(label),
                color
            ));
        }

        output.push('\n');

        for (source, target) in self.edges() {
            output.push_str(&format!("  \"{}\" -> \"{}\";\n", dot_id(source), dot_id(target)));
        }

        output.push_str("}\n");
        output
    }
}

fn dot_id(name: &str) -> String {
    dot_escape(&name.replace(['/', '.', '-'], "_"))
}

/// Escape for use inside a double-quoted DOT string
fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeProperties;

    fn sample() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut props = NodeProperties::new();
        props.insert("kind".to_string(), "service".to_string());
        props.insert("team".to_string(), "checkout".to_string());
        props.insert("id".to_string(), "shadowed".to_string());
        graph.add_node("OrderService.thrift", props);
        graph.add_node("Order.thrift", NodeProperties::new());
        graph.add_edge("OrderService.thrift", "Order.thrift");
        graph
    }

    #[test]
    fn test_node_link_shape() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(value["directed"], true);
        assert_eq!(value["multigraph"], false);
        assert!(value["graph"].as_object().unwrap().is_empty());
        assert_eq!(value["nodes"][0]["id"], "Order.thrift");
        assert_eq!(value["nodes"][1]["id"], "OrderService.thrift");
        assert_eq!(value["nodes"][1]["team"], "checkout");
        assert_eq!(value["links"][0]["source"], "OrderService.thrift");
        assert_eq!(value["links"][0]["target"], "Order.thrift");
    }

    #[test]
    fn test_write_node_link_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphs/force.json");
        let graph = sample();
        graph.write_node_link(&path).unwrap();

        let loaded: NodeLinkGraph = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, graph.to_node_link());
    }

    #[test]
    fn test_to_dot() {
        let dot = sample().to_dot();
        assert!(dot.starts_with("digraph SchemaDependencies {"));
        assert!(dot.contains("\"OrderService_thrift\" [label=\"OrderService\", fillcolor=\"#2196F3\"];"));
        assert!(dot.contains("\"OrderService_thrift\" -> \"Order_thrift\";"));
    }

    #[test]
    fn test_to_dot_escapes_quotes() {
        let mut graph = DependencyGraph::new();
        graph.add_node("Odd\"Name\\x.thrift", NodeProperties::new());
        let dot = graph.to_dot();
        assert!(dot.contains("\"Odd\\\"Name\\\\x_thrift\" [label=\"Odd\\\"Name\\\\x\""));
    }
}
