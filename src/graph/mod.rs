//! Canonical node/edge/graph data produced from query results.
//!
//! A [`Graph`] is built in one pass by [`normalize`] and never mutated
//! afterwards; a new query produces a new graph.

mod normalize;
mod value;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

pub use normalize::normalize;
pub use value::{PathSegment, RawNode, RawPath, RawRelationship, ResultValue};

/// Property mapping attached to nodes and relationships.
pub type Properties = serde_json::Map<String, Value>;

/// Primary label used when a node carries no labels at all.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Label marking a node as flagged by an investigator.
pub const FLAGGED_LABEL: &str = "Flagged";

/// Label marking a node located in a high-risk jurisdiction.
pub const HIGH_RISK_LABEL: &str = "HighRiskJurisdiction";

/// A graph vertex with its risk flags derived at admission time.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	/// Stable identity, unique within a [`Graph`].
	pub id: String,
	/// First label, or [`UNKNOWN_LABEL`].
	pub primary_label: String,
	/// All labels in database order.
	pub labels: Vec<String>,
	/// Node properties.
	pub properties: Properties,
	/// Carries the [`FLAGGED_LABEL`] label.
	pub flagged: bool,
	/// `suspicious` property is literally `true`.
	pub suspicious: bool,
	/// Carries the [`HIGH_RISK_LABEL`] label.
	pub high_risk: bool,
}

impl Node {
	/// Name shown on the canvas: `name`, then `firstName`, then the id.
	pub fn display_name(&self) -> String {
		["name", "firstName"]
			.iter()
			.find_map(|key| scalar_text(self.properties.get(*key)?))
			.unwrap_or_else(|| self.id.clone())
	}

	/// Whether any risk flag is raised.
	pub fn is_risky(&self) -> bool {
		self.flagged || self.suspicious || self.high_risk
	}
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

/// A directed relationship between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
	/// Start node id.
	pub source: String,
	/// End node id.
	pub target: String,
	/// Relationship type.
	#[serde(rename = "type")]
	pub rel_type: String,
	/// Relationship properties, possibly empty.
	pub properties: Properties,
}

/// Node and edge counts of a [`Graph`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
	/// Number of admitted nodes.
	pub node_count: usize,
	/// Number of appended edges.
	pub edge_count: usize,
}

/// Deduplicated nodes in first-seen order plus every edge in result order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<String, usize>,
}

impl Graph {
	/// Nodes in first-seen order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges in result order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Size summary.
	pub fn summary(&self) -> GraphSummary {
		GraphSummary {
			node_count: self.nodes.len(),
			edge_count: self.edges.len(),
		}
	}

	/// True when the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Position of the node with `id` in [`Graph::nodes`].
	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Node lookup by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.node_index(id).map(|i| &self.nodes[i])
	}

	/// Node counts per primary label, in first-seen order.
	pub fn label_counts(&self) -> Vec<(String, usize)> {
		let mut counts: Vec<(String, usize)> = Vec::new();
		for node in &self.nodes {
			match counts
				.iter_mut()
				.find(|(label, _)| *label == node.primary_label)
			{
				Some((_, count)) => *count += 1,
				None => counts.push((node.primary_label.clone(), 1)),
			}
		}
		counts
	}

	/// Edges referencing at least one id with no node in this graph.
	pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
		self.edges.iter().filter(|edge| {
			!self.index.contains_key(&edge.source) || !self.index.contains_key(&edge.target)
		})
	}
}
