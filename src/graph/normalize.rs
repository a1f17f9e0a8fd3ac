use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use super::{
	Edge, FLAGGED_LABEL, Graph, HIGH_RISK_LABEL, Node, RawNode, RawPath, RawRelationship,
	ResultValue, UNKNOWN_LABEL,
};

/// Folds a flat stream of result values into one deduplicated [`Graph`].
///
/// Nodes are admitted once per identity; relationships and path segments
/// always append an edge. Values of any other shape are skipped.
pub fn normalize(values: impl IntoIterator<Item = ResultValue>) -> Graph {
	let mut builder = GraphBuilder::default();
	for value in values {
		match value {
			ResultValue::Node(node) => builder.admit_node(node),
			ResultValue::Relationship(rel) => {
				builder.push_edge(rel.start.clone(), rel.end.clone(), rel)
			}
			ResultValue::Path(path) => builder.admit_path(path),
			ResultValue::Other(_) => builder.skipped += 1,
		}
	}
	builder.finish()
}

#[derive(Default)]
struct GraphBuilder {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<String, usize>,
	skipped: usize,
}

impl GraphBuilder {
	fn admit_node(&mut self, raw: RawNode) {
		if self.index.contains_key(&raw.identity) {
			return;
		}
		let node = Node {
			primary_label: raw
				.labels
				.first()
				.cloned()
				.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
			flagged: raw.labels.iter().any(|l| l == FLAGGED_LABEL),
			high_risk: raw.labels.iter().any(|l| l == HIGH_RISK_LABEL),
			suspicious: matches!(raw.properties.get("suspicious"), Some(Value::Bool(true))),
			id: raw.identity,
			labels: raw.labels,
			properties: raw.properties,
		};
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
	}

	fn push_edge(&mut self, source: String, target: String, rel: RawRelationship) {
		self.edges.push(Edge {
			source,
			target,
			rel_type: rel.rel_type,
			properties: rel.properties,
		});
	}

	fn admit_path(&mut self, path: RawPath) {
		for segment in path.segments {
			let (source, target) = (segment.start.identity.clone(), segment.end.identity.clone());
			self.admit_node(segment.start);
			self.admit_node(segment.end);
			self.push_edge(source, target, segment.relationship);
		}
	}

	fn finish(self) -> Graph {
		debug!(
			"normalized {} nodes, {} edges ({} values skipped)",
			self.nodes.len(),
			self.edges.len(),
			self.skipped
		);
		Graph {
			nodes: self.nodes,
			edges: self.edges,
			index: self.index,
		}
	}
}
