//! The single selected entity and the side-panel state tied to it.

use crate::assistant::{Conversation, EntityDescription, Prompt};
use crate::graph::{Edge, Node};

/// What the user last clicked.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
	#[default]
	None,
	Node(Node),
	Edge(Edge),
}

/// Selection plus the panel sub-state that must not outlive it.
///
/// Every transition goes through [`SelectionPanel::replace`], which collapses
/// the property table and discards the conversation, so stale panel state
/// can never attach to a newly selected entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionPanel {
	selection: Selection,
	properties_expanded: bool,
	conversation: Conversation,
}

impl SelectionPanel {
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn is_open(&self) -> bool {
		self.selection != Selection::None
	}

	pub fn properties_expanded(&self) -> bool {
		self.properties_expanded
	}

	pub fn conversation(&self) -> &Conversation {
		&self.conversation
	}

	pub fn conversation_mut(&mut self) -> &mut Conversation {
		&mut self.conversation
	}

	fn replace(&mut self, selection: Selection) {
		self.selection = selection;
		self.properties_expanded = false;
		self.conversation.reset();
	}

	pub fn select_node(&mut self, node: Node) {
		self.replace(Selection::Node(node));
	}

	pub fn select_edge(&mut self, edge: Edge) {
		self.replace(Selection::Edge(edge));
	}

	/// Explicit close from the panel.
	pub fn close(&mut self) {
		self.replace(Selection::None);
	}

	/// A new graph invalidates whatever was selected in the old one.
	pub fn graph_replaced(&mut self) {
		self.replace(Selection::None);
	}

	pub fn toggle_properties(&mut self) {
		self.properties_expanded = !self.properties_expanded;
	}

	/// Id of the node carrying the selection ring.
	pub fn selected_node_id(&self) -> Option<&str> {
		match &self.selection {
			Selection::Node(node) => Some(&node.id),
			_ => None,
		}
	}

	/// Description handed to the assistant, `None` when nothing is selected.
	pub fn describe(&self) -> Option<EntityDescription> {
		match &self.selection {
			Selection::None => None,
			Selection::Node(node) => Some(EntityDescription {
				id: node.id.clone(),
				title: node
					.properties
					.get("name")
					.and_then(|v| v.as_str())
					.filter(|name| !name.is_empty())
					.unwrap_or(&node.primary_label)
					.to_string(),
				entity_type: node.primary_label.clone(),
				properties: node.properties.clone(),
				risky: node.is_risky(),
			}),
			Selection::Edge(edge) => Some(EntityDescription {
				id: format!("{}->{}", edge.source, edge.target),
				title: edge.rel_type.clone(),
				entity_type: "Relationship".to_string(),
				properties: edge.properties.clone(),
				risky: false,
			}),
		}
	}

	/// Starts an exchange about the selected entity. Returns the entity
	/// description and the conversation epoch, or `None` when nothing is
	/// selected or a reply is still streaming.
	pub fn begin_exchange(&mut self, prompt: &Prompt) -> Option<(EntityDescription, u64)> {
		let entity = self.describe()?;
		let epoch = self.conversation.begin(prompt)?;
		Some((entity, epoch))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::assistant::QuickAction;
	use crate::graph::{RawNode, RawRelationship, ResultValue, normalize};

	fn graph() -> crate::graph::Graph {
		normalize([
			ResultValue::Node(
				RawNode::new("a", ["Customer", "Flagged"]).with_property("name", "Ada"),
			),
			ResultValue::Node(RawNode::new("b", ["Account"])),
			ResultValue::Relationship(RawRelationship::new("OWNS", "a", "b")),
		])
	}

	#[test]
	fn selecting_b_replaces_a_and_collapses_properties() {
		let graph = graph();
		let mut panel = SelectionPanel::default();
		panel.select_node(graph.nodes()[0].clone());
		panel.toggle_properties();
		assert!(panel.properties_expanded());

		panel.select_node(graph.nodes()[1].clone());
		assert_eq!(panel.selected_node_id(), Some("b"));
		assert!(!panel.properties_expanded());
	}

	#[test]
	fn selecting_an_edge_clears_the_node_ring() {
		let graph = graph();
		let mut panel = SelectionPanel::default();
		panel.select_node(graph.nodes()[0].clone());
		panel.select_edge(graph.edges()[0].clone());
		assert_eq!(panel.selected_node_id(), None);
		assert!(matches!(panel.selection(), Selection::Edge(e) if e.rel_type == "OWNS"));
	}

	#[test]
	fn transitions_discard_the_conversation() {
		let graph = graph();
		let mut panel = SelectionPanel::default();
		panel.select_node(graph.nodes()[0].clone());
		let (_, epoch) = panel
			.begin_exchange(&Prompt::Quick(QuickAction::RiskAssessment))
			.unwrap();
		assert!(panel.conversation().is_busy());

		panel.select_node(graph.nodes()[1].clone());
		assert!(panel.conversation().messages().is_empty());
		assert!(!panel.conversation_mut().stream(epoch, "stale"));
		let hello = Prompt::Text("hello".into());
		assert!(panel.begin_exchange(&hello).is_some());
	}

	#[test]
	fn close_and_graph_replacement_empty_the_panel() {
		let graph = graph();
		let mut panel = SelectionPanel::default();
		panel.select_node(graph.nodes()[1].clone());
		panel.close();
		assert!(!panel.is_open());
		let hello = Prompt::Text("hello".into());
		assert!(panel.begin_exchange(&hello).is_none());

		panel.select_edge(graph.edges()[0].clone());
		panel.toggle_properties();
		panel.graph_replaced();
		assert_eq!(panel, SelectionPanel {
			conversation: panel.conversation().clone(),
			..SelectionPanel::default()
		});
	}

	#[test]
	fn descriptions_carry_title_and_risk() {
		let graph = graph();
		let mut panel = SelectionPanel::default();
		panel.select_node(graph.nodes()[0].clone());
		let node = panel.describe().unwrap();
		assert_eq!(node.title, "Ada");
		assert_eq!(node.entity_type, "Customer");
		assert!(node.risky);

		panel.select_node(graph.nodes()[1].clone());
		assert_eq!(panel.describe().unwrap().title, "Account");

		panel.select_edge(graph.edges()[0].clone());
		let edge = panel.describe().unwrap();
		assert_eq!((edge.id.as_str(), edge.title.as_str()), ("a->b", "OWNS"));
		assert_eq!(edge.entity_type, "Relationship");
	}
}
