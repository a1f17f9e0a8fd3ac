use serde_json::Value;

use super::Properties;

/// One query-result value, classified once at the database boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultValue {
	/// A bare node.
	Node(RawNode),
	/// A bare relationship, possibly without its endpoint nodes.
	Relationship(RawRelationship),
	/// A path of start-node/relationship/end-node segments.
	Path(RawPath),
	/// Scalars, maps and anything else; ignored by normalization.
	Other(Value),
}

/// Node-shaped value as returned by the database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawNode {
	/// Database identity rendered as text.
	pub identity: String,
	/// Label set in database order.
	pub labels: Vec<String>,
	/// Properties; empty when the record had none.
	pub properties: Properties,
}

impl RawNode {
	/// Node with `identity` and `labels` and no properties.
	pub fn new<L: Into<String>>(
		identity: impl Into<String>,
		labels: impl IntoIterator<Item = L>,
	) -> Self {
		Self {
			identity: identity.into(),
			labels: labels.into_iter().map(Into::into).collect(),
			properties: Properties::new(),
		}
	}

	/// Adds one property.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}
}

/// Relationship-shaped value as returned by the database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRelationship {
	/// Relationship type.
	pub rel_type: String,
	/// Identity of the start node.
	pub start: String,
	/// Identity of the end node.
	pub end: String,
	/// Properties; empty when the record had none.
	pub properties: Properties,
}

impl RawRelationship {
	/// Relationship of `rel_type` from `start` to `end`.
	pub fn new(
		rel_type: impl Into<String>,
		start: impl Into<String>,
		end: impl Into<String>,
	) -> Self {
		Self {
			rel_type: rel_type.into(),
			start: start.into(),
			end: end.into(),
			properties: Properties::new(),
		}
	}

	/// Adds one property.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}
}

/// One hop of a path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
	/// Node the hop leaves from.
	pub start: RawNode,
	/// Relationship traversed.
	pub relationship: RawRelationship,
	/// Node the hop arrives at.
	pub end: RawNode,
}

/// Path value: ordered segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawPath {
	/// Segments in traversal order.
	pub segments: Vec<PathSegment>,
}

impl RawPath {
	/// Builds a path by chaining `start` through each `(relationship, node)` hop.
	pub fn chain(
		start: RawNode,
		hops: impl IntoIterator<Item = (RawRelationship, RawNode)>,
	) -> Self {
		let mut segments = Vec::new();
		let mut current = start;
		for (relationship, end) in hops {
			segments.push(PathSegment {
				start: current,
				relationship,
				end: end.clone(),
			});
			current = end;
		}
		Self { segments }
	}
}
