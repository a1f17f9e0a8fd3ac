//! Decoding of driver-shaped JSON records into [`ResultValue`]s.
//!
//! Classification happens here exactly once. The order is node, then
//! relationship, then path; the first shape that matches wins.

use log::warn;
use serde_json::{Map, Value};

use crate::graph::{PathSegment, Properties, RawNode, RawPath, RawRelationship, ResultValue};

/// Flattens a `records` array into result values. A record is either a
/// list of values or a serialized driver `Record` (`{keys, _fields, ..}`).
pub fn decode_records(records: &[Value]) -> Vec<ResultValue> {
	let mut values = Vec::new();
	for record in records {
		match record {
			Value::Array(items) => items.iter().for_each(|item| decode_into(item, &mut values)),
			Value::Object(object) if object.contains_key("_fields") => {
				let Some(fields) = object.get("_fields").and_then(Value::as_array) else {
					warn!("skipping record with malformed fields");
					continue;
				};
				for field in fields {
					decode_into(field, &mut values);
				}
			}
			other => decode_into(other, &mut values),
		}
	}
	values
}

/// Classifies a single value. Lists are flattened; zero-length paths yield their start node.
pub fn decode_value(value: &Value) -> Vec<ResultValue> {
	let mut values = Vec::new();
	decode_into(value, &mut values);
	values
}

fn decode_into(value: &Value, out: &mut Vec<ResultValue>) {
	if let Value::Array(items) = value {
		items.iter().for_each(|item| decode_into(item, out));
		return;
	}
	let Some(object) = value.as_object() else {
		out.push(ResultValue::Other(value.clone()));
		return;
	};
	if let Some(node) = node(object) {
		out.push(ResultValue::Node(node));
	} else if let Some(rel) = relationship(object) {
		out.push(ResultValue::Relationship(rel));
	} else if let Some(segments) = object.get("segments").and_then(Value::as_array) {
		let path = path(segments);
		if path.segments.is_empty() {
			let start = object.get("start").and_then(Value::as_object);
			match start.and_then(node) {
				Some(start) => out.push(ResultValue::Node(start)),
				None => out.push(ResultValue::Path(path)),
			}
		} else {
			out.push(ResultValue::Path(path));
		}
	} else {
		out.push(ResultValue::Other(value.clone()));
	}
}

/// Text form of a driver identity: string, number, or `{low, high}` integer.
pub fn identity(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Object(parts) => {
			let low = parts.get("low")?.as_i64()?;
			let high = parts.get("high").and_then(Value::as_i64).unwrap_or(0);
			Some(((high << 32) + (low & 0xffff_ffff)).to_string())
		}
		_ => None,
	}
}

fn object_identity(object: &Map<String, Value>) -> Option<String> {
	object
		.get("identity")
		.and_then(identity)
		.or_else(|| object.get("elementId").and_then(identity))
}

fn properties(object: &Map<String, Value>) -> Properties {
	match object.get("properties") {
		Some(Value::Object(props)) => props.clone(),
		_ => Properties::new(),
	}
}

fn node(object: &Map<String, Value>) -> Option<RawNode> {
	let labels = object.get("labels")?.as_array()?;
	let identity = object_identity(object)?;
	Some(RawNode {
		identity,
		labels: labels
			.iter()
			.filter_map(Value::as_str)
			.map(str::to_string)
			.collect(),
		properties: properties(object),
	})
}

fn relationship(object: &Map<String, Value>) -> Option<RawRelationship> {
	let rel_type = object.get("type")?.as_str()?;
	let start = identity(object.get("start")?)?;
	let end = identity(object.get("end")?)?;
	Some(RawRelationship {
		rel_type: rel_type.to_string(),
		start,
		end,
		properties: properties(object),
	})
}

fn path(segments: &[Value]) -> RawPath {
	let segments: Vec<PathSegment> = segments
		.iter()
		.filter_map(|segment| {
			let parts = segment.as_object()?;
			let parsed = (|| {
				Some(PathSegment {
					start: node(parts.get("start")?.as_object()?)?,
					relationship: relationship(parts.get("relationship")?.as_object()?)?,
					end: node(parts.get("end")?.as_object()?)?,
				})
			})();
			if parsed.is_none() {
				warn!("skipping malformed path segment");
			}
			parsed
		})
		.collect();
	RawPath { segments }
}
