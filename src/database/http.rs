use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Credentials, DatabaseError, GraphDatabase, QueryRequest, QueryResult, safety, wire};
use crate::graph::{Properties, ResultValue};

/// Talks to the query service over JSON HTTP (`<base>/connect`, `<base>/query`).
#[derive(Clone, Debug)]
pub struct HttpDatabase {
	client: Client,
	base_url: String,
}

#[derive(Serialize)]
struct QueryBody<'a> {
	query: &'a str,
	params: &'a Properties,
	#[serde(flatten)]
	credentials: &'a Credentials,
}

#[derive(Deserialize)]
struct ErrorBody {
	error: Option<String>,
}

#[derive(Deserialize)]
struct RecordsBody {
	records: Vec<Value>,
}

impl HttpDatabase {
	/// Client for the service mounted at `base_url`.
	pub fn new(base_url: &str) -> Self {
		Self {
			client: Client::new(),
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path)
	}
}

/// Maps a non-success response to an error. Failures during the
/// connectivity check are always [`DatabaseError::Connection`].
fn status_error(status: StatusCode, body: &str, connecting: bool) -> DatabaseError {
	let message = serde_json::from_str::<ErrorBody>(body)
		.ok()
		.and_then(|body| body.error)
		.filter(|message| !message.is_empty());
	let text = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_string());
	if connecting {
		DatabaseError::Connection(text("Failed to connect to Neo4j"))
	} else if status.is_client_error() {
		DatabaseError::QueryRejected(text("Query rejected"))
	} else {
		DatabaseError::Execution(text("Query execution failed"))
	}
}

fn malformed(err: serde_json::Error) -> DatabaseError {
	DatabaseError::Execution(format!("malformed response: {err}"))
}

/// Decodes a success body. A body without a `records` list is an error,
/// never an empty result.
fn decode_body(body: &str) -> Result<Vec<ResultValue>, DatabaseError> {
	let body: RecordsBody = serde_json::from_str(body).map_err(malformed)?;
	let values = wire::decode_records(&body.records);
	let records = body.records.len();
	debug!("{records} records decoded into {} values", values.len());
	Ok(values)
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), DatabaseError> {
	let status = response.status();
	let text = response
		.text()
		.await
		.map_err(|e| DatabaseError::Execution(e.to_string()))?;
	Ok((status, text))
}

#[async_trait(?Send)]
impl GraphDatabase for HttpDatabase {
	async fn verify_connectivity(&self, credentials: &Credentials) -> Result<(), DatabaseError> {
		credentials.validate()?;
		let response = self
			.client
			.post(self.endpoint("connect"))
			.json(credentials)
			.send()
			.await
			.map_err(|e| DatabaseError::Connection(e.to_string()))?;
		let (status, body) = read_body(response)
			.await
			.map_err(|e| DatabaseError::Connection(e.to_string()))?;
		if !status.is_success() {
			return Err(status_error(status, &body, true));
		}
		info!("connected to {}", credentials.uri);
		Ok(())
	}

	async fn run(&self, request: &QueryRequest) -> Result<QueryResult, DatabaseError> {
		safety::ensure_read_only(&request.query)?;
		let body = QueryBody {
			query: &request.query,
			params: &request.params,
			credentials: &request.credentials,
		};
		let response = self
			.client
			.post(self.endpoint("query"))
			.json(&body)
			.send()
			.await
			.map_err(|e| DatabaseError::Execution(e.to_string()))?;

		let (status, body) = read_body(response).await?;
		if !status.is_success() {
			return Err(status_error(status, &body, false));
		}
		Ok(QueryResult {
			values: decode_body(&body)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::graph::normalize;

	fn node_json(id: i64) -> Value {
		json!({ "identity": { "low": id, "high": 0 }, "labels": ["Customer"], "properties": {} })
	}

	fn request(query: &str) -> QueryRequest {
		QueryRequest {
			query: query.into(),
			params: Properties::new(),
			credentials: Credentials {
				uri: "neo4j://localhost:7687".into(),
				username: "neo4j".into(),
				password: "secret".into(),
			},
		}
	}

	#[test]
	fn client_errors_are_rejections() {
		let err = status_error(
			StatusCode::FORBIDDEN,
			r#"{"error":"Only read queries are allowed"}"#,
			false,
		);
		let expected = DatabaseError::QueryRejected("Only read queries are allowed".into());
		assert_eq!(err, expected);
	}

	#[test]
	fn server_errors_are_execution_failures() {
		let err = status_error(
			StatusCode::INTERNAL_SERVER_ERROR,
			r#"{"error":"Neo.ClientError.Statement.SyntaxError"}"#,
			false,
		);
		let expected = DatabaseError::Execution("Neo.ClientError.Statement.SyntaxError".into());
		assert_eq!(err, expected);
	}

	#[test]
	fn missing_error_field_falls_back_to_a_generic_message() {
		assert_eq!(
			status_error(StatusCode::BAD_REQUEST, "{}", false),
			DatabaseError::QueryRejected("Query rejected".into())
		);
		assert_eq!(
			status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", false),
			DatabaseError::Execution("Query execution failed".into())
		);
	}

	#[test]
	fn connect_failures_are_connection_errors() {
		let unauthorized = r#"{"error":"unauthorized"}"#;
		assert_eq!(
			status_error(StatusCode::UNAUTHORIZED, unauthorized, true),
			DatabaseError::Connection("unauthorized".into())
		);
		assert_eq!(
			status_error(StatusCode::SERVICE_UNAVAILABLE, "", true),
			DatabaseError::Connection("Failed to connect to Neo4j".into())
		);
	}

	#[test]
	fn body_without_records_is_malformed() {
		let body = json!({
			"nodes": [{ "id": "1", "labels": ["Customer"], "properties": {} }],
			"relationships": [],
			"summary": { "nodeCount": 1, "relationshipCount": 0 }
		});
		let err = decode_body(&body.to_string()).unwrap_err();
		assert!(
			matches!(err, DatabaseError::Execution(ref m) if m.starts_with("malformed response"))
		);
	}

	#[test]
	fn driver_record_objects_decode_through_their_fields() {
		let body = json!({
			"records": [
				{
					"keys": ["c"],
					"length": 1,
					"_fields": [node_json(1)],
					"_fieldLookup": { "c": 0 }
				},
				[node_json(2)]
			]
		});
		let graph = normalize(decode_body(&body.to_string()).unwrap());
		assert_eq!(graph.nodes().len(), 2);
	}

	#[tokio::test]
	async fn mutating_queries_never_leave_the_client() {
		// nothing listens on the discard port; a sent request would fail as Execution
		let db = HttpDatabase::new("http://127.0.0.1:9/api/neo4j/");
		let err = db
			.run(&request("MATCH (n) DETACH DELETE n"))
			.await
			.unwrap_err();
		assert!(matches!(err, DatabaseError::QueryRejected(_)));
	}

	#[test]
	fn endpoints_ignore_trailing_slashes() {
		let db = HttpDatabase::new("http://localhost:3000/api/neo4j/");
		let endpoint = db.endpoint("query");
		assert_eq!(endpoint, "http://localhost:3000/api/neo4j/query");
	}
}
