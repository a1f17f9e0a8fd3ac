//! Connection and query lifecycle between the workbench and the database.
//!
//! The session never touches the network itself. `begin_*` validates and
//! hands back what to send plus a ticket; `finish_*` takes the response and
//! the same ticket. A response whose ticket is no longer current is dropped,
//! so a late reply can never overwrite a newer graph.

use log::{info, warn};
use thiserror::Error;

use crate::database::{Credentials, DatabaseError, QueryRequest, QueryResult, safety};
use crate::graph::{Graph, Properties, normalize};

/// Shown when a successful query produced no nodes.
pub const NO_RESULTS_NOTICE: &str = "Query returned no results";

/// Why a session operation was refused.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
	/// Queries need a verified connection.
	#[error("Please connect to database first")]
	NotConnected,

	/// One query at a time.
	#[error("A query is already running")]
	QueryInFlight,

	/// One connection attempt at a time.
	#[error("Already connecting")]
	ConnectInFlight,

	/// Rejected or failed at the database boundary.
	#[error(transparent)]
	Database(#[from] DatabaseError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
	#[default]
	Disconnected,
	Connecting,
	Connected,
}

/// Identifies one outstanding request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySession {
	state: ConnectionState,
	credentials: Option<Credentials>,
	next_ticket: u64,
	connecting: Option<Ticket>,
	in_flight: Option<Ticket>,
	connect_error: Option<String>,
	query_error: Option<String>,
	notice: Option<String>,
}

impl QuerySession {
	pub fn state(&self) -> ConnectionState {
		self.state
	}

	pub fn is_connected(&self) -> bool {
		self.state == ConnectionState::Connected
	}

	/// A query is outstanding; the run control stays disabled.
	pub fn is_running(&self) -> bool {
		self.in_flight.is_some()
	}

	pub fn connect_error(&self) -> Option<&str> {
		self.connect_error.as_deref()
	}

	pub fn query_error(&self) -> Option<&str> {
		self.query_error.as_deref()
	}

	pub fn notice(&self) -> Option<&str> {
		self.notice.as_deref()
	}

	fn issue(&mut self) -> Ticket {
		self.next_ticket += 1;
		Ticket(self.next_ticket)
	}

	/// Validates `credentials` and starts a connectivity check.
	pub fn begin_connect(
		&mut self,
		credentials: Credentials,
	) -> Result<(Ticket, Credentials), SessionError> {
		if self.connecting.is_some() {
			return Err(SessionError::ConnectInFlight);
		}
		if let Err(err) = credentials.validate() {
			self.connect_error = Some(err.to_string());
			return Err(err.into());
		}
		let ticket = self.issue();
		self.state = ConnectionState::Connecting;
		self.connecting = Some(ticket);
		self.connect_error = None;
		self.credentials = Some(credentials.clone());
		Ok((ticket, credentials))
	}

	pub fn finish_connect(&mut self, ticket: Ticket, result: Result<(), DatabaseError>) {
		if self.connecting != Some(ticket) {
			warn!("discarding stale connectivity response");
			return;
		}
		self.connecting = None;
		match result {
			Ok(()) => {
				info!("connected");
				self.state = ConnectionState::Connected;
			}
			Err(err) => {
				warn!("connection failed: {err}");
				self.state = ConnectionState::Disconnected;
				self.credentials = None;
				self.connect_error = Some(err.to_string());
			}
		}
	}

	/// Drops the connection and any outstanding request. The caller clears
	/// the graph and the selection.
	pub fn disconnect(&mut self) {
		info!("disconnected");
		*self = QuerySession {
			next_ticket: self.next_ticket,
			..QuerySession::default()
		};
	}

	/// Gates `query` and builds the request to send.
	pub fn begin_query(&mut self, query: &str) -> Result<(Ticket, QueryRequest), SessionError> {
		let result = self.prepare_query(query);
		if let Err(err) = &result {
			self.query_error = Some(err.to_string());
		}
		result
	}

	fn prepare_query(&mut self, query: &str) -> Result<(Ticket, QueryRequest), SessionError> {
		let credentials = match (&self.state, &self.credentials) {
			(ConnectionState::Connected, Some(credentials)) => credentials.clone(),
			_ => return Err(SessionError::NotConnected),
		};
		if self.in_flight.is_some() {
			return Err(SessionError::QueryInFlight);
		}
		safety::ensure_read_only(query)?;

		let ticket = self.issue();
		self.in_flight = Some(ticket);
		self.query_error = None;
		self.notice = None;
		Ok((ticket, QueryRequest {
			query: query.to_string(),
			params: Properties::new(),
			credentials,
		}))
	}

	/// Applies a query response. Returns the graph that replaces the current
	/// one, or `None` when the response failed or is stale; either way the
	/// displayed graph stays as it is.
	pub fn finish_query(
		&mut self,
		ticket: Ticket,
		result: Result<QueryResult, DatabaseError>,
	) -> Option<Graph> {
		if self.in_flight != Some(ticket) {
			warn!("discarding stale query response");
			return None;
		}
		self.in_flight = None;
		match result {
			Ok(result) => {
				let graph = normalize(result.values);
				let summary = graph.summary();
				info!(
					"query returned {} nodes, {} edges",
					summary.node_count, summary.edge_count
				);
				if graph.is_empty() {
					self.notice = Some(NO_RESULTS_NOTICE.to_string());
				}
				Some(graph)
			}
			Err(err) => {
				warn!("query failed ({}): {err}", err.status());
				self.query_error = Some(err.to_string());
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{RawNode, ResultValue};

	fn credentials() -> Credentials {
		Credentials {
			uri: "neo4j://localhost:7687".into(),
			username: "neo4j".into(),
			password: "secret".into(),
		}
	}

	fn connected() -> QuerySession {
		let mut session = QuerySession::default();
		let (ticket, _) = session.begin_connect(credentials()).unwrap();
		assert_eq!(session.state(), ConnectionState::Connecting);
		session.finish_connect(ticket, Ok(()));
		assert!(session.is_connected());
		session
	}

	fn one_node() -> QueryResult {
		QueryResult {
			values: vec![ResultValue::Node(RawNode::new("a", ["Account"]))],
		}
	}

	#[test]
	fn blank_credentials_never_reach_the_database() {
		let mut session = QuerySession::default();
		let err = session
			.begin_connect(Credentials {
				password: String::new(),
				..credentials()
			})
			.unwrap_err();
		assert!(matches!(err, SessionError::Database(DatabaseError::Connection(_))));
		assert_eq!(
			session.connect_error(),
			Some("Please fill in all connection fields")
		);
		assert_eq!(session.state(), ConnectionState::Disconnected);
	}

	#[test]
	fn failed_connect_stays_disconnected() {
		let mut session = QuerySession::default();
		let (ticket, _) = session.begin_connect(credentials()).unwrap();
		assert_eq!(
			session.begin_connect(credentials()),
			Err(SessionError::ConnectInFlight)
		);
		let refused = DatabaseError::Connection("unauthorized".into());
		session.finish_connect(ticket, Err(refused));
		assert_eq!(session.state(), ConnectionState::Disconnected);
		assert_eq!(session.connect_error(), Some("unauthorized"));
		assert_eq!(
			session.begin_query("MATCH (n) RETURN n"),
			Err(SessionError::NotConnected)
		);
	}

	#[test]
	fn request_carries_connected_credentials() {
		let mut session = connected();
		let (_, request) = session.begin_query("MATCH (n) RETURN n LIMIT 5").unwrap();
		assert_eq!(request.credentials, credentials());
		assert!(request.params.is_empty());
		assert!(session.is_running());
	}

	#[test]
	fn overlapping_queries_are_refused() {
		let mut session = connected();
		let (ticket, _) = session.begin_query("MATCH (n) RETURN n").unwrap();
		assert_eq!(
			session.begin_query("MATCH (m) RETURN m"),
			Err(SessionError::QueryInFlight)
		);
		assert!(session.finish_query(ticket, Ok(one_node())).is_some());
		assert!(!session.is_running());
		assert!(session.begin_query("MATCH (m) RETURN m").is_ok());
	}

	#[test]
	fn mutating_queries_are_rejected_before_sending() {
		let mut session = connected();
		let err = session
			.begin_query("MATCH (n) DETACH DELETE n")
			.unwrap_err();
		assert!(matches!(err, SessionError::Database(DatabaseError::QueryRejected(_))));
		assert!(!session.is_running());
		assert!(session.query_error().is_some());
	}

	#[test]
	fn failure_leaves_the_graph_alone() {
		let mut session = connected();
		let (ticket, _) = session.begin_query("MATCH (n) RETURN n").unwrap();
		let replaced = session.finish_query(ticket, Err(DatabaseError::Execution("boom".into())));
		assert!(replaced.is_none());
		assert_eq!(session.query_error(), Some("boom"));
	}

	#[test]
	fn empty_result_replaces_the_graph_with_a_notice() {
		let mut session = connected();
		let (ticket, _) = session.begin_query("MATCH (n:Nothing) RETURN n").unwrap();
		let graph = session
			.finish_query(ticket, Ok(QueryResult::default()))
			.unwrap();
		assert!(graph.is_empty());
		assert_eq!(session.notice(), Some(NO_RESULTS_NOTICE));

		let (ticket, _) = session.begin_query("MATCH (n) RETURN n").unwrap();
		assert_eq!(session.notice(), None);
		assert!(session.finish_query(ticket, Ok(one_node())).is_some());
	}

	#[test]
	fn responses_after_disconnect_are_stale() {
		let mut session = connected();
		let (ticket, _) = session.begin_query("MATCH (n) RETURN n").unwrap();
		session.disconnect();
		assert_eq!(session.state(), ConnectionState::Disconnected);
		assert!(session.finish_query(ticket, Ok(one_node())).is_none());

		let mut session = connected();
		let (old, _) = session.begin_query("MATCH (n) RETURN n").unwrap();
		session.disconnect();
		let (connect, _) = session.begin_connect(credentials()).unwrap();
		session.finish_connect(connect, Ok(()));
		let (new, _) = session.begin_query("MATCH (n) RETURN n").unwrap();
		assert_ne!(old, new);
		assert!(session.finish_query(old, Ok(one_node())).is_none());
		assert!(session.is_running());
		assert!(session.finish_query(new, Ok(one_node())).is_some());
	}
}
