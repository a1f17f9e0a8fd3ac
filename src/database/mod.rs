//! Boundary to the graph database collaborator.
//!
//! Everything past this module sees closed [`ResultValue`] variants; the
//! shape inspection of raw driver output lives in [`wire`].

mod error;
mod http;
pub mod safety;
mod sample;
pub mod wire;

use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::graph::{Properties, ResultValue};

pub use error::DatabaseError;
pub use http::HttpDatabase;
pub use sample::SampleDatabase;

/// Connection credentials, sent with every request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
	/// Bolt/neo4j URI of the database.
	pub uri: String,
	/// User name.
	pub username: String,
	/// Password.
	pub password: String,
}

impl Credentials {
	/// Rejects credentials with any blank field.
	pub fn validate(&self) -> Result<(), DatabaseError> {
		if [&self.uri, &self.username, &self.password]
			.iter()
			.any(|field| field.trim().is_empty())
		{
			return Err(DatabaseError::Connection(
				"Please fill in all connection fields".to_string(),
			));
		}
		Ok(())
	}
}

/// One query execution request.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
	/// Cypher text.
	pub query: String,
	/// Query parameters.
	pub params: Properties,
	/// Where and as whom to run it.
	pub credentials: Credentials,
}

/// Result values of one execution, already classified.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
	/// Values in record order.
	pub values: Vec<ResultValue>,
}

/// The database collaborator.
#[async_trait(?Send)]
pub trait GraphDatabase {
	/// Checks that `credentials` reach a live database.
	async fn verify_connectivity(&self, credentials: &Credentials) -> Result<(), DatabaseError>;

	/// Runs a read query and returns its raw values.
	async fn run(&self, request: &QueryRequest) -> Result<QueryResult, DatabaseError>;
}

/// Builds the collaborator selected by configuration.
pub fn connect_backend(config: &BackendConfig) -> Rc<dyn GraphDatabase> {
	match config {
		BackendConfig::Http { base_url } => Rc::new(HttpDatabase::new(base_url)),
		BackendConfig::Sample => Rc::new(SampleDatabase::default()),
	}
}
