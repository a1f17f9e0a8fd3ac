use async_trait::async_trait;
use log::info;

use super::{Credentials, DatabaseError, GraphDatabase, QueryRequest, QueryResult, safety};
use crate::graph::{RawNode, RawPath, RawRelationship, ResultValue};

const COUNTRIES: &[(&str, bool)] = &[
	("United Kingdom", false),
	("Cyprus", true),
	("Panama", true),
	("Ireland", false),
];

/// Offline stand-in returning a fixed investigation graph for any read query.
#[derive(Clone, Debug)]
pub struct SampleDatabase {
	customers: usize,
}

impl Default for SampleDatabase {
	fn default() -> Self {
		Self { customers: 12 }
	}
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

impl SampleDatabase {
	/// Sample graph with `customers` customer/account pairs.
	pub fn with_customers(customers: usize) -> Self {
		Self { customers }
	}

	fn customer(i: usize) -> RawNode {
		let labels: &[&str] = if i % 5 == 0 {
			&["Customer", "Flagged"]
		} else {
			&["Customer"]
		};
		RawNode::new(format!("c{i}"), labels.iter().copied())
			.with_property("name", format!("Customer {:03}", i + 1))
			.with_property("riskScore", (rand_simple(i) * 100.0).round())
	}

	fn account(i: usize) -> RawNode {
		RawNode::new(format!("a{i}"), ["Account"])
			.with_property("accountNumber", format!("ACC{:03}", i + 1))
			.with_property("suspicious", i % 4 == 1)
	}

	fn country(i: usize) -> RawNode {
		let (name, high_risk) = COUNTRIES[i % COUNTRIES.len()];
		let labels: &[&str] = if high_risk {
			&["Country", "HighRiskJurisdiction"]
		} else {
			&["Country"]
		};
		RawNode::new(format!("k{}", i % COUNTRIES.len()), labels.iter().copied())
			.with_property("name", name)
	}

	fn values(&self) -> Vec<ResultValue> {
		let mut values = Vec::new();
		for i in 0..self.customers {
			let (customer, account) = (Self::customer(i), Self::account(i));
			let country = Self::country((rand_simple(i + 7) * 10.0) as usize);
			let country_id = country.identity.clone();
			values.push(ResultValue::Path(RawPath::chain(
				customer.clone(),
				[
					(
						RawRelationship::new("OWNS", &customer.identity, &account.identity),
						account.clone(),
					),
					(
						RawRelationship::new("REGISTERED_IN", &account.identity, &country_id),
						country,
					),
				],
			)));

			if i > 0 {
				let target = Self::account((rand_simple(i) * i as f64) as usize);
				let amount = ((rand_simple(i * 3) * 20_000.0) / 500.0).round() * 500.0;
				values.push(ResultValue::Path(RawPath::chain(
					account.clone(),
					[(
						RawRelationship::new("SENT", &account.identity, &target.identity)
							.with_property("amount", amount)
							.with_property("currency", "GBP"),
						target,
					)],
				)));
			}
		}
		values
	}
}

#[async_trait(?Send)]
impl GraphDatabase for SampleDatabase {
	async fn verify_connectivity(&self, credentials: &Credentials) -> Result<(), DatabaseError> {
		credentials.validate()?;
		info!("sample database accepted {}", credentials.uri);
		Ok(())
	}

	async fn run(&self, request: &QueryRequest) -> Result<QueryResult, DatabaseError> {
		safety::ensure_read_only(&request.query)?;
		Ok(QueryResult {
			values: self.values(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Properties, normalize};

	fn credentials() -> Credentials {
		Credentials {
			uri: "neo4j://localhost:7687".into(),
			username: "neo4j".into(),
			password: "secret".into(),
		}
	}

	fn request(query: &str) -> QueryRequest {
		QueryRequest {
			query: query.into(),
			params: Properties::new(),
			credentials: credentials(),
		}
	}

	#[tokio::test]
	async fn sample_graph_has_no_dangling_edges() {
		let db = SampleDatabase::default();
		let result = db.run(&request("MATCH p=()-[]-() RETURN p")).await.unwrap();
		let graph = normalize(result.values);
		assert!(graph.summary().node_count >= 24);
		assert_eq!(graph.dangling_edges().count(), 0);
		assert!(graph.nodes().iter().any(|n| n.flagged));
		assert!(graph.nodes().iter().any(|n| n.high_risk));
		assert!(graph.nodes().iter().any(|n| n.suspicious));
	}

	#[tokio::test]
	async fn sample_database_applies_read_only_gate() {
		let db = SampleDatabase::with_customers(3);
		let err = db
			.run(&request("MATCH (n) DETACH DELETE n"))
			.await
			.unwrap_err();
		assert!(matches!(err, DatabaseError::QueryRejected(_)));
	}

	#[tokio::test]
	async fn blank_password_fails_connectivity() {
		let db = SampleDatabase::default();
		let mut creds = credentials();
		creds.password.clear();
		assert!(matches!(
			db.verify_connectivity(&creds).await,
			Err(DatabaseError::Connection(_))
		));
	}
}
